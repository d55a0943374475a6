// src/model/openid_config.rs

use crate::error::Id4meError;
use serde::{Deserialize, Serialize};

/// An authority's `.well-known/openid-configuration` document.
///
/// Unknown members are ignored; the complete document stays available
/// through [`OpenIdConfig::data`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenIdConfig {
    pub issuer: String,
    pub jwks_uri: Option<String>,
    pub authorization_endpoint: Option<String>,
    pub token_endpoint: Option<String>,
    pub registration_endpoint: Option<String>,
    pub introspection_endpoint: Option<String>,
    pub revocation_endpoint: Option<String>,
    pub userinfo_endpoint: Option<String>,
    pub end_session_endpoint: Option<String>,

    pub scopes_supported: Vec<String>,
    pub response_types_supported: Vec<String>,
    pub response_modes_supported: Vec<String>,
    pub grant_types_supported: Vec<String>,
    pub code_challenge_methods_supported: Vec<String>,
    pub token_endpoint_auth_methods_supported: Vec<String>,
    pub token_endpoint_auth_signing_alg_values_supported: Vec<String>,
    pub request_object_signing_alg_values_supported: Vec<String>,
    pub ui_locales_supported: Vec<String>,
    pub id_token_signing_alg_values_supported: Vec<String>,
    pub id_token_encryption_enc_values_supported: Vec<String>,
    pub userinfo_signing_alg_values_supported: Option<Vec<String>>,
    pub userinfo_encryption_alg_values_supported: Option<Vec<String>>,
    pub display_values_supported: Vec<String>,
    pub claim_types_supported: Vec<String>,
    pub claims_supported: Vec<String>,

    pub request_parameter_supported: Option<bool>,
    pub claims_parameter_supported: Option<bool>,
    pub frontchannel_logout_supported: Option<bool>,
    pub backchannel_logout_supported: Option<bool>,
    pub request_uri_parameter_supported: Option<bool>,
    pub require_request_uri_registration: Option<bool>,
    pub tls_client_certificate_bound_access_tokens: Option<bool>,
    pub request_uri_quota: Option<u64>,

    #[serde(skip)]
    data: serde_json::Value,
}

impl OpenIdConfig {
    /// Parses a metadata document, keeping the raw JSON alongside the typed fields.
    pub fn from_value(data: serde_json::Value) -> Result<Self, Id4meError> {
        let mut config: OpenIdConfig = serde_json::from_value(data.clone())?;
        config.data = data;
        Ok(config)
    }

    /// The metadata document exactly as received.
    pub fn data(&self) -> &serde_json::Value {
        &self.data
    }

    pub fn jwks_uri(&self) -> Result<&str, Id4meError> {
        require(&self.jwks_uri, "jwks_uri")
    }

    pub fn authorization_endpoint(&self) -> Result<&str, Id4meError> {
        require(&self.authorization_endpoint, "authorization_endpoint")
    }

    pub fn token_endpoint(&self) -> Result<&str, Id4meError> {
        require(&self.token_endpoint, "token_endpoint")
    }

    pub fn registration_endpoint(&self) -> Result<&str, Id4meError> {
        require(&self.registration_endpoint, "registration_endpoint")
    }

    pub fn userinfo_endpoint(&self) -> Result<&str, Id4meError> {
        require(&self.userinfo_endpoint, "userinfo_endpoint")
    }

    /// Whether the authority can sign UserInfo responses with `alg`.
    pub fn supports_userinfo_signing_alg(&self, alg: &str) -> bool {
        self.userinfo_signing_alg_values_supported
            .as_ref()
            .is_some_and(|algs| algs.iter().any(|a| a == alg))
    }
}

fn require<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, Id4meError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Id4meError::MissingConfiguration(format!("OpenID configuration has no {}", name)))
}
