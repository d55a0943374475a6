// src/openid_config.rs

use crate::config::Config;
use crate::error::Id4meError;
use crate::http::{merge_headers, HttpClient};
use crate::model::openid_config::OpenIdConfig;
use crate::validator::{IssuerMatch, Validator};
use std::sync::Arc;
use tracing::{debug, instrument};
use url::Url;

const WELL_KNOWN_PATH: &str = ".well-known/openid-configuration";

/// Fetches and validates `.well-known/openid-configuration` documents.
#[derive(Clone)]
pub struct OpenIdConfigResolver {
    http: Arc<dyn HttpClient>,
    config: Arc<Config>,
    validator: Validator,
}

impl OpenIdConfigResolver {
    pub fn new(http: Arc<dyn HttpClient>, config: Arc<Config>) -> Self {
        Self {
            http,
            config,
            validator: Validator::new(),
        }
    }

    /// The metadata URL of an issuer: `<issuer>[/].well-known/openid-configuration`.
    pub fn well_known_url(issuer_url: &str) -> String {
        let separator = if issuer_url.ends_with('/') { "" } else { "/" };
        format!("{}{}{}", issuer_url, separator, WELL_KNOWN_PATH)
    }

    /// Fetches the configuration of a discovered authority host.
    pub async fn from_authority(&self, authority: &str) -> Result<OpenIdConfig, Id4meError> {
        self.from_issuer_url(&self.config.authority_url(authority), IssuerMatch::Loose)
            .await
    }

    /// Fetches the configuration published under `issuer_url` and checks that
    /// the announced issuer names it.
    #[instrument(skip(self), err)]
    pub async fn from_issuer_url(&self, issuer_url: &str, mode: IssuerMatch) -> Result<OpenIdConfig, Id4meError> {
        if issuer_url.is_empty() {
            return Err(Id4meError::InvalidAuthorityIssuer(
                "no iss value given to retrieve OpenID configuration".to_string(),
            ));
        }

        Url::parse(issuer_url).map_err(|e| Id4meError::InvalidUrl(format!("{}: {}", issuer_url, e)))?;

        let url = Self::well_known_url(issuer_url);
        let headers = merge_headers(&self.config.request_headers, &[]);
        let body = self.http.get(&url, &headers).await?;
        if body.trim().is_empty() {
            return Err(Id4meError::MissingConfiguration(format!("empty OpenID configuration at {}", url)));
        }

        let config = Self::from_json(&body)?;
        self.validator.validate_iss(issuer_url, &config.issuer, mode)?;
        debug!("Loaded OpenID configuration of {}", config.issuer);
        Ok(config)
    }

    /// Parses a metadata document, tolerating stray spaces and line breaks.
    pub fn from_json(json: &str) -> Result<OpenIdConfig, Id4meError> {
        let cleaned: String = json.chars().filter(|c| !matches!(c, ' ' | '\r' | '\n')).collect();
        OpenIdConfig::from_value(serde_json::from_str(&cleaned)?)
    }
}
