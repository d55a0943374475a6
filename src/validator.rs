// src/validator.rs

use crate::clock::{Clock, SystemClock};
use crate::error::Id4meError;
use crate::model::jwk::{Jwks, KeyType};
use crate::model::jwt::{IdToken, Jwt};
use crate::model::openid_config::OpenIdConfig;
use jsonwebtoken::Algorithm;
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, instrument};

const INVALID_ISSUER: &str = "iss and issuer values are not equals";
const INVALID_AUDIENCE: &str = "Authority audience does not contains clientId";
const INVALID_EXPIRATION_TIME: &str = "Invalid ID Token expiration time";
const INVALID_SIGNATURE: &str = "Invalid ID Token Signature provided";
const KEY_NOT_FOUND: &str = "Used key not found in JWKS for signature verification";
const INVALID_STRUCTURE: &str = "Invalid ID Token Structure";

/// How an issuer announced by an authority is compared with the expected one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssuerMatch {
    /// Byte-for-byte equality.
    Exact,
    /// Equality after dropping an `http://`/`https://` scheme and a trailing `/`.
    Loose,
}

/// Validates ID Tokens and signed UserInfo responses.
///
/// Only RS256 signatures against RSA keys of the authority's JWKS are
/// accepted. The current time comes from the injected [`Clock`].
#[derive(Clone)]
pub struct Validator {
    clock: Arc<dyn Clock>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    pub fn new() -> Self {
        Self {
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Validates an ID Token: signature, then `iss`, `aud` and `exp`.
    ///
    /// Any failure is reported as [`Id4meError::InvalidIdToken`] carrying the
    /// message of the failed check.
    #[instrument(skip_all, err)]
    pub fn validate_id_token(
        &self,
        id_token: &IdToken,
        config: &OpenIdConfig,
        jwks: &Value,
        client_id: &str,
    ) -> Result<(), Id4meError> {
        self.check_id_token(id_token, config, jwks, client_id)
            .map_err(|e| Id4meError::InvalidIdToken(e.reason()))
    }

    fn check_id_token(
        &self,
        id_token: &IdToken,
        config: &OpenIdConfig,
        jwks: &Value,
        client_id: &str,
    ) -> Result<(), Id4meError> {
        self.validate_jwt_signature(id_token, jwks)?;
        self.validate_iss(id_token.iss().unwrap_or_default(), &config.issuer, IssuerMatch::Exact)?;
        self.validate_audience(
            id_token.body_value("aud"),
            id_token.body_value("azp"),
            client_id,
        )?;
        self.validate_expiration(id_token.body_value("exp"))
    }

    /// Validates a signed UserInfo response.
    ///
    /// Same as the ID Token checks, except that `aud` and `exp` are only
    /// checked when present. Failures are reported as
    /// [`Id4meError::InvalidUserInfo`].
    #[instrument(skip_all, err)]
    pub fn validate_user_info(
        &self,
        user_info: &Jwt,
        config: &OpenIdConfig,
        jwks: &Value,
        client_id: &str,
    ) -> Result<(), Id4meError> {
        self.check_user_info(user_info, config, jwks, client_id)
            .map_err(|e| Id4meError::InvalidUserInfo(e.reason()))
    }

    fn check_user_info(
        &self,
        user_info: &Jwt,
        config: &OpenIdConfig,
        jwks: &Value,
        client_id: &str,
    ) -> Result<(), Id4meError> {
        self.validate_jwt_signature(user_info, jwks)?;
        self.validate_iss(user_info.iss().unwrap_or_default(), &config.issuer, IssuerMatch::Exact)?;
        if let Some(aud) = user_info.body_value("aud").filter(|v| !v.is_null()) {
            self.validate_audience(Some(aud), user_info.body_value("azp"), client_id)?;
        }
        if let Some(exp) = user_info.body_value("exp").filter(|v| !v.is_null()) {
            self.validate_expiration(Some(exp))?;
        }
        Ok(())
    }

    /// Checks that `delivered` names the same issuer as `origin`.
    pub fn validate_iss(&self, origin: &str, delivered: &str, mode: IssuerMatch) -> Result<(), Id4meError> {
        let matches = match mode {
            IssuerMatch::Exact => origin == delivered,
            IssuerMatch::Loose => !origin.is_empty() && strip_issuer(origin) == strip_issuer(delivered),
        };
        if matches {
            Ok(())
        } else {
            debug!("issuer mismatch: expected {:?}, got {:?}", origin, delivered);
            Err(Id4meError::InvalidAuthorityIssuer(INVALID_ISSUER.to_string()))
        }
    }

    /// Verifies an RS256 signature over `<raw-header>.<raw-body>` with the key
    /// named by the token's `kid`.
    pub fn validate_jwt_signature(&self, token: &Jwt, jwks: &Value) -> Result<(), Id4meError> {
        if !token.is_well_formed() {
            return Err(Id4meError::InvalidJwtToken(INVALID_STRUCTURE.to_string()));
        }

        let alg = token.alg().unwrap_or_default();
        if Algorithm::from_str(alg).ok() != Some(Algorithm::RS256) {
            return Err(Id4meError::InvalidJwtToken(format!(
                "Invalid algorithm: {}, only RS256 supported currently",
                alg
            )));
        }

        let keys = Jwks::from_value(jwks, &[KeyType::Rsa])?;
        let key = token
            .kid()
            .and_then(|kid| keys.get(kid))
            .ok_or_else(|| Id4meError::InvalidJwtToken(KEY_NOT_FOUND.to_string()))?;

        if key.verify(token.signing_input().as_bytes(), token.signature()) {
            Ok(())
        } else {
            Err(Id4meError::InvalidJwtToken(INVALID_SIGNATURE.to_string()))
        }
    }

    /// Checks `aud` (and `azp` for multi-valued audiences) against the client ID.
    pub fn validate_audience(
        &self,
        audience: Option<&Value>,
        authorized_party: Option<&Value>,
        client_id: &str,
    ) -> Result<(), Id4meError> {
        let azp = authorized_party.and_then(Value::as_str).unwrap_or_default();
        let valid = match present(audience) {
            None => false,
            Some(Value::Array(audiences)) => is_valid_multiple_audience(audiences, azp, client_id),
            Some(Value::String(aud)) => aud == client_id || azp == client_id,
            Some(_) => false,
        };
        if valid {
            Ok(())
        } else {
            Err(Id4meError::InvalidIdToken(INVALID_AUDIENCE.to_string()))
        }
    }

    /// Requires a non-empty `exp` strictly after the current time.
    pub fn validate_expiration(&self, expiration: Option<&Value>) -> Result<(), Id4meError> {
        let exp = match present(expiration) {
            Some(Value::Number(n)) => n.as_u64().or_else(|| n.as_f64().map(|f| f as u64)),
            Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        match exp {
            Some(exp) if self.clock.now() < exp => Ok(()),
            _ => Err(Id4meError::InvalidIdToken(INVALID_EXPIRATION_TIME.to_string())),
        }
    }
}

fn is_valid_multiple_audience(audiences: &[Value], azp: &str, client_id: &str) -> bool {
    if audiences.len() <= 1 && audiences.first().and_then(Value::as_str) == Some(client_id) {
        return true;
    }
    if !azp.is_empty() && azp != client_id {
        return false;
    }
    audiences.iter().any(|aud| aud.as_str() == Some(client_id))
}

/// Treats `null`, `""`, `0`, `false` and `[]` as absent.
fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::Array(a) => !a.is_empty(),
        Value::Object(_) => true,
    })
}

fn strip_issuer(issuer: &str) -> &str {
    let issuer = issuer
        .strip_prefix("https://")
        .or_else(|| issuer.strip_prefix("http://"))
        .unwrap_or(issuer);
    issuer.trim_end_matches('/')
}
