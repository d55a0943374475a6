// src/error.rs

use thiserror::Error;

/// The primary error type for the `id4me-rp` library.
///
/// Every variant is terminal for the authentication attempt that raised it;
/// the library never retries on its own.
#[derive(Debug, Error)]
pub enum Id4meError {
    /// The identifier could not be reduced to any domain carrying `_openid` TXT records.
    #[error("Invalid OpenId domain: {0}")]
    InvalidOpenIdDomain(String),

    /// A domain with TXT records was found, but none of them is an `OID1` record.
    #[error("OpenId DNS record not found: {0}")]
    OpenIdDnsRecordNotFound(String),

    /// The issuer announced by an authority does not match the expected issuer.
    #[error("Invalid authority issuer: {0}")]
    InvalidAuthorityIssuer(String),

    /// A single JSON Web Key is malformed or of an unsupported type.
    #[error("Invalid JWK: {0}")]
    InvalidJwk(String),

    /// A JSON Web Key Set does not have the expected structure.
    #[error("Invalid JWKS: {0}")]
    InvalidJwks(String),

    /// Signature verification failed: unsupported algorithm, unknown key or bad signature.
    #[error("Invalid JWT token: {0}")]
    InvalidJwtToken(String),

    /// The ID Token is missing or one of its validation checks failed.
    #[error("Invalid ID token: {0}")]
    InvalidIdToken(String),

    /// The UserInfo response could not be retrieved or failed validation.
    #[error("Invalid user info: {0}")]
    InvalidUserInfo(String),

    /// Dynamic client registration returned an unusable response.
    #[error("Client registration failed: {0}")]
    Registration(String),

    /// The transport reported a failure (non-success status, timeout, connection error).
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// An error raised by the `reqwest` client itself.
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// A response body was not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A provided URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A required configuration field or metadata entry is missing.
    #[error("A required configuration field is missing: {0}")]
    MissingConfiguration(String),

    /// A configuration value is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl Id4meError {
    /// Returns the bare message carried by the error, without the variant prefix.
    ///
    /// Token validation uses this to re-wrap an inner failure into
    /// `InvalidIdToken` / `InvalidUserInfo` while keeping the original message.
    pub fn reason(&self) -> String {
        match self {
            Id4meError::InvalidOpenIdDomain(msg)
            | Id4meError::OpenIdDnsRecordNotFound(msg)
            | Id4meError::InvalidAuthorityIssuer(msg)
            | Id4meError::InvalidJwk(msg)
            | Id4meError::InvalidJwks(msg)
            | Id4meError::InvalidJwtToken(msg)
            | Id4meError::InvalidIdToken(msg)
            | Id4meError::InvalidUserInfo(msg)
            | Id4meError::Registration(msg)
            | Id4meError::Http(msg)
            | Id4meError::InvalidUrl(msg)
            | Id4meError::MissingConfiguration(msg)
            | Id4meError::InvalidConfiguration(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}
