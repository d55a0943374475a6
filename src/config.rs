// src/config.rs

use crate::error::Id4meError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// The `application_type` announced during dynamic client registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationType {
    #[default]
    Web,
    Native,
}

impl ApplicationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationType::Web => "web",
            ApplicationType::Native => "native",
        }
    }
}

impl fmt::Display for ApplicationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The main configuration for an ID4me relying party.
///
/// Holds the network timeouts, the defaults applied to the login flow and
/// the extra headers forwarded to every authority. It should be constructed
/// using the `ConfigBuilder`.
#[derive(Debug, Clone)]
pub struct Config {
    /// Total timeout for a single HTTP request.
    pub http_timeout: Duration,
    /// Timeout for establishing the HTTP connection.
    pub connect_timeout: Duration,
    /// Timeout for a single DNS TXT query.
    pub dns_timeout: Duration,
    /// Default recursion budget when resolving distributed claims.
    pub distributed_claims_depth: u32,
    /// Default `application_type` used for dynamic client registration.
    pub application_type: ApplicationType,
    /// Scheme used to turn a discovered authority host into an issuer URL.
    pub authority_scheme: String,
    /// `User-Agent` header sent by the bundled HTTP client.
    pub user_agent: String,
    /// Extra headers added to every request sent to an authority or agent.
    pub request_headers: Vec<(String, String)>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            dns_timeout: Duration::from_secs(5),
            distributed_claims_depth: 3,
            application_type: ApplicationType::Web,
            authority_scheme: "https".to_string(),
            user_agent: concat!("id4me-rp/", env!("CARGO_PKG_VERSION")).to_string(),
            request_headers: Vec::new(),
        }
    }
}

impl Config {
    /// Builds the issuer URL for an authority host, e.g. `id.denic.de` -> `https://id.denic.de`.
    pub fn authority_url(&self, authority: &str) -> String {
        format!("{}://{}", self.authority_scheme, authority)
    }
}

/// A builder for creating a `Config` instance.
///
/// Every field has a sensible default, so `ConfigBuilder::new().build()` is
/// enough for a production relying party.
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Creates a new `ConfigBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the total per-request HTTP timeout. Defaults to 10 seconds.
    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.config.http_timeout = timeout;
        self
    }

    /// Sets the HTTP connect timeout. Defaults to 5 seconds.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Sets the per-query DNS timeout. Defaults to 5 seconds.
    pub fn dns_timeout(mut self, timeout: Duration) -> Self {
        self.config.dns_timeout = timeout;
        self
    }

    /// Sets the default distributed-claims recursion budget. Defaults to 3.
    pub fn distributed_claims_depth(mut self, depth: u32) -> Self {
        self.config.distributed_claims_depth = depth;
        self
    }

    /// Sets the `application_type` used for registration.
    pub fn application_type(mut self, application_type: ApplicationType) -> Self {
        self.config.application_type = application_type;
        self
    }

    /// Sets the scheme used for authority URLs.
    ///
    /// Only `https` should be used against real authorities; `http` exists
    /// for local test servers.
    pub fn authority_scheme(mut self, scheme: &str) -> Self {
        self.config.authority_scheme = scheme.to_ascii_lowercase();
        self
    }

    /// Sets the `User-Agent` header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Adds a header that is sent with every request to an authority.
    pub fn request_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.request_headers.push((name.into(), value.into()));
        self
    }

    /// Consumes the builder and returns a `Config` object.
    ///
    /// # Errors
    ///
    /// Returns an error if a timeout is zero or the authority scheme is not
    /// `http` or `https`.
    pub fn build(self) -> Result<Config, Id4meError> {
        let config = self.config;

        for (name, value) in [
            ("http_timeout", config.http_timeout),
            ("connect_timeout", config.connect_timeout),
            ("dns_timeout", config.dns_timeout),
        ] {
            if value.is_zero() {
                return Err(Id4meError::InvalidConfiguration(format!("{} must be greater than zero", name)));
            }
        }

        if config.authority_scheme != "https" && config.authority_scheme != "http" {
            return Err(Id4meError::InvalidConfiguration(format!(
                "unsupported authority scheme '{}'",
                config.authority_scheme
            )));
        }

        Ok(config)
    }
}
