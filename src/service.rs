// src/service.rs

use crate::authorization::{Authorization, AuthorizationRequest};
use crate::clock::Clock;
use crate::config::{ApplicationType, Config};
use crate::discovery::Discovery;
use crate::dns::DnsResolver;
use crate::error::Id4meError;
use crate::http::{HttpClient, ReqwestHttpClient};
use crate::model::client::Client;
use crate::model::dns_record::OpenIdDnsRecord;
use crate::model::openid_config::OpenIdConfig;
use crate::model::tokens::AuthorizationTokens;
use crate::model::userinfo::UserInfo;
use crate::openid_config::OpenIdConfigResolver;
use crate::registration::Registration;
use crate::validator::Validator;
use std::sync::Arc;

/// The relying-party facade for one ID4me login flow.
///
/// A login runs, in order: [`discover`](Service::discover),
/// [`get_open_id_config`](Service::get_open_id_config),
/// [`register`](Service::register) and
/// [`get_authorization_url`](Service::get_authorization_url); after the
/// user agent returns with a code, [`get_authorization_tokens`](Service::get_authorization_tokens)
/// and [`get_user_info`](Service::get_user_info).
///
/// The `Client` returned by registration must be kept by the host between
/// the redirect and the callback.
#[derive(Clone)]
pub struct Service {
    config: Arc<Config>,
    http: Arc<dyn HttpClient>,
    discovery: Discovery,
    resolver: OpenIdConfigResolver,
    registration: Registration,
    authorization: Authorization,
}

impl Service {
    /// Creates a service over the given HTTP and DNS capabilities.
    pub fn new(config: Config, http: Arc<dyn HttpClient>, dns: Arc<dyn DnsResolver>) -> Self {
        let config = Arc::new(config);
        Self {
            discovery: Discovery::new(dns, config.dns_timeout),
            resolver: OpenIdConfigResolver::new(http.clone(), config.clone()),
            registration: Registration::new(http.clone(), config.clone()),
            authorization: Authorization::new(http.clone(), config.clone(), Validator::new()),
            http,
            config,
        }
    }

    /// Creates a service using a `reqwest` client built from `config`.
    pub fn with_dns(config: Config, dns: Arc<dyn DnsResolver>) -> Result<Self, Id4meError> {
        let http = Arc::new(ReqwestHttpClient::new(&config)?);
        Ok(Self::new(config, http, dns))
    }

    /// Creates a service using `reqwest` and the system DNS configuration.
    #[cfg(feature = "hickory-dns")]
    pub fn from_system(config: Config) -> Result<Self, Id4meError> {
        let dns = Arc::new(crate::dns::HickoryDnsResolver::from_system_conf()?);
        Self::with_dns(config, dns)
    }

    /// Replaces the time source used for token expiration checks.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.authorization = Authorization::new(self.http.clone(), self.config.clone(), Validator::with_clock(clock));
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn discovery(&self) -> &Discovery {
        &self.discovery
    }

    pub fn authorization(&self) -> &Authorization {
        &self.authorization
    }

    /// Returns the identity authority host of `identifier`.
    pub async fn discover(&self, identifier: &str) -> Result<String, Id4meError> {
        self.discovery.discover(identifier).await
    }

    /// Returns the complete DNS record of `identifier`, identity agent included.
    pub async fn discover_record(&self, identifier: &str) -> Result<OpenIdDnsRecord, Id4meError> {
        self.discovery.get_open_id_dns_record(identifier).await
    }

    /// Fetches the OpenID configuration of a discovered authority host.
    pub async fn get_open_id_config(&self, identity_authority: &str) -> Result<OpenIdConfig, Id4meError> {
        self.resolver.from_authority(identity_authority).await
    }

    /// Restores an OpenID configuration, e.g. one kept in the host's session.
    pub fn create_open_id_config_from_json(&self, json: &str) -> Result<OpenIdConfig, Id4meError> {
        OpenIdConfigResolver::from_json(json)
    }

    /// Registers a client with the configured `application_type`.
    pub async fn register(
        &self,
        open_id_config: &OpenIdConfig,
        identifier: &str,
        redirect_url: &str,
    ) -> Result<Client, Id4meError> {
        self.register_as(open_id_config, identifier, redirect_url, self.config.application_type)
            .await
    }

    pub async fn register_as(
        &self,
        open_id_config: &OpenIdConfig,
        identifier: &str,
        redirect_url: &str,
        application_type: ApplicationType,
    ) -> Result<Client, Id4meError> {
        self.registration
            .register(open_id_config, identifier, redirect_url, application_type)
            .await
    }

    /// Builds the authorization URL against the authority's authorization endpoint.
    pub fn get_authorization_url(
        &self,
        open_id_config: &OpenIdConfig,
        request: &AuthorizationRequest,
    ) -> Result<String, Id4meError> {
        Ok(self
            .authorization
            .get_authorization_url(open_id_config.authorization_endpoint()?, request))
    }

    pub async fn get_authorization_tokens(
        &self,
        open_id_config: &OpenIdConfig,
        code: &str,
        client: &Client,
        redirect_url: Option<&str>,
    ) -> Result<AuthorizationTokens, Id4meError> {
        self.authorization
            .get_authorization_tokens(open_id_config, code, client, redirect_url)
            .await
    }

    /// Fetches the user's claims with the configured distributed-claims depth.
    pub async fn get_user_info(
        &self,
        open_id_config: &OpenIdConfig,
        client: &Client,
        tokens: &AuthorizationTokens,
    ) -> Result<UserInfo, Id4meError> {
        self.get_user_info_with_depth(open_id_config, client, tokens, self.config.distributed_claims_depth)
            .await
    }

    pub async fn get_user_info_with_depth(
        &self,
        open_id_config: &OpenIdConfig,
        client: &Client,
        tokens: &AuthorizationTokens,
        distributed_claims_depth: u32,
    ) -> Result<UserInfo, Id4meError> {
        self.authorization
            .get_user_info(open_id_config, client, tokens, distributed_claims_depth)
            .await
    }
}
