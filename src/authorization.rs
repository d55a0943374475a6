// src/authorization.rs

use crate::config::Config;
use crate::error::Id4meError;
use crate::http::{merge_headers, HttpClient};
use crate::model::claims::ClaimRequestList;
use crate::model::client::Client;
use crate::model::jwt::{IdToken, Jwt};
use crate::model::openid_config::OpenIdConfig;
use crate::model::tokens::AuthorizationTokens;
use crate::model::userinfo::UserInfo;
use crate::openid_config::OpenIdConfigResolver;
use crate::validator::{IssuerMatch, Validator};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use moka::future::Cache;
use serde_json::{Map, Value};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

const CLAIM_NAMES: &str = "_claim_names";
const CLAIM_SOURCES: &str = "_claim_sources";

/// Upper bound of distinct `(endpoint, access_token)` pairs remembered while
/// resolving one UserInfo tree.
const USER_INFO_CACHE_CAPACITY: u64 = 64;

type Claims = Map<String, Value>;
type UserInfoCache = Cache<(String, String), Claims>;
type ClaimsFuture<'a> = Pin<Box<dyn Future<Output = Result<Claims, Id4meError>> + Send + 'a>>;

/// The parameters of an authorization request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthorizationRequest {
    pub client_id: String,
    /// Sent as `login_hint`.
    pub identifier: String,
    pub redirect_uri: String,
    pub state: Option<String>,
    pub prompt: Option<String>,
    pub userinfo_claims: Option<ClaimRequestList>,
    pub id_token_claims: Option<ClaimRequestList>,
    /// Extra scopes; `openid` is always requested.
    pub scopes: Vec<String>,
}

impl AuthorizationRequest {
    pub fn new(client_id: impl Into<String>, identifier: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            identifier: identifier.into(),
            redirect_uri: redirect_uri.into(),
            ..Self::default()
        }
    }

    /// A request for a registered client, redirecting to its active redirect URI.
    pub fn for_client(client: &Client, identifier: impl Into<String>) -> Self {
        Self::new(client.client_id.clone(), identifier, client.active_redirect_uri.clone())
    }

    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn userinfo_claims(mut self, claims: ClaimRequestList) -> Self {
        self.userinfo_claims = Some(claims);
        self
    }

    pub fn id_token_claims(mut self, claims: ClaimRequestList) -> Self {
        self.id_token_claims = Some(claims);
        self
    }

    pub fn scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// `openid` first unless the caller already listed it, then the caller's
    /// scopes in order, without duplicates.
    fn scope(&self) -> String {
        let mut scopes: Vec<&str> = Vec::with_capacity(self.scopes.len() + 1);
        if !self.scopes.iter().any(|s| s == "openid") {
            scopes.push("openid");
        }
        for scope in &self.scopes {
            if !scope.is_empty() && !scopes.contains(&scope.as_str()) {
                scopes.push(scope);
            }
        }
        scopes.join(" ")
    }

    fn claims(&self) -> Option<Value> {
        if self.userinfo_claims.is_none() && self.id_token_claims.is_none() {
            return None;
        }
        let mut claims = Map::new();
        if let Some(list) = &self.userinfo_claims {
            claims.insert("userinfo".to_string(), Value::Object(list.to_request_object()));
        }
        if let Some(list) = &self.id_token_claims {
            claims.insert("id_token".to_string(), Value::Object(list.to_request_object()));
        }
        Some(Value::Object(claims))
    }
}

/// The authorization-code flow: authorization URL, token exchange and UserInfo.
#[derive(Clone)]
pub struct Authorization {
    http: Arc<dyn HttpClient>,
    config: Arc<Config>,
    validator: Validator,
    resolver: OpenIdConfigResolver,
}

impl Authorization {
    pub fn new(http: Arc<dyn HttpClient>, config: Arc<Config>, validator: Validator) -> Self {
        let resolver = OpenIdConfigResolver::new(http.clone(), config.clone());
        Self {
            http,
            config,
            validator,
            resolver,
        }
    }

    /// Builds the URL the user agent is redirected to.
    ///
    /// Parameters appear as `client_id`, `login_hint`, `redirect_uri`,
    /// `response_type`, `scope`, then `state`, `prompt` and `claims` when
    /// set. Values are percent-encoded per RFC 3986.
    pub fn get_authorization_url(&self, authorization_endpoint: &str, request: &AuthorizationRequest) -> String {
        let mut query: Vec<(&str, String)> = vec![
            ("client_id", request.client_id.clone()),
            ("login_hint", request.identifier.clone()),
            ("redirect_uri", request.redirect_uri.clone()),
            ("response_type", "code".to_string()),
            ("scope", request.scope()),
        ];
        if let Some(state) = request.state.as_ref().filter(|s| !s.is_empty()) {
            query.push(("state", state.clone()));
        }
        if let Some(prompt) = request.prompt.as_ref().filter(|p| !p.is_empty()) {
            query.push(("prompt", prompt.clone()));
        }
        if let Some(claims) = request.claims() {
            query.push(("claims", claims.to_string()));
        }

        let query = query
            .iter()
            .map(|(name, value)| format!("{}={}", name, urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", authorization_endpoint, query)
    }

    /// Fetches the authority's JSON Web Key Set document.
    #[instrument(skip(self), err)]
    pub async fn get_jwks(&self, jwks_uri: &str) -> Result<Value, Id4meError> {
        let headers = merge_headers(&self.config.request_headers, &[]);
        let body = self.http.get(jwks_uri, &headers).await?;
        if body.trim().is_empty() {
            return Err(Id4meError::InvalidIdToken("Unable to retrieve authority JWS keys".to_string()));
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Exchanges an authorization code and validates the returned ID Token.
    #[instrument(skip(self, open_id_config, code, client_secret), err)]
    pub async fn get_access_tokens(
        &self,
        open_id_config: &OpenIdConfig,
        code: &str,
        redirect_url: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Result<AuthorizationTokens, Id4meError> {
        let jwks = self.get_jwks(open_id_config.jwks_uri()?).await?;
        let data = self
            .request_tokens(open_id_config, code, redirect_url, client_id, client_secret)
            .await?;

        let id_token = data
            .get("id_token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .map(IdToken::parse)
            .ok_or_else(|| Id4meError::InvalidIdToken("ID Token not found".to_string()))?;

        self.validator
            .validate_id_token(&id_token, open_id_config, &jwks, client_id)?;
        debug!("ID Token of {} validated", id_token.sub().unwrap_or_default());
        Ok(AuthorizationTokens::new(data, id_token))
    }

    /// Same as [`Authorization::get_access_tokens`], using the credentials of
    /// a registered client and, unless overridden, its active redirect URI.
    pub async fn get_authorization_tokens(
        &self,
        open_id_config: &OpenIdConfig,
        code: &str,
        client: &Client,
        redirect_url: Option<&str>,
    ) -> Result<AuthorizationTokens, Id4meError> {
        self.get_access_tokens(
            open_id_config,
            code,
            redirect_url.unwrap_or(&client.active_redirect_uri),
            &client.client_id,
            &client.client_secret,
        )
        .await
    }

    async fn request_tokens(
        &self,
        open_id_config: &OpenIdConfig,
        code: &str,
        redirect_url: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Result<Claims, Id4meError> {
        let form = serde_urlencoded::to_string([
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_url),
        ])
        .map_err(|e| Id4meError::InvalidUrl(e.to_string()))?;
        let credentials = STANDARD.encode(format!("{}:{}", client_id, client_secret));
        let headers = merge_headers(
            &self.config.request_headers,
            &[
                ("Content-Type", "application/x-www-form-urlencoded".to_string()),
                ("Authorization", format!("Basic {}", credentials)),
            ],
        );

        let body = self
            .http
            .post(open_id_config.token_endpoint()?, form, &headers)
            .await?;
        if body.trim().is_empty() {
            return Err(Id4meError::InvalidIdToken("Unable to retrieve access tokens".to_string()));
        }
        match serde_json::from_str(&body)? {
            Value::Object(data) => Ok(data),
            _ => Err(Id4meError::InvalidIdToken("ID Token not found".to_string())),
        }
    }

    /// Fetches the user's claims, resolving distributed claims up to
    /// `distributed_claims_depth` levels deep.
    ///
    /// Each `(endpoint, access_token)` pair is fetched at most once per call;
    /// a repeated source is still resolved to the depth left at that reference.
    #[instrument(skip(self, open_id_config, client, tokens), err)]
    pub async fn get_user_info(
        &self,
        open_id_config: &OpenIdConfig,
        client: &Client,
        tokens: &AuthorizationTokens,
        distributed_claims_depth: u32,
    ) -> Result<UserInfo, Id4meError> {
        let access_token = tokens
            .access_token
            .as_deref()
            .ok_or_else(|| Id4meError::InvalidUserInfo("No access token available".to_string()))?;
        let cache: UserInfoCache = Cache::new(USER_INFO_CACHE_CAPACITY);

        let claims = self
            .fetch_user_info(
                open_id_config.userinfo_endpoint()?,
                client,
                Some(open_id_config),
                access_token,
                distributed_claims_depth,
                &cache,
            )
            .await?;
        Ok(UserInfo::new(claims))
    }

    /// One UserInfo request; `config` is `None` for distributed sources,
    /// whose issuer is taken from the signed response itself.
    fn fetch_user_info<'a>(
        &'a self,
        endpoint: &'a str,
        client: &'a Client,
        config: Option<&'a OpenIdConfig>,
        access_token: &'a str,
        depth: u32,
        cache: &'a UserInfoCache,
    ) -> ClaimsFuture<'a> {
        Box::pin(async move {
            let key = (endpoint.to_string(), access_token.to_string());
            let mut claims = match cache.get(&key).await {
                Some(claims) => {
                    debug!("Reusing claims already fetched from {}", endpoint);
                    claims
                }
                None => {
                    let claims = self.load_user_info(endpoint, client, config, access_token).await?;
                    cache.insert(key, claims.clone()).await;
                    claims
                }
            };

            // Cached entries are unresolved; resolution follows the depth of this reference.
            if depth > 0 {
                let added = self.resolve_distributed_claims(&claims, client, depth, cache).await?;
                claims.remove(CLAIM_SOURCES);
                claims.remove(CLAIM_NAMES);
                claims.extend(added);
            }
            Ok(claims)
        })
    }

    /// The validated claims of one response, distributed sources untouched.
    async fn load_user_info(
        &self,
        endpoint: &str,
        client: &Client,
        config: Option<&OpenIdConfig>,
        access_token: &str,
    ) -> Result<Claims, Id4meError> {
        let body = self.request_user_info(endpoint, client, access_token).await?;
        if client.expects_signed_userinfo() {
            return self.verified_user_info(&body, client, config).await;
        }
        match serde_json::from_str(&body)? {
            Value::Object(claims) => Ok(claims),
            _ => Err(Id4meError::InvalidUserInfo("Unable to retrieve user info".to_string())),
        }
    }

    async fn request_user_info(&self, endpoint: &str, client: &Client, access_token: &str) -> Result<String, Id4meError> {
        let accept = if client.expects_signed_userinfo() {
            "application/jwt"
        } else {
            "application/json"
        };
        let headers = merge_headers(
            &self.config.request_headers,
            &[
                ("Authorization", format!("Bearer {}", access_token)),
                ("Accept", accept.to_string()),
            ],
        );

        let body = self.http.get(endpoint, &headers).await?;
        if body.trim().is_empty() {
            return Err(Id4meError::InvalidUserInfo("Unable to retrieve user info".to_string()));
        }
        Ok(body)
    }

    async fn verified_user_info(
        &self,
        body: &str,
        client: &Client,
        config: Option<&OpenIdConfig>,
    ) -> Result<Claims, Id4meError> {
        let jwt = Jwt::parse(body.trim());
        let derived;
        let config = match config {
            Some(config) => config,
            None => {
                let iss = jwt.iss().unwrap_or_default();
                debug!("Loading OpenID configuration of claims provider {}", iss);
                derived = self.resolver.from_issuer_url(iss, IssuerMatch::Loose).await?;
                &derived
            }
        };

        let jwks = self.get_jwks(config.jwks_uri()?).await?;
        self.validator
            .validate_user_info(&jwt, config, &jwks, &client.client_id)?;
        Ok(jwt.into_body())
    }

    /// Fetches every distributed source and keeps the claims `_claim_names`
    /// attributes to it.
    async fn resolve_distributed_claims(
        &self,
        claims: &Claims,
        client: &Client,
        depth: u32,
        cache: &UserInfoCache,
    ) -> Result<Claims, Id4meError> {
        let mut added = Claims::new();
        let (Some(Value::Object(names)), Some(Value::Object(sources))) =
            (claims.get(CLAIM_NAMES), claims.get(CLAIM_SOURCES))
        else {
            return Ok(added);
        };

        for (source_name, source) in sources {
            let distributed = source.as_object().and_then(|source| {
                Some((
                    source.get("endpoint")?.as_str()?,
                    source.get("access_token")?.as_str()?,
                ))
            });
            let Some((endpoint, access_token)) = distributed else {
                warn!("Aggregated claims are not supported, ignoring claim source {}", source_name);
                continue;
            };

            debug!("Resolving distributed claims of {} from {}", source_name, endpoint);
            let remote = self
                .fetch_user_info(endpoint, client, None, access_token, depth - 1, cache)
                .await?;
            for (name, value) in remote {
                if names.get(&name).and_then(Value::as_str) == Some(source_name.as_str()) {
                    added.insert(name, value);
                }
            }
        }
        Ok(added)
    }
}
