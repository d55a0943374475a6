// src/registration.rs

use crate::config::{ApplicationType, Config};
use crate::error::Id4meError;
use crate::http::{merge_headers, HttpClient};
use crate::model::client::Client;
use crate::model::openid_config::OpenIdConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

/// The only signing algorithm requested for UserInfo responses.
const USERINFO_SIGNING_ALG: &str = "RS256";

#[derive(Debug, Serialize)]
struct RegistrationRequest<'a> {
    client_name: &'a str,
    application_type: ApplicationType,
    redirect_uris: [&'a str; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    userinfo_signed_response_alg: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct RegistrationResponse {
    client_id: Option<String>,
    client_secret: Option<String>,
    client_name: Option<String>,
    #[serde(default)]
    client_secret_expires_at: Option<u64>,
    #[serde(default)]
    redirect_uris: Vec<String>,
    userinfo_signed_response_alg: Option<String>,
}

/// OpenID Connect Dynamic Client Registration against an identity authority.
#[derive(Clone)]
pub struct Registration {
    http: Arc<dyn HttpClient>,
    config: Arc<Config>,
}

impl Registration {
    pub fn new(http: Arc<dyn HttpClient>, config: Arc<Config>) -> Self {
        Self { http, config }
    }

    /// Registers a client named `identifier` with a single redirect URI.
    ///
    /// A signed UserInfo response is requested when the authority supports
    /// RS256 for it.
    #[instrument(skip(self, open_id_config), fields(issuer = %open_id_config.issuer), err)]
    pub async fn register(
        &self,
        open_id_config: &OpenIdConfig,
        identifier: &str,
        redirect_url: &str,
        application_type: ApplicationType,
    ) -> Result<Client, Id4meError> {
        let endpoint = open_id_config.registration_endpoint()?;
        let request = RegistrationRequest {
            client_name: identifier,
            application_type,
            redirect_uris: [redirect_url],
            userinfo_signed_response_alg: open_id_config
                .supports_userinfo_signing_alg(USERINFO_SIGNING_ALG)
                .then_some(USERINFO_SIGNING_ALG),
        };

        let headers = merge_headers(
            &self.config.request_headers,
            &[("Content-Type", "application/json".to_string())],
        );
        let body = self
            .http
            .post(endpoint, serde_json::to_string(&request)?, &headers)
            .await?;
        if body.trim().is_empty() {
            return Err(Id4meError::Registration("empty registration response".to_string()));
        }

        let response: RegistrationResponse = serde_json::from_str(&body)?;
        let client_id = response
            .client_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Id4meError::Registration("registration response has no client_id".to_string()))?;

        info!("Registered client {} at {}", client_id, open_id_config.issuer);
        Ok(Client {
            issuer: open_id_config.issuer.clone(),
            client_name: response.client_name,
            client_id,
            client_secret: response.client_secret.unwrap_or_default(),
            client_expiration_time: response.client_secret_expires_at.unwrap_or(0),
            active_redirect_uri: redirect_url.to_string(),
            redirect_uris: response.redirect_uris,
            userinfo_signed_response_alg: response.userinfo_signed_response_alg,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeHttp;
    use serde_json::{json, Value};

    const ENDPOINT: &str = "https://id.denic.de/clients";

    fn metadata(signing_algs: Option<Value>) -> OpenIdConfig {
        let mut doc = json!({"issuer": "https://id.denic.de", "registration_endpoint": ENDPOINT});
        if let Some(algs) = signing_algs {
            doc["userinfo_signing_alg_values_supported"] = algs;
        }
        OpenIdConfig::from_value(doc).unwrap()
    }

    fn registration(http: &Arc<FakeHttp>) -> Registration {
        Registration::new(http.clone(), Arc::new(Config::default()))
    }

    #[tokio::test]
    async fn requests_signed_userinfo_when_supported() {
        let http = Arc::new(FakeHttp::new().respond(
            ENDPOINT,
            json!({
                "client_id": "cid",
                "client_secret": "secret",
                "client_name": "rezepte-elster.de",
                "client_secret_expires_at": 0,
                "redirect_uris": ["https://rp.example/cb", "https://rp.example/other"],
                "userinfo_signed_response_alg": "RS256"
            })
            .to_string(),
        ));

        let client = registration(&http)
            .register(
                &metadata(Some(json!(["RS256"]))),
                "rezepte-elster.de",
                "https://rp.example/cb",
                ApplicationType::Web,
            )
            .await
            .unwrap();

        let request = &http.requests_to(ENDPOINT)[0];
        assert_eq!(request.header("Content-Type"), Some("application/json"));
        let sent: Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(
            sent,
            json!({
                "client_name": "rezepte-elster.de",
                "application_type": "web",
                "redirect_uris": ["https://rp.example/cb"],
                "userinfo_signed_response_alg": "RS256"
            })
        );

        assert_eq!(client.issuer, "https://id.denic.de");
        assert_eq!(client.client_id, "cid");
        assert_eq!(client.client_secret, "secret");
        assert_eq!(client.active_redirect_uri, "https://rp.example/cb");
        assert_eq!(client.redirect_uris.len(), 2);
        assert!(client.expects_signed_userinfo());
    }

    #[tokio::test]
    async fn plain_userinfo_when_rs256_unsupported() {
        let http = Arc::new(FakeHttp::new().respond(ENDPOINT, r#"{"client_id":"cid","client_secret":"s"}"#));
        let client = registration(&http)
            .register(&metadata(Some(json!(["ES256"]))), "x.example", "https://rp/cb", ApplicationType::Native)
            .await
            .unwrap();

        let sent: Value = serde_json::from_str(http.requests()[0].body.as_deref().unwrap()).unwrap();
        assert!(sent.get("userinfo_signed_response_alg").is_none());
        assert_eq!(sent["application_type"], "native");
        assert!(!client.expects_signed_userinfo());
        assert_eq!(client.client_expiration_time, 0);
    }

    #[tokio::test]
    async fn response_without_client_id_fails() {
        let http = Arc::new(FakeHttp::new().respond(ENDPOINT, r#"{"error":"invalid_redirect_uri"}"#));
        let err = registration(&http)
            .register(&metadata(None), "x.example", "https://rp/cb", ApplicationType::Web)
            .await
            .unwrap_err();
        assert!(matches!(err, Id4meError::Registration(_)));
    }

    #[tokio::test]
    async fn missing_registration_endpoint_fails_before_sending() {
        let http = Arc::new(FakeHttp::new());
        let config = OpenIdConfig::from_value(json!({"issuer": "https://id.denic.de"})).unwrap();
        let err = registration(&http)
            .register(&config, "x.example", "https://rp/cb", ApplicationType::Web)
            .await
            .unwrap_err();
        assert!(matches!(err, Id4meError::MissingConfiguration(_)));
        assert!(http.requests().is_empty());
    }
}
