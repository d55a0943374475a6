// src/http.rs

use crate::config::Config;
use crate::error::Id4meError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, instrument};

/// A list of request headers as `(name, value)` pairs.
pub type Headers = [(String, String)];

/// The HTTP capability the relying party needs from its environment.
///
/// Implementations return the raw response body. A failed request (transport
/// error, timeout or non-success status) is an `Err`; an empty body is
/// returned as an empty string and rejected by the caller.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: &str, headers: &Headers) -> Result<String, Id4meError>;

    async fn post(&self, url: &str, body: String, headers: &Headers) -> Result<String, Id4meError>;
}

/// An `HttpClient` backed by `reqwest`.
#[derive(Clone)]
pub struct ReqwestHttpClient {
    // The client is internally ref-counted to allow for cheap cloning.
    inner: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Creates a client with the timeouts and user agent from `config`.
    pub fn new(config: &Config) -> Result<Self, Id4meError> {
        let inner = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { inner })
    }

    /// Wraps an already configured `reqwest::Client`.
    pub fn from_client(inner: reqwest::Client) -> Self {
        Self { inner }
    }

    fn header_map(headers: &Headers) -> Result<HeaderMap, Id4meError> {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Id4meError::Http(format!("invalid header name '{}': {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Id4meError::Http(format!("invalid value for header '{}': {}", name, e)))?;
            map.insert(name, value);
        }
        Ok(map)
    }

    async fn read_body(url: &str, response: reqwest::Response) -> Result<String, Id4meError> {
        let status = response.status();
        if !status.is_success() {
            return Err(Id4meError::Http(format!("{} responded with status {}", url, status)));
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    #[instrument(skip(self, headers), err)]
    async fn get(&self, url: &str, headers: &Headers) -> Result<String, Id4meError> {
        let response = self.inner.get(url).headers(Self::header_map(headers)?).send().await?;
        debug!("GET {} -> {}", url, response.status());
        Self::read_body(url, response).await
    }

    #[instrument(skip(self, body, headers), err)]
    async fn post(&self, url: &str, body: String, headers: &Headers) -> Result<String, Id4meError> {
        let response = self
            .inner
            .post(url)
            .headers(Self::header_map(headers)?)
            .body(body)
            .send()
            .await?;
        debug!("POST {} -> {}", url, response.status());
        Self::read_body(url, response).await
    }
}

/// Merges the configured extra headers with the headers an operation needs.
///
/// Operation headers win over configured ones with the same name.
pub(crate) fn merge_headers(extra: &Headers, own: &[(&str, String)]) -> Vec<(String, String)> {
    let mut merged: Vec<(String, String)> = extra
        .iter()
        .filter(|(name, _)| !own.iter().any(|(own_name, _)| own_name.eq_ignore_ascii_case(name)))
        .cloned()
        .collect();
    merged.extend(own.iter().map(|(name, value)| (name.to_string(), value.clone())));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> ReqwestHttpClient {
        ReqwestHttpClient::new(&Config::default()).unwrap()
    }

    #[test]
    fn merge_prefers_operation_headers() {
        let extra = vec![
            ("accept".to_string(), "text/plain".to_string()),
            ("X-Tenant".to_string(), "t1".to_string()),
        ];
        let merged = merge_headers(&extra, &[("Accept", "application/json".to_string())]);
        assert_eq!(
            merged,
            vec![
                ("X-Tenant".to_string(), "t1".to_string()),
                ("Accept".to_string(), "application/json".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn get_sends_headers_and_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/doc"))
            .and(header("Accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"ok\":true}"))
            .mount(&server)
            .await;

        let body = client()
            .get(
                &format!("{}/doc", server.uri()),
                &[("Accept".to_string(), "application/json".to_string())],
            )
            .await
            .unwrap();
        assert_eq!(body, "{\"ok\":true}");
    }

    #[tokio::test]
    async fn post_forwards_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string("a=b"))
            .respond_with(ResponseTemplate::new(200).set_body_string("done"))
            .mount(&server)
            .await;

        let body = client()
            .post(&format!("{}/token", server.uri()), "a=b".to_string(), &[])
            .await
            .unwrap();
        assert_eq!(body, "done");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = client().get(&format!("{}/missing", server.uri()), &[]).await;
        assert!(matches!(result, Err(Id4meError::Http(msg)) if msg.contains("503")));
    }
}
