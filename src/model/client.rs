// src/model/client.rs

use serde::{Deserialize, Serialize};

/// A dynamically registered client.
///
/// The host application must keep this value in its session between the
/// redirect to the authority and the callback; it is serializable for that
/// purpose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub issuer: String,
    pub client_name: Option<String>,
    pub client_id: String,
    pub client_secret: String,
    /// `client_secret_expires_at`; `0` means the secret does not expire.
    pub client_expiration_time: u64,
    /// The redirect URI used for the registration that produced this client.
    pub active_redirect_uri: String,
    /// All redirect URIs the authority echoed back.
    pub redirect_uris: Vec<String>,
    pub userinfo_signed_response_alg: Option<String>,
}

impl Client {
    /// Whether the authority was asked to sign UserInfo responses for this client.
    pub fn expects_signed_userinfo(&self) -> bool {
        self.userinfo_signed_response_alg.is_some()
    }
}
