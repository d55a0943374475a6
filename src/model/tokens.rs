// src/model/tokens.rs

use crate::model::jwt::IdToken;
use serde_json::{Map, Value};

/// The validated result of an authorization-code exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorizationTokens {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
    pub token_type: Option<String>,
    pub expires_in: Option<u64>,
    /// The raw, compact ID Token.
    pub id_token: String,
    /// `id4me.identifier` from the ID Token.
    pub identifier: Option<String>,
    pub iss: Option<String>,
    pub sub: Option<String>,
    decoded_id_token: IdToken,
    data: Map<String, Value>,
}

impl AuthorizationTokens {
    /// Builds the tokens from the token-endpoint payload and its validated ID Token.
    ///
    /// `identifier`, `iss` and `sub` of the ID Token are merged into the payload.
    pub fn new(mut data: Map<String, Value>, decoded_id_token: IdToken) -> Self {
        let identifier = decoded_id_token.id4me_identifier().map(str::to_string);
        let iss = decoded_id_token.iss().map(str::to_string);
        let sub = decoded_id_token.sub().map(str::to_string);
        for (key, value) in [("identifier", &identifier), ("iss", &iss), ("sub", &sub)] {
            if let Some(value) = value {
                data.insert(key.to_string(), Value::String(value.clone()));
            }
        }

        Self {
            access_token: string(&data, "access_token"),
            refresh_token: string(&data, "refresh_token"),
            scope: string(&data, "scope"),
            token_type: string(&data, "token_type"),
            expires_in: data.get("expires_in").and_then(|v| match v {
                Value::Number(n) => n.as_u64(),
                Value::String(s) => s.parse().ok(),
                _ => None,
            }),
            id_token: string(&data, "id_token").unwrap_or_default(),
            identifier,
            iss,
            sub,
            decoded_id_token,
            data,
        }
    }

    pub fn decoded_id_token(&self) -> &IdToken {
        &self.decoded_id_token
    }

    /// The token-endpoint payload, including the merged `identifier`, `iss` and `sub`.
    pub fn authorization_data(&self) -> &Map<String, Value> {
        &self.data
    }
}

fn string(data: &Map<String, Value>, key: &str) -> Option<String> {
    data.get(key).and_then(Value::as_str).map(str::to_string)
}
