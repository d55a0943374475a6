// src/model/jwk.rs

use crate::base64url;
use crate::error::Id4meError;
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::signature::Verifier;
use rsa::{BigUint, RsaPublicKey};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use std::collections::HashMap;
use std::fmt;

/// Represents a single JSON Web Key (JWK) as defined in RFC 7517, as received.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonWebKey {
    pub kid: Option<String>,
    pub kty: Option<String>,
    #[serde(rename = "use")]
    pub use_purpose: Option<String>,
    pub alg: Option<String>,
    pub n: Option<String>,
    pub e: Option<String>,
}

/// The key types this crate can verify signatures with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    Rsa,
}

impl KeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::Rsa => "RSA",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A usable public key, one variant per supported `kty`.
#[derive(Debug, Clone)]
pub enum Jwk {
    Rsa(RsaJwk),
}

impl Jwk {
    pub fn from_json_web_key(key: &JsonWebKey) -> Result<Self, Id4meError> {
        match key.kty.as_deref() {
            Some("RSA") => Ok(Jwk::Rsa(RsaJwk::new(key)?)),
            Some(other) => Err(Id4meError::InvalidJwk(format!(
                "Invalid key type: {}, only RSA supported currently",
                other
            ))),
            None => Err(Id4meError::InvalidJwk("No key type specified".to_string())),
        }
    }

    pub fn key_type(&self) -> KeyType {
        match self {
            Jwk::Rsa(_) => KeyType::Rsa,
        }
    }

    /// Verifies `signature` over `content` with this key.
    pub fn verify(&self, content: &[u8], signature: &[u8]) -> bool {
        match self {
            Jwk::Rsa(key) => key.verify(content, signature),
        }
    }
}

/// An RSA public key decoded from its base64url `n`/`e` parameters.
#[derive(Debug, Clone)]
pub struct RsaJwk {
    pub kid: Option<String>,
    pub alg: Option<String>,
    public_key: RsaPublicKey,
}

impl RsaJwk {
    fn new(key: &JsonWebKey) -> Result<Self, Id4meError> {
        let n = decode_component(key.n.as_deref(), "n")?;
        let e = decode_component(key.e.as_deref(), "e")?;
        let public_key = RsaPublicKey::new(BigUint::from_bytes_be(&n), BigUint::from_bytes_be(&e))
            .map_err(|e| Id4meError::InvalidJwk(format!("Invalid RSA public key: {}", e)))?;

        Ok(Self {
            kid: key.kid.clone(),
            alg: key.alg.clone(),
            public_key,
        })
    }

    /// RSASSA-PKCS1-v1_5 with SHA-256.
    pub fn verify(&self, content: &[u8], signature: &[u8]) -> bool {
        let Ok(signature) = Signature::try_from(signature) else {
            return false;
        };
        VerifyingKey::<Sha256>::new(self.public_key.clone())
            .verify(content, &signature)
            .is_ok()
    }
}

fn decode_component(value: Option<&str>, name: &str) -> Result<Vec<u8>, Id4meError> {
    let value = value.ok_or_else(|| Id4meError::InvalidJwk(format!("RSA key without '{}'", name)))?;
    base64url::decode(value)
        .map_err(|e| Id4meError::InvalidJwk(format!("Invalid RSA '{}' parameter: {}", name, e)))
}

/// A JSON Web Key Set indexed by `kid`.
#[derive(Debug, Clone, Default)]
pub struct Jwks {
    keys: HashMap<String, Jwk>,
}

#[derive(Deserialize)]
struct JsonWebKeySet {
    keys: Vec<Value>,
}

impl Jwks {
    /// Builds the key set from its JSON document, keeping only keys of the
    /// given types. Keys without `kid` or `kty`, or of another type, are
    /// skipped.
    pub fn from_value(document: &Value, key_types: &[KeyType]) -> Result<Self, Id4meError> {
        let set: JsonWebKeySet = serde_json::from_value(document.clone())
            .map_err(|_| Id4meError::InvalidJwks("Invalid JWKS structure".to_string()))?;

        let mut keys = HashMap::new();
        for raw in &set.keys {
            let Ok(key) = serde_json::from_value::<JsonWebKey>(raw.clone()) else {
                continue;
            };
            let (Some(kid), Some(kty)) = (key.kid.as_deref(), key.kty.as_deref()) else {
                continue;
            };
            if !key_types.is_empty() && !key_types.iter().any(|t| t.as_str() == kty) {
                continue;
            }
            keys.insert(kid.to_string(), Jwk::from_json_web_key(&key)?);
        }
        Ok(Self { keys })
    }

    pub fn get(&self, kid: &str) -> Option<&Jwk> {
        self.keys.get(kid)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
