#![allow(dead_code)]

use id4me_rp::base64url;
use jsonwebtoken::{encode, EncodingKey, Header};
use jsonwebtoken::Algorithm;
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::{pkcs8::DecodePrivateKey, RsaPrivateKey};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const KID: &str = "integration-key";
pub const NOW: u64 = 1_700_000_000;

/// A sample 2048-bit PKCS#8 RSA private key for testing.
const PRIVATE_KEY_PEM: &str = include_str!("../fixtures/rsa_private_key.pem");

pub fn private_key() -> RsaPrivateKey {
    RsaPrivateKey::from_pkcs8_pem(PRIVATE_KEY_PEM).expect("test key should parse")
}

/// Signs `claims` as an RS256 JWS carrying `kid` in its header.
pub fn sign(claims: &Value) -> String {
    let der = private_key().to_pkcs1_der().expect("test key should encode");
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(KID.to_string());
    encode(&header, claims, &EncodingKey::from_rsa_der(der.as_bytes())).expect("signing should succeed")
}

pub fn jwks() -> Value {
    let public = private_key().to_public_key();
    json!({"keys": [{
        "kty": "RSA",
        "kid": KID,
        "use": "sig",
        "alg": "RS256",
        "n": base64url::encode(public.n().to_bytes_be()),
        "e": base64url::encode(public.e().to_bytes_be()),
    }]})
}

/// Serves a minimal OpenID configuration plus the JWKS of the test key.
pub async fn mount_authority(server: &MockServer) {
    let issuer = server.uri();
    Mock::given(method("GET"))
        .and(path("/.well-known/openid-configuration"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            json!({
                "issuer": issuer,
                "jwks_uri": format!("{}/jwks.json", issuer),
                "authorization_endpoint": format!("{}/login", issuer),
                "token_endpoint": format!("{}/token", issuer),
                "registration_endpoint": format!("{}/clients", issuer),
                "userinfo_endpoint": format!("{}/userinfo", issuer),
                "userinfo_signing_alg_values_supported": ["RS256"]
            })
            .to_string(),
        ))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/jwks.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(jwks()))
        .mount(server)
        .await;
}

/// Routes library logs to the test output; filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// The `host:port` part of a mock server, as announced in a DNS record.
pub fn authority_of(server: &MockServer) -> String {
    server.address().to_string()
}
