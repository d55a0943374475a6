// src/test_support.rs

//! Fakes and signing helpers shared by the unit tests.

use crate::base64url;
use crate::error::Id4meError;
use crate::http::{Headers, HttpClient};
use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;

pub const KID: &str = "test-key";

const PRIVATE_KEY_PEM: &str = include_str!("../tests/fixtures/rsa_private_key.pem");

pub fn private_key() -> RsaPrivateKey {
    RsaPrivateKey::from_pkcs8_pem(PRIVATE_KEY_PEM).unwrap()
}

/// The JWKS document publishing the test key under `kid`.
pub fn jwks(kid: &str) -> Value {
    let public = private_key().to_public_key();
    json!({"keys": [{
        "kty": "RSA",
        "kid": kid,
        "use": "sig",
        "alg": "RS256",
        "n": base64url::encode(public.n().to_bytes_be()),
        "e": base64url::encode(public.e().to_bytes_be()),
    }]})
}

/// Signs `claims` as an RS256 JWS with the test key, announcing `kid`.
pub fn sign_with_kid(kid: &str, claims: Value) -> String {
    let der = private_key().to_pkcs1_der().unwrap();
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    encode(&header, &claims, &EncodingKey::from_rsa_der(der.as_bytes())).unwrap()
}

pub fn sign_rs256(claims: Value) -> String {
    sign_with_kid(KID, claims)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: &'static str,
    pub url: String,
    pub body: Option<String>,
    pub headers: Vec<(String, String)>,
}

impl Request {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An `HttpClient` answering from a `url -> body` table and recording every request.
#[derive(Default)]
pub struct FakeHttp {
    responses: HashMap<String, String>,
    requests: Mutex<Vec<Request>>,
}

impl FakeHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, url: &str, body: impl Into<String>) -> Self {
        self.responses.insert(url.to_string(), body.into());
        self
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, url: &str) -> Vec<Request> {
        self.requests().into_iter().filter(|r| r.url == url).collect()
    }

    fn answer(&self, request: Request) -> Result<String, Id4meError> {
        let url = request.url.clone();
        self.requests.lock().unwrap().push(request);
        self.responses
            .get(&url)
            .cloned()
            .ok_or_else(|| Id4meError::Http(format!("{} responded with status 404 Not Found", url)))
    }
}

#[async_trait]
impl HttpClient for FakeHttp {
    async fn get(&self, url: &str, headers: &Headers) -> Result<String, Id4meError> {
        self.answer(Request {
            method: "GET",
            url: url.to_string(),
            body: None,
            headers: headers.to_vec(),
        })
    }

    async fn post(&self, url: &str, body: String, headers: &Headers) -> Result<String, Id4meError> {
        self.answer(Request {
            method: "POST",
            url: url.to_string(),
            body: Some(body),
            headers: headers.to_vec(),
        })
    }
}
