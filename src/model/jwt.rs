// src/model/jwt.rs

use crate::base64url;
use crate::error::Id4meError;
use serde_json::{Map, Value};
use std::ops::Deref;

/// A compact-serialized JSON Web Token, kept both raw and decoded.
///
/// Parsing never fails. A token that does not split into three segments, or
/// whose segments do not decode, leaves the decoded parts empty and reports
/// `false` from [`Jwt::is_well_formed`]; signature validation rejects it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Jwt {
    raw_header: String,
    raw_body: String,
    raw_signature: String,
    header: Map<String, Value>,
    body: Map<String, Value>,
    signature: Vec<u8>,
    well_formed: bool,
}

impl Jwt {
    pub fn parse(token: &str) -> Self {
        let parts: Vec<&str> = token.split('.').collect();
        let [raw_header, raw_body, raw_signature] = parts.as_slice() else {
            return Self::default();
        };

        let mut jwt = Self {
            raw_header: raw_header.to_string(),
            raw_body: raw_body.to_string(),
            raw_signature: raw_signature.to_string(),
            ..Self::default()
        };

        let header = decode_object(raw_header);
        let body = decode_object(raw_body);
        let signature = base64url::decode(raw_signature).ok();
        if let (Some(header), Some(body), Some(signature)) = (header, body, signature) {
            jwt.header = header;
            jwt.body = body;
            jwt.signature = signature;
            jwt.well_formed = true;
        }
        jwt
    }

    /// Assembles a token from decoded parts.
    pub fn from_parts(
        header: Map<String, Value>,
        body: Map<String, Value>,
        signature: Vec<u8>,
    ) -> Result<Self, Id4meError> {
        Ok(Self {
            raw_header: base64url::encode(serde_json::to_vec(&header)?),
            raw_body: base64url::encode(serde_json::to_vec(&body)?),
            raw_signature: base64url::encode(&signature),
            header,
            body,
            signature,
            well_formed: true,
        })
    }

    /// `<header>.<body>.<signature>`
    pub fn to_compact(&self) -> String {
        format!("{}.{}", self.signing_input(), self.raw_signature)
    }

    /// The exact bytes covered by the signature: `<raw-header>.<raw-body>`.
    pub fn signing_input(&self) -> String {
        format!("{}.{}", self.raw_header, self.raw_body)
    }

    pub fn is_well_formed(&self) -> bool {
        self.well_formed
    }

    pub fn raw_header(&self) -> &str {
        &self.raw_header
    }

    pub fn raw_body(&self) -> &str {
        &self.raw_body
    }

    pub fn raw_signature(&self) -> &str {
        &self.raw_signature
    }

    pub fn header(&self) -> &Map<String, Value> {
        &self.header
    }

    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    pub fn into_body(self) -> Map<String, Value> {
        self.body
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    pub fn header_value(&self, name: &str) -> Option<&Value> {
        self.header.get(name)
    }

    pub fn body_value(&self, name: &str) -> Option<&Value> {
        self.body.get(name)
    }

    pub fn alg(&self) -> Option<&str> {
        self.header_value("alg").and_then(Value::as_str)
    }

    pub fn kid(&self) -> Option<&str> {
        self.header_value("kid").and_then(Value::as_str)
    }

    pub fn iss(&self) -> Option<&str> {
        self.body_value("iss").and_then(Value::as_str)
    }
}

fn decode_object(segment: &str) -> Option<Map<String, Value>> {
    let bytes = base64url::decode(segment).ok()?;
    match serde_json::from_slice(&bytes).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// An OpenID Connect ID Token.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdToken(Jwt);

impl IdToken {
    pub fn parse(token: &str) -> Self {
        Self(Jwt::parse(token))
    }

    pub fn sub(&self) -> Option<&str> {
        self.body_value("sub").and_then(Value::as_str)
    }

    /// The ID4me identifier the user logged in with.
    pub fn id4me_identifier(&self) -> Option<&str> {
        self.body_value("id4me.identifier").and_then(Value::as_str)
    }

    /// Authentication methods references.
    pub fn amr(&self) -> Vec<&str> {
        match self.body_value("amr") {
            Some(Value::Array(methods)) => methods.iter().filter_map(Value::as_str).collect(),
            Some(Value::String(method)) => vec![method.as_str()],
            _ => Vec::new(),
        }
    }
}

impl Deref for IdToken {
    type Target = Jwt;

    fn deref(&self) -> &Jwt {
        &self.0
    }
}

impl From<Jwt> for IdToken {
    fn from(jwt: Jwt) -> Self {
        Self(jwt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn built_token_decodes_to_the_same_parts() {
        let header = object(json!({"alg": "RS256", "kid": "key-1", "typ": "JWT"}));
        let body = object(json!({"iss": "https://id.denic.de", "aud": ["cid"], "exp": 4102444800u64}));
        let built = Jwt::from_parts(header.clone(), body.clone(), vec![1, 2, 3, 250]).unwrap();

        let parsed = Jwt::parse(&built.to_compact());
        assert!(parsed.is_well_formed());
        assert_eq!(parsed.header(), &header);
        assert_eq!(parsed.body(), &body);
        assert_eq!(parsed.signature(), &[1, 2, 3, 250]);
        assert_eq!(parsed.alg(), Some("RS256"));
        assert_eq!(parsed.kid(), Some("key-1"));
        assert_eq!(parsed.iss(), Some("https://id.denic.de"));
        assert_eq!(parsed.signing_input(), format!("{}.{}", parsed.raw_header(), parsed.raw_body()));
    }

    #[test]
    fn wrong_segment_count_leaves_decoded_parts_empty() {
        for token in ["", "abc", "a.b", "a.b.c.d"] {
            let jwt = Jwt::parse(token);
            assert!(!jwt.is_well_formed(), "{token}");
            assert!(jwt.header().is_empty());
            assert!(jwt.body().is_empty());
            assert!(jwt.signature().is_empty());
        }
    }

    #[test]
    fn undecodable_segments_are_not_well_formed() {
        let jwt = Jwt::parse("not-json.still-not-json.sig");
        assert!(!jwt.is_well_formed());
        assert_eq!(jwt.raw_header(), "not-json");
        assert!(jwt.iss().is_none());
    }

    #[test]
    fn id_token_accessors() {
        let body = object(json!({
            "iss": "https://id.denic.de",
            "sub": "user-1",
            "id4me.identifier": "rezepte-elster.de",
            "amr": ["pwd", "otp"]
        }));
        let jwt = Jwt::from_parts(object(json!({"alg": "RS256"})), body, vec![0]).unwrap();
        let token = IdToken::parse(&jwt.to_compact());
        assert_eq!(token.sub(), Some("user-1"));
        assert_eq!(token.iss(), Some("https://id.denic.de"));
        assert_eq!(token.id4me_identifier(), Some("rezepte-elster.de"));
        assert_eq!(token.amr(), vec!["pwd", "otp"]);
    }
}
