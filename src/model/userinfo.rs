// src/model/userinfo.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

macro_rules! string_claims {
    ($($(#[$doc:meta])* $method:ident => $claim:literal),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $method(&self) -> Option<&str> {
                self.claim($claim).and_then(Value::as_str)
            }
        )*
    };
}

/// The claims returned by a UserInfo endpoint, merged with any resolved
/// distributed claims.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct UserInfo {
    claims: Map<String, Value>,
}

impl UserInfo {
    pub fn new(claims: Map<String, Value>) -> Self {
        Self { claims }
    }

    /// Any claim by name.
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    pub fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }

    pub fn into_claims(self) -> Map<String, Value> {
        self.claims
    }

    string_claims! {
        iss => "iss",
        sub => "sub",
        /// The ID4me identifier (`id4me.identifier`).
        id4me_identifier => "id4me.identifier",
        name => "name",
        given_name => "given_name",
        family_name => "family_name",
        middle_name => "middle_name",
        nickname => "nickname",
        preferred_username => "preferred_username",
        profile => "profile",
        picture => "picture",
        website => "website",
        email => "email",
        gender => "gender",
        /// `YYYY-MM-DD` or `YYYY`.
        birthdate => "birthdate",
        zoneinfo => "zoneinfo",
        locale => "locale",
        phone_number => "phone_number",
    }

    pub fn email_verified(&self) -> Option<bool> {
        self.claim("email_verified").and_then(Value::as_bool)
    }

    pub fn phone_number_verified(&self) -> Option<bool> {
        self.claim("phone_number_verified").and_then(Value::as_bool)
    }

    /// `updated_at`, given in seconds since the epoch.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        let epoch = match self.claim("updated_at")? {
            Value::Number(n) => n.as_i64()?,
            Value::String(s) => s.parse().ok()?,
            _ => return None,
        };
        DateTime::from_timestamp(epoch, 0)
    }

    pub fn address(&self) -> Option<UserInfoAddress> {
        match self.claim("address")? {
            Value::Object(address) => Some(UserInfoAddress {
                claims: address.clone(),
            }),
            _ => None,
        }
    }
}

/// The `address` claim.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct UserInfoAddress {
    claims: Map<String, Value>,
}

impl UserInfoAddress {
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    string_claims! {
        formatted => "formatted",
        street_address => "street_address",
        locality => "locality",
        region => "region",
        postal_code => "postal_code",
        country => "country",
    }
}
