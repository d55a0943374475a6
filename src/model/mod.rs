// src/model/mod.rs

//! Data types exchanged with ID4me authorities and agents.

pub mod claims;
pub mod client;
pub mod dns_record;
pub mod jwk;
pub mod jwt;
pub mod openid_config;
pub mod tokens;
pub mod userinfo;

pub use claims::{ClaimRequest, ClaimRequestList};
pub use client::Client;
pub use dns_record::OpenIdDnsRecord;
pub use jwk::{Jwk, Jwks, JsonWebKey, KeyType, RsaJwk};
pub use jwt::{IdToken, Jwt};
pub use openid_config::OpenIdConfig;
pub use tokens::AuthorizationTokens;
pub use userinfo::{UserInfo, UserInfoAddress};
