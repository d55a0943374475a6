// src/lib.rs

//! An ID4me relying party: DNS discovery of the identity authority, dynamic
//! client registration, the OpenID Connect authorization-code flow and
//! validation of the returned tokens, including distributed claims.

pub mod authorization;
pub mod base64url;
pub mod clock;
pub mod config;
pub mod discovery;
pub mod dns;
pub mod error;
pub mod http;
pub mod model;
pub mod openid_config;
pub mod registration;
pub mod service;
pub mod validator;

#[cfg(test)]
mod test_support;

/// The public prelude for the `id4me-rp` crate.
///
/// This module re-exports the most commonly used types for convenience.
pub mod prelude {
    pub use crate::authorization::{Authorization, AuthorizationRequest};
    pub use crate::clock::{Clock, FixedClock, SystemClock};
    pub use crate::config::{ApplicationType, Config, ConfigBuilder};
    pub use crate::discovery::Discovery;
    #[cfg(feature = "hickory-dns")]
    pub use crate::dns::HickoryDnsResolver;
    pub use crate::dns::{DnsResolver, StaticDnsResolver};
    pub use crate::error::Id4meError;
    pub use crate::http::{HttpClient, ReqwestHttpClient};
    pub use crate::model::{
        AuthorizationTokens, ClaimRequest, ClaimRequestList, Client, IdToken, Jwt, OpenIdConfig, OpenIdDnsRecord,
        UserInfo, UserInfoAddress,
    };
    pub use crate::openid_config::OpenIdConfigResolver;
    pub use crate::registration::Registration;
    pub use crate::service::Service;
    pub use crate::validator::{IssuerMatch, Validator};
}
