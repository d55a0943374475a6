// src/dns.rs

use crate::error::Id4meError;
use async_trait::async_trait;
use std::collections::HashMap;

/// The DNS capability the relying party needs: raw TXT strings for a name.
///
/// An empty list and an `Err` both mean "nothing usable at this name";
/// discovery then climbs to the parent domain.
#[async_trait]
pub trait DnsResolver: Send + Sync {
    async fn query_txt(&self, name: &str) -> Result<Vec<String>, Id4meError>;
}

/// A resolver answering from a fixed table, keyed by fully qualified name.
#[derive(Debug, Clone, Default)]
pub struct StaticDnsResolver {
    records: HashMap<String, Vec<String>>,
}

impl StaticDnsResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a TXT string for `name`. Names are matched case-insensitively.
    pub fn with_txt(mut self, name: &str, txt: &str) -> Self {
        self.records
            .entry(normalize(name))
            .or_default()
            .push(txt.to_string());
        self
    }
}

fn normalize(name: &str) -> String {
    name.trim_end_matches('.').to_ascii_lowercase()
}

#[async_trait]
impl DnsResolver for StaticDnsResolver {
    async fn query_txt(&self, name: &str) -> Result<Vec<String>, Id4meError> {
        Ok(self.records.get(&normalize(name)).cloned().unwrap_or_default())
    }
}

#[cfg(feature = "hickory-dns")]
pub use hickory::HickoryDnsResolver;

#[cfg(feature = "hickory-dns")]
mod hickory {
    use super::DnsResolver;
    use crate::error::Id4meError;
    use async_trait::async_trait;
    use hickory_resolver::TokioAsyncResolver;
    use tracing::debug;

    /// A resolver using the system DNS configuration.
    #[derive(Clone)]
    pub struct HickoryDnsResolver {
        resolver: TokioAsyncResolver,
    }

    impl HickoryDnsResolver {
        pub fn from_system_conf() -> Result<Self, Id4meError> {
            let resolver = TokioAsyncResolver::tokio_from_system_conf()
                .map_err(|e| Id4meError::InvalidConfiguration(format!("DNS resolver: {}", e)))?;
            Ok(Self { resolver })
        }
    }

    #[async_trait]
    impl DnsResolver for HickoryDnsResolver {
        async fn query_txt(&self, name: &str) -> Result<Vec<String>, Id4meError> {
            match self.resolver.txt_lookup(name).await {
                // A TXT record may be split into several character-strings; they form one value.
                Ok(lookup) => Ok(lookup
                    .iter()
                    .map(|txt| {
                        txt.txt_data()
                            .iter()
                            .map(|part| String::from_utf8_lossy(part).into_owned())
                            .collect::<String>()
                    })
                    .collect()),
                Err(e) => {
                    debug!("TXT lookup for {} failed: {}", name, e);
                    Ok(Vec::new())
                }
            }
        }
    }
}
