// src/discovery.rs

use crate::dns::DnsResolver;
use crate::error::Id4meError;
use crate::model::dns_record::OpenIdDnsRecord;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// The label prepended to an identifier to find its ID4me TXT records.
pub const OPEN_ID_PREFIX: &str = "_openid.";

/// Locates the identity authority of an identifier through DNS.
///
/// The `_openid.<identifier>` TXT records are queried first. When that name
/// has no TXT records the left-most label is dropped and the parent is tried,
/// as long as more than two labels remain.
#[derive(Clone)]
pub struct Discovery {
    resolver: Arc<dyn DnsResolver>,
    timeout: Duration,
}

impl Discovery {
    pub fn new(resolver: Arc<dyn DnsResolver>, timeout: Duration) -> Self {
        Self { resolver, timeout }
    }

    /// Returns the identity authority host announced for `identifier`.
    pub async fn discover(&self, identifier: &str) -> Result<String, Id4meError> {
        Ok(self.get_open_id_dns_record(identifier).await?.identity_authority)
    }

    /// Returns the complete `OID1` record announced for `identifier`.
    #[instrument(skip(self), err)]
    pub async fn get_open_id_dns_record(&self, identifier: &str) -> Result<OpenIdDnsRecord, Id4meError> {
        let (domain, records) = self.get_dns_txt_records(identifier).await?;
        let record = OpenIdDnsRecord::from_txt_records(&records).ok_or_else(|| {
            Id4meError::OpenIdDnsRecordNotFound(format!("no openId DNS Record found at {}", domain))
        })?;
        info!(
            "Discovered identity authority {} for {} at {}",
            record.identity_authority, identifier, domain
        );
        Ok(record)
    }

    /// Finds the closest `_openid.` name carrying TXT records, climbing from
    /// `identifier` towards its registrable domain.
    ///
    /// Returns the queried name together with its TXT strings.
    pub async fn get_dns_txt_records(&self, identifier: &str) -> Result<(String, Vec<String>), Id4meError> {
        let mut candidate = identifier.trim().trim_end_matches('.').to_string();
        if candidate.is_empty() {
            return Err(Id4meError::InvalidOpenIdDomain("Invalid OpenId Domain provided".to_string()));
        }

        loop {
            let domain = format!("{}{}", OPEN_ID_PREFIX, candidate);
            let records = self.query(&domain).await;
            if !records.is_empty() {
                return Ok((domain, records));
            }

            match Self::parent_domain(&candidate) {
                Some(parent) => {
                    debug!("No TXT records at {}, trying {}", domain, parent);
                    candidate = parent;
                }
                None => {
                    return Err(Id4meError::InvalidOpenIdDomain(format!(
                        "Invalid OpenId Domain {} provided",
                        domain
                    )))
                }
            }
        }
    }

    /// Drops the left-most label of `identifier`.
    ///
    /// Empty labels are ignored. Returns `None` when two labels or fewer
    /// remain, since a registrable domain cannot be reduced further.
    pub fn parent_domain(identifier: &str) -> Option<String> {
        let labels: Vec<&str> = identifier.split('.').filter(|label| !label.is_empty()).collect();
        if labels.len() > 2 {
            Some(labels[1..].join("."))
        } else {
            None
        }
    }

    async fn query(&self, name: &str) -> Vec<String> {
        match tokio::time::timeout(self.timeout, self.resolver.query_txt(name)).await {
            Ok(Ok(records)) => records,
            Ok(Err(e)) => {
                debug!("TXT query for {} failed: {}", name, e);
                Vec::new()
            }
            Err(_) => {
                debug!("TXT query for {} timed out after {:?}", name, self.timeout);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::StaticDnsResolver;
    use async_trait::async_trait;

    fn discovery(resolver: StaticDnsResolver) -> Discovery {
        Discovery::new(Arc::new(resolver), Duration::from_secs(1))
    }

    #[test]
    fn parent_domain_stops_at_two_labels() {
        assert_eq!(Discovery::parent_domain("a.b.example.org").as_deref(), Some("b.example.org"));
        assert_eq!(Discovery::parent_domain("b.example.org").as_deref(), Some("example.org"));
        assert_eq!(Discovery::parent_domain("example.org"), None);
        assert_eq!(Discovery::parent_domain("org"), None);
        assert_eq!(Discovery::parent_domain("a..example.org").as_deref(), Some("example.org"));
    }

    #[tokio::test]
    async fn climbs_to_the_first_level_with_records() {
        let resolver = StaticDnsResolver::new()
            .with_txt("_openid.c.example.org", "v=OID1;iss=auth.example.org;clp=agent.example.org");
        let d = discovery(resolver);

        assert_eq!(d.discover("a.b.c.example.org").await.unwrap(), "auth.example.org");
        let (domain, _) = d.get_dns_txt_records("a.b.c.example.org").await.unwrap();
        assert_eq!(domain, "_openid.c.example.org");
    }

    #[tokio::test]
    async fn first_oid1_record_wins() {
        let resolver = StaticDnsResolver::new()
            .with_txt("_openid.rezepte-elster.de", "v=Blub;iss=x;clp=y")
            .with_txt("_openid.rezepte-elster.de", "v=OID1;iss=id.denic.de;clp=identityagent.de")
            .with_txt("_openid.rezepte-elster.de", "v=HickHack;iss=a;clp=b");
        let record = discovery(resolver)
            .get_open_id_dns_record("rezepte-elster.de")
            .await
            .unwrap();
        assert_eq!(record.identity_authority, "id.denic.de");
        assert_eq!(record.identity_agent.as_deref(), Some("identityagent.de"));
    }

    #[tokio::test]
    async fn registrable_domain_without_records_is_invalid() {
        let err = discovery(StaticDnsResolver::new()).discover("google.com").await.unwrap_err();
        assert!(matches!(err, Id4meError::InvalidOpenIdDomain(_)));

        let err = discovery(StaticDnsResolver::new()).discover("  ").await.unwrap_err();
        assert!(matches!(err, Id4meError::InvalidOpenIdDomain(_)));
    }

    #[tokio::test]
    async fn records_without_oid1_marker_are_not_found() {
        let resolver = StaticDnsResolver::new().with_txt("_openid.example.org", "v=spf1 -all");
        let err = discovery(resolver).discover("www.example.org").await.unwrap_err();
        assert!(matches!(err, Id4meError::OpenIdDnsRecordNotFound(_)));
    }

    struct SlowResolver;

    #[async_trait]
    impl DnsResolver for SlowResolver {
        async fn query_txt(&self, name: &str) -> Result<Vec<String>, Id4meError> {
            if name == "_openid.example.org" {
                return Ok(vec!["v=OID1;iss=auth.example.org".to_string()]);
            }
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(vec!["v=OID1;iss=never.example.org".to_string()])
        }
    }

    #[tokio::test]
    async fn timed_out_query_climbs_to_the_parent() {
        let d = Discovery::new(Arc::new(SlowResolver), Duration::from_millis(20));
        assert_eq!(d.discover("sub.example.org").await.unwrap(), "auth.example.org");
    }
}
