// src/model/dns_record.rs

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The record version tag identifying an ID4me TXT record.
pub const OID1: &str = "OID1";

/// The parsed `_openid.<domain>` TXT record: `v=OID1;iss=<authority>;clp=<agent>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenIdDnsRecord {
    /// The raw TXT string this record was parsed from.
    pub txt_record: String,
    /// Always `OID1`.
    pub variant: String,
    /// The identity authority (issuer host, optionally with a path).
    pub identity_authority: String,
    /// The identity agent (claims provider), if announced.
    pub identity_agent: Option<String>,
}

impl OpenIdDnsRecord {
    /// Picks the first TXT string carrying a `v=OID1` marker and parses it.
    ///
    /// The position of the record in the DNS answer does not matter. Returns
    /// `None` when no string qualifies.
    pub fn from_txt_records<S: AsRef<str>>(records: &[S]) -> Option<Self> {
        records.iter().map(AsRef::as_ref).find_map(Self::parse)
    }

    fn parse(txt: &str) -> Option<Self> {
        if !txt.contains(&format!("v={}", OID1)) {
            return None;
        }

        let fields: HashMap<&str, &str> = txt
            .split(';')
            .filter_map(|pair| pair.split_once('='))
            .map(|(key, value)| (key.trim(), value.trim()))
            .collect();

        let variant = *fields.get("v")?;
        if variant != OID1 {
            return None;
        }

        let identity_authority = fields.get("iss").filter(|iss| !iss.is_empty())?.to_string();
        let identity_agent = fields
            .get("clp")
            .filter(|clp| !clp.is_empty())
            .map(|clp| clp.to_string());

        Some(Self {
            txt_record: txt.to_string(),
            variant: variant.to_string(),
            identity_authority,
            identity_agent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_oid1_record_wins_regardless_of_position() {
        let records = [
            "v=Blub;iss=x;clp=y",
            "v=OID1;iss=id.denic.de;clp=identityagent.de",
            "v=HickHack;iss=a;clp=b",
            "v=OID1;iss=other.example;clp=other-agent.example",
        ];
        let record = OpenIdDnsRecord::from_txt_records(&records).unwrap();
        assert_eq!(record.variant, "OID1");
        assert_eq!(record.identity_authority, "id.denic.de");
        assert_eq!(record.identity_agent.as_deref(), Some("identityagent.de"));
        assert_eq!(record.txt_record, records[1]);
    }

    #[test]
    fn key_order_does_not_matter() {
        let record = OpenIdDnsRecord::from_txt_records(&["clp=agent.example; iss=auth.example; v=OID1"]).unwrap();
        assert_eq!(record.identity_authority, "auth.example");
        assert_eq!(record.identity_agent.as_deref(), Some("agent.example"));
    }

    #[test]
    fn agent_is_optional() {
        let record = OpenIdDnsRecord::from_txt_records(&["v=OID1;iss=auth.example"]).unwrap();
        assert_eq!(record.identity_agent, None);
    }

    #[test]
    fn records_without_marker_or_issuer_are_ignored() {
        assert!(OpenIdDnsRecord::from_txt_records(&["v=spf1 -all", "v=Blub;iss=x"]).is_none());
        assert!(OpenIdDnsRecord::from_txt_records(&["v=OID1;clp=agent.example"]).is_none());
        assert!(OpenIdDnsRecord::from_txt_records::<&str>(&[]).is_none());
    }
}
