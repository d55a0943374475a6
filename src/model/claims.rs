// src/model/claims.rs

use serde_json::{Map, Value};

/// A single entry of the OIDC `claims` authorization parameter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClaimRequest {
    pub name: String,
    pub essential: Option<bool>,
    pub reason: Option<String>,
    /// Further claim-request members (`value`, `values`, ...), merged as-is.
    pub extra_properties: Map<String, Value>,
}

impl ClaimRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn essential(mut self, essential: bool) -> Self {
        self.essential = Some(essential);
        self
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn extra_property(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extra_properties.insert(name.into(), value);
        self
    }

    /// `{"essential": .., "reason": .., ...extra}` or `null` when nothing is set.
    fn to_request_value(&self) -> Value {
        let mut request = Map::new();
        if let Some(essential) = self.essential {
            request.insert("essential".to_string(), Value::Bool(essential));
        }
        if let Some(reason) = &self.reason {
            request.insert("reason".to_string(), Value::String(reason.clone()));
        }
        for (key, value) in &self.extra_properties {
            request.insert(key.clone(), value.clone());
        }

        if request.is_empty() {
            Value::Null
        } else {
            Value::Object(request)
        }
    }
}

/// An ordered list of claim requests for one bucket (`userinfo` or `id_token`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClaimRequestList {
    claims: Vec<ClaimRequest>,
}

impl ClaimRequestList {
    pub fn new(claims: Vec<ClaimRequest>) -> Self {
        Self { claims }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClaimRequest> {
        self.claims.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// The JSON object placed under `userinfo` / `id_token` in the `claims` parameter.
    pub fn to_request_object(&self) -> Map<String, Value> {
        self.claims
            .iter()
            .map(|claim| (claim.name.clone(), claim.to_request_value()))
            .collect()
    }
}

impl FromIterator<ClaimRequest> for ClaimRequestList {
    fn from_iter<I: IntoIterator<Item = ClaimRequest>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_claims_map_to_null_in_order() {
        let list: ClaimRequestList = [ClaimRequest::new("given_name"), ClaimRequest::new("family_name")]
            .into_iter()
            .collect();
        assert_eq!(
            serde_json::to_string(&list.to_request_object()).unwrap(),
            r#"{"given_name":null,"family_name":null}"#
        );
    }

    #[test]
    fn properties_are_emitted_only_when_set() {
        let list = ClaimRequestList::new(vec![
            ClaimRequest::new("given_name").essential(true),
            ClaimRequest::new("email").reason("A valid reason"),
            ClaimRequest::new("acr").extra_property("values", json!(["urn:a", "urn:b"])),
        ]);
        assert_eq!(
            Value::Object(list.to_request_object()),
            json!({
                "given_name": {"essential": true},
                "email": {"reason": "A valid reason"},
                "acr": {"values": ["urn:a", "urn:b"]}
            })
        );
    }

    #[test]
    fn essential_false_is_still_emitted() {
        let list = ClaimRequestList::new(vec![ClaimRequest::new("nickname").essential(false)]);
        assert_eq!(Value::Object(list.to_request_object()), json!({"nickname": {"essential": false}}));
    }
}
