//! Access list request and response types.

use serde::{Deserialize, Serialize};

/// One address on a service's access list, as returned by a search.
///
/// `id` is a per-search sequence number starting at 1; it identifies
/// nothing outside that search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessEntry {
    pub id: u64,
    pub service: String,
    pub address: String,
    /// `true` for the white list (unmatched), `false` for the black list.
    #[serde(alias = "allow")]
    pub allowed: bool,
}

/// Request to put addresses on the access list of several services.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateAccessControl {
    pub services: Vec<String>,

    /// Newline-separated consumer addresses.
    pub addresses: String,

    pub allowed: bool,
}

impl CreateAccessControl {
    /// Addresses one per line; blank lines are dropped.
    pub fn address_list(&self) -> Vec<String> {
        self.addresses
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// A `(service, address)` pair to take off the access list.
///
/// Extra fields sent back from a search (`id`, `allowed`) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RevokeEntry {
    pub service: String,
    pub address: String,
}

impl RevokeEntry {
    pub fn new(service: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            address: address.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_list_splits_lines() {
        let request = CreateAccessControl {
            services: vec!["svc".into()],
            addresses: "10.0.0.1\n\n  10.0.0.2 \r\n".into(),
            allowed: true,
        };
        assert_eq!(request.address_list(), vec!["10.0.0.1", "10.0.0.2"]);
        assert!(CreateAccessControl::default().address_list().is_empty());
    }

    #[test]
    fn test_revoke_entry_ignores_search_fields() {
        let json = r#"[{"id":3,"service":"svc","address":"10.0.0.1","allow":true}]"#;
        let entries: Vec<RevokeEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(entries, vec![RevokeEntry::new("svc", "10.0.0.1")]);
    }

    #[test]
    fn test_access_entry_accepts_legacy_allow_field() {
        let entry: AccessEntry =
            serde_json::from_str(r#"{"id":1,"service":"svc","address":"a","allow":true}"#).unwrap();
        assert!(entry.allowed);

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["allowed"], true);
    }
}
