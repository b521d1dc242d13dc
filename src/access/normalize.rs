//! Consumer address normalization.
//!
//! Admin users paste addresses in many shapes (`10.0.0.1:20880`,
//! `dubbo://10.0.0.1:20880/org.example.DemoService`, `user@host`). Access
//! rules only ever hold the bare host.

use url::Url;

/// Placeholder used when no address is supplied.
pub const DEFAULT_ADDRESS: &str = "0.0.0.0";

/// Turns a raw, possibly blank, address into the host stored in rules.
pub trait AddressNormalizer: Send + Sync {
    fn normalize(&self, raw: Option<&str>) -> String;
}

/// Strips scheme, user info, path and port; no DNS lookups.
#[derive(Debug, Clone)]
pub struct HostNormalizer {
    placeholder: String,
}

impl HostNormalizer {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
        }
    }
}

impl Default for HostNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_ADDRESS)
    }
}

fn strip_brackets(host: &str) -> &str {
    host.trim_start_matches('[').trim_end_matches(']')
}

fn bare_host(address: &str) -> &str {
    let mut rest = address;
    if let Some(i) = rest.find("://") {
        rest = &rest[i + 3..];
    }
    if let Some(i) = rest.find('/') {
        rest = &rest[..i];
    }
    if let Some(i) = rest.rfind('@') {
        rest = &rest[i + 1..];
    }

    if rest.starts_with('[') {
        // [v6] or [v6]:port
        return match rest.find(']') {
            Some(end) => &rest[1..end],
            None => rest,
        };
    }

    // A single colon is a port; more than one is a bare IPv6 literal.
    match (rest.find(':'), rest.rfind(':')) {
        (Some(first), Some(last)) if first == last => &rest[..first],
        _ => rest,
    }
}

impl AddressNormalizer for HostNormalizer {
    fn normalize(&self, raw: Option<&str>) -> String {
        let trimmed = raw.map(str::trim).unwrap_or_default();
        if trimmed.is_empty() {
            return self.placeholder.clone();
        }

        let host = if trimmed.contains("://") {
            Url::parse(trimmed)
                .ok()
                .and_then(|url| url.host_str().map(|h| strip_brackets(h).to_string()))
                .unwrap_or_else(|| bare_host(trimmed).to_string())
        } else {
            bare_host(trimmed).to_string()
        };

        if host.is_empty() {
            self.placeholder.clone()
        } else {
            host
        }
    }
}
