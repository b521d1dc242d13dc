//! Access list reconciliation against the route store.
//!
//! # Responsibilities
//! - Enumerate black/white list entries from force routes
//! - Add addresses to a service's list, creating its route on first use
//! - Remove addresses, deleting routes whose list empties out
//!
//! # Design Decisions
//! - Only the `consumer.host` clause is touched; other clauses round-trip
//! - Services are processed in sorted order and the first error stops the
//!   call; services already written stay written
//! - No dedup across the two sets on grant: an address can end up both
//!   allowed and denied if the caller asks for it

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::access::error::{AccessError, AccessResult};
use crate::access::normalize::AddressNormalizer;
use crate::access::types::{AccessEntry, RevokeEntry};
use crate::observability::metrics;
use crate::route::{RouteRecord, RouteStore, StoreError};
use crate::rule::{decode, to_rule_string, MatchPair};

/// Clause key holding the consumer addresses of an access list.
pub const CONSUMER_HOST: &str = "consumer.host";

/// Applies access list reads and writes to a `RouteStore`.
#[derive(Clone)]
pub struct AccessListReconciler {
    store: Arc<dyn RouteStore>,
    normalizer: Arc<dyn AddressNormalizer>,
}

impl AccessListReconciler {
    pub fn new(store: Arc<dyn RouteStore>, normalizer: Arc<dyn AddressNormalizer>) -> Self {
        Self { store, normalizer }
    }

    /// List access entries.
    ///
    /// A non-blank `service` wins over `address`; with neither, every force
    /// route is scanned. Records that fail to split or parse are logged and
    /// contribute nothing.
    pub fn list(&self, service: Option<&str>, address: Option<&str>) -> AccessResult<Vec<AccessEntry>> {
        let service = service.map(str::trim).filter(|s| !s.is_empty());
        let address = address
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(|a| self.normalizer.normalize(Some(a)));

        let routes = match (service, &address) {
            (Some(service), _) => self.store.find_by_service(service)?,
            (None, Some(address)) => self.store.find_by_address(address)?,
            (None, None) => self.store.find_all()?,
        };

        let mut entries = Vec::new();
        for route in routes.iter().filter(|r| r.force) {
            let Some(pair) = listed_pair(route) else {
                continue;
            };

            let denied = pair.matches.into_iter().map(|host| (host, false));
            let allowed = pair.unmatches.into_iter().map(|host| (host, true));
            for (host, allowed) in denied.chain(allowed) {
                entries.push(AccessEntry {
                    id: entries.len() as u64 + 1,
                    service: route.service.clone(),
                    address: host,
                    allowed,
                });
            }
        }

        tracing::debug!(
            service = ?service,
            address = ?address,
            routes = routes.len(),
            entries = entries.len(),
            "Listed access entries"
        );
        metrics::record_entries_listed(entries.len());
        Ok(entries)
    }

    /// Put `addresses` on the allow list (`allow = true`) or deny list of
    /// every service in `services`.
    pub fn grant(&self, services: &[String], addresses: &[String], allow: bool) -> AccessResult<()> {
        let services: BTreeSet<&str> = services
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();
        if services.is_empty() {
            return Err(AccessError::Validation("services is required".to_string()));
        }
        if addresses.is_empty() {
            return Err(AccessError::Validation("addresses is required".to_string()));
        }

        let addresses: BTreeSet<String> = addresses
            .iter()
            .map(|a| self.normalizer.normalize(Some(a)))
            .collect();

        for service in services {
            self.grant_service(service, &addresses, allow)?;
        }
        Ok(())
    }

    fn grant_service(&self, service: &str, addresses: &BTreeSet<String>, allow: bool) -> AccessResult<()> {
        let mut route = self
            .force_routes(service)?
            .into_iter()
            .next()
            .unwrap_or_else(|| RouteRecord::new_access_list(service));

        let mut parts = route.split()?;
        let mut condition = decode(&parts.match_rule)?;
        let pair = condition.entry(CONSUMER_HOST.to_string()).or_default();
        let target = if allow { &mut pair.unmatches } else { &mut pair.matches };
        target.extend(addresses.iter().cloned());

        parts.match_rule = to_rule_string(&condition);
        route.set_parts(&parts);

        match route.id {
            None => {
                let id = self.store.create(route)?;
                metrics::record_rule_write("create");
                tracing::info!(service = %service, id, allow, "Created access list route");
            }
            Some(id) => {
                self.store.update(&route)?;
                metrics::record_rule_write("update");
                tracing::info!(service = %service, id, allow, "Updated access list route");
            }
        }
        Ok(())
    }

    /// Take each `(service, address)` off its service's access list,
    /// whichever of the two lists it is on.
    ///
    /// Services and addresses are trimmed and normalized the same way
    /// `grant` stores them; entries with a blank service are ignored.
    pub fn revoke(&self, entries: &[RevokeEntry]) -> AccessResult<()> {
        let mut by_service: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();
        for entry in entries {
            let service = entry.service.trim();
            if service.is_empty() {
                continue;
            }
            by_service
                .entry(service)
                .or_default()
                .insert(self.normalizer.normalize(Some(&entry.address)));
        }

        for (service, addresses) in by_service {
            self.revoke_service(service, &addresses)?;
        }
        Ok(())
    }

    fn revoke_service(&self, service: &str, addresses: &BTreeSet<String>) -> AccessResult<()> {
        for mut route in self.force_routes(service)? {
            let id = route
                .id
                .ok_or_else(|| StoreError::MissingId(service.to_string()))?;

            let mut parts = route.split()?;
            let mut condition = decode(&parts.match_rule)?;
            let Some(pair) = condition.get_mut(CONSUMER_HOST) else {
                tracing::debug!(service = %service, id, "Route has no consumer.host clause");
                continue;
            };

            if pair.remove_all(addresses) == 0 {
                continue;
            }
            if pair.is_empty() {
                condition.remove(CONSUMER_HOST);
            }

            if condition.values().all(MatchPair::is_empty) {
                self.store.delete(id)?;
                metrics::record_rule_write("delete");
                tracing::info!(service = %service, id, "Deleted empty access list route");
            } else {
                parts.match_rule = to_rule_string(&condition);
                route.set_parts(&parts);
                self.store.update(&route)?;
                metrics::record_rule_write("update");
                tracing::info!(service = %service, id, "Updated access list route");
            }
        }
        Ok(())
    }

    fn force_routes(&self, service: &str) -> AccessResult<Vec<RouteRecord>> {
        let routes = self.store.find_by_service(service)?;
        Ok(routes.into_iter().filter(|r| r.force).collect())
    }
}

/// The `consumer.host` pair of a route, or `None` if it has none or the
/// route is unreadable.
fn listed_pair(route: &RouteRecord) -> Option<MatchPair> {
    let parts = match route.split() {
        Ok(parts) => parts,
        Err(e) => {
            tracing::error!(id = ?route.id, error = %e, "Skipping malformed route");
            metrics::record_rule_skipped("malformed");
            return None;
        }
    };

    match decode(&parts.match_rule) {
        Ok(mut condition) => condition.remove(CONSUMER_HOST),
        Err(e) => {
            tracing::error!(id = ?route.id, error = %e, "Skipping unparsable route");
            metrics::record_rule_skipped("parse");
            None
        }
    }
}
