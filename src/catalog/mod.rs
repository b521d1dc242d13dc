//! Service catalog used to populate the service picker.
//!
//! # Design Decisions
//! - Services are ordered by simple name (`org.example.DemoService` sorts
//!   as `DemoService`), case-insensitively, so the picker reads naturally
//! - The catalog is a trait; the bundled implementation is a static list
//!   from config

use std::cmp::Ordering;

/// Source of known service names.
pub trait ServiceCatalog: Send + Sync {
    fn list_service_names(&self) -> Vec<String>;
}

/// A fixed set of services, typically from config.
#[derive(Debug, Clone, Default)]
pub struct StaticServiceCatalog {
    services: Vec<String>,
}

impl StaticServiceCatalog {
    pub fn new(services: Vec<String>) -> Self {
        Self { services }
    }
}

impl ServiceCatalog for StaticServiceCatalog {
    fn list_service_names(&self) -> Vec<String> {
        let mut services = self.services.clone();
        sort_simple_name(&mut services);
        services.dedup();
        services
    }
}

/// The display name of a service: `group/` prefix kept, package dropped,
/// `:version` suffix kept.
///
/// `dubbo/org.example.DemoService:1.0.0` → `dubbo/DemoService:1.0.0`
pub fn simple_name(name: &str) -> String {
    let group = name.find('/').map(|i| &name[..=i]).unwrap_or("");
    let body = &name[group.len()..];
    // Dots in the group or the version are not package separators.
    let interface_end = body.rfind(':').unwrap_or(body.len());
    let rest = match body[..interface_end].rfind('.') {
        Some(dot) => &body[dot + 1..],
        None => body,
    };
    format!("{}{}", group, rest)
}

fn compare_simple_name(a: &str, b: &str) -> Ordering {
    let (sa, sb) = (simple_name(a).to_lowercase(), simple_name(b).to_lowercase());
    sa.cmp(&sb).then_with(|| a.cmp(b))
}

/// Sort service names by simple name, ties broken by full name.
pub fn sort_simple_name(services: &mut [String]) {
    services.sort_by(|a, b| compare_simple_name(a, b));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_name() {
        assert_eq!(simple_name("org.example.DemoService"), "DemoService");
        assert_eq!(simple_name("DemoService"), "DemoService");
        assert_eq!(simple_name("dubbo/org.example.DemoService:1.0.0"), "dubbo/DemoService:1.0.0");
        assert_eq!(simple_name("dubbo/DemoService"), "dubbo/DemoService");
        assert_eq!(simple_name("org.example.DemoService:1.0.0"), "DemoService:1.0.0");
    }

    #[test]
    fn test_simple_name_dotted_group() {
        assert_eq!(simple_name("a.b/Demo"), "a.b/Demo");
        assert_eq!(simple_name("a.b/org.x.Demo:1.0"), "a.b/Demo:1.0");
        assert_eq!(simple_name("a.b/Demo:1.0"), "a.b/Demo:1.0");
    }

    #[test]
    fn test_catalog_orders_by_simple_name() {
        let catalog = StaticServiceCatalog::new(vec![
            "org.zeta.AlphaService".into(),
            "com.acme.betaService".into(),
            "org.alpha.GammaService".into(),
            "com.acme.betaService".into(),
        ]);

        assert_eq!(
            catalog.list_service_names(),
            vec!["org.zeta.AlphaService", "com.acme.betaService", "org.alpha.GammaService"]
        );
    }
}
