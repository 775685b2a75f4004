//! Registered resource types
//!
//! One module per resource family; [`build_registry`] wires every token the
//! admin surface serves. Types without bespoke behavior get the default
//! criteria/params/formatter.

pub mod applications;
pub mod bridging_service;
pub mod open_api_spec;

use crate::registry::{ResourceDescriptor, ResourceRegistry};

pub fn build_registry() -> ResourceRegistry {
    let mut registry = ResourceRegistry::new();

    registry.register(open_api_spec::descriptor());
    registry.register_alias("api_spec", "open_api_spec");

    registry.register(applications::descriptor(
        "bs_apps",
        "bridging_service_applications",
    ));
    registry.register(applications::descriptor(
        "ls_apps",
        "local_service_applications",
    ));

    registry.register(bridging_service::descriptor());
    registry.register(bridging_service::local_descriptor());

    registry.register(ResourceDescriptor::new("tenants", "tenants"));
    registry.register(ResourceDescriptor::new("webhooks", "webhooks"));
    registry.register(ResourceDescriptor::new("connections", "connections"));
    registry.register(ResourceDescriptor::new("json_data_types", "json_data_types"));
    registry.register(ResourceDescriptor::new("authorizations", "authorizations"));

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_token_resolves() {
        let registry = build_registry();
        for token in [
            "open_api_spec",
            "api_spec",
            "bs_apps",
            "ls_apps",
            "bridging_services",
            "local_services",
            "tenants",
            "webhooks",
            "connections",
            "json_data_types",
            "authorizations",
        ] {
            assert!(registry.resolve(token).is_ok(), "token {token} must resolve");
        }
        assert!(registry.resolve("unknown").is_err());
    }

    #[test]
    fn test_alias_points_at_specifications() {
        let registry = build_registry();
        assert_eq!(
            registry.resolve("api_spec").unwrap().collection,
            "specifications"
        );
    }
}
