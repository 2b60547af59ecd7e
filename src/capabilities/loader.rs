//! Registry loader: builds a [`CapabilityRegistry`] from configuration.
//!
//! Each enabled name is checked against the built-in catalog before its
//! constructor runs. Unknown names and constructors that fail are logged
//! and skipped; startup continues with whatever loaded.

use crate::config::RahlConfig;

use super::builtin::{self, CapabilityFactory};
use super::registry::CapabilityRegistry;

/// Summary of a load pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadReport {
    /// Names registered, in order.
    pub loaded: Vec<String>,
    /// Names that failed validation or construction, with the reason.
    pub skipped: Vec<(String, String)>,
}

/// Build a registry from configuration.
pub fn load_registry(config: &RahlConfig) -> CapabilityRegistry {
    load_registry_with_report(config).0
}

/// Build a registry and report what was loaded and skipped.
pub fn load_registry_with_report(config: &RahlConfig) -> (CapabilityRegistry, LoadReport) {
    load_from_catalog(config, &builtin::catalog())
}

/// Build a registry from an explicit catalog.
pub fn load_from_catalog(
    config: &RahlConfig,
    catalog: &[CapabilityFactory],
) -> (CapabilityRegistry, LoadReport) {
    let mut registry = CapabilityRegistry::with_rules(config.detection.table());
    let mut report = LoadReport::default();

    let wanted: Vec<String> = match &config.capabilities.enabled {
        Some(names) => names.clone(),
        None => catalog.iter().map(|f| f.name.to_string()).collect(),
    };

    for name in wanted {
        let Some(factory) = catalog.iter().find(|f| f.name == name) else {
            log::warn!("Unknown capability '{}' in configuration, skipping", name);
            report
                .skipped
                .push((name, "unknown capability".to_string()));
            continue;
        };

        match (factory.build)(&config.capabilities.settings_for(&name)) {
            Ok(capability) if capability.name() == name => {
                log::info!("Loaded capability: {}", name);
                registry.register(capability);
                report.loaded.push(name);
            }
            Ok(capability) => {
                let reason = format!("constructor produced '{}'", capability.name());
                log::warn!("Failed to load capability '{}': {}", name, reason);
                report.skipped.push((name, reason));
            }
            Err(e) => {
                log::warn!("Failed to load capability '{}': {}", name, e);
                report.skipped.push((name, e.message));
            }
        }
    }

    for rule in config.detection.table().rules() {
        if !registry.contains(&rule.capability) {
            log::debug!(
                "Detection rule for '{}' points at an unregistered capability",
                rule.capability
            );
        }
    }

    (registry, report)
}
