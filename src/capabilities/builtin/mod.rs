//! Built-in capabilities that run in-process without external services.
//!
//! [`catalog`] is the fixed, ordered list of constructors the loader picks
//! from; nothing is discovered by scanning the filesystem.

pub mod calculator;
pub mod encryption;
pub mod summarizer;

use std::sync::Arc;

use serde_json::Value;

use super::registry::BuildResult;

pub use calculator::Calculator;
pub use encryption::Encryption;
pub use summarizer::Summarizer;

/// A named constructor for one capability.
///
/// `build` receives the capability's settings block from configuration
/// (`Value::Null` when none is given).
#[derive(Clone, Copy)]
pub struct CapabilityFactory {
    pub name: &'static str,
    pub build: fn(&Value) -> BuildResult,
}

/// All built-in capabilities, in registration order.
pub fn catalog() -> Vec<CapabilityFactory> {
    vec![
        CapabilityFactory {
            name: Calculator::NAME,
            build: build_calculator,
        },
        CapabilityFactory {
            name: Summarizer::NAME,
            build: build_summarizer,
        },
        CapabilityFactory {
            name: Encryption::NAME,
            build: build_encryption,
        },
    ]
}

fn build_calculator(_settings: &Value) -> BuildResult {
    Ok(Arc::new(Calculator::new()))
}

fn build_summarizer(settings: &Value) -> BuildResult {
    Ok(Arc::new(Summarizer::from_settings(settings)?))
}

fn build_encryption(_settings: &Value) -> BuildResult {
    Ok(Arc::new(Encryption::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_names_match_instances() {
        for factory in catalog() {
            let capability = (factory.build)(&Value::Null).unwrap();
            assert_eq!(capability.name(), factory.name);
        }
    }

    #[test]
    fn test_catalog_order() {
        let names: Vec<&str> = catalog().iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["calculator", "summarizer", "encryption"]);
    }
}
