//! Capability contract: the unit of functionality held by the registry.
//!
//! A capability is anything that exposes a unique name, an optional
//! description and version, and an `execute(input, options)` operation.
//! The registry never looks inside `options` or the returned payload; each
//! capability decides what those mean.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Description reported for capabilities that do not provide one.
pub const DEFAULT_DESCRIPTION: &str = "No description";

/// A self-describing unit of functionality exposed through `execute`.
///
/// Implementors are constructed once at startup and shared behind an `Arc`
/// for the lifetime of the process, so `execute` takes `&self`.
#[async_trait]
pub trait Capability: Send + Sync + fmt::Debug {
    /// Unique identifier used for registration and lookup.
    fn name(&self) -> &str;

    /// Human-readable description for discovery endpoints.
    fn description(&self) -> &str {
        DEFAULT_DESCRIPTION
    }

    /// Optional semantic version.
    fn version(&self) -> Option<&str> {
        None
    }

    /// Run the capability against a primary input and an options object.
    async fn execute(&self, input: &str, options: &Value) -> Result<Value, CapabilityFailure>;

    /// Snapshot of the capability's self-description.
    fn summary(&self) -> CapabilitySummary {
        CapabilitySummary {
            name: self.name().to_string(),
            description: self.description().to_string(),
            version: self.version().map(str::to_string),
        }
    }
}

/// Name/description pair produced by `CapabilityRegistry::list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySummary {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Failure raised by a capability's own `execute`.
///
/// The message is surfaced to callers verbatim; `details` carries whatever
/// structured context the capability chose to attach.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityFailure {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl CapabilityFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: None,
        }
    }

    /// Attach structured detail to the failure.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl fmt::Display for CapabilityFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CapabilityFailure {}

/// Read a string option, falling back to `default` when absent or not a string.
pub fn option_str<'a>(options: &'a Value, key: &str, default: &'a str) -> &'a str {
    options.get(key).and_then(Value::as_str).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Bare;

    #[async_trait]
    impl Capability for Bare {
        fn name(&self) -> &str {
            "bare"
        }

        async fn execute(&self, input: &str, _options: &Value) -> Result<Value, CapabilityFailure> {
            Ok(Value::String(input.to_string()))
        }
    }

    #[test]
    fn test_summary_defaults() {
        let summary = Bare.summary();
        assert_eq!(summary.name, "bare");
        assert_eq!(summary.description, DEFAULT_DESCRIPTION);
        assert!(summary.version.is_none());

        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("version").is_none());
    }

    #[test]
    fn test_failure_display_is_message() {
        let failure = CapabilityFailure::new("Division by zero")
            .with_details(serde_json::json!({"expression": "1/0"}));
        assert_eq!(failure.to_string(), "Division by zero");
        assert_eq!(failure.details.unwrap()["expression"], "1/0");
    }

    #[test]
    fn test_option_str() {
        let options = serde_json::json!({"action": "hmac", "ratio": 0.5});
        assert_eq!(option_str(&options, "action", "hash"), "hmac");
        assert_eq!(option_str(&options, "ratio", "x"), "x");
        assert_eq!(option_str(&Value::Null, "action", "hash"), "hash");
    }
}
