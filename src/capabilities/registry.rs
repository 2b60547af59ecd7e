//! Capability Registry: name → capability table with detection and dispatch.
//!
//! The registry is populated once at startup, either from an explicit list of
//! constructors (`register_all`) or through the configuration-driven
//! [`loader`](super::loader). After that it is shared read-only behind an
//! `Arc`; `execute` keeps no per-call state, so concurrent calls never
//! interfere at this layer.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use super::capability::{Capability, CapabilityFailure, CapabilitySummary};
use super::detection::DetectionRules;
use super::error::RegistryError;

/// Outcome of a capability constructor.
pub type BuildResult = Result<Arc<dyn Capability>, CapabilityFailure>;

/// Registry of capabilities indexed by name, in insertion order.
#[derive(Debug, Default)]
pub struct CapabilityRegistry {
    /// Registered capabilities in insertion order
    entries: Vec<Arc<dyn Capability>>,

    /// Name → position in `entries`
    index: HashMap<String, usize>,

    /// Keyword routing table used by `detect`
    rules: DetectionRules,
}

impl CapabilityRegistry {
    /// Create an empty registry with the default detection table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry with a custom detection table.
    pub fn with_rules(rules: DetectionRules) -> Self {
        Self {
            rules,
            ..Self::default()
        }
    }

    /// Register a capability under its declared name.
    ///
    /// A capability already registered under the same name is replaced in
    /// place and returned; its position in `list()` is kept.
    pub fn register(&mut self, capability: Arc<dyn Capability>) -> Option<Arc<dyn Capability>> {
        let name = capability.name().to_string();
        match self.index.get(&name) {
            Some(&pos) => {
                log::debug!("Replacing capability: {}", name);
                Some(std::mem::replace(&mut self.entries[pos], capability))
            }
            None => {
                log::debug!("Registered capability: {}", name);
                self.index.insert(name, self.entries.len());
                self.entries.push(capability);
                None
            }
        }
    }

    /// Register every capability produced by a fixed list of constructors.
    ///
    /// A constructor that fails is logged and skipped; the rest still load.
    /// Returns the number of capabilities registered.
    pub fn register_all<I, F>(&mut self, constructors: I) -> usize
    where
        I: IntoIterator<Item = F>,
        F: FnOnce() -> BuildResult,
    {
        let mut count = 0;
        for build in constructors {
            match build() {
                Ok(capability) => {
                    self.register(capability);
                    count += 1;
                }
                Err(e) => {
                    log::warn!("Failed to load capability: {}", e);
                }
            }
        }
        count
    }

    /// Look up a capability by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Capability>> {
        self.index
            .get(name)
            .map(|&pos| Arc::clone(&self.entries[pos]))
    }

    /// Whether a capability is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Iterate over capability summaries in insertion order.
    ///
    /// The iterator is lazy and `Clone`, so a snapshot can be walked again.
    pub fn list(&self) -> impl Iterator<Item = CapabilitySummary> + Clone + '_ {
        self.entries.iter().map(|c| c.summary())
    }

    /// Registered names in insertion order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|c| c.name()).collect()
    }

    /// The detection table in use.
    pub fn rules(&self) -> &DetectionRules {
        &self.rules
    }

    /// Replace the detection table.
    pub fn set_rules(&mut self, rules: DetectionRules) {
        self.rules = rules;
    }

    /// Pick a capability name for free text.
    ///
    /// The name is not checked against the registry; pair with `contains`
    /// or let `execute` report `NotFound`.
    pub fn detect(&self, input: &str) -> Option<&str> {
        self.rules.detect(input)
    }

    /// Run the named capability.
    ///
    /// Failures from the capability come back unchanged inside
    /// [`RegistryError::Execution`]. Nothing is retried.
    pub async fn execute(
        &self,
        name: &str,
        input: &str,
        options: &Value,
    ) -> Result<Value, RegistryError> {
        let capability = self
            .get(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;

        capability
            .execute(input, options)
            .await
            .map_err(|failure| RegistryError::Execution {
                capability: name.to_string(),
                failure,
            })
    }

    /// Number of registered capabilities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
