//! # Capability Registry
//!
//! Decouples "what capabilities exist" from "how a request picks and
//! invokes one".
//!
//! ## Architecture
//!
//! A [`Capability`] is anything with a name, a description and an async
//! `execute(input, options)`. The [`CapabilityRegistry`] owns the
//! name → capability table, an ordered [`DetectionRules`] table for routing
//! free text, and delegated execution that tells "unknown capability"
//! apart from "the capability failed".
//!
//! ## Startup Flow
//!
//! 1. `RahlConfig::load()` reads the YAML file and environment
//! 2. `loader::load_registry(&config)` validates each enabled name against
//!    the built-in catalog and constructs it; failures are logged and skipped
//! 3. The registry is wrapped in an `Arc` and shared read-only
//! 4. Hosts call `list`, `detect` and `execute`

pub mod builtin;
pub mod capability;
pub mod detection;
pub mod error;
pub mod loader;
pub mod registry;

pub use capability::{Capability, CapabilityFailure, CapabilitySummary};
pub use detection::{DetectionRule, DetectionRules};
pub use error::RegistryError;
pub use loader::{load_registry, LoadReport};
pub use registry::{BuildResult, CapabilityRegistry};
