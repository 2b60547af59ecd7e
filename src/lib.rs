//! # RAHL - capability registry
//!
//! The RAHL assistant routes chat messages to self-describing capabilities.
//! This crate holds the registry that names those capabilities, picks one for
//! a piece of free text, and runs it, plus the small JSON host that exposes
//! it over HTTP.

pub mod capabilities;
pub mod config;
pub mod server;

pub use capabilities::{
    Capability, CapabilityFailure, CapabilityRegistry, CapabilitySummary, DetectionRule,
    DetectionRules, RegistryError,
};
pub use config::{ConfigError, RahlConfig};

/// Library version
pub const VERSION: &str = "0.3.0";
