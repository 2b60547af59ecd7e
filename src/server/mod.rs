//! HTTP host for the capability registry.
//!
//! Turns registry results and errors into JSON. The registry itself has no
//! transport knowledge.
//!
//! # Endpoints
//!
//! - `GET  /health`      : Liveness check
//! - `GET  /capabilities`: Discovery listing
//! - `POST /detect`      : Keyword routing
//! - `POST /execute`     : Delegated execution
//! - `POST /chat`        : Detect + execute

pub mod routes;

pub use routes::{app_router, AppState};
