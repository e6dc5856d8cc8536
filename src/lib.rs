//! govrag: governed retrieval-augmented answering.
//!
//! Library crate shared by the `govrag` binary and the integration tests in
//! `tests/`.

pub mod api;
pub mod audit;
pub mod cli;
pub mod config;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod providers;
pub mod rag;
pub mod store;
pub mod telemetry;

use audit::AuditService;
use middleware::policy::PolicyScreener;
use rag::RagService;

/// Shared application state passed to handlers and middleware. Built once at
/// startup; every collaborator is already connected.
pub struct AppState {
    pub config: config::Config,
    pub rag: RagService,
    pub screener: PolicyScreener,
    pub audit: AuditService,
}
