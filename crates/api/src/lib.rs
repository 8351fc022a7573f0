//! HTTP service for booknaru.
//!
//! This crate provides:
//! - environment-driven service configuration
//! - the axum router: the aggregated AI search endpoint plus thin proxies
//!   over the library catalog and the AI provider
//! - liveness/readiness endpoints

pub mod config;
pub mod server;

pub use config::Config;
pub use server::{build_router, AppState};
