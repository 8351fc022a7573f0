//! Client crate for the public-library open-data API.
//!
//! This crate provides:
//! - `LibraryClient` for the four catalog endpoints the service consumes
//!   (book search, usage analysis, recommendation lists, per-region holdings)
//! - normalization of the upstream's inconsistent response envelopes into
//!   uniform record lists
//! - the static administrative-region table and the geometry helpers used to
//!   bucket coordinates to nearby regions

pub mod client;
mod envelope;
pub mod error;
pub mod regions;
pub mod types;

// Re-export main types
pub use client::{LibraryClient, SearchBooks};
pub use error::CatalogError;
pub use regions::{haversine_km, nearest_regions, Region, REGIONS};
pub use types::{CatalogBook, Keyword, Library, RecommendType, UsageAnalysis};
