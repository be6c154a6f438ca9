//! Plugin metadata layer
//!
//! Fetches plugin archives from the update center, reads their manifests and
//! memoizes the resulting records for the duration of a run.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Source    │────▶│  Manifest   │────▶│   Fetcher   │
//! │  (fetch)    │     │  (parse)    │     │  (records)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                                       │
//!        ▼                                       ▼
//! ┌─────────────┐                         ┌─────────────┐
//! │ Registries  │                         │    Cache    │
//! │(update ctr) │                         │  (memoize)  │
//! └─────────────┘                         └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`cache`]: In-memory record cache keyed by name and version
//! - [`fetcher`]: Cache-aware conversion of manifests into records
//! - [`manifest`]: `META-INF/MANIFEST.MF` reader
//! - [`registry`]: Source trait for fetching plugin manifests
//! - [`registries`]: Update center implementation
//! - [`error`]: Error types for every layer
//! - [`semver`]: Lenient plugin version ordering
//! - [`types`]: Requests, records and dependency references

pub mod cache;
pub mod error;
pub mod fetcher;
pub mod manifest;
pub mod registries;
pub mod registry;
pub mod semver;
pub mod types;
