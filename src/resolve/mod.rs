//! Plugin resolution
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Engine    │────▶│   Checker   │────▶│  Resolved   │
//! │  (workers)  │     │  (policy)   │     │    set      │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                                       │
//!        ▼                                       ▼
//! ┌─────────────┐                         ┌─────────────┐
//! │   Fetcher   │                         │    Diff     │
//! │  (cached)   │                         │  (report)   │
//! └─────────────┘                         └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`engine`]: Bounded concurrent resolution and the dependency walk
//! - [`checker`]: Compatibility policy for candidate releases
//! - [`resolved`]: Shared set of chosen plugins
//! - [`diff`]: Diff lines and the updated declarative list
//! - [`update`]: Read, resolve and rewrite a plugin list file

pub mod checker;
pub mod diff;
pub mod engine;
pub mod resolved;
pub mod update;
