//! Host registration client.
//!
//! Enumerates installed products, services, and repositories from the
//! package manager, and provisions or retracts the container registry
//! credential issued when a host is (de)registered against the
//! subscription service.
//!
//! ## Modules
//! - `cli` — Command-line handlers
//! - `core` — Business logic (registry auth, package metadata, architecture)
//! - `models` — Data structures
//! - `util` — System utilities (fs, exec, system access)

pub mod cli;
pub mod constants;
pub mod core;
pub mod models;
pub mod util;
