//! # taxport Library
//!
//! This library exposes the taxport modules for testing and integration.
//!
//! The main binary uses these modules through the `main.rs` entry point.

pub mod cli;
pub mod config;
pub mod import;
pub mod input;
pub mod logging;

// Re-export the workspace crates for convenience
pub use taxport_client;
pub use taxport_core;
