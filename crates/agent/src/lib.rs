//! `airq-agent` library crate.
//!
//! Re-exports internal modules for integration testing. The binary
//! entrypoint lives in `main.rs`.

pub mod config;
pub mod driver;
pub mod error;
pub mod publisher;
pub mod source;
