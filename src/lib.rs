//! SpentLedger - checksummed bulk export and merge of spent address registries
//!
//! # Architecture
//!
//! ## Core
//! - [`address`] - Spent address identifiers
//! - [`registry`] - Registry trait with SQLite and in-memory backends
//!
//! ## File Format
//! - [`format`] - Line layout, classification and checksums
//! - [`export`] - Registry to file
//! - [`verify`] - Checksum verification
//! - [`merge`] - Files to registry, batch isolated
//!
//! ## Integration
//! - [`service`] - Operations bound to a registry handle and config
//! - [`api`] - HTTP endpoints
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//! - [`cli`] - CLI utilities

#![forbid(unsafe_code)]

// ============================================================================
// Core
// ============================================================================
pub mod address;
pub mod registry;

// ============================================================================
// File Format
// ============================================================================
pub mod export;
pub mod format;
pub mod merge;
pub mod verify;

// ============================================================================
// Integration
// ============================================================================
pub mod service;

#[cfg(feature = "api")]
pub mod api;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod cli;
pub mod config;
pub mod error;

pub use address::AddressHash;
pub use error::{Result, SpentError};
pub use registry::{AddOutcome, InMemoryRegistry, SpentAddressRegistry, SqliteRegistry};
pub use service::SpentAddressService;
