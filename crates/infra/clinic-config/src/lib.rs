//! Configuration for the clinic back-office tools.
//!
//! This crate provides:
//! - [`ClinicConfig`]: The root configuration type (services, identity, auth, logging)
//! - [`load_merged`]: Two-layer config loading (global + local) with env overrides
//! - [`schema`]: JSON Schema generation for editor completion
//! - [`validation`]: Advisory validation that produces warnings
//!
//! # Configuration Precedence (lowest to highest)
//! 1. Default values
//! 2. Global config (`~/.config/clinic/clinic.json`)
//! 3. Local config (`./clinic.json`)
//! 4. Environment variables
//!
//! # Example
//! ```no_run
//! use clinic_config::{load_merged, ClinicConfig};
//! use std::path::Path;
//!
//! let loaded = load_merged(Path::new(".")).unwrap();
//! println!("Chat backend: {}", loaded.config.services.chat.base_url);
//!
//! for warning in &loaded.warnings {
//!     eprintln!("Warning: {}", warning);
//! }
//! ```
//!
//! # Environment Variables
//! - `CLINIC_API_BASE_URL`: Override the REST base URL
//! - `CLINIC_API_TOKEN`: Static REST bearer token (env-only)
//! - `CLINIC_CHAT_BASE_URL`: Override the chat base URL
//! - `CLINIC_CHAT_TIMEOUT_SECS`: Override the chat timeout
//! - `CLINIC_OIDC_URL`: Override the identity server
//! - `CLINIC_OIDC_REALM`: Override the realm
//! - `CLINIC_OIDC_CLIENT_ID`: Override the client id
//! - `CLINIC_ALLOW_ANONYMOUS`: Allow unauthenticated REST calls ("true" or "1")
//! - `CLINIC_LOG_LEVEL`: Override log level
//! - `CLINIC_LOG_JSON`: Enable JSON logging ("true" or "1")

pub mod loader;
pub mod merge;
pub mod schema;
pub mod types;
pub mod validation;
pub mod writer;

pub use loader::{LoadedClinicConfig, load_merged};
pub use schema::schema_json_pretty;
pub use types::ClinicConfig;
