#![warn(missing_docs)]

//! Async client for the dental clinic back office.
//!
//! Three concerns live here:
//! - [`Client`] talks to the REST backend (patients, appointments, stock...) with typed
//!   resources, client-side validation and retries on idempotent calls.
//! - [`chat`] wraps the assistant backend behind [`chat::ChatTransport`] and drives one
//!   conversation per surface with [`chat::ChatSession`].
//! - [`auth`] owns the login session ([`auth::SessionManager`]) on top of an OpenID Connect
//!   provider, and feeds bearer tokens to the REST client.

/// Authentication session and identity providers
pub mod auth;
/// Chat assistant transport and conversation state
pub mod chat;
/// HTTP client implementation
pub mod client;
/// Configuration types for the client
pub mod config;
/// Error types
pub mod error;
/// API resource implementations
pub mod resources;
/// Retry logic utilities
pub mod retry;
/// Test support utilities (for use in tests)
#[doc(hidden)]
pub mod test_support;
/// Clinic entities and request payloads
pub mod types;

pub use crate::client::{BearerSource, Client};
pub use crate::config::ClinicConfig;
pub use crate::error::{ApiErrorObject, AuthError, ClinicError};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::auth::{SessionManager, SessionStatus};
    pub use crate::chat::{ChatClient, ChatSession, ChatTransport, PatientContextMode};
    pub use crate::types::*;
    pub use crate::{Client, ClinicConfig};
}
