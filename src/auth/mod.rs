//! Authentication module for the session and credential lifecycle.
//!
//! This module provides:
//! - `CredentialStore`: durable per-field persistence of the credential
//!   record, degrading to in-memory no-ops when storage is unavailable
//! - `SessionManager`: expiry evaluation, transparent single-flight token
//!   renewal, login/logout writes
//!
//! The store is only ever written through the manager.

pub mod session;
pub mod store;

pub use session::SessionManager;
pub use store::{CredentialRecord, CredentialStore};
