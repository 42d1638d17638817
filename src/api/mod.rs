//! REST API client module for the portal's identity provider.
//!
//! This module provides the `PortalClient` for exchanging credentials and
//! refresh tokens for token grants, and for resolving the signed-in
//! account's profile.
//!
//! Protected endpoints use JWT bearer tokens; the grant shape is shared
//! by the issuance and renewal endpoints.

pub mod client;
pub mod error;

pub use client::{PortalClient, TokenGrant, UserClaim};
pub use error::ApiError;
