//! Data models for portal entities.
//!
//! This module contains the data structures shared across the client:
//!
//! - `Role`: the closed authorization category issued by the backend
//! - `UserProfile`: display data for the signed-in account

pub mod role;
pub mod user;

pub use role::Role;
pub use user::UserProfile;
