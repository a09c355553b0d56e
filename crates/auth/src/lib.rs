//! `wareops-auth`: capability-based authorization for the console session.
//!
//! Role strings from the server are resolved once, at login, into a typed
//! [`CapabilitySet`]. Call sites check capabilities, never role names.
//!
//! This crate is intentionally decoupled from HTTP and token storage.

pub mod authorize;
pub mod permissions;
pub mod principal;
pub mod roles;

pub use authorize::{authorize, AuthzError};
pub use permissions::{Capability, CapabilitySet};
pub use principal::Principal;
pub use roles::Role;
