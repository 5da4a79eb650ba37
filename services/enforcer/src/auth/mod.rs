//! Authentication and tenant authorization.
//!
//! # Purpose
//! Groups session-token verification and the tenant identity resolver that
//! turns a verified session into an actor with a device scope.
pub mod identity;
pub mod session;

pub use identity::{Actor, Role, Scope, TenantIdentityResolver};
pub use session::{SessionClaims, SessionError, SessionIdentity, SessionVerifier};
