//! `tavolo-auth` — pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage. Signature
//! verification of tokens lives in the transport layer; this crate owns the
//! claims model, the closed role/action vocabulary, and the access gate.

pub mod actions;
pub mod authorize;
pub mod claims;
pub mod principal;
pub mod roles;

pub use actions::Action;
pub use authorize::{authorize, allowed_roles, AuthzError};
pub use claims::{validate_claims, JwtClaims, TokenValidationError};
pub use principal::PrincipalId;
pub use roles::Role;
