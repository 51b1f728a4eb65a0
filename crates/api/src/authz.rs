//! API-side access gate, checked at the handler boundary.
//!
//! Handlers call [`require`] before touching the workflow or stores, so a
//! denied request never reaches persistence.

use axum::http::StatusCode;

use tavolo_auth::{authorize, Action};

use crate::app::errors;
use crate::context::PrincipalContext;

/// Check the caller's role against the action table.
///
/// On denial, returns the ready-to-send 403 response.
pub fn require(
    principal: &PrincipalContext,
    action: Action,
) -> Result<(), axum::response::Response> {
    authorize(principal.role(), action)
        .map_err(|e| errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string()))
}
