//! `tavolo-infra` — storage backends and the order workflow service.
//!
//! Domain crates stay pure; everything that touches a store lives here. Two
//! interchangeable backends are provided: an in-memory store for dev/test and
//! a Postgres store (sqlx) for real deployments.

pub mod store;
pub mod workflow;

pub use store::{CatalogStore, CustomerDirectory, OrderStore, StoreError};
pub use workflow::{OrderWorkflow, WorkflowError};
