//! Order domain module.
//!
//! This crate contains the order aggregate (header + owned line items) and
//! the pricing/total computation, implemented purely as deterministic domain
//! logic (no IO, no HTTP, no storage). Line prices are always resolved from
//! the catalog by the caller and snapshotted into the lines here.

pub mod order;

pub use order::{
    price_lines, FulfillmentType, LineSelection, Order, OrderLine, OrderRevision, OrderStatus,
    OrderSubmission,
};
