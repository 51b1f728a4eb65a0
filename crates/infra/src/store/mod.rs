//! Store traits: the workflow's view of persistence.
//!
//! The workflow requests exactly the data it needs through these three
//! interfaces; there is no implicit relation traversal. Multi-row order
//! writes (header + lines) are atomic inside each implementation.

pub mod memory;
pub mod postgres;

pub use memory::{InMemoryCatalog, InMemoryDirectory, InMemoryOrders};
pub use postgres::PostgresStore;

use async_trait::async_trait;
use thiserror::Error;

use tavolo_catalog::Product;
use tavolo_core::{CustomerId, OrderId, ProductId};
use tavolo_customers::Customer;
use tavolo_orders::{Order, OrderStatus};

#[derive(Debug, Error)]
pub enum StoreError {
    /// The addressed record does not exist.
    #[error("not found")]
    NotFound,

    /// A uniqueness rule was violated.
    #[error("duplicate record: {0}")]
    Duplicate(String),

    /// The backend failed (connection, IO, serialization).
    #[error("storage backend failure: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Catalog store: products by id, plus the menu listings.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>>;

    /// All products, newest first.
    async fn list_products(&self) -> StoreResult<Vec<Product>>;

    /// Products currently offered for ordering, newest first.
    async fn list_available(&self) -> StoreResult<Vec<Product>>;

    async fn insert_product(&self, product: &Product) -> StoreResult<()>;

    /// Full-record update; `NotFound` if the product does not exist.
    async fn update_product(&self, product: &Product) -> StoreResult<()>;

    async fn delete_product(&self, id: ProductId) -> StoreResult<()>;
}

/// Customer directory: customers by id plus the full listing.
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    async fn get_customer(&self, id: CustomerId) -> StoreResult<Option<Customer>>;

    /// All customers, newest first.
    async fn list_customers(&self) -> StoreResult<Vec<Customer>>;

    async fn insert_customer(&self, customer: &Customer) -> StoreResult<()>;

    /// Full-record update; `NotFound` if the customer does not exist.
    async fn update_customer(&self, customer: &Customer) -> StoreResult<()>;

    async fn delete_customer(&self, id: CustomerId) -> StoreResult<()>;
}

/// Order store. Writes that touch lines are atomic with their header write:
/// either the whole aggregate lands or none of it does.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn get_order(&self, id: OrderId) -> StoreResult<Option<Order>>;

    /// All orders with their lines, newest first.
    async fn list_orders(&self) -> StoreResult<Vec<Order>>;

    /// Persist a new order header together with all of its lines.
    async fn insert_order(&self, order: &Order) -> StoreResult<()>;

    /// Replace an existing order: header fields updated, prior lines
    /// discarded, the given lines written — as one unit.
    async fn replace_order(&self, order: &Order) -> StoreResult<()>;

    /// Status-only transition; does not touch lines or total.
    async fn update_status(&self, id: OrderId, status: OrderStatus) -> StoreResult<()>;
}
