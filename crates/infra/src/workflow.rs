//! Order workflow service.
//!
//! The one place where order mutations happen: validate input, resolve
//! current product prices, compute totals, then hand the finished aggregate
//! to the store in a single atomic write. Prices are never taken from the
//! caller.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, warn};

use tavolo_core::{DomainError, OrderId, ProductId};
use tavolo_orders::{
    price_lines, LineSelection, Order, OrderRevision, OrderStatus, OrderSubmission,
};

use crate::store::{CatalogStore, CustomerDirectory, OrderStore, StoreError};

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Order create/update orchestration over the three store interfaces.
#[derive(Clone)]
pub struct OrderWorkflow {
    catalog: Arc<dyn CatalogStore>,
    customers: Arc<dyn CustomerDirectory>,
    orders: Arc<dyn OrderStore>,
}

impl OrderWorkflow {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        customers: Arc<dyn CustomerDirectory>,
        orders: Arc<dyn OrderStore>,
    ) -> Self {
        Self {
            catalog,
            customers,
            orders,
        }
    }

    pub async fn get(&self, id: OrderId) -> WorkflowResult<Option<Order>> {
        Ok(self.orders.get_order(id).await?)
    }

    pub async fn list(&self) -> WorkflowResult<Vec<Order>> {
        Ok(self.orders.list_orders().await?)
    }

    /// Create an order: resolve prices, compute the total, persist header and
    /// lines as one unit. Status is always Pending on creation.
    pub async fn create(&self, submission: OrderSubmission) -> WorkflowResult<Order> {
        submission.validate()?;
        self.ensure_customer(submission.customer_id).await?;

        let prices = self.resolve_prices(&submission.items).await?;
        let (lines, total_amount) =
            price_lines(&submission.items, |id| prices.get(&id).copied())?;

        let order = Order {
            id: OrderId::new(),
            customer_id: submission.customer_id,
            fulfillment: submission.fulfillment,
            status: OrderStatus::Pending,
            pickup_time: submission.pickup_time,
            table_number: submission.table_number,
            total_amount,
            created_at: Utc::now(),
            lines,
        };

        self.orders.insert_order(&order).await?;
        debug!(order_id = %order.id, total_amount, "order created");
        Ok(order)
    }

    /// Update an order.
    ///
    /// A revision carrying exactly `status` is applied directly, leaving the
    /// lines and total untouched. Anything else is a header/line revision:
    /// when `items` is present the prior line set is discarded and re-priced
    /// at today's catalog prices, atomically with the header update. A
    /// failed revision (e.g. unknown product) leaves the stored order as it
    /// was.
    pub async fn update(&self, id: OrderId, revision: OrderRevision) -> WorkflowResult<Order> {
        let mut order = self
            .orders
            .get_order(id)
            .await?
            .ok_or(DomainError::NotFound)?;

        if revision.is_status_only() {
            let status = revision.status.unwrap_or(order.status);
            self.orders.update_status(id, status).await?;
            order.status = status;
            debug!(order_id = %id, status = %status, "order status updated");
            return Ok(order);
        }

        if let Some(customer_id) = revision.customer_id {
            self.ensure_customer(customer_id).await?;
            order.customer_id = customer_id;
        }
        if let Some(fulfillment) = revision.fulfillment {
            order.fulfillment = fulfillment;
        }
        if let Some(pickup_time) = revision.pickup_time {
            order.pickup_time = Some(pickup_time);
        }
        if let Some(table_number) = revision.table_number {
            order.table_number = Some(table_number);
        }
        if let Some(status) = revision.status {
            order.status = status;
        }

        if let Some(items) = revision.items {
            let prices = self.resolve_prices(&items).await?;
            let (lines, total_amount) = price_lines(&items, |id| prices.get(&id).copied())?;
            order.lines = lines;
            order.total_amount = total_amount;
        }

        self.orders.replace_order(&order).await?;
        debug!(order_id = %id, total_amount = order.total_amount, "order revised");
        Ok(order)
    }

    async fn ensure_customer(&self, id: tavolo_core::CustomerId) -> WorkflowResult<()> {
        match self.customers.get_customer(id).await? {
            Some(_) => Ok(()),
            None => {
                warn!(customer_id = %id, "order references unknown customer");
                Err(DomainError::validation("customer_id: unknown customer").into())
            }
        }
    }

    /// Resolve the current price for every distinct product in the
    /// selection. Any unknown product aborts the whole operation before the
    /// store is touched.
    async fn resolve_prices(
        &self,
        items: &[LineSelection],
    ) -> WorkflowResult<HashMap<ProductId, u64>> {
        let mut prices = HashMap::new();
        for selection in items {
            if prices.contains_key(&selection.product_id) {
                continue;
            }
            match self.catalog.get_product(selection.product_id).await? {
                Some(product) => {
                    prices.insert(selection.product_id, product.price);
                }
                None => {
                    warn!(product_id = %selection.product_id, "order references unknown product");
                    return Err(DomainError::NotFound.into());
                }
            }
        }
        Ok(prices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tavolo_catalog::{Product, ProductDraft};
    use tavolo_core::CustomerId;
    use tavolo_customers::{Customer, CustomerDraft};
    use tavolo_orders::FulfillmentType;

    use crate::store::{InMemoryCatalog, InMemoryDirectory, InMemoryOrders};

    struct Fixture {
        catalog: Arc<InMemoryCatalog>,
        customers: Arc<InMemoryDirectory>,
        orders: Arc<InMemoryOrders>,
        workflow: OrderWorkflow,
    }

    fn fixture() -> Fixture {
        let catalog = Arc::new(InMemoryCatalog::new());
        let customers = Arc::new(InMemoryDirectory::new());
        let orders = Arc::new(InMemoryOrders::new());
        let workflow = OrderWorkflow::new(catalog.clone(), customers.clone(), orders.clone());
        Fixture {
            catalog,
            customers,
            orders,
            workflow,
        }
    }

    async fn seed_product(fx: &Fixture, name: &str, price: u64) -> Product {
        let product = Product::new(
            tavolo_core::ProductId::new(),
            ProductDraft {
                name: name.to_string(),
                description: None,
                price,
                category: "Pizza".to_string(),
                is_available: true,
            },
            Utc::now(),
        )
        .unwrap();
        fx.catalog.insert_product(&product).await.unwrap();
        product
    }

    async fn seed_customer(fx: &Fixture) -> Customer {
        let customer = Customer::new(
            CustomerId::new(),
            CustomerDraft {
                name: "Jane Cooper".to_string(),
                email: "jane@example.com".to_string(),
                phone: "0719876543".to_string(),
                address: "456 Crust Road".to_string(),
                city: "Kandy".to_string(),
            },
            Utc::now(),
        )
        .unwrap();
        fx.customers.insert_customer(&customer).await.unwrap();
        customer
    }

    fn items(selections: &[(tavolo_core::ProductId, u32)]) -> Vec<LineSelection> {
        selections
            .iter()
            .map(|(product_id, quantity)| LineSelection {
                product_id: *product_id,
                quantity: *quantity,
            })
            .collect()
    }

    #[tokio::test]
    async fn create_snapshots_price_and_computes_total() {
        let fx = fixture();
        let customer = seed_customer(&fx).await;
        let product = seed_product(&fx, "Pepperoni Feast", 1899).await;

        let order = fx
            .workflow
            .create(OrderSubmission {
                customer_id: customer.id,
                fulfillment: FulfillmentType::Delivery,
                pickup_time: None,
                table_number: None,
                items: items(&[(product.id, 2)]),
            })
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_amount, 3798);
        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.lines[0].unit_price, 1899);
        assert_eq!(order.lines[0].subtotal, 3798);
        assert!(order.total_consistent());

        let stored = fx.orders.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(stored, order);
    }

    #[tokio::test]
    async fn create_rejects_empty_items_and_persists_nothing() {
        let fx = fixture();
        let customer = seed_customer(&fx).await;

        let err = fx
            .workflow
            .create(OrderSubmission {
                customer_id: customer.id,
                fulfillment: FulfillmentType::Delivery,
                pickup_time: None,
                table_number: None,
                items: vec![],
            })
            .await
            .unwrap_err();

        match err {
            WorkflowError::Domain(DomainError::Validation(msg)) => {
                assert!(msg.starts_with("items:"))
            }
            other => panic!("expected Validation, got {other:?}"),
        }
        assert!(fx.orders.list_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_rejects_unknown_customer() {
        let fx = fixture();
        let product = seed_product(&fx, "Hawaiian", 1750).await;

        let err = fx
            .workflow
            .create(OrderSubmission {
                customer_id: CustomerId::new(),
                fulfillment: FulfillmentType::Delivery,
                pickup_time: None,
                table_number: None,
                items: items(&[(product.id, 1)]),
            })
            .await
            .unwrap_err();

        match err {
            WorkflowError::Domain(DomainError::Validation(msg)) => {
                assert!(msg.starts_with("customer_id:"))
            }
            other => panic!("expected Validation, got {other:?}"),
        }
        assert!(fx.orders.list_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_with_unknown_product_fails_atomically() {
        let fx = fixture();
        let customer = seed_customer(&fx).await;
        let product = seed_product(&fx, "Veggie Lover", 1650).await;

        let err = fx
            .workflow
            .create(OrderSubmission {
                customer_id: customer.id,
                fulfillment: FulfillmentType::Delivery,
                pickup_time: None,
                table_number: None,
                items: items(&[(product.id, 1), (tavolo_core::ProductId::new(), 2)]),
            })
            .await
            .unwrap_err();

        match err {
            WorkflowError::Domain(DomainError::NotFound) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
        assert!(fx.orders.list_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_rejects_zero_quantity() {
        let fx = fixture();
        let customer = seed_customer(&fx).await;
        let product = seed_product(&fx, "Meat Lover", 2100).await;

        let err = fx
            .workflow
            .create(OrderSubmission {
                customer_id: customer.id,
                fulfillment: FulfillmentType::Delivery,
                pickup_time: None,
                table_number: None,
                items: items(&[(product.id, 0)]),
            })
            .await
            .unwrap_err();

        match err {
            WorkflowError::Domain(DomainError::Validation(msg)) => {
                assert!(msg.contains("quantity"))
            }
            other => panic!("expected Validation, got {other:?}"),
        }
        assert!(fx.orders.list_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn status_only_update_leaves_lines_and_total_unchanged() {
        let fx = fixture();
        let customer = seed_customer(&fx).await;
        let product = seed_product(&fx, "Pepperoni Feast", 1899).await;

        let order = fx
            .workflow
            .create(OrderSubmission {
                customer_id: customer.id,
                fulfillment: FulfillmentType::Delivery,
                pickup_time: None,
                table_number: None,
                items: items(&[(product.id, 2)]),
            })
            .await
            .unwrap();

        let updated = fx
            .workflow
            .update(
                order.id,
                OrderRevision {
                    status: Some(OrderStatus::Completed),
                    ..OrderRevision::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.status, OrderStatus::Completed);
        assert_eq!(updated.total_amount, 3798);
        assert_eq!(updated.lines, order.lines);

        let stored = fx.orders.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Completed);
        assert_eq!(stored.total_amount, 3798);
        assert_eq!(stored.lines, order.lines);
    }

    #[tokio::test]
    async fn full_revision_replaces_lines_at_current_prices() {
        let fx = fixture();
        let customer = seed_customer(&fx).await;
        let p3 = seed_product(&fx, "Pepperoni Feast", 1899).await;
        let p5 = seed_product(&fx, "Meat Lover", 2100).await;

        let order = fx
            .workflow
            .create(OrderSubmission {
                customer_id: customer.id,
                fulfillment: FulfillmentType::Delivery,
                pickup_time: None,
                table_number: None,
                items: items(&[(p3.id, 2)]),
            })
            .await
            .unwrap();
        assert_eq!(order.total_amount, 3798);

        let revised = fx
            .workflow
            .update(
                order.id,
                OrderRevision {
                    items: Some(items(&[(p5.id, 1)])),
                    ..OrderRevision::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(revised.lines.len(), 1);
        assert_eq!(revised.lines[0].product_id, p5.id);
        assert_eq!(revised.lines[0].unit_price, 2100);
        assert_eq!(revised.total_amount, 2100);
        assert!(revised.lines.iter().all(|l| l.product_id != p3.id));
    }

    #[tokio::test]
    async fn revision_reprices_against_todays_catalog() {
        let fx = fixture();
        let customer = seed_customer(&fx).await;
        let mut product = seed_product(&fx, "Hawaiian", 1750).await;

        let order = fx
            .workflow
            .create(OrderSubmission {
                customer_id: customer.id,
                fulfillment: FulfillmentType::Takeaway,
                pickup_time: Some("18:30".to_string()),
                table_number: None,
                items: items(&[(product.id, 1)]),
            })
            .await
            .unwrap();
        assert_eq!(order.total_amount, 1750);

        product.price = 1990;
        fx.catalog.update_product(&product).await.unwrap();

        let revised = fx
            .workflow
            .update(
                order.id,
                OrderRevision {
                    items: Some(items(&[(product.id, 1)])),
                    ..OrderRevision::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(revised.lines[0].unit_price, 1990);
        assert_eq!(revised.total_amount, 1990);
    }

    #[tokio::test]
    async fn price_change_does_not_rewrite_existing_orders() {
        let fx = fixture();
        let customer = seed_customer(&fx).await;
        let mut product = seed_product(&fx, "Veggie Lover", 1650).await;

        let order = fx
            .workflow
            .create(OrderSubmission {
                customer_id: customer.id,
                fulfillment: FulfillmentType::Delivery,
                pickup_time: None,
                table_number: None,
                items: items(&[(product.id, 3)]),
            })
            .await
            .unwrap();

        product.price = 9999;
        fx.catalog.update_product(&product).await.unwrap();

        let stored = fx.orders.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(stored.lines[0].unit_price, 1650);
        assert_eq!(stored.total_amount, 3 * 1650);
    }

    #[tokio::test]
    async fn failed_revision_leaves_original_order_untouched() {
        let fx = fixture();
        let customer = seed_customer(&fx).await;
        let product = seed_product(&fx, "Pepperoni Feast", 1899).await;

        let order = fx
            .workflow
            .create(OrderSubmission {
                customer_id: customer.id,
                fulfillment: FulfillmentType::Delivery,
                pickup_time: None,
                table_number: None,
                items: items(&[(product.id, 2)]),
            })
            .await
            .unwrap();

        let err = fx
            .workflow
            .update(
                order.id,
                OrderRevision {
                    items: Some(items(&[(tavolo_core::ProductId::new(), 1)])),
                    ..OrderRevision::default()
                },
            )
            .await
            .unwrap_err();
        match err {
            WorkflowError::Domain(DomainError::NotFound) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }

        let stored = fx.orders.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(stored, order);
    }

    #[tokio::test]
    async fn header_only_revision_keeps_lines_and_total() {
        let fx = fixture();
        let customer = seed_customer(&fx).await;
        let product = seed_product(&fx, "Meat Lover", 2100).await;

        let order = fx
            .workflow
            .create(OrderSubmission {
                customer_id: customer.id,
                fulfillment: FulfillmentType::Delivery,
                pickup_time: None,
                table_number: None,
                items: items(&[(product.id, 1)]),
            })
            .await
            .unwrap();

        let revised = fx
            .workflow
            .update(
                order.id,
                OrderRevision {
                    fulfillment: Some(FulfillmentType::DineIn),
                    table_number: Some("7".to_string()),
                    ..OrderRevision::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(revised.fulfillment, FulfillmentType::DineIn);
        assert_eq!(revised.table_number.as_deref(), Some("7"));
        assert_eq!(revised.lines, order.lines);
        assert_eq!(revised.total_amount, order.total_amount);
    }

    #[tokio::test]
    async fn update_of_missing_order_is_not_found() {
        let fx = fixture();
        let err = fx
            .workflow
            .update(
                OrderId::new(),
                OrderRevision {
                    status: Some(OrderStatus::Cancelled),
                    ..OrderRevision::default()
                },
            )
            .await
            .unwrap_err();
        match err {
            WorkflowError::Domain(DomainError::NotFound) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn any_status_transition_is_allowed() {
        let fx = fixture();
        let customer = seed_customer(&fx).await;
        let product = seed_product(&fx, "Hawaiian", 1750).await;

        let order = fx
            .workflow
            .create(OrderSubmission {
                customer_id: customer.id,
                fulfillment: FulfillmentType::Delivery,
                pickup_time: None,
                table_number: None,
                items: items(&[(product.id, 1)]),
            })
            .await
            .unwrap();

        // No transition graph is enforced, Cancelled back to Pending included.
        for status in [
            OrderStatus::Cancelled,
            OrderStatus::Pending,
            OrderStatus::Delivering,
            OrderStatus::Completed,
            OrderStatus::Pending,
        ] {
            let updated = fx
                .workflow
                .update(
                    order.id,
                    OrderRevision {
                        status: Some(status),
                        ..OrderRevision::default()
                    },
                )
                .await
                .unwrap();
            assert_eq!(updated.status, status);
        }
    }

    #[tokio::test]
    async fn duplicate_products_in_one_submission_become_separate_lines() {
        let fx = fixture();
        let customer = seed_customer(&fx).await;
        let product = seed_product(&fx, "Pepperoni Feast", 1899).await;

        let order = fx
            .workflow
            .create(OrderSubmission {
                customer_id: customer.id,
                fulfillment: FulfillmentType::Delivery,
                pickup_time: None,
                table_number: None,
                items: items(&[(product.id, 1), (product.id, 2)]),
            })
            .await
            .unwrap();

        assert_eq!(order.lines.len(), 2);
        assert_eq!(order.total_amount, 3 * 1899);
        assert_eq!(order.lines[0].line_no, 1);
        assert_eq!(order.lines[1].line_no, 2);
    }
}
