//! In-memory stores for dev/test.
//!
//! Each store keeps its records behind a single `RwLock`; every multi-row
//! order mutation happens under one write guard, which gives the same
//! all-or-nothing visibility the Postgres backend gets from a transaction.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use tavolo_catalog::Product;
use tavolo_core::{CustomerId, OrderId, ProductId};
use tavolo_customers::Customer;
use tavolo_orders::{Order, OrderStatus};

use super::{CatalogStore, CustomerDirectory, OrderStore, StoreError, StoreResult};

fn poisoned() -> StoreError {
    StoreError::Backend("store lock poisoned".to_string())
}

#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    inner: RwLock<HashMap<ProductId, Product>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(&id).cloned())
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        let mut products: Vec<Product> = map.values().cloned().collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }

    async fn list_available(&self) -> StoreResult<Vec<Product>> {
        let mut products = self.list_products().await?;
        products.retain(|p| p.is_available);
        Ok(products)
    }

    async fn insert_product(&self, product: &Product) -> StoreResult<()> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if map.contains_key(&product.id) {
            return Err(StoreError::Duplicate(format!("product {}", product.id)));
        }
        map.insert(product.id, product.clone());
        Ok(())
    }

    async fn update_product(&self, product: &Product) -> StoreResult<()> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        match map.get_mut(&product.id) {
            Some(existing) => {
                *existing = product.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        match map.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound),
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    inner: RwLock<HashMap<CustomerId, Customer>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CustomerDirectory for InMemoryDirectory {
    async fn get_customer(&self, id: CustomerId) -> StoreResult<Option<Customer>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(&id).cloned())
    }

    async fn list_customers(&self) -> StoreResult<Vec<Customer>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        let mut customers: Vec<Customer> = map.values().cloned().collect();
        customers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(customers)
    }

    async fn insert_customer(&self, customer: &Customer) -> StoreResult<()> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if map.contains_key(&customer.id) {
            return Err(StoreError::Duplicate(format!("customer {}", customer.id)));
        }
        map.insert(customer.id, customer.clone());
        Ok(())
    }

    async fn update_customer(&self, customer: &Customer) -> StoreResult<()> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        match map.get_mut(&customer.id) {
            Some(existing) => {
                *existing = customer.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn delete_customer(&self, id: CustomerId) -> StoreResult<()> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        match map.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound),
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryOrders {
    inner: RwLock<HashMap<OrderId, Order>>,
}

impl InMemoryOrders {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrders {
    async fn get_order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(&id).cloned())
    }

    async fn list_orders(&self) -> StoreResult<Vec<Order>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        let mut orders: Vec<Order> = map.values().cloned().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn insert_order(&self, order: &Order) -> StoreResult<()> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if map.contains_key(&order.id) {
            return Err(StoreError::Duplicate(format!("order {}", order.id)));
        }
        map.insert(order.id, order.clone());
        Ok(())
    }

    async fn replace_order(&self, order: &Order) -> StoreResult<()> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        match map.get_mut(&order.id) {
            Some(existing) => {
                *existing = order.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn update_status(&self, id: OrderId, status: OrderStatus) -> StoreResult<()> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        match map.get_mut(&id) {
            Some(existing) => {
                existing.status = status;
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }
}
