//! Postgres-backed stores.
//!
//! Expected schema (minor currency units stored as BIGINT):
//!
//! ```sql
//! CREATE TABLE products (
//!     id           UUID PRIMARY KEY,
//!     name         TEXT NOT NULL,
//!     description  TEXT,
//!     price        BIGINT NOT NULL CHECK (price >= 0),
//!     category     TEXT NOT NULL,
//!     is_available BOOLEAN NOT NULL,
//!     created_at   TIMESTAMPTZ NOT NULL
//! );
//!
//! CREATE TABLE customers (
//!     id         UUID PRIMARY KEY,
//!     name       TEXT NOT NULL,
//!     email      TEXT NOT NULL,
//!     phone      TEXT NOT NULL,
//!     address    TEXT NOT NULL,
//!     city       TEXT NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL
//! );
//!
//! CREATE TABLE orders (
//!     id           UUID PRIMARY KEY,
//!     customer_id  UUID NOT NULL,
//!     fulfillment  TEXT NOT NULL,
//!     status       TEXT NOT NULL,
//!     pickup_time  TEXT,
//!     table_number TEXT,
//!     total_amount BIGINT NOT NULL CHECK (total_amount >= 0),
//!     created_at   TIMESTAMPTZ NOT NULL
//! );
//!
//! CREATE TABLE order_items (
//!     order_id   UUID NOT NULL REFERENCES orders (id),
//!     line_no    INT NOT NULL CHECK (line_no >= 1),
//!     product_id UUID NOT NULL,
//!     quantity   INT NOT NULL CHECK (quantity >= 1),
//!     unit_price BIGINT NOT NULL,
//!     subtotal   BIGINT NOT NULL,
//!     PRIMARY KEY (order_id, line_no)
//! );
//! ```
//!
//! ## Error mapping
//!
//! | SQLx error | PostgreSQL code | `StoreError` |
//! |------------|-----------------|--------------|
//! | Database (unique violation) | `23505` | `Duplicate` |
//! | Database (other) | any | `Backend` |
//! | RowNotFound / pool / network | — | `Backend` |
//!
//! Header + line writes for one order always share a transaction, so a
//! failed revision leaves the previously committed aggregate untouched.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use tavolo_catalog::Product;
use tavolo_core::{CustomerId, OrderId, ProductId};
use tavolo_customers::Customer;
use tavolo_orders::{FulfillmentType, Order, OrderLine, OrderStatus};

use super::{CatalogStore, CustomerDirectory, OrderStore, StoreError, StoreResult};

/// Postgres-backed implementation of all three store traits.
///
/// Uses the SQLx connection pool, which is thread-safe and cheap to clone.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

fn map_sqlx_error(operation: &str, e: sqlx::Error) -> StoreError {
    if is_unique_violation(&e) {
        return StoreError::Duplicate(format!("{operation}: {e}"));
    }
    StoreError::Backend(format!("{operation}: {e}"))
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => db.code().as_deref() == Some("23505"),
        _ => false,
    }
}

fn product_from_row(row: &PgRow) -> StoreResult<Product> {
    Ok(Product {
        id: ProductId::from_uuid(
            row.try_get("id")
                .map_err(|e| map_sqlx_error("decode products.id", e))?,
        ),
        name: row
            .try_get("name")
            .map_err(|e| map_sqlx_error("decode products.name", e))?,
        description: row
            .try_get("description")
            .map_err(|e| map_sqlx_error("decode products.description", e))?,
        price: row
            .try_get::<i64, _>("price")
            .map_err(|e| map_sqlx_error("decode products.price", e))? as u64,
        category: row
            .try_get("category")
            .map_err(|e| map_sqlx_error("decode products.category", e))?,
        is_available: row
            .try_get("is_available")
            .map_err(|e| map_sqlx_error("decode products.is_available", e))?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(|e| map_sqlx_error("decode products.created_at", e))?,
    })
}

fn customer_from_row(row: &PgRow) -> StoreResult<Customer> {
    Ok(Customer {
        id: CustomerId::from_uuid(
            row.try_get("id")
                .map_err(|e| map_sqlx_error("decode customers.id", e))?,
        ),
        name: row
            .try_get("name")
            .map_err(|e| map_sqlx_error("decode customers.name", e))?,
        email: row
            .try_get("email")
            .map_err(|e| map_sqlx_error("decode customers.email", e))?,
        phone: row
            .try_get("phone")
            .map_err(|e| map_sqlx_error("decode customers.phone", e))?,
        address: row
            .try_get("address")
            .map_err(|e| map_sqlx_error("decode customers.address", e))?,
        city: row
            .try_get("city")
            .map_err(|e| map_sqlx_error("decode customers.city", e))?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(|e| map_sqlx_error("decode customers.created_at", e))?,
    })
}

fn order_header_from_row(row: &PgRow) -> StoreResult<Order> {
    let fulfillment: String = row
        .try_get("fulfillment")
        .map_err(|e| map_sqlx_error("decode orders.fulfillment", e))?;
    let status: String = row
        .try_get("status")
        .map_err(|e| map_sqlx_error("decode orders.status", e))?;

    Ok(Order {
        id: OrderId::from_uuid(
            row.try_get("id")
                .map_err(|e| map_sqlx_error("decode orders.id", e))?,
        ),
        customer_id: CustomerId::from_uuid(
            row.try_get("customer_id")
                .map_err(|e| map_sqlx_error("decode orders.customer_id", e))?,
        ),
        fulfillment: fulfillment
            .parse::<FulfillmentType>()
            .map_err(|e| StoreError::Backend(format!("corrupt orders.fulfillment: {e}")))?,
        status: status
            .parse::<OrderStatus>()
            .map_err(|e| StoreError::Backend(format!("corrupt orders.status: {e}")))?,
        pickup_time: row
            .try_get("pickup_time")
            .map_err(|e| map_sqlx_error("decode orders.pickup_time", e))?,
        table_number: row
            .try_get("table_number")
            .map_err(|e| map_sqlx_error("decode orders.table_number", e))?,
        total_amount: row
            .try_get::<i64, _>("total_amount")
            .map_err(|e| map_sqlx_error("decode orders.total_amount", e))? as u64,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(|e| map_sqlx_error("decode orders.created_at", e))?,
        lines: Vec::new(),
    })
}

fn line_from_row(row: &PgRow) -> StoreResult<OrderLine> {
    Ok(OrderLine {
        line_no: row
            .try_get::<i32, _>("line_no")
            .map_err(|e| map_sqlx_error("decode order_items.line_no", e))? as u32,
        product_id: ProductId::from_uuid(
            row.try_get("product_id")
                .map_err(|e| map_sqlx_error("decode order_items.product_id", e))?,
        ),
        quantity: row
            .try_get::<i32, _>("quantity")
            .map_err(|e| map_sqlx_error("decode order_items.quantity", e))? as u32,
        unit_price: row
            .try_get::<i64, _>("unit_price")
            .map_err(|e| map_sqlx_error("decode order_items.unit_price", e))? as u64,
        subtotal: row
            .try_get::<i64, _>("subtotal")
            .map_err(|e| map_sqlx_error("decode order_items.subtotal", e))? as u64,
    })
}

impl PostgresStore {
    async fn load_lines(&self, order_id: OrderId) -> StoreResult<Vec<OrderLine>> {
        let rows = sqlx::query(
            r#"
            SELECT line_no, product_id, quantity, unit_price, subtotal
            FROM order_items
            WHERE order_id = $1
            ORDER BY line_no ASC
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_lines", e))?;

        rows.iter().map(line_from_row).collect()
    }
}

#[async_trait]
impl CatalogStore for PostgresStore {
    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        let row = sqlx::query(
            "SELECT id, name, description, price, category, is_available, created_at FROM products WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_product", e))?;

        row.as_ref().map(product_from_row).transpose()
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query(
            "SELECT id, name, description, price, category, is_available, created_at FROM products ORDER BY created_at DESC",
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_products", e))?;

        rows.iter().map(product_from_row).collect()
    }

    async fn list_available(&self) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query(
            "SELECT id, name, description, price, category, is_available, created_at FROM products WHERE is_available ORDER BY created_at DESC",
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_available", e))?;

        rows.iter().map(product_from_row).collect()
    }

    #[instrument(skip(self, product), fields(product_id = %product.id), err)]
    async fn insert_product(&self, product: &Product) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price, category, is_available, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price as i64)
        .bind(&product.category)
        .bind(product.is_available)
        .bind(product.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_product", e))?;

        Ok(())
    }

    #[instrument(skip(self, product), fields(product_id = %product.id), err)]
    async fn update_product(&self, product: &Product) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $2, description = $3, price = $4, category = $5, is_available = $6
            WHERE id = $1
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price as i64)
        .bind(&product.category)
        .bind(product.is_available)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_product", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl CustomerDirectory for PostgresStore {
    async fn get_customer(&self, id: CustomerId) -> StoreResult<Option<Customer>> {
        let row = sqlx::query(
            "SELECT id, name, email, phone, address, city, created_at FROM customers WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_customer", e))?;

        row.as_ref().map(customer_from_row).transpose()
    }

    async fn list_customers(&self) -> StoreResult<Vec<Customer>> {
        let rows = sqlx::query(
            "SELECT id, name, email, phone, address, city, created_at FROM customers ORDER BY created_at DESC",
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_customers", e))?;

        rows.iter().map(customer_from_row).collect()
    }

    #[instrument(skip(self, customer), fields(customer_id = %customer.id), err)]
    async fn insert_customer(&self, customer: &Customer) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO customers (id, name, email, phone, address, city, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(customer.id.as_uuid())
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(&customer.city)
        .bind(customer.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_customer", e))?;

        Ok(())
    }

    #[instrument(skip(self, customer), fields(customer_id = %customer.id), err)]
    async fn update_customer(&self, customer: &Customer) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE customers
            SET name = $2, email = $3, phone = $4, address = $5, city = $6
            WHERE id = $1
            "#,
        )
        .bind(customer.id.as_uuid())
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(&customer.city)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_customer", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self), fields(customer_id = %id), err)]
    async fn delete_customer(&self, id: CustomerId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_customer", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn get_order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        let row = sqlx::query(
            "SELECT id, customer_id, fulfillment, status, pickup_time, table_number, total_amount, created_at FROM orders WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_order", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut order = order_header_from_row(&row)?;
        order.lines = self.load_lines(order.id).await?;
        Ok(Some(order))
    }

    async fn list_orders(&self) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query(
            "SELECT id, customer_id, fulfillment, status, pickup_time, table_number, total_amount, created_at FROM orders ORDER BY created_at DESC",
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_orders", e))?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut order = order_header_from_row(row)?;
            order.lines = self.load_lines(order.id).await?;
            orders.push(order);
        }
        Ok(orders)
    }

    #[instrument(skip(self, order), fields(order_id = %order.id, line_count = order.lines.len()), err)]
    async fn insert_order(&self, order: &Order) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, customer_id, fulfillment, status, pickup_time, table_number, total_amount, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.customer_id.as_uuid())
        .bind(order.fulfillment.as_str())
        .bind(order.status.as_str())
        .bind(&order.pickup_time)
        .bind(&order.table_number)
        .bind(order.total_amount as i64)
        .bind(order.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_order_header", e))?;

        for line in &order.lines {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, line_no, product_id, quantity, unit_price, subtotal)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(order.id.as_uuid())
            .bind(line.line_no as i32)
            .bind(line.product_id.as_uuid())
            .bind(line.quantity as i32)
            .bind(line.unit_price as i64)
            .bind(line.subtotal as i64)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_order_line", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(())
    }

    #[instrument(skip(self, order), fields(order_id = %order.id, line_count = order.lines.len()), err)]
    async fn replace_order(&self, order: &Order) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET customer_id = $2, fulfillment = $3, status = $4, pickup_time = $5,
                table_number = $6, total_amount = $7
            WHERE id = $1
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.customer_id.as_uuid())
        .bind(order.fulfillment.as_str())
        .bind(order.status.as_str())
        .bind(&order.pickup_time)
        .bind(&order.table_number)
        .bind(order.total_amount as i64)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_order_header", e))?;

        if result.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(StoreError::NotFound);
        }

        sqlx::query("DELETE FROM order_items WHERE order_id = $1")
            .bind(order.id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_order_lines", e))?;

        for line in &order.lines {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, line_no, product_id, quantity, unit_price, subtotal)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(order.id.as_uuid())
            .bind(line.line_no as i32)
            .bind(line.product_id.as_uuid())
            .bind(line.quantity as i32)
            .bind(line.unit_price as i64)
            .bind(line.subtotal as i64)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_order_line", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(order_id = %id, status = %status), err)]
    async fn update_status(&self, id: OrderId, status: OrderStatus) -> StoreResult<()> {
        let result = sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(status.as_str())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_status", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
