use serde::Deserialize;

use tavolo_catalog::{Product, ProductDraft};
use tavolo_core::DomainResult;
use tavolo_customers::{Customer, CustomerDraft};
use tavolo_orders::{LineSelection, Order, OrderRevision, OrderSubmission};

// -------------------------
// Request DTOs
// -------------------------

/// Product create/update payload (the edit form submits every field).
#[derive(Debug, Deserialize)]
pub struct ProductPayload {
    pub name: String,
    pub description: Option<String>,
    /// Price in smallest currency unit (e.g., cents).
    pub price: u64,
    pub category: String,
    pub is_available: bool,
}

impl ProductPayload {
    pub fn into_draft(self) -> ProductDraft {
        ProductDraft {
            name: self.name,
            description: self.description,
            price: self.price,
            category: self.category,
            is_available: self.is_available,
        }
    }
}

/// Customer create/update payload.
#[derive(Debug, Deserialize)]
pub struct CustomerPayload {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
}

impl CustomerPayload {
    pub fn into_draft(self) -> CustomerDraft {
        CustomerDraft {
            name: self.name,
            email: self.email,
            phone: self.phone,
            address: self.address,
            city: self.city,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: String,
    pub quantity: u32,
}

impl OrderItemRequest {
    fn into_selection(self) -> DomainResult<LineSelection> {
        Ok(LineSelection {
            product_id: self.product_id.parse()?,
            quantity: self.quantity,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: String,
    #[serde(rename = "type")]
    pub order_type: String,
    pub pickup_time: Option<String>,
    pub table_number: Option<String>,
    pub items: Vec<OrderItemRequest>,
}

impl CreateOrderRequest {
    /// Parse the wire shape into a typed submission. The price is absent by
    /// construction; it is resolved server-side by the workflow.
    pub fn into_submission(self) -> DomainResult<OrderSubmission> {
        Ok(OrderSubmission {
            customer_id: self.customer_id.parse()?,
            fulfillment: self.order_type.parse()?,
            pickup_time: self.pickup_time,
            table_number: self.table_number,
            items: self
                .items
                .into_iter()
                .map(OrderItemRequest::into_selection)
                .collect::<DomainResult<_>>()?,
        })
    }
}

/// Order update payload; every field optional. `{status}` alone is a
/// status-only transition.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateOrderRequest {
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub order_type: Option<String>,
    pub pickup_time: Option<String>,
    pub table_number: Option<String>,
    pub customer_id: Option<String>,
    pub items: Option<Vec<OrderItemRequest>>,
}

impl UpdateOrderRequest {
    pub fn into_revision(self) -> DomainResult<OrderRevision> {
        Ok(OrderRevision {
            status: self.status.map(|s| s.parse()).transpose()?,
            fulfillment: self.order_type.map(|s| s.parse()).transpose()?,
            pickup_time: self.pickup_time,
            table_number: self.table_number,
            customer_id: self.customer_id.map(|s| s.parse()).transpose()?,
            items: self
                .items
                .map(|items| {
                    items
                        .into_iter()
                        .map(OrderItemRequest::into_selection)
                        .collect::<DomainResult<Vec<_>>>()
                })
                .transpose()?,
        })
    }
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn product_to_json(product: Product) -> serde_json::Value {
    serde_json::json!({
        "id": product.id.to_string(),
        "name": product.name,
        "description": product.description,
        "price": product.price,
        "category": product.category,
        "is_available": product.is_available,
        "created_at": product.created_at.to_rfc3339(),
    })
}

pub fn customer_to_json(customer: Customer) -> serde_json::Value {
    serde_json::json!({
        "id": customer.id.to_string(),
        "name": customer.name,
        "email": customer.email,
        "phone": customer.phone,
        "address": customer.address,
        "city": customer.city,
        "created_at": customer.created_at.to_rfc3339(),
    })
}

pub fn order_to_json(order: Order) -> serde_json::Value {
    serde_json::json!({
        "id": order.id.to_string(),
        "customer_id": order.customer_id.to_string(),
        "type": order.fulfillment.as_str(),
        "status": order.status.as_str(),
        "pickup_time": order.pickup_time,
        "table_number": order.table_number,
        "total_amount": order.total_amount,
        "created_at": order.created_at.to_rfc3339(),
        "items": order.lines.into_iter().map(|l| serde_json::json!({
            "line_no": l.line_no,
            "product_id": l.product_id.to_string(),
            "quantity": l.quantity,
            "unit_price": l.unit_price,
            "subtotal": l.subtotal,
        })).collect::<Vec<_>>(),
    })
}
