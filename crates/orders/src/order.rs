use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tavolo_core::{CustomerId, DomainError, DomainResult, Entity, OrderId, ProductId};

/// How the order reaches the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FulfillmentType {
    Delivery,
    #[serde(rename = "Dine-in")]
    DineIn,
    Takeaway,
}

impl FulfillmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FulfillmentType::Delivery => "Delivery",
            FulfillmentType::DineIn => "Dine-in",
            FulfillmentType::Takeaway => "Takeaway",
        }
    }
}

impl core::fmt::Display for FulfillmentType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for FulfillmentType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "delivery" => Ok(FulfillmentType::Delivery),
            "dine-in" => Ok(FulfillmentType::DineIn),
            "takeaway" => Ok(FulfillmentType::Takeaway),
            _ => Err(DomainError::validation(
                "type: must be one of Delivery, Dine-in, Takeaway",
            )),
        }
    }
}

/// Order status lifecycle.
///
/// Any status is reachable from any other via an explicit update; the
/// original system enforces no transition graph and neither do we.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Delivering,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Delivering => "Delivering",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "delivering" => Ok(OrderStatus::Delivering),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(DomainError::validation(
                "status: must be one of Pending, Delivering, Completed, Cancelled",
            )),
        }
    }
}

/// One order line: product reference, quantity, and the price snapshot taken
/// when the line was created. Owned exclusively by its order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub line_no: u32,
    pub product_id: ProductId,
    pub quantity: u32,
    /// Price in smallest currency unit (e.g., cents), captured from the
    /// product at order/revision time. Never a live reference.
    pub unit_price: u64,
    pub subtotal: u64,
}

/// Order aggregate: header plus its owned line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub fulfillment: FulfillmentType,
    pub status: OrderStatus,
    /// Only meaningful for takeaway orders.
    pub pickup_time: Option<String>,
    /// Only meaningful for dine-in orders.
    pub table_number: Option<String>,
    /// Derived: always the sum of line subtotals at the time of last persist.
    pub total_amount: u64,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<OrderLine>,
}

impl Order {
    /// True when the stored total matches the sum of line subtotals.
    pub fn total_consistent(&self) -> bool {
        let sum = self
            .lines
            .iter()
            .try_fold(0u64, |acc, l| acc.checked_add(l.subtotal));
        sum == Some(self.total_amount)
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// An item chosen by the caller: which product, how many. The price is
/// deliberately absent; it is resolved server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSelection {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Input for creating an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSubmission {
    pub customer_id: CustomerId,
    pub fulfillment: FulfillmentType,
    pub pickup_time: Option<String>,
    pub table_number: Option<String>,
    pub items: Vec<LineSelection>,
}

impl OrderSubmission {
    pub fn validate(&self) -> DomainResult<()> {
        if self.items.is_empty() {
            return Err(DomainError::validation("items: must not be empty"));
        }
        Ok(())
    }
}

/// Input for updating an order. `None` means "field not supplied".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRevision {
    pub status: Option<OrderStatus>,
    pub fulfillment: Option<FulfillmentType>,
    pub pickup_time: Option<String>,
    pub table_number: Option<String>,
    pub customer_id: Option<CustomerId>,
    pub items: Option<Vec<LineSelection>>,
}

impl OrderRevision {
    /// A status-only transition bypasses the line-item machinery entirely.
    pub fn is_status_only(&self) -> bool {
        self.status.is_some()
            && self.fulfillment.is_none()
            && self.pickup_time.is_none()
            && self.table_number.is_none()
            && self.customer_id.is_none()
            && self.items.is_none()
    }
}

/// Price a set of line selections against resolved unit prices.
///
/// `price_of` is expected to return the product's *current* price; any
/// missing product aborts the whole computation with `NotFound` so callers
/// never persist a partially-priced order. Line numbers start at 1 and
/// follow the selection order.
pub fn price_lines(
    selections: &[LineSelection],
    mut price_of: impl FnMut(ProductId) -> Option<u64>,
) -> DomainResult<(Vec<OrderLine>, u64)> {
    let mut lines = Vec::with_capacity(selections.len());
    let mut total: u64 = 0;

    for (idx, selection) in selections.iter().enumerate() {
        if selection.quantity < 1 {
            return Err(DomainError::validation(format!(
                "items[{idx}].quantity: must be at least 1"
            )));
        }

        let unit_price = price_of(selection.product_id).ok_or(DomainError::NotFound)?;
        let subtotal = unit_price
            .checked_mul(u64::from(selection.quantity))
            .ok_or_else(|| DomainError::invariant("line subtotal overflows"))?;
        total = total
            .checked_add(subtotal)
            .ok_or_else(|| DomainError::invariant("order total overflows"))?;

        lines.push(OrderLine {
            line_no: (idx as u32) + 1,
            product_id: selection.product_id,
            quantity: selection.quantity,
            unit_price,
            subtotal,
        });
    }

    Ok((lines, total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn selection(product_id: ProductId, quantity: u32) -> LineSelection {
        LineSelection {
            product_id,
            quantity,
        }
    }

    #[test]
    fn fulfillment_round_trips_through_strings() {
        for (s, v) in [
            ("Delivery", FulfillmentType::Delivery),
            ("Dine-in", FulfillmentType::DineIn),
            ("Takeaway", FulfillmentType::Takeaway),
        ] {
            assert_eq!(s.parse::<FulfillmentType>().unwrap(), v);
            assert_eq!(v.as_str(), s);
        }
        assert!("Drive-through".parse::<FulfillmentType>().is_err());
    }

    #[test]
    fn status_round_trips_through_strings() {
        for (s, v) in [
            ("Pending", OrderStatus::Pending),
            ("Delivering", OrderStatus::Delivering),
            ("Completed", OrderStatus::Completed),
            ("Cancelled", OrderStatus::Cancelled),
        ] {
            assert_eq!(s.parse::<OrderStatus>().unwrap(), v);
            assert_eq!(v.as_str(), s);
        }
        assert!("Refunded".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn pricing_computes_subtotals_and_total() {
        let p3 = ProductId::new();
        let p5 = ProductId::new();
        let prices: HashMap<ProductId, u64> = [(p3, 1899), (p5, 2100)].into_iter().collect();

        let (lines, total) = price_lines(
            &[selection(p3, 2), selection(p5, 1)],
            |id| prices.get(&id).copied(),
        )
        .unwrap();

        assert_eq!(total, 2 * 1899 + 2100);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].line_no, 1);
        assert_eq!(lines[0].unit_price, 1899);
        assert_eq!(lines[0].subtotal, 3798);
        assert_eq!(lines[1].line_no, 2);
        assert_eq!(lines[1].subtotal, 2100);
    }

    #[test]
    fn pricing_rejects_zero_quantity() {
        let p = ProductId::new();
        let err = price_lines(&[selection(p, 0)], |_| Some(100)).unwrap_err();
        match err {
            DomainError::Validation(msg) => assert!(msg.contains("quantity")),
            _ => panic!("expected Validation"),
        }
    }

    #[test]
    fn pricing_aborts_on_unknown_product() {
        let known = ProductId::new();
        let unknown = ProductId::new();
        let err = price_lines(
            &[selection(known, 1), selection(unknown, 1)],
            |id| if id == known { Some(100) } else { None },
        )
        .unwrap_err();
        assert_eq!(err, DomainError::NotFound);
    }

    #[test]
    fn pricing_overflow_is_an_error_not_a_wrap() {
        let p = ProductId::new();
        let err = price_lines(&[selection(p, 3)], |_| Some(u64::MAX / 2)).unwrap_err();
        match err {
            DomainError::InvariantViolation(_) => {}
            _ => panic!("expected InvariantViolation"),
        }
    }

    #[test]
    fn empty_selection_prices_to_zero() {
        let (lines, total) = price_lines(&[], |_| None).unwrap();
        assert!(lines.is_empty());
        assert_eq!(total, 0);
    }

    #[test]
    fn submission_requires_items() {
        let submission = OrderSubmission {
            customer_id: CustomerId::new(),
            fulfillment: FulfillmentType::Delivery,
            pickup_time: None,
            table_number: None,
            items: vec![],
        };
        let err = submission.validate().unwrap_err();
        match err {
            DomainError::Validation(msg) => assert!(msg.starts_with("items:")),
            _ => panic!("expected Validation"),
        }
    }

    #[test]
    fn status_only_revision_is_detected() {
        let rev = OrderRevision {
            status: Some(OrderStatus::Delivering),
            ..OrderRevision::default()
        };
        assert!(rev.is_status_only());

        let rev = OrderRevision {
            status: Some(OrderStatus::Delivering),
            table_number: Some("12".to_string()),
            ..OrderRevision::default()
        };
        assert!(!rev.is_status_only());

        assert!(!OrderRevision::default().is_status_only());
    }

    #[test]
    fn total_consistency_check() {
        let p = ProductId::new();
        let (lines, total) = price_lines(&[selection(p, 2)], |_| Some(1899)).unwrap();
        let mut order = Order {
            id: OrderId::new(),
            customer_id: CustomerId::new(),
            fulfillment: FulfillmentType::Delivery,
            status: OrderStatus::Pending,
            pickup_time: None,
            table_number: None,
            total_amount: total,
            created_at: Utc::now(),
            lines,
        };
        assert!(order.total_consistent());
        order.total_amount += 1;
        assert!(!order.total_consistent());
    }

    #[test]
    fn fulfillment_serializes_with_wire_names() {
        let json = serde_json::to_string(&FulfillmentType::DineIn).unwrap();
        assert_eq!(json, "\"Dine-in\"");
        let back: FulfillmentType = serde_json::from_str("\"Dine-in\"").unwrap();
        assert_eq!(back, FulfillmentType::DineIn);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: the computed total always equals the sum of subtotals,
            /// and every subtotal equals unit_price × quantity.
            #[test]
            fn total_is_sum_of_subtotals(
                prices in proptest::collection::vec(1u64..100_000, 1..20),
                quantities in proptest::collection::vec(1u32..50, 1..20),
            ) {
                let n = prices.len().min(quantities.len());
                let ids: Vec<ProductId> = (0..n).map(|_| ProductId::new()).collect();
                let price_map: std::collections::HashMap<ProductId, u64> =
                    ids.iter().copied().zip(prices.iter().copied()).collect();
                let selections: Vec<LineSelection> = ids
                    .iter()
                    .zip(quantities.iter())
                    .map(|(id, q)| LineSelection { product_id: *id, quantity: *q })
                    .collect();

                let (lines, total) =
                    price_lines(&selections, |id| price_map.get(&id).copied()).unwrap();

                let sum: u64 = lines.iter().map(|l| l.subtotal).sum();
                prop_assert_eq!(total, sum);
                for (line, sel) in lines.iter().zip(selections.iter()) {
                    prop_assert_eq!(line.unit_price * u64::from(sel.quantity), line.subtotal);
                    prop_assert_eq!(line.quantity, sel.quantity);
                }
            }

            /// Property: line numbers are 1-based and dense.
            #[test]
            fn line_numbers_are_dense(count in 1usize..30) {
                let ids: Vec<ProductId> = (0..count).map(|_| ProductId::new()).collect();
                let selections: Vec<LineSelection> = ids
                    .iter()
                    .map(|id| LineSelection { product_id: *id, quantity: 1 })
                    .collect();

                let (lines, _) = price_lines(&selections, |_| Some(1)).unwrap();
                for (i, line) in lines.iter().enumerate() {
                    prop_assert_eq!(line.line_no as usize, i + 1);
                }
            }
        }
    }
}
