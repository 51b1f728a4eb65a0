use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use tavolo_auth::Action;
use tavolo_orders::OrderStatus;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/", get(stats))
}

/// Storefront summary: revenue from completed orders, in-flight order count,
/// directory/catalog sizes, and the five most recent orders.
pub async fn stats(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&principal, Action::ViewDashboard) {
        return resp;
    }

    let orders = match services.orders.list_orders().await {
        Ok(o) => o,
        Err(e) => return errors::store_error_to_response(e),
    };
    let customers = match services.customers.list_customers().await {
        Ok(c) => c,
        Err(e) => return errors::store_error_to_response(e),
    };
    let products = match services.catalog.list_products().await {
        Ok(p) => p,
        Err(e) => return errors::store_error_to_response(e),
    };

    let total_revenue: u64 = orders
        .iter()
        .filter(|o| o.status == OrderStatus::Completed)
        .map(|o| o.total_amount)
        .sum();
    let active_orders = orders
        .iter()
        .filter(|o| matches!(o.status, OrderStatus::Pending | OrderStatus::Delivering))
        .count();

    // list_orders is newest first, so the head is the recent set.
    let recent_orders = orders
        .into_iter()
        .take(5)
        .map(dto::order_to_json)
        .collect::<Vec<_>>();

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "total_revenue": total_revenue,
            "active_orders": active_orders,
            "customer_count": customers.len(),
            "product_count": products.len(),
            "recent_orders": recent_orders,
        })),
    )
        .into_response()
}
