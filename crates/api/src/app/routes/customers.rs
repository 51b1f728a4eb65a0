use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use tavolo_auth::Action;
use tavolo_core::CustomerId;
use tavolo_customers::Customer;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_customer).get(list_customers))
        .route(
            "/:id",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
}

pub async fn create_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Json(body): Json<dto::CustomerPayload>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&principal, Action::ManageCustomers) {
        return resp;
    }

    let customer = match Customer::new(CustomerId::new(), body.into_draft(), Utc::now()) {
        Ok(c) => c,
        Err(e) => return errors::domain_error_to_response(e),
    };

    if let Err(e) = services.customers.insert_customer(&customer).await {
        return errors::store_error_to_response(e);
    }

    (StatusCode::CREATED, Json(dto::customer_to_json(customer))).into_response()
}

pub async fn update_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::CustomerPayload>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&principal, Action::ManageCustomers) {
        return resp;
    }

    let id: CustomerId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let mut customer = match services.customers.get_customer(id).await {
        Ok(Some(c)) => c,
        Ok(None) => {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "customer not found")
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    if let Err(e) = customer.apply(body.into_draft()) {
        return errors::domain_error_to_response(e);
    }
    if let Err(e) = services.customers.update_customer(&customer).await {
        return errors::store_error_to_response(e);
    }

    (StatusCode::OK, Json(dto::customer_to_json(customer))).into_response()
}

/// Existing orders keep their `customer_id` after a delete; there is no
/// cascade into order history.
pub async fn delete_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&principal, Action::ManageCustomers) {
        return resp;
    }

    let id: CustomerId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.customers.delete_customer(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&principal, Action::HandleOrders) {
        return resp;
    }

    let id: CustomerId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.customers.get_customer(id).await {
        Ok(Some(c)) => (StatusCode::OK, Json(dto::customer_to_json(c))).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "customer not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Order attribution needs the directory, so listing is open to every role
/// that handles orders; mutations stay with customer managers.
pub async fn list_customers(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&principal, Action::HandleOrders) {
        return resp;
    }

    match services.customers.list_customers().await {
        Ok(customers) => {
            let items = customers
                .into_iter()
                .map(dto::customer_to_json)
                .collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}
