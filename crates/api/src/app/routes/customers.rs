use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use kegtrail_auth::catalog;
use kegtrail_core::CustomerId;
use kegtrail_observability::{AuditEntry, AuditLevel, AuditSink};
use kegtrail_tracking::{CustomerFilter, NewCustomer};

use crate::app::routes::parse_id;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_customer).get(list_customers))
        .route(
            "/:id",
            get(get_customer).patch(update_customer).delete(delete_customer),
        )
}

fn new_customer_from(body: dto::CreateCustomerRequest) -> Result<NewCustomer, axum::response::Response> {
    let kind = errors::parse_customer_type(&body.kind)?;
    Ok(NewCustomer {
        name: body.name,
        address: body.address,
        contact: body.contact,
        phone: body.phone,
        kind,
    })
}

pub async fn create_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CreateCustomerRequest>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&principal, catalog::CUSTOMERS_CREATE) {
        return resp;
    }
    let new = match new_customer_from(body) {
        Ok(n) => n,
        Err(resp) => return resp,
    };
    match services.customers.create(&new) {
        Ok(customer) => {
            services.audit.record(
                AuditEntry::new(
                    AuditLevel::Info,
                    "customers",
                    format!("created customer {}", customer.name),
                )
                .user_email(principal.email()),
            );
            (StatusCode::CREATED, Json(dto::customer_to_json(&customer))).into_response()
        }
        Err(e) => errors::registry_error_to_response(e),
    }
}

pub async fn list_customers(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(params): Query<dto::CustomerListParams>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&principal, catalog::CUSTOMERS_READ) {
        return resp;
    }
    let filter = CustomerFilter {
        name_contains: params.name,
    };
    let cursor = match dto::decode_cursor(params.cursor.as_deref()) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    match services.history.customers_page(&filter, cursor) {
        Ok(page) => (
            StatusCode::OK,
            Json(dto::page_to_json(&page, dto::customer_to_json)),
        )
            .into_response(),
        Err(e) => errors::query_error_to_response(e),
    }
}

pub async fn get_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&principal, catalog::CUSTOMERS_READ) {
        return resp;
    }
    let id: CustomerId = match parse_id(&id, "invalid customer id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.customers.get(id) {
        Ok(customer) => (StatusCode::OK, Json(dto::customer_to_json(&customer))).into_response(),
        Err(e) => errors::registry_error_to_response(e),
    }
}

pub async fn update_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::CreateCustomerRequest>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&principal, catalog::CUSTOMERS_UPDATE) {
        return resp;
    }
    let id: CustomerId = match parse_id(&id, "invalid customer id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let new = match new_customer_from(body) {
        Ok(n) => n,
        Err(resp) => return resp,
    };
    match services.customers.update(id, &new) {
        Ok(customer) => (StatusCode::OK, Json(dto::customer_to_json(&customer))).into_response(),
        Err(e) => errors::registry_error_to_response(e),
    }
}

pub async fn delete_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&principal, catalog::CUSTOMERS_DELETE) {
        return resp;
    }
    let id: CustomerId = match parse_id(&id, "invalid customer id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.customers.delete(id) {
        Ok(()) => {
            services.audit.record(
                AuditEntry::new(AuditLevel::Warn, "customers", format!("deleted customer {id}"))
                    .user_email(principal.email()),
            );
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => errors::registry_error_to_response(e),
    }
}
