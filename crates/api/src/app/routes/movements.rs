use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use kegtrail_auth::catalog;
use kegtrail_core::{AssetId, CustomerId, MovementId};
use kegtrail_ledger::{Movement, NewMovement};
use kegtrail_observability::{AuditEntry, AuditLevel, AuditSink};
use kegtrail_store::DocumentStore;
use kegtrail_tracking::{HistoryFilter, collections};

use crate::app::routes::parse_id;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(record_movement).get(list_movements))
        .route("/:id", get(get_movement).delete(delete_movement))
}

pub async fn record_movement(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::RecordMovementRequest>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&principal, catalog::MOVEMENTS_RECORD) {
        return resp;
    }
    let asset_id: AssetId = match parse_id(&body.asset_id, "invalid asset id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let customer_id: CustomerId = match parse_id(&body.customer_id, "invalid customer id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let kind = match errors::parse_movement_kind(&body.kind) {
        Ok(k) => k,
        Err(resp) => return resp,
    };

    let new = NewMovement {
        asset_id,
        kind,
        customer_id,
        variety: body.variety,
    };
    match services.recorder.record(&new, principal.user_id()) {
        Ok(movement) => {
            services.audit.record(
                AuditEntry::new(
                    AuditLevel::Info,
                    "movements",
                    format!("{} recorded for {}", movement.kind.as_str(), movement.asset_code),
                )
                .user_email(principal.email()),
            );
            (StatusCode::CREATED, Json(dto::movement_to_json(&movement))).into_response()
        }
        Err(e) => errors::record_error_to_response(e),
    }
}

pub async fn list_movements(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(params): Query<dto::MovementListParams>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&principal, catalog::MOVEMENTS_READ) {
        return resp;
    }

    let mut filter = HistoryFilter {
        customer_name_contains: params.customer_name,
        critical_only: params.critical,
        ..HistoryFilter::default()
    };
    if let Some(raw) = params.customer_id.as_deref() {
        filter.customer_id = match parse_id(raw, "invalid customer id") {
            Ok(v) => Some(v),
            Err(resp) => return resp,
        };
    }
    if let Some(kind) = params.kind.as_deref() {
        filter.kind = match errors::parse_movement_kind(kind) {
            Ok(k) => Some(k),
            Err(resp) => return resp,
        };
    }
    if let Some(asset_kind) = params.asset_kind.as_deref() {
        filter.asset_kind = match errors::parse_asset_kind(asset_kind) {
            Ok(k) => Some(k),
            Err(resp) => return resp,
        };
    }
    let cursor = match dto::decode_cursor(params.cursor.as_deref()) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    match services.history.movements_page(&filter, cursor, Utc::now()) {
        Ok(page) => (
            StatusCode::OK,
            Json(dto::page_to_json(&page, dto::movement_to_json)),
        )
            .into_response(),
        Err(e) => errors::query_error_to_response(e),
    }
}

pub async fn get_movement(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&principal, catalog::MOVEMENTS_READ) {
        return resp;
    }
    let id: MovementId = match parse_id(&id, "invalid movement id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let doc = match services.store.get(collections::MOVEMENTS, &id.to_string()) {
        Ok(d) => d,
        Err(e) => return errors::store_error_to_response(e),
    };
    match doc.to_typed::<Movement>() {
        Ok(movement) => (StatusCode::OK, Json(dto::movement_to_json(&movement))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_movement(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&principal, catalog::MOVEMENTS_DELETE) {
        return resp;
    }
    let id: MovementId = match parse_id(&id, "invalid movement id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.recorder.delete(id) {
        Ok(()) => {
            services.audit.record(
                AuditEntry::new(AuditLevel::Warn, "movements", format!("deleted movement {id}"))
                    .user_email(principal.email()),
            );
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => errors::record_error_to_response(e),
    }
}
