use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;

use kegtrail_auth::catalog;
use kegtrail_core::AssetId;
use kegtrail_observability::{AuditEntry, AuditLevel, AuditSink};
use kegtrail_tracking::{AssetFilter, AssetUpdate, NewAssetBatch};

use crate::app::routes::parse_id;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", axum::routing::post(create_assets).get(list_assets))
        .route(
            "/:id",
            get(get_asset).patch(update_asset).delete(delete_asset),
        )
}

pub async fn create_assets(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CreateAssetRequest>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&principal, catalog::ASSETS_CREATE) {
        return resp;
    }
    let kind = match errors::parse_asset_kind(&body.kind) {
        Ok(k) => k,
        Err(resp) => return resp,
    };

    let batch = NewAssetBatch {
        kind,
        format: body.format,
        quantity: body.quantity.unwrap_or(1),
    };
    let created = match services.assets.create_batch(&batch) {
        Ok(assets) => assets,
        Err(e) => return errors::registry_error_to_response(e),
    };

    services.audit.record(
        AuditEntry::new(
            AuditLevel::Info,
            "assets",
            format!("created {} asset(s)", created.len()),
        )
        .detail(created.iter().map(|a| a.code.clone()).collect::<Vec<_>>().join(", "))
        .user_email(principal.email()),
    );

    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "items": created.iter().map(dto::asset_to_json).collect::<Vec<_>>(),
        })),
    )
        .into_response()
}

pub async fn list_assets(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(params): Query<dto::AssetListParams>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&principal, catalog::ASSETS_READ) {
        return resp;
    }

    let mut filter = AssetFilter {
        critical_only: params.critical,
        ..AssetFilter::default()
    };
    if let Some(kind) = params.kind.as_deref() {
        filter.kind = match errors::parse_asset_kind(kind) {
            Ok(k) => Some(k),
            Err(resp) => return resp,
        };
    }
    if let Some(location) = params.location.as_deref() {
        filter.location = match errors::parse_location(location) {
            Ok(l) => Some(l),
            Err(resp) => return resp,
        };
    }
    if let Some(fill) = params.fill.as_deref() {
        filter.fill = match errors::parse_fill_state(fill) {
            Ok(f) => Some(f),
            Err(resp) => return resp,
        };
    }
    let cursor = match dto::decode_cursor(params.cursor.as_deref()) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    match services.history.assets_page(&filter, cursor, Utc::now()) {
        Ok(page) => (
            StatusCode::OK,
            Json(dto::page_to_json(&page, dto::asset_to_json)),
        )
            .into_response(),
        Err(e) => errors::query_error_to_response(e),
    }
}

pub async fn get_asset(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&principal, catalog::ASSETS_READ) {
        return resp;
    }
    let id: AssetId = match parse_id(&id, "invalid asset id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.assets.get(id) {
        Ok(asset) => (StatusCode::OK, Json(dto::asset_to_json(&asset))).into_response(),
        Err(e) => errors::registry_error_to_response(e),
    }
}

pub async fn update_asset(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateAssetRequest>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&principal, catalog::ASSETS_UPDATE) {
        return resp;
    }
    let id: AssetId = match parse_id(&id, "invalid asset id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let changes = AssetUpdate {
        format: body.format,
        variety: body.variety,
    };
    match services.assets.update(id, &changes) {
        Ok(asset) => (StatusCode::OK, Json(dto::asset_to_json(&asset))).into_response(),
        Err(e) => errors::registry_error_to_response(e),
    }
}

pub async fn delete_asset(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&principal, catalog::ASSETS_DELETE) {
        return resp;
    }
    let id: AssetId = match parse_id(&id, "invalid asset id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.assets.delete(id) {
        Ok(()) => {
            services.audit.record(
                AuditEntry::new(AuditLevel::Warn, "assets", format!("deleted asset {id}"))
                    .user_email(principal.email()),
            );
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => errors::registry_error_to_response(e),
    }
}
