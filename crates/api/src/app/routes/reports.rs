use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use kegtrail_assets::Asset;
use kegtrail_auth::catalog;
use kegtrail_ledger::Movement;
use kegtrail_store::{DocumentStore, Query, StoreResult};
use kegtrail_tracking::{collections, holdings_by_customer};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new().route("/holdings", get(holdings))
}

fn scan<T: serde::de::DeserializeOwned>(
    services: &AppServices,
    collection: &str,
) -> StoreResult<Vec<T>> {
    services
        .store
        .query(&Query::collection(collection))?
        .iter()
        .map(|doc| doc.to_typed())
        .collect()
}

/// Per-customer holdings, recomputed from the current snapshot on every call.
pub async fn holdings(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&principal, catalog::REPORTS_READ) {
        return resp;
    }

    let assets: Vec<Asset> = match scan(&services, collections::ASSETS) {
        Ok(v) => v,
        Err(e) => return errors::store_error_to_response(e),
    };
    let movements: Vec<Movement> = match scan(&services, collections::MOVEMENTS) {
        Ok(v) => v,
        Err(e) => return errors::store_error_to_response(e),
    };

    let report = holdings_by_customer(&assets, &movements);
    (StatusCode::OK, Json(dto::holdings_to_json(&report))).into_response()
}
