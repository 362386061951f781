use serde::Deserialize;

use kegtrail_assets::Asset;
use kegtrail_customers::Customer;
use kegtrail_ledger::Movement;
use kegtrail_store::Cursor;
use kegtrail_tracking::{HoldingsReport, Page};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateAssetRequest {
    /// `BARRIL` or `CO2`.
    pub kind: String,
    pub format: String,
    /// Batch size; omitted means a single asset.
    pub quantity: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAssetRequest {
    pub format: Option<String>,
    pub variety: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCustomerRequest {
    pub name: String,
    pub address: String,
    pub contact: String,
    pub phone: String,
    /// `BAR`, `DISTRIBUIDOR` or `OTRO`.
    pub kind: String,
}

#[derive(Debug, Deserialize)]
pub struct RecordMovementRequest {
    pub asset_id: String,
    /// Canonical or legacy wire name; normalized before anything persists.
    pub kind: String,
    pub customer_id: String,
    pub variety: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    /// `admin`, `operator` or `viewer`.
    pub role: String,
}

// -------------------------
// List query parameters
// -------------------------

#[derive(Debug, Default, Deserialize)]
pub struct AssetListParams {
    pub kind: Option<String>,
    pub location: Option<String>,
    pub fill: Option<String>,
    #[serde(default)]
    pub critical: bool,
    pub cursor: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CustomerListParams {
    pub name: Option<String>,
    pub cursor: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MovementListParams {
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub kind: Option<String>,
    pub asset_kind: Option<String>,
    #[serde(default)]
    pub critical: bool,
    pub cursor: Option<String>,
}

/// Decode the `cursor` query parameter (JSON-encoded, echoed back verbatim
/// from a previous page response).
pub fn decode_cursor(raw: Option<&str>) -> Result<Option<Cursor>, axum::response::Response> {
    match raw {
        None => Ok(None),
        Some(s) => serde_json::from_str(s).map(Some).map_err(|_| {
            super::errors::json_error(
                axum::http::StatusCode::BAD_REQUEST,
                "invalid_cursor",
                "cursor is not a valid page marker",
            )
        }),
    }
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn asset_to_json(asset: &Asset) -> serde_json::Value {
    serde_json::json!({
        "id": asset.id.to_string(),
        "code": asset.code,
        "kind": asset.kind.as_str(),
        "format": asset.format,
        "status": {
            "fill": asset.status.fill.as_str(),
            "location": asset.status.location.as_str(),
        },
        "holder_id": asset.holder_id.map(|id| id.to_string()),
        "holder_name": asset.holder_name,
        "last_movement_at": asset.last_movement_at.to_rfc3339(),
        "variety": asset.variety,
        "created_at": asset.created_at.to_rfc3339(),
    })
}

pub fn customer_to_json(customer: &Customer) -> serde_json::Value {
    serde_json::json!({
        "id": customer.id.to_string(),
        "name": customer.name,
        "address": customer.address,
        "contact": customer.contact,
        "phone": customer.phone,
        "kind": customer.kind.as_str(),
        "created_at": customer.created_at.to_rfc3339(),
    })
}

pub fn movement_to_json(movement: &Movement) -> serde_json::Value {
    serde_json::json!({
        "id": movement.id.to_string(),
        "asset_id": movement.asset_id.to_string(),
        "asset_code": movement.asset_code,
        "asset_kind": movement.asset_kind.as_str(),
        "kind": movement.kind.as_str(),
        "customer_id": movement.customer_id.to_string(),
        "customer_name": movement.customer_name,
        "user_id": movement.user_id.to_string(),
        "recorded_at": movement.recorded_at.to_rfc3339(),
        "variety": movement.variety,
    })
}

pub fn page_to_json<T>(
    page: &Page<T>,
    item_to_json: impl Fn(&T) -> serde_json::Value,
) -> serde_json::Value {
    serde_json::json!({
        "items": page.items.iter().map(item_to_json).collect::<Vec<_>>(),
        "cursor": page
            .cursor
            .as_ref()
            .and_then(|c| serde_json::to_string(c).ok()),
        "total": page.total,
        "total_is_estimate": page.total_is_estimate,
    })
}

pub fn holdings_to_json(report: &HoldingsReport) -> serde_json::Value {
    serde_json::json!({
        "customers": report.customers.iter().map(|c| serde_json::json!({
            "customer_id": c.customer_id.to_string(),
            "customer_name": c.customer_name,
            "by_format": c.by_format,
            "total": c.total,
        })).collect::<Vec<_>>(),
        "grand_total": report.grand_total,
    })
}
