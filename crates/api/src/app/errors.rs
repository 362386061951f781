use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use kegtrail_assets::{AssetKind, FillState, Location};
use kegtrail_core::DomainError;
use kegtrail_customers::CustomerType;
use kegtrail_ledger::MovementKind;
use kegtrail_store::StoreError;
use kegtrail_tracking::{QueryError, RecordError, RegistryError};

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::NotFound { .. } => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        StoreError::AlreadyExists { .. } => {
            json_error(StatusCode::CONFLICT, "already_exists", err.to_string())
        }
        StoreError::Conflict => json_error(StatusCode::CONFLICT, "conflict", err.to_string()),
        // The missing index is named verbatim so it can be registered.
        StoreError::IndexRequired { .. } => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "index_required", err.to_string())
        }
        StoreError::Unavailable(_) => {
            json_error(StatusCode::SERVICE_UNAVAILABLE, "unavailable", err.to_string())
        }
        StoreError::Serialization(_) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "serialization_error", err.to_string())
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::PermissionDenied(msg) => json_error(StatusCode::FORBIDDEN, "forbidden", msg),
    }
}

pub fn record_error_to_response(err: RecordError) -> axum::response::Response {
    match err {
        RecordError::AssetNotFound => {
            json_error(StatusCode::NOT_FOUND, "not_found", "asset not found")
        }
        RecordError::CustomerNotFound => {
            json_error(StatusCode::NOT_FOUND, "not_found", "customer not found")
        }
        RecordError::InvalidTransition(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invalid_transition", msg)
        }
        RecordError::Store(e) => store_error_to_response(e),
    }
}

pub fn registry_error_to_response(err: RegistryError) -> axum::response::Response {
    match err {
        RegistryError::Domain(e) => domain_error_to_response(e),
        RegistryError::Store(e) => store_error_to_response(e),
    }
}

pub fn query_error_to_response(err: QueryError) -> axum::response::Response {
    match err {
        QueryError::Store(e) => store_error_to_response(e),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn parse_asset_kind(s: &str) -> Result<AssetKind, axum::response::Response> {
    AssetKind::parse(s).map_err(|_| {
        json_error(
            StatusCode::BAD_REQUEST,
            "invalid_asset_kind",
            "kind must be one of: BARRIL, CO2",
        )
    })
}

pub fn parse_movement_kind(s: &str) -> Result<MovementKind, axum::response::Response> {
    MovementKind::parse(s).map_err(|e| {
        json_error(StatusCode::BAD_REQUEST, "invalid_movement_kind", e.to_string())
    })
}

pub fn parse_fill_state(s: &str) -> Result<FillState, axum::response::Response> {
    match s {
        "LLENO" => Ok(FillState::Lleno),
        "VACIO" => Ok(FillState::Vacio),
        _ => Err(json_error(
            StatusCode::BAD_REQUEST,
            "invalid_fill_state",
            "fill must be one of: LLENO, VACIO",
        )),
    }
}

pub fn parse_location(s: &str) -> Result<Location, axum::response::Response> {
    match s {
        "EN_PLANTA" => Ok(Location::EnPlanta),
        "EN_CLIENTE" => Ok(Location::EnCliente),
        _ => Err(json_error(
            StatusCode::BAD_REQUEST,
            "invalid_location",
            "location must be one of: EN_PLANTA, EN_CLIENTE",
        )),
    }
}

pub fn parse_customer_type(s: &str) -> Result<CustomerType, axum::response::Response> {
    match s {
        "BAR" => Ok(CustomerType::Bar),
        "DISTRIBUIDOR" => Ok(CustomerType::Distribuidor),
        "OTRO" => Ok(CustomerType::Otro),
        _ => Err(json_error(
            StatusCode::BAD_REQUEST,
            "invalid_customer_type",
            "kind must be one of: BAR, DISTRIBUIDOR, OTRO",
        )),
    }
}
