use axum::{Router, http::StatusCode, routing::get};

use crate::app::errors;

pub mod assets;
pub mod customers;
pub mod movements;
pub mod reports;
pub mod system;
pub mod users;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/stream", get(system::stream))
        .nest("/assets", assets::router())
        .nest("/customers", customers::router())
        .nest("/movements", movements::router())
        .nest("/reports", reports::router())
        .nest("/users", users::router())
}

/// Parse a typed id out of a path segment, mapping failure to a 400.
pub(crate) fn parse_id<T: std::str::FromStr>(
    raw: &str,
    message: &'static str,
) -> Result<T, axum::response::Response> {
    raw.parse()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", message))
}
