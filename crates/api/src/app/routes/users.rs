use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use kegtrail_auth::{Role, User, catalog, validate_email};
use kegtrail_core::UserId;
use kegtrail_observability::{AuditEntry, AuditLevel, AuditSink};
use kegtrail_store::{DocumentStore, Query, to_document_data};
use kegtrail_tracking::collections;

use crate::app::routes::parse_id;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_user).get(list_users))
        .route("/:id", get(get_user).delete(delete_user))
}

fn user_to_json(user: &User) -> serde_json::Value {
    serde_json::json!({
        "id": user.id.to_string(),
        "email": user.email,
        "role": user.role.as_str(),
        "created_at": user.created_at.to_rfc3339(),
    })
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CreateUserRequest>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&principal, catalog::USERS_MANAGE) {
        return resp;
    }
    if let Err(e) = validate_email(&body.email) {
        return errors::domain_error_to_response(e);
    }
    let role = match Role::parse(&body.role) {
        Ok(r) => r,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let user = User {
        id: UserId::new(),
        email: body.email,
        role,
        created_at: Utc::now(),
    };
    let data = match to_document_data(&user) {
        Ok(d) => d,
        Err(e) => return errors::store_error_to_response(e),
    };
    if let Err(e) = services.store.insert(collections::USERS, data) {
        return errors::store_error_to_response(e);
    }

    services.audit.record(
        AuditEntry::new(AuditLevel::Info, "users", format!("created user {}", user.email))
            .user_email(principal.email()),
    );

    (StatusCode::CREATED, Json(user_to_json(&user))).into_response()
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&principal, catalog::USERS_READ) {
        return resp;
    }
    let docs = match services.store.query(&Query::collection(collections::USERS)) {
        Ok(d) => d,
        Err(e) => return errors::store_error_to_response(e),
    };
    let mut items = Vec::with_capacity(docs.len());
    for doc in &docs {
        match doc.to_typed::<User>() {
            Ok(user) => items.push(user_to_json(&user)),
            Err(e) => return errors::store_error_to_response(e),
        }
    }
    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&principal, catalog::USERS_READ) {
        return resp;
    }
    let id: UserId = match parse_id(&id, "invalid user id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let doc = match services.store.get(collections::USERS, &id.to_string()) {
        Ok(d) => d,
        Err(e) => return errors::store_error_to_response(e),
    };
    match doc.to_typed::<User>() {
        Ok(user) => (StatusCode::OK, Json(user_to_json(&user))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&principal, catalog::USERS_MANAGE) {
        return resp;
    }
    let id: UserId = match parse_id(&id, "invalid user id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.store.delete(collections::USERS, &id.to_string()) {
        Ok(()) => {
            services.audit.record(
                AuditEntry::new(AuditLevel::Warn, "users", format!("deleted user {id}"))
                    .user_email(principal.email()),
            );
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}
