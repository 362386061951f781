use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use kegtrail_auth::{JwtClaims, Role};
use kegtrail_core::UserId;
use reqwest::StatusCode;
use serde_json::json;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(jwt_secret: &str) -> Self {
        // Same router as prod, bound to an ephemeral port.
        let app = kegtrail_api::app::build_app(jwt_secret.to_string());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(jwt_secret: &str, role: Role) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: UserId::new(),
        email: format!("{}@example.com", role.as_str()),
        role,
        issued_at: now,
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

async fn create_customer(client: &reqwest::Client, base_url: &str, token: &str) -> String {
    let res = client
        .post(format!("{}/customers", base_url))
        .bearer_auth(token)
        .json(&json!({
            "name": "Bar Uno",
            "address": "Calle 1",
            "contact": "Ana",
            "phone": "123456789",
            "kind": "BAR",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    body["id"].as_str().unwrap().to_string()
}

async fn create_keg(client: &reqwest::Client, base_url: &str, token: &str) -> String {
    let res = client
        .post(format!("{}/assets", base_url))
        .bearer_auth(token)
        .json(&json!({ "kind": "BARRIL", "format": "50L" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    body["items"][0]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;

    let client = reqwest::Client::new();
    let res = client
        .get(format!("{}/whoami", srv.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn whoami_reflects_token_claims() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let token = mint_jwt(jwt_secret, Role::Admin);

    let client = reqwest::Client::new();
    let res = client
        .get(format!("{}/whoami", srv.base_url))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["role"], "admin");
    assert_eq!(body["email"], "admin@example.com");
}

#[tokio::test]
async fn delivery_lifecycle_create_record_report() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let token = mint_jwt(jwt_secret, Role::Admin);
    let client = reqwest::Client::new();

    let customer_id = create_customer(&client, &srv.base_url, &token).await;
    let asset_id = create_keg(&client, &srv.base_url, &token).await;

    // Legacy wire name is accepted but never re-emitted.
    let res = client
        .post(format!("{}/movements", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "asset_id": asset_id,
            "kind": "SALIDA_LLENO",
            "customer_id": customer_id,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let movement: serde_json::Value = res.json().await.unwrap();
    assert_eq!(movement["kind"], "SALIDA_A_REPARTO");
    assert_eq!(movement["asset_code"], "KEG-001");
    assert_eq!(movement["customer_name"], "Bar Uno");

    // Asset reflects the delivery.
    let res = client
        .get(format!("{}/assets/{}", srv.base_url, asset_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let asset: serde_json::Value = res.json().await.unwrap();
    assert_eq!(asset["status"]["location"], "EN_CLIENTE");
    assert_eq!(asset["holder_name"], "Bar Uno");

    // The holdings report attributes the keg to the customer.
    let res = client
        .get(format!("{}/reports/holdings", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let report: serde_json::Value = res.json().await.unwrap();
    assert_eq!(report["grand_total"], 1);
    assert_eq!(report["customers"][0]["customer_name"], "Bar Uno");
    assert_eq!(report["customers"][0]["by_format"]["50L"], 1);
}

#[tokio::test]
async fn viewer_is_read_only_and_operator_cannot_delete() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let admin = mint_jwt(jwt_secret, Role::Admin);
    let operator = mint_jwt(jwt_secret, Role::Operator);
    let viewer = mint_jwt(jwt_secret, Role::Viewer);
    let client = reqwest::Client::new();

    // Viewer cannot create assets.
    let res = client
        .post(format!("{}/assets", srv.base_url))
        .bearer_auth(&viewer)
        .json(&json!({ "kind": "BARRIL", "format": "50L" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Operator records, but cannot delete the movement.
    let customer_id = create_customer(&client, &srv.base_url, &admin).await;
    let asset_id = create_keg(&client, &srv.base_url, &admin).await;
    let res = client
        .post(format!("{}/movements", srv.base_url))
        .bearer_auth(&operator)
        .json(&json!({
            "asset_id": asset_id,
            "kind": "ENTREGA_A_CLIENTE",
            "customer_id": customer_id,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let movement: serde_json::Value = res.json().await.unwrap();
    let movement_id = movement["id"].as_str().unwrap();

    let res = client
        .delete(format!("{}/movements/{}", srv.base_url, movement_id))
        .bearer_auth(&operator)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .delete(format!("{}/movements/{}", srv.base_url, movement_id))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn domain_failures_map_to_http_statuses() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let token = mint_jwt(jwt_secret, Role::Admin);
    let client = reqwest::Client::new();

    // Phone with too few digits -> 400 validation error.
    let res = client
        .post(format!("{}/customers", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "name": "Bar Dos",
            "address": "Calle 2",
            "contact": "Luis",
            "phone": "12345",
            "kind": "BAR",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    // Variety on a CO2 movement -> 422 invalid transition.
    let customer_id = create_customer(&client, &srv.base_url, &token).await;
    let res = client
        .post(format!("{}/assets", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "kind": "CO2", "format": "6kg" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: serde_json::Value = res.json().await.unwrap();
    let co2_id = created["items"][0]["id"].as_str().unwrap();

    let res = client
        .post(format!("{}/movements", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "asset_id": co2_id,
            "kind": "LLENADO_EN_PLANTA",
            "customer_id": customer_id,
            "variety": "IPA",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_transition");

    // Unknown movement id -> 404.
    let res = client
        .get(format!(
            "{}/movements/{}",
            srv.base_url,
            uuid::Uuid::now_v7()
        ))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
