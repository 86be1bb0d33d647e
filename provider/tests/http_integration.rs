// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! HTTP integration tests for the plugin host.
//!
//! These tests use `axum-test` to drive the full request/response cycle
//! through the router with all middleware applied. Lifecycle tests point the
//! provider at a small in-memory axum mock of Identity, PVWA and Secrets Hub.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use axum_test::TestServer;
use cyberark_provider::application::create_router;
use cyberark_provider::configuration::ServeOptions;
use cyberark_provider::constants::MAX_REQUEST_BODY_SIZE;
use cyberark_provider::provider::Provider;
use serde_json::{Value, json};
use tokio::net::TcpListener;

const TOKEN: &str = "tok-provider";

/// Creates a test server with default options and an unconfigured provider.
fn create_test_server() -> TestServer {
    let app = create_router(ServeOptions::default(), Arc::new(Provider::new()));
    TestServer::new(app).unwrap()
}

// =============================================================================
// In-memory CyberArk
// =============================================================================

#[derive(Default)]
struct Cloud {
    calls: Vec<String>,
    safes: BTreeMap<String, Value>,
    members: Vec<(String, Value)>,
    accounts: BTreeMap<String, Value>,
    stores: BTreeMap<String, Value>,
    policies: BTreeMap<String, Value>,
    next_id: u32,
}

impl Cloud {
    fn id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }
}

type Shared = State<Arc<Mutex<Cloud>>>;

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"))
}

fn reply(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

async fn platform_token(body: String) -> Response {
    if !body.contains("client_secret=good") {
        return (StatusCode::UNAUTHORIZED, "invalid_client").into_response();
    }
    reply(
        StatusCode::OK,
        json!({"access_token": TOKEN, "token_type": "Bearer", "expires_in": 900}),
    )
}

async fn create_safe(State(cloud): Shared, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let mut cloud = cloud.lock().unwrap();
    let name = body["safeName"].as_str().unwrap().to_string();
    cloud.calls.push(format!("POST /Safes/ {name}"));
    if cloud.safes.contains_key(&name) {
        return (StatusCode::CONFLICT, "SFWS0002").into_response();
    }
    let number = cloud.safes.len() + 1;
    let safe = json!({
        "safeUrlId": name,
        "safeName": name,
        "safeNumber": number,
        "description": body["description"],
        "managingCPM": body["managingCPM"],
        "numberOfDaysRetention": body["numberOfDaysRetention"],
    });
    cloud.safes.insert(name, safe.clone());
    reply(StatusCode::CREATED, safe)
}

async fn get_safe(State(cloud): Shared, Path(name): Path<String>) -> Response {
    match cloud.lock().unwrap().safes.get(&name) {
        Some(safe) => reply(StatusCode::OK, safe.clone()),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn update_safe(State(cloud): Shared, Path(name): Path<String>, Json(body): Json<Value>) -> Response {
    let mut cloud = cloud.lock().unwrap();
    cloud.calls.push(format!("PUT /Safes/{name}/"));
    let Some(safe) = cloud.safes.get_mut(&name) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    // fields missing from the body keep their value
    for field in ["description", "managingCPM", "numberOfDaysRetention"] {
        if let Some(value) = body.get(field) {
            safe[field] = value.clone();
        }
    }
    reply(StatusCode::OK, safe.clone())
}

async fn delete_safe(State(cloud): Shared, Path(name): Path<String>) -> Response {
    let mut cloud = cloud.lock().unwrap();
    cloud.calls.push(format!("DELETE /Safes/{name}/"));
    match cloud.safes.remove(&name) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn add_member(State(cloud): Shared, Path(name): Path<String>, Json(body): Json<Value>) -> Response {
    let mut cloud = cloud.lock().unwrap();
    cloud.calls.push(format!(
        "POST /Safes/{name}/Members/ {}",
        body["memberName"].as_str().unwrap()
    ));
    cloud.members.push((name, body.clone()));
    reply(StatusCode::CREATED, body)
}

async fn create_account(State(cloud): Shared, Json(body): Json<Value>) -> Response {
    let mut cloud = cloud.lock().unwrap();
    let id = cloud.id("acc");
    cloud.calls.push(format!("POST /Accounts/ {id}"));
    let mut account = body;
    account["id"] = json!(id);
    account.as_object_mut().unwrap().remove("secret");
    cloud.accounts.insert(id, account.clone());
    reply(StatusCode::CREATED, account)
}

async fn get_account(State(cloud): Shared, Path(id): Path<String>) -> Response {
    match cloud.lock().unwrap().accounts.get(&id) {
        Some(account) => reply(StatusCode::OK, account.clone()),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn delete_account(State(cloud): Shared, Path(id): Path<String>) -> Response {
    let mut cloud = cloud.lock().unwrap();
    cloud.calls.push(format!("DELETE /Accounts/{id}/"));
    match cloud.accounts.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn list_stores(State(cloud): Shared) -> Response {
    let stores: Vec<Value> = cloud.lock().unwrap().stores.values().cloned().collect();
    reply(StatusCode::OK, json!({"secretStores": stores}))
}

async fn create_store(State(cloud): Shared, Json(body): Json<Value>) -> Response {
    let mut cloud = cloud.lock().unwrap();
    let id = cloud.id("store");
    cloud.calls.push(format!("POST /secret-stores {id}"));
    let mut store = body;
    store["id"] = json!(id);
    store["behaviors"] = json!(["SECRETS_TARGET"]);
    if let Some(data) = store["data"].as_object_mut() {
        data.remove("appClientSecret");
    }
    cloud.stores.insert(id, store.clone());
    reply(StatusCode::CREATED, store)
}

async fn get_store(State(cloud): Shared, Path(id): Path<String>) -> Response {
    match cloud.lock().unwrap().stores.get(&id) {
        Some(store) => reply(StatusCode::OK, store.clone()),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn set_store_state(State(cloud): Shared, Path(id): Path<String>, Json(body): Json<Value>) -> Response {
    let mut cloud = cloud.lock().unwrap();
    let action = body["action"].as_str().unwrap().to_string();
    cloud.calls.push(format!("PUT /secret-stores/{id}/state {action}"));
    let Some(store) = cloud.stores.get_mut(&id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    store["state"] = json!({"current": if action == "enable" { "ENABLED" } else { "DISABLED" }});
    StatusCode::OK.into_response()
}

async fn delete_store(State(cloud): Shared, Path(id): Path<String>) -> Response {
    let mut cloud = cloud.lock().unwrap();
    cloud.calls.push(format!("DELETE /secret-stores/{id}"));
    match cloud.stores.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn scan_store(State(cloud): Shared, Path(id): Path<String>) -> Response {
    cloud.lock().unwrap().calls.push(format!("POST /scan {id}"));
    StatusCode::ACCEPTED.into_response()
}

async fn create_policy(State(cloud): Shared, Json(body): Json<Value>) -> Response {
    let mut cloud = cloud.lock().unwrap();
    let id = cloud.id("policy");
    cloud.calls.push(format!("POST /policies {id}"));
    let mut policy = body;
    policy["id"] = json!(id);
    policy["state"] = json!({"current": "ENABLED"});
    cloud.policies.insert(id, policy.clone());
    reply(StatusCode::CREATED, policy)
}

async fn get_policy(State(cloud): Shared, Path(id): Path<String>) -> Response {
    match cloud.lock().unwrap().policies.get(&id) {
        Some(policy) => reply(StatusCode::OK, policy.clone()),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn set_policy_state(State(cloud): Shared, Path(id): Path<String>, Json(body): Json<Value>) -> Response {
    let mut cloud = cloud.lock().unwrap();
    let action = body["action"].as_str().unwrap().to_string();
    cloud.calls.push(format!("PUT /policies/{id}/state {action}"));
    let Some(policy) = cloud.policies.get_mut(&id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    policy["state"] = json!({"current": if action == "enable" { "ENABLED" } else { "DISABLED" }});
    StatusCode::OK.into_response()
}

async fn delete_policy(State(cloud): Shared, Path(id): Path<String>) -> Response {
    let mut cloud = cloud.lock().unwrap();
    cloud.calls.push(format!("DELETE /policies/{id}"));
    match cloud.policies.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn spawn_cloud() -> (String, Arc<Mutex<Cloud>>) {
    let mut cloud = Cloud::default();
    cloud.stores.insert(
        "store-pam".to_string(),
        json!({
            "id": "store-pam",
            "type": "PAM_PCLOUD",
            "name": "PAM",
            "behaviors": ["SECRETS_SOURCE"],
            "state": {"current": "ENABLED"},
            "data": {}
        }),
    );
    let cloud = Arc::new(Mutex::new(cloud));

    let pvwa = "/PasswordVault/API";
    let app = Router::new()
        .route("/oauth2/platformtoken", post(platform_token))
        .route(&format!("{pvwa}/Safes/"), post(create_safe))
        .route(
            &format!("{pvwa}/Safes/{{name}}/"),
            get(get_safe).put(update_safe).delete(delete_safe),
        )
        .route(&format!("{pvwa}/Safes/{{name}}/Members/"), post(add_member))
        .route(&format!("{pvwa}/Accounts/"), post(create_account))
        .route(
            &format!("{pvwa}/Accounts/{{id}}/"),
            get(get_account).delete(delete_account),
        )
        .route("/api/secret-stores", get(list_stores).post(create_store))
        .route("/api/secret-stores/{id}", get(get_store).delete(delete_store))
        .route("/api/secret-stores/{id}/state", put(set_store_state))
        .route("/api/scan-definitions/secret-stores/{id}/scan", post(scan_store))
        .route("/api/policies", post(create_policy))
        .route("/api/policies/{id}", get(get_policy).delete(delete_policy))
        .route("/api/policies/{id}/state", put(set_policy_state))
        .with_state(cloud.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (address, cloud)
}

fn provider_config(address: &str, secret: &str) -> Value {
    json!({
        "config": {
            "tenant": "test",
            "domain": "test",
            "client_id": "svc@test",
            "client_secret": secret,
            "identity_url": address,
            "pvwa_url": format!("{address}/PasswordVault/API"),
            "secretshub_url": format!("{address}/api")
        }
    })
}

/// A test server already configured against a fresh in-memory CyberArk.
async fn configured_server() -> (TestServer, Arc<Mutex<Cloud>>) {
    let (address, cloud) = spawn_cloud().await;
    let server = create_test_server();
    let response = server
        .post("/configure")
        .json(&provider_config(&address, "good"))
        .await;
    response.assert_status_ok();
    response.assert_json(&json!({"diagnostics": []}));
    (server, cloud)
}

fn calls(cloud: &Arc<Mutex<Cloud>>) -> Vec<String> {
    cloud.lock().unwrap().calls.clone()
}

// =============================================================================
// Health and schema
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_returns_status_ok_body() {
    let server = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_json(&json!({"status": "ok"}));
}

#[tokio::test]
async fn test_schema_endpoint_lists_types() {
    let server = create_test_server();
    let response = server.get("/schema").await;
    response.assert_status_ok();

    let schema: Value = response.json();
    for name in [
        "cyberark_aws_account",
        "cyberark_azure_account",
        "cyberark_db_account",
        "cyberark_safe",
        "cyberark_aws_secret_store",
        "cyberark_azure_secret_store",
        "cyberark_gcp_secret_store",
        "cyberark_secret_store_scan",
        "cyberark_sync_policy",
    ] {
        assert!(schema["resources"].get(name).is_some(), "{name}");
    }
    assert_eq!(
        schema["resources"]["cyberark_aws_account"]["attributes"]["secret"]["sensitive"],
        true
    );
    assert!(schema["data_sources"].get("cyberark_pam_source_store").is_some());
    assert_eq!(
        schema["provider"]["attributes"]["client_secret"]["sensitive"],
        true
    );
}

// =============================================================================
// Errors
// =============================================================================

#[tokio::test]
async fn test_unknown_resource_returns_400_diagnostics() {
    let server = create_test_server();
    let response = server
        .post("/resources/cyberark_user/create")
        .json(&json!({"planned_state": {}}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["diagnostics"][0]["severity"], "error");
    assert_eq!(body["diagnostics"][0]["summary"], "Unknown resource type");
}

#[tokio::test]
async fn test_lifecycle_before_configure_returns_412() {
    let server = create_test_server();
    let response = server
        .post("/resources/cyberark_safe/read")
        .json(&json!({"current_state": {"safe_name": "TF_SAFE"}}))
        .await;
    response.assert_status(StatusCode::PRECONDITION_FAILED);

    let response = server
        .post("/data-sources/cyberark_pam_source_store/read")
        .json(&json!({"config": {}}))
        .await;
    response.assert_status(StatusCode::PRECONDITION_FAILED);
}

#[tokio::test]
async fn test_configure_with_invalid_config_returns_400() {
    let server = create_test_server();
    let response = server
        .post("/configure")
        .json(&json!({"config": {"tenant": "not a tenant", "domain": "x", "client_id": "a", "client_secret": "b"}}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_configure_with_bad_credentials_returns_401() {
    let (address, _) = spawn_cloud().await;
    let server = create_test_server();
    let response = server
        .post("/configure")
        .json(&provider_config(&address, "wrong"))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    // still unconfigured
    let response = server
        .post("/data-sources/cyberark_pam_source_store/read")
        .json(&json!({"config": {}}))
        .await;
    response.assert_status(StatusCode::PRECONDITION_FAILED);
}

#[tokio::test]
async fn test_oversized_body_returns_413() {
    let server = create_test_server();
    let body = Bytes::from(vec![b' '; MAX_REQUEST_BODY_SIZE + 1]);
    let response = server
        .post("/configure")
        .bytes(body)
        .content_type("application/json")
        .await;
    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let server = create_test_server();
    let response = server
        .post("/resources/cyberark_safe/plan")
        .bytes(Bytes::from_static(b"{not json"))
        .content_type("application/json")
        .await;
    assert!(response.status_code().is_client_error());
}

// =============================================================================
// Plan
// =============================================================================

#[tokio::test]
async fn test_plan_without_configuration() {
    let server = create_test_server();
    let response = server
        .post("/resources/cyberark_sync_policy/plan")
        .json(&json!({
            "prior_state": {
                "id": "policy-1", "name": "sync", "source_id": "store-pam",
                "target_id": "store-1", "safe_name": "TF_SAFE",
                "transformation": "password_only_plain_text", "state": "ENABLED"
            },
            "proposed_state": {
                "name": "sync", "target_id": "store-2", "safe_name": "TF_SAFE",
                "state": "DISABLED"
            }
        }))
        .await;
    response.assert_status_ok();

    let plan: Value = response.json();
    assert_eq!(plan["requires_replace"], json!(["target_id"]));
    assert_eq!(plan["planned_state"]["id"], Value::Null);
    assert_eq!(plan["planned_state"]["source_id"], "store-pam");
    assert_eq!(plan["planned_state"]["transformation"], "password_only_plain_text");
}

#[tokio::test]
async fn test_plan_rejects_unknown_attribute() {
    let server = create_test_server();
    let response = server
        .post("/resources/cyberark_safe/plan")
        .json(&json!({"proposed_state": {"safe_name": "TF_SAFE", "colour": "blue"}}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

// =============================================================================
// Lifecycle against the in-memory CyberArk
// =============================================================================

#[tokio::test]
async fn test_safe_lifecycle() {
    let (server, cloud) = configured_server().await;

    let response = server
        .post("/resources/cyberark_safe/create")
        .json(&json!({"planned_state": {
            "safe_name": "TF_SAFE",
            "description": "managed",
            "member": "alice",
            "permission_level": "full",
            "enable_secrets_hub": true
        }}))
        .await;
    response.assert_status_ok();
    let state = response.json::<Value>()["new_state"].clone();
    assert_eq!(state["id"], "TF_SAFE");
    assert_eq!(state["safe_number"], 1);
    assert_eq!(state["retention"], 7);

    {
        let cloud = cloud.lock().unwrap();
        assert_eq!(cloud.members.len(), 2);
        assert_eq!(cloud.members[0].1["memberName"], "alice");
        assert_eq!(cloud.members[0].1["permissions"]["manageSafe"], true);
        assert_eq!(cloud.members[1].1["memberName"], "SecretsHub");
        assert_eq!(cloud.members[1].1["permissions"]["manageSafe"], false);
    }

    let mut planned = state.clone();
    planned["retention"] = json!(30);
    let response = server
        .post("/resources/cyberark_safe/update")
        .json(&json!({"prior_state": state, "planned_state": planned}))
        .await;
    response.assert_status_ok();
    let updated = response.json::<Value>()["new_state"].clone();
    assert_eq!(updated["retention"], 30);
    assert_eq!(updated["description"], "managed");

    let mut cleared = updated.clone();
    cleared["description"] = Value::Null;
    let response = server
        .post("/resources/cyberark_safe/update")
        .json(&json!({"prior_state": updated, "planned_state": cleared}))
        .await;
    response.assert_status_ok();
    let updated = response.json::<Value>()["new_state"].clone();
    assert_eq!(updated["description"], Value::Null);
    assert_eq!(cloud.lock().unwrap().safes["TF_SAFE"]["description"], "");

    let response = server
        .post("/resources/cyberark_safe/delete")
        .json(&json!({"current_state": updated}))
        .await;
    response.assert_status_ok();

    let response = server
        .post("/resources/cyberark_safe/read")
        .json(&json!({"current_state": updated}))
        .await;
    response.assert_status_ok();
    response.assert_json(&json!({"new_state": null}));

    assert_eq!(
        calls(&cloud),
        vec![
            "POST /Safes/ TF_SAFE",
            "POST /Safes/TF_SAFE/Members/ alice",
            "POST /Safes/TF_SAFE/Members/ SecretsHub",
            "PUT /Safes/TF_SAFE/",
            "PUT /Safes/TF_SAFE/",
            "DELETE /Safes/TF_SAFE/",
        ]
    );
}

#[tokio::test]
async fn test_safe_create_conflict_adopts_existing() {
    let (server, cloud) = configured_server().await;
    cloud.lock().unwrap().safes.insert(
        "Existing".to_string(),
        json!({"safeUrlId": "Existing", "safeName": "Existing", "safeNumber": 9}),
    );

    let response = server
        .post("/resources/cyberark_safe/create")
        .json(&json!({"planned_state": {"safe_name": "Existing"}}))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["new_state"]["safe_number"], 9);
}

#[tokio::test]
async fn test_safe_import() {
    let (server, cloud) = configured_server().await;
    cloud.lock().unwrap().safes.insert(
        "Imported".to_string(),
        json!({"safeUrlId": "Imported", "safeName": "Imported", "safeNumber": 4, "numberOfDaysRetention": 14}),
    );

    let response = server
        .post("/resources/cyberark_safe/import")
        .json(&json!({"id": "Imported"}))
        .await;
    response.assert_status_ok();
    let state = response.json::<Value>()["state"].clone();
    assert_eq!(state["safe_name"], "Imported");
    assert_eq!(state["retention"], 14);
    assert_eq!(state["permission_level"], "read");

    let response = server
        .post("/resources/cyberark_safe/import")
        .json(&json!({"id": "Missing"}))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_account_lifecycle_and_unsupported_update() {
    let (server, cloud) = configured_server().await;

    let planned = json!({
        "name": "aws-admin",
        "address": "aws.amazon.com",
        "username": "AKIAEXAMPLE",
        "platform": "AWSAccessKeys",
        "safe": "TF_SAFE",
        "secret_type": "key",
        "secret": "wJalrXUtnFEMI",
        "aws_kid": "AKIAEXAMPLE",
        "aws_account_id": "123456789012"
    });
    let response = server
        .post("/resources/cyberark_aws_account/create")
        .json(&json!({"planned_state": planned}))
        .await;
    response.assert_status_ok();
    let state = response.json::<Value>()["new_state"].clone();
    let id = state["id"].as_str().unwrap().to_string();
    assert_eq!(state["secret"], "wJalrXUtnFEMI");

    {
        let cloud = cloud.lock().unwrap();
        let stored = &cloud.accounts[&id];
        assert_eq!(stored["platformAccountProperties"]["AWSAccountID"], "123456789012");
        assert_eq!(stored["secretManagement"]["automaticManagementEnabled"], false);
    }

    // refresh keeps the secret the API never returns
    let response = server
        .post("/resources/cyberark_aws_account/read")
        .json(&json!({"current_state": state}))
        .await;
    response.assert_status_ok();
    let refreshed = response.json::<Value>()["new_state"].clone();
    assert_eq!(refreshed["secret"], "wJalrXUtnFEMI");
    assert_eq!(refreshed["aws_kid"], "AKIAEXAMPLE");

    let mut renamed = state.clone();
    renamed["username"] = json!("AKIAOTHER");
    let response = server
        .post("/resources/cyberark_aws_account/update")
        .json(&json!({"prior_state": state, "planned_state": renamed}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["diagnostics"][0]["detail"],
        "cyberark_aws_account does not support update"
    );

    let response = server
        .post("/resources/cyberark_aws_account/delete")
        .json(&json!({"current_state": state}))
        .await;
    response.assert_status_ok();
    assert!(cloud.lock().unwrap().accounts.is_empty());
}

#[tokio::test]
async fn test_imported_account_records_secret() {
    let (server, cloud) = configured_server().await;
    let response = server
        .post("/resources/cyberark_aws_account/create")
        .json(&json!({"planned_state": {
            "name": "aws-admin",
            "address": "aws.amazon.com",
            "username": "AKIAEXAMPLE",
            "platform": "AWSAccessKeys",
            "safe": "TF_SAFE",
            "secret_type": "key",
            "secret": "wJalrXUtnFEMI",
            "aws_kid": "AKIAEXAMPLE",
            "aws_account_id": "123456789012"
        }}))
        .await;
    response.assert_status_ok();
    let id = response.json::<Value>()["new_state"]["id"].as_str().unwrap().to_string();

    let response = server
        .post("/resources/cyberark_aws_account/import")
        .json(&json!({"id": id}))
        .await;
    response.assert_status_ok();
    let imported = response.json::<Value>()["state"].clone();
    assert_eq!(imported["secret"], Value::Null);

    let mut proposed = imported.clone();
    proposed.as_object_mut().unwrap().remove("id");
    proposed["secret"] = json!("wJalrXUtnFEMI");
    let response = server
        .post("/resources/cyberark_aws_account/plan")
        .json(&json!({"prior_state": imported, "proposed_state": proposed}))
        .await;
    response.assert_status_ok();
    let plan: Value = response.json();
    assert_eq!(plan["requires_replace"], json!([]));
    let planned = plan["planned_state"].clone();
    assert_eq!(planned["id"], json!(id));

    let response = server
        .post("/resources/cyberark_aws_account/update")
        .json(&json!({"prior_state": imported, "planned_state": planned}))
        .await;
    response.assert_status_ok();
    let state = response.json::<Value>()["new_state"].clone();
    assert_eq!(state["id"], json!(id));
    assert_eq!(state["secret"], "wJalrXUtnFEMI");
    assert_eq!(calls(&cloud), vec![format!("POST /Accounts/ {id}")]);
}

#[tokio::test]
async fn test_secret_store_and_sync_policy() {
    let (server, cloud) = configured_server().await;

    let response = server
        .post("/resources/cyberark_aws_secret_store/create")
        .json(&json!({"planned_state": {
            "name": "aws-target",
            "aws_account_id": "123456789012",
            "aws_account_alias": "prod",
            "aws_account_region": "us-east-1",
            "aws_iam_role": "SecretsHubRole"
        }}))
        .await;
    response.assert_status_ok();
    let store = response.json::<Value>()["new_state"].clone();
    let store_id = store["id"].as_str().unwrap().to_string();
    assert_eq!(store["state"], "ENABLED");

    let response = server
        .post("/resources/cyberark_sync_policy/create")
        .json(&json!({"planned_state": {
            "name": "sync",
            "target_id": store_id,
            "safe_name": "TF_SAFE"
        }}))
        .await;
    response.assert_status_ok();
    let policy = response.json::<Value>()["new_state"].clone();
    let policy_id = policy["id"].as_str().unwrap().to_string();
    assert_eq!(policy["source_id"], "store-pam");
    assert_eq!(policy["transformation"], "password_only_plain_text");

    let mut disabled = store.clone();
    disabled["state"] = json!("DISABLED");
    let response = server
        .post("/resources/cyberark_aws_secret_store/update")
        .json(&json!({"prior_state": store, "planned_state": disabled}))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["new_state"]["state"], "DISABLED");

    let response = server
        .post("/resources/cyberark_aws_secret_store/read")
        .json(&json!({"current_state": disabled}))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["new_state"]["state"], "DISABLED");

    let response = server
        .post("/resources/cyberark_sync_policy/delete")
        .json(&json!({"current_state": policy}))
        .await;
    response.assert_status_ok();

    let response = server
        .post("/resources/cyberark_aws_secret_store/delete")
        .json(&json!({"current_state": disabled}))
        .await;
    response.assert_status_ok();

    assert_eq!(
        calls(&cloud),
        vec![
            format!("POST /secret-stores {store_id}"),
            format!("POST /policies {policy_id}"),
            format!("PUT /secret-stores/{store_id}/state disable"),
            format!("PUT /policies/{policy_id}/state disable"),
            format!("DELETE /policies/{policy_id}"),
            format!("DELETE /secret-stores/{store_id}"),
        ]
    );
}

#[tokio::test]
async fn test_scan_resource() {
    let (server, cloud) = configured_server().await;

    let response = server
        .post("/resources/cyberark_secret_store_scan/create")
        .json(&json!({"planned_state": {"secret_store_id": "store-pam"}}))
        .await;
    response.assert_status_ok();
    let state = response.json::<Value>()["new_state"].clone();
    assert!(state["id"].as_str().unwrap().starts_with("store-pam/"));
    assert_eq!(state["scan_result"], "");

    let response = server
        .post("/resources/cyberark_secret_store_scan/delete")
        .json(&json!({"current_state": state}))
        .await;
    response.assert_status_ok();

    let response = server
        .post("/resources/cyberark_secret_store_scan/import")
        .json(&json!({"id": "store-pam/1"}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    assert_eq!(calls(&cloud), vec!["POST /scan store-pam"]);
}

#[tokio::test]
async fn test_data_sources() {
    let (server, cloud) = configured_server().await;
    cloud.lock().unwrap().safes.insert(
        "TF_SAFE".to_string(),
        json!({"safeUrlId": "TF_SAFE", "safeName": "TF_SAFE", "safeNumber": 3, "numberOfDaysRetention": 7}),
    );

    let response = server
        .post("/data-sources/cyberark_pam_source_store/read")
        .json(&json!({"config": {}}))
        .await;
    response.assert_status_ok();
    let state = response.json::<Value>()["state"].clone();
    assert_eq!(state["id"], "store-pam");
    assert_eq!(state["type"], "PAM_PCLOUD");
    assert_eq!(state["state"], "ENABLED");

    let response = server
        .post("/data-sources/cyberark_safe/read")
        .json(&json!({"config": {"safe_name": "TF_SAFE"}}))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["state"]["safe_number"], 3);

    let response = server
        .post("/data-sources/cyberark_secret_store/read")
        .json(&json!({"config": {"name": "PAM", "behavior": "SECRETS_SOURCE"}}))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["state"]["id"], "store-pam");

    let response = server
        .post("/data-sources/cyberark_secret_store/read")
        .json(&json!({"config": {"name": "nope"}}))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_pam_source_store_returns_404() {
    let (server, cloud) = configured_server().await;
    cloud.lock().unwrap().stores.remove("store-pam");

    let response = server
        .post("/data-sources/cyberark_pam_source_store/read")
        .json(&json!({"config": {}}))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["diagnostics"][0]["summary"], "Not found");
}
