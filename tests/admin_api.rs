//! End-to-end tests for the access admin API over real HTTP.

use reqwest::StatusCode;
use serde_json::{json, Value};

use access_admin::AdminConfig;

mod common;

async fn search(client: &reqwest::Client, server: &common::TestServer, query: &str) -> Vec<Value> {
    client
        .get(server.url(&format!("/api/accesses/search{}", query)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_access_list_lifecycle() {
    let server = common::start_server(AdminConfig::default()).await;
    let client = reqwest::Client::new();

    // Deny two consumers on two services.
    let res = client
        .post(server.url("/api/accesses/create"))
        .json(&json!({
            "services": ["org.example.DemoService", "org.example.OrderService"],
            "addresses": "10.0.0.1\n10.0.0.2",
            "allowed": false
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Allow a third consumer on one of them.
    let res = client
        .post(server.url("/api/accesses/create"))
        .json(&json!({
            "services": ["org.example.DemoService"],
            "addresses": "dubbo://10.0.0.3:20880/org.example.DemoService",
            "allowed": true
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let all = search(&client, &server, "").await;
    assert_eq!(all.len(), 5);
    let ids: Vec<u64> = all.iter().map(|e| e["id"].as_u64().unwrap()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);

    let demo = search(&client, &server, "?service=org.example.DemoService").await;
    assert_eq!(
        demo,
        vec![
            json!({"id": 1, "service": "org.example.DemoService", "address": "10.0.0.1", "allowed": false}),
            json!({"id": 2, "service": "org.example.DemoService", "address": "10.0.0.2", "allowed": false}),
            json!({"id": 3, "service": "org.example.DemoService", "address": "10.0.0.3", "allowed": true}),
        ]
    );

    // Search results can be fed straight back to delete.
    let res = client
        .post(server.url("/api/accesses/delete"))
        .json(&demo)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let remaining = search(&client, &server, "").await;
    assert_eq!(remaining.len(), 2);
    assert!(remaining.iter().all(|e| e["service"] == "org.example.OrderService"));

    let by_address = search(&client, &server, "?address=10.0.0.2").await;
    assert_eq!(by_address.len(), 2);

    server.stop().await;
}

#[tokio::test]
async fn test_validation_errors_are_reported() {
    let server = common::start_server(AdminConfig::default()).await;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/api/accesses/create"))
        .json(&json!({ "services": [], "addresses": "10.0.0.1", "allowed": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "services is required");

    assert!(search(&client, &server, "").await.is_empty());
    server.stop().await;
}

#[tokio::test]
async fn test_routes_survive_restart() {
    let path = common::scratch_file("access_admin_restart");
    let mut config = AdminConfig::default();
    config.store.path = Some(path.to_string_lossy().into_owned());
    config.catalog.services = vec!["org.example.DemoService".into()];

    let server = common::start_server(config.clone()).await;
    let client = reqwest::Client::new();
    let res = client
        .post(server.url("/api/accesses/create"))
        .json(&json!({
            "services": ["org.example.DemoService"],
            "addresses": "10.0.0.7",
            "allowed": true
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    server.stop().await;

    let server = common::start_server(config).await;
    let entries = search(&client, &server, "?service=org.example.DemoService").await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["address"], "10.0.0.7");
    assert_eq!(entries[0]["allowed"], true);

    let services: Vec<String> = client
        .get(server.url("/api/accesses/services"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(services, vec!["org.example.DemoService"]);

    server.stop().await;
    std::fs::remove_file(&path).unwrap_or_default();
}
