use std::collections::HashMap;
use std::time::Duration;

use axum::extract::Query;
use axum::routing::{delete, get};
use axum::{Json, Router};
use cloud_sdk::types::AclRecord;
use cloud_sdk::{CloudClient, HttpTransport, KafkaRestClient};
use serde_json::{Value, json};
use sweeper::model::AclBinding;
use sweeper::{ClusterAdmin, IamAdmin, ScopedIam};

const CRN: &str = "crn://confluent.cloud/organization=o/environment=env-1/cloud-cluster=lkc-1";

async fn start_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let app = Router::new()
        .route("/kafka/v3/clusters/lkc-1/topics", get(list_topics))
        .route("/kafka/v3/clusters/lkc-1/acls", delete(delete_acls))
        .route("/iam/v2/role-bindings", get(list_role_bindings));

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    base_url
}

async fn list_topics() -> Json<Value> {
    Json(json!({
        "data": [
            {"topic_name": "orders", "is_internal": false},
            {"topic_name": "__consumer_offsets", "is_internal": true}
        ]
    }))
}

/// Removes everything except bindings on `kept`
async fn delete_acls(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    if params.get("resource_name").map(String::as_str) == Some("kept") {
        return Json(json!({"data": []}));
    }
    Json(json!({"data": [params]}))
}

async fn list_role_bindings(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    assert_eq!(params.get("crn_pattern").map(String::as_str), Some(CRN));
    Json(json!({
        "data": [{
            "id": "rb-7",
            "principal": params.get("principal").cloned().unwrap_or_default(),
            "role_name": "DeveloperRead",
            "crn_pattern": CRN
        }]
    }))
}

fn transport(base_url: &str) -> HttpTransport {
    HttpTransport::new(base_url, "key", "secret", Duration::from_secs(5)).unwrap()
}

fn binding(resource_type: &str, name: &str) -> AclBinding {
    AclBinding::try_from(AclRecord {
        resource_type: Some(resource_type.into()),
        resource_name: Some(name.into()),
        pattern_type: Some("LITERAL".into()),
        principal: Some("User:sa-1".into()),
        host: Some("*".into()),
        operation: Some("READ".into()),
        permission: Some("ALLOW".into()),
    })
    .unwrap()
}

#[tokio::test]
async fn test_topic_names_include_internal_topics() {
    let base_url = start_server().await;
    let admin = KafkaRestClient::new(transport(&base_url), "lkc-1");

    let topics = ClusterAdmin::list_topics(&admin).await.unwrap();
    assert_eq!(topics, vec!["orders", "__consumer_offsets"]);
}

#[tokio::test]
async fn test_acl_outcomes_map_back_to_bindings() {
    let base_url = start_server().await;
    let admin = KafkaRestClient::new(transport(&base_url), "lkc-1");
    let bindings = vec![
        binding("TOPIC", "gone"),
        binding("TOPIC", "kept"),
        binding("CLUSTER", "kafka-cluster"),
    ];

    let outcome = ClusterAdmin::delete_acls(&admin, &bindings, Duration::from_secs(5))
        .await
        .unwrap();

    let mut confirmed: Vec<_> = outcome
        .confirmed()
        .map(|b| b.resource_name.as_str())
        .collect();
    confirmed.sort();
    assert_eq!(confirmed, vec!["gone", "kafka-cluster"]);
    assert_eq!(outcome.completed.len(), 3);
    assert!(outcome.abandoned.is_empty());
}

#[tokio::test]
async fn test_role_bindings_are_scoped_to_cluster_crn() {
    let base_url = start_server().await;
    let iam = ScopedIam::new(CloudClient::new(transport(&base_url), "env-1", "lkc-1"), CRN);

    let bindings = iam.list_role_bindings("sa-1").await.unwrap();
    assert_eq!(bindings.len(), 1);
    assert_eq!(bindings[0].id, "rb-7");
    assert_eq!(bindings[0].role, "DeveloperRead");
    assert_eq!(bindings[0].principal, "User:sa-1");
}
