//! Typed records for every endpoint shape the clients consume.
//!
//! Records are decoded once at the transport boundary. Fields the service may omit
//! are optional so that incomplete records can be reported and skipped by callers
//! instead of failing the whole page.

use serde::{Deserialize, Serialize};

/// Pagination block of a list response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListMetadata {
    /// Absolute URL of the next page, if any
    #[serde(default)]
    pub next: Option<String>,
}

/// Envelope shared by the control-plane and cluster REST list endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct DataList<T> {
    #[serde(default)]
    pub metadata: ListMetadata,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

// ── Control plane ──────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ClusterRecord {
    pub spec: ClusterSpec,
    pub metadata: ClusterMetadata,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClusterSpec {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub kafka_bootstrap_endpoint: Option<String>,
    #[serde(default)]
    pub http_endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClusterMetadata {
    pub resource_name: String,
}

/// Reference to another control-plane object
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectReference {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeyRecord {
    pub id: String,
    #[serde(default)]
    pub spec: Option<ApiKeySpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeySpec {
    #[serde(default)]
    pub owner: Option<ObjectReference>,
    #[serde(default)]
    pub resource: Option<ObjectReference>,
}

impl ApiKeyRecord {
    /// Id of the principal owning this key
    pub fn owner_id(&self) -> Option<&str> {
        self.spec
            .as_ref()
            .and_then(|s| s.owner.as_ref())
            .map(|o| o.id.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleBindingRecord {
    pub id: String,
    pub principal: String,
    pub role_name: String,
    pub crn_pattern: String,
}

// ── Cluster REST (v3) ──────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct TopicRecord {
    pub topic_name: String,
}

/// An access-control binding exactly as the cluster REST API represents it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclRecord {
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub resource_name: Option<String>,
    #[serde(default)]
    pub pattern_type: Option<String>,
    #[serde(default)]
    pub principal: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub operation: Option<String>,
    #[serde(default)]
    pub permission: Option<String>,
}

/// Full tuple identifying a single binding for deletion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AclFilter {
    pub resource_type: String,
    pub resource_name: String,
    pub pattern_type: String,
    pub principal: String,
    pub host: String,
    pub operation: String,
    pub permission: String,
}

impl AclFilter {
    /// Whether a record returned by the delete endpoint is this exact binding
    pub fn matches(&self, record: &AclRecord) -> bool {
        record.resource_type.as_deref() == Some(self.resource_type.as_str())
            && record.resource_name.as_deref() == Some(self.resource_name.as_str())
            && record.pattern_type.as_deref() == Some(self.pattern_type.as_str())
            && record.principal.as_deref() == Some(self.principal.as_str())
            && record.host.as_deref() == Some(self.host.as_str())
            && record.operation.as_deref() == Some(self.operation.as_str())
            && record.permission.as_deref() == Some(self.permission.as_str())
    }
}

// ── Telemetry ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct MetricAggregation {
    pub metric: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricFilter {
    pub field: String,
    pub op: String,
    pub value: String,
}

/// Body of a grouped metrics query
#[derive(Debug, Clone, Serialize)]
pub struct MetricsQuery {
    pub aggregations: Vec<MetricAggregation>,
    pub filter: MetricFilter,
    pub granularity: String,
    pub group_by: Vec<String>,
    pub intervals: Vec<String>,
    pub limit: u32,
}

/// One grouped aggregate. Only the label the query grouped by is populated.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricPoint {
    pub value: f64,
    #[serde(default, rename = "metric.topic")]
    pub topic: Option<String>,
    #[serde(default, rename = "metric.principal_id")]
    pub principal_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsPagination {
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsMeta {
    #[serde(default)]
    pub pagination: MetricsPagination,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsResponse {
    #[serde(default = "Vec::new")]
    pub data: Vec<MetricPoint>,
    #[serde(default)]
    pub meta: MetricsMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_api_key_page() {
        let body = r#"{
            "api_version": "iam/v2",
            "kind": "ApiKeyList",
            "metadata": {"next": "https://api.confluent.cloud/iam/v2/api-keys?page_token=p2"},
            "data": [
                {"id": "KEY1", "spec": {"owner": {"id": "sa-123", "kind": "ServiceAccount"}, "resource": {"id": "lkc-1"}}},
                {"id": "KEY2"}
            ]
        }"#;

        let page: DataList<ApiKeyRecord> = serde_json::from_str(body).unwrap();
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.data[0].owner_id(), Some("sa-123"));
        assert_eq!(page.data[1].owner_id(), None);
        assert!(page.metadata.next.unwrap().ends_with("page_token=p2"));
    }

    #[test]
    fn test_decode_partial_acl() {
        let body = r#"{"data": [{"resource_type": "TOPIC", "resource_name": "orders", "pattern_type": "LITERAL"}]}"#;

        let page: DataList<AclRecord> = serde_json::from_str(body).unwrap();
        assert_eq!(page.data[0].principal, None);
        assert!(page.metadata.next.is_none());
    }

    #[test]
    fn test_decode_metric_points() {
        let body = r#"{
            "data": [
                {"timestamp": "2024-03-01T00:00:00Z", "value": 12.0, "metric.topic": "orders"},
                {"timestamp": "2024-03-01T00:00:00Z", "value": 3.0, "metric.principal_id": "sa-1"}
            ],
            "meta": {"pagination": {"page_size": 1000, "next_page_token": "tok"}}
        }"#;

        let response: MetricsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.data[0].topic.as_deref(), Some("orders"));
        assert_eq!(response.data[1].principal_id.as_deref(), Some("sa-1"));
        assert_eq!(response.meta.pagination.next_page_token.as_deref(), Some("tok"));
    }

    #[test]
    fn test_filter_matches_exact_tuple_only() {
        let filter = AclFilter {
            resource_type: "TOPIC".into(),
            resource_name: "orders".into(),
            pattern_type: "LITERAL".into(),
            principal: "User:sa-1".into(),
            host: "*".into(),
            operation: "READ".into(),
            permission: "ALLOW".into(),
        };
        let mut record = AclRecord {
            resource_type: Some("TOPIC".into()),
            resource_name: Some("orders".into()),
            pattern_type: Some("LITERAL".into()),
            principal: Some("User:sa-1".into()),
            host: Some("*".into()),
            operation: Some("READ".into()),
            permission: Some("ALLOW".into()),
        };
        assert!(filter.matches(&record));

        record.operation = Some("WRITE".into());
        assert!(!filter.matches(&record));
    }
}
