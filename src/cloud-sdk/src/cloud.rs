use std::collections::HashSet;

use serde::de::DeserializeOwned;

use crate::types::{ApiKeyRecord, ClusterRecord, DataList, RoleBindingRecord};
use crate::{HttpTransport, SdkError};

/// Connection details of a cluster as reported by the control plane
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterDescription {
    pub cluster_id: String,
    pub display_name: Option<String>,
    pub bootstrap_endpoint: Option<String>,
    /// Base URL of the cluster REST API
    pub rest_endpoint: String,
    /// CRN prefix scoping role bindings to this cluster
    pub crn_pattern: String,
}

/// Client for the control-plane API (clusters, API keys, role bindings)
#[derive(Debug, Clone)]
pub struct CloudClient {
    transport: HttpTransport,
    environment: String,
    cluster_id: String,
}

impl CloudClient {
    pub fn new(transport: HttpTransport, environment: &str, cluster_id: &str) -> Self {
        Self {
            transport,
            environment: environment.to_string(),
            cluster_id: cluster_id.to_string(),
        }
    }

    // ── Cluster ────────────────────────────────────────────────────

    /// Describe the cluster to discover its REST endpoint and CRN pattern
    pub async fn describe_cluster(&self) -> Result<ClusterDescription, SdkError> {
        let record: ClusterRecord = self
            .transport
            .get_with_query(
                &format!("/cmk/v2/clusters/{}", self.cluster_id),
                &[("environment", self.environment.as_str())],
            )
            .await?;

        let rest_endpoint = record.spec.http_endpoint.ok_or_else(|| {
            SdkError::InvalidResponse(format!(
                "cluster {} has no http_endpoint",
                self.cluster_id
            ))
        })?;

        Ok(ClusterDescription {
            cluster_id: self.cluster_id.clone(),
            display_name: record.spec.display_name,
            bootstrap_endpoint: record.spec.kafka_bootstrap_endpoint,
            rest_endpoint,
            crn_pattern: crn_pattern(&record.metadata.resource_name),
        })
    }

    // ── API keys ───────────────────────────────────────────────────

    /// List every API key scoped to the cluster
    pub async fn list_cluster_api_keys(&self) -> Result<Vec<ApiKeyRecord>, SdkError> {
        let first: DataList<ApiKeyRecord> = self
            .transport
            .get_with_query(
                "/iam/v2/api-keys",
                &[("spec.resource", self.cluster_id.as_str())],
            )
            .await?;
        self.collect_pages(first).await
    }

    /// Delete an API key by id
    pub async fn delete_api_key(&self, id: &str) -> Result<(), SdkError> {
        self.transport
            .delete(&format!("/iam/v2/api-keys/{id}"))
            .await
    }

    // ── Role bindings ──────────────────────────────────────────────

    /// List the role bindings granted to a principal within a CRN pattern
    pub async fn list_role_bindings(
        &self,
        principal: &str,
        crn_pattern: &str,
    ) -> Result<Vec<RoleBindingRecord>, SdkError> {
        let principal = format!("User:{principal}");
        let first: DataList<RoleBindingRecord> = self
            .transport
            .get_with_query(
                "/iam/v2/role-bindings",
                &[
                    ("principal", principal.as_str()),
                    ("crn_pattern", crn_pattern),
                ],
            )
            .await?;
        self.collect_pages(first).await
    }

    /// Delete a role binding by id
    pub async fn delete_role_binding(&self, id: &str) -> Result<(), SdkError> {
        self.transport
            .delete(&format!("/iam/v2/role-bindings/{id}"))
            .await
    }

    async fn collect_pages<T: DeserializeOwned>(
        &self,
        first: DataList<T>,
    ) -> Result<Vec<T>, SdkError> {
        let mut items = first.data;
        let mut next = first.metadata.next;
        let mut visited = HashSet::new();

        while let Some(url) = next.filter(|u| !u.is_empty()) {
            if !visited.insert(url.clone()) {
                return Err(SdkError::InvalidResponse(format!(
                    "pagination returned {url} twice"
                )));
            }
            let page: DataList<T> = self.transport.get(&url).await?;
            items.extend(page.data);
            next = page.metadata.next;
        }

        Ok(items)
    }
}

/// The CRN of a cluster without its trailing `/kafka=` segment
pub fn crn_pattern(resource_name: &str) -> String {
    match resource_name.find("/kafka=") {
        Some(idx) => resource_name[..idx].to_string(),
        None => resource_name.to_string(),
    }
}
