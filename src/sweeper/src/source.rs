//! Seams between the sweep passes and the platform APIs.
//!
//! Each trait is implemented for the matching `cloud_sdk` client; tests substitute
//! in-memory fakes.

use std::time::Duration;

use async_trait::async_trait;
use cloud_sdk::types::{AclFilter, AclRecord, ApiKeyRecord};
use cloud_sdk::{BatchOutcome, CloudClient, ItemOutcome, KafkaRestClient, MetricsClient, SdkError};

use crate::model::{AclBinding, ConnectionActivity, RoleBinding, TopicActivity};

/// Cluster-scoped inventory and the batch admin capability
#[async_trait]
pub trait ClusterAdmin: Send + Sync {
    async fn list_topics(&self) -> Result<Vec<String>, SdkError>;

    async fn list_acls(&self) -> Result<Vec<AclRecord>, SdkError>;

    /// Delete topics within `budget`; may complete only part of the batch
    async fn delete_topics(
        &self,
        topics: &[String],
        budget: Duration,
    ) -> Result<BatchOutcome<String>, SdkError>;

    /// Delete bindings, each submitted as its exact fetched tuple, within `budget`
    async fn delete_acls(
        &self,
        bindings: &[AclBinding],
        budget: Duration,
    ) -> Result<BatchOutcome<AclBinding>, SdkError>;
}

/// Credential and role-binding inventory with single-item deletion
#[async_trait]
pub trait IamAdmin: Send + Sync {
    async fn list_api_keys(&self) -> Result<Vec<ApiKeyRecord>, SdkError>;

    async fn list_role_bindings(&self, principal: &str) -> Result<Vec<RoleBinding>, SdkError>;

    async fn delete_api_key(&self, id: &str) -> Result<(), SdkError>;

    async fn delete_role_binding(&self, id: &str) -> Result<(), SdkError>;
}

/// Usage telemetry over the trailing activity window
#[async_trait]
pub trait ActivitySource: Send + Sync {
    async fn topic_activity(&self) -> Result<TopicActivity, SdkError>;

    async fn connection_activity(&self) -> Result<ConnectionActivity, SdkError>;
}

#[async_trait]
impl ClusterAdmin for KafkaRestClient {
    async fn list_topics(&self) -> Result<Vec<String>, SdkError> {
        let topics = KafkaRestClient::list_topics(self).await?;
        Ok(topics.into_iter().map(|t| t.topic_name).collect())
    }

    async fn list_acls(&self) -> Result<Vec<AclRecord>, SdkError> {
        KafkaRestClient::list_acls(self).await
    }

    async fn delete_topics(
        &self,
        topics: &[String],
        budget: Duration,
    ) -> Result<BatchOutcome<String>, SdkError> {
        Ok(KafkaRestClient::delete_topics(self, topics, budget).await)
    }

    async fn delete_acls(
        &self,
        bindings: &[AclBinding],
        budget: Duration,
    ) -> Result<BatchOutcome<AclBinding>, SdkError> {
        let filters: Vec<AclFilter> = bindings.iter().map(AclBinding::to_filter).collect();
        let outcome = KafkaRestClient::delete_acls(self, &filters, budget).await;

        // Filters were built one-to-one from the bindings
        let binding_for = |filter: &AclFilter| {
            filters
                .iter()
                .position(|f| f == filter)
                .map(|idx| bindings[idx].clone())
        };

        Ok(BatchOutcome {
            completed: outcome
                .completed
                .into_iter()
                .filter_map(|o| {
                    binding_for(&o.item).map(|item| ItemOutcome {
                        item,
                        result: o.result,
                    })
                })
                .collect(),
            abandoned: outcome.abandoned.iter().filter_map(binding_for).collect(),
        })
    }
}

/// Control-plane client scoped to one cluster's role-binding CRN pattern
#[derive(Debug, Clone)]
pub struct ScopedIam {
    client: CloudClient,
    crn_pattern: String,
}

impl ScopedIam {
    pub fn new(client: CloudClient, crn_pattern: &str) -> Self {
        Self {
            client,
            crn_pattern: crn_pattern.to_string(),
        }
    }
}

#[async_trait]
impl IamAdmin for ScopedIam {
    async fn list_api_keys(&self) -> Result<Vec<ApiKeyRecord>, SdkError> {
        self.client.list_cluster_api_keys().await
    }

    async fn list_role_bindings(&self, principal: &str) -> Result<Vec<RoleBinding>, SdkError> {
        let bindings = self
            .client
            .list_role_bindings(principal, &self.crn_pattern)
            .await?;
        Ok(bindings.into_iter().map(RoleBinding::from).collect())
    }

    async fn delete_api_key(&self, id: &str) -> Result<(), SdkError> {
        self.client.delete_api_key(id).await
    }

    async fn delete_role_binding(&self, id: &str) -> Result<(), SdkError> {
        self.client.delete_role_binding(id).await
    }
}

#[async_trait]
impl ActivitySource for MetricsClient {
    async fn topic_activity(&self) -> Result<TopicActivity, SdkError> {
        Ok(self.active_topics().await?.into_iter().collect())
    }

    async fn connection_activity(&self) -> Result<ConnectionActivity, SdkError> {
        Ok(self.connections_by_principal().await?.into_iter().collect())
    }
}
