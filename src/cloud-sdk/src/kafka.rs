use std::time::Duration;

use crate::batch::{BatchOutcome, run_batch};
use crate::types::{AclFilter, AclRecord, DataList, TopicRecord};
use crate::{HttpTransport, SdkError};

/// Client for a cluster's REST admin API (v3)
#[derive(Debug, Clone)]
pub struct KafkaRestClient {
    transport: HttpTransport,
    cluster_id: String,
}

impl KafkaRestClient {
    /// `transport` must point at the cluster's REST endpoint and carry cluster credentials
    pub fn new(transport: HttpTransport, cluster_id: &str) -> Self {
        Self {
            transport,
            cluster_id: cluster_id.to_string(),
        }
    }

    fn topics_path(&self) -> String {
        format!("/kafka/v3/clusters/{}/topics", self.cluster_id)
    }

    fn acls_path(&self) -> String {
        format!("/kafka/v3/clusters/{}/acls", self.cluster_id)
    }

    /// List all topics of the cluster
    pub async fn list_topics(&self) -> Result<Vec<TopicRecord>, SdkError> {
        let list: DataList<TopicRecord> = self.transport.get(&self.topics_path()).await?;
        Ok(list.data)
    }

    /// List all ACL bindings of the cluster
    pub async fn list_acls(&self) -> Result<Vec<AclRecord>, SdkError> {
        let list: DataList<AclRecord> = self.transport.get(&self.acls_path()).await?;
        Ok(list.data)
    }

    /// Delete one topic
    pub async fn delete_topic(&self, topic: &str) -> Result<(), SdkError> {
        self.transport
            .delete(&format!("{}/{topic}", self.topics_path()))
            .await
    }

    /// Delete the bindings matching `filter`, returning those the cluster removed
    pub async fn delete_acl(&self, filter: &AclFilter) -> Result<Vec<AclRecord>, SdkError> {
        let list: DataList<AclRecord> = self
            .transport
            .delete_with_query(&self.acls_path(), filter)
            .await?;
        Ok(list.data)
    }

    /// Delete topics concurrently within `budget`
    pub async fn delete_topics(&self, topics: &[String], budget: Duration) -> BatchOutcome<String> {
        run_batch(topics, budget, |topic| async move {
            self.delete_topic(&topic).await.map(|_| true)
        })
        .await
    }

    /// Delete bindings concurrently within `budget`.
    ///
    /// A binding counts as removed only when the cluster returns it in the
    /// deleted set.
    pub async fn delete_acls(
        &self,
        filters: &[AclFilter],
        budget: Duration,
    ) -> BatchOutcome<AclFilter> {
        run_batch(filters, budget, |filter| async move {
            let removed = self.delete_acl(&filter).await?;
            Ok(removed.iter().any(|r| filter.matches(r)))
        })
        .await
    }
}
