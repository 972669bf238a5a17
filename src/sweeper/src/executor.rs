use std::future::Future;
use std::time::Duration;

use cloud_sdk::{BatchOutcome, SdkError};
use tokio::time::Instant;

use crate::error::SweepError;
use crate::model::{AclBinding, ResourceKind};
use crate::reconcile::Reconciliation;
use crate::source::{ClusterAdmin, IamAdmin};

/// Extra time granted to the admin capability to hand back its partial result
/// after the batch budget elapses.
const GUARD_SLACK: Duration = Duration::from_secs(5);

/// A non-empty set of deletion targets drawn from the inactive side of a reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct DeletionBatch<T> {
    kind: ResourceKind,
    items: Vec<T>,
}

impl<T> DeletionBatch<T> {
    /// Collect the targets of every inactive item. `None` when there is nothing to delete.
    pub fn from_inactive<S, I, F>(reconciliation: &Reconciliation<S>, mut targets: F) -> Option<Self>
    where
        F: FnMut(&S) -> I,
        I: IntoIterator<Item = T>,
    {
        let items: Vec<T> = reconciliation.inactive().flat_map(|s| targets(s)).collect();
        if items.is_empty() {
            return None;
        }
        Some(Self {
            kind: reconciliation.kind(),
            items,
        })
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// What a batch deletion actually achieved
#[derive(Debug)]
pub struct BatchReport<T> {
    pub requested: usize,
    /// Confirmed as removed by the admin capability
    pub deleted: Vec<T>,
    /// Calls that returned an error
    pub failed: Vec<(T, SdkError)>,
    /// Calls that succeeded without confirming a removal
    pub unconfirmed: Vec<T>,
    /// Still in flight when the budget elapsed
    pub abandoned: Vec<T>,
}

impl<T> BatchReport<T> {
    /// An empty confirmed set is a distinct outcome, not an error
    pub fn nothing_deleted(&self) -> bool {
        self.deleted.is_empty()
    }

    fn from_outcome(requested: usize, outcome: BatchOutcome<T>) -> Self {
        let mut report = Self {
            requested,
            deleted: Vec::new(),
            failed: Vec::new(),
            unconfirmed: Vec::new(),
            abandoned: outcome.abandoned,
        };
        for item in outcome.completed {
            match item.result {
                Ok(true) => report.deleted.push(item.item),
                Ok(false) => report.unconfirmed.push(item.item),
                Err(e) => report.failed.push((item.item, e)),
            }
        }
        report
    }
}

/// Submits deletion batches with a bounded time budget
#[derive(Debug, Clone)]
pub struct BulkExecutor {
    budget: Duration,
}

impl BulkExecutor {
    pub fn new(budget: Duration) -> Self {
        Self { budget }
    }

    pub async fn delete_topics(
        &self,
        admin: &dyn ClusterAdmin,
        batch: DeletionBatch<String>,
    ) -> Result<BatchReport<String>, SweepError> {
        self.submit(batch.kind(), batch.len(), admin.delete_topics(batch.items(), self.budget))
            .await
    }

    pub async fn delete_acls(
        &self,
        admin: &dyn ClusterAdmin,
        batch: DeletionBatch<AclBinding>,
    ) -> Result<BatchReport<AclBinding>, SweepError> {
        self.submit(batch.kind(), batch.len(), admin.delete_acls(batch.items(), self.budget))
            .await
    }

    /// Delete credentials one at a time, stopping at the first failure or when the budget elapses
    pub async fn delete_api_keys(
        &self,
        iam: &dyn IamAdmin,
        batch: DeletionBatch<String>,
    ) -> Result<Vec<String>, SweepError> {
        self.delete_each("API key", batch.items(), |id| async move {
            iam.delete_api_key(&id).await
        })
        .await
    }

    /// Delete role bindings one at a time, stopping at the first failure or when the budget elapses
    pub async fn delete_role_bindings(
        &self,
        iam: &dyn IamAdmin,
        batch: DeletionBatch<String>,
    ) -> Result<Vec<String>, SweepError> {
        self.delete_each("role binding", batch.items(), |id| async move {
            iam.delete_role_binding(&id).await
        })
        .await
    }

    async fn submit<T, Fut>(
        &self,
        kind: ResourceKind,
        requested: usize,
        call: Fut,
    ) -> Result<BatchReport<T>, SweepError>
    where
        Fut: Future<Output = Result<BatchOutcome<T>, SdkError>>,
    {
        log::info!("Deleting {requested} {kind} within {:?}", self.budget);

        let outcome = tokio::time::timeout(self.budget + GUARD_SLACK, call)
            .await
            .map_err(|_| SweepError::Timeout {
                kind,
                budget: self.budget,
            })?
            .map_err(|source| SweepError::Admin { kind, source })?;

        let report = BatchReport::from_outcome(requested, outcome);
        for (_, err) in &report.failed {
            log::warn!("Deleting one of the {kind} failed: {err}");
        }
        if !report.abandoned.is_empty() {
            log::warn!(
                "{} {kind} were still pending when the budget elapsed",
                report.abandoned.len()
            );
        }
        log::info!(
            "Deleted {} of {requested} {kind}",
            report.deleted.len()
        );
        Ok(report)
    }

    async fn delete_each<F, Fut>(
        &self,
        target: &'static str,
        ids: &[String],
        delete: F,
    ) -> Result<Vec<String>, SweepError>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<(), SdkError>>,
    {
        log::info!("Deleting {} {target}s within {:?}", ids.len(), self.budget);

        let deadline = Instant::now() + self.budget;
        let mut deleted = Vec::with_capacity(ids.len());
        for id in ids {
            match tokio::time::timeout_at(deadline, delete(id.clone())).await {
                Ok(Ok(())) => {
                    log::debug!("Deleted {target} {id}");
                    deleted.push(id.clone());
                }
                Ok(Err(source)) => {
                    return Err(SweepError::Mutation {
                        target,
                        item: id.clone(),
                        deleted,
                        source,
                    });
                }
                Err(_) => {
                    log::warn!(
                        "Budget of {:?} elapsed while deleting {target} {id}",
                        self.budget
                    );
                    return Err(SweepError::Expired {
                        target,
                        item: id.clone(),
                        budget: self.budget,
                        deleted,
                    });
                }
            }
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::{InactiveReason, Status};
    use async_trait::async_trait;
    use cloud_sdk::ItemOutcome;
    use cloud_sdk::types::{AclRecord, ApiKeyRecord};
    use std::sync::Mutex;

    use crate::model::RoleBinding;

    /// Confirms only the topics listed in `confirm`
    struct PartialAdmin {
        confirm: Vec<&'static str>,
        stall: bool,
    }

    #[async_trait]
    impl ClusterAdmin for PartialAdmin {
        async fn list_topics(&self) -> Result<Vec<String>, SdkError> {
            Ok(Vec::new())
        }

        async fn list_acls(&self) -> Result<Vec<AclRecord>, SdkError> {
            Ok(Vec::new())
        }

        async fn delete_topics(
            &self,
            topics: &[String],
            _budget: Duration,
        ) -> Result<BatchOutcome<String>, SdkError> {
            if self.stall {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            Ok(BatchOutcome {
                completed: topics
                    .iter()
                    .map(|t| ItemOutcome {
                        item: t.clone(),
                        result: Ok(self.confirm.contains(&t.as_str())),
                    })
                    .collect(),
                abandoned: Vec::new(),
            })
        }

        async fn delete_acls(
            &self,
            _bindings: &[AclBinding],
            _budget: Duration,
        ) -> Result<BatchOutcome<AclBinding>, SdkError> {
            Err(SdkError::InvalidResponse("cluster unavailable".into()))
        }
    }

    /// Fails on the key named `fail_on`, records every attempt
    struct FlakyIam {
        fail_on: &'static str,
        attempts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl IamAdmin for FlakyIam {
        async fn list_api_keys(&self) -> Result<Vec<ApiKeyRecord>, SdkError> {
            Ok(Vec::new())
        }

        async fn list_role_bindings(&self, _principal: &str) -> Result<Vec<RoleBinding>, SdkError> {
            Ok(Vec::new())
        }

        async fn delete_api_key(&self, id: &str) -> Result<(), SdkError> {
            self.attempts.lock().unwrap().push(id.to_string());
            if id == self.fail_on {
                Err(SdkError::InvalidResponse("forbidden".into()))
            } else {
                Ok(())
            }
        }

        async fn delete_role_binding(&self, id: &str) -> Result<(), SdkError> {
            self.attempts.lock().unwrap().push(id.to_string());
            Ok(())
        }
    }

    /// Every call takes `latency` and succeeds
    struct SlowIam {
        latency: Duration,
        attempts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl IamAdmin for SlowIam {
        async fn list_api_keys(&self) -> Result<Vec<ApiKeyRecord>, SdkError> {
            Ok(Vec::new())
        }

        async fn list_role_bindings(&self, _principal: &str) -> Result<Vec<RoleBinding>, SdkError> {
            Ok(Vec::new())
        }

        async fn delete_api_key(&self, id: &str) -> Result<(), SdkError> {
            self.attempts.lock().unwrap().push(id.to_string());
            tokio::time::sleep(self.latency).await;
            Ok(())
        }

        async fn delete_role_binding(&self, id: &str) -> Result<(), SdkError> {
            self.delete_api_key(id).await
        }
    }

    fn all_inactive(items: &[&str]) -> Reconciliation<String> {
        Reconciliation::classify(
            ResourceKind::Topics,
            items.iter().map(|s| s.to_string()),
            |_| Some(Status::Inactive(InactiveReason::NoActivity)),
        )
        .unwrap()
    }

    fn batch(items: &[&str]) -> DeletionBatch<String> {
        DeletionBatch::from_inactive(&all_inactive(items), |t| [t.clone()]).unwrap()
    }

    #[test]
    fn test_batch_only_holds_inactive_items() {
        let reconciliation = Reconciliation::classify(
            ResourceKind::Topics,
            ["keep", "drop"].map(String::from),
            |t| {
                Some(if t == "keep" {
                    Status::Active
                } else {
                    Status::Inactive(InactiveReason::NoActivity)
                })
            },
        )
        .unwrap();

        let batch = DeletionBatch::from_inactive(&reconciliation, |t| [t.clone()]).unwrap();
        assert_eq!(batch.items(), ["drop"]);

        let none_inactive = Reconciliation::classify(
            ResourceKind::Topics,
            ["keep"].map(String::from),
            |_| Some(Status::Active),
        )
        .unwrap();
        assert!(DeletionBatch::from_inactive(&none_inactive, |t| [t.clone()]).is_none());
    }

    #[tokio::test]
    async fn test_reports_exactly_the_confirmed_subset() {
        let admin = PartialAdmin {
            confirm: vec!["a", "c", "e"],
            stall: false,
        };
        let executor = BulkExecutor::new(Duration::from_secs(60));

        let report = executor
            .delete_topics(&admin, batch(&["a", "b", "c", "d", "e"]))
            .await
            .unwrap();

        assert_eq!(report.requested, 5);
        assert_eq!(report.deleted, vec!["a", "c", "e"]);
        assert_eq!(report.unconfirmed, vec!["b", "d"]);
        assert!(!report.nothing_deleted());
    }

    #[tokio::test]
    async fn test_empty_confirmation_is_not_an_error() {
        let admin = PartialAdmin {
            confirm: Vec::new(),
            stall: false,
        };
        let executor = BulkExecutor::new(Duration::from_secs(60));

        let report = executor.delete_topics(&admin, batch(&["a", "b"])).await.unwrap();
        assert!(report.nothing_deleted());
        assert_eq!(report.requested, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_admin_times_out() {
        let admin = PartialAdmin {
            confirm: vec!["a"],
            stall: true,
        };
        let executor = BulkExecutor::new(Duration::from_secs(10));

        let err = executor.delete_topics(&admin, batch(&["a"])).await.unwrap_err();
        assert!(matches!(
            err,
            SweepError::Timeout { kind: ResourceKind::Topics, budget } if budget == Duration::from_secs(10)
        ));
    }

    #[tokio::test]
    async fn test_batch_rejection_is_an_admin_error() {
        let admin = PartialAdmin {
            confirm: Vec::new(),
            stall: false,
        };
        let executor = BulkExecutor::new(Duration::from_secs(60));
        let reconciliation = crate::reconcile::classify_acls(
            vec![AclRecord {
                resource_type: Some("TOPIC".into()),
                resource_name: Some("gone".into()),
                pattern_type: Some("LITERAL".into()),
                principal: Some("User:sa-1".into()),
                host: Some("*".into()),
                operation: Some("READ".into()),
                permission: Some("ALLOW".into()),
            }],
            &[],
        )
        .unwrap();
        let acls = DeletionBatch::from_inactive(&reconciliation, |b| [b.clone()]).unwrap();

        let err = executor.delete_acls(&admin, acls).await.unwrap_err();
        assert!(matches!(err, SweepError::Admin { kind: ResourceKind::Acls, .. }));
    }

    #[tokio::test]
    async fn test_sequential_delete_stops_at_first_failure() {
        let iam = FlakyIam {
            fail_on: "KEY2",
            attempts: Mutex::new(Vec::new()),
        };
        let executor = BulkExecutor::new(Duration::from_secs(60));

        let err = executor
            .delete_api_keys(&iam, batch(&["KEY1", "KEY2", "KEY3"]))
            .await
            .unwrap_err();

        match err {
            SweepError::Mutation {
                target,
                item,
                deleted,
                ..
            } => {
                assert_eq!(target, "API key");
                assert_eq!(item, "KEY2");
                assert_eq!(deleted, vec!["KEY1"]);
            }
            other => panic!("expected mutation error, got {other:?}"),
        }
        assert_eq!(*iam.attempts.lock().unwrap(), vec!["KEY1", "KEY2"]);
    }

    #[tokio::test]
    async fn test_sequential_delete_returns_every_id() {
        let iam = FlakyIam {
            fail_on: "none",
            attempts: Mutex::new(Vec::new()),
        };
        let executor = BulkExecutor::new(Duration::from_secs(60));

        let deleted = executor
            .delete_role_bindings(&iam, batch(&["rb-1", "rb-2"]))
            .await
            .unwrap();
        assert_eq!(deleted, vec!["rb-1", "rb-2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequential_delete_stops_when_budget_elapses() {
        let iam = SlowIam {
            latency: Duration::from_secs(25),
            attempts: Mutex::new(Vec::new()),
        };
        let keys: Vec<String> = (0..10).map(|i| format!("KEY{i}")).collect();
        let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
        let executor = BulkExecutor::new(Duration::from_secs(60));

        let started = Instant::now();
        let err = executor
            .delete_api_keys(&iam, batch(&keys))
            .await
            .unwrap_err();

        assert!(started.elapsed() <= Duration::from_secs(60));
        match err {
            SweepError::Expired {
                target,
                item,
                budget,
                deleted,
            } => {
                assert_eq!(target, "API key");
                assert_eq!(item, "KEY2");
                assert_eq!(budget, Duration::from_secs(60));
                assert_eq!(deleted, vec!["KEY0", "KEY1"]);
            }
            other => panic!("expected expired error, got {other:?}"),
        }
        assert_eq!(iam.attempts.lock().unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequential_delete_within_budget_completes() {
        let iam = SlowIam {
            latency: Duration::from_secs(10),
            attempts: Mutex::new(Vec::new()),
        };
        let executor = BulkExecutor::new(Duration::from_secs(60));

        let deleted = executor
            .delete_role_bindings(&iam, batch(&["rb-1", "rb-2", "rb-3"]))
            .await
            .unwrap();
        assert_eq!(deleted, vec!["rb-1", "rb-2", "rb-3"]);
    }
}
