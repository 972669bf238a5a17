//! One reconciliation pass per resource kind: fetch, classify, report, confirm, delete.

use std::collections::BTreeMap;
use std::fmt;

use common::config::NamingConfig;

use crate::error::SweepError;
use crate::executor::{BatchReport, BulkExecutor, DeletionBatch};
use crate::fetch::join_fetches;
use crate::gate::ConfirmationGate;
use crate::model::{CredentialOwnership, ResourceKind, RoleBinding};
use crate::reconcile::{classify_acls, classify_service_accounts, classify_topics};
use crate::report::{
    ACL_HEADERS, Reporter, SERVICE_ACCOUNT_HEADERS, TOPIC_HEADERS, acl_columns, acl_rows,
    list_rows, service_account_row, topic_rows,
};
use crate::source::{ActivitySource, ClusterAdmin, IamAdmin};

/// The data sources and admin capabilities a sweep runs against
pub struct Sources {
    pub cluster: Box<dyn ClusterAdmin>,
    pub iam: Box<dyn IamAdmin>,
    pub activity: Box<dyn ActivitySource>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepOutcome {
    /// Every item was active
    NothingToDelete,
    /// The confirmation gate said no
    Declined,
    Deleted { requested: usize, deleted: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepSummary {
    pub kind: ResourceKind,
    pub inventory: usize,
    pub inactive: usize,
    pub outcome: SweepOutcome,
}

impl fmt::Display for SweepSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} inventoried, {} inactive, ",
            self.kind, self.inventory, self.inactive
        )?;
        match self.outcome {
            SweepOutcome::NothingToDelete => write!(f, "nothing to delete"),
            SweepOutcome::Declined => write!(f, "deletion declined"),
            SweepOutcome::Deleted { requested, deleted } => {
                write!(f, "{deleted} of {requested} deleted")
            }
        }
    }
}

/// Runs the reconciliation passes of a single cluster
pub struct Sweeper {
    sources: Sources,
    gate: ConfirmationGate,
    reporter: Box<dyn Reporter>,
    executor: BulkExecutor,
    naming: NamingConfig,
}

impl Sweeper {
    pub fn new(
        sources: Sources,
        gate: ConfirmationGate,
        reporter: Box<dyn Reporter>,
        executor: BulkExecutor,
        naming: NamingConfig,
    ) -> Self {
        Self {
            sources,
            gate,
            reporter,
            executor,
            naming,
        }
    }

    pub async fn sweep_topics(&self) -> Result<SweepSummary, SweepError> {
        let kind = ResourceKind::Topics;
        self.reporter
            .notice("Detecting inactive topics (last 7 days)...");

        let (topics, activity) = join_fetches(
            kind,
            self.sources.cluster.list_topics(),
            self.sources.activity.topic_activity(),
        )
        .await?;

        let reconciliation =
            classify_topics(topics, &activity, &self.naming.internal_topic_prefix)?;
        self.reporter.render(&TOPIC_HEADERS, topic_rows(&reconciliation));

        let inventory = reconciliation.len();
        let inactive = reconciliation.inactive_count();
        let summary = |outcome| SweepSummary {
            kind,
            inventory,
            inactive,
            outcome,
        };

        let Some(batch) = DeletionBatch::from_inactive(&reconciliation, |t| [t.clone()]) else {
            self.reporter.notice("No inactive topics found.");
            return Ok(summary(SweepOutcome::NothingToDelete));
        };
        if !self.gate.confirm("Delete all inactive topics?") {
            self.reporter.notice("Skipped deleting inactive topics.");
            return Ok(summary(SweepOutcome::Declined));
        }

        let report = self
            .executor
            .delete_topics(self.sources.cluster.as_ref(), batch)
            .await?;
        self.render_batch(&report, &["Topics Deleted"], |t| vec![t.clone()], "topics");

        Ok(summary(SweepOutcome::Deleted {
            requested: report.requested,
            deleted: report.deleted.len(),
        }))
    }

    pub async fn sweep_acls(&self) -> Result<SweepSummary, SweepError> {
        let kind = ResourceKind::Acls;
        self.reporter.notice("Detecting unused topic ACLs...");

        let (topics, records) = join_fetches(
            kind,
            self.sources.cluster.list_topics(),
            self.sources.cluster.list_acls(),
        )
        .await?;

        let reconciliation = classify_acls(records, &topics)?;
        self.reporter.render(&ACL_HEADERS, acl_rows(&reconciliation));

        let inventory = reconciliation.len();
        let inactive = reconciliation.inactive_count();
        let summary = |outcome| SweepSummary {
            kind,
            inventory,
            inactive,
            outcome,
        };

        let Some(batch) = DeletionBatch::from_inactive(&reconciliation, |b| [b.clone()]) else {
            self.reporter.notice("No inactive ACLs found.");
            return Ok(summary(SweepOutcome::NothingToDelete));
        };
        if !self.gate.confirm("Delete all unused Topic ACLs?") {
            self.reporter.notice("Skipped deleting unused ACLs.");
            return Ok(summary(SweepOutcome::Declined));
        }

        let report = self
            .executor
            .delete_acls(self.sources.cluster.as_ref(), batch)
            .await?;
        self.render_batch(
            &report,
            &ACL_HEADERS[..ACL_HEADERS.len() - 1],
            acl_columns,
            "ACLs",
        );

        Ok(summary(SweepOutcome::Deleted {
            requested: report.requested,
            deleted: report.deleted.len(),
        }))
    }

    pub async fn sweep_service_accounts(&self) -> Result<SweepSummary, SweepError> {
        let kind = ResourceKind::ServiceAccounts;
        self.reporter
            .notice("Detecting inactive service accounts (last 7 days)...");

        let (keys, activity) = join_fetches(
            kind,
            self.sources.iam.list_api_keys(),
            self.sources.activity.connection_activity(),
        )
        .await?;

        let ownership: CredentialOwnership = keys.into_iter().collect();
        let reconciliation = classify_service_accounts(
            &ownership,
            &activity,
            &self.naming.service_account_prefix,
        )?;

        let mut role_bindings: BTreeMap<String, Vec<RoleBinding>> = BTreeMap::new();
        for entry in reconciliation.entries() {
            let principal = &entry.item.principal;
            let bindings = self
                .sources
                .iam
                .list_role_bindings(principal)
                .await
                .map_err(|source| {
                    log::error!("Fetching role bindings of {principal} failed: {source}");
                    SweepError::Fetch { kind, source }
                })?;
            role_bindings.insert(principal.clone(), bindings);
        }

        let rows = reconciliation
            .entries()
            .iter()
            .map(|e| {
                let bindings = bindings_of(&role_bindings, &e.item.principal);
                service_account_row(&e.item, e.status, bindings)
            })
            .collect();
        self.reporter.render(&SERVICE_ACCOUNT_HEADERS, rows);

        let inventory = reconciliation.len();
        let inactive = reconciliation.inactive_count();
        let summary = |outcome| SweepSummary {
            kind,
            inventory,
            inactive,
            outcome,
        };

        let key_batch = DeletionBatch::from_inactive(&reconciliation, |a| a.api_keys.clone());
        let binding_batch = DeletionBatch::from_inactive(&reconciliation, |a| {
            bindings_of(&role_bindings, &a.principal)
                .iter()
                .map(|rb| rb.id.clone())
                .collect::<Vec<_>>()
        });
        if key_batch.is_none() && binding_batch.is_none() {
            self.reporter.notice("No inactive service accounts found.");
            return Ok(summary(SweepOutcome::NothingToDelete));
        }
        if !self
            .gate
            .confirm("Delete inactive Service Accounts and cluster Role bindings?")
        {
            self.reporter.notice("Skipped deleting inactive service accounts.");
            return Ok(summary(SweepOutcome::Declined));
        }

        let requested = key_batch.as_ref().map_or(0, DeletionBatch::len)
            + binding_batch.as_ref().map_or(0, DeletionBatch::len);
        let mut deleted = 0;

        if let Some(batch) = key_batch {
            let keys = self
                .executor
                .delete_api_keys(self.sources.iam.as_ref(), batch)
                .await
                .inspect_err(|e| self.report_partial(e))?;
            self.reporter.render(&["API Keys Deleted"], list_rows(&keys));
            deleted += keys.len();
        }
        if let Some(batch) = binding_batch {
            let ids = self
                .executor
                .delete_role_bindings(self.sources.iam.as_ref(), batch)
                .await
                .inspect_err(|e| self.report_partial(e))?;
            self.reporter
                .render(&["Role Bindings Deleted"], list_rows(&ids));
            deleted += ids.len();
        }

        Ok(summary(SweepOutcome::Deleted { requested, deleted }))
    }

    /// Show what a failed sequential delete removed before stopping
    fn report_partial(&self, err: &SweepError) {
        let (target, deleted) = match err {
            SweepError::Mutation {
                target, deleted, ..
            }
            | SweepError::Expired {
                target, deleted, ..
            } => (target, deleted),
            _ => return,
        };
        if !deleted.is_empty() {
            let header = format!("Deleted before the {target} failure");
            self.reporter.render(&[header.as_str()], list_rows(deleted));
        }
    }

    fn render_batch<T, F>(&self, report: &BatchReport<T>, headers: &[&str], row: F, noun: &str)
    where
        F: Fn(&T) -> Vec<String>,
    {
        if report.nothing_deleted() {
            self.reporter.notice(&format!("No {noun} were deleted."));
        } else {
            self.reporter
                .render(headers, report.deleted.iter().map(&row).collect());
        }

        let not_deleted: Vec<&T> = report
            .failed
            .iter()
            .map(|(item, _)| item)
            .chain(&report.unconfirmed)
            .chain(&report.abandoned)
            .collect();
        if !not_deleted.is_empty() {
            self.reporter.notice(&format!(
                "{} of {} {noun} were not confirmed as deleted:",
                not_deleted.len(),
                report.requested
            ));
            self.reporter
                .render(headers, not_deleted.into_iter().map(&row).collect());
        }
    }
}

fn bindings_of<'a>(
    role_bindings: &'a BTreeMap<String, Vec<RoleBinding>>,
    principal: &str,
) -> &'a [RoleBinding] {
    role_bindings
        .get(principal)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}
