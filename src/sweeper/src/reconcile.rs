//! Kind-specific policies deciding which inventory items are unused.
//!
//! Every policy produces a [`Reconciliation`], a partition of the full inventory
//! into active and inactive items. An item the policy cannot place aborts the pass
//! with [`SweepError::Unclassified`] instead of defaulting either way.

use std::fmt;

use cloud_sdk::types::AclRecord;

use crate::error::SweepError;
use crate::model::{
    AclBinding, ConnectionActivity, CredentialOwnership, PatternType, ResourceKind, ResourceType,
    ServiceAccount, TopicActivity,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InactiveReason {
    /// No activity recorded during the window
    NoActivity,
    /// Literal binding whose topic does not exist
    TopicNotFound,
    /// Prefixed binding matching no existing topic
    TopicPrefixNotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Active,
    Inactive(InactiveReason),
}

impl Status {
    pub fn is_inactive(&self) -> bool {
        matches!(self, Status::Inactive(_))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Status::Active => "ACTIVE",
            Status::Inactive(InactiveReason::NoActivity) => "INACTIVE",
            Status::Inactive(InactiveReason::TopicNotFound) => "TOPIC_NOT_FOUND",
            Status::Inactive(InactiveReason::TopicPrefixNotFound) => "TOPIC_PREFIX_NOT_FOUND",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classified<T> {
    pub item: T,
    pub status: Status,
}

/// Full inventory of one kind, each item marked active or inactive, in inventory order
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation<T> {
    kind: ResourceKind,
    entries: Vec<Classified<T>>,
}

impl<T: fmt::Display> Reconciliation<T> {
    /// Apply `policy` to every item. `None` from the policy is an invariant violation.
    pub fn classify<I, F>(kind: ResourceKind, inventory: I, mut policy: F) -> Result<Self, SweepError>
    where
        I: IntoIterator<Item = T>,
        F: FnMut(&T) -> Option<Status>,
    {
        let entries = inventory
            .into_iter()
            .map(|item| match policy(&item) {
                Some(status) => Ok(Classified { item, status }),
                None => Err(SweepError::Unclassified {
                    kind,
                    item: item.to_string(),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let reconciliation = Self { kind, entries };
        log::info!(
            "Classified {} {kind}: {} inactive",
            reconciliation.len(),
            reconciliation.inactive_count()
        );
        Ok(reconciliation)
    }
}

impl<T> Reconciliation<T> {
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn entries(&self) -> &[Classified<T>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn active(&self) -> impl Iterator<Item = &T> {
        self.entries
            .iter()
            .filter(|e| !e.status.is_inactive())
            .map(|e| &e.item)
    }

    pub fn inactive(&self) -> impl Iterator<Item = &T> {
        self.entries
            .iter()
            .filter(|e| e.status.is_inactive())
            .map(|e| &e.item)
    }

    pub fn inactive_count(&self) -> usize {
        self.entries.iter().filter(|e| e.status.is_inactive()).count()
    }
}

/// Drop topics in the reserved internal namespace
pub fn topic_inventory(topics: Vec<String>, internal_prefix: &str) -> Vec<String> {
    topics
        .into_iter()
        .filter(|topic| {
            let internal = topic.starts_with(internal_prefix);
            if internal {
                log::debug!("Excluding internal topic {topic}");
            }
            !internal
        })
        .collect()
}

/// Topics are inactive when they ingested nothing during the window
pub fn classify_topics(
    topics: Vec<String>,
    activity: &TopicActivity,
    internal_prefix: &str,
) -> Result<Reconciliation<String>, SweepError> {
    Reconciliation::classify(
        ResourceKind::Topics,
        topic_inventory(topics, internal_prefix),
        |topic| {
            Some(if activity.is_active(topic) {
                Status::Active
            } else {
                Status::Inactive(InactiveReason::NoActivity)
            })
        },
    )
}

/// Parse fetched records, skipping malformed ones with a warning
pub fn acl_inventory(records: Vec<AclRecord>) -> Vec<AclBinding> {
    records
        .into_iter()
        .filter_map(|record| {
            let shown = format!("{record:?}");
            match AclBinding::try_from(record) {
                Ok(binding) => Some(binding),
                Err(reason) => {
                    log::warn!("Skipping ACL binding ({reason}): {shown}");
                    None
                }
            }
        })
        .collect()
}

/// Topic bindings are inactive when no existing topic matches their pattern.
/// Bindings on other resource types are always active.
pub fn classify_acls(
    records: Vec<AclRecord>,
    topics: &[String],
) -> Result<Reconciliation<AclBinding>, SweepError> {
    Reconciliation::classify(ResourceKind::Acls, acl_inventory(records), |binding| {
        Some(acl_status(binding, topics))
    })
}

/// A literal binding on this name grants access to every topic, present or future
const WILDCARD_RESOURCE: &str = "*";

fn acl_status(binding: &AclBinding, topics: &[String]) -> Status {
    if binding.resource_type != ResourceType::Topic {
        return Status::Active;
    }

    let name = binding.resource_name.as_str();
    match binding.pattern_type {
        PatternType::Literal if name == WILDCARD_RESOURCE => Status::Active,
        PatternType::Literal if !topics.iter().any(|t| t == name) => {
            Status::Inactive(InactiveReason::TopicNotFound)
        }
        PatternType::Prefixed if !topics.iter().any(|t| t.starts_with(name)) => {
            Status::Inactive(InactiveReason::TopicPrefixNotFound)
        }
        _ => Status::Active,
    }
}

/// Service accounts owning credentials on the cluster, in principal order
pub fn service_account_inventory(
    ownership: &CredentialOwnership,
    service_account_prefix: &str,
) -> Vec<ServiceAccount> {
    ownership
        .principals()
        .filter(|(principal, _)| principal.starts_with(service_account_prefix))
        .map(|(principal, keys)| ServiceAccount {
            principal: principal.to_string(),
            api_keys: keys.to_vec(),
        })
        .collect()
}

/// Service accounts are inactive when their connection weight is zero.
/// A negative or NaN weight cannot be classified.
pub fn classify_service_accounts(
    ownership: &CredentialOwnership,
    activity: &ConnectionActivity,
    service_account_prefix: &str,
) -> Result<Reconciliation<ServiceAccount>, SweepError> {
    Reconciliation::classify(
        ResourceKind::ServiceAccounts,
        service_account_inventory(ownership, service_account_prefix),
        |account| {
            let weight = activity.weight(&account.principal);
            if weight > 0.0 {
                Some(Status::Active)
            } else if weight == 0.0 {
                Some(Status::Inactive(InactiveReason::NoActivity))
            } else {
                None
            }
        },
    )
}
