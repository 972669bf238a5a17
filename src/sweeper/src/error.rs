use std::time::Duration;

use cloud_sdk::SdkError;

use crate::model::ResourceKind;

/// Errors that abort a single sweep pass
#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    /// One of the concurrent inventory/activity fetches failed
    #[error("failed to fetch {kind}: {source}")]
    Fetch {
        kind: ResourceKind,
        #[source]
        source: SdkError,
    },

    /// An inventory item was neither active nor inactive
    #[error("{kind} item '{item}' was not classified")]
    Unclassified { kind: ResourceKind, item: String },

    /// A sequential deletion failed; `deleted` were removed before the failure
    #[error("failed to delete {target} '{item}' after deleting {} others: {source}", .deleted.len())]
    Mutation {
        target: &'static str,
        item: String,
        deleted: Vec<String>,
        #[source]
        source: SdkError,
    },

    /// A sequential deletion ran out of budget while `item` was pending
    #[error(
        "deleting {target} '{item}' did not finish within {budget:?}; {} were deleted before it",
        .deleted.len()
    )]
    Expired {
        target: &'static str,
        item: String,
        budget: Duration,
        deleted: Vec<String>,
    },

    /// The admin capability rejected the whole batch
    #[error("failed to delete {kind}: {source}")]
    Admin {
        kind: ResourceKind,
        #[source]
        source: SdkError,
    },

    /// The admin capability did not return within the batch budget
    #[error("deleting {kind} did not finish within {budget:?}")]
    Timeout { kind: ResourceKind, budget: Duration },
}
