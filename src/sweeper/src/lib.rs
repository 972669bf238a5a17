//! Reconciliation-and-pruning engine for a managed streaming cluster.
//!
//! A pass fetches an inventory and an activity signal concurrently, partitions the
//! inventory into active and inactive items, reports it, and after confirmation
//! deletes the inactive items within a time budget.

pub mod error;
pub mod executor;
pub mod fetch;
pub mod gate;
pub mod model;
pub mod pass;
pub mod reconcile;
pub mod report;
pub mod source;

pub use error::SweepError;
pub use executor::{BatchReport, BulkExecutor, DeletionBatch};
pub use gate::{ConfirmationGate, Prompt, PromptError};
pub use model::ResourceKind;
pub use pass::{Sources, SweepOutcome, SweepSummary, Sweeper};
pub use reconcile::{Reconciliation, Status};
pub use report::Reporter;
pub use source::{ActivitySource, ClusterAdmin, IamAdmin, ScopedIam};
