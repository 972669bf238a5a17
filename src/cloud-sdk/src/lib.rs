//! Clients for the managed streaming platform's control-plane, cluster REST and
//! telemetry APIs, built on a single authenticated [`HttpTransport`].

pub mod batch;
mod client;
pub mod cloud;
mod error;
pub mod kafka;
pub mod metrics;
pub mod types;

pub use batch::{BatchOutcome, ItemOutcome};
pub use client::HttpTransport;
pub use cloud::{ClusterDescription, CloudClient};
pub use error::SdkError;
pub use kafka::KafkaRestClient;
pub use metrics::{MetricsClient, QueryWindow};
