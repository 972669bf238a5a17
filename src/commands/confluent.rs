use anyhow::Context;
use clap::{Args, Subcommand};
use cloud_sdk::{CloudClient, HttpTransport, KafkaRestClient, MetricsClient, QueryWindow};
use common::Configuration;
use common::cli::{RunTarget, TargetArgs};
use sweeper::{BulkExecutor, ConfirmationGate, ScopedIam, Sources, Sweeper};

use crate::prompt::TerminalPrompt;
use crate::render::TableReporter;

#[derive(Args)]
pub struct ConfluentArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    #[command(subcommand)]
    action: ConfluentAction,
}

#[derive(Subcommand, Clone, Copy, Debug)]
enum ConfluentAction {
    /// Delete topics that ingested no records in the activity window
    #[command(visible_alias = "tpcs")]
    Topics,
    /// Delete topic ACLs whose topic or prefix no longer exists
    Acls,
    /// Delete cluster API keys and role bindings of idle service accounts
    #[command(visible_alias = "iam")]
    ServiceAccounts,
}

impl ConfluentArgs {
    pub async fn run(self, config: &Configuration) -> anyhow::Result<()> {
        let target = self.target.validate()?;
        let sweeper = connect(&target, config).await?;

        let summary = match self.action {
            ConfluentAction::Topics => sweeper.sweep_topics().await,
            ConfluentAction::Acls => sweeper.sweep_acls().await,
            ConfluentAction::ServiceAccounts => sweeper.sweep_service_accounts().await,
        }
        .with_context(|| format!("Cleanup of cluster {} did not complete", target.cluster))?;

        log::info!("{summary}");
        Ok(())
    }
}

/// Discover the cluster and build every client the sweep needs
async fn connect(target: &RunTarget, config: &Configuration) -> anyhow::Result<Sweeper> {
    let timeout = config.http.request_timeout;
    let cloud_key = &target.cloud_credentials;
    let cluster_key = &target.cluster_credentials;

    let cloud = CloudClient::new(
        HttpTransport::new(
            &config.endpoints.cloud_api_url,
            &cloud_key.key,
            &cloud_key.secret,
            timeout,
        )?,
        &target.environment,
        &target.cluster,
    );
    let cluster = cloud
        .describe_cluster()
        .await
        .with_context(|| format!("Failed to describe cluster {}", target.cluster))?;
    log::info!(
        "Cluster {} ({}) REST endpoint: {}",
        cluster.cluster_id,
        cluster.display_name.as_deref().unwrap_or("unnamed"),
        cluster.rest_endpoint
    );

    let kafka = KafkaRestClient::new(
        HttpTransport::new(
            &cluster.rest_endpoint,
            &cluster_key.key,
            &cluster_key.secret,
            timeout,
        )?,
        &target.cluster,
    );
    let metrics = MetricsClient::new(
        HttpTransport::new(
            &config.endpoints.telemetry_url,
            &cloud_key.key,
            &cloud_key.secret,
            timeout,
        )?,
        &target.cluster,
        QueryWindow {
            window: config.activity.window,
            granularity: config.activity.granularity.clone(),
            limit: config.activity.limit,
        },
    );

    Ok(Sweeper::new(
        Sources {
            cluster: Box::new(kafka),
            iam: Box::new(ScopedIam::new(cloud, &cluster.crn_pattern)),
            activity: Box::new(metrics),
        },
        ConfirmationGate::new(target.auto_confirm, Box::new(TerminalPrompt::default())),
        Box::new(TableReporter),
        BulkExecutor::new(config.deletion.timeout),
        config.naming.clone(),
    ))
}
