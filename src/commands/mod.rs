pub mod confluent;

use clap::{Parser, Subcommand};
use common::cli::CommonArgs;
use common::cli::utils::{init_logging, load_config};

/// Find and remove unused streaming-cluster resources
#[derive(Parser)]
#[command(name = "streamsweep", version, about)]
pub struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean unused Confluent Cloud resources
    #[command(visible_aliases = ["confl", "cfl"])]
    Confluent(confluent::ConfluentArgs),
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        init_logging(&self.common);
        let config = load_config(self.common.config.as_ref())?;

        match self.command {
            Commands::Confluent(args) => args.run(&config).await,
        }
    }
}
