mod commands;
mod prompt;
mod render;

use std::process::ExitCode;

use clap::Parser;
use commands::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    match Cli::parse().run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let mut causes = err.chain();
            if let Some(top) = causes.next() {
                eprintln!("streamsweep: {top}");
            }
            for cause in causes {
                eprintln!("  caused by: {cause}");
            }
            ExitCode::FAILURE
        }
    }
}
