// src/cli.rs
use crate::config::ExtractorConfig;
use crate::extraction::JobExtractor;
use crate::types::ExtractResponse;
use crate::web::start_web_server;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "jobtrack")]
#[command(about = "Extract structured job postings from listing URLs")]
pub struct JobCli {
    #[command(subcommand)]
    pub command: Option<JobCommand>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum JobCommand {
    /// Run the HTTP API (default)
    Serve,
    /// Extract a single posting and print it as JSON
    Extract {
        url: String,
        /// Print the record as it would be saved, with id and application date
        #[arg(long)]
        saved: bool,
    },
}

pub async fn handle_command(cli: JobCli, config: ExtractorConfig) -> Result<()> {
    config.environment.ensure_directories().await?;
    let extractor = JobExtractor::from_config(&config)?;

    match cli.command.unwrap_or(JobCommand::Serve) {
        JobCommand::Serve => start_web_server(&config.environment.server, extractor).await,
        JobCommand::Extract { url, saved } => match extractor.extract(Some(&url)).await {
            Ok(record) => {
                info!("Extracted posting from {}", url);
                let output = if saved {
                    serde_json::to_string_pretty(&record.into_saved())
                } else {
                    serde_json::to_string_pretty(&ExtractResponse::success(record))
                }
                .context("Failed to serialize job record")?;
                println!("{}", output);
                Ok(())
            }
            Err(e) => {
                error!("Extraction failed: {}", e);
                let output = serde_json::to_string_pretty(&ExtractResponse::from(&e))
                    .context("Failed to serialize error response")?;
                println!("{}", output);
                Err(e.into())
            }
        },
    }
}
