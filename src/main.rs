use anyhow::{Context, Result};
use clap::Parser;
use job_extractor::cli::{handle_command, JobCli};
use job_extractor::environment::EnvironmentConfig;
use job_extractor::ExtractorConfig;
use std::fs::OpenOptions;
use tracing::info;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "job_extractor=info,jobtrack=info,rocket::server=off";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Load configuration with a console-only subscriber in place; the log file
/// layer depends on the loaded settings.
fn load_config<W>(filter: EnvFilter, writer: W) -> Result<ExtractorConfig>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let bootstrap = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer));
    tracing::subscriber::with_default(bootstrap, ExtractorConfig::load)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = JobCli::parse();
    // Console output goes to stderr so `extract` can print clean JSON
    let config = load_config(env_filter(), std::io::stderr)?;
    let console = fmt::layer().with_writer(std::io::stderr);
    let filter = env_filter();

    let log_file = match &config.environment.server.log_file {
        Some(path) => Some({
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
            }
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?
        }),
        None => None,
    };
    let json_layer = log_file.map(|file| {
        fmt::layer()
            .json()
            .with_writer(file)
            .with_current_span(true)
            .with_span_list(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(json_layer)
        .init();

    info!("Environment: {}", EnvironmentConfig::get_environment());
    if config.ai_api_key.is_none() {
        info!("OPENROUTER_API_KEY not set; pages without JSON-LD will fail to extract");
    }

    handle_command(cli, config).await
}
