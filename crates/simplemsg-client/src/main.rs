//! simple_message_client — post a message to a simple message server and
//! store the files it sends back.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use simplemsg_client::{exchange, DirSink, Endpoint};
use simplemsg_core::{ClientConfig, Posting};

/// Post a message and save the server's reply files.
#[derive(Parser)]
#[command(name = "simple_message_client", version, about)]
struct Cli {
    /// Server host name or address.
    #[arg(short, long)]
    server: String,

    /// Server port.
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,

    /// User name to post as.
    #[arg(short, long)]
    user: String,

    /// Optional image URL to attach.
    #[arg(short, long)]
    image: Option<String>,

    /// Message text.
    #[arg(short, long)]
    message: String,

    /// Directory for received files (overrides the config file).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log each protocol step.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "simple_message_client=debug,simplemsg_client=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = ClientConfig::load().context("failed to load configuration")?;
    if let Some(dir) = cli.output {
        config.output.directory = dir;
    }
    tracing::debug!(
        output = %config.output.directory.display(),
        chunk_size = config.decoder.chunk_size,
        "configuration loaded"
    );

    let posting = Posting::new(cli.user, cli.message, cli.image).context("invalid posting")?;
    let endpoint = Endpoint::new(cli.server, cli.port);
    let mut sinks = DirSink::new(&config.output.directory);

    let response = exchange(&endpoint, &posting, &config.decoder, &mut sinks)
        .await
        .with_context(|| format!("exchange with {}:{} failed", endpoint.host, endpoint.port))?;

    tracing::info!(
        status = response.status,
        records = response.records.len(),
        "exchange complete"
    );
    for record in &response.records {
        tracing::debug!(
            record = %record.name,
            bytes = record.len,
            digest = hex::encode(record.digest),
            "saved"
        );
    }

    Ok(())
}
