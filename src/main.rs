//! Retrace CLI

mod cli;

use std::process;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;

use cli::{Cli, Commands, InspectArgs, ReadArgs, RecordArgs, RecordCommand, ReplayArgs};
use retrace::archive::{ArchiveReader, DefaultBlobSource, ObjectStoreSession};
use retrace::config::OutputFormat;
use retrace::network::{HttpClient, ARCHIVE_FETCH_TIMEOUT_SECS};
use retrace::remote::{self, ReadRequest, RemoteReadClient};
use retrace::replay::ReplayEngine;
use retrace::{inspect, shutdown};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let signals = shutdown::install(cancel.clone()).context("failed to install signal handlers")?;

    let http = HttpClient::new(Duration::from_secs(ARCHIVE_FETCH_TIMEOUT_SECS))?;
    let reader = ArchiveReader::new(DefaultBlobSource::new(
        http.clone(),
        ObjectStoreSession::from_env(),
    ));
    let format = cli.format.into();

    let result = match cli.command {
        None => remote_read(http, cli.read, format, &cancel).await,
        Some(Commands::Record(RecordArgs {
            command: None,
            file,
        })) => decode_record(file, format).await,
        Some(Commands::Record(RecordArgs {
            command: Some(RecordCommand::Replay(args)),
            ..
        })) => replay_archives(&reader, args, cancel.clone()).await,
        Some(Commands::Record(RecordArgs {
            command: Some(RecordCommand::Inspect(args)),
            ..
        })) => inspect_archives(&reader, args, format).await,
    };

    cancel.cancel();
    signals.await.ok();
    result
}

async fn remote_read(
    http: HttpClient,
    args: ReadArgs,
    format: OutputFormat,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let url = args.url.context("--url is required")?;
    let input = args.input.context("--input is required")?;

    let data = remote::read_input(&input)
        .await
        .context("error reading file")?;
    let request: ReadRequest =
        serde_json::from_slice(&data).context("error unmarshalling")?;
    let client = RemoteReadClient::new(http, &url, args.token.as_deref())?;

    if args.curl {
        println!("{}", client.curl_command(&request)?);
        return Ok(());
    }

    let response = client
        .read(&request, cancel)
        .await
        .context("error calling api")?;

    inspect::write_value(std::io::stdout().lock(), format, &response)?;
    Ok(())
}

/// Requests go to stderr and responses to stdout so the two can be
/// redirected apart
async fn decode_record(file: Option<String>, format: OutputFormat) -> anyhow::Result<()> {
    let file = file.context("record file is required")?;
    let data = remote::read_input(&file).await?;
    let payload = remote::decode_payload(&data).context("parsing error")?;

    if let Some(request) = &payload.request {
        inspect::write_value(std::io::stderr().lock(), format, request)?;
    }
    if let Some(response) = &payload.response {
        inspect::write_value(std::io::stdout().lock(), format, response)?;
    }
    Ok(())
}

async fn replay_archives(
    reader: &ArchiveReader<DefaultBlobSource>,
    args: ReplayArgs,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let config = args.replay_config()?;
    let records = reader
        .read_all(&args.archives)
        .await
        .context("failed to read archives")?;

    let engine = ReplayEngine::new(config)?;
    let summary = engine.run(records, cancel).await?;

    info!(
        "Replayed {} requests: {} succeeded, {} rejected, {} failed",
        summary.dispatched, summary.succeeded, summary.rejected, summary.failed
    );
    Ok(())
}

async fn inspect_archives(
    reader: &ArchiveReader<DefaultBlobSource>,
    args: InspectArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let records = reader
        .read_all(&args.archives)
        .await
        .context("failed to read archives")?;

    inspect::render(std::io::stdout().lock(), format, &records)?;
    Ok(())
}
