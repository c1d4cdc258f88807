//! Command-line surface

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use retrace::config::{OutputFormat, ReplayConfig};
use retrace::Result;

#[derive(Parser, Debug)]
#[command(
    name = "retrace",
    version,
    about = "CLI for Prometheus remote storage",
    subcommand_negates_reqs = true
)]
pub struct Cli {
    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = Format::Json)]
    pub format: Format,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub read: ReadArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// One-off remote read, run when no subcommand is given
#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Remote Storage endpoint
    #[arg(long, required = true)]
    pub url: Option<String>,

    /// Authorization token
    #[arg(short, long)]
    pub token: Option<String>,

    /// JSON-encoded Remote Storage request, or - for stdin
    #[arg(short, long, required = true)]
    pub input: Option<String>,

    /// Whether to build curl command line only
    #[arg(long)]
    pub curl: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Recorded remote storage requests
    Record(RecordArgs),
}

/// Decodes one record when no subcommand is given
#[derive(Args, Debug)]
#[command(args_conflicts_with_subcommands = true, subcommand_negates_reqs = true)]
pub struct RecordArgs {
    #[command(subcommand)]
    pub command: Option<RecordCommand>,

    /// Record file or raw snappy payload to decode, or - for stdin
    #[arg(required = true)]
    pub file: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum RecordCommand {
    /// Replay recorded requests against their endpoints
    Replay(ReplayArgs),
    /// Print the records stored in archives
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Archive locations: local paths, http(s):// URLs or s3://bucket/key
    #[arg(required = true)]
    pub archives: Vec<String>,

    /// Max round trip time [default: 60s]
    #[arg(long, value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,

    /// Keep sending requests over a period of time [default: disabled]
    #[arg(long, value_parser = humantime::parse_duration)]
    pub duration: Option<Duration>,

    /// Controls parallelism level for requests [default: 1]
    #[arg(short, long)]
    pub parallel: Option<usize>,

    /// TOML file with replay settings; flags take precedence
    #[arg(long, env = "RETRACE_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Archive locations: local paths, http(s):// URLs or s3://bucket/key
    #[arg(required = true)]
    pub archives: Vec<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Json => Self::Json,
            Format::Yaml => Self::Yaml,
        }
    }
}

impl ReplayArgs {
    /// Settings from the config file, overridden by explicit flags
    pub fn replay_config(&self) -> Result<ReplayConfig> {
        let mut config = match &self.config {
            Some(path) => ReplayConfig::from_file(path)?,
            None => ReplayConfig::default(),
        };

        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if let Some(duration) = self.duration {
            config.duration = duration;
        }
        if let Some(parallel) = self.parallel {
            config.parallel = parallel;
        }

        config.validate()?;
        Ok(config)
    }
}
