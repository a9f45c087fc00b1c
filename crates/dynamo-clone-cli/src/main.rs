//! dynamo-clone CLI - copy all items from one table to another, with
//! checkpointed resume.

mod progress;

use chrono::{DateTime, Utc};
use clap::Parser;
use dialoguer::Confirm;
use dynamo_clone::drivers::dynamo::{DynamoSource, DynamoTarget};
use dynamo_clone::{CloneError, CloneParams, Cloner, EndpointConfig, ResumePrompt};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser)]
#[command(name = "dynamo-clone")]
#[command(about = "Copy table items from one table to another, resuming after interruption")]
#[command(version)]
struct Cli {
    /// Source table region
    #[arg(long)]
    src_region: String,

    /// Source table name
    #[arg(long)]
    src_table: String,

    /// Source access key id
    #[arg(long)]
    src_access_id: String,

    /// Source secret access key
    #[arg(long)]
    src_access_key: String,

    /// Destination table region [default: source region]
    #[arg(long)]
    dst_region: Option<String>,

    /// Destination table name [default: source table]
    #[arg(long)]
    dst_table: Option<String>,

    /// Destination access key id [default: source access key id]
    #[arg(long)]
    dst_access_id: Option<String>,

    /// Destination secret access key [default: source secret access key]
    #[arg(long)]
    dst_access_key: Option<String>,

    /// Path to the checkpoint state file [default: ~/.aws_tools/dynamo_clone.json]
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Answer the resume prompt with its default instead of asking
    #[arg(long, short = 'y')]
    yes: bool,

    /// Disable the progress bar
    #[arg(long)]
    no_progress_bar: bool,

    /// Output JSON report to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,
}

impl Cli {
    fn params(&self) -> CloneParams {
        let source = EndpointConfig {
            region: self.src_region.clone(),
            table: self.src_table.clone(),
            access_key_id: self.src_access_id.clone(),
            secret_access_key: self.src_access_key.clone(),
        };
        let destination = EndpointConfig {
            region: self.dst_region.clone().unwrap_or_else(|| source.region.clone()),
            table: self.dst_table.clone().unwrap_or_else(|| source.table.clone()),
            access_key_id: self
                .dst_access_id
                .clone()
                .unwrap_or_else(|| source.access_key_id.clone()),
            secret_access_key: self
                .dst_access_key
                .clone()
                .unwrap_or_else(|| source.secret_access_key.clone()),
        };
        CloneParams { source, destination }
    }
}

/// Prompt backed by an interactive terminal query, defaulting to yes.
struct InteractivePrompt;

impl ResumePrompt for InteractivePrompt {
    fn confirm_resume(&self, last_checkpoint: Option<DateTime<Utc>>) -> dynamo_clone::Result<bool> {
        let when = last_checkpoint
            .map(|t| t.format("%m/%d/%Y %H:%M:%S").to_string())
            .unwrap_or_else(|| "an unknown time".to_string());
        Confirm::new()
            .with_prompt(format!("Resume from last recorded state at {} ?", when))
            .default(true)
            .interact()
            .map_err(|e| CloneError::Prompt(e.to_string()))
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), CloneError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format)
        .map_err(|e| CloneError::Config(e.to_string()))?;

    let params = cli.params();
    info!(
        "Copying {} ({}) to {} ({})",
        params.source.table,
        params.source.region,
        params.destination.table,
        params.destination.region
    );

    // Parameter errors surface here, before any store client exists.
    let mut cloner = Cloner::new(params.clone())?
        .with_progress(Box::new(progress::BarProgress::new(cli.no_progress_bar)));
    if !cli.yes {
        cloner = cloner.with_prompt(Box::new(InteractivePrompt));
    }
    if let Some(path) = cli.state_file {
        cloner = cloner.with_state_path(path);
    }

    let source = DynamoSource::new(&params.source);
    let target = DynamoTarget::new(&params.destination);

    let report = cloner.run(&source, &target).await?;

    if cli.output_json {
        println!("{}", report.to_json()?);
    } else {
        println!("\nClone completed!");
        println!("  Job ID: {}", report.job_id);
        println!("  Duration: {:.2}s", report.duration_seconds);
        println!("  Items: {}", report.items_copied);
        println!("  Pages: {}", report.pages);
        println!("  Throughput: {} items/sec", report.items_per_second);
        if report.resumed {
            println!("  Resumed from a previous checkpoint");
        }
    }

    Ok(())
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    Ok(())
}
