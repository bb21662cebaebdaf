//! nllb-translate - translate text from stdin to stdout with a local NLLB model

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{Level, debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use nllb_translate::cli::Args;
use nllb_translate::config::Config;
use nllb_translate::error::NllbError;
use nllb_translate::workflow::{TranslationJob, Workflow};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => exit_with(&e, None),
    };
    args.apply_to(&mut config);

    // Setup logging to stderr and, when configured, a log file
    let guard = setup_logging(args.verbose, config.logging.dir.as_deref())?;

    match run(&args, config).await {
        Ok(()) => Ok(()),
        Err(e) if e.is_reported() => exit_with(&e, guard),
        Err(e) => Err(e.into()),
    }
}

async fn run(args: &Args, config: Config) -> nllb_translate::error::Result<()> {
    let workflow = Workflow::new(config, args.tokenizer_dir.as_deref())?;

    let mut input = String::new();
    tokio::io::stdin().read_to_string(&mut input).await?;
    debug!("Read {} chars from stdin", input.chars().count());

    let job = TranslationJob {
        src: args.src.clone(),
        dst: args.dst.clone(),
        pivot: args.pivot.clone(),
    };

    let output = workflow.translate(&input, &job).await?;
    if output.is_empty() {
        return Ok(());
    }

    let mut stdout = tokio::io::stdout();
    stdout.write_all(output.as_bytes()).await?;
    stdout.flush().await?;

    info!("Translation completed");
    Ok(())
}

/// Print the diagnostic and leave with status 1, flushing the file log first
fn exit_with(error: &NllbError, guard: Option<WorkerGuard>) -> ! {
    eprintln!("{}", error);
    drop(guard);
    std::process::exit(1);
}

fn setup_logging(verbose: bool, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let log_level = if verbose { Level::DEBUG } else { Level::WARN };

    // stdout carries the translation, so the console layer writes to stderr
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

            // Set up file appender with daily rotation
            let file_appender = rolling::daily(dir, "nllb-translate.log");
            let (non_blocking_file, guard) = non_blocking(file_appender);

            let layer = fmt::layer()
                .with_writer(non_blocking_file)
                .with_target(false)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false); // No ANSI colors in file

            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(guard)
}
