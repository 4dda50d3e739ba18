//! Inspection batch runner entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use runner::{BatchRunner, Config, telemetry};
use tokio::io::{AsyncBufRead, BufReader};

/// Runs JSON-lines inspection commands and prints the events they publish.
#[derive(Debug, Parser)]
#[command(name = "inspection-runner", version)]
struct Cli {
    /// Command file to read; stdin when omitted.
    input: Option<PathBuf>,

    /// Defect-rate threshold for orders created without one.
    #[arg(long)]
    threshold: Option<f64>,

    /// Print the per-product quality summary after the batch.
    #[arg(long)]
    summary: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(threshold) = cli.threshold {
        config.default_defect_rate_threshold = threshold;
    }
    telemetry::init(&config);

    let mut runner =
        BatchRunner::new(&config, std::io::stdout()).context("failed to set up the runner")?;

    let input: Box<dyn AsyncBufRead + Unpin + Send> = match &cli.input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    let report = runner.run(input).await.context("batch aborted")?;

    if cli.summary {
        runner
            .write_summary()
            .await
            .context("failed to write summary")?;
    }

    if report.failed > 0 {
        tracing::warn!(failed = report.failed, "some commands failed");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
