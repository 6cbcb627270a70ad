//! counterplots: render counterfactual explanation charts from JSON.
//!
//! ```text
//! counterplots explanation.json -o chart.svg
//! counterplots explanation.json --format png --threshold 0.4 -v
//! ```
//!
//! The input is a chart data document tagged with `"kind"`
//! (`greedy`, `countershapley` or `constellation`).

#![cfg_attr(test, allow(clippy::unwrap_used))]

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use counterplots::config::{Config, OutputFormat};
use counterplots::report::ChartData;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Counterfactual explanation charts
#[derive(Parser, Debug)]
#[command(name = "counterplots")]
#[command(version)]
#[command(about = "Render greedy, counter-shapley and constellation charts", long_about = None)]
struct Cli {
    /// Chart data (JSON with a "kind" field)
    input: PathBuf,

    /// Output file (default: <input stem>.<format> in the configured output directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format when the output path has no extension
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Decision threshold
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));
    tracing_subscriber::registry().with(stderr_layer).init();
}

/// Flags over the config file over defaults. An explicit `--config`, or a
/// file present at `default_path`, must load.
fn load_config(cli: &Cli, default_path: Option<&Path>) -> Result<Config> {
    let path = cli
        .config
        .as_deref()
        .or_else(|| default_path.filter(|p| p.exists()));
    let mut config = match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(threshold) = cli.threshold {
        config.threshold = threshold;
    }
    if let Some(format) = cli.format {
        config.format = format;
    }
    config.validate()?;
    Ok(config)
}

fn output_path(cli: &Cli, config: &Config) -> PathBuf {
    let mut path = cli.output.clone().unwrap_or_else(|| {
        let stem = cli
            .input
            .file_stem()
            .map_or_else(|| "chart".into(), |s| s.to_string_lossy().into_owned());
        config.output_dir.join(stem)
    });
    if path.extension().is_none() {
        path.set_extension(config.format.extension());
    }
    path
}

fn render(input: &Path, output: &Path, config: &Config) -> Result<()> {
    let json = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let data = ChartData::from_json(&json)
        .with_context(|| format!("{} is not valid chart data", input.display()))?;
    debug!(kind = data.kind(), threshold = config.threshold, "chart data loaded");

    let figure = data.to_figure(&config.render_options())?;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    figure
        .save(output)
        .with_context(|| format!("failed to write {}", output.display()))?;
    Ok(())
}

fn run(cli: &Cli) -> Result<PathBuf> {
    let config = load_config(cli, Config::default_path().as_deref())?;
    let output = output_path(cli, &config);
    render(&cli.input, &output, &config)?;
    info!(output = %output.display(), "done");
    Ok(output)
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(path) => println!("{}", path.display()),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}
