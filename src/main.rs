use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use tailpipe::config::{self, LoggingConfig};
use tailpipe::pipeline::{Pipeline, PipelineConfig, DEFAULT_LINE_COUNT};
use tailpipe::signal;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tailpipe")]
#[command(about = "Tail and follow structured log files with pretty-printed output", long_about = None)]
struct Args {
    /// Log file to read
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Number of historical lines to print
    #[arg(short = 'n', long = "number", default_value_t = DEFAULT_LINE_COUNT)]
    number: usize,

    /// Keep printing lines as they are appended (similar to `tail -f`)
    #[arg(short = 'f', long = "follow")]
    follow: bool,

    /// App config file (JSON) carrying the logging transport list
    #[arg(long = "config", value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("tailpipe=warn".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let logging = match &args.config {
        Some(path) => config::load(path)?.logging,
        None => LoggingConfig::default(),
    };

    let pipeline_config = PipelineConfig::new(&args.file)
        .line_count(args.number)
        .follow(args.follow);
    let mut pipeline = Pipeline::new(pipeline_config, logging);

    signal::register_shutdown(&pipeline.cancel_flag())
        .context("Failed to install signal handlers")?;

    let mut stdout = std::io::stdout().lock();
    match pipeline.run(&mut stdout) {
        Ok(summary) => {
            if let Some(warning) = summary.warning {
                eprintln!("{}", warning.yellow());
            }
            Ok(())
        }
        Err(err) => {
            eprintln!("{} {}", "error:".red().bold(), err);
            std::process::exit(1);
        }
    }
}
