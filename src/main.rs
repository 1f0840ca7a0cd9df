//! storeforge: app store export normalization and behavioral clustering
//!
//! Each subcommand is an independent stage that reports what it processed or
//! why it was skipped.

use anyhow::Result;
use clap::Parser;
use std::time::Instant;
use storeforge::{pipeline, Args, Command};

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "storeforge=debug"
    } else {
        "storeforge=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    let config = args.pipeline_config();
    let start_time = Instant::now();

    let events = match &args.command {
        Command::Normalize { .. } => {
            pipeline::run_normalize(&config, &args.command.normalize_options())?
        }
        Command::Visualize => pipeline::run_visualize(&config)?,
        Command::Profile { .. } => pipeline::run_profile(&config, &args.command.kmeans_config())?,
    };

    for event in &events {
        println!("{event}");
    }

    if args.verbose {
        println!(
            "\nTotal processing time: {:.2}s",
            start_time.elapsed().as_secs_f64()
        );
    }

    Ok(())
}
