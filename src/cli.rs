//! Command-line interface definitions and argument parsing

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::model::KMeansConfig;
use crate::normalize::{DropPolicy, NormalizeOptions};
use crate::pipeline::PipelineConfig;

/// Normalize app store exports and profile apps by behavioral cluster
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding the raw exports
    #[arg(long, global = true, default_value = "data")]
    pub data_dir: PathBuf,

    /// Directory receiving cleaned tables and plots
    #[arg(long, global = true, default_value = "outputs")]
    pub out_dir: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Clean the Google Play and Apple App Store exports
    Normalize {
        /// Which Google rows without an app identity are dropped
        #[arg(long, value_enum, default_value_t = CliDropPolicy::Both)]
        drop_unidentified: CliDropPolicy,
    },
    /// Render exploratory plots from the cleaned tables
    Visualize,
    /// Cluster the cleaned Google table
    Profile {
        /// Number of clusters for K-Means
        #[arg(short = 'k', long, default_value = "5")]
        clusters: usize,

        /// Seed for centroid initialization
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Maximum iterations for K-Means algorithm
        #[arg(long, default_value = "300")]
        max_iters: u64,

        /// Tolerance for K-Means convergence
        #[arg(long, default_value = "1e-4")]
        tolerance: f64,
    },
}

/// CLI-compatible drop policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliDropPolicy {
    /// Drop rows missing both App and Category
    Both,
    /// Drop rows missing App or Category
    Any,
}

impl From<CliDropPolicy> for DropPolicy {
    fn from(cli: CliDropPolicy) -> Self {
        match cli {
            CliDropPolicy::Both => DropPolicy::BothMissing,
            CliDropPolicy::Any => DropPolicy::AnyMissing,
        }
    }
}

impl Args {
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            data_dir: self.data_dir.clone(),
            out_dir: self.out_dir.clone(),
        }
    }
}

impl Command {
    pub fn normalize_options(&self) -> NormalizeOptions {
        match self {
            Command::Normalize { drop_unidentified } => NormalizeOptions {
                drop_policy: (*drop_unidentified).into(),
            },
            _ => NormalizeOptions::default(),
        }
    }

    pub fn kmeans_config(&self) -> KMeansConfig {
        match self {
            Command::Profile {
                clusters,
                seed,
                max_iters,
                tolerance,
            } => KMeansConfig {
                n_clusters: *clusters,
                seed: *seed,
                max_iters: *max_iters,
                tolerance: *tolerance,
                ..KMeansConfig::default()
            },
            _ => KMeansConfig::default(),
        }
    }
}
