//! storeforge: normalization and behavioral clustering of app store exports
//!
//! Raw Google Play and Apple App Store CSV exports are mapped to a canonical
//! schema with numeric installs, prices, sizes and ratings plus derived
//! monetization flags. The canonical Google table can then be clustered with a
//! seeded K-Means over standardized features and summarized per cluster.

pub mod cli;
pub mod coerce;
pub mod data;
pub mod error;
pub mod features;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod profile;
pub mod schema;
pub mod viz;

// Re-export public items for easier access
pub use cli::{Args, Command};
pub use error::{PipelineError, ProfileError};
pub use model::{fit_kmeans, KMeansConfig, KMeansModel};
pub use normalize::{normalize_apple, normalize_google, DropPolicy, NormalizeOptions, StoreKind};
pub use pipeline::{PipelineConfig, StageEvent};
pub use profile::{cluster_apps, cluster_csv, cluster_summary, ClusterProfile, ProfileOutcome};

/// Common result type used throughout the application
pub type Result<T> = anyhow::Result<T>;
