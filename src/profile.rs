//! Behavioral profiling: cluster canonical rows and summarize each cluster

use std::path::Path;

use polars::prelude::*;
use tracing::{info, warn};

use crate::data::{has_column, numeric_values, read_csv_table};
use crate::error::PipelineError;
use crate::features::{build_feature_matrix, select_features, FeatureMatrix};
use crate::model::{fit_kmeans, KMeansConfig, KMeansModel};
use crate::schema::fields;

/// Columns summarized per cluster by their median
pub const SUMMARY_COLUMNS: [&str; 3] = [fields::INSTALLS, fields::RATING, fields::PRICE];

/// A clustered table and everything derived while clustering it
#[derive(Debug)]
pub struct ClusterProfile {
    /// Input rows with an added `cluster` column
    pub table: DataFrame,
    /// One row per cluster, ordered by cluster id
    pub summary: DataFrame,
    pub features: FeatureMatrix,
    pub model: KMeansModel,
}

#[derive(Debug)]
pub enum ProfileOutcome {
    Clustered(Box<ClusterProfile>),
    /// None of the candidate features exist; the input is returned unchanged
    NoUsableFeatures(DataFrame),
}

/// Assign every row of a canonical Google table to one of
/// `config.n_clusters` clusters and summarize the result.
pub fn cluster_apps(df: &DataFrame, config: &KMeansConfig) -> crate::Result<ProfileOutcome> {
    let names = select_features(df);
    if names.is_empty() {
        warn!("no usable columns for clustering");
        return Ok(ProfileOutcome::NoUsableFeatures(df.clone()));
    }
    config.validate(df.height())?;

    let features = build_feature_matrix(df, names)?;
    let model = fit_kmeans(&features.scaled, config)?;
    let labels: Vec<u32> = model.labels.iter().map(|&label| label as u32).collect();

    let mut table = df.clone();
    table.with_column(Series::new(fields::CLUSTER.into(), labels))?;
    let summary = cluster_summary(&table)?;

    info!(
        rows = table.height(),
        clusters = config.n_clusters,
        features = ?features.names,
        inertia = model.inertia,
        "clustered apps"
    );

    Ok(ProfileOutcome::Clustered(Box::new(ClusterProfile {
        table,
        summary,
        features,
        model,
    })))
}

/// Load a canonical table from disk and cluster it
pub fn cluster_csv(path: &Path, config: &KMeansConfig) -> crate::Result<ProfileOutcome> {
    if !path.exists() {
        return Err(PipelineError::MissingSource {
            path: path.to_path_buf(),
        }
        .into());
    }

    let df = read_csv_table(path)?;
    cluster_apps(&df, config)
}

/// Per-cluster medians of Installs, Rating and Price plus a row count.
///
/// A summary column whose source column is absent reports the row count
/// instead of a median.
pub fn cluster_summary(clustered: &DataFrame) -> crate::Result<DataFrame> {
    let mut columns = vec![clustered.column(fields::CLUSTER)?.clone()];
    for name in SUMMARY_COLUMNS {
        if has_column(clustered, name) {
            let values = numeric_values(clustered, name)?;
            columns.push(Series::new(name.into(), values).into_column());
        }
    }
    let frame = DataFrame::new(columns)?;

    let mut aggs: Vec<Expr> = SUMMARY_COLUMNS
        .iter()
        .map(|&name| {
            let agg = if has_column(&frame, name) {
                col(name).median()
            } else {
                len()
            };
            agg.alias(name)
        })
        .collect();
    aggs.push(len().alias("count"));

    let summary = frame
        .lazy()
        .group_by([col(fields::CLUSTER)])
        .agg(aggs)
        .sort([fields::CLUSTER], SortMultipleOptions::default())
        .collect()?;
    Ok(summary)
}
