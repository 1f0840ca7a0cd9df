//! Feature selection and standardization for clustering

use linfa::prelude::*;
use linfa_preprocessing::linear_scaling::LinearScaler;
use ndarray::{Array1, Array2};
use polars::prelude::DataFrame;
use tracing::debug;

use crate::data::{has_column, numeric_values};
use crate::schema::fields;

/// Candidate clustering features, in the order they are used
pub const CANDIDATE_FEATURES: [&str; 5] = [
    fields::LOG_INSTALLS,
    fields::RATING,
    fields::PRICE,
    fields::REVIEWS,
    fields::SIZE_MB,
];

/// Standardized feature matrix built from a canonical table
#[derive(Debug)]
pub struct FeatureMatrix {
    /// Names of the selected columns, one per matrix column
    pub names: Vec<String>,
    /// Zero-filled values before scaling
    pub raw: Array2<f64>,
    /// Standardized values (n_rows, n_features)
    pub scaled: Array2<f64>,
    /// Fitted z-score scaler (population standard deviation)
    pub scaler: LinearScaler<f64>,
}

impl FeatureMatrix {
    pub fn n_rows(&self) -> usize {
        self.scaled.nrows()
    }
}

/// Candidate features present in `df`, in candidate order
pub fn select_features(df: &DataFrame) -> Vec<String> {
    CANDIDATE_FEATURES
        .iter()
        .filter(|name| has_column(df, name))
        .map(|name| name.to_string())
        .collect()
}

/// Build the standardized matrix over the named columns.
///
/// Missing values are filled with 0 before scaling. A zero-variance column is
/// centred and left unscaled.
pub fn build_feature_matrix(df: &DataFrame, names: Vec<String>) -> crate::Result<FeatureMatrix> {
    let n_rows = df.height();
    let mut raw = Array2::<f64>::zeros((n_rows, names.len()));
    for (j, name) in names.iter().enumerate() {
        let values = numeric_values(df, name)?;
        for (i, value) in values.into_iter().enumerate() {
            raw[[i, j]] = value.unwrap_or(0.0);
        }
    }

    let dataset = Dataset::new(raw.clone(), Array1::<usize>::zeros(n_rows));
    let scaler = LinearScaler::standard().fit(&dataset)?;
    let scaled = scaler.transform(raw.clone());
    debug!(features = ?names, rows = n_rows, "prepared feature matrix");

    Ok(FeatureMatrix {
        names,
        raw,
        scaled,
        scaler,
    })
}
