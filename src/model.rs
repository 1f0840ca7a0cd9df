//! Seeded K-Means clustering over standardized features

use linfa::prelude::*;
use linfa_clustering::KMeans;
use linfa_nn::distance::L2Dist;
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::ProfileError;

/// Parameters for a clustering run
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansConfig {
    /// Number of clusters
    pub n_clusters: usize,
    /// Seed for centroid initialization
    pub seed: u64,
    /// Maximum iterations per run
    pub max_iters: u64,
    /// Convergence tolerance on centroid movement
    pub tolerance: f64,
    /// Independent initializations; the lowest-inertia run wins
    pub n_runs: usize,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            n_clusters: 5,
            seed: 42,
            max_iters: 300,
            tolerance: 1e-4,
            n_runs: 10,
        }
    }
}

impl KMeansConfig {
    /// Check that `n_rows` rows can be split into `n_clusters` clusters
    pub fn validate(&self, n_rows: usize) -> Result<(), ProfileError> {
        if self.n_clusters == 0 {
            return Err(ProfileError::InvalidClusterCount);
        }
        if n_rows < self.n_clusters {
            return Err(ProfileError::TooFewRows {
                rows: n_rows,
                clusters: self.n_clusters,
            });
        }
        Ok(())
    }
}

/// K-Means model wrapper with fitted parameters
#[derive(Debug)]
pub struct KMeansModel {
    pub model: KMeans<f64, L2Dist>,
    pub n_clusters: usize,
    /// Cluster assignment per input row
    pub labels: Array1<usize>,
    /// Centroids in standardized space
    pub centroids: Array2<f64>,
    /// Within-cluster sum of squares
    pub inertia: f64,
}

impl KMeansModel {
    /// Rows per cluster, indexed by cluster id
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.n_clusters];
        for &label in self.labels.iter() {
            if label < self.n_clusters {
                sizes[label] += 1;
            }
        }
        sizes
    }
}

/// Fit K-Means on a standardized feature matrix.
///
/// The generator is seeded from `config.seed`, so the same matrix always
/// yields the same labels.
pub fn fit_kmeans(features: &Array2<f64>, config: &KMeansConfig) -> crate::Result<KMeansModel> {
    config.validate(features.nrows())?;

    let n_samples = features.nrows();
    let targets: Array1<usize> = Array1::zeros(n_samples);
    let dataset = Dataset::new(features.clone(), targets);

    let rng = StdRng::seed_from_u64(config.seed);
    let model = KMeans::params_with(config.n_clusters, rng, L2Dist)
        .max_n_iterations(config.max_iters)
        .tolerance(config.tolerance)
        .n_runs(config.n_runs)
        .fit(&dataset)?;

    let labels = model.predict(&dataset);
    let centroids = model.centroids().clone();
    let inertia = compute_inertia(features, &labels, &centroids);

    Ok(KMeansModel {
        model,
        n_clusters: config.n_clusters,
        labels,
        centroids,
        inertia,
    })
}

/// Compute within-cluster sum of squares (inertia)
fn compute_inertia(features: &Array2<f64>, labels: &Array1<usize>, centroids: &Array2<f64>) -> f64 {
    labels
        .iter()
        .enumerate()
        .filter(|(_, &cluster)| cluster < centroids.nrows())
        .map(|(i, &cluster)| {
            features
                .row(i)
                .iter()
                .zip(centroids.row(cluster).iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum::<f64>()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_blobs() -> Array2<f64> {
        Array2::from_shape_vec(
            (8, 2),
            vec![
                -2.0, -2.1, -2.2, -1.9, -1.8, -2.0, -2.1, -2.2, //
                2.0, 2.1, 2.2, 1.9, 1.8, 2.0, 2.1, 2.2,
            ],
        )
        .unwrap()
    }

    fn config(k: usize) -> KMeansConfig {
        KMeansConfig {
            n_clusters: k,
            ..KMeansConfig::default()
        }
    }

    #[test]
    fn test_fit_kmeans_separates_blobs() {
        let model = fit_kmeans(&two_blobs(), &config(2)).unwrap();

        assert_eq!(model.labels.len(), 8);
        assert_eq!(model.centroids.shape(), &[2, 2]);
        let first = model.labels[0];
        assert!(model.labels.iter().take(4).all(|&l| l == first));
        assert!(model.labels.iter().skip(4).all(|&l| l != first));
        assert_eq!(model.cluster_sizes(), {
            let mut sizes = vec![0, 0];
            sizes[first] = 4;
            sizes[1 - first] = 4;
            sizes
        });
    }

    #[test]
    fn test_fixed_seed_is_reproducible() {
        let data = two_blobs();
        let a = fit_kmeans(&data, &config(3)).unwrap();
        let b = fit_kmeans(&data, &config(3)).unwrap();

        assert_eq!(a.labels, b.labels);
        assert_eq!(a.centroids, b.centroids);
    }

    #[test]
    fn test_inertia_is_finite_and_non_negative() {
        let model = fit_kmeans(&two_blobs(), &config(2)).unwrap();
        assert!(model.inertia >= 0.0);
        assert!(model.inertia.is_finite());
    }

    #[test]
    fn test_invalid_cluster_counts() {
        let data = two_blobs();

        let err = fit_kmeans(&data, &config(0)).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ProfileError>(),
            Some(&ProfileError::InvalidClusterCount)
        );

        let err = fit_kmeans(&data, &config(9)).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ProfileError>(),
            Some(&ProfileError::TooFewRows { rows: 8, clusters: 9 })
        );
    }
}
