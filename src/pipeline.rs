//! Stage runners: normalize, visualize and profile
//!
//! Each stage locates its inputs, runs the core, persists artifacts and
//! reports what it did. A missing prerequisite is reported as
//! [`StageEvent::Skipped`] rather than an error.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::data::{read_csv_table, write_csv_table};
use crate::model::KMeansConfig;
use crate::normalize::{NormalizeOptions, StoreKind};
use crate::profile::{cluster_csv, ProfileOutcome};
use crate::viz;

pub const CLUSTERED_FILE: &str = "gp_clustered.csv";

/// Working-directory relative locations of inputs and artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub out_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            out_dir: PathBuf::from("outputs"),
        }
    }
}

impl PipelineConfig {
    pub fn raw_path(&self, store: StoreKind) -> PathBuf {
        self.data_dir.join(store.raw_file_name())
    }

    pub fn cleaned_path(&self, store: StoreKind) -> PathBuf {
        self.out_dir.join(store.cleaned_file_name())
    }

    pub fn clustered_path(&self) -> PathBuf {
        self.out_dir.join(CLUSTERED_FILE)
    }

    fn ensure_out_dir(&self) -> crate::Result<()> {
        fs::create_dir_all(&self.out_dir)?;
        Ok(())
    }
}

/// What a stage did for one source or artifact
#[derive(Debug, Clone, PartialEq)]
pub enum StageEvent {
    Saved { path: PathBuf },
    Summary { text: String },
    /// Quality of a clustering run
    ClusterFit { inertia: f64, sizes: Vec<usize> },
    Skipped { reason: String },
}

impl fmt::Display for StageEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageEvent::Saved { path } => write!(f, "Saved {}", display_name(path)),
            StageEvent::Summary { text } => write!(f, "Cluster summary:\n{text}"),
            StageEvent::ClusterFit { inertia, sizes } => {
                write!(f, "Inertia: {inertia:.4}; cluster sizes: {sizes:?}")
            }
            StageEvent::Skipped { reason } => f.write_str(reason),
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn skipped(reason: String) -> StageEvent {
    warn!("{reason}");
    StageEvent::Skipped { reason }
}

/// Normalize every raw export present in the data directory
pub fn run_normalize(
    config: &PipelineConfig,
    options: &NormalizeOptions,
) -> crate::Result<Vec<StageEvent>> {
    let present: Vec<StoreKind> = StoreKind::ALL
        .into_iter()
        .filter(|store| config.raw_path(*store).exists())
        .collect();

    if present.is_empty() {
        return Ok(vec![skipped(format!(
            "Place {} and/or {} into the {} folder.",
            StoreKind::Google.raw_file_name(),
            StoreKind::Apple.raw_file_name(),
            config.data_dir.display()
        ))]);
    }

    config.ensure_out_dir()?;
    let mut events = Vec::with_capacity(present.len());
    for store in present {
        let raw = read_csv_table(&config.raw_path(store))?;
        let mut cleaned = store.normalize(&raw, options)?;

        let path = config.cleaned_path(store);
        write_csv_table(&mut cleaned, &path)?;
        info!(
            store = store.label(),
            rows = cleaned.height(),
            path = %path.display(),
            "saved canonical table"
        );
        events.push(StageEvent::Saved { path });
    }

    Ok(events)
}

/// Render plots for every canonical artifact present
pub fn run_visualize(config: &PipelineConfig) -> crate::Result<Vec<StageEvent>> {
    let mut events = Vec::new();

    for store in StoreKind::ALL {
        let cleaned = config.cleaned_path(store);
        if !cleaned.exists() {
            events.push(skipped(format!(
                "{} not found; run normalize first.",
                store.cleaned_file_name()
            )));
            continue;
        }

        config.ensure_out_dir()?;
        let df = read_csv_table(&cleaned)?;
        let written = match store {
            StoreKind::Google => viz::plot_google_summary(&df, &config.out_dir)?,
            StoreKind::Apple => viz::plot_apple_summary(&df, &config.out_dir)?,
        };
        info!(store = store.label(), plots = written.len(), "plots saved");
        events.extend(written.into_iter().map(|path| StageEvent::Saved { path }));
    }

    Ok(events)
}

/// Cluster the canonical Google table and persist the labelled rows
pub fn run_profile(
    config: &PipelineConfig,
    kmeans: &KMeansConfig,
) -> crate::Result<Vec<StageEvent>> {
    let cleaned = config.cleaned_path(StoreKind::Google);
    if !cleaned.exists() {
        return Ok(vec![skipped(format!(
            "{} not found; run normalize first.",
            StoreKind::Google.cleaned_file_name()
        ))]);
    }

    match cluster_csv(&cleaned, kmeans)? {
        ProfileOutcome::NoUsableFeatures(_) => {
            Ok(vec![skipped("No usable columns for clustering.".to_string())])
        }
        ProfileOutcome::Clustered(mut profile) => {
            config.ensure_out_dir()?;
            let path = config.clustered_path();
            write_csv_table(&mut profile.table, &path)?;

            Ok(vec![
                StageEvent::Summary {
                    text: profile.summary.to_string(),
                },
                StageEvent::ClusterFit {
                    inertia: profile.model.inertia,
                    sizes: profile.model.cluster_sizes(),
                },
                StageEvent::Saved { path },
            ])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config_in(root: &Path) -> PipelineConfig {
        PipelineConfig {
            data_dir: root.join("data"),
            out_dir: root.join("outputs"),
        }
    }

    #[test]
    fn test_default_locations() {
        let config = PipelineConfig::default();
        assert_eq!(
            config.raw_path(StoreKind::Google),
            PathBuf::from("data/google_playstore.csv")
        );
        assert_eq!(
            config.cleaned_path(StoreKind::Apple),
            PathBuf::from("outputs/cleaned_apple.csv")
        );
        assert_eq!(config.clustered_path(), PathBuf::from("outputs/gp_clustered.csv"));
    }

    #[test]
    fn test_normalize_without_inputs_is_skipped() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());

        let events = run_normalize(&config, &NormalizeOptions::default()).unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], StageEvent::Skipped { .. }));
        assert!(!config.out_dir.exists());
    }

    #[test]
    fn test_visualize_and_profile_without_artifacts_are_skipped() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());

        let events = run_visualize(&config).unwrap();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| matches!(e, StageEvent::Skipped { .. })));

        let events = run_profile(&config, &KMeansConfig::default()).unwrap();
        assert_eq!(
            events,
            vec![StageEvent::Skipped {
                reason: "cleaned_google.csv not found; run normalize first.".to_string()
            }]
        );
    }

    #[test]
    fn test_event_display() {
        let saved = StageEvent::Saved {
            path: PathBuf::from("outputs/cleaned_google.csv"),
        };
        assert_eq!(saved.to_string(), "Saved cleaned_google.csv");

        let fit = StageEvent::ClusterFit {
            inertia: 1.5,
            sizes: vec![3, 1],
        };
        assert_eq!(fit.to_string(), "Inertia: 1.5000; cluster sizes: [3, 1]");
    }

    #[test]
    fn test_profile_reports_cluster_fit() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());
        fs::create_dir_all(&config.out_dir).unwrap();
        fs::write(
            config.cleaned_path(StoreKind::Google),
            "App,Installs,Rating\na,10,3.0\nb,20,3.1\nc,1000000,4.8\nd,2000000,4.9\n",
        )
        .unwrap();

        let kmeans = KMeansConfig {
            n_clusters: 2,
            ..KMeansConfig::default()
        };
        let events = run_profile(&config, &kmeans).unwrap();
        assert_eq!(events.len(), 3);
        match &events[1] {
            StageEvent::ClusterFit { inertia, sizes } => {
                assert!(inertia.is_finite() && *inertia >= 0.0);
                assert_eq!(sizes.iter().sum::<usize>(), 4);
                assert_eq!(sizes.len(), 2);
            }
            other => panic!("expected cluster fit, got {other:?}"),
        }
        assert!(config.clustered_path().exists());
    }
}
