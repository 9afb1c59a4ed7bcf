//! Interval forecaster: offline training, the versioned artifact, and the
//! narrow `GapModel` seam the scheduler predicts through.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::arimax::{ArimaxCoefficients, ArimaxModel};
use crate::error::ModelError;
use crate::review::GapSample;

/// Bumped whenever the artifact layout changes incompatibly.
pub const ARTIFACT_VERSION: u32 = 1;

pub const ARIMAX_FAMILY: &str = "arimax(1,1,1)";

/// Anything that can turn a recall point into a predicted gap in days.
///
/// Implementations must not mutate internal state when predicting, so one
/// loaded model can be shared by every caller.
pub trait GapModel: Send + Sync {
    fn predict(&self, recall_point: i64) -> f64;
}

impl GapModel for ArimaxModel {
    fn predict(&self, recall_point: i64) -> f64 {
        self.forecast_one(recall_point as f64)
    }
}

/// A loaded, read-only forecaster.
pub type Forecaster = Arc<dyn GapModel>;

/// Serialized form of a trained forecaster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub model_family: String,
    pub trained_at: DateTime<Utc>,
    pub samples: usize,
    /// In-sample mean absolute error, in days.
    pub mae: f64,
    pub model: ArimaxModel,
}

#[derive(Deserialize)]
struct VersionHeader {
    format_version: u32,
}

/// Training-quality summary printed after a fit. Not an acceptance gate.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    pub samples: usize,
    pub coefficients: ArimaxCoefficients,
    pub css: f64,
    pub mae: f64,
    pub iterations: usize,
}

/// Fit the forecaster on an ordered gap series.
pub fn train(samples: &[GapSample], trained_at: DateTime<Utc>) -> Result<(ModelArtifact, TrainingReport), ModelError> {
    let y: Vec<f64> = samples.iter().map(|s| s.days_since_last_review).collect();
    let x: Vec<f64> = samples.iter().map(|s| s.recall_point as f64).collect();

    let (model, summary) = ArimaxModel::fit(&y, &x)?;
    log::info!(
        "fitted {} on {} samples: beta={:.4} phi={:.4} theta={:.4} mae={:.4}",
        ARIMAX_FAMILY,
        summary.samples,
        model.coefficients.beta,
        model.coefficients.phi,
        model.coefficients.theta,
        summary.mae
    );

    let report = TrainingReport {
        samples: summary.samples,
        coefficients: model.coefficients,
        css: summary.css,
        mae: summary.mae,
        iterations: summary.iterations,
    };
    let artifact = ModelArtifact {
        format_version: ARTIFACT_VERSION,
        model_family: ARIMAX_FAMILY.to_string(),
        trained_at,
        samples: summary.samples,
        mae: summary.mae,
        model,
    };
    Ok((artifact, report))
}

pub fn save_artifact(path: impl AsRef<Path>, artifact: &ModelArtifact) -> Result<(), ModelError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(artifact)?;
    fs::write(path, json)?;
    Ok(())
}

/// Read an artifact, rejecting any other format version before decoding the body.
pub fn load_artifact(path: impl AsRef<Path>) -> Result<ModelArtifact, ModelError> {
    let raw = fs::read_to_string(path.as_ref())?;
    let header: VersionHeader = serde_json::from_str(&raw)?;
    if header.format_version != ARTIFACT_VERSION {
        return Err(ModelError::VersionMismatch {
            expected: ARTIFACT_VERSION,
            found: header.format_version,
        });
    }
    Ok(serde_json::from_str(&raw)?)
}

/// Load the forecaster for this process, or `None` when it is unavailable.
///
/// Absence is recoverable: the scheduler falls back to its fixed offset.
pub fn load_forecaster(path: impl AsRef<Path>) -> Option<Forecaster> {
    let path = path.as_ref();
    match load_artifact(path) {
        Ok(artifact) => {
            log::info!(
                "loaded {} forecaster from {} (trained {}, mae {:.3})",
                artifact.model_family,
                path.display(),
                artifact.trained_at.to_rfc3339(),
                artifact.mae
            );
            Some(Arc::new(artifact.model))
        }
        Err(e) => {
            log::warn!("forecaster unavailable ({}): {e}", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn samples() -> Vec<GapSample> {
        (0..40)
            .map(|i| {
                let rp = (i % 4) as i64;
                GapSample {
                    days_since_last_review: 0.5 + rp as f64 + ((i * 13) % 7) as f64 * 0.01,
                    recall_point: rp,
                }
            })
            .collect()
    }

    fn trained_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn train_reports_quality_and_versions_artifact() {
        let (artifact, report) = train(&samples(), trained_at()).unwrap();
        assert_eq!(artifact.format_version, ARTIFACT_VERSION);
        assert_eq!(artifact.model_family, ARIMAX_FAMILY);
        assert_eq!(report.samples, 40);
        assert!(report.mae >= 0.0 && report.mae < 0.5, "mae={}", report.mae);
    }

    #[test]
    fn artifact_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("model.json");

        let (artifact, _) = train(&samples(), trained_at()).unwrap();
        save_artifact(&path, &artifact).unwrap();

        let back = load_artifact(&path).unwrap();
        assert_eq!(back.samples, artifact.samples);
        assert_eq!(back.trained_at, artifact.trained_at);

        let f = load_forecaster(&path).expect("forecaster should load");
        assert!((f.predict(2) - artifact.model.predict(2)).abs() < 1e-9);
    }

    #[test]
    fn missing_or_corrupt_artifact_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_forecaster(dir.path().join("absent.json")).is_none());

        let bad = dir.path().join("bad.json");
        fs::write(&bad, "{ not json").unwrap();
        assert!(matches!(load_artifact(&bad), Err(ModelError::Json(_))));
        assert!(load_forecaster(&bad).is_none());
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.json");
        fs::write(&path, r#"{"format_version": 0, "anything": true}"#).unwrap();

        match load_artifact(&path) {
            Err(ModelError::VersionMismatch { expected, found }) => {
                assert_eq!(expected, ARTIFACT_VERSION);
                assert_eq!(found, 0);
            }
            other => panic!("expected version mismatch, got {other:?}"),
        }
        assert!(load_forecaster(&path).is_none());
    }
}
