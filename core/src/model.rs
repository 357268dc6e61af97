//! ONNX classifier loading and evaluation.
//!
//! The graph is a single-input, single-output classifier: an int32 feature
//! tensor `[1, feature_len]` in, a float probability tensor
//! `[1, n_labels]` out, with index `i` of the output scored against
//! position `i` of the config's `target_labels_space`. tract is a pure
//! Rust runtime: evaluation is deterministic and performs no telemetry.

use std::collections::BTreeMap;
use std::path::Path;

use tract_onnx::prelude::*;
use tracing::info;

use crate::config::ModelConfig;
use crate::error::{Error, Result};
use crate::features::FeatureVector;
use crate::label::ContentType;

/// A loaded classifier graph ready for evaluation.
///
/// Immutable after load; [`Classifier::predict`] borrows `&self` and owns
/// its input and output buffers, so one instance serves concurrent
/// requests.
pub struct Classifier {
    runner: TypedRunnableModel<TypedModel>,
    feature_len: usize,
    labels: Vec<ContentType>,
}

/// The raw model output for one input.
#[derive(Debug, Clone)]
pub struct ModelPrediction {
    /// Argmax label. Ties break to the earliest index.
    pub label: ContentType,
    /// The argmax score.
    pub score: f32,
    /// Every label of the target space with its score.
    pub scores_map: BTreeMap<ContentType, f32>,
}

impl Classifier {
    /// Load and optimise a serialized ONNX graph from `path`.
    pub fn load(path: &Path, config: &ModelConfig) -> Result<Self> {
        info!("Loading ONNX classifier from {}", path.display());
        let runner = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(|e| Error::ModelRuntime(format!("cannot load {}: {e}", path.display())))?
            .into_optimized()
            .map_err(|e| Error::ModelRuntime(format!("model optimisation failed: {e}")))?
            .into_runnable()
            .map_err(|e| Error::ModelRuntime(format!("cannot make model runnable: {e}")))?;
        Ok(Self::new(runner, config))
    }

    /// Load a serialized ONNX graph from an in-memory buffer.
    pub fn from_bytes(graph: &[u8], config: &ModelConfig) -> Result<Self> {
        let runner = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(graph))
            .map_err(|e| Error::ModelRuntime(format!("cannot load model graph: {e}")))?
            .into_optimized()
            .map_err(|e| Error::ModelRuntime(format!("model optimisation failed: {e}")))?
            .into_runnable()
            .map_err(|e| Error::ModelRuntime(format!("cannot make model runnable: {e}")))?;
        Ok(Self::new(runner, config))
    }

    fn new(runner: TypedRunnableModel<TypedModel>, config: &ModelConfig) -> Self {
        Classifier {
            runner,
            feature_len: config.feature_len(),
            labels: config.target_labels_space.clone(),
        }
    }

    /// Evaluate the classifier on one feature vector.
    pub fn predict(&self, features: &FeatureVector) -> Result<ModelPrediction> {
        if features.len() != self.feature_len {
            return Err(Error::ModelConfigMismatch {
                expected: self.feature_len,
                actual: features.len(),
            });
        }
        let input: Tensor = tract_ndarray::Array2::from_shape_vec(
            (1, features.len()),
            features.as_slice().to_vec(),
        )
        .map_err(|e| Error::ModelRuntime(e.to_string()))?
        .into();
        let result = self
            .runner
            .run(tvec![input.into()])
            .map_err(|e| Error::ModelRuntime(format!("inference failed: {e}")))?;
        let output = result[0]
            .to_array_view::<f32>()
            .map_err(|e| Error::ModelRuntime(format!("cannot read output tensor: {e}")))?;
        let scores: Vec<f32> = output.iter().copied().collect();
        if scores.len() != self.labels.len() {
            return Err(Error::ModelConfigMismatch {
                expected: self.labels.len(),
                actual: scores.len(),
            });
        }

        let mut best = 0;
        for (i, &score) in scores.iter().enumerate() {
            if score > scores[best] {
                best = i;
            }
        }
        let scores_map = self
            .labels
            .iter()
            .copied()
            .zip(scores.iter().copied())
            .collect();
        Ok(ModelPrediction {
            label: self.labels[best],
            score: scores[best],
            scores_map,
        })
    }

    /// Feature-vector length the graph expects.
    pub fn feature_len(&self) -> usize {
        self.feature_len
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::catalog::Catalog;

    fn reference_model_dir() -> std::path::PathBuf {
        std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../models/standard-v1")
    }

    /// Smoke-test classifier loading and evaluation.
    ///
    /// Only runs when the reference ONNX graph has been fetched into the
    /// model directory.
    #[test]
    fn test_load_and_predict_reference_model() {
        let dir = reference_model_dir();
        let graph = dir.join("model.onnx");
        if !graph.exists() {
            eprintln!("Skipping model test: {} not found", graph.display());
            return;
        }
        let catalog = Catalog::bundled().unwrap();
        let config = ModelConfig::load(&dir.join("config.json"), catalog).unwrap();
        let classifier = Classifier::load(&graph, &config).unwrap();
        assert_eq!(classifier.feature_len(), config.feature_len());

        // All-padding input must still produce a well-formed distribution.
        let mut empty: &[u8] = b"";
        let features = FeatureVector::extract(&mut empty, &config).unwrap();
        let prediction = classifier.predict(&features).unwrap();
        assert_eq!(prediction.scores_map.len(), config.target_labels_space.len());
        assert!((0.0..=1.0).contains(&prediction.score));
        let max = prediction
            .scores_map
            .values()
            .fold(f32::NEG_INFINITY, |a, &b| a.max(b));
        assert_eq!(prediction.score, max);
        assert_eq!(prediction.scores_map[&prediction.label], prediction.score);
        let sum: f32 = prediction.scores_map.values().sum();
        assert!((sum - 1.0).abs() < 1e-3, "scores sum to {sum}");
    }

    #[test]
    fn test_feature_length_mismatch_rejected() {
        let dir = reference_model_dir();
        let graph = dir.join("model.onnx");
        if !graph.exists() {
            eprintln!("Skipping model test: {} not found", graph.display());
            return;
        }
        let catalog = Catalog::bundled().unwrap();
        let config = ModelConfig::load(&dir.join("config.json"), catalog).unwrap();
        let classifier = Classifier::load(&graph, &config).unwrap();

        let mut short_config = config.clone();
        short_config.beg_size = 4;
        short_config.end_size = 4;
        short_config.thresholds = BTreeMap::new();
        let mut source: &[u8] = b"0123456789abcdef";
        let features = FeatureVector::extract(&mut source, &short_config).unwrap();
        assert!(matches!(
            classifier.predict(&features),
            Err(Error::ModelConfigMismatch { .. })
        ));
    }
}
