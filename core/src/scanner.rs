//! The user-facing scanning facade.
//!
//! A [`Scanner`] bundles the three load-once pieces (catalog, model
//! config, classifier graph) and orchestrates the per-request pipeline:
//! resolve the input, apply the size short-circuits, extract features, run
//! the model, decide the final label. Identification never panics and
//! never fails a whole batch: per-request problems come back as the
//! result's status.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::config::ModelConfig;
use crate::decision::{self, OverwriteReason};
use crate::error::{Error, Result};
use crate::features::{FeatureVector, FeaturesOrRuled};
use crate::label::ContentType;
use crate::model::Classifier;
use crate::result::{Prediction, ScanResult, Status};
use crate::source::{FileSource, StreamWindows, WindowSource};

/// Path reported for in-memory and stream inputs.
const STDIN_PATH: &str = "-";

/// A loaded identification engine.
///
/// Immutable after construction and safe to share across threads; every
/// `identify_*` call keeps its own transient buffers.
pub struct Scanner {
    catalog: &'static Catalog,
    config: ModelConfig,
    classifier: Classifier,
    model_name: String,
}

impl Scanner {
    /// Load an engine from a model directory containing `config.json` and
    /// `model.onnx`.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let catalog = Catalog::bundled()?;
        let config = ModelConfig::load(&model_dir.join("config.json"), catalog)?;
        let classifier = Classifier::load(&model_dir.join("model.onnx"), &config)?;
        let model_name = model_dir
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("unnamed")
            .to_string();
        info!(
            "Scanner ready: model={model_name}, {} target labels",
            config.target_labels_space.len()
        );
        Ok(Scanner {
            catalog,
            config,
            classifier,
            model_name,
        })
    }

    /// Load through the process-wide cache: one engine per model
    /// directory, populated lazily and shared thereafter.
    pub fn shared(model_dir: &Path) -> Result<Arc<Scanner>> {
        static CACHE: OnceLock<Mutex<HashMap<PathBuf, Arc<Scanner>>>> = OnceLock::new();
        let cache = CACHE.get_or_init(|| Mutex::new(HashMap::new()));
        let mut cache = cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(scanner) = cache.get(model_dir) {
            return Ok(scanner.clone());
        }
        let scanner = Arc::new(Scanner::load(model_dir)?);
        cache.insert(model_dir.to_path_buf(), scanner.clone());
        Ok(scanner)
    }

    /// Identify an in-memory buffer.
    pub fn identify_bytes(&self, bytes: &[u8]) -> ScanResult {
        let mut source: &[u8] = bytes;
        self.finish(STDIN_PATH, self.identify_source(&mut source))
    }

    /// Identify the file at `path`, following symbolic links.
    pub fn identify_path(&self, path: &Path) -> ScanResult {
        self.identify_path_inner(path, true)
    }

    /// Identify `path` itself: symbolic links report as `symlink` instead
    /// of their target.
    pub fn identify_path_no_dereference(&self, path: &Path) -> ScanResult {
        self.identify_path_inner(path, false)
    }

    /// Identify a non-seekable stream of declared `length` without holding
    /// it in memory; only the leading and trailing `block_size` windows
    /// are retained.
    pub fn identify_stream<R: Read>(&self, mut reader: R, length: u64) -> ScanResult {
        let outcome = (|| {
            let mut windows = StreamWindows::from_reader(&mut reader, self.config.block_size)?;
            if windows.len() != length {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!(
                        "stream length mismatch: declared {length}, read {}",
                        windows.len()
                    ),
                )));
            }
            self.identify_source(&mut windows)
        })();
        self.finish(STDIN_PATH, outcome)
    }

    /// Identify many paths. Results preserve input order; a failing path
    /// never aborts the rest of the batch.
    pub fn identify_paths(&self, paths: &[PathBuf]) -> Vec<ScanResult> {
        paths.iter().map(|path| self.identify_path(path)).collect()
    }

    /// Labels the loaded model can emit, in score-index order.
    pub fn model_content_types(&self) -> Vec<ContentType> {
        self.config.target_labels_space.clone()
    }

    /// Labels a result's `output` field can carry.
    pub fn output_content_types(&self) -> Vec<ContentType> {
        let mut space: Vec<ContentType> = self
            .config
            .target_labels_space
            .iter()
            .map(|&label| self.config.overwrite(label))
            .collect();
        space.extend([
            ContentType::Txt,
            ContentType::Unknown,
            ContentType::Empty,
            ContentType::Directory,
            ContentType::Symlink,
            ContentType::Undefined,
        ]);
        space.sort_unstable();
        space.dedup();
        space
    }

    /// Name of the loaded model (its directory name).
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// The loaded model configuration.
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    fn identify_path_inner(&self, path: &Path, dereference: bool) -> ScanResult {
        let display = path.display().to_string();
        let outcome = (|| {
            let metadata = if dereference {
                std::fs::metadata(path)
            } else {
                std::fs::symlink_metadata(path)
            }?;
            if metadata.is_dir() {
                return self.ruled(ContentType::Directory);
            }
            if metadata.is_symlink() {
                return self.ruled(ContentType::Symlink);
            }
            let mut source = FileSource::open(path)?;
            self.identify_source(&mut source)
        })();
        self.finish(&display, outcome)
    }

    fn identify_source<S: WindowSource>(&self, source: &mut S) -> Result<Prediction> {
        let features = match FeaturesOrRuled::extract(source, &self.config)? {
            FeaturesOrRuled::Ruled(output) => return self.ruled(output),
            FeaturesOrRuled::Features(features) => features,
        };
        self.identify_features(&features)
    }

    /// Run the model stage on an already-extracted feature vector.
    pub fn identify_features(&self, features: &FeatureVector) -> Result<Prediction> {
        let prediction = self.classifier.predict(features)?;
        let (output, overwrite_reason) =
            decision::decide(&prediction, &self.config, self.catalog)?;
        Ok(Prediction {
            dl: self.catalog.info(prediction.label)?.clone(),
            output: self.catalog.info(output)?.clone(),
            score: prediction.score,
            overwrite_reason,
            scores_map: Some(prediction.scores_map),
        })
    }

    /// A rule-based result produced without running the model.
    fn ruled(&self, output: ContentType) -> Result<Prediction> {
        Ok(Prediction {
            dl: self.catalog.info(ContentType::Undefined)?.clone(),
            output: self.catalog.info(output)?.clone(),
            score: 1.0,
            overwrite_reason: OverwriteReason::None,
            scores_map: None,
        })
    }

    fn finish(&self, path: &str, outcome: Result<Prediction>) -> ScanResult {
        match outcome {
            Ok(prediction) => ScanResult::ok(path, prediction),
            Err(error) => {
                debug!("identification failed for {path}: {error}");
                ScanResult::error(path, Status::from_error(&error))
            }
        }
    }
}

/// Version of this crate, as reported to callers and bindings.
pub fn module_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
