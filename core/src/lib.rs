//! deeptype-core: content-type identification with deep learning.
//!
//! Given bytes (from memory, a file path, or a stream), the engine returns
//! a content-type label such as `python`, `pdf`, or `elf`, or a generic
//! fallback (`txt`, `unknown`, `empty`, `directory`, `symlink`). Unlike
//! magic-number tooling, identification runs a compact neural classifier
//! over a deterministic feature vector sampled from a bounded window of
//! the input, so cost is independent of input size.
//!
//! The pipeline, in stage order:
//!
//! 1. [`Catalog`] and [`ModelConfig`] load once per engine and stay
//!    immutable.
//! 2. [`FeatureVector`] extraction samples trimmed, aligned byte windows
//!    from any [`WindowSource`] (buffer, file, or bounded stream).
//! 3. [`Classifier`] evaluates the ONNX graph into per-label scores.
//! 4. The decision stage applies the overwrite map and confidence
//!    thresholds to pick the final label.
//!
//! [`Scanner`] ties the stages together behind `identify_bytes`,
//! `identify_path`, `identify_stream`, and `identify_paths`, applying the
//! empty/small-input short-circuits before extraction.
//!
//! ```no_run
//! use deeptype_core::Scanner;
//!
//! # fn main() -> deeptype_core::Result<()> {
//! let scanner = Scanner::shared(std::path::Path::new("models/standard-v1"))?;
//! let result = scanner.identify_bytes(b"function log(msg) {console.log(msg);}");
//! if let Some(prediction) = result.prediction() {
//!     println!("{} ({:.2})", prediction.output.label, prediction.score);
//! }
//! # Ok(())
//! # }
//! ```

mod catalog;
mod config;
mod decision;
mod error;
mod features;
mod label;
mod model;
mod result;
mod scanner;
mod source;

pub use catalog::{Catalog, TypeInfo};
pub use config::{ModelConfig, PROBE_OFFSETS};
pub use decision::OverwriteReason;
pub use error::{Error, Result};
pub use features::{FeatureVector, FeaturesOrRuled};
pub use label::{ContentType, UnknownLabel};
pub use model::{Classifier, ModelPrediction};
pub use result::{Outcome, Prediction, ScanResult, Status};
pub use scanner::{module_version, Scanner};
pub use source::{FileSource, StreamWindows, WindowSource};
