//! Model configuration: the contract between the trainer and the runtime.
//!
//! Each model lives in its own directory with a `config.json`:
//!
//! ```json
//! {
//!   "beg_size": 512,
//!   "mid_size": 0,
//!   "end_size": 512,
//!   "block_size": 4096,
//!   "min_file_size_for_dl": 16,
//!   "padding_token": 256,
//!   "use_inputs_at_offsets": false,
//!   "medium_confidence_threshold": 0.5,
//!   "target_labels_space": ["asm", "bmp", "..."],
//!   "thresholds": {"ini": 0.75},
//!   "overwrite_map": {"randomtxt": "txt", "randombytes": "unknown"}
//! }
//! ```
//!
//! The order of `target_labels_space` defines which label each index of the
//! classifier's output refers to; reordering it silently breaks every
//! prediction, so the list is kept exactly as loaded. Unknown keys in the
//! document are ignored; missing required keys fail the load.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::label::ContentType;

/// Offsets probed when `use_inputs_at_offsets` is enabled, 8 bytes each.
pub const PROBE_OFFSETS: [u64; 4] = [0x8000, 0x8800, 0x9000, 0x9800];

/// Per-model configuration, loaded once and immutable thereafter.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Beginning-window size in feature slots.
    pub beg_size: usize,
    /// Middle-window size in feature slots. Zero in current models.
    pub mid_size: usize,
    /// End-window size in feature slots.
    pub end_size: usize,
    /// Bytes sampled from each end of the input during extraction.
    pub block_size: usize,
    /// Inputs smaller than this never reach the model.
    pub min_file_size_for_dl: usize,
    /// Sentinel filling unused feature slots. Outside the byte range.
    pub padding_token: i32,
    /// Whether fixed-offset probes are sampled. False in current models.
    pub use_inputs_at_offsets: bool,
    /// Default minimum score required to trust a prediction.
    pub medium_confidence_threshold: f32,
    /// Output label per score index. Order is the model's, never ours.
    pub target_labels_space: Vec<ContentType>,
    /// Per-label overrides of the medium confidence threshold.
    pub thresholds: BTreeMap<ContentType, f32>,
    /// Unconditional label rewrites applied to the model's argmax.
    pub overwrite_map: BTreeMap<ContentType, ContentType>,
}

impl ModelConfig {
    /// Load and validate a `config.json` from disk.
    pub fn load(path: &Path, catalog: &Catalog) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::parse(&text, catalog)?;
        info!(
            "Loaded model config from {} ({} target labels, features {})",
            path.display(),
            config.target_labels_space.len(),
            config.feature_len(),
        );
        Ok(config)
    }

    /// Parse and validate a configuration document.
    pub fn parse(json: &str, catalog: &Catalog) -> Result<Self> {
        let config: ModelConfig =
            serde_json::from_str(json).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate(catalog)?;
        Ok(config)
    }

    fn validate(&self, catalog: &Catalog) -> Result<()> {
        if self.beg_size == 0 {
            return Err(Error::InvalidConfig("beg_size must be positive".into()));
        }
        if self.end_size == 0 {
            return Err(Error::InvalidConfig("end_size must be positive".into()));
        }
        if self.mid_size != 0 {
            return Err(Error::InvalidConfig(format!(
                "mid_size must be 0 for current models, got {}",
                self.mid_size
            )));
        }
        if self.use_inputs_at_offsets {
            return Err(Error::InvalidConfig(
                "use_inputs_at_offsets is not supported by current models".into(),
            ));
        }
        if self.block_size == 0 {
            return Err(Error::InvalidConfig("block_size must be positive".into()));
        }
        if self.min_file_size_for_dl == 0 {
            return Err(Error::InvalidConfig(
                "min_file_size_for_dl must be positive".into(),
            ));
        }
        if !(self.medium_confidence_threshold > 0.0) {
            return Err(Error::InvalidConfig(
                "medium_confidence_threshold must be positive".into(),
            ));
        }
        // The padding sentinel must never collide with a real byte value.
        if self.padding_token < 256 {
            return Err(Error::InvalidConfig(format!(
                "padding_token must be non-negative and outside 0..=255, got {}",
                self.padding_token
            )));
        }
        if self.target_labels_space.is_empty() {
            return Err(Error::InvalidConfig(
                "target_labels_space must not be empty".into(),
            ));
        }
        let mut seen = std::collections::BTreeSet::new();
        for &label in &self.target_labels_space {
            catalog.info(label)?;
            if !seen.insert(label) {
                return Err(Error::InvalidConfig(format!(
                    "target_labels_space lists `{label}` more than once"
                )));
            }
        }
        for (&label, &threshold) in &self.thresholds {
            catalog.info(label)?;
            if !(0.0..=1.0).contains(&threshold) {
                return Err(Error::InvalidConfig(format!(
                    "threshold for `{label}` must be within [0, 1], got {threshold}"
                )));
            }
        }
        for (&from, &to) in &self.overwrite_map {
            catalog.info(from)?;
            catalog.info(to)?;
        }
        Ok(())
    }

    /// Total feature-vector length this configuration prescribes.
    pub fn feature_len(&self) -> usize {
        let probes = if self.use_inputs_at_offsets {
            8 * PROBE_OFFSETS.len()
        } else {
            0
        };
        self.beg_size + self.mid_size + self.end_size + probes
    }

    /// Minimum score required to trust a prediction of `label`.
    pub fn threshold(&self, label: ContentType) -> f32 {
        self.thresholds
            .get(&label)
            .copied()
            .unwrap_or(self.medium_confidence_threshold)
    }

    /// The label `label` is rewritten to, or `label` itself.
    pub fn overwrite(&self, label: ContentType) -> ContentType {
        self.overwrite_map.get(&label).copied().unwrap_or(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_json() -> serde_json::Value {
        serde_json::json!({
            "beg_size": 512,
            "mid_size": 0,
            "end_size": 512,
            "block_size": 4096,
            "min_file_size_for_dl": 16,
            "padding_token": 256,
            "use_inputs_at_offsets": false,
            "medium_confidence_threshold": 0.5,
            "target_labels_space": ["javascript", "python", "randomtxt"],
            "thresholds": {"javascript": 0.6},
            "overwrite_map": {"randomtxt": "txt"}
        })
    }

    fn parse(value: serde_json::Value) -> Result<ModelConfig> {
        ModelConfig::parse(&value.to_string(), Catalog::bundled().unwrap())
    }

    #[test]
    fn test_parse_valid_config() {
        let config = parse(minimal_json()).unwrap();
        assert_eq!(config.feature_len(), 1024);
        assert_eq!(config.threshold(ContentType::Javascript), 0.6);
        assert_eq!(config.threshold(ContentType::Python), 0.5);
        assert_eq!(config.overwrite(ContentType::Randomtxt), ContentType::Txt);
        assert_eq!(config.overwrite(ContentType::Python), ContentType::Python);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let mut value = minimal_json();
        value["train_dataset_info"] = serde_json::json!({"epochs": 10});
        assert!(parse(value).is_ok());
    }

    #[test]
    fn test_missing_required_key_rejected() {
        let mut value = minimal_json();
        value.as_object_mut().unwrap().remove("end_size");
        assert!(matches!(parse(value), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_legacy_single_size_config_rejected() {
        // Old configs carried only `input_size_beg`; they must not be
        // silently mirrored into the three window sizes.
        let value = serde_json::json!({
            "input_size_beg": 512,
            "block_size": 4096,
            "min_file_size_for_dl": 16,
            "padding_token": 256,
            "use_inputs_at_offsets": false,
            "medium_confidence_threshold": 0.5,
            "target_labels_space": ["javascript"],
            "thresholds": {},
            "overwrite_map": {}
        });
        assert!(matches!(parse(value), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_mid_size_rejected() {
        let mut value = minimal_json();
        value["mid_size"] = serde_json::json!(256);
        assert!(matches!(parse(value), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_offset_probes_rejected() {
        let mut value = minimal_json();
        value["use_inputs_at_offsets"] = serde_json::json!(true);
        assert!(matches!(parse(value), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_padding_token_collision_rejected() {
        for bad in [0, 127, 255, -1] {
            let mut value = minimal_json();
            value["padding_token"] = serde_json::json!(bad);
            assert!(
                matches!(parse(value), Err(Error::InvalidConfig(_))),
                "padding_token {bad} accepted"
            );
        }
    }

    #[test]
    fn test_unknown_label_rejected() {
        let mut value = minimal_json();
        value["target_labels_space"] = serde_json::json!(["javascript", "flac"]);
        assert!(matches!(parse(value), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_duplicate_target_label_rejected() {
        let mut value = minimal_json();
        value["target_labels_space"] = serde_json::json!(["javascript", "javascript"]);
        assert!(matches!(parse(value), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let mut value = minimal_json();
        value["thresholds"] = serde_json::json!({"python": 1.5});
        assert!(matches!(parse(value), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_reference_config_parses() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../models/standard-v1/config.json");
        let config = ModelConfig::load(&path, Catalog::bundled().unwrap()).unwrap();
        assert!(config.target_labels_space.contains(&ContentType::Javascript));
        assert!(config.target_labels_space.contains(&ContentType::Randombytes));
        assert_eq!(config.overwrite(ContentType::Randombytes), ContentType::Unknown);
        assert_eq!(config.overwrite(ContentType::Randomtxt), ContentType::Txt);
    }
}
