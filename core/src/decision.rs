//! Post-processing decision logic: from a raw score vector to the final
//! user-facing label.
//!
//! Two independent concerns compose here. The overwrite map is the model
//! author's intent-level remapping and applies unconditionally, before any
//! threshold test; this is how internal-only labels like `randomtxt` never
//! leak, however confident the model is. The confidence threshold is the
//! runtime's trust-level fallback: an untrusted prediction degrades to
//! `txt` or `unknown` depending on whether the mapped label is textual in
//! the catalog.

use serde::Serialize;

use crate::catalog::Catalog;
use crate::config::ModelConfig;
use crate::error::Result;
use crate::label::ContentType;
use crate::model::ModelPrediction;

/// Why the user-facing label differs from the model's argmax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverwriteReason {
    None,
    OverwriteMap,
    LowConfidence,
}

/// Map a raw prediction to `(output_label, overwrite_reason)`.
///
/// The threshold is looked up by the label the model actually produced,
/// not the overwritten one, and `LowConfidence` is recorded only when the
/// fallback actually changes the label: a low-confidence `randomtxt`
/// already mapped to `txt` keeps `OverwriteMap` as its reason.
pub fn decide(
    prediction: &ModelPrediction,
    config: &ModelConfig,
    catalog: &Catalog,
) -> Result<(ContentType, OverwriteReason)> {
    let predicted = prediction.label;
    let mapped = config.overwrite(predicted);
    let mut reason = if mapped != predicted {
        OverwriteReason::OverwriteMap
    } else {
        OverwriteReason::None
    };
    let output = if prediction.score >= config.threshold(predicted) {
        mapped
    } else {
        let fallback = if catalog.info(mapped)?.is_text {
            ContentType::Txt
        } else {
            ContentType::Unknown
        };
        if fallback != mapped {
            reason = OverwriteReason::LowConfidence;
        }
        fallback
    };
    Ok((output, reason))
}
