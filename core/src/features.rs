//! Deterministic feature extraction.
//!
//! The classifier's sole input is a fixed-length integer vector sampled
//! from a bounded window of the input's bytes. Extraction must be
//! bit-exact across implementations: the model was trained against these
//! exact windows, and any drift in trimming, alignment, or padding
//! silently degrades accuracy without ever raising an error.
//!
//! Window rules:
//!
//! | window | trim | alignment |
//! |---|---|---|
//! | beginning | leading ASCII whitespace | left, padded right |
//! | middle | none | center, padded both sides |
//! | end | trailing ASCII whitespace | right, padded left |
//!
//! Trimming happens *within* the `block_size` window read from each end,
//! not against the whole input; a whitespace run longer than the block
//! leaves the window empty even if content follows. Padding uses a
//! sentinel outside the byte range so the model can tell real bytes from
//! absent ones.

use crate::config::{ModelConfig, PROBE_OFFSETS};
use crate::error::Result;
use crate::label::ContentType;
use crate::source::WindowSource;

/// ASCII whitespace trimmed from the beginning and end windows.
const WHITESPACE: [u8; 6] = [0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x20];

fn is_whitespace(byte: u8) -> bool {
    WHITESPACE.contains(&byte)
}

fn lstrip(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|&b| !is_whitespace(b))
        .unwrap_or(bytes.len());
    &bytes[start..]
}

fn rstrip(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|&b| !is_whitespace(b))
        .map_or(0, |i| i + 1);
    &bytes[..end]
}

/// A fixed-length integer feature vector.
///
/// Each slot holds a byte value in `0..=255` or the config's padding
/// token, ordered beginning block, middle block, end block, then offset
/// probes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureVector(Vec<i32>);

impl FeatureVector {
    /// Extract the feature vector for `source` under `config`.
    ///
    /// Touches at most `2 * block_size + mid_size` bytes of the input
    /// (plus 8-byte probe reads); cost is independent of the input length.
    pub fn extract<S: WindowSource>(source: &mut S, config: &ModelConfig) -> Result<Self> {
        let n = source.len();
        let pad = config.padding_token;
        let mut slots = Vec::with_capacity(config.feature_len());

        // Beginning block: left-trim, left-align, pad right.
        let beg = source.read_at(0, config.block_size)?;
        let beg = lstrip(&beg);
        let taken = beg.len().min(config.beg_size);
        slots.extend(beg[..taken].iter().map(|&b| i32::from(b)));
        slots.extend(std::iter::repeat(pad).take(config.beg_size - taken));

        // Middle block: centered at n/2, no trimming, center-aligned. With
        // an odd padding remainder the extra slot goes on the right.
        if config.mid_size > 0 {
            let start = (n / 2).saturating_sub(config.mid_size as u64 / 2);
            let mid = source.read_at(start, config.mid_size)?;
            let taken = mid.len().min(config.mid_size);
            let left_pad = (config.mid_size - taken) / 2;
            slots.extend(std::iter::repeat(pad).take(left_pad));
            slots.extend(mid[..taken].iter().map(|&b| i32::from(b)));
            slots.extend(std::iter::repeat(pad).take(config.mid_size - taken - left_pad));
        }

        // End block: right-trim, right-align, pad left.
        let start = n.saturating_sub(config.block_size as u64);
        let end = source.read_at(start, config.block_size)?;
        let end = rstrip(&end);
        let taken = end.len().min(config.end_size);
        slots.extend(std::iter::repeat(pad).take(config.end_size - taken));
        slots.extend(end[end.len() - taken..].iter().map(|&b| i32::from(b)));

        // Fixed-offset probes, 8 bytes each, short reads padded.
        if config.use_inputs_at_offsets {
            for &offset in &PROBE_OFFSETS {
                let probe = source.read_at(offset, 8)?;
                slots.extend(probe.iter().map(|&b| i32::from(b)));
                slots.extend(std::iter::repeat(pad).take(8 - probe.len()));
            }
        }

        Ok(FeatureVector(slots))
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Either extracted features, or a label decided by rule before the model.
///
/// Empty inputs and inputs below `min_file_size_for_dl` are decided here,
/// so they never reach feature extraction or the classifier.
#[derive(Debug, Clone)]
pub enum FeaturesOrRuled {
    Features(FeatureVector),
    Ruled(ContentType),
}

impl FeaturesOrRuled {
    /// Apply the size short-circuits, extracting features only when the
    /// input is large enough for the model.
    ///
    /// Small non-empty inputs are read whole and probed for strict UTF-8:
    /// decodable content rules as `txt`, anything else as `unknown`.
    pub fn extract<S: WindowSource>(source: &mut S, config: &ModelConfig) -> Result<Self> {
        let n = source.len();
        if n == 0 {
            return Ok(FeaturesOrRuled::Ruled(ContentType::Empty));
        }
        if n < config.min_file_size_for_dl as u64 {
            let content = source.read_at(0, n as usize)?;
            let ruled = match std::str::from_utf8(&content) {
                Ok(_) => ContentType::Txt,
                Err(_) => ContentType::Unknown,
            };
            return Ok(FeaturesOrRuled::Ruled(ruled));
        }
        Ok(FeaturesOrRuled::Features(FeatureVector::extract(
            source, config,
        )?))
    }
}
