//! Content-type catalog: the label → metadata mapping bundled with the
//! engine.
//!
//! The catalog document is append-only across model versions. It must cover
//! the union of the model and output label spaces, which is checked at load
//! time so a missing entry fails the engine's construction instead of a
//! request deep in the pipeline.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::label::ContentType;

const CATALOG_JSON: &str = include_str!("../assets/content_types.json");

static BUNDLED: OnceLock<Catalog> = OnceLock::new();

/// Metadata attached to a content-type label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeInfo {
    pub label: ContentType,
    pub description: String,
    pub group: String,
    pub mime_type: String,
    /// Possible file extensions, most common first. Never empty.
    pub extensions: Vec<String>,
    pub is_text: bool,
}

/// The loaded catalog. Immutable after parsing.
#[derive(Debug)]
pub struct Catalog {
    entries: HashMap<ContentType, TypeInfo>,
}

impl Catalog {
    /// The catalog bundled with the engine, parsed once per process.
    pub fn bundled() -> Result<&'static Catalog> {
        if let Some(catalog) = BUNDLED.get() {
            return Ok(catalog);
        }
        let catalog = Catalog::parse(CATALOG_JSON)?;
        Ok(BUNDLED.get_or_init(|| catalog))
    }

    /// Parse and validate a catalog document.
    pub fn parse(json: &str) -> Result<Catalog> {
        let entries: Vec<TypeInfo> = serde_json::from_str(json)
            .map_err(|e| Error::InvalidConfig(format!("content-type catalog: {e}")))?;
        let mut map = HashMap::with_capacity(entries.len());
        for info in entries {
            if info.extensions.is_empty() {
                return Err(Error::InvalidConfig(format!(
                    "catalog entry `{}` has an empty extension list",
                    info.label
                )));
            }
            let label = info.label;
            if map.insert(label, info).is_some() {
                return Err(Error::InvalidConfig(format!(
                    "duplicate catalog entry for `{label}`"
                )));
            }
        }
        for &label in ContentType::ALL {
            if !map.contains_key(&label) {
                return Err(Error::MissingLabel(label));
            }
        }
        Ok(Catalog { entries: map })
    }

    /// Metadata for `label`.
    pub fn info(&self, label: ContentType) -> Result<&TypeInfo> {
        self.entries.get(&label).ok_or(Error::MissingLabel(label))
    }
}
