//! Identification results and their stable wire format.
//!
//! The JSON shape is consumed by the CLI and the language bindings and
//! must not drift:
//!
//! ```json
//! {
//!   "path": "...",
//!   "result": {
//!     "status": "ok",
//!     "value": {
//!       "dl": {"label": "...", "...": "..."},
//!       "output": {"label": "...", "...": "..."},
//!       "score": 0.99,
//!       "overwrite_reason": "none",
//!       "scores_map": {"...": 0.0}
//!     }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::io::ErrorKind;

use serde::Serialize;

use crate::catalog::TypeInfo;
use crate::decision::OverwriteReason;
use crate::error::Error;
use crate::label::ContentType;

/// Terminal status of one identification request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    FileNotFoundError,
    PermissionError,
    Unknown,
}

impl Status {
    /// The wire string for this status.
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::FileNotFoundError => "file_not_found_error",
            Status::PermissionError => "permission_error",
            Status::Unknown => "unknown",
        }
    }

    pub(crate) fn from_error(error: &Error) -> Status {
        match error {
            Error::Io(e) => match e.kind() {
                ErrorKind::NotFound => Status::FileNotFoundError,
                ErrorKind::PermissionDenied => Status::PermissionError,
                _ => Status::Unknown,
            },
            _ => Status::Unknown,
        }
    }
}

/// The final identification for one input.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    /// What the model itself said; the `undefined` entry when the model
    /// was not run.
    pub dl: TypeInfo,
    /// The final user-facing type.
    pub output: TypeInfo,
    /// Model score of the argmax label, or 1.0 for rule-based results.
    pub score: f32,
    pub overwrite_reason: OverwriteReason,
    /// Per-label scores; absent for rule-based results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scores_map: Option<BTreeMap<ContentType, f32>>,
}

/// Status plus, when successful, the prediction.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Prediction>,
}

/// Result of identifying a single input.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    pub path: String,
    pub result: Outcome,
}

impl ScanResult {
    /// A successful identification.
    pub fn ok(path: impl Into<String>, prediction: Prediction) -> Self {
        ScanResult {
            path: path.into(),
            result: Outcome {
                status: Status::Ok,
                value: Some(prediction),
            },
        }
    }

    /// A failed identification carrying only a status.
    pub fn error(path: impl Into<String>, status: Status) -> Self {
        ScanResult {
            path: path.into(),
            result: Outcome {
                status,
                value: None,
            },
        }
    }

    pub fn status(&self) -> Status {
        self.result.status
    }

    pub fn is_ok(&self) -> bool {
        self.result.status == Status::Ok
    }

    /// The prediction, when the request succeeded.
    pub fn prediction(&self) -> Option<&Prediction> {
        self.result.value.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    #[test]
    fn test_status_wire_strings() {
        for (status, expected) in [
            (Status::Ok, "\"ok\""),
            (Status::FileNotFoundError, "\"file_not_found_error\""),
            (Status::PermissionError, "\"permission_error\""),
            (Status::Unknown, "\"unknown\""),
        ] {
            assert_eq!(serde_json::to_string(&status).unwrap(), expected);
            assert_eq!(format!("\"{}\"", status.as_str()), expected);
        }
    }

    #[test]
    fn test_io_error_kinds_map_to_statuses() {
        let not_found = Error::Io(std::io::Error::from(ErrorKind::NotFound));
        assert_eq!(Status::from_error(&not_found), Status::FileNotFoundError);
        let denied = Error::Io(std::io::Error::from(ErrorKind::PermissionDenied));
        assert_eq!(Status::from_error(&denied), Status::PermissionError);
        let other = Error::Io(std::io::Error::from(ErrorKind::TimedOut));
        assert_eq!(Status::from_error(&other), Status::Unknown);
        let runtime = Error::ModelRuntime("boom".into());
        assert_eq!(Status::from_error(&runtime), Status::Unknown);
    }

    #[test]
    fn test_wire_shape() {
        let catalog = Catalog::bundled().unwrap();
        let info = catalog.info(ContentType::Javascript).unwrap().clone();
        let result = ScanResult::ok(
            "demo.js",
            Prediction {
                dl: info.clone(),
                output: info,
                score: 0.97,
                overwrite_reason: OverwriteReason::None,
                scores_map: None,
            },
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["path"], "demo.js");
        assert_eq!(json["result"]["status"], "ok");
        let value = &json["result"]["value"];
        assert_eq!(value["dl"]["label"], "javascript");
        assert_eq!(value["output"]["group"], "code");
        assert_eq!(value["output"]["mime_type"], "application/javascript");
        assert_eq!(value["overwrite_reason"], "none");
        assert!(value["dl"]["extensions"].is_array());
        assert!(value["dl"]["is_text"].as_bool().unwrap());
        assert!(value.get("scores_map").is_none());

        let error = ScanResult::error("missing.bin", Status::FileNotFoundError);
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["result"]["status"], "file_not_found_error");
        assert!(json["result"].get("value").is_none());
    }
}
