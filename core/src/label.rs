//! The content-type label enumeration.
//!
//! Labels exist in two spaces. The *model* space is the ordered list a
//! classifier is trained against (`target_labels_space` in the model
//! config); it may contain internal-only labels such as `randombytes` that
//! are always remapped before reaching users. The *output* space adds the
//! rule-based labels (`empty`, `directory`, `symlink`, `undefined`) that
//! never come out of the model.
//!
//! Catalog documents and model configs refer to labels by string. Those
//! strings are lifted into this enum at load time so unknown labels fail
//! loudly instead of travelling through the pipeline.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

macro_rules! content_types {
    ($($variant:ident => $label:literal,)*) => {
        /// A content-type label.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum ContentType {
            $($variant,)*
        }

        impl ContentType {
            /// Every label, in label-string order.
            pub const ALL: &'static [ContentType] = &[$(ContentType::$variant,)*];

            /// The stable string form of this label.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(ContentType::$variant => $label,)*
                }
            }
        }

        impl FromStr for ContentType {
            type Err = UnknownLabel;

            fn from_str(s: &str) -> Result<Self, UnknownLabel> {
                match s {
                    $($label => Ok(ContentType::$variant),)*
                    _ => Err(UnknownLabel(s.to_string())),
                }
            }
        }
    };
}

content_types! {
    Asm => "asm",
    Bmp => "bmp",
    Bzip => "bzip",
    C => "c",
    Cpp => "cpp",
    Cs => "cs",
    Css => "css",
    Csv => "csv",
    Deb => "deb",
    Directory => "directory",
    Dockerfile => "dockerfile",
    Elf => "elf",
    Empty => "empty",
    Epub => "epub",
    Gif => "gif",
    Go => "go",
    Gzip => "gzip",
    Html => "html",
    Ini => "ini",
    Iso => "iso",
    Java => "java",
    Javascript => "javascript",
    Json => "json",
    Latex => "latex",
    Lua => "lua",
    M3u => "m3u",
    Macho => "macho",
    Makefile => "makefile",
    Markdown => "markdown",
    Mp3 => "mp3",
    Mp4 => "mp4",
    Ogg => "ogg",
    Pcap => "pcap",
    Pdf => "pdf",
    Pe => "pe",
    Perl => "perl",
    Php => "php",
    Png => "png",
    Powershell => "powershell",
    Python => "python",
    Randombytes => "randombytes",
    Randomtxt => "randomtxt",
    Rar => "rar",
    Rtf => "rtf",
    Ruby => "ruby",
    Rust => "rust",
    Sevenzip => "sevenzip",
    Shell => "shell",
    Sql => "sql",
    Swift => "swift",
    Symlink => "symlink",
    Tar => "tar",
    Tiff => "tiff",
    Toml => "toml",
    Txt => "txt",
    Undefined => "undefined",
    Unknown => "unknown",
    Vba => "vba",
    Wav => "wav",
    Webm => "webm",
    Webp => "webp",
    Xml => "xml",
    Yaml => "yaml",
    Zip => "zip",
}

/// A label string with no corresponding [`ContentType`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLabel(pub String);

impl fmt::Display for UnknownLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown content-type label `{}`", self.0)
    }
}

impl std::error::Error for UnknownLabel {}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ContentType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ContentType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_all_labels() {
        for &label in ContentType::ALL {
            assert_eq!(label.as_str().parse::<ContentType>().unwrap(), label);
        }
    }

    #[test]
    fn test_unknown_label_rejected() {
        let err = "flac".parse::<ContentType>().unwrap_err();
        assert_eq!(err, UnknownLabel("flac".to_string()));
        assert!(err.to_string().contains("flac"));
    }

    #[test]
    fn test_serde_uses_label_strings() {
        let json = serde_json::to_string(&ContentType::Javascript).unwrap();
        assert_eq!(json, "\"javascript\"");
        let parsed: ContentType = serde_json::from_str("\"sevenzip\"").unwrap();
        assert_eq!(parsed, ContentType::Sevenzip);
        assert!(serde_json::from_str::<ContentType>("\"nope\"").is_err());
    }

    #[test]
    fn test_all_is_sorted_and_unique() {
        let strings: Vec<&str> = ContentType::ALL.iter().map(|l| l.as_str()).collect();
        let mut sorted = strings.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(strings, sorted);
    }
}
