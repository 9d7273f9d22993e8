//! Error types for decoding and encoding exports

use std::fmt;

use thiserror::Error;

/// Pipeline stage an error belongs to, for user-facing reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Transport string to bytes
    Base64,
    /// Gzip stream to JSON text
    Decompress,
    /// JSON text to tree
    Json,
    /// Script injection / template assembly
    Inject,
    /// Writing archives, directories or reading script files
    Output,
}

impl Stage {
    /// Get a human-readable label
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Base64 => "base64",
            Self::Decompress => "decompress",
            Self::Json => "json",
            Self::Inject => "inject",
            Self::Output => "output",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Errors produced by the export pipeline
#[derive(Debug, Error)]
pub enum Error {
    /// Transport string is not valid base64
    #[error("invalid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    /// Payload is not a gzip stream, or does not inflate to UTF-8 text
    #[error("invalid gzip data: {0}")]
    Decompress(String),

    /// Decompressed text is not valid JSON
    #[error("invalid JSON data: {0}")]
    Parse(#[source] serde_json::Error),

    /// Tree could not be written as JSON text
    #[error("failed to serialize JSON: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Template references script files that were not supplied
    #[error("missing scripts: {}", .0.join(", "))]
    MissingScripts(Vec<String>),

    /// Edited tree text does not parse
    #[error("edited JSON is invalid: {0}")]
    InvalidJsonEdit(#[source] serde_json::Error),

    /// A script with this name is already present in the map
    #[error("duplicate script: {0}")]
    DuplicateScript(String),

    /// A script name cannot be written as a plain file name
    #[error("unsafe script file name: {0}")]
    UnsafeName(String),

    /// I/O error while reading or writing files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Zip archive could not be read or written
    #[error("zip archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}

impl Error {
    /// Stage of the pipeline that failed
    pub fn stage(&self) -> Stage {
        match self {
            Self::Decode(_) => Stage::Base64,
            Self::Decompress(_) => Stage::Decompress,
            Self::Parse(_) | Self::InvalidJsonEdit(_) => Stage::Json,
            Self::MissingScripts(_) | Self::DuplicateScript(_) => Stage::Inject,
            Self::Serialize(_) | Self::UnsafeName(_) | Self::Io(_) | Self::Archive(_) => {
                Stage::Output
            }
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_scripts_message_lists_all() {
        let err = Error::MissingScripts(vec!["ghost.cs".into(), "other.cs".into()]);
        assert_eq!(err.to_string(), "missing scripts: ghost.cs, other.cs");
        assert_eq!(err.stage(), Stage::Inject);
    }

    #[test]
    fn test_stage_labels() {
        assert_eq!(Error::Decompress("bad".into()).stage().to_string(), "decompress");
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(Error::Parse(parse).stage(), Stage::Json);
    }

    #[test]
    fn test_serialize_is_not_a_parse_failure() {
        let inner = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = Error::Serialize(inner);
        assert_eq!(err.stage(), Stage::Output);
        assert!(err.to_string().starts_with("failed to serialize JSON"));
    }
}
