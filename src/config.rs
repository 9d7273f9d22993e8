//! Export pipeline configuration

use flate2::Compression;

/// Default extension appended to extracted script names
pub const DEFAULT_SCRIPT_EXTENSION: &str = ".cs";
/// Default prefix for slots without a usable `name`
pub const DEFAULT_FALLBACK_PREFIX: &str = "script_";

/// How the injector pairs script map entries with slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Match each slot to the script with its exact re-derived name
    #[default]
    ById,
    /// Additionally fall back to the first entry with an equal base name
    BaseName,
}

/// Options shared by the decoder, encoder and archive helpers
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Extension for script file names, including the dot
    pub script_extension: String,
    /// Prefix for ordinal-based fallback names
    pub fallback_prefix: String,
    /// Gzip level used on encode
    pub compression: Compression,
    /// Accept script payloads that are not UTF-8 by reading them as Latin-1
    pub legacy_fallback: bool,
    /// Injection matching strategy
    pub match_mode: MatchMode,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            script_extension: DEFAULT_SCRIPT_EXTENSION.to_string(),
            fallback_prefix: DEFAULT_FALLBACK_PREFIX.to_string(),
            compression: Compression::default(),
            legacy_fallback: true,
            match_mode: MatchMode::default(),
        }
    }
}

impl ExportConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the script extension (a leading dot is added when missing)
    pub fn with_script_extension(mut self, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        self.script_extension = if extension.starts_with('.') {
            extension
        } else {
            format!(".{}", extension)
        };
        self
    }

    /// Set the fallback name prefix
    pub fn with_fallback_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.fallback_prefix = prefix.into();
        self
    }

    /// Set the gzip compression level
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Enable or disable the Latin-1 fallback for script payloads
    pub fn with_legacy_fallback(mut self, enabled: bool) -> Self {
        self.legacy_fallback = enabled;
        self
    }

    /// Set the injection matching strategy
    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self
    }
}
