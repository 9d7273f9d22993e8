//! Export decoder

use std::io::Read;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, info};

use crate::codec::{decode_base64, strip_magic};
use crate::compress::decompress;
use crate::config::ExportConfig;
use crate::error::{Error, Result};
use crate::scripts::{extract, ScriptMap};
use crate::stats::ExportStats;

/// A decoded export: the tree and the scripts found in it
#[derive(Debug, Clone, PartialEq)]
pub struct Export {
    /// The full export tree
    pub tree: Value,
    /// Scripts extracted from the tree
    pub scripts: ScriptMap,
}

impl Export {
    /// Metadata and counts for this export
    pub fn stats(&self) -> ExportStats {
        ExportStats::of(&self.tree, &self.scripts)
    }

    /// Replace the tree with edited JSON text
    ///
    /// The script map is kept. On a parse error nothing changes.
    pub fn replace_tree_json(&mut self, text: &str) -> Result<()> {
        let tree = serde_json::from_str(text).map_err(Error::InvalidJsonEdit)?;
        self.tree = tree;
        Ok(())
    }

    /// Tree as indented JSON text
    pub fn tree_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.tree).map_err(Error::Serialize)
    }
}

/// Decodes transport strings into exports
pub struct ExportDecoder {
    config: ExportConfig,
}

impl ExportDecoder {
    /// Create a decoder with the default configuration
    pub fn new() -> Self {
        Self::with_config(ExportConfig::default())
    }

    /// Create a decoder with a custom configuration
    pub fn with_config(config: ExportConfig) -> Self {
        Self { config }
    }

    /// Configuration in use
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Decode a transport string to its tree, without extracting scripts
    pub fn decode_tree(&self, transport: &str) -> Result<Value> {
        let bytes = decode_base64(transport)?;
        let (compressed, had_magic) = strip_magic(&bytes);
        debug!(bytes = bytes.len(), magic = had_magic, "decoded transport string");

        let json = decompress(compressed)?;
        debug!(bytes = json.len(), "inflated payload");

        serde_json::from_str(&json).map_err(Error::Parse)
    }

    /// Decode a transport string and extract its scripts
    pub fn decode(&self, transport: &str) -> Result<Export> {
        let tree = self.decode_tree(transport)?;
        let scripts = extract(&tree, &self.config);
        info!(scripts = scripts.len(), "decoded export");
        Ok(Export { tree, scripts })
    }

    /// Decode a transport string read from `reader`
    pub fn decode_from_reader<R: Read>(&self, mut reader: R) -> Result<Export> {
        let mut transport = String::new();
        reader.read_to_string(&mut transport)?;
        self.decode(&transport)
    }

    /// Decode a transport string stored in a file
    pub fn decode_file(&self, path: &Path) -> Result<Export> {
        let transport = std::fs::read_to_string(path)?;
        self.decode(&transport)
    }
}

impl Default for ExportDecoder {
    fn default() -> Self {
        Self::new()
    }
}
