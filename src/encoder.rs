//! Export encoder

use serde_json::Value;
use tracing::{debug, info};

use crate::codec::{encode_base64, with_magic};
use crate::compress::compress;
use crate::config::ExportConfig;
use crate::decoder::Export;
use crate::error::{Error, Result};
use crate::scripts::{inject, ScriptMap};
use crate::template::TemplateAssembler;

/// Result of an encode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOutcome {
    /// The transport string
    pub transport: String,
    /// Number of script slots that were rewritten
    pub injected: usize,
}

/// Encodes trees and scripts into transport strings
pub struct ExportEncoder {
    config: ExportConfig,
}

impl ExportEncoder {
    /// Create an encoder with the default configuration
    pub fn new() -> Self {
        Self::with_config(ExportConfig::default())
    }

    /// Create an encoder with a custom configuration
    pub fn with_config(config: ExportConfig) -> Self {
        Self { config }
    }

    /// Configuration in use
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Serialize, gzip, frame and base64-encode a tree as is
    pub fn encode_tree(&self, tree: &Value) -> Result<String> {
        let json = serde_json::to_string(tree).map_err(Error::Serialize)?;
        let compressed = compress(&json, self.config.compression)?;
        debug!(json = json.len(), compressed = compressed.len(), "compressed payload");
        Ok(encode_base64(&with_magic(compressed)))
    }

    /// Inject `scripts` into a copy of `tree` and encode the result
    ///
    /// The caller's tree is never modified.
    pub fn encode(&self, tree: &Value, scripts: &ScriptMap) -> Result<EncodeOutcome> {
        let mut copy = tree.clone();
        let injected = inject(&mut copy, scripts, &self.config);
        let transport = self.encode_tree(&copy)?;
        info!(injected, bytes = transport.len(), "encoded export");
        Ok(EncodeOutcome { transport, injected })
    }

    /// Encode a decoded (and possibly edited) export
    pub fn encode_export(&self, export: &Export) -> Result<EncodeOutcome> {
        self.encode(&export.tree, &export.scripts)
    }

    /// Fill a template's file references from `files` and encode the result
    ///
    /// Nothing is compressed if any referenced file is missing.
    pub fn encode_template(&self, template: &Value, files: &ScriptMap) -> Result<EncodeOutcome> {
        let mut copy = template.clone();
        let injected = TemplateAssembler::new(&self.config).assemble(&mut copy, files)?;
        let transport = self.encode_tree(&copy)?;
        info!(injected, bytes = transport.len(), "encoded template");
        Ok(EncodeOutcome { transport, injected })
    }

    /// Encode an export directly to a writer
    pub fn encode_to_writer<W: std::io::Write>(&self, export: &Export, mut writer: W) -> Result<usize> {
        let outcome = self.encode_export(export)?;
        writer.write_all(outcome.transport.as_bytes())?;
        Ok(outcome.injected)
    }

    /// Encode an export to a file
    pub fn encode_to_file(&self, export: &Export, path: &std::path::Path) -> Result<usize> {
        let outcome = self.encode_export(export)?;
        std::fs::write(path, outcome.transport)?;
        Ok(outcome.injected)
    }
}

impl Default for ExportEncoder {
    fn default() -> Self {
        Self::new()
    }
}
