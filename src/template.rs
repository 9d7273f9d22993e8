//! Template assembly
//!
//! A template is an export tree whose script slots hold a file name (such as
//! `Greeting.cs`) in `byteCode` instead of an encoded payload. Assembly swaps
//! each file name for the encoded content of the loaded file with exactly that
//! name.

use serde_json::Value;
use tracing::{debug, warn};

use crate::codec::utf8_safe_encode;
use crate::config::ExportConfig;
use crate::error::{Error, Result};
use crate::scripts::ScriptMap;
use crate::tree::{self, script_payload, BYTE_CODE_FIELD};

/// Fills file-name slots of a template with loaded script files
pub struct TemplateAssembler<'c> {
    config: &'c ExportConfig,
}

impl<'c> TemplateAssembler<'c> {
    /// Create an assembler using the script extension of `config`
    pub fn new(config: &'c ExportConfig) -> Self {
        Self { config }
    }

    /// Whether a `byteCode` value is a file reference
    pub fn is_file_reference(&self, value: &str) -> bool {
        value.ends_with(&self.config.script_extension)
    }

    /// File names referenced by the template that `files` does not contain,
    /// without duplicates, in traversal order
    pub fn missing(&self, template: &Value, files: &ScriptMap) -> Vec<String> {
        let mut missing: Vec<String> = Vec::new();
        tree::walk(template, &mut |node| {
            if let Some(reference) = script_payload(node) {
                if self.is_file_reference(reference)
                    && files.get(reference).is_none()
                    && !missing.iter().any(|m| m == reference)
                {
                    missing.push(reference.to_string());
                }
            }
        });
        missing
    }

    /// Replace every file reference in `template` with its encoded file
    ///
    /// Fails with [`Error::MissingScripts`] listing every unresolved file name,
    /// in which case `template` is left untouched. Returns the number of slots
    /// filled.
    pub fn assemble(&self, template: &mut Value, files: &ScriptMap) -> Result<usize> {
        let missing = self.missing(template, files);
        if !missing.is_empty() {
            warn!(missing = ?missing, "template references scripts that were not loaded");
            return Err(Error::MissingScripts(missing));
        }

        let mut count = 0usize;
        tree::walk_mut(template, &mut |node| {
            let Some(reference) = script_payload(node) else {
                return;
            };
            if !self.is_file_reference(reference) {
                return;
            }
            if let Some(script) = files.get(reference) {
                debug!(file = %script.name, "filling template slot");
                node.insert(
                    BYTE_CODE_FIELD.to_string(),
                    Value::String(utf8_safe_encode(&script.source)),
                );
                count += 1;
            }
        });

        Ok(count)
    }
}
