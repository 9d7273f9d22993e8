//! Extracted scripts and their extraction from / injection into the tree

use std::collections::HashSet;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info};

use crate::codec::{decode_script, utf8_safe_encode};
use crate::config::{ExportConfig, MatchMode};
use crate::error::{Error, Result};
use crate::naming::{base_name, NameAllocator};
use crate::tree::{self, declared_name, script_payload, SlotPath, BYTE_CODE_FIELD};

/// A script's source text and where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    /// Unique file name, including extension
    pub name: String,
    /// Decoded source text
    pub source: String,
    /// Slot the script was extracted from, `None` for scripts loaded from files
    pub origin: Option<SlotPath>,
}

impl Script {
    /// Create a script that is not tied to a slot
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            origin: None,
        }
    }

    /// Create a script extracted from the slot at `origin`
    pub fn with_origin(name: impl Into<String>, source: impl Into<String>, origin: SlotPath) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            origin: Some(origin),
        }
    }
}

/// Scripts keyed by file name, in the order they were added
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptMap {
    entries: IndexMap<String, Script>,
}

impl ScriptMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map of file-loaded scripts from `(name, source)` pairs
    pub fn from_sources<I, N, S>(sources: I) -> Result<Self>
    where
        I: IntoIterator<Item = (N, S)>,
        N: Into<String>,
        S: Into<String>,
    {
        let mut map = Self::new();
        for (name, source) in sources {
            map.insert(Script::new(name, source))?;
        }
        Ok(map)
    }

    /// Add a script; names must be unique
    pub fn insert(&mut self, script: Script) -> Result<()> {
        if self.entries.contains_key(&script.name) {
            return Err(Error::DuplicateScript(script.name));
        }
        self.entries.insert(script.name.clone(), script);
        Ok(())
    }

    /// Look up a script by name
    pub fn get(&self, name: &str) -> Option<&Script> {
        self.entries.get(name)
    }

    /// Source text of a script
    pub fn source(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(|s| s.source.as_str())
    }

    /// Replace the source of an existing script, keeping its origin
    ///
    /// Returns `false` if no script has that name.
    pub fn set_source(&mut self, name: &str, source: impl Into<String>) -> bool {
        match self.entries.get_mut(name) {
            Some(script) => {
                script.source = source.into();
                true
            }
            None => false,
        }
    }

    /// First script in insertion order
    pub fn first(&self) -> Option<&Script> {
        self.entries.values().next()
    }

    /// Script names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Scripts in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Script> {
        self.entries.values()
    }

    /// Number of scripts
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a ScriptMap {
    type Item = &'a Script;
    type IntoIter = indexmap::map::Values<'a, String, Script>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}

/// Collect every decodable script slot of `tree`
///
/// Slots whose payload does not decode are skipped and do not consume an
/// ordinal.
pub fn extract(tree: &Value, config: &ExportConfig) -> ScriptMap {
    let mut names = NameAllocator::new(config);
    let mut scripts = ScriptMap::new();
    let mut skipped = 0usize;

    tree::walk_with_path(tree, &mut |path, node| {
        let Some(payload) = script_payload(node) else {
            return;
        };
        match decode_script(payload, config.legacy_fallback) {
            Ok(source) => {
                let name = names.allocate(declared_name(node));
                debug!(slot = %path, name = %name, bytes = source.len(), "extracted script");
                scripts
                    .entries
                    .insert(name.clone(), Script::with_origin(name, source, path.clone()));
            }
            Err(e) => {
                skipped += 1;
                debug!(slot = %path, error = %e, "skipping undecodable script slot");
            }
        }
    });

    info!(scripts = scripts.len(), skipped, "extraction finished");
    scripts
}

/// Write scripts back into the matching slots of `tree`
///
/// Each slot's extracted name is derived again exactly as [`extract`] does,
/// and the slot takes the script with that name. In an unedited tree this is
/// the script extracted from the slot. After slots were added, removed or
/// moved, names follow the new structure, so a script never lands in a slot
/// of a different name. Each script is used at most once.
/// With [`MatchMode::BaseName`] a slot left unmatched falls back to the first
/// script whose base name equals its own.
///
/// Returns the number of slots rewritten. Unmatched slots keep their payload.
pub fn inject(tree: &mut Value, scripts: &ScriptMap, config: &ExportConfig) -> usize {
    let extension = config.script_extension.as_str();

    let mut names = NameAllocator::new(config);
    let mut consumed: HashSet<&str> = HashSet::new();
    let mut count = 0usize;

    tree::walk_mut_with_path(tree, &mut |path, node| {
        let Some(payload) = script_payload(node) else {
            return;
        };
        if decode_script(payload, config.legacy_fallback).is_err() {
            return;
        }
        let name = names.allocate(declared_name(node));

        let exact = scripts
            .get(&name)
            .filter(|s| !consumed.contains(s.name.as_str()));

        let matched = match (exact, config.match_mode) {
            (Some(script), _) => {
                if script.origin.as_ref().is_some_and(|origin| origin != path) {
                    debug!(slot = %path, script = %script.name, "script slot moved since extraction");
                }
                consumed.insert(script.name.as_str());
                Some(script)
            }
            (None, MatchMode::BaseName) => {
                let wanted = base_name(&name, extension);
                scripts.iter().find(|s| base_name(&s.name, extension) == wanted)
            }
            (None, MatchMode::ById) => None,
        };

        match matched {
            Some(script) => {
                node.insert(
                    BYTE_CODE_FIELD.to_string(),
                    Value::String(utf8_safe_encode(&script.source)),
                );
                count += 1;
                debug!(slot = %path, script = %script.name, "injected script");
            }
            None => debug!(slot = %path, name = %name, "no script for slot"),
        }
    });

    info!(injected = count, available = scripts.len(), "injection finished");
    count
}
