//! Bulk export of scripts and loading of script files
//!
//! An export is bundled under one folder named after the export:
//!
//! ```text
//! My Export/Greeting.cs
//! My Export/Greeting_1.cs
//! My Export/My Export.json    (tree, indented)
//! My Export/My Export.sb      (import file: the transport string)
//! ```

use std::fs;
use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::config::ExportConfig;
use crate::decoder::Export;
use crate::encoder::ExportEncoder;
use crate::error::{Error, Result};
use crate::scripts::{Script, ScriptMap};
use crate::stats::export_name;

/// Extension of the import file placed next to the tree
pub const IMPORT_EXTENSION: &str = ".sb";
/// Extension of the tree file
pub const TREE_EXTENSION: &str = ".json";
/// Folder name used when the export name sanitizes to nothing
const DEFAULT_FOLDER: &str = "export";

/// Replace characters that are not allowed in folder names
///
/// Leading and trailing dots are dropped and runs of dots collapse, so the
/// result is always a plain name.
pub fn folder_name(export_name: &str) -> String {
    let replaced: String = export_name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c => c,
        })
        .collect();
    let mut folder = replaced
        .trim_matches(|c: char| c == '.' || c.is_whitespace())
        .to_string();
    while folder.contains("..") {
        folder = folder.replace("..", "_");
    }
    if folder.is_empty() {
        DEFAULT_FOLDER.to_string()
    } else {
        folder
    }
}

/// Whether `name` can be written as a single file inside a directory
pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.contains("..")
}

/// A text file in the bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveFile {
    /// File name inside the bundle folder
    pub name: String,
    /// Text content
    pub data: String,
}

impl ArchiveFile {
    /// Create a new file
    pub fn new(name: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}

/// Scripts of an export, optionally with the tree and import file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptArchive {
    /// Folder all files are placed under in a zip
    pub folder: String,
    /// Files in the bundle
    pub files: Vec<ArchiveFile>,
}

impl ScriptArchive {
    /// Create an empty bundle
    pub fn new(folder: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            files: Vec::new(),
        }
    }

    /// Add a file
    /// Returns an error if the name is not a plain file name or already present
    pub fn add_file(&mut self, file: ArchiveFile) -> Result<()> {
        if !is_plain_file_name(&file.name) {
            return Err(Error::UnsafeName(file.name));
        }
        if self.files.iter().any(|f| f.name == file.name) {
            return Err(Error::DuplicateScript(file.name));
        }
        self.files.push(file);
        Ok(())
    }

    /// Bundle only the scripts of an export
    pub fn scripts_only(export: &Export) -> Result<Self> {
        let mut archive = Self::new(folder_name(&export_name(&export.tree)));
        for script in &export.scripts {
            archive.add_file(ArchiveFile::new(&script.name, &script.source))?;
        }
        Ok(archive)
    }

    /// Bundle the scripts, the tree and the import file of an export
    pub fn from_export(export: &Export, config: &ExportConfig) -> Result<Self> {
        let mut archive = Self::scripts_only(export)?;
        let folder = archive.folder.clone();

        archive.add_file(ArchiveFile::new(
            format!("{}{}", folder, TREE_EXTENSION),
            export.tree_json()?,
        ))?;

        let outcome = ExportEncoder::with_config(config.clone()).encode_export(export)?;
        archive.add_file(ArchiveFile::new(
            format!("{}{}", folder, IMPORT_EXTENSION),
            outcome.transport,
        ))?;

        Ok(archive)
    }

    /// Write the bundle as a zip, every file under [`ScriptArchive::folder`]
    pub fn write_zip<W: Write + Seek>(&self, writer: W) -> Result<W> {
        if !is_plain_file_name(&self.folder) {
            return Err(Error::UnsafeName(self.folder.clone()));
        }
        let mut zip = ZipWriter::new(writer);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for file in &self.files {
            let path = format!("{}/{}", self.folder, file.name);
            zip.start_file(path, options)?;
            zip.write_all(file.data.as_bytes())?;
        }

        let writer = zip.finish()?;
        debug!(files = self.files.len(), folder = %self.folder, "wrote zip archive");
        Ok(writer)
    }

    /// Write the bundle as a zip file
    pub fn write_zip_file(&self, path: &Path) -> Result<()> {
        let file = fs::File::create(path)?;
        self.write_zip(file)?;
        Ok(())
    }

    /// Write every file directly into `dir`, creating it if needed
    ///
    /// Returns the number of files written.
    pub fn write_dir(&self, dir: &Path) -> Result<usize> {
        fs::create_dir_all(dir)?;
        for file in &self.files {
            fs::write(dir.join(&file.name), &file.data)?;
            debug!(file = %file.name, "wrote file");
        }
        Ok(self.files.len())
    }
}

fn file_name_of(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| Error::UnsafeName(path.display().to_string()))
}

impl ScriptMap {
    /// Load every file ending with `extension` below `dir`, keyed by file name
    pub fn load_dir(dir: &Path, extension: &str) -> Result<Self> {
        let mut scripts = Self::new();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = file_name_of(entry.path())?;
            if !name.ends_with(extension) {
                continue;
            }
            let source = fs::read_to_string(entry.path())?;
            debug!(file = %name, bytes = source.len(), "loaded script file");
            scripts.insert(Script::new(name, source))?;
        }
        Ok(scripts)
    }

    /// Load the given files, keyed by file name
    pub fn load_files(paths: &[PathBuf]) -> Result<Self> {
        let mut scripts = Self::new();
        for path in paths {
            let name = file_name_of(path)?;
            let source = fs::read_to_string(path)?;
            debug!(file = %name, bytes = source.len(), "loaded script file");
            scripts.insert(Script::new(name, source))?;
        }
        Ok(scripts)
    }

    /// Load every entry ending with `extension` from a zip, keyed by file name
    pub fn from_zip<R: Read + Seek>(reader: R, extension: &str) -> Result<Self> {
        let mut zip = ZipArchive::new(reader)?;
        let mut scripts = Self::new();
        for i in 0..zip.len() {
            let mut entry = zip.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let name = file_name_of(Path::new(entry.name()))?;
            if !name.ends_with(extension) {
                continue;
            }
            let mut source = String::new();
            entry.read_to_string(&mut source)?;
            scripts.insert(Script::new(name, source))?;
        }
        Ok(scripts)
    }
}
