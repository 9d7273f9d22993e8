//! # sbexport
//!
//! Decode, inspect and re-encode automation tool exports.
//!
//! ## Transport Format
//!
//! An export is shared as a single base64 string:
//!
//! ```text
//! base64( "SBAE" ++ gzip( JSON ) )
//! ```
//!
//! The `SBAE` marker is optional on input (older exports omit it) and always
//! written on output.
//!
//! ## Script Slots
//!
//! Any JSON object with a non-empty string `byteCode` field is a script slot.
//! Its payload is base64 of UTF-8 source text. Decoding gives every slot a
//! unique file name derived from its `name` field:
//!
//! ```text
//! {"name": "Test", "byteCode": "..."}   -> Test.cs
//! {"name": "Test", "byteCode": "..."}   -> Test_1.cs
//! {"byteCode": "..."}                   -> script_2.cs
//! ```
//!
//! Encoding derives the names again the same way and writes each script to
//! the slot of the same name, so edits reach the right slot even when names
//! repeat or the tree was restructured.
//!
//! ## Templates
//!
//! A template is an export tree whose slots hold a file name such as
//! `Greeting.cs` instead of a payload. [`ExportEncoder::encode_template`] fills
//! them from loaded files and refuses to encode if any file is missing.
//!
//! ```
//! use sbexport::{ExportDecoder, ExportEncoder, ScriptMap};
//! use serde_json::json;
//!
//! let template = json!({"name": "Demo", "byteCode": "Demo.cs"});
//! let files = ScriptMap::from_sources([("Demo.cs", "// hi")])?;
//!
//! let outcome = ExportEncoder::new().encode_template(&template, &files)?;
//! let export = ExportDecoder::new().decode(&outcome.transport)?;
//! assert_eq!(export.scripts.source("Demo.cs"), Some("// hi"));
//! # Ok::<(), sbexport::Error>(())
//! ```

pub mod archive;
pub mod codec;
pub mod compress;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod naming;
pub mod scripts;
pub mod stats;
pub mod template;
pub mod tree;

pub use archive::{ArchiveFile, ScriptArchive};
pub use config::{ExportConfig, MatchMode};
pub use decoder::{Export, ExportDecoder};
pub use encoder::{EncodeOutcome, ExportEncoder};
pub use error::{Error, Result, Stage};
pub use scripts::{extract, inject, Script, ScriptMap};
pub use stats::ExportStats;
pub use template::TemplateAssembler;
pub use tree::SlotPath;
