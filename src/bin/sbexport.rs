//! sbexport CLI
//!
//! Decode exports into scripts and JSON, and build exports from templates.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use sbexport::{
    Error, Export, ExportConfig, ExportDecoder, ExportEncoder, MatchMode, Script, ScriptArchive,
    ScriptMap,
};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sbexport")]
#[command(version)]
#[command(about = "Decode, inspect and re-encode SBAE exports")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Script file extension
    #[arg(long, global = true, default_value = ".cs")]
    extension: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode an export and write its scripts and tree
    Decode {
        /// File holding the transport string (default: stdin)
        #[arg(short = 'i', long)]
        input: Option<PathBuf>,

        /// Directory to write the scripts to
        #[arg(short = 'C', long)]
        directory: Option<PathBuf>,

        /// File to write the indented tree to
        #[arg(long)]
        json: Option<PathBuf>,

        /// Zip file to write scripts, tree and import file to
        #[arg(long)]
        zip: Option<PathBuf>,
    },

    /// List the scripts of an export
    #[command(name = "t")]
    List {
        /// File holding the transport string (default: stdin)
        #[arg(short = 'i', long)]
        input: Option<PathBuf>,

        /// Show sizes and slot paths
        #[arg(short, long)]
        long: bool,
    },

    /// Build an export from a template and script files
    Encode {
        /// Template JSON whose byteCode fields name script files
        #[arg(short = 't', long)]
        template: PathBuf,

        /// Script files or directories containing them
        #[arg(required = true)]
        scripts: Vec<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// Replace scripts (and optionally the tree) of an export and encode it again
    Reencode {
        /// File holding the transport string (default: stdin)
        #[arg(short = 'i', long)]
        input: Option<PathBuf>,

        /// Script files or directories with edited scripts
        scripts: Vec<PathBuf>,

        /// Edited tree JSON
        #[arg(long)]
        json: Option<PathBuf>,

        /// Also match scripts to slots by base name
        #[arg(long)]
        base_name: bool,

        /// Output file (default: stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = ExportConfig::new().with_script_extension(cli.extension);

    match cli.command {
        Commands::Decode { input, directory, json, zip } => {
            decode_export(&config, input, directory, json, zip)?;
        }
        Commands::List { input, long } => {
            list_scripts(&config, input, long)?;
        }
        Commands::Encode { template, scripts, output } => {
            encode_template(&config, &template, &scripts, output)?;
        }
        Commands::Reencode { input, scripts, json, base_name, output } => {
            let config = if base_name {
                config.with_match_mode(MatchMode::BaseName)
            } else {
                config
            };
            reencode_export(&config, input, &scripts, json, output)?;
        }
    }

    Ok(())
}

fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn read_transport(input: Option<PathBuf>) -> Result<String> {
    let transport = if let Some(input_path) = input {
        fs::read_to_string(&input_path)
            .with_context(|| format!("Failed to read: {}", input_path.display()))?
    } else {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    };

    if transport.trim().is_empty() {
        anyhow::bail!("Empty input");
    }
    Ok(transport)
}

fn decode(config: &ExportConfig, input: Option<PathBuf>) -> Result<Export> {
    let transport = read_transport(input)?;
    ExportDecoder::with_config(config.clone())
        .decode(&transport)
        .map_err(|e| {
            let stage = e.stage();
            anyhow::Error::new(e).context(format!("Decode failed at {} stage", stage))
        })
}

fn write_output(output: Option<PathBuf>, transport: &str) -> Result<()> {
    if let Some(output_path) = output {
        fs::write(&output_path, transport)
            .with_context(|| format!("Failed to write: {}", output_path.display()))?;
    } else {
        println!("{}", transport);
    }
    Ok(())
}

/// Load scripts from a mix of files and directories
fn load_scripts(paths: &[PathBuf], extension: &str) -> Result<ScriptMap> {
    let mut scripts = ScriptMap::new();
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            let loaded = ScriptMap::load_dir(path, extension)
                .with_context(|| format!("Failed to load scripts from: {}", path.display()))?;
            for script in &loaded {
                scripts.insert(Script::new(&script.name, &script.source))?;
            }
        } else {
            files.push(path.clone());
        }
    }

    let loaded = ScriptMap::load_files(&files).context("Failed to load script files")?;
    for script in &loaded {
        scripts.insert(Script::new(&script.name, &script.source))?;
    }

    Ok(scripts)
}

fn decode_export(
    config: &ExportConfig,
    input: Option<PathBuf>,
    directory: Option<PathBuf>,
    json: Option<PathBuf>,
    zip: Option<PathBuf>,
) -> Result<()> {
    let export = decode(config, input)?;
    println!("{}", export.stats());

    if export.scripts.is_empty() {
        eprintln!("No scripts found");
    }

    if let Some(dir) = directory {
        let written = ScriptArchive::scripts_only(&export)?
            .write_dir(&dir)
            .with_context(|| format!("Failed to write scripts to: {}", dir.display()))?;
        println!("Extracted {} scripts to {}", written, dir.display());
    }

    if let Some(json_path) = json {
        fs::write(&json_path, export.tree_json()?)
            .with_context(|| format!("Failed to write: {}", json_path.display()))?;
        println!("Wrote tree to {}", json_path.display());
    }

    if let Some(zip_path) = zip {
        ScriptArchive::from_export(&export, config)?
            .write_zip_file(&zip_path)
            .with_context(|| format!("Failed to write: {}", zip_path.display()))?;
        println!("Wrote archive {}", zip_path.display());
    }

    Ok(())
}

fn list_scripts(config: &ExportConfig, input: Option<PathBuf>, long: bool) -> Result<()> {
    let export = decode(config, input)?;

    for script in &export.scripts {
        if long {
            let origin = script
                .origin
                .as_ref()
                .map(|p| p.to_string())
                .unwrap_or_default();
            println!("{}  {}  {}", script.name, script.source.len(), origin);
        } else {
            println!("{}", script.name);
        }
    }

    Ok(())
}

fn encode_template(
    config: &ExportConfig,
    template_path: &Path,
    script_paths: &[PathBuf],
    output: Option<PathBuf>,
) -> Result<()> {
    let text = fs::read_to_string(template_path)
        .with_context(|| format!("Failed to read: {}", template_path.display()))?;
    let template: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("Invalid JSON: {}", template_path.display()))?;
    let files = load_scripts(script_paths, &config.script_extension)?;

    let encoder = ExportEncoder::with_config(config.clone());
    let outcome = match encoder.encode_template(&template, &files) {
        Ok(outcome) => outcome,
        Err(Error::MissingScripts(missing)) => {
            for name in &missing {
                eprintln!("Missing script: {}", name);
            }
            anyhow::bail!("{} referenced scripts were not found", missing.len());
        }
        Err(e) => return Err(e.into()),
    };

    write_output(output, &outcome.transport)?;
    eprintln!("Encoded {} scripts", outcome.injected);
    Ok(())
}

fn reencode_export(
    config: &ExportConfig,
    input: Option<PathBuf>,
    script_paths: &[PathBuf],
    json: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut export = decode(config, input)?;

    if let Some(json_path) = json {
        let text = fs::read_to_string(&json_path)
            .with_context(|| format!("Failed to read: {}", json_path.display()))?;
        export
            .replace_tree_json(&text)
            .with_context(|| format!("Edited tree rejected: {}", json_path.display()))?;
    }

    let edited = load_scripts(script_paths, &config.script_extension)?;
    let mut unknown = 0;
    for script in &edited {
        if !export.scripts.set_source(&script.name, script.source.clone()) {
            tracing::warn!(script = %script.name, "no extracted script with this name");
            unknown += 1;
        }
    }
    if unknown > 0 {
        eprintln!("Ignored {} scripts that are not part of the export", unknown);
    }

    let outcome = ExportEncoder::with_config(config.clone()).encode_export(&export)?;
    write_output(output, &outcome.transport)?;
    eprintln!("Re-encoded with {} scripts injected", outcome.injected);
    Ok(())
}
