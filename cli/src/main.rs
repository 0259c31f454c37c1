use std::path::{Component, Path, PathBuf};
use std::sync::Once;

use anyhow::Context;
use clap::{Parser, Subcommand};
use mf6_core::config::{BUILTIN_VARIANT, DEFAULT_MAX_FILE_SIZE_MB};
use mf6_core::docs::{HoverContext, compose_hover, default_providers};
use mf6_core::reference::reference_data;
use mf6_core::xref::{self, DefinitionLookup, ParentLookup};
use mf6_core::{Document, Settings, TextPosition};

mod report;

static TRACE_INIT: Once = Once::new();
const DEFAULT_TRACE_FILTER: &str = "mf6_core=debug,mf6_cli=info";

#[derive(Debug, Parser)]
#[command(name = "mf6", author, version, about = "Outline, hover and navigation for MODFLOW 6 files", long_about = None)]
struct CliArgs {
    #[command(subcommand)]
    command: Commands,

    /// Reference data variant, loaded from `<reference-dir>/<variant>.json`
    #[arg(long, global = true, default_value = BUILTIN_VARIANT)]
    dfn_version: String,

    /// Directory holding reference data snapshots
    #[arg(long, global = true, value_parser = parse_sanitized_path)]
    reference_dir: Option<PathBuf>,

    /// Files above this size (in MB) are not read while resolving references
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_FILE_SIZE_MB)]
    max_file_size_mb: f64,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the block outline of an input file, or the run outline of a `.lst` file.
    Outline {
        #[arg(value_name = "FILE", value_parser = parse_sanitized_path)]
        file: PathBuf,
        /// Emit JSON instead of an indented tree
        #[arg(long)]
        json: bool,
    },
    /// Show the documentation for the token at LINE:COL (1-based).
    Hover {
        #[arg(value_name = "FILE", value_parser = parse_sanitized_path)]
        file: PathBuf,
        line: usize,
        col: usize,
    },
    /// Resolve the file name at LINE:COL (1-based) next to FILE.
    Definition {
        #[arg(value_name = "FILE", value_parser = parse_sanitized_path)]
        file: PathBuf,
        line: usize,
        col: usize,
    },
    /// Find the sibling file that references FILE.
    Parent {
        #[arg(value_name = "FILE", value_parser = parse_sanitized_path)]
        file: PathBuf,
    },
}

impl CliArgs {
    fn settings(&self) -> Settings {
        Settings {
            max_file_size_mb: self.max_file_size_mb,
            variant: self.dfn_version.clone(),
            reference_dir: self.reference_dir.clone(),
        }
    }
}

fn read_file_content(path: &Path) -> anyhow::Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read file '{}'", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn sanitize_path(raw: &str) -> anyhow::Result<PathBuf> {
    let p = Path::new(raw);

    for comp in p.components() {
        if matches!(comp, Component::ParentDir) {
            return Err(anyhow::anyhow!(
                "Parent directory components ('..') are not allowed in file paths."
            ));
        }
    }

    Ok(p.to_path_buf())
}

fn parse_sanitized_path(raw: &str) -> Result<PathBuf, String> {
    sanitize_path(raw).map_err(|e| e.to_string())
}

/// Convert a 1-based LINE:COL pair into a document position.
fn cursor(line: usize, col: usize) -> anyhow::Result<TextPosition> {
    if line == 0 || col == 0 {
        anyhow::bail!("LINE and COL are 1-based");
    }
    Ok(TextPosition::new(line - 1, col - 1))
}

fn env_toggle_enabled(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return false;
    }
    !(trimmed.eq_ignore_ascii_case("0") || trimmed.eq_ignore_ascii_case("false") || trimmed.eq_ignore_ascii_case("off"))
}

fn filter_expr_from(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("1")
        || trimmed.eq_ignore_ascii_case("true")
        || trimmed.eq_ignore_ascii_case("on")
    {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn maybe_init_tracing() {
    let raw = match std::env::var("MF6_TRACE") {
        Ok(value) => value,
        Err(_) => return,
    };

    if !env_toggle_enabled(&raw) {
        return;
    }

    TRACE_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        use tracing_subscriber::fmt;

        let filter_expr = filter_expr_from(&raw).or_else(|| std::env::var("RUST_LOG").ok());

        let builder = fmt().with_writer(std::io::stderr);

        let builder = match filter_expr.and_then(|expr| EnvFilter::try_new(expr).ok()) {
            Some(filter) => builder.with_env_filter(filter),
            None => builder.with_env_filter(DEFAULT_TRACE_FILTER),
        };

        let _ = builder.try_init();
    });
}

fn main() -> anyhow::Result<()> {
    maybe_init_tracing();

    let args = CliArgs::parse();
    let settings = args.settings();
    tracing::debug!("settings: {:?}", settings);

    match args.command {
        Commands::Outline { file, json } => {
            let src = read_file_content(&file)?;
            let doc = Document::with_path(&src, &file);
            let outline = mf6_core::outline(&doc, &reference_data(&settings));
            if json {
                println!("{}", report::outline_json(&file, &outline)?);
            } else {
                print!("{}", report::outline_tree(&outline));
            }
        }
        Commands::Hover { file, line, col } => {
            let position = cursor(line, col)?;
            let src = read_file_content(&file)?;
            let doc = Document::with_path(&src, &file);
            let reference = reference_data(&settings);
            let ctx = HoverContext::new(&doc, position, &reference);
            match compose_hover(&default_providers(), &ctx) {
                Some(markdown) => println!("{}", markdown),
                None => {
                    eprintln!("No documentation at {}", position);
                    std::process::exit(1);
                }
            }
        }
        Commands::Definition { file, line, col } => {
            let position = cursor(line, col)?;
            let src = read_file_content(&file)?;
            let doc = Document::with_path(&src, &file);
            match xref::definition_at(&doc, position, settings.max_file_size_bytes())? {
                Some(DefinitionLookup::Found(path)) => println!("{}", path.display()),
                Some(lookup) => {
                    if let Some(message) = lookup.message(&settings.max_file_size_label()) {
                        eprintln!("{}", message);
                    }
                    std::process::exit(1);
                }
                None => {
                    eprintln!("No file name at {}", position);
                    std::process::exit(1);
                }
            }
        }
        Commands::Parent { file } => match xref::find_parent(&file, settings.max_file_size_bytes())? {
            ParentLookup::Found(path) => println!("{}", path.display()),
            lookup @ ParentLookup::TopLevel => {
                if let Some(message) = lookup.message(&settings.max_file_size_label()) {
                    println!("{}", message);
                }
            }
            lookup @ ParentLookup::NotFound { .. } => {
                if let Some(message) = lookup.message(&settings.max_file_size_label()) {
                    eprintln!("{}", message);
                }
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
