//! Command-line driver for stripping LaTeX-like markup and producing
//! bidirectional position maps.
//!
//! Two subcommands: `list` (the set of command names found across inputs)
//! and `clean` (cleaned text, or the position map in text or JSON form).
//! Everything ambient here — catalog discovery, logging, diagnostic
//! rendering — lives outside [`detex_core`], which stays a pure library.

mod render;

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser as ClapParser, Subcommand};
use detex_catalog::{discover, CatalogError, CommandCatalog, CommandPrototype};
use detex_core::{parse_str, render as render_tree, CleanConfig, Error, RootPosMap};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const CATALOG_FILE_NAME: &str = "detex-commands.json";

/// Strip LaTeX-like markup from text and track where everything moved.
#[derive(Debug, ClapParser)]
#[command(name = "detex", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the set of command names found in the inputs, sorted and deduplicated.
    List {
        /// Source files to scan.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Follow `\input{path}` and fold the included file's commands in too.
        #[arg(long)]
        expand_input: bool,
        /// Write the result to this path instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Dump the raw token stream and top-level AST elements before proceeding.
        #[arg(long)]
        debug: bool,
    },
    /// Clean markup out of the inputs, or print their position map.
    Clean {
        /// Source files to clean.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Resolve and splice in `\input{path}` instead of discarding it.
        #[arg(long)]
        expand_input: bool,
        /// Write the result to this path instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Emit the position map as JSON instead of cleaned text.
        #[arg(long)]
        json: bool,
        /// Emit cleaned text (the default; explicit for scripting clarity).
        #[arg(long)]
        clean: bool,
        /// Emit the position map in the stable text format.
        #[arg(long)]
        map: bool,
        /// With `--json`, skip pretty-printing.
        #[arg(long)]
        ugly_json: bool,
        /// Dump the raw token stream and top-level AST elements before proceeding.
        #[arg(long)]
        debug: bool,
    },
}

/// A core error that should be rendered as a `Diagnostic` before exiting,
/// versus any other failure that falls back to anyhow's default reporting.
///
/// Keeping this distinct from `anyhow::Error` lets `run_list`/`run_clean`
/// return normally (dropping and flushing their output writer) even when a
/// later input in a multi-file invocation fails — the diagnostic is only
/// rendered and the process only exits once control reaches `main`.
enum CliError {
    /// Render `err` as a diagnostic over `source`/`filename`, then exit 2.
    Diagnostic {
        source: String,
        filename: String,
        err: Error,
    },
    /// Any other failure; reported via anyhow's default exit-1 path.
    Other(anyhow::Error),
}

impl From<anyhow::Error> for CliError {
    fn from(e: anyhow::Error) -> Self {
        CliError::Other(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Other(e.into())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Other(e.into())
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::List {
            inputs,
            expand_input,
            output,
            debug: dump_debug,
        } => run_list(&inputs, expand_input, output.as_deref(), dump_debug),
        Command::Clean {
            inputs,
            expand_input,
            output,
            json,
            clean,
            map,
            ugly_json,
            debug: dump_debug,
        } => {
            let format = OutputSelection { json, clean, map }.resolve();
            run_clean(&inputs, expand_input, output.as_deref(), format, ugly_json, dump_debug)
        }
    };

    match result {
        Ok(()) => Ok(()),
        Err(CliError::Diagnostic { source, filename, err }) => {
            render::render_diagnostics_pretty(&source, &filename, std::slice::from_ref(&err.to_diagnostic()));
            // stdout is a process-global buffer; a handle drop inside run_clean/run_list
            // doesn't flush it, and process::exit skips the runtime's own flush-on-return.
            let _ = std::io::stdout().flush();
            std::process::exit(2);
        }
        Err(CliError::Other(e)) => Err(e),
    }
}

/// First-match among `--json`/`--clean`/`--map`, defaulting to `--clean`.
struct OutputSelection {
    json: bool,
    clean: bool,
    map: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CleanOutput {
    Json,
    Text,
    Map,
}

impl OutputSelection {
    fn resolve(&self) -> CleanOutput {
        if self.json {
            CleanOutput::Json
        } else if self.clean {
            CleanOutput::Text
        } else if self.map {
            CleanOutput::Map
        } else {
            CleanOutput::Text
        }
    }
}

fn load_catalog(start_dir: &Path) -> Result<CommandCatalog, CliError> {
    let packaged_default = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|d| d.join(CATALOG_FILE_NAME)));
    match discover(
        start_dir,
        CATALOG_FILE_NAME,
        CommandPrototype::Discard,
        packaged_default.as_deref(),
    ) {
        Ok(catalog) => {
            debug!(?start_dir, "catalog discovery succeeded");
            Ok(catalog)
        }
        Err(CatalogError::NoCommandFileFound) => {
            debug!(?start_dir, "no catalog file found, falling back to an empty catalog");
            Ok(CommandCatalog::new(CommandPrototype::Discard))
        }
        Err(e) => Err(CliError::Diagnostic {
            source: String::new(),
            filename: start_dir.display().to_string(),
            err: e.into(),
        }),
    }
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn open_output(path: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    match path {
        None => Ok(Box::new(std::io::stdout())),
        Some(p) => {
            let file = fs::File::create(p)
                .map_err(|_| anyhow::anyhow!("cannot open {} for writing", p.display()))?;
            Ok(Box::new(file))
        }
    }
}

fn parse_one(
    path: &Path,
    source: &str,
    catalog: &CommandCatalog,
    config: &CleanConfig,
) -> Result<detex_core::Node, CliError> {
    let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let filename = path.display().to_string();
    let start = std::time::Instant::now();
    let result = parse_str(source, catalog, config, filename.clone(), base_dir);
    debug!(file = %filename, elapsed = ?start.elapsed(), "parsed");
    result.map_err(|err| CliError::Diagnostic {
        source: source.to_string(),
        filename,
        err,
    })
}

fn dump_debug_info(path: &Path, source: &str, config: &CleanConfig, node: &detex_core::Node) {
    use detex_core::{Lexer, NodeKind};
    eprintln!("-- tokens: {} --", path.display());
    for tok in Lexer::new(source, config) {
        eprintln!("{:?}", tok.kind);
    }
    eprintln!("-- top-level elements: {} --", path.display());
    if let NodeKind::Root { elems, .. } = &node.kind {
        for elem in elems {
            eprintln!("{:?}", elem.kind);
        }
    }
}

fn run_list(
    inputs: &[PathBuf],
    expand_input: bool,
    output: Option<&Path>,
    dump_debug: bool,
) -> Result<(), CliError> {
    let config = if expand_input {
        CleanConfig::with_expand_input()
    } else {
        CleanConfig::default()
    };
    let mut names = BTreeSet::new();
    for path in inputs {
        let start_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let catalog = load_catalog(start_dir)?;
        let source = read_input(path)?;
        let node = parse_one(path, &source, &catalog, &config)?;
        if dump_debug {
            dump_debug_info(path, &source, &config, &node);
        }
        collect_command_names(&node, &mut names);
    }
    let mut out = open_output(output)?;
    for name in &names {
        writeln!(out, "{name}")?;
    }
    Ok(())
}

fn collect_command_names(node: &detex_core::Node, names: &mut BTreeSet<String>) {
    use detex_core::NodeKind;
    match &node.kind {
        NodeKind::Command { name, args, .. } => {
            names.insert(name.clone());
            for a in args {
                collect_command_names(a, names);
            }
        }
        NodeKind::Group(elems) | NodeKind::Root { elems, .. } => {
            for e in elems {
                collect_command_names(e, names);
            }
        }
        NodeKind::PlainText(_) | NodeKind::NewParagraph | NodeKind::Blank => {}
    }
}

fn run_clean(
    inputs: &[PathBuf],
    expand_input: bool,
    output: Option<&Path>,
    format: CleanOutput,
    ugly_json: bool,
    dump_debug: bool,
) -> Result<(), CliError> {
    let config = if expand_input {
        CleanConfig::with_expand_input()
    } else {
        CleanConfig::default()
    };
    let mut out = open_output(output)?;
    for path in inputs {
        let start_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let catalog = load_catalog(start_dir)?;
        let source = read_input(path)?;
        let mut node = parse_one(path, &source, &catalog, &config)?;
        if dump_debug {
            dump_debug_info(path, &source, &config, &node);
        }
        let cleaned = render_tree(&mut node, detex_core::ORIGIN).map_err(|err| CliError::Diagnostic {
            source: source.clone(),
            filename: path.display().to_string(),
            err,
        })?;
        match format {
            CleanOutput::Text => {
                write!(out, "{cleaned}")?;
            }
            CleanOutput::Map => {
                let posmap = RootPosMap::build(&node);
                writeln!(out, "{}", posmap.as_text())?;
            }
            CleanOutput::Json => {
                let posmap = RootPosMap::build(&node);
                let dict = posmap.as_dict();
                let json = if ugly_json {
                    serde_json::to_string(&dict)?
                } else {
                    serde_json::to_string_pretty(&dict)?
                };
                writeln!(out, "{json}")?;
            }
        }
    }
    Ok(())
}
