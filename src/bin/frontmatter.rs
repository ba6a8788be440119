//! frontmatter CLI
//!
//! Split documents into front matter and body, or check which documents
//! carry front matter.

use anyhow::{Context, Result};
use clap::{Parser as ClapParser, Subcommand};
use frontmatter::{default_formats, Format, Parser};
use serde_json::Value;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Name used for standard input
const STDIN_NAME: &str = "-";

#[derive(ClapParser, Debug)]
#[command(name = "frontmatter")]
#[command(author = "nzinfo <li.monan@gmail.com>")]
#[command(version)]
#[command(about = "Front matter extraction tool")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Split documents into metadata (as JSON) and body
    Split {
        /// Files and directories to process (default: stdin)
        inputs: Vec<PathBuf>,

        /// Directory to write `<name>.json` and `<name>.body` to (default: stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Only emit the metadata
        #[arg(long, conflicts_with = "body_only")]
        meta_only: bool,

        /// Only emit the body
        #[arg(long)]
        body_only: bool,

        /// Fail on documents without front matter
        #[arg(long)]
        must: bool,
    },

    /// Report which documents carry front matter
    Check {
        /// Files and directories to check (default: stdin)
        inputs: Vec<PathBuf>,

        /// Count documents without front matter as failures
        #[arg(long)]
        must: bool,
    },
}

/// A document to process
#[derive(Debug, Clone, PartialEq, Eq)]
struct Input {
    /// Source path, `None` for stdin
    path: Option<PathBuf>,
    /// Name relative to the given input, used for output files
    name: String,
}

impl Input {
    fn open(&self) -> Result<Box<dyn Read>> {
        match &self.path {
            Some(path) => {
                let file = fs::File::open(path)
                    .with_context(|| format!("Failed to open: {}", path.display()))?;
                Ok(Box::new(file))
            }
            None => Ok(Box::new(io::stdin())),
        }
    }
}

/// Decoded metadata and the delimiter that opened it
#[derive(Debug, Default)]
struct Matter {
    delimiter: Option<String>,
    meta: Value,
}

/// Which parts of a split document to emit
#[derive(Debug, Clone, Copy)]
struct SplitOptions {
    meta: bool,
    body: bool,
    must: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Split { inputs, output, meta_only, body_only, must } => {
            let options = SplitOptions {
                meta: !body_only,
                body: !meta_only,
                must,
            };
            split_documents(&collect_inputs(&inputs)?, output.as_deref(), options)?;
        }
        Commands::Check { inputs, must } => {
            let failures = check_documents(&collect_inputs(&inputs)?, must, &mut io::stdout().lock())?;
            if failures > 0 {
                anyhow::bail!("{} document(s) failed the check", failures);
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Built-in formats decoding into JSON values, tagged with their delimiter
fn tagged_formats() -> Vec<Format<Matter>> {
    default_formats::<Value>()
        .into_iter()
        .map(|format| {
            let start = format.start.clone();
            let end = format.end.clone();
            let (unmarshal_delims, requires_new_line) = (format.unmarshal_delims, format.requires_new_line);
            Format::new(start.clone(), end, move |data: &[u8], matter: &mut Matter| {
                format.unmarshal(data, &mut matter.meta)?;
                matter.delimiter = Some(start.clone());
                Ok(())
            })
            .with_unmarshal_delims(unmarshal_delims)
            .with_requires_new_line(requires_new_line)
        })
        .collect()
}

/// Expand the command line inputs into documents; stdin when empty
fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<Input>> {
    if inputs.is_empty() || (inputs.len() == 1 && inputs[0] == Path::new(STDIN_NAME)) {
        return Ok(vec![Input { path: None, name: STDIN_NAME.to_string() }]);
    }

    let mut documents = Vec::new();
    for input in inputs {
        if input.is_dir() {
            add_directory(&mut documents, input)?;
        } else {
            let name = input.file_name()
                .ok_or_else(|| anyhow::anyhow!("Invalid filename: {}", input.display()))?
                .to_string_lossy()
                .to_string();
            documents.push(Input { path: Some(input.clone()), name });
        }
    }
    Ok(documents)
}

fn add_directory(documents: &mut Vec<Input>, dir: &Path) -> Result<()> {
    let entries = walkdir::WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file());

    for entry in entries {
        let path = entry.path();
        let relative_path = path.strip_prefix(dir)
            .map_err(|_| anyhow::anyhow!("Failed to get relative path"))?;

        let name = relative_path.to_string_lossy().replace('\\', "/");
        documents.push(Input { path: Some(path.to_path_buf()), name });
    }

    Ok(())
}

fn split_documents(inputs: &[Input], output: Option<&Path>, options: SplitOptions) -> Result<()> {
    let parser = Parser::with_formats(tagged_formats());
    let mut buf = Vec::new();
    let stdout = io::stdout();
    let mut stdout = stdout.lock();

    for input in inputs {
        let mut matter = Matter::default();
        let result = if options.must {
            parser.must_parse_with_buffer(&mut buf, input.open()?, &mut matter)
        } else {
            parser.parse_with_buffer(&mut buf, input.open()?, &mut matter)
        };
        let body = result.with_context(|| format!("Failed to split: {}", input.name))?;

        let meta = serde_json::to_string_pretty(&matter.meta)?;
        match output {
            Some(dir) => write_split(dir, &input.name, &meta, body, options)?,
            None => {
                if inputs.len() > 1 {
                    writeln!(stdout, "==> {} <==", input.name)?;
                }
                if options.meta {
                    writeln!(stdout, "{}", meta)?;
                }
                if options.body {
                    stdout.write_all(body)?;
                }
            }
        }
    }

    Ok(())
}

fn write_split(dir: &Path, name: &str, meta: &str, body: &[u8], options: SplitOptions) -> Result<()> {
    let base = dir.join(name);
    if let Some(parent) = base.parent() {
        fs::create_dir_all(parent)?;
    }

    if options.meta {
        let path = with_suffix(&base, "json");
        fs::write(&path, meta)
            .with_context(|| format!("Failed to write: {}", path.display()))?;
    }
    if options.body {
        let path = with_suffix(&base, "body");
        fs::write(&path, body)
            .with_context(|| format!("Failed to write: {}", path.display()))?;
    }

    tracing::debug!(name, dir = %dir.display(), "document split");
    Ok(())
}

/// Append `.suffix` to the full file name, keeping its own extension
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// Print one status line per document and return the number of failures
fn check_documents(inputs: &[Input], must: bool, out: &mut impl Write) -> Result<usize> {
    let parser = Parser::with_formats(tagged_formats());
    let mut buf = Vec::new();
    let mut failures = 0;

    for input in inputs {
        let mut matter = Matter::default();
        match parser.parse_with_buffer(&mut buf, input.open()?, &mut matter) {
            Ok(_) => match matter.delimiter {
                Some(delimiter) => writeln!(out, "{}: {}", input.name, delimiter)?,
                None => {
                    if must {
                        failures += 1;
                    }
                    writeln!(out, "{}: none", input.name)?;
                }
            },
            Err(err) => {
                failures += 1;
                writeln!(out, "{}: error: {}", input.name, err)?;
            }
        }
    }

    Ok(failures)
}
