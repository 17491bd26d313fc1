//! Command-line front end.
//!
//! The selection is read from a file or stdin; results go to stdout so the
//! command can be used as an editor filter. Logs go to stderr.

use crate::ask::{self, AskRequest};
use crate::comment::wrap_in_comment;
use crate::config::{self, Settings};
use crate::credentials;
use crate::error_classification::{classify_error, hint_for};
use crate::extensions::{default_extension_dirs, DirectoryExtensionHost, ExtensionHost};
use crate::resolver::resolve_comment_syntax;
use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::io::Read;
use std::ops::Range;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "dilly")]
#[command(about = "Ask a chat model about selected text and insert the answer as a comment")]
#[command(version)]
pub struct Cli {
    /// Additional extension directory to search (repeatable, before the command)
    #[arg(short = 'E', long = "extensions-dir", action = ArgAction::Append)]
    pub extensions_dirs: Vec<PathBuf>,

    /// Verbose output (debug logs on stderr)
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send the selection and an instruction to the API and print the reply
    Ask {
        /// Language id of the document (e.g. python, rust)
        #[arg(short = 'l', long = "language")]
        language: String,

        /// Instruction for the model
        #[arg(short = 'p', long = "prompt")]
        prompt: String,

        /// Document to read (default: stdin)
        #[arg(short = 'f', long = "file")]
        file: Option<PathBuf>,

        /// Selected byte range, START:END (default: whole document)
        #[arg(short = 'r', long = "range", value_parser = parse_range)]
        range: Option<Range<usize>>,

        /// Print the whole document with the reply inserted
        #[arg(short = 'a', long = "apply")]
        apply: bool,

        /// Insert the reply as-is instead of as a comment
        #[arg(long = "no-comment")]
        no_comment: bool,

        /// Model override
        #[arg(short = 'm', long = "model", env = "DILLY_MODEL")]
        model: Option<String>,
    },

    /// Print the comment syntax resolved for a language as JSON
    CommentSyntax {
        /// Language id
        language: String,
    },

    /// Wrap text in a language's comment syntax without calling the API
    Wrap {
        #[arg(short = 'l', long = "language")]
        language: String,

        /// File to read (default: stdin)
        #[arg(short = 'f', long = "file")]
        file: Option<PathBuf>,
    },

    /// List installed extensions and the languages they contribute
    Extensions,

    /// Store the API key in the system credential store
    SetKey {
        key: String,
    },

    /// Remove the API key from the system credential store
    DeleteKey,

    /// Write a settings file with defaults if none exists and print its path
    Init,
}

/// Parse `START:END` into a byte range.
pub(crate) fn parse_range(s: &str) -> Result<Range<usize>, String> {
    let (start, end) = s
        .split_once(':')
        .ok_or_else(|| format!("expected START:END, got \"{s}\""))?;
    let start: usize = start
        .trim()
        .parse()
        .map_err(|e| format!("invalid range start \"{start}\": {e}"))?;
    let end: usize = end
        .trim()
        .parse()
        .map_err(|e| format!("invalid range end \"{end}\": {e}"))?;
    if start > end {
        return Err(format!("range start {start} is after end {end}"));
    }
    Ok(start..end)
}

/// Slice `range` out of `document`, checking bounds and char boundaries.
pub(crate) fn select(document: &str, range: &Range<usize>) -> Result<String> {
    if range.end > document.len() {
        bail!(
            "range {}:{} is past the end of the document ({} bytes)",
            range.start,
            range.end,
            document.len()
        );
    }
    document
        .get(range.clone())
        .map(str::to_string)
        .with_context(|| format!("range {}:{} splits a UTF-8 character", range.start, range.end))
}

fn read_input(file: Option<&PathBuf>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn extension_host(settings: &Settings, extra: &[PathBuf]) -> DirectoryExtensionHost {
    let mut dirs = default_extension_dirs();
    dirs.extend(settings.extension_dirs.iter().cloned());
    dirs.extend(extra.iter().cloned());
    DirectoryExtensionHost::new(dirs)
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if verbose { "dilly_lib=debug,dilly=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Parse arguments, run the command and map failures to an exit code.
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            if let Some(hint) = hint_for(classify_error(&format!("{e:#}"))) {
                eprintln!("hint: {hint}");
            }
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: Cli) -> Result<()> {
    let mut settings = config::load_settings();
    let host = extension_host(&settings, &cli.extensions_dirs);
    tracing::debug!(dirs = ?host.dirs(), "extension directories");

    match cli.command {
        Commands::Ask {
            language,
            prompt,
            file,
            range,
            apply,
            no_comment,
            model,
        } => {
            if let Some(model) = model {
                settings.model = model;
            }
            if no_comment {
                settings.wrap_in_comment = false;
            }

            let document = read_input(file.as_ref())?;
            let range = range.unwrap_or(0..document.len());
            let request = AskRequest {
                selected_text: select(&document, &range)?,
                selection_start: range.start,
                prompt,
                language_id: language,
            };
            ask::validate(&request)?;

            let api_key = credentials::lookup_api_key(&settings);
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("failed to start async runtime")?;
            let insertion =
                runtime.block_on(ask::ask(&request, api_key.as_deref(), &settings, &host))?;

            if apply {
                print!("{}", insertion.apply(&document));
            } else {
                print!("{}", insertion.text);
            }
        }

        Commands::CommentSyntax { language } => {
            let descriptor = resolve_comment_syntax(&host, &language)?;
            println!("{}", serde_json::to_string_pretty(&descriptor)?);
        }

        Commands::Wrap { language, file } => {
            let text = read_input(file.as_ref())?;
            let descriptor = resolve_comment_syntax(&host, &language)?;
            print!("{}", wrap_in_comment(text.trim_end_matches('\n'), &descriptor));
        }

        Commands::Extensions => {
            for ext in host.installed_extensions() {
                if ext.languages.is_empty() {
                    continue;
                }
                println!("{}\t{}\t{}", ext.id, ext.languages.join(","), ext.root.display());
            }
        }

        Commands::SetKey { key } => {
            credentials::store_api_key(&key)?;
            eprintln!("API key stored in the system credential store");
        }

        Commands::DeleteKey => {
            credentials::delete_api_key()?;
            eprintln!("API key removed from the system credential store");
        }

        Commands::Init => {
            let path = config::settings_path();
            if path.exists() {
                println!("{}", path.display());
            } else {
                let written = config::save_settings(&Settings::default())
                    .map_err(anyhow::Error::msg)?;
                println!("{}", written.display());
            }
        }
    }

    Ok(())
}
