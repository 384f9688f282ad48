// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Command-line interface for convo2md.
//!
//! This binary provides the `convo2md` command for converting exported
//! conversation logs from JSON to Markdown.

use convo2md::pipeline::{self, Options, RenderMode};
use lexopt::prelude::*;
use snafu::prelude::*;
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Default output location, relative to the working directory.
const DEFAULT_OUTPUT: &str = "output";

/// How much the run logs when `RUST_LOG` is not set.
#[derive(Clone, Copy)]
enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

struct Cli {
    input: PathBuf,
    output: PathBuf,
    config: Option<PathBuf>,
    mode: RenderMode,
    single_file: Option<bool>,
    dry_run: bool,
    verbosity: Verbosity,
}

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("failed to parse arguments: {source}"))]
    ParseArgs { source: lexopt::Error },

    #[snafu(display("failed to initialise logging: {message}"))]
    Logging { message: String },
}

fn print_help() {
    println!(
        "\
{name} {version}
Convert exported conversation logs (JSON) to Markdown

Usage: {name} [OPTIONS] <INPUT>

Arguments:
  <INPUT>  JSON export holding an array of conversations

Options:
  -o, --output <PATH>   Output file (single-file mode) or directory (default: {output})
  -c, --config <PATH>   TOML file selecting which fields to include
      --nested          Render every field of the raw records instead of the configured ones
      --single-file     Write all conversations into one file
      --split           Write one file per conversation

Other options:
  -n, --dry-run         Show what would be written without writing
  -q, --quiet           Only log warnings and errors
  -v, --verbose         Log every stage in detail
  -h, --help            Print help
  -V, --version         Print version

RUST_LOG overrides the log level (e.g. RUST_LOG=convo2md=debug).",
        name = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
        output = DEFAULT_OUTPUT,
    );
}

fn parse_args() -> Result<Cli, lexopt::Error> {
    // Show help if no arguments provided
    if std::env::args().len() == 1 {
        print_help();
        std::process::exit(0);
    }

    let mut input: Option<PathBuf> = None;
    let mut output = PathBuf::from(DEFAULT_OUTPUT);
    let mut config = None;
    let mut mode = RenderMode::Flat;
    let mut single_file = None;
    let mut dry_run = false;
    let mut verbosity = Verbosity::Normal;

    let mut parser = lexopt::Parser::from_env();
    while let Some(arg) = parser.next()? {
        match arg {
            Short('o') | Long("output") => output = parser.value()?.parse()?,
            Short('c') | Long("config") => config = Some(parser.value()?.parse()?),
            Long("nested") => mode = RenderMode::Nested,
            // Layout flags - last one wins
            Long("single-file") => single_file = Some(true),
            Long("split") => single_file = Some(false),
            Short('n') | Long("dry-run") => dry_run = true,
            Short('q') | Long("quiet") => verbosity = Verbosity::Quiet,
            Short('v') | Long("verbose") => verbosity = Verbosity::Verbose,
            Short('h') | Long("help") => {
                print_help();
                std::process::exit(0);
            }
            Short('V') | Long("version") => {
                println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            Value(val) => {
                if input.is_some() {
                    return Err(lexopt::Error::UnexpectedArgument(val));
                }
                input = Some(val.parse()?);
            }
            _ => return Err(arg.unexpected()),
        }
    }

    Ok(Cli {
        input: input.ok_or("missing required argument: <INPUT>")?,
        output,
        config,
        mode,
        single_file,
        dry_run,
        verbosity,
    })
}

/// Installs the log subscriber; `RUST_LOG` wins over the verbosity flags.
fn init_tracing(verbosity: Verbosity) -> Result<(), Error> {
    let default_level = match verbosity {
        Verbosity::Quiet => "warn",
        Verbosity::Normal => "info",
        Verbosity::Verbose => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(matches!(verbosity, Verbosity::Verbose))
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .map_err(|err| {
            LoggingSnafu {
                message: err.to_string(),
            }
            .build()
        })
}

fn main() -> Result<(), Error> {
    let cli = parse_args().context(ParseArgsSnafu)?;
    init_tracing(cli.verbosity)?;

    let opts = Options {
        input: cli.input,
        config: cli.config,
        output: cli.output,
        mode: cli.mode,
        single_file: cli.single_file,
        dry_run: cli.dry_run,
    };

    // Failures are logged by the stage that hit them
    if pipeline::run(&opts).is_none() {
        warn!("no Markdown output was written");
    }
    Ok(())
}
