// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # structcodec CLI
//!
//! Drive the token protocol from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Print the token stream of a JSON document with paths
//! structcodec tokens doc.json
//!
//! # Copy a document through the generic transcoder
//! structcodec transcode doc.json -o copy.json --pretty
//!
//! # Validate a configuration file
//! structcodec check-config codec.toml
//! ```

mod cmd;
mod common;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use cmd::{CheckConfigCmd, TokensCmd, TranscodeCmd};
use common::{load_config, report_error, Result};

/// structcodec - structured-data codec toolkit
#[derive(Parser, Clone)]
#[command(name = "structcodec")]
#[command(about = "Inspect and transcode documents through the structcodec token protocol", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "ArcheBase")]
struct Cli {
    /// Codec configuration file (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Clone)]
enum Commands {
    /// Print the token stream of a JSON document
    Tokens(TokensCmd),

    /// Copy a JSON document through the generic transcoder
    Transcode(TranscodeCmd),

    /// Validate a configuration file
    CheckConfig(CheckConfigCmd),
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Tokens(cmd) => cmd.run(&config),
        Commands::Transcode(cmd) => cmd.run(&config),
        Commands::CheckConfig(cmd) => cmd.run(),
    }
}

fn main() {
    if let Err(e) = run() {
        report_error(&e);
        process::exit(1);
    }
}
