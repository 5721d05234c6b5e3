// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Check-config command - validate a configuration file.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Args;

use crate::common::{load_config, Result};

/// Parse and validate a TOML configuration, then print the effective values.
#[derive(Args, Clone, Debug)]
pub struct CheckConfigCmd {
    /// Configuration file
    #[arg(value_name = "FILE")]
    input: PathBuf,
}

impl CheckConfigCmd {
    pub fn run(self) -> Result<()> {
        let config = load_config(Some(&self.input))?;
        let effective = toml::to_string(&config).context("cannot render configuration")?;
        println!("{}: ok", self.input.display());
        print!("{effective}");
        Ok(())
    }
}
