// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Common utilities for CLI commands.

use std::fs;
use std::path::Path;

use anyhow::Context as _;
use structcodec::{CodecConfig, CodecError};

pub use anyhow::Result as CliResult;
pub type Result<T = ()> = CliResult<T>;

/// Load the configuration named by `--config`, or the defaults.
pub fn load_config(path: Option<&Path>) -> Result<CodecConfig> {
    match path {
        Some(path) => CodecConfig::load(path)
            .with_context(|| format!("invalid configuration {}", path.display())),
        None => Ok(CodecConfig::default()),
    }
}

/// Read and parse a JSON document.
pub fn read_json(path: &Path) -> Result<serde_json::Value> {
    let text =
        fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    let doc = serde_json::from_str(&text)
        .map_err(CodecError::from)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    Ok(doc)
}

/// Write `text` to `path`, or to stdout when no path is given.
pub fn write_output(path: Option<&Path>, text: &str) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("cannot write {}", path.display()))
        }
        None => {
            println!("{text}");
            Ok(())
        }
    }
}

/// Print an error with its cause chain, plus the structured fields of a
/// codec error when one is in the chain.
pub fn report_error(error: &anyhow::Error) {
    eprintln!("Error: {error:#}");
    if let Some(codec) = error.downcast_ref::<CodecError>() {
        eprintln!("  kind: {}", codec.kind());
        for (key, value) in codec.log_fields() {
            eprintln!("  {key}: {value}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_without_path() {
        assert_eq!(load_config(None).unwrap(), CodecConfig::default());
    }

    #[test]
    fn test_missing_file_has_context() {
        let err = read_json(Path::new("/nonexistent/doc.json")).unwrap_err();
        assert!(format!("{err:#}").contains("cannot read /nonexistent/doc.json"));
    }
}
