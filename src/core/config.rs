// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Codec configuration.
//!
//! ```toml
//! case_field = "@case"
//! max_depth = 128
//! strict = false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{CodecError, Result};

/// Reserved field name that carries a union's case name.
pub const DEFAULT_CASE_FIELD: &str = "@case";

/// Default nesting limit enforced by the in-crate backends.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Tunables shared by the resolver and the in-crate backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodecConfig {
    /// Discriminator field used by union binders
    pub case_field: String,
    /// Maximum struct/array nesting depth
    pub max_depth: usize,
    /// Treat accumulated diagnostics as a failure at the end of a decode
    pub strict: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            case_field: DEFAULT_CASE_FIELD.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
            strict: false,
        }
    }
}

impl CodecConfig {
    /// Parse a configuration from TOML text and validate it.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: CodecConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            CodecError::backend("toml", format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.case_field.is_empty() {
            return Err(CodecError::backend("toml", "case_field must not be empty"));
        }
        if self.max_depth == 0 {
            return Err(CodecError::backend("toml", "max_depth must be at least 1"));
        }
        Ok(())
    }

    /// Builder-style override of the discriminator field.
    pub fn with_case_field(mut self, case_field: impl Into<String>) -> Self {
        self.case_field = case_field.into();
        self
    }

    /// Builder-style override of strict mode.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}
