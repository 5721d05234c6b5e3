// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core types used throughout structcodec.
//!
//! This module provides the foundational types for the library:
//! - [`CodecError`] - Error kinds raised by the protocol, resolver and binders
//! - [`Diagnostic`] - Recoverable problems accumulated during a decode
//! - [`At`] / [`Token`] - The token vocabulary shared by every backend
//! - [`Value`] - Dynamic value tree used for passthrough and tests
//! - [`CodecConfig`] - Tunables loaded from TOML

pub mod config;
pub mod error;
pub mod token;
pub mod value;

pub use config::{CodecConfig, DEFAULT_CASE_FIELD, DEFAULT_MAX_DEPTH};
pub use error::{CodecError, Diagnostic, ErrorKind, Result};
pub use token::{At, Token};
pub use value::Value;
