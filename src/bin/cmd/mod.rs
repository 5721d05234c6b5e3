// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! CLI subcommands.

mod config;
mod tokens;
mod transcode;

pub use config::CheckConfigCmd;
pub use tokens::TokensCmd;
pub use transcode::TranscodeCmd;
