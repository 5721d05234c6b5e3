// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Transcode command - copy a JSON document through the token protocol.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Args;
use tracing::debug;

use crate::common::{read_json, write_output, Result};
use structcodec::backend::{JsonSink, JsonSource};
use structcodec::{transcode, CodecConfig};

/// Copy a document from a JSON source to a JSON sink.
#[derive(Args, Clone, Debug)]
pub struct TranscodeCmd {
    /// Input JSON document
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Output file (stdout when omitted)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Pretty-print the output
    #[arg(long)]
    pretty: bool,
}

impl TranscodeCmd {
    pub fn run(self, config: &CodecConfig) -> Result<()> {
        let doc = read_json(&self.input)?;
        let mut source = JsonSource::with_max_depth(&doc, config.max_depth);
        let mut sink = JsonSink::with_max_depth(config.max_depth);
        transcode(&mut source, &mut sink)
            .with_context(|| format!("cannot transcode {}", self.input.display()))?;
        let copy = sink.finish()?;
        debug!(input = %self.input.display(), "transcoded");

        let text = if self.pretty {
            serde_json::to_string_pretty(&copy)?
        } else {
            serde_json::to_string(&copy)?
        };
        write_output(self.output.as_deref(), &text)
    }
}
