// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Tokens command - print the token stream of a JSON document.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Args;
use serde::Serialize;

use crate::common::{read_json, Result};
use structcodec::backend::{BufferSink, JsonSource};
use structcodec::{transcode, CodecConfig, FieldIndexRef, Sink};

/// Print every token with the path it was produced at.
#[derive(Args, Clone, Debug)]
pub struct TokensCmd {
    /// Input JSON document
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Output as JSON
    #[arg(short, long)]
    json: bool,
}

impl TokensCmd {
    pub fn run(self, config: &CodecConfig) -> Result<()> {
        let doc = read_json(&self.input)?;
        let mut source = JsonSource::with_max_depth(&doc, config.max_depth);
        let mut recorder = PathRecorder::new(config.max_depth);
        transcode(&mut source, &mut recorder)
            .with_context(|| format!("cannot tokenize {}", self.input.display()))?;
        let lines = recorder.finish()?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&lines)?);
        } else {
            for line in &lines {
                println!("{}\t{}", line.path, line.token);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct TokenLine {
    path: String,
    token: String,
}

/// Sink that records each token with the path it was written at.
struct PathRecorder {
    inner: BufferSink,
    lines: Vec<TokenLine>,
}

impl PathRecorder {
    fn new(max_depth: usize) -> Self {
        Self {
            inner: BufferSink::with_max_depth(max_depth),
            lines: Vec::new(),
        }
    }

    fn finish(self) -> structcodec::Result<Vec<TokenLine>> {
        self.inner.finish()?;
        Ok(self.lines)
    }

    fn record<F>(&mut self, write: F) -> structcodec::Result<()>
    where
        F: FnOnce(&mut BufferSink) -> structcodec::Result<()>,
    {
        let path = self.inner.path();
        write(&mut self.inner)?;
        if let Some(token) = self.inner.tokens().last() {
            self.lines.push(TokenLine {
                path,
                token: token.to_string(),
            });
        }
        Ok(())
    }
}

impl Sink for PathRecorder {
    fn put_null(&mut self) -> structcodec::Result<()> {
        self.record(|sink| sink.put_null())
    }

    fn put_int(&mut self, value: i32) -> structcodec::Result<()> {
        self.record(|sink| sink.put_int(value))
    }

    fn put_long(&mut self, value: i64) -> structcodec::Result<()> {
        self.record(|sink| sink.put_long(value))
    }

    fn put_double(&mut self, value: f64) -> structcodec::Result<()> {
        self.record(|sink| sink.put_double(value))
    }

    fn put_boolean(&mut self, value: bool) -> structcodec::Result<()> {
        self.record(|sink| sink.put_boolean(value))
    }

    fn put_string(&mut self, value: &str) -> structcodec::Result<()> {
        self.record(|sink| sink.put_string(value))
    }

    fn begin_array(&mut self) -> structcodec::Result<()> {
        self.record(|sink| sink.begin_array())
    }

    fn end_array(&mut self) -> structcodec::Result<()> {
        self.record(|sink| sink.end_array())
    }

    fn begin_struct(&mut self, fields: FieldIndexRef) -> structcodec::Result<()> {
        self.record(|sink| sink.begin_struct(fields))
    }

    fn put_field(&mut self, index: usize) -> structcodec::Result<()> {
        self.record(|sink| sink.put_field(index))
    }

    fn end_struct(&mut self, fields: &FieldIndexRef) -> structcodec::Result<()> {
        self.record(|sink| sink.end_struct(fields))
    }

    fn path(&self) -> String {
        self.inner.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_recorder_paths() {
        let doc = json!({"tags": ["a", 1]});
        let mut source = JsonSource::new(&doc);
        let mut recorder = PathRecorder::new(8);
        transcode(&mut source, &mut recorder).unwrap();
        let lines = recorder.finish().unwrap();
        let rendered: Vec<String> = lines
            .iter()
            .map(|l| format!("{} {}", l.path, l.token))
            .collect();
        assert_eq!(
            rendered,
            vec![
                "$ StructStart",
                "$ Field(\"tags\")",
                "$.tags ArrayStart",
                "$.tags[0] String(\"a\")",
                "$.tags[1] Int(1)",
                "$.tags[2] ArrayEnd",
                "$ StructEnd",
            ]
        );
    }
}
