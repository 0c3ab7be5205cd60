//! Landmark stream replay source
//!
//! The live system receives frames as engine callbacks; the CLI harness
//! replays them from a JSONL file instead (one inbound stream frame per
//! line, the format a landmark engine bridge writes). Blank lines are
//! skipped so hand-edited fixtures stay easy to work with.

use crate::landmark::types::StreamFrame;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

/// Streaming JSONL reader over inbound landmark frames.
pub struct JsonlSource {
    lines: Lines<BufReader<File>>,
    line_no: usize,
}

impl JsonlSource {
    /// Open a JSONL stream file.
    pub fn open(path: &Path) -> crate::Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            lines: BufReader::new(file).lines(),
            line_no: 0,
        })
    }
}

impl Iterator for JsonlSource {
    type Item = crate::Result<StreamFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            return Some(serde_json::from_str::<StreamFrame>(&line).map_err(|e| {
                crate::Error::Capture(format!(
                    "invalid stream frame at line {}: {e}",
                    self.line_no
                ))
            }));
        }
    }
}

/// Read an entire stream file into memory.
pub fn load_frames(path: &Path) -> crate::Result<Vec<StreamFrame>> {
    JsonlSource::open(path)?.collect()
}
