use super::capturer::CapturedFrame;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const CAPTURE_INDEX_FILE: &str = "captures.jsonl";

/// Downstream consumer of accepted frames.
pub trait FrameSink: Send {
    fn submit(
        &mut self,
        frame: &CapturedFrame,
        timestamp_ms: u64,
        session_id: Option<&str>,
    ) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct CaptureRecord<'a> {
    file: &'a str,
    timestamp_ms: u64,
    width: u32,
    height: u32,
    bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<&'a str>,
}

/// Writes each capture as a JPEG and appends a line to `captures.jsonl`.
#[derive(Debug)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create capture directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn index_path(&self) -> PathBuf {
        self.dir.join(CAPTURE_INDEX_FILE)
    }
}

impl FrameSink for DirectorySink {
    fn submit(
        &mut self,
        frame: &CapturedFrame,
        timestamp_ms: u64,
        session_id: Option<&str>,
    ) -> Result<()> {
        let path = self.dir.join(&frame.file_name);
        fs::write(&path, &frame.bytes)
            .with_context(|| format!("failed to write {}", path.display()))?;

        let record = CaptureRecord {
            file: &frame.file_name,
            timestamp_ms,
            width: frame.width,
            height: frame.height,
            bytes: frame.bytes.len(),
            session_id,
        };
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');
        let index = self.index_path();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&index)
            .with_context(|| format!("failed to open {}", index.display()))?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }
}
