//! Frame acquisition seam.
//!
//! Camera drivers live outside this crate; anything that can hand over the
//! most recent frame implements `FrameSource`. The one shipped implementation
//! watches a spool directory that the stream relay drops JPEG stills into.

use std::path::PathBuf;
use std::time::SystemTime;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use super::Frame;

/// Pull-based access to the latest available frame.
///
/// Returning `None` means no new frame has arrived since the previous call;
/// the monitor loop just skips that tick.
pub trait FrameSource: Send {
    fn latest_frame(&mut self) -> Result<Option<Frame>>;
}

/// Reads the newest image file out of a spool directory.
///
/// The cam relay writes a still every few hundred milliseconds and prunes old
/// ones; this source only ever decodes a file it has not returned before.
pub struct SpoolDirSource {
    dir: PathBuf,
    last_modified: Option<SystemTime>,
}

impl SpoolDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            last_modified: None,
        }
    }

    fn newest_entry(&self) -> Result<Option<(PathBuf, SystemTime)>> {
        let entries = std::fs::read_dir(&self.dir)
            .with_context(|| format!("failed to read spool dir {}", self.dir.display()))?;

        let mut newest: Option<(PathBuf, SystemTime)> = None;
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            let is_image = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "jpg" | "jpeg" | "png"))
                .unwrap_or(false);
            if !is_image {
                continue;
            }

            let modified = entry.metadata()?.modified()?;
            let newer = newest
                .as_ref()
                .map(|(_, current)| modified > *current)
                .unwrap_or(true);
            if newer {
                newest = Some((path, modified));
            }
        }

        Ok(newest)
    }
}

impl FrameSource for SpoolDirSource {
    fn latest_frame(&mut self) -> Result<Option<Frame>> {
        let Some((path, modified)) = self.newest_entry()? else {
            return Ok(None);
        };

        if self.last_modified.is_some_and(|seen| modified <= seen) {
            return Ok(None);
        }

        let image = image::open(&path)
            .with_context(|| format!("failed to decode spool frame {}", path.display()))?;
        self.last_modified = Some(modified);

        let timestamp: DateTime<Utc> = modified.into();
        Ok(Some(Frame::new(timestamp, image)))
    }
}
