use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::models::Snapshot;

/// JSON file holding the statuses reported by the previous run.
#[derive(Debug, Clone)]
pub struct StatusStore {
    path: PathBuf,
}

impl StatusStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        StatusStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the previous snapshot. A missing or unreadable file yields an
    /// empty snapshot so every player is reported on the next run.
    pub fn load(&self) -> Snapshot {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(
                    "Status file not found at {}, assuming first run",
                    self.path.display()
                );
                return Snapshot::new();
            }
            Err(e) => {
                error!(
                    "Error reading status file {}: {}. Starting fresh.",
                    self.path.display(),
                    e
                );
                return Snapshot::new();
            }
        };

        match serde_json::from_str::<Snapshot>(&raw) {
            Ok(snapshot) => {
                info!(
                    "Loaded {} previous status(es) from {}",
                    snapshot.len(),
                    self.path.display()
                );
                snapshot
            }
            Err(e) => {
                error!(
                    "Status file {} is corrupt: {}. Starting fresh.",
                    self.path.display(),
                    e
                );
                Snapshot::new()
            }
        }
    }

    /// Replace the file with `snapshot`, pretty-printed with 4-space indent.
    ///
    /// The content goes to a sibling temp file first and is renamed over the
    /// target, so an interrupted run never leaves a half-written snapshot.
    pub fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let body = to_pretty_json(snapshot)?;

        let tmp_path = self.tmp_path();
        fs::write(&tmp_path, body)
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path).with_context(|| {
            format!(
                "Failed to move {} into place at {}",
                tmp_path.display(),
                self.path.display()
            )
        })?;

        info!(
            "Saved {} status(es) to {}",
            snapshot.len(),
            self.path.display()
        );
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "status".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn to_pretty_json(snapshot: &Snapshot) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    snapshot
        .serialize(&mut ser)
        .context("Failed to serialize status snapshot")?;
    Ok(buf)
}
