//! File-backed checkpoint store
//!
//! Layout is three lines: seed identifier, page number, cursor. Writes go to
//! a sibling `.tmp` file that is then renamed over the checkpoint, so a crash
//! leaves either the old or the new checkpoint and never a torn one.

use crate::state::{Checkpoint, Cursor};
use crate::storage::traits::{CheckpointError, CheckpointResult, CheckpointStore};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

/// Checkpoint store backed by a small text file
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    path: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn read(&self) -> CheckpointResult<Option<Checkpoint>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => parse_checkpoint(&content).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, checkpoint: &Checkpoint) -> CheckpointResult<()> {
        let content = render_checkpoint(checkpoint)?;
        let temp = self.temp_path();
        {
            let mut file = fs::File::create(&temp)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&temp, &self.path)?;
        Ok(())
    }

    fn clear(&mut self) -> CheckpointResult<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Renders the three-line checkpoint layout
///
/// Seeds that `parse_checkpoint` would read back differently are rejected.
pub fn render_checkpoint(checkpoint: &Checkpoint) -> CheckpointResult<String> {
    let seed = &checkpoint.seed;
    if seed.is_empty() || seed.trim() != seed || seed.contains(['\n', '\r']) {
        return Err(CheckpointError::Malformed(format!(
            "seed identifier {:?} cannot be stored",
            seed
        )));
    }

    Ok(format!(
        "{}\n{}\n{}\n",
        seed,
        checkpoint.page_number,
        checkpoint.cursor.as_raw()
    ))
}

/// Parses the three-line checkpoint layout
pub fn parse_checkpoint(content: &str) -> CheckpointResult<Checkpoint> {
    let mut lines = content.lines().map(str::trim);

    let seed = lines
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CheckpointError::Malformed("missing seed identifier".to_string()))?;

    let page_line = lines
        .next()
        .ok_or_else(|| CheckpointError::Malformed("missing page number".to_string()))?;
    let page_number: u32 = page_line
        .parse()
        .map_err(|_| CheckpointError::Malformed(format!("invalid page number '{}'", page_line)))?;
    if page_number == 0 {
        return Err(CheckpointError::Malformed(
            "page number must be at least 1".to_string(),
        ));
    }

    let cursor_line = lines
        .next()
        .ok_or_else(|| CheckpointError::Malformed("missing cursor".to_string()))?;
    let cursor: i64 = cursor_line
        .parse()
        .map_err(|_| CheckpointError::Malformed(format!("invalid cursor '{}'", cursor_line)))?;

    Ok(Checkpoint {
        seed: seed.to_string(),
        page_number,
        cursor: Cursor::from_raw(cursor),
    })
}
