// src/core/store.rs — Persisted candidate set
//
// One move per line: `<line> <column>`, coordinates of the pristine source.
// Writes go to a sibling temp file which is then renamed over the target,
// so a crash leaves either the old list or the new one.

use std::fmt::Write as _;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::types::{CandidateSet, Move};
use crate::infra::errors::TrimError;

/// File-backed move list. The controller is its only writer during a run.
#[derive(Debug, Clone)]
pub struct MoveStore {
    path: PathBuf,
}

impl MoveStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the persisted set. Any malformed line makes the whole store corrupt.
    pub fn load(&self) -> Result<CandidateSet, TrimError> {
        let content = std::fs::read_to_string(&self.path)?;
        let moves = parse_moves(&content, &self.path)?;
        Ok(CandidateSet::new(moves))
    }

    /// Replace the stored list atomically (temp file + rename).
    pub fn save(&self, moves: &[Move]) -> Result<(), TrimError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "moves".into());
        let tmp = dir.join(format!(".{file_name}.tmp"));

        let mut f = std::fs::File::create(&tmp)?;
        f.write_all(format_moves(moves).as_bytes())?;
        f.flush()?;
        f.sync_all()?;
        std::fs::rename(&tmp, &self.path)?;

        tracing::debug!(path = %self.path.display(), moves = moves.len(), "Move list saved");
        Ok(())
    }
}

/// Parse the list format. Blank lines are ignored; line numbers in errors are 1-based.
pub fn parse_moves(content: &str, origin: &Path) -> Result<Vec<Move>, TrimError> {
    let mut moves = Vec::new();

    for (idx, raw) in content.lines().enumerate() {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        let corrupt = || TrimError::CorruptStore {
            path: origin.to_path_buf(),
            line: idx + 1,
            content: raw.to_string(),
        };

        let mut fields = trimmed.split_whitespace();
        let (Some(line), Some(column), None) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(corrupt());
        };
        let line: u32 = line.parse().map_err(|_| corrupt())?;
        let column: u32 = column.parse().map_err(|_| corrupt())?;
        if line == 0 || column == 0 {
            return Err(corrupt());
        }
        moves.push(Move::new(line, column));
    }

    Ok(moves)
}

pub fn format_moves(moves: &[Move]) -> String {
    let mut out = String::with_capacity(moves.len() * 10);
    for m in moves {
        let _ = writeln!(out, "{} {}", m.line, m.column);
    }
    out
}
