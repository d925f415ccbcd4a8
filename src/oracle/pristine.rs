// src/oracle/pristine.rs — Content checksum of the project's tracked sources

use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::infra::errors::TrimError;

/// SHA-256 over every file matching `patterns` (relative to `project`).
///
/// Files are hashed in path order together with their relative path, so
/// renames and deletions change the digest as well as edits.
pub fn checksum(project: &Path, patterns: &[String]) -> Result<String, TrimError> {
    let mut files: BTreeSet<PathBuf> = BTreeSet::new();
    for pattern in patterns {
        let full = project.join(pattern);
        let full = full.to_string_lossy();
        let entries = glob::glob(&full)
            .map_err(|e| TrimError::Config(format!("bad checksum glob {pattern:?}: {e}")))?;
        for entry in entries {
            let path = entry.map_err(|e| TrimError::Io(e.into()))?;
            if path.is_file() {
                files.insert(path);
            }
        }
    }

    let mut hasher = Sha256::new();
    for path in &files {
        let rel = path.strip_prefix(project).unwrap_or(path);
        hasher.update(rel.to_string_lossy().as_bytes());
        hasher.update([0u8]);
        hasher.update(std::fs::read(path)?);
        hasher.update([0u8]);
    }
    Ok(hex::encode(hasher.finalize()))
}
