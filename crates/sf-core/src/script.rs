//! Migration script discovery and ordering
//!
//! A migration script is a `.sql` file placed directly inside the script
//! folder. Scripts are applied in ordinal file-name order, so `Rev002.sql`
//! runs before `Rev010.sql` only because the names are zero-padded; nothing
//! here re-pads or sorts numerically.

use crate::error::{CoreError, CoreResult};
use std::path::{Path, PathBuf};

/// File extension recognised as a migration script (compared case-insensitively)
pub const SCRIPT_EXTENSION: &str = "sql";

/// A single SQL script discovered in the script folder
///
/// Identity is the file name including its extension. The SQL text is not
/// read until [`load_sql`](Self::load_sql) is called.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MigrationScript {
    file_name: String,
    folder: PathBuf,
}

impl MigrationScript {
    /// Create a script from its folder and file name
    pub fn new(folder: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            folder: folder.into(),
        }
    }

    /// Create a script from a full path, splitting off the file name
    pub fn from_path(path: &Path) -> CoreResult<Self> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| CoreError::InvalidScriptName {
                path: path.display().to_string(),
            })?;
        let folder = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(Self::new(folder, file_name))
    }

    /// File name including the extension; this is the name stored in the execution log
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// File name without its extension, used in progress messages and parameter resolution
    pub fn display_name(&self) -> &str {
        Path::new(&self.file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.file_name)
    }

    /// Folder containing the script
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Full path to the script file
    pub fn path(&self) -> PathBuf {
        self.folder.join(&self.file_name)
    }

    /// Whether `name` refers to this script, either by file name or display name
    pub fn matches(&self, name: &str) -> bool {
        self.file_name == name || self.display_name() == name
    }

    /// Read the full SQL text of the script from disk
    pub fn load_sql(&self) -> CoreResult<String> {
        let path = self.path();
        std::fs::read_to_string(&path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })
    }
}

/// Enumerates the scripts of one folder in application order
#[derive(Debug, Clone)]
pub struct ScriptRepository {
    folder: PathBuf,
}

impl ScriptRepository {
    /// Create a repository over `folder`
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }

    /// The folder this repository reads from
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Fail with [`CoreError::ScriptFolderNotFound`] unless the folder exists
    pub fn ensure_exists(&self) -> CoreResult<()> {
        if self.folder.is_dir() {
            Ok(())
        } else {
            Err(CoreError::ScriptFolderNotFound {
                path: self.folder.display().to_string(),
            })
        }
    }

    /// Return every `.sql` file directly inside the folder, ordered by file name.
    ///
    /// Each call re-reads the directory, so the result can be requested any
    /// number of times per run. Subfolders are not scanned.
    pub fn scripts(&self) -> CoreResult<Vec<MigrationScript>> {
        self.ensure_exists()?;

        let entries = std::fs::read_dir(&self.folder).map_err(|e| CoreError::IoWithPath {
            path: self.folder.display().to_string(),
            source: e,
        })?;

        let mut scripts = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| CoreError::IoWithPath {
                path: self.folder.display().to_string(),
                source: e,
            })?;
            let path = entry.path();

            if !path.is_file() || !has_script_extension(&path) {
                continue;
            }

            match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => scripts.push(MigrationScript::new(&self.folder, name)),
                None => log::warn!("Skipping script with non UTF-8 name: {}", path.display()),
            }
        }

        // String ordering is byte-wise, i.e. ordinal
        scripts.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(scripts)
    }
}

fn has_script_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(SCRIPT_EXTENSION))
}

#[cfg(test)]
#[path = "script_test.rs"]
mod tests;
