//! Virtual-root path mapping for the script folder setting.
//!
//! A script folder configured as `~/db/scripts` is relative to a host-defined
//! root (an application directory, a deployment root). The engine does not
//! know that root; it asks a [`PathMapper`].

use crate::error::{CoreError, CoreResult};
use std::path::{Path, PathBuf};

/// Marker prefix for paths that need mapping
pub const VIRTUAL_ROOT: char = '~';

/// Maps a `~`-prefixed path to a physical location
pub trait PathMapper: Send + Sync {
    fn map_path(&self, virtual_path: &str) -> CoreResult<PathBuf>;
}

/// Maps `~` to a fixed root directory
#[derive(Debug, Clone)]
pub struct RootPathMapper {
    root: PathBuf,
}

impl RootPathMapper {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl PathMapper for RootPathMapper {
    fn map_path(&self, virtual_path: &str) -> CoreResult<PathBuf> {
        let rest = virtual_path
            .strip_prefix(VIRTUAL_ROOT)
            .ok_or_else(|| CoreError::ConfigInvalid {
                message: format!("'{virtual_path}' is not a virtual path"),
            })?;
        let rest = rest.trim_start_matches(['/', '\\']);
        Ok(if rest.is_empty() {
            self.root.clone()
        } else {
            self.root.join(rest)
        })
    }
}

/// Whether `path` must go through a [`PathMapper`] before use
pub fn is_virtual(path: &str) -> bool {
    path.starts_with(VIRTUAL_ROOT)
}
