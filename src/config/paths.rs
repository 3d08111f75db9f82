//! Index directory resolution
//!
//! The backing store location may differ per operating system. A
//! [`PathResolver`] turns the `[index]` section into one filesystem path.

use crate::config::types::IndexConfig;
use std::path::PathBuf;

/// Operating system family used to pick an index directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    Windows,
    Unix,
    Unknown,
}

impl OsFamily {
    /// Detects the family of the host the binary was compiled for
    pub fn current() -> Self {
        Self::from_family(std::env::consts::FAMILY)
    }

    fn from_family(family: &str) -> Self {
        match family {
            "windows" => Self::Windows,
            "unix" => Self::Unix,
            _ => Self::Unknown,
        }
    }
}

/// Resolves the filesystem location of the index backing store
pub trait PathResolver: Send + Sync {
    fn index_directory(&self, config: &IndexConfig) -> PathBuf;
}

/// Picks the OS-specific override when present, the default directory otherwise
#[derive(Debug, Clone, Copy)]
pub struct OsPathResolver {
    os: OsFamily,
}

impl OsPathResolver {
    pub fn new(os: OsFamily) -> Self {
        Self { os }
    }
}

impl Default for OsPathResolver {
    fn default() -> Self {
        Self::new(OsFamily::current())
    }
}

impl PathResolver for OsPathResolver {
    fn index_directory(&self, config: &IndexConfig) -> PathBuf {
        let specific = match self.os {
            OsFamily::Windows => config.directory_windows.as_deref(),
            OsFamily::Unix => config.directory_unix.as_deref(),
            OsFamily::Unknown => None,
        };

        let chosen = specific.unwrap_or(&config.directory);
        tracing::debug!("Index directory for {:?}: {}", self.os, chosen);
        PathBuf::from(chosen)
    }
}
