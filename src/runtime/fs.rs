//! File system operations (read, copy, remove, glob).

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::RealRuntime;

impl RealRuntime {
    #[tracing::instrument(level = "trace", skip(self))]
    pub(crate) fn read_to_string_impl(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).context("Failed to read file to string")
    }

    #[tracing::instrument(level = "trace", skip(self))]
    pub(crate) fn copy_impl(&self, from: &Path, to: &Path) -> Result<u64> {
        let bytes = fs::copy(from, to).context("Failed to copy file")?;
        let modified = fs::metadata(from)
            .and_then(|m| m.modified())
            .context("Failed to read modification time")?;
        fs::File::options()
            .write(true)
            .open(to)
            .and_then(|f| f.set_modified(modified))
            .context("Failed to preserve modification time")?;
        Ok(bytes)
    }

    #[tracing::instrument(level = "trace", skip(self))]
    pub(crate) fn remove_file_impl(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).context("Failed to remove file")?;
        Ok(())
    }

    #[tracing::instrument(level = "trace", skip(self))]
    pub(crate) fn exists_impl(&self, path: &Path) -> bool {
        path.exists()
    }

    #[tracing::instrument(level = "trace", skip(self))]
    pub(crate) fn is_file_impl(&self, path: &Path) -> bool {
        path.is_file()
    }

    #[tracing::instrument(level = "trace", skip(self))]
    pub(crate) fn is_dir_impl(&self, path: &Path) -> bool {
        path.is_dir()
    }

    #[tracing::instrument(level = "trace", skip(self))]
    pub(crate) fn glob_impl(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        let paths = glob::glob(pattern).with_context(|| format!("Invalid glob pattern: {}", pattern))?;
        Ok(paths.filter_map(|entry| entry.ok()).collect())
    }

    #[tracing::instrument(level = "trace", skip(self))]
    pub(crate) fn canonicalize_impl(&self, path: &Path) -> Result<PathBuf> {
        fs::canonicalize(path).context("Failed to canonicalize path")
    }
}
