//! Runtime abstraction for filesystem operations.
//!
//! This module provides a trait-based abstraction over the filesystem,
//! enabling dependency injection and testability.
//!
//! # Structure
//!
//! - `fs` - File system operations (read, copy, remove, glob)

mod fs;

use anyhow::Result;
use std::path::{Path, PathBuf};

#[cfg_attr(test, mockall::automock)]
pub trait Runtime {
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Copy a file, carrying its modification time over to the destination.
    fn copy(&self, from: &Path, to: &Path) -> Result<u64>;

    fn remove_file(&self, path: &Path) -> Result<()>;
    fn exists(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;

    /// Expand a glob pattern. Unreadable entries are skipped.
    fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>>;

    /// Canonicalize a path by resolving all symlinks and returning the canonical absolute path.
    fn canonicalize(&self, path: &Path) -> Result<PathBuf>;
}

pub struct RealRuntime;

impl Runtime for RealRuntime {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.read_to_string_impl(path)
    }

    fn copy(&self, from: &Path, to: &Path) -> Result<u64> {
        self.copy_impl(from, to)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        self.remove_file_impl(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.exists_impl(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.is_file_impl(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.is_dir_impl(path)
    }

    fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        self.glob_impl(pattern)
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        self.canonicalize_impl(path)
    }
}

/// Whether two paths name the same file on disk.
///
/// Paths that cannot be canonicalized (e.g. do not exist) are never the same file.
pub fn same_file<R: Runtime + ?Sized>(runtime: &R, path: &Path, other: &Path) -> bool {
    match (runtime.canonicalize(path), runtime.canonicalize(other)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    #[test]
    fn test_same_file_resolves_both_sides() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_canonicalize()
            .with(eq(PathBuf::from("/srv/repo/./foo.pkg.tar")))
            .returning(|_| Ok(PathBuf::from("/srv/repo/foo.pkg.tar")));
        runtime
            .expect_canonicalize()
            .with(eq(PathBuf::from("/srv/repo/foo.pkg.tar")))
            .returning(|p| Ok(p.to_path_buf()));

        assert!(same_file(
            &runtime,
            Path::new("/srv/repo/./foo.pkg.tar"),
            Path::new("/srv/repo/foo.pkg.tar")
        ));
    }

    #[test]
    fn test_same_file_missing_destination() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_canonicalize()
            .with(eq(PathBuf::from("/build/foo.pkg.tar")))
            .returning(|p| Ok(p.to_path_buf()));
        runtime
            .expect_canonicalize()
            .with(eq(PathBuf::from("/srv/repo/foo.pkg.tar")))
            .returning(|_| {
                Err(std::io::Error::new(std::io::ErrorKind::NotFound, "not found").into())
            });

        assert!(!same_file(
            &runtime,
            Path::new("/build/foo.pkg.tar"),
            Path::new("/srv/repo/foo.pkg.tar")
        ));
    }
}
