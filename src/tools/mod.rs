//! External programs the repository workflow delegates to.
//!
//! Every capability that requires spawning a process goes through the [`Tools`]
//! trait so the package model and the repository engine can be tested without
//! pacman, gpg or rsync being installed.
//!
//! # Structure
//!
//! - `output` - Parsers for the text the programs print
//! - `system` - [`SystemTools`], the implementation backed by real processes

mod output;
mod system;

use anyhow::Result;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

pub use output::{parse_package_list, parse_query_output, parse_vercmp_output};
pub use system::SystemTools;

#[cfg_attr(test, mockall::automock)]
pub trait Tools {
    /// Compare two version strings with pacman's ordering (`vercmp`).
    fn vercmp(&self, version: &str, other: &str) -> Result<Ordering>;

    /// Read `pkgbase version` from a package file's embedded metadata (`pacman -Qp`).
    fn query_package(&self, path: &Path) -> Result<(String, String)>;

    /// Produce a detached signature for `path` at `signature` (`gpg --detach-sign`).
    fn sign(&self, path: &Path, signature: &Path) -> Result<()>;

    /// Register `package` in `database`, both relative to `basedir` (`repo-add`).
    fn repo_add(&self, basedir: &Path, database: &str, package: &str, sign: bool) -> Result<()>;

    /// Mirror `source` to `target` from within `basedir` (`rsync`).
    fn rsync(&self, basedir: &Path, source: &str, target: &str, delete: bool) -> Result<()>;

    /// List the package files a PKGBUILD in `pkgdir` would produce (`makepkg --packagelist`).
    fn package_list(&self, pkgdir: &Path) -> Result<Vec<PathBuf>>;
}
