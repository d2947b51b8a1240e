//! A package archive on disk.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::RepoError;
use crate::tools::Tools;

use super::identity::{IdentityResolver, PackageIdentity};

/// Path of the detached signature belonging to `path`.
pub fn signature_path(path: &Path) -> PathBuf {
    let mut signature = path.as_os_str().to_os_string();
    signature.push(".sig");
    PathBuf::from(signature)
}

/// A path whose file name matches the package archive grammar.
///
/// The identity is resolved on first use and cached for the lifetime of the value.
#[derive(Debug, Clone)]
pub struct PackageFile {
    path: PathBuf,
    identity: OnceLock<PackageIdentity>,
}

impl PackageFile {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, RepoError> {
        let path = path.into();
        PackageIdentity::parse(&path)?;
        Ok(Self {
            path,
            identity: OnceLock::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The archive's file name, as registered in the repository database.
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    pub fn signature(&self) -> PathBuf {
        signature_path(&self.path)
    }

    pub fn identity<T: Tools>(&self, resolver: &IdentityResolver<'_, T>) -> Result<&PackageIdentity> {
        if let Some(identity) = self.identity.get() {
            return Ok(identity);
        }
        let identity = resolver.resolve(&self.path)?;
        Ok(self.identity.get_or_init(|| identity))
    }

    pub fn pkgbase<T: Tools>(&self, resolver: &IdentityResolver<'_, T>) -> Result<&str> {
        Ok(&self.identity(resolver)?.pkgbase)
    }

    /// Whether `other` is another version of this package.
    ///
    /// True iff both share a pkgbase and differ in version or compression. A file
    /// is never another version of itself.
    pub fn is_other_version_of<T: Tools>(
        &self,
        other: &PackageFile,
        resolver: &IdentityResolver<'_, T>,
    ) -> Result<bool> {
        let mine = self.identity(resolver)?;
        let theirs = other.identity(resolver)?;

        if mine.pkgbase != theirs.pkgbase {
            return Ok(false);
        }

        if !resolver.comparator().equal(&mine.version, &theirs.version)? {
            return Ok(true);
        }

        Ok(mine.compression != theirs.compression)
    }
}

impl FromStr for PackageFile {
    type Err = RepoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl PartialEq for PackageFile {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for PackageFile {}
