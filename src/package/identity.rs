//! Package identity: what a package archive file name says about its contents.
//!
//! File names follow `<pkgbase>-<pkgver>-<pkgrel>-<arch>.pkg.tar[.<compression>]`.
//! The pkgbase and version can either be split off the file name or read from the
//! archive's metadata via `pacman -Qp`; the two disagree when a pkgbase itself
//! looks like `name-1.0`, so the caller picks one [`IdentityStrategy`] per run.

use anyhow::{Context, Result};
use regex::Regex;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

use crate::error::RepoError;
use crate::tools::Tools;

use super::version::{Version, VersionComparator};

/// Glob matching every candidate package archive in a directory.
pub const PACKAGE_GLOB: &str = "*.pkg.tar*";

static PACKAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<pkgbase>.+)-(?P<pkgver>[^-/]+)-(?P<pkgrel>[^-/]+)-(?P<arch>x86_64|i686|any)\.pkg\.tar(?:\.(?P<compression>[a-z]{2,4}))?$",
    )
    .expect("package file name pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Architecture {
    X86_64,
    I686,
    Any,
}

impl Architecture {
    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::X86_64 => "x86_64",
            Architecture::I686 => "i686",
            Architecture::Any => "any",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Architecture {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x86_64" => Ok(Architecture::X86_64),
            "i686" => Ok(Architecture::I686),
            "any" => Ok(Architecture::Any),
            other => Err(format!("unsupported architecture: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageIdentity {
    pub pkgbase: String,
    pub version: Version,
    pub arch: Architecture,
    pub compression: Option<String>,
}

impl PackageIdentity {
    /// Classify a path by its final component alone.
    ///
    /// Anything that does not match the archive grammar is [`RepoError::NotAPackage`].
    pub fn parse(path: &Path) -> Result<Self, RepoError> {
        let not_a_package = || RepoError::NotAPackage(path.to_path_buf());

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(not_a_package)?;
        let captures = PACKAGE_RE.captures(name).ok_or_else(not_a_package)?;

        let arch = captures["arch"].parse().map_err(|_| not_a_package())?;

        Ok(Self {
            pkgbase: captures["pkgbase"].to_string(),
            version: Version::from_parts(&captures["pkgver"], &captures["pkgrel"]),
            arch,
            compression: captures.name("compression").map(|m| m.as_str().to_string()),
        })
    }

    /// The canonical file name for this identity.
    pub fn file_name(&self) -> String {
        let mut name = format!("{}-{}-{}.pkg.tar", self.pkgbase, self.version, self.arch);
        if let Some(compression) = &self.compression {
            name.push('.');
            name.push_str(compression);
        }
        name
    }
}

impl fmt::Display for PackageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.pkgbase, self.version, self.arch)?;
        if let Some(compression) = &self.compression {
            write!(f, " {}", compression)?;
        }
        Ok(())
    }
}

/// How pkgbase and version are derived for a package file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum IdentityStrategy {
    /// Split the file name; fast and works for files that are not readable.
    #[default]
    Filename,
    /// Ask `pacman -Qp` for the archive's embedded metadata.
    Metadata,
}

/// Derives identities with one strategy and memoizes them per path.
///
/// Also owns the run's [`VersionComparator`], since every identity comparison
/// ends in a version comparison.
pub struct IdentityResolver<'a, T: Tools> {
    strategy: IdentityStrategy,
    tools: &'a T,
    comparator: VersionComparator<'a, T>,
    cache: RefCell<HashMap<PathBuf, PackageIdentity>>,
}

impl<'a, T: Tools> IdentityResolver<'a, T> {
    pub fn new(tools: &'a T, strategy: IdentityStrategy) -> Self {
        Self {
            strategy,
            tools,
            comparator: VersionComparator::new(tools),
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn comparator(&self) -> &VersionComparator<'a, T> {
        &self.comparator
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub fn resolve(&self, path: &Path) -> Result<PackageIdentity> {
        if let Some(identity) = self.cache.borrow().get(path) {
            return Ok(identity.clone());
        }

        let mut identity = PackageIdentity::parse(path)?;
        if self.strategy == IdentityStrategy::Metadata {
            let (pkgbase, version) = self
                .tools
                .query_package(path)
                .with_context(|| format!("Failed to query package metadata of {:?}", path))?;
            identity.pkgbase = pkgbase;
            identity.version = Version::parse(&version);
        }

        self.cache
            .borrow_mut()
            .insert(path.to_path_buf(), identity.clone());
        Ok(identity)
    }
}
