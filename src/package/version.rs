//! Package versions and their ordering.
//!
//! Arch versions (`epoch:pkgver-pkgrel`) cannot be ordered by string or numeric
//! comparison, so the upstream part is always compared by `vercmp`. The
//! [`VersionComparator`] owns the memo of those calls for one process run.

use anyhow::Result;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use crate::tools::Tools;

/// A package version: upstream `[epoch:]pkgver` plus the `pkgrel` build counter.
///
/// When the release part is not a plain integer (e.g. `1.1` point releases) the
/// whole string is kept opaque in `upstream` and `build` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    upstream: String,
    build: Option<u32>,
}

impl Version {
    pub fn new(upstream: impl Into<String>, build: Option<u32>) -> Self {
        Self {
            upstream: upstream.into(),
            build,
        }
    }

    /// Build a version from separate `pkgver` and `pkgrel` strings.
    pub fn from_parts(pkgver: &str, pkgrel: &str) -> Self {
        match pkgrel.parse() {
            Ok(build) => Self::new(pkgver, Some(build)),
            Err(_) => Self::new(format!("{}-{}", pkgver, pkgrel), None),
        }
    }

    /// Parse a full `pkgver-pkgrel` string as printed by pacman.
    pub fn parse(version: &str) -> Self {
        match version.rsplit_once('-') {
            Some((pkgver, pkgrel)) if !pkgver.is_empty() => Self::from_parts(pkgver, pkgrel),
            _ => Self::new(version, None),
        }
    }

    pub fn upstream(&self) -> &str {
        &self.upstream
    }

    pub fn build(&self) -> Option<u32> {
        self.build
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.build {
            Some(build) => write!(f, "{}-{}", self.upstream, build),
            None => f.write_str(&self.upstream),
        }
    }
}

/// Three-way version comparison backed by `vercmp`, memoized per string pair.
pub struct VersionComparator<'a, T: Tools> {
    tools: &'a T,
    cache: RefCell<HashMap<(String, String), Ordering>>,
}

impl<'a, T: Tools> VersionComparator<'a, T> {
    pub fn new(tools: &'a T) -> Self {
        Self {
            tools,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Compare two versions.
    ///
    /// Upstream strings go through `vercmp`; build numbers break ties. If either
    /// side has no separate build number the full strings are compared instead.
    /// A failing `vercmp` is an error, never `Equal`.
    pub fn compare(&self, version: &Version, other: &Version) -> Result<Ordering> {
        match (version.build, other.build) {
            (Some(build), Some(other_build)) => Ok(self
                .compare_strings(&version.upstream, &other.upstream)?
                .then(build.cmp(&other_build))),
            _ => self.compare_strings(&version.to_string(), &other.to_string()),
        }
    }

    pub fn equal(&self, version: &Version, other: &Version) -> Result<bool> {
        Ok(self.compare(version, other)? == Ordering::Equal)
    }

    pub fn less(&self, version: &Version, other: &Version) -> Result<bool> {
        Ok(self.compare(version, other)? == Ordering::Less)
    }

    pub fn greater(&self, version: &Version, other: &Version) -> Result<bool> {
        Ok(self.compare(version, other)? == Ordering::Greater)
    }

    fn compare_strings(&self, version: &str, other: &str) -> Result<Ordering> {
        if version == other {
            return Ok(Ordering::Equal);
        }

        let key = (version.to_string(), other.to_string());
        if let Some(ordering) = self.cache.borrow().get(&key) {
            return Ok(*ordering);
        }

        let ordering = self.tools.vercmp(version, other)?;
        self.cache.borrow_mut().insert(key, ordering);
        Ok(ordering)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::MockTools;
    use mockall::predicate::eq;

    #[test]
    fn test_parse_with_build() {
        let version = Version::parse("1.2.3-4");
        assert_eq!(version.upstream(), "1.2.3");
        assert_eq!(version.build(), Some(4));
        assert_eq!(version.to_string(), "1.2.3-4");
    }

    #[test]
    fn test_parse_with_epoch() {
        let version = Version::parse("2:1.0-1");
        assert_eq!(version.upstream(), "2:1.0");
        assert_eq!(version.build(), Some(1));
    }

    #[test]
    fn test_parse_point_release_is_opaque() {
        let version = Version::parse("1.0-1.1");
        assert_eq!(version.upstream(), "1.0-1.1");
        assert_eq!(version.build(), None);
        assert_eq!(version.to_string(), "1.0-1.1");
    }

    #[test]
    fn test_parse_without_release() {
        let version = Version::parse("20240101");
        assert_eq!(version.upstream(), "20240101");
        assert_eq!(version.build(), None);
    }

    #[test]
    fn test_upstream_order_delegated_to_vercmp() {
        let mut tools = MockTools::new();
        tools
            .expect_vercmp()
            .with(eq("1.0"), eq("1.1"))
            .times(1)
            .returning(|_, _| Ok(Ordering::Less));

        let comparator = VersionComparator::new(&tools);
        let old = Version::new("1.0", Some(1));
        let new = Version::new("1.1", Some(1));

        assert!(comparator.less(&old, &new).unwrap());
        // Second comparison is served from the memo.
        assert!(!comparator.greater(&old, &new).unwrap());
    }

    #[test]
    fn test_build_breaks_ties() {
        let tools = MockTools::new();
        let comparator = VersionComparator::new(&tools);

        let first = Version::new("1.0", Some(1));
        let second = Version::new("1.0", Some(2));

        assert!(comparator.less(&first, &second).unwrap());
        assert!(comparator.greater(&second, &first).unwrap());
        assert!(comparator.equal(&first, &first).unwrap());
    }

    #[test]
    fn test_vercmp_equal_then_build() {
        let mut tools = MockTools::new();
        tools
            .expect_vercmp()
            .with(eq("1.0"), eq("1.00"))
            .returning(|_, _| Ok(Ordering::Equal));

        let comparator = VersionComparator::new(&tools);
        assert!(
            comparator
                .less(&Version::new("1.0", Some(1)), &Version::new("1.00", Some(2)))
                .unwrap()
        );
    }

    #[test]
    fn test_opaque_versions_compare_full_strings() {
        let mut tools = MockTools::new();
        tools
            .expect_vercmp()
            .with(eq("1.0-1.1"), eq("1.0-2"))
            .times(1)
            .returning(|_, _| Ok(Ordering::Less));

        let comparator = VersionComparator::new(&tools);
        assert!(
            comparator
                .less(&Version::parse("1.0-1.1"), &Version::parse("1.0-2"))
                .unwrap()
        );
    }

    #[test]
    fn test_vercmp_failure_propagates() {
        let mut tools = MockTools::new();
        tools
            .expect_vercmp()
            .returning(|_, _| Err(anyhow::anyhow!("vercmp not found")));

        let comparator = VersionComparator::new(&tools);
        let result = comparator.equal(&Version::new("1.0", Some(1)), &Version::new("2.0", Some(1)));
        assert!(result.is_err());
    }
}
