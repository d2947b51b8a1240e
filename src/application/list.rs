//! Listing mode: the identities of every package in one repository.

use anyhow::Result;
use std::cmp::Ordering;

use crate::package::{IdentityResolver, PackageIdentity};
use crate::repository::Repository;
use crate::runtime::Runtime;
use crate::tools::Tools;

/// Identities sorted by pkgbase, then version, then file name.
#[tracing::instrument(level = "debug", skip(repository, resolver), fields(repository = %repository.name()))]
pub fn list_packages<R: Runtime, T: Tools>(
    repository: &Repository<'_, R, T>,
    resolver: &IdentityResolver<'_, T>,
) -> Result<Vec<PackageIdentity>> {
    let mut identities = Vec::new();
    for package in repository.packages()? {
        identities.push(package.identity(resolver)?.clone());
    }

    let comparator = resolver.comparator();
    let mut failure = None;
    identities.sort_by(|a, b| {
        a.pkgbase
            .cmp(&b.pkgbase)
            .then_with(|| {
                comparator
                    .compare(&a.version, &b.version)
                    .unwrap_or_else(|err| {
                        failure.get_or_insert(err);
                        Ordering::Equal
                    })
            })
            .then_with(|| a.file_name().cmp(&b.file_name()))
    });

    match failure {
        Some(err) => Err(err),
        None => Ok(identities),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RepositoryConfig;
    use crate::package::IdentityStrategy;
    use crate::runtime::RealRuntime;
    use crate::test_utils::{fake_vercmp, touch};
    use crate::tools::MockTools;
    use anyhow::anyhow;
    use tempfile::tempdir;

    #[test]
    fn test_list_sorted_by_pkgbase_then_version() {
        let dir = tempdir().unwrap();
        for name in [
            "foo-1.10-1-x86_64.pkg.tar.zst",
            "foo-1.9-1-x86_64.pkg.tar.zst",
            "foo-1.9-2-x86_64.pkg.tar.zst",
            "bar-2.0-1-any.pkg.tar.xz",
            "bar-2.0-1-any.pkg.tar.xz.sig",
            "local.db.tar.zst",
        ] {
            touch(dir.path(), name);
        }

        let mut tools = MockTools::new();
        tools
            .expect_vercmp()
            .returning(|a, b| Ok(fake_vercmp(a, b)));

        let resolver = IdentityResolver::new(&tools, IdentityStrategy::Filename);
        let repository = Repository::new(
            RepositoryConfig::new("local", dir.path()),
            &RealRuntime,
            &tools,
            &resolver,
        );

        let listed: Vec<String> = list_packages(&repository, &resolver)
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();

        assert_eq!(
            listed,
            vec![
                "bar 2.0-1 any xz",
                "foo 1.9-1 x86_64 zst",
                "foo 1.9-2 x86_64 zst",
                "foo 1.10-1 x86_64 zst",
            ]
        );
    }

    #[test]
    fn test_list_empty_repository() {
        let dir = tempdir().unwrap();
        let tools = MockTools::new();
        let resolver = IdentityResolver::new(&tools, IdentityStrategy::Filename);
        let repository = Repository::new(
            RepositoryConfig::new("local", dir.path()),
            &RealRuntime,
            &tools,
            &resolver,
        );

        assert!(list_packages(&repository, &resolver).unwrap().is_empty());
    }

    #[test]
    fn test_list_comparator_failure_is_error() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "foo-1.0-1-any.pkg.tar.zst");
        touch(dir.path(), "foo-2.0-1-any.pkg.tar.zst");

        let mut tools = MockTools::new();
        tools
            .expect_vercmp()
            .returning(|_, _| Err(anyhow!("vercmp not found")));

        let resolver = IdentityResolver::new(&tools, IdentityStrategy::Filename);
        let repository = Repository::new(
            RepositoryConfig::new("local", dir.path()),
            &RealRuntime,
            &tools,
            &resolver,
        );

        assert!(list_packages(&repository, &resolver).is_err());
    }
}
