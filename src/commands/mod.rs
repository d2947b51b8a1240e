use anyhow::{Context, Result, bail};
use log::{debug, error, warn};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::{
    application::{AddOptions, AddUseCase, Interrupt, SyncUseCase, list_packages},
    package::{IdentityResolver, PackageFile},
    runtime::Runtime,
    tools::Tools,
};

pub mod config;

use config::Config;

/// What the command line asked for.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub packages: Vec<PackageFile>,
    /// Directory whose PKGBUILD names further packages to add
    pub packagelist: Option<PathBuf>,
    pub repository: Option<String>,
    pub sign: Option<bool>,
    pub clean: bool,
    pub rsync: bool,
    pub target: Option<String>,
    pub delete: bool,
}

impl RunOptions {
    /// A repository and nothing to add or mirror: print its contents.
    fn is_listing(&self) -> Option<&str> {
        match &self.repository {
            Some(name) if self.packages.is_empty() && self.packagelist.is_none() && !self.rsync => {
                Some(name)
            }
            _ => None,
        }
    }
}

/// Run one invocation. Returns the number of failed operations.
#[tracing::instrument(level = "debug", skip(config, options, interrupt))]
pub fn run<R: Runtime, T: Tools>(
    config: Config<R, T>,
    options: RunOptions,
    interrupt: &Interrupt,
) -> Result<usize> {
    let resolver = IdentityResolver::new(&config.tools, config.strategy);

    if let Some(name) = options.is_listing() {
        let repository = config
            .directory
            .open(name, &config.runtime, &config.tools, &resolver)?;
        for identity in list_packages(&repository, &resolver)? {
            println!("{}", identity);
        }
        return Ok(0);
    }

    let mut failures = 0;
    let mut packages = options.packages.clone();
    if let Some(dir) = &options.packagelist {
        let (listed, rejected) = package_list(&config.runtime, &config.tools, dir)?;
        packages.extend(listed);
        failures += rejected;
    }

    let add_options = AddOptions {
        repository: options.repository.clone(),
        sign: options.sign,
        clean: options.clean,
    };
    let report = AddUseCase::new(
        &config.runtime,
        &config.tools,
        &resolver,
        &config.directory,
        interrupt,
    )
    .execute(&packages, &add_options);
    failures += report.failures;

    if options.rsync {
        let mut names = report.repositories;
        if let Some(name) = &options.repository {
            names.insert(name.clone());
        }
        failures += sync(&config, &resolver, interrupt, &names, &options);
    }

    debug!("Finished with {} failure(s)", failures);
    Ok(failures)
}

fn sync<R: Runtime, T: Tools>(
    config: &Config<R, T>,
    resolver: &IdentityResolver<'_, T>,
    interrupt: &Interrupt,
    names: &BTreeSet<String>,
    options: &RunOptions,
) -> usize {
    SyncUseCase::new(
        &config.runtime,
        &config.tools,
        resolver,
        &config.directory,
        interrupt,
    )
    .execute(
        names.iter().map(String::as_str),
        options.target.as_deref(),
        options.delete,
    )
}

/// Package files `makepkg --packagelist` reports for `dir`.
///
/// Files not built yet are skipped with a warning. Names that are not package
/// archives are logged and counted as rejected.
fn package_list<R: Runtime, T: Tools>(
    runtime: &R,
    tools: &T,
    dir: &Path,
) -> Result<(Vec<PackageFile>, usize)> {
    if !runtime.is_dir(dir) {
        bail!("Not a directory: {}", dir.display());
    }

    let paths = tools
        .package_list(dir)
        .with_context(|| format!("Failed to list packages for {:?}", dir))?;

    let mut packages = Vec::new();
    let mut rejected = 0;
    for path in paths {
        if !runtime.exists(&path) {
            warn!("Skipping {}: file does not exist.", path.display());
            continue;
        }
        match PackageFile::new(&path) {
            Ok(package) => packages.push(package),
            Err(err) => {
                error!("{}", err);
                rejected += 1;
            }
        }
    }

    Ok((packages, rejected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::RepositoryDirectory;
    use crate::config::{Memberships, RepositorySettings};
    use crate::package::IdentityStrategy;
    use crate::runtime::{MockRuntime, RealRuntime};
    use crate::test_utils::touch;
    use crate::tools::MockTools;
    use mockall::predicate::{always, eq};
    use tempfile::tempdir;

    fn config<R: Runtime>(runtime: R, tools: MockTools, ini: &str, mapping: &str) -> Config<R, MockTools> {
        Config {
            runtime,
            tools,
            directory: RepositoryDirectory::new(
                RepositorySettings::parse(ini).unwrap(),
                Memberships::parse(mapping).unwrap(),
            ),
            strategy: IdentityStrategy::Filename,
        }
    }

    #[test]
    fn test_listing_mode_detection() {
        let mut options = RunOptions {
            repository: Some("local".into()),
            ..Default::default()
        };
        assert_eq!(options.is_listing(), Some("local"));

        options.rsync = true;
        assert_eq!(options.is_listing(), None);

        options.rsync = false;
        options.packagelist = Some(PathBuf::from("."));
        assert_eq!(options.is_listing(), None);

        assert_eq!(RunOptions::default().is_listing(), None);
    }

    #[test]
    fn test_listing_never_adds() {
        let repo = tempdir().unwrap();
        touch(repo.path(), "foo-1.0-1-any.pkg.tar.zst");

        let mut tools = MockTools::new();
        tools.expect_repo_add().never();
        tools.expect_rsync().never();

        let ini = format!("[local]\nbasedir = {}\n", repo.path().display());
        let config = config(RealRuntime, tools, &ini, "{}");
        let options = RunOptions {
            repository: Some("local".into()),
            ..Default::default()
        };

        assert_eq!(run(config, options, &Interrupt::new()).unwrap(), 0);
    }

    #[test]
    fn test_listing_unknown_repository_is_error() {
        let config = config(MockRuntime::new(), MockTools::new(), "", "{}");
        let options = RunOptions {
            repository: Some("local".into()),
            ..Default::default()
        };

        assert!(run(config, options, &Interrupt::new()).is_err());
    }

    #[test]
    fn test_nothing_to_do() {
        let config = config(MockRuntime::new(), MockTools::new(), "", "{}");
        assert_eq!(run(config, RunOptions::default(), &Interrupt::new()).unwrap(), 0);
    }

    #[test]
    fn test_add_then_sync_touched_repositories() {
        let build = tempdir().unwrap();
        let core = tempdir().unwrap();
        let extra = tempdir().unwrap();
        let package = PackageFile::new(touch(build.path(), "foo-1.0-1-any.pkg.tar.zst")).unwrap();

        let mut tools = MockTools::new();
        tools
            .expect_repo_add()
            .times(2)
            .returning(|_, _, _, _| Ok(()));
        tools
            .expect_rsync()
            .with(always(), always(), eq("backup:/"), eq(false))
            .times(2)
            .returning(|_, _, _, _| Ok(()));

        let ini = format!(
            "[core-local]\nbasedir = {}\nsign = no\n[extra-local]\nbasedir = {}\nsign = no\n[unused]\nbasedir = /srv/unused\n",
            core.path().display(),
            extra.path().display()
        );
        let config = config(
            RealRuntime,
            tools,
            &ini,
            r#"{"core-local": ["foo"], "extra-local": ["foo"]}"#,
        );
        let options = RunOptions {
            packages: vec![package],
            rsync: true,
            target: Some("backup:/".into()),
            ..Default::default()
        };

        assert_eq!(run(config, options, &Interrupt::new()).unwrap(), 0);
        assert!(core.path().join("foo-1.0-1-any.pkg.tar.zst").exists());
        assert!(extra.path().join("foo-1.0-1-any.pkg.tar.zst").exists());
    }

    #[test]
    fn test_failures_add_up() {
        let build = tempdir().unwrap();
        let packages = vec![
            PackageFile::new(touch(build.path(), "foo-1.0-1-any.pkg.tar.zst")).unwrap(),
            PackageFile::new(touch(build.path(), "bar-1.0-1-any.pkg.tar.zst")).unwrap(),
        ];

        let config = config(RealRuntime, MockTools::new(), "", "{}");
        let options = RunOptions {
            packages,
            repository: Some("local".into()),
            rsync: true,
            ..Default::default()
        };

        // Two unknown-repository adds plus the unknown repository's mirror.
        assert_eq!(run(config, options, &Interrupt::new()).unwrap(), 3);
    }

    #[test]
    fn test_package_list_filters() {
        let build = tempdir().unwrap();
        let built = touch(build.path(), "foo-1.0-1-any.pkg.tar.zst");
        let odd = touch(build.path(), "foo-debug.tar");
        let missing = build.path().join("foo-docs-1.0-1-any.pkg.tar.zst");

        let listed = vec![built.clone(), missing, odd];
        let mut tools = MockTools::new();
        tools
            .expect_package_list()
            .with(eq(build.path().to_path_buf()))
            .returning(move |_| Ok(listed.clone()));

        let (packages, rejected) = package_list(&RealRuntime, &tools, build.path()).unwrap();

        assert_eq!(packages, vec![PackageFile::new(built).unwrap()]);
        assert_eq!(rejected, 1);
    }

    #[test]
    fn test_package_list_tool_failure_is_fatal() {
        let mut tools = MockTools::new();
        tools
            .expect_package_list()
            .returning(|_| Err(anyhow::anyhow!("makepkg not found")));

        let mut runtime = MockRuntime::new();
        runtime.expect_is_dir().returning(|_| true);

        assert!(package_list(&runtime, &tools, Path::new(".")).is_err());
    }

    #[test]
    fn test_package_list_requires_directory() {
        let mut tools = MockTools::new();
        tools.expect_package_list().never();

        let dir = tempdir().unwrap();
        let file = touch(dir.path(), "PKGBUILD");

        assert!(package_list(&RealRuntime, &tools, &file).is_err());
    }
}
