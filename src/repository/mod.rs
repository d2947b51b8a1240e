//! Repository engine: a directory of package archives plus one database file.
//!
//! The database is owned by `repo-add`; this module only places files next to it,
//! asks `repo-add` to register them, removes superseded archives and mirrors the
//! directory with `rsync`.

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::config::RepositoryConfig;
use crate::error::RepoError;
use crate::package::{IdentityResolver, PACKAGE_GLOB, PackageFile};
use crate::runtime::{Runtime, same_file};
use crate::tools::Tools;

pub struct Repository<'a, R: Runtime, T: Tools> {
    config: RepositoryConfig,
    runtime: &'a R,
    tools: &'a T,
    resolver: &'a IdentityResolver<'a, T>,
}

impl<'a, R: Runtime, T: Tools> Repository<'a, R, T> {
    pub fn new(
        config: RepositoryConfig,
        runtime: &'a R,
        tools: &'a T,
        resolver: &'a IdentityResolver<'a, T>,
    ) -> Self {
        Self {
            config,
            runtime,
            tools,
            resolver,
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Glob for package files in `basedir` whose names start with `prefix`.
    fn pattern(&self, prefix: &str) -> String {
        let basedir = glob::Pattern::escape(&self.config.basedir.to_string_lossy());
        format!(
            "{}/{}{}",
            basedir.trim_end_matches('/'),
            glob::Pattern::escape(prefix),
            PACKAGE_GLOB
        )
    }

    /// Every package archive currently in the repository directory.
    ///
    /// Entries that do not match the package grammar (signatures, the database,
    /// stray files) are skipped. Each call rescans the directory.
    #[tracing::instrument(level = "debug", skip(self), fields(repository = %self.config.name))]
    pub fn packages(&self) -> Result<impl Iterator<Item = PackageFile>> {
        let paths = self.runtime.glob(&self.pattern(""))?;
        Ok(paths
            .into_iter()
            .filter_map(|path| PackageFile::new(path).ok()))
    }

    /// Package archives whose identity has the given pkgbase.
    ///
    /// The glob only narrows the scan; `foo-bar-1.0-1-any.pkg.tar.zst` matches
    /// `foo-*` but is dropped by the identity check.
    #[tracing::instrument(level = "debug", skip(self), fields(repository = %self.config.name))]
    pub fn packages_for_base(&self, pkgbase: &str) -> Result<Vec<PackageFile>> {
        let mut packages = Vec::new();
        for path in self.runtime.glob(&self.pattern(&format!("{}-", pkgbase)))? {
            let Ok(package) = PackageFile::new(path) else {
                continue;
            };
            if package.pkgbase(self.resolver)? == pkgbase {
                packages.push(package);
            }
        }
        Ok(packages)
    }

    /// Distinct pkgbases present in the repository.
    pub fn pkgbases(&self) -> Result<BTreeSet<String>> {
        let mut pkgbases = BTreeSet::new();
        for package in self.packages()? {
            pkgbases.insert(package.pkgbase(self.resolver)?.to_string());
        }
        Ok(pkgbases)
    }

    /// Sign, copy and register a package.
    ///
    /// `sign` overrides the repository's signing policy when set. With `clean`,
    /// other versions of the package are removed afterwards.
    #[tracing::instrument(level = "debug", skip(self, package), fields(repository = %self.config.name, package = %package.path().display()))]
    pub fn add(&self, package: &PackageFile, sign: Option<bool>, clean: bool) -> Result<()> {
        let sign = sign.unwrap_or(self.config.sign);
        let signature = package.signature();

        if sign {
            if self.runtime.is_file(&signature) {
                warn!("Package is already signed: {}", package.path().display());
                self.runtime.remove_file(&signature)?;
            }
            self.tools
                .sign(package.path(), &signature)
                .with_context(|| format!("Failed to sign {:?}", package.path()))?;
        }

        self.install_file(package.path())?;
        if self.runtime.is_file(&signature) {
            self.install_file(&signature)?;
        }

        self.tools
            .repo_add(
                &self.config.basedir,
                &self.config.database(),
                package.file_name(),
                sign,
            )
            .with_context(|| {
                format!(
                    "Failed to add {} to {}",
                    package.file_name(),
                    self.config.database()
                )
            })?;
        info!("Added {} to {}.", package.file_name(), self.config.name);

        if clean {
            self.isolate(package)?;
        }

        Ok(())
    }

    /// Copy a file into `basedir`. A file already in place is left alone.
    fn install_file(&self, source: &Path) -> Result<()> {
        let file_name = source
            .file_name()
            .with_context(|| format!("No file name in {:?}", source))?;
        let dest = self.config.basedir.join(file_name);

        if self.runtime.exists(&dest) && same_file(self.runtime, source, &dest) {
            debug!("{} is already in place.", dest.display());
            return Ok(());
        }

        self.runtime
            .copy(source, &dest)
            .with_context(|| format!("Failed to copy {:?} to {:?}", source, self.config.basedir))?;
        debug!("Copied {} to {}.", source.display(), dest.display());
        Ok(())
    }

    /// Remove every other version of `reference` from the repository directory,
    /// together with its signature. Returns the removed paths.
    #[tracing::instrument(level = "debug", skip(self, reference), fields(repository = %self.config.name, reference = %reference.path().display()))]
    pub fn isolate(&self, reference: &PackageFile) -> Result<Vec<PathBuf>> {
        let wanted = reference.identity(self.resolver)?;
        let comparator = self.resolver.comparator();
        let mut removed = Vec::new();

        for candidate in self.packages_for_base(&wanted.pkgbase)? {
            if same_file(self.runtime, candidate.path(), reference.path())
                || !candidate.is_other_version_of(reference, self.resolver)?
            {
                debug!("Keeping {}.", candidate.path().display());
                continue;
            }

            let found = candidate.identity(self.resolver)?;
            if comparator.greater(&found.version, &wanted.version)? {
                warn!(
                    "Removing {} {} which is newer than {}.",
                    found.pkgbase, found.version, wanted.version
                );
            }

            info!("Deleting {}.", candidate.path().display());
            self.runtime.remove_file(candidate.path())?;
            removed.push(candidate.path().to_path_buf());

            let signature = candidate.signature();
            if self.runtime.is_file(&signature) {
                self.runtime.remove_file(&signature)?;
                debug!("Deleted {}.", signature.display());
                removed.push(signature);
            }
        }

        Ok(removed)
    }

    /// Mirror the repository directory to `target`, or the configured target.
    ///
    /// Returns `Ok(false)` when no target is known; that is reported here and
    /// left to the caller to count.
    #[tracing::instrument(level = "debug", skip(self), fields(repository = %self.config.name))]
    pub fn sync(&self, target: Option<&str>, delete: bool) -> Result<bool> {
        let Some(target) = target.or(self.config.target.as_deref()) else {
            error!("{}", RepoError::NoSyncTarget(self.config.name.clone()));
            return Ok(false);
        };

        let mut source = self.config.basedir.to_string_lossy().into_owned();
        if delete && !source.ends_with('/') {
            source.push('/');
        }

        info!("Synchronizing {} to {}.", self.config.name, target);
        self.tools
            .rsync(&self.config.basedir, &source, target, delete)
            .with_context(|| format!("Failed to synchronize {}", self.config.name))?;
        Ok(true)
    }
}
