//! Add use case: put each package into every repository it belongs to.
//!
//! Failures are contained per package. One package that cannot be resolved,
//! signed or registered is logged and counted, and the loop moves on.

use std::collections::BTreeSet;

use anyhow::Result;
use log::{debug, error, warn};

use super::{Interrupt, RepositoryDirectory};
use crate::error::RepoError;
use crate::package::{IdentityResolver, PackageFile};
use crate::runtime::Runtime;
use crate::tools::Tools;

/// Options for the add use case
#[derive(Debug, Clone, Default)]
pub struct AddOptions {
    /// Explicit target repository, bypassing the membership map
    pub repository: Option<String>,
    /// Signing override; `None` follows each repository's `sign` setting
    pub sign: Option<bool>,
    /// Remove other versions after adding
    pub clean: bool,
}

/// Outcome of an add run.
#[derive(Debug, Default)]
pub struct AddReport {
    /// Packages that could not be added
    pub failures: usize,
    /// Every repository a package was resolved to, whether or not the add succeeded
    pub repositories: BTreeSet<String>,
}

pub struct AddUseCase<'a, R: Runtime, T: Tools> {
    runtime: &'a R,
    tools: &'a T,
    resolver: &'a IdentityResolver<'a, T>,
    directory: &'a RepositoryDirectory,
    interrupt: &'a Interrupt,
}

impl<'a, R: Runtime, T: Tools> AddUseCase<'a, R, T> {
    pub fn new(
        runtime: &'a R,
        tools: &'a T,
        resolver: &'a IdentityResolver<'a, T>,
        directory: &'a RepositoryDirectory,
        interrupt: &'a Interrupt,
    ) -> Self {
        Self {
            runtime,
            tools,
            resolver,
            directory,
            interrupt,
        }
    }

    #[tracing::instrument(level = "debug", skip(self, packages))]
    pub fn execute(&self, packages: &[PackageFile], options: &AddOptions) -> AddReport {
        let mut report = AddReport::default();

        for package in packages {
            let result = self.add_package(package, options, &mut report.repositories);
            let interrupted = self.interrupt.take();

            match result {
                Ok(()) if interrupted => {
                    debug!("Interrupt arrived after {} was added", package.file_name())
                }
                Ok(()) => {}
                Err(_) if interrupted => {
                    warn!("Aborted by user.");
                    report.failures += 1;
                }
                Err(err) => {
                    report_failure(package, &err);
                    report.failures += 1;
                }
            }
        }

        report
    }

    fn add_package(
        &self,
        package: &PackageFile,
        options: &AddOptions,
        touched: &mut BTreeSet<String>,
    ) -> Result<()> {
        let pkgbase = package.pkgbase(self.resolver)?;
        let names = self
            .directory
            .resolve(pkgbase, options.repository.as_deref())?;

        for name in names {
            if self.interrupt.pending() {
                return Err(RepoError::Interrupted.into());
            }

            touched.insert(name.clone());
            let repository = self
                .directory
                .open(&name, self.runtime, self.tools, self.resolver)?;
            repository.add(package, options.sign, options.clean)?;
        }

        Ok(())
    }
}

fn report_failure(package: &PackageFile, err: &anyhow::Error) {
    match err.downcast_ref::<RepoError>() {
        Some(mapping @ RepoError::MissingRepositoryMapping(_)) => error!("{}", mapping),
        _ => error!("Failed to add {}: {:#}", package.file_name(), err),
    }
}
