//! Which repositories a package goes to, and how to open them.

use anyhow::Result;

use crate::config::{Memberships, RepositorySettings};
use crate::error::RepoError;
use crate::package::IdentityResolver;
use crate::repository::Repository;
use crate::runtime::Runtime;
use crate::tools::Tools;

/// Configured repositories together with the package membership map.
pub struct RepositoryDirectory {
    settings: RepositorySettings,
    memberships: Memberships,
}

impl RepositoryDirectory {
    pub fn new(settings: RepositorySettings, memberships: Memberships) -> Self {
        Self {
            settings,
            memberships,
        }
    }

    pub fn settings(&self) -> &RepositorySettings {
        &self.settings
    }

    /// Repository names for a pkgbase.
    ///
    /// An explicit name wins over the membership map and must be configured.
    pub fn resolve(&self, pkgbase: &str, explicit: Option<&str>) -> Result<Vec<String>, RepoError> {
        if let Some(name) = explicit {
            self.settings.repository(name)?;
            return Ok(vec![name.to_string()]);
        }

        let names = self.memberships.repositories(pkgbase);
        if names.is_empty() {
            return Err(RepoError::MissingRepositoryMapping(pkgbase.to_string()));
        }

        Ok(names.into_iter().map(String::from).collect())
    }

    pub fn open<'a, R: Runtime, T: Tools>(
        &self,
        name: &str,
        runtime: &'a R,
        tools: &'a T,
        resolver: &'a IdentityResolver<'a, T>,
    ) -> Result<Repository<'a, R, T>> {
        let config = self.settings.repository(name)?;
        Ok(Repository::new(config, runtime, tools, resolver))
    }
}
