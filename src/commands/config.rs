use anyhow::Result;
use std::path::Path;

use crate::{
    application::RepositoryDirectory,
    config::{Memberships, RepositorySettings},
    package::IdentityStrategy,
    runtime::Runtime,
    tools::{SystemTools, Tools},
};

/// Everything a run needs, loaded once.
pub struct Config<R: Runtime, T: Tools> {
    pub runtime: R,
    pub tools: T,
    pub directory: RepositoryDirectory,
    pub strategy: IdentityStrategy,
}

impl<R: Runtime> Config<R, SystemTools> {
    pub fn new(
        runtime: R,
        config_file: &Path,
        mapping_file: &Path,
        strategy: IdentityStrategy,
    ) -> Result<Self> {
        Self::with_tools(runtime, SystemTools, config_file, mapping_file, strategy)
    }
}

impl<R: Runtime, T: Tools> Config<R, T> {
    pub fn with_tools(
        runtime: R,
        tools: T,
        config_file: &Path,
        mapping_file: &Path,
        strategy: IdentityStrategy,
    ) -> Result<Self> {
        let settings = RepositorySettings::load(&runtime, config_file)?;
        let memberships = Memberships::load(&runtime, mapping_file)?;

        Ok(Self {
            runtime,
            tools,
            directory: RepositoryDirectory::new(settings, memberships),
            strategy,
        })
    }
}
