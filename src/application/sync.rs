//! Sync use case: mirror each touched repository once.

use log::{debug, error, warn};

use super::{Interrupt, RepositoryDirectory};
use crate::package::IdentityResolver;
use crate::runtime::Runtime;
use crate::tools::Tools;

pub struct SyncUseCase<'a, R: Runtime, T: Tools> {
    runtime: &'a R,
    tools: &'a T,
    resolver: &'a IdentityResolver<'a, T>,
    directory: &'a RepositoryDirectory,
    interrupt: &'a Interrupt,
}

impl<'a, R: Runtime, T: Tools> SyncUseCase<'a, R, T> {
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

    /// Mirror every named repository. Returns the number of failed mirrors.
    #[tracing::instrument(level = "debug", skip(self, names))]
    pub fn execute<'n>(
        &self,
        names: impl IntoIterator<Item = &'n str>,
        target: Option<&str>,
        delete: bool,
    ) -> usize {
        let mut failures = 0;

        if self.interrupt.take() {
            debug!("Discarding an interrupt that arrived before mirroring");
        }

        for name in names {
            let result = self
                .directory
                .open(name, self.runtime, self.tools, self.resolver)
                .and_then(|repository| repository.sync(target, delete));

            let interrupted = self.interrupt.take();

            match result {
                Ok(true) => {}
                Ok(false) => failures += 1,
                Err(_) if interrupted => {
                    warn!("Aborted by user.");
                    failures += 1;
                }
                Err(err) => {
                    error!("Failed to synchronize {}: {:#}", name, err);
                    failures += 1;
                }
            }
        }

        failures
    }
}
