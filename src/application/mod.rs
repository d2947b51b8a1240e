//! Application layer - Use cases that coordinate repositories.
//!
//! This layer sits between the CLI glue and the repository engine. It decides
//! which repositories a package goes to, contains failures per package, and
//! turns a run into a failure count.

mod add;
mod directory;
mod interrupt;
mod list;
mod sync;

pub use add::{AddOptions, AddReport, AddUseCase};
pub use directory::RepositoryDirectory;
pub use interrupt::Interrupt;
pub use list::list_packages;
pub use sync::SyncUseCase;
