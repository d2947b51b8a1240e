//! Configuration files: repository definitions and package memberships.

mod membership;
mod repository;

pub use membership::Memberships;
pub use repository::{DEFAULT_DBEXT, RepositoryConfig, RepositorySettings};

pub const CONFIG_FILE: &str = "/etc/repotool.conf";
pub const MAPPING_FILE: &str = "/etc/repotool.json";
