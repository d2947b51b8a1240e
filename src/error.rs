//! Failure taxonomy shared by the package, repository and application layers.
//!
//! Most functions return `anyhow::Result`; the variants here are attached as the
//! root cause so the orchestration can tell a missing mapping from a failed
//! subprocess via `downcast_ref`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepoError {
    #[error("Not a package: {}", .0.display())]
    NotAPackage(PathBuf),

    #[error("No repositories configured for package: {0}")]
    MissingRepositoryMapping(String),

    #[error("Repository {0} is not configured")]
    UnknownRepository(String),

    #[error("Invalid configuration for repository {repository}: {message}")]
    InvalidConfig { repository: String, message: String },

    #[error("Required program not found on PATH: {0}")]
    ToolNotFound(String),

    #[error("{program} exited with {status}: {stderr}")]
    Subprocess {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("Unexpected output from {program}: {output:?}")]
    UnexpectedOutput { program: String, output: String },

    #[error("No target specified for repository {0}")]
    NoSyncTarget(String),

    #[error("Aborted by user")]
    Interrupted,
}
