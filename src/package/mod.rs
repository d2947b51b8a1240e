//! Package model
//!
//! This module describes package archives: how a file name maps to a pkgbase,
//! version, architecture and compression, and when two files are versions of the
//! same package.

mod file;
mod identity;
mod version;

pub use file::{PackageFile, signature_path};
pub use identity::{
    Architecture, IdentityResolver, IdentityStrategy, PACKAGE_GLOB, PackageIdentity,
};
pub use version::{Version, VersionComparator};
