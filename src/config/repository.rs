//! Repository sections of the ini-style configuration file.
//!
//! ```ini
//! [myrepo]
//! basedir = /srv/http/myrepo
//! dbext = .db.tar.zst
//! sign = yes
//! target = mirror.example.org:/srv/http/myrepo
//! ```

use anyhow::{Context, Result};
use ini::{Ini, Properties};
use log::warn;
use std::path::{Path, PathBuf};

use crate::error::RepoError;
use crate::runtime::Runtime;

pub const DEFAULT_DBEXT: &str = ".db.tar.zst";

/// Static description of one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    pub name: String,
    pub basedir: PathBuf,
    pub dbext: String,
    pub sign: bool,
    pub target: Option<String>,
}

impl RepositoryConfig {
    pub fn new(name: impl Into<String>, basedir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            basedir: basedir.into(),
            dbext: DEFAULT_DBEXT.to_string(),
            sign: true,
            target: None,
        }
    }

    /// The database file name, relative to `basedir`.
    pub fn database(&self) -> String {
        format!("{}{}", self.name, self.dbext)
    }

    fn from_section(name: &str, section: &Properties) -> Result<Self, RepoError> {
        let invalid = |message: String| RepoError::InvalidConfig {
            repository: name.to_string(),
            message,
        };

        let basedir = property(section, "basedir")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| invalid("missing basedir".to_string()))?;

        let sign = match property(section, "sign") {
            Some(value) => parse_bool(value)
                .ok_or_else(|| invalid(format!("not a boolean: sign = {}", value)))?,
            None => true,
        };

        Ok(Self {
            name: name.to_string(),
            basedir: PathBuf::from(basedir.trim()),
            dbext: property(section, "dbext")
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|| DEFAULT_DBEXT.to_string()),
            sign,
            target: property(section, "target")
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from),
        })
    }
}

/// Option lookup ignoring the case of the key. The last occurrence wins.
fn property<'p>(section: &'p Properties, key: &str) -> Option<&'p str> {
    section
        .iter()
        .filter(|(k, _)| k.eq_ignore_ascii_case(key))
        .last()
        .map(|(_, v)| v)
}

/// Booleans as spelled in configparser files.
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "yes" | "true" | "on" => Some(true),
        "0" | "no" | "false" | "off" => Some(false),
        _ => None,
    }
}

/// All repository sections read from the configuration file.
pub struct RepositorySettings {
    ini: Ini,
}

impl RepositorySettings {
    pub fn empty() -> Self {
        Self { ini: Ini::new() }
    }

    pub fn parse(content: &str) -> Result<Self> {
        let ini = Ini::load_from_str(content).context("Failed to parse configuration")?;
        Ok(Self { ini })
    }

    /// Load the configuration file. A missing file yields an empty configuration.
    #[tracing::instrument(level = "debug", skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        if !runtime.is_file(path) {
            warn!("Unable to read config file: {}", path.display());
            return Ok(Self::empty());
        }

        let content = runtime.read_to_string(path)?;
        Self::parse(&content).with_context(|| format!("Invalid config file {:?}", path))
    }

    pub fn names(&self) -> Vec<&str> {
        self.ini.sections().flatten().collect()
    }

    pub fn repository(&self, name: &str) -> Result<RepositoryConfig, RepoError> {
        let section = self
            .ini
            .section(Some(name))
            .ok_or_else(|| RepoError::UnknownRepository(name.to_string()))?;
        RepositoryConfig::from_section(name, section)
    }
}
