//! Package to repository membership, read from a JSON mapping file.
//!
//! The file maps repository names to the pkgbases they carry:
//!
//! ```json
//! { "core-local": ["linux-custom", "mkinitcpio-hooks"], "extra-local": ["linux-custom"] }
//! ```

use anyhow::{Context, Result};
use log::warn;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use crate::runtime::Runtime;

#[derive(Deserialize, Debug, Default)]
#[serde(transparent)]
struct RepositoryMap(BTreeMap<String, Vec<String>>);

/// Inverted mapping: pkgbase -> repository names.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Memberships {
    members: HashMap<String, BTreeSet<String>>,
}

impl Memberships {
    pub fn parse(content: &str) -> Result<Self> {
        let map: RepositoryMap =
            serde_json::from_str(content).context("Failed to parse repository mapping")?;

        let mut members: HashMap<String, BTreeSet<String>> = HashMap::new();
        for (repository, pkgbases) in map.0 {
            for pkgbase in pkgbases {
                members
                    .entry(pkgbase)
                    .or_default()
                    .insert(repository.clone());
            }
        }

        Ok(Self { members })
    }

    /// Load the mapping file. A missing file yields no memberships.
    #[tracing::instrument(level = "debug", skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        let memberships = if runtime.is_file(path) {
            let content = runtime.read_to_string(path)?;
            Self::parse(&content).with_context(|| format!("Invalid mapping file {:?}", path))?
        } else {
            Self::default()
        };

        if memberships.is_empty() {
            warn!("No repo members configured in: {}", path.display());
        }

        Ok(memberships)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Repositories a pkgbase belongs to, in name order.
    pub fn repositories(&self, pkgbase: &str) -> Vec<&str> {
        self.members
            .get(pkgbase)
            .map(|names| names.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use std::path::PathBuf;

    #[test]
    fn test_parse_inverts_mapping() {
        let memberships = Memberships::parse(
            r#"{"extra-local": ["foo", "bar"], "core-local": ["foo"], "empty": []}"#,
        )
        .unwrap();

        assert_eq!(memberships.repositories("foo"), vec!["core-local", "extra-local"]);
        assert_eq!(memberships.repositories("bar"), vec!["extra-local"]);
        assert!(memberships.repositories("baz").is_empty());
    }

    #[test]
    fn test_duplicate_entries_collapse() {
        let memberships = Memberships::parse(r#"{"r": ["foo", "foo"]}"#).unwrap();
        assert_eq!(memberships.repositories("foo"), vec!["r"]);
    }

    #[test]
    fn test_parse_rejects_wrong_shape() {
        assert!(Memberships::parse(r#"["foo"]"#).is_err());
        assert!(Memberships::parse(r#"{"r": "foo"}"#).is_err());
        assert!(Memberships::parse("{").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let mut runtime = MockRuntime::new();
        runtime.expect_is_file().returning(|_| false);

        let memberships =
            Memberships::load(&runtime, &PathBuf::from("/etc/repotool.json")).unwrap();
        assert!(memberships.is_empty());
    }

    #[test]
    fn test_load_malformed_file_is_error() {
        let mut runtime = MockRuntime::new();
        runtime.expect_is_file().returning(|_| true);
        runtime
            .expect_read_to_string()
            .returning(|_| Ok("not json".to_string()));

        assert!(Memberships::load(&runtime, &PathBuf::from("/etc/repotool.json")).is_err());
    }
}
