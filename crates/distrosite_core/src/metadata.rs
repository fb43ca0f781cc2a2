use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::BuildError;

const EMBEDDED_METADATA: &str = include_str!("../../../config/curated-metadata.toml");

/// Rank used for ordering when a record carries no popularity rank.
pub const UNRANKED: u32 = 999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum ReleaseModel {
    #[serde(rename = "LTS")]
    Lts,
    Rolling,
    Release,
    Hybrid,
}

impl ReleaseModel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lts => "LTS",
            Self::Rolling => "Rolling",
            Self::Release => "Release",
            Self::Hybrid => "Hybrid",
        }
    }

    /// Release models that are surfaced as a page badge.
    pub fn is_badge(self) -> bool {
        matches!(self, Self::Lts | Self::Rolling)
    }
}

impl fmt::Display for ReleaseModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Hint {
    Beginner,
    Server,
    Security,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CuratedMetadata {
    pub release_model: ReleaseModel,
    pub popularity_rank: Option<u32>,
    pub wiki_title: Option<String>,
    #[serde(default)]
    pub hints: BTreeSet<Hint>,
}

impl CuratedMetadata {
    pub fn has_hint(&self, hint: Hint) -> bool {
        self.hints.contains(&hint)
    }
}

#[derive(Debug, Deserialize)]
struct MetadataFile {
    #[serde(default)]
    distros: BTreeMap<String, CuratedMetadata>,
}

/// Read-only curated metadata keyed by distribution id.
#[derive(Debug, Clone, Default)]
pub struct MetadataStore {
    entries: BTreeMap<String, CuratedMetadata>,
}

impl MetadataStore {
    pub fn from_entries(entries: BTreeMap<String, CuratedMetadata>) -> Self {
        Self { entries }
    }

    pub fn parse(content: &str) -> Result<Self> {
        let parsed: MetadataFile =
            toml::from_str(content).context("failed to parse curated metadata TOML")?;
        Ok(Self::from_entries(parsed.distros))
    }

    pub fn embedded() -> Result<Self> {
        Self::parse(EMBEDDED_METADATA)
    }

    /// Load the project override when it exists, otherwise the built-in table.
    pub fn load(override_path: &Path) -> Result<Self> {
        if !override_path.exists() {
            return Self::embedded();
        }
        let content = fs::read_to_string(override_path)
            .with_context(|| format!("failed to read {}", override_path.display()))?;
        Self::parse(&content).with_context(|| format!("failed to load {}", override_path.display()))
    }

    pub fn get(&self, id: &str) -> Option<&CuratedMetadata> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Fails with [`BuildError::MissingMetadata`] naming every uncovered id, sorted.
    pub fn ensure_covers<'a, I>(&self, ids: I) -> Result<(), BuildError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let missing = ids
            .into_iter()
            .filter(|id| !self.entries.contains_key(*id))
            .map(ToString::to_string)
            .collect::<BTreeSet<_>>();
        if missing.is_empty() {
            return Ok(());
        }
        Err(BuildError::MissingMetadata {
            ids: missing.into_iter().collect(),
        })
    }
}

pub fn embedded_metadata_source() -> &'static str {
    EMBEDDED_METADATA
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::{Hint, MetadataStore, ReleaseModel};
    use crate::error::BuildError;

    #[test]
    fn embedded_table_covers_thirty_distributions() {
        let store = MetadataStore::embedded().expect("embedded");
        assert_eq!(store.len(), 30);
        let ubuntu = store.get("ubuntu").expect("ubuntu");
        assert_eq!(ubuntu.release_model, ReleaseModel::Lts);
        assert_eq!(ubuntu.popularity_rank, Some(1));
        assert!(ubuntu.has_hint(Hint::Beginner));
        let opensuse = store.get("opensuse").expect("opensuse");
        assert_eq!(opensuse.release_model, ReleaseModel::Hybrid);
        assert!(opensuse.hints.is_empty());
        assert_eq!(
            store.get("kali").and_then(|meta| meta.wiki_title.as_deref()),
            Some("Kali Linux")
        );
    }

    #[test]
    fn ensure_covers_reports_sorted_missing_ids() {
        let store = MetadataStore::parse(
            "[distros.arch]\nrelease_model = \"Rolling\"\npopularity_rank = 4\n",
        )
        .expect("parse");
        let error = store
            .ensure_covers(["zeta", "arch", "beta", "zeta"])
            .expect_err("must fail");
        assert_eq!(
            error,
            BuildError::MissingMetadata {
                ids: vec!["beta".to_string(), "zeta".to_string()]
            }
        );
        store.ensure_covers(["arch"]).expect("covered");
    }

    #[test]
    fn parse_rejects_unknown_release_model() {
        let error = MetadataStore::parse("[distros.x]\nrelease_model = \"Weekly\"\n")
            .expect_err("must fail");
        assert!(error.to_string().contains("curated metadata"));
    }

    #[test]
    fn load_prefers_override_file() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("curated-metadata.toml");
        assert_eq!(MetadataStore::load(&path).expect("embedded").len(), 30);

        fs::write(&path, "[distros.custom]\nrelease_model = \"Release\"\n").expect("write");
        let store = MetadataStore::load(&path).expect("override");
        assert_eq!(store.len(), 1);
        assert!(store.get("custom").expect("custom").popularity_rank.is_none());
    }
}
