use std::collections::BTreeSet;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::assets::{AssetResolver, LogoRequest, ResolvedLogo};
use crate::catalogue::DistroRecord;
use crate::error::BuildError;
use crate::metadata::{CuratedMetadata, Hint, MetadataStore, ReleaseModel, UNRANKED};
use crate::screenshots::ScreenshotSource;
use crate::urls::normalize_url;

/// Keys owned by the enriched record; same-named input keys are dropped.
const RESERVED_KEYS: &[&str] = &["logo_source", "logo_local", "release_model", "popularity_rank"];

/// A catalogue record after curated metadata and resolved assets are merged in.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub record: DistroRecord,
    #[serde(default)]
    pub logo_source: String,
    #[serde(default)]
    pub logo_local: String,
    pub release_model: ReleaseModel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity_rank: Option<u32>,
    #[serde(skip)]
    pub hints: BTreeSet<Hint>,
}

impl EnrichedRecord {
    pub fn id(&self) -> &str {
        &self.record.id
    }

    /// Popularity rank for ordering; unranked records sort last.
    pub fn rank(&self) -> u32 {
        self.popularity_rank.unwrap_or(UNRANKED)
    }

    pub fn has_hint(&self, hint: Hint) -> bool {
        self.hints.contains(&hint)
    }
}

#[derive(Debug, Clone)]
pub struct Enrichment {
    pub record: EnrichedRecord,
    pub logo: ResolvedLogo,
    /// Number of screenshots that replaced the catalogue's own, zero when untouched.
    pub screenshots_fetched: usize,
}

/// Pure merge of curated fields; assets are left as the catalogue supplied them.
pub fn merge_curated(mut record: DistroRecord, curated: &CuratedMetadata) -> EnrichedRecord {
    for key in RESERVED_KEYS {
        record.extra.remove(*key);
    }
    record.website = normalize_url(&record.website);
    record.download_url = normalize_url(&record.download_url);
    let logo_source = record.logo.trim().to_string();
    EnrichedRecord {
        record,
        logo_source,
        logo_local: String::new(),
        release_model: curated.release_model,
        popularity_rank: curated.popularity_rank,
        hints: curated.hints.clone(),
    }
}

pub fn enrich(
    raw: DistroRecord,
    store: &MetadataStore,
    resolver: &AssetResolver<'_>,
    screenshots: Option<&dyn ScreenshotSource>,
) -> Result<EnrichedRecord> {
    enrich_detailed(raw, store, resolver, screenshots).map(|enrichment| enrichment.record)
}

/// Enrichment plus what happened along the way, for build reporting.
///
/// Only a missing metadata entry or a logo that could not even be written as a
/// placeholder is an error; screenshot failures are logged and ignored.
pub fn enrich_detailed(
    raw: DistroRecord,
    store: &MetadataStore,
    resolver: &AssetResolver<'_>,
    screenshots: Option<&dyn ScreenshotSource>,
) -> Result<Enrichment> {
    let Some(curated) = store.get(&raw.id) else {
        return Err(BuildError::MissingMetadata {
            ids: vec![raw.id.clone()],
        }
        .into());
    };
    let mut enriched = merge_curated(raw, curated);

    let logo = resolver.resolve(&LogoRequest {
        id: &enriched.record.id,
        name: &enriched.record.name,
        logo_url: &enriched.logo_source,
        website: &enriched.record.website,
    })?;
    log::info!(
        "[{}] logo via {}{}: {}",
        enriched.id(),
        logo.provider,
        if logo.from_cache { " (cached)" } else { "" },
        logo.relative_path
    );
    enriched.record.logo = logo.relative_path.clone();
    enriched.logo_local = logo.relative_path.clone();

    let mut screenshots_fetched = 0;
    if let (Some(title), Some(source)) = (curated.wiki_title.as_deref(), screenshots) {
        match source.screenshots(title) {
            Ok(urls) => {
                log::info!("[{}] found {} screenshot(s) for `{title}`", enriched.id(), urls.len());
                if !urls.is_empty() {
                    screenshots_fetched = urls.len();
                    enriched.record.screenshots = urls;
                }
            }
            Err(error) => {
                log::warn!(
                    "[{}] keeping catalogue screenshots: {error:#}",
                    enriched.id()
                );
            }
        }
    }

    Ok(Enrichment {
        record: enriched,
        logo,
        screenshots_fetched,
    })
}
