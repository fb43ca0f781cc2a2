use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::assets::{AssetResolver, LogoCache};
use crate::catalogue::{DistroRecord, load_catalogue};
use crate::config::SiteConfig;
use crate::enrich::{EnrichedRecord, enrich_detailed, merge_curated};
use crate::fetch::HttpFetch;
use crate::imaging::{BLANK_PNG, ImageComposer};
use crate::metadata::MetadataStore;
use crate::render::{SiteIdentity, render_detail_page};
use crate::runtime::ResolvedPaths;
use crate::screenshots::{ScreenshotSource, WikipediaScreenshots};
use crate::sitemap::{render_sitemap, write_sitemap};
use crate::snapshot::write_snapshot;

const LAST_UPDATED_FORMAT: &str = "%B %d, %Y";
const LASTMOD_FORMAT: &str = "%Y-%m-%d";

/// Capabilities a build run talks to; swapped out for offline runs and tests.
pub struct BuildServices<'a> {
    pub fetcher: &'a dyn HttpFetch,
    pub composer: &'a dyn ImageComposer,
    pub fetch_screenshots: bool,
}

#[derive(Debug, Clone)]
pub struct BuildReport {
    pub records: usize,
    pub pages_written: usize,
    pub logos_fetched: usize,
    pub logos_cached: usize,
    pub placeholder_logos: usize,
    pub screenshot_refreshes: usize,
    pub preview_images: usize,
    pub composer: &'static str,
    pub pages_dir: PathBuf,
    pub snapshot_path: PathBuf,
    pub sitemap_path: PathBuf,
    pub sitemap_urls: usize,
}

#[derive(Debug, Clone)]
pub struct CheckReport {
    pub records: usize,
    pub metadata_entries: usize,
    pub metadata_source: &'static str,
    pub with_wiki_title: usize,
}

/// Catalogue plus a metadata store known to cover every record.
pub fn load_inputs(paths: &ResolvedPaths) -> Result<(Vec<DistroRecord>, MetadataStore)> {
    let records = load_catalogue(&paths.catalogue_path)?;
    let store = MetadataStore::load(&paths.metadata_path)?;
    store.ensure_covers(records.iter().map(|record| record.id.as_str()))?;
    Ok((records, store))
}

pub fn check_inputs(paths: &ResolvedPaths) -> Result<CheckReport> {
    let (records, store) = load_inputs(paths)?;
    let with_wiki_title = records
        .iter()
        .filter_map(|record| store.get(&record.id))
        .filter(|curated| curated.wiki_title.is_some())
        .count();
    Ok(CheckReport {
        records: records.len(),
        metadata_entries: store.len(),
        metadata_source: metadata_source(&paths.metadata_path),
        with_wiki_title,
    })
}

/// Records merged with curated metadata only, without touching the network or disk.
pub fn curated_records(paths: &ResolvedPaths) -> Result<Vec<EnrichedRecord>> {
    let (records, store) = load_inputs(paths)?;
    Ok(records
        .into_iter()
        .filter_map(|record| {
            let curated = store.get(&record.id)?;
            Some(merge_curated(record, curated))
        })
        .collect())
}

pub fn run_build(
    paths: &ResolvedPaths,
    config: &SiteConfig,
    services: &BuildServices<'_>,
    now: DateTime<Utc>,
) -> Result<BuildReport> {
    let (records, store) = load_inputs(paths)?;
    log::info!(
        "building {} distribution(s) from {}",
        records.len(),
        paths.catalogue_path.display()
    );

    let timeouts = config.timeouts();
    let cache = LogoCache::new(&paths.logo_dir);
    let resolver = AssetResolver::standard(
        services.fetcher,
        services.composer,
        &cache,
        config.logo_service_url(),
        timeouts.logo,
    );
    let wikipedia = WikipediaScreenshots::new(
        services.fetcher,
        config.screenshot_api_url(),
        config.screenshot_limit(),
        timeouts.screenshot,
    );
    let screenshots: Option<&dyn ScreenshotSource> = if services.fetch_screenshots {
        Some(&wikipedia)
    } else {
        None
    };

    let mut report = BuildReport {
        records: records.len(),
        pages_written: 0,
        logos_fetched: 0,
        logos_cached: 0,
        placeholder_logos: 0,
        screenshot_refreshes: 0,
        preview_images: 0,
        composer: services.composer.name(),
        pages_dir: paths.pages_dir.clone(),
        snapshot_path: paths.snapshot_path.clone(),
        sitemap_path: paths.sitemap_path.clone(),
        sitemap_urls: 0,
    };

    let mut enriched = Vec::with_capacity(records.len());
    for record in records {
        let enrichment = enrich_detailed(record, &store, &resolver, screenshots)?;
        if enrichment.logo.provider == "placeholder" {
            report.placeholder_logos += 1;
        } else if enrichment.logo.from_cache {
            report.logos_cached += 1;
        } else {
            report.logos_fetched += 1;
        }
        if enrichment.screenshots_fetched > 0 {
            report.screenshot_refreshes += 1;
        }
        enriched.push(enrichment.record);
    }

    let last_updated = now.format(LAST_UPDATED_FORMAT).to_string();
    let site = SiteIdentity::from_config(config);
    fs::create_dir_all(&paths.pages_dir)
        .with_context(|| format!("failed to create {}", paths.pages_dir.display()))?;
    fs::create_dir_all(&paths.og_dir)
        .with_context(|| format!("failed to create {}", paths.og_dir.display()))?;

    for record in &enriched {
        write_preview_image(record, &paths.og_dir, services, timeouts.preview)?;
        report.preview_images += 1;

        let page = render_detail_page(record, &last_updated, &enriched, &site);
        let page_path = paths.pages_dir.join(format!("{}.html", record.id()));
        fs::write(&page_path, page)
            .with_context(|| format!("failed to write {}", page_path.display()))?;
        report.pages_written += 1;
    }

    write_snapshot(
        &paths.snapshot_path,
        config.snapshot_global(),
        &now.to_rfc3339(),
        &last_updated,
        &enriched,
    )?;

    let static_pages = config.static_pages();
    let sitemap = render_sitemap(
        &site.base_url,
        &static_pages,
        enriched.iter().map(EnrichedRecord::id),
        &now.format(LASTMOD_FORMAT).to_string(),
    );
    report.sitemap_urls = sitemap.matches("<url>").count();
    write_sitemap(&paths.sitemap_path, &sitemap)?;

    log::info!(
        "wrote {} page(s), {} placeholder logo(s), {} screenshot refresh(es)",
        report.pages_written,
        report.placeholder_logos,
        report.screenshot_refreshes
    );
    Ok(report)
}

/// `<og_dir>/<id>.png`, rewritten on every run. Image failures degrade to a blank PNG.
fn write_preview_image(
    record: &EnrichedRecord,
    og_dir: &Path,
    services: &BuildServices<'_>,
    timeout: Duration,
) -> Result<()> {
    let background = record.record.screenshots.first().and_then(|url| {
        match services.fetcher.get_bytes(url, timeout) {
            Ok(bytes) => Some(bytes),
            Err(error) => {
                log::warn!("[{}] preview background unavailable: {error:#}", record.id());
                None
            }
        }
    });
    let bytes = match services
        .composer
        .preview_card(&record.record.name, background.as_deref())
    {
        Ok(bytes) => bytes,
        Err(error) => {
            log::warn!("[{}] preview image failed: {error:#}", record.id());
            BLANK_PNG.to_vec()
        }
    };
    let target = og_dir.join(format!("{}.png", record.id()));
    fs::write(&target, bytes).with_context(|| format!("failed to write {}", target.display()))
}

fn metadata_source(metadata_path: &Path) -> &'static str {
    if metadata_path.exists() {
        "override"
    } else {
        "embedded"
    }
}
