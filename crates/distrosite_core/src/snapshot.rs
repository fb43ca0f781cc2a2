use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::enrich::EnrichedRecord;

/// The client-side fallback data, as parsed back from `distro-data.js`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDocument {
    pub generated_at: String,
    pub last_updated_display: String,
    pub distros: Vec<EnrichedRecord>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotView<'a> {
    generated_at: &'a str,
    last_updated_display: &'a str,
    distros: &'a [EnrichedRecord],
}

/// `window.<global>=<compact JSON>;`
pub fn render_snapshot(
    global: &str,
    generated_at: &str,
    last_updated_display: &str,
    distros: &[EnrichedRecord],
) -> Result<String> {
    let json = serde_json::to_string(&SnapshotView {
        generated_at,
        last_updated_display,
        distros,
    })
    .context("failed to serialize snapshot")?;
    Ok(format!("window.{global}={json};"))
}

pub fn write_snapshot(
    path: &Path,
    global: &str,
    generated_at: &str,
    last_updated_display: &str,
    distros: &[EnrichedRecord],
) -> Result<()> {
    let body = render_snapshot(global, generated_at, last_updated_display, distros)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, body).with_context(|| format!("failed to write {}", path.display()))
}

/// Accepts either the JS assignment or the bare JSON document.
pub fn parse_snapshot(text: &str) -> Result<SnapshotDocument> {
    let trimmed = text.trim();
    let json = if trimmed.starts_with("window.") {
        let Some((_, assigned)) = trimmed.split_once('=') else {
            bail!("snapshot script has no assignment");
        };
        assigned.trim().trim_end_matches(';').trim_end()
    } else {
        trimmed
    };
    serde_json::from_str(json).context("snapshot is not a valid document")
}

pub fn read_snapshot(path: &Path) -> Result<SnapshotDocument> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    parse_snapshot(&text).with_context(|| format!("failed to parse {}", path.display()))
}
