use std::path::Path;

use reqwest::Url;

const LOGO_SUFFIXES: &[&str] = &["svg", "png", "jpg", "jpeg", "webp"];
const DEFAULT_LOGO_SUFFIX: &str = ".svg";

/// Turn a catalogue URL into an absolute one; empty stays empty.
pub fn normalize_url(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if trimmed.starts_with("//") {
        return format!("https:{trimmed}");
    }
    if has_scheme(trimmed) {
        return trimmed.to_string();
    }
    format!("https://{trimmed}")
}

/// True when the value opens with `scheme:`, whether or not the rest parses.
fn has_scheme(value: &str) -> bool {
    let Some((scheme, _)) = value.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|first| first.is_ascii_alphabetic())
        && chars.all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '+' | '-' | '.'))
}

pub fn extract_domain(url: &str) -> String {
    let Ok(parsed) = Url::parse(url.trim()) else {
        return String::new();
    };
    let host = parsed.host_str().unwrap_or("");
    host.strip_prefix("www.").unwrap_or(host).to_string()
}

/// File suffix (with dot) for a cached logo, taken from the URL path when it
/// names a known image type.
pub fn infer_logo_suffix(url: &str) -> String {
    let trimmed = url.trim();
    let path = match Url::parse(trimmed) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => trimmed
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };
    Path::new(&path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|ext| LOGO_SUFFIXES.contains(&ext.as_str()))
        .map(|ext| format!(".{ext}"))
        .unwrap_or_else(|| DEFAULT_LOGO_SUFFIX.to_string())
}

/// Logo `src` as seen from a page under `distros/`.
pub fn detail_logo_src(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if is_absolute_reference(trimmed) || trimmed.starts_with("data:") || trimmed.starts_with("../")
    {
        return trimmed.to_string();
    }
    format!("../{}", strip_relative_prefix(trimmed))
}

/// Site-absolute URL for a local asset path.
pub fn absolute_media_url(path: &str, base_url: &str) -> String {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if is_absolute_reference(trimmed) {
        return trimmed.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        strip_relative_prefix(trimmed)
    )
}

fn is_absolute_reference(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

fn strip_relative_prefix(value: &str) -> &str {
    value.trim_start_matches(['.', '/'])
}
