use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Site-relative locations in sitemap order: the root, static pages, then one per distribution.
pub fn sitemap_paths<'a, I>(static_pages: &[String], ids: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut paths = vec![String::new()];
    for page in static_pages {
        let page = page.trim();
        if page.is_empty() {
            continue;
        }
        if page.starts_with('/') {
            paths.push(page.to_string());
        } else {
            paths.push(format!("/{page}"));
        }
    }
    paths.extend(ids.into_iter().map(|id| format!("/distros/{id}.html")));
    paths
}

pub fn render_sitemap<'a, I>(base_url: &str, static_pages: &[String], ids: I, lastmod: &str) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let base_url = base_url.trim_end_matches('/');
    let lastmod = escape_xml(lastmod);
    let mut output = String::new();
    output.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    output.push_str(&format!("<urlset xmlns=\"{SITEMAP_NAMESPACE}\">\n"));
    for path in sitemap_paths(static_pages, ids) {
        output.push_str(&format!(
            "  <url><loc>{}</loc><lastmod>{lastmod}</lastmod></url>\n",
            escape_xml(&format!("{base_url}{path}"))
        ));
    }
    output.push_str("</urlset>\n");
    output
}

pub fn write_sitemap(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}
