use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::fetch::HttpFetch;

/// External reference source for desktop screenshots, keyed by a page title.
pub trait ScreenshotSource {
    fn screenshots(&self, title: &str) -> Result<Vec<String>>;
}

/// Image URLs attached to a Wikipedia article, via the MediaWiki Action API.
pub struct WikipediaScreenshots<'a> {
    fetcher: &'a dyn HttpFetch,
    api_url: String,
    limit: usize,
    timeout: Duration,
}

impl<'a> WikipediaScreenshots<'a> {
    pub fn new(fetcher: &'a dyn HttpFetch, api_url: &str, limit: usize, timeout: Duration) -> Self {
        Self {
            fetcher,
            api_url: api_url.to_string(),
            limit,
            timeout,
        }
    }
}

impl ScreenshotSource for WikipediaScreenshots<'_> {
    fn screenshots(&self, title: &str) -> Result<Vec<String>> {
        let query = [
            ("action", "query".to_string()),
            ("generator", "images".to_string()),
            ("gimlimit", "max".to_string()),
            ("prop", "imageinfo".to_string()),
            ("iiprop", "url".to_string()),
            ("titles", title.to_string()),
            ("format", "json".to_string()),
            ("formatversion", "2".to_string()),
        ];
        let payload = self
            .fetcher
            .get_json(&self.api_url, &query, self.timeout)
            .with_context(|| format!("screenshot query for `{title}` failed"))?;
        Ok(screenshot_urls(&payload, self.limit))
    }
}

/// Screenshot-looking image URLs from an `action=query` response, in page order.
pub fn screenshot_urls(payload: &Value, limit: usize) -> Vec<String> {
    let pages: Vec<&Value> = match payload.pointer("/query/pages") {
        Some(Value::Array(pages)) => pages.iter().collect(),
        Some(Value::Object(pages)) => pages.values().collect(),
        _ => Vec::new(),
    };

    let mut urls = Vec::new();
    for page in pages {
        if urls.len() >= limit {
            break;
        }
        let title = page.get("title").and_then(Value::as_str).unwrap_or_default();
        if !looks_like_screenshot(title) {
            continue;
        }
        let Some(url) = page
            .pointer("/imageinfo/0/url")
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
        else {
            continue;
        };
        log::debug!("screenshot candidate: {url}");
        urls.push(url.to_string());
    }
    urls
}

fn looks_like_screenshot(file_title: &str) -> bool {
    let lower = file_title.to_ascii_lowercase();
    let raster = [".png", ".jpg", ".jpeg"]
        .iter()
        .any(|suffix| lower.ends_with(suffix));
    raster && !lower.contains("logo") && !lower.contains("icon")
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::{ScreenshotSource, WikipediaScreenshots, screenshot_urls};
    use crate::test_support::FakeFetcher;

    const API: &str = "https://wiki.example/w/api.php";

    fn page(title: &str, url: &str) -> serde_json::Value {
        json!({ "title": title, "imageinfo": [{ "url": url }] })
    }

    #[test]
    fn filters_logos_icons_and_non_raster_files() {
        let payload = json!({
            "query": {
                "pages": [
                    page("File:Debian-OpenLogo.svg", "https://img/logo.svg"),
                    page("File:Debian 12 desktop.png", "https://img/desktop.png"),
                    page("File:Debian logo.png", "https://img/logo.png"),
                    page("File:Tray ICON.jpg", "https://img/icon.jpg"),
                    page("File:Installer.JPEG", "https://img/installer.jpeg"),
                    { "title": "File:No info.png" }
                ]
            }
        });
        assert_eq!(
            screenshot_urls(&payload, 6),
            vec![
                "https://img/desktop.png".to_string(),
                "https://img/installer.jpeg".to_string()
            ]
        );
    }

    #[test]
    fn accepts_legacy_page_objects_and_applies_limit() {
        let payload = json!({
            "query": {
                "pages": {
                    "-1": page("File:A.png", "https://img/a.png"),
                    "-2": page("File:B.png", "https://img/b.png"),
                    "-3": page("File:C.png", "https://img/c.png")
                }
            }
        });
        assert_eq!(screenshot_urls(&payload, 2).len(), 2);
        assert!(screenshot_urls(&json!({ "batchcomplete": true }), 6).is_empty());
    }

    #[test]
    fn source_queries_api_and_reports_failures() {
        let fetcher = FakeFetcher::default().with_json(
            API,
            json!({ "query": { "pages": [page("File:Shot.png", "https://img/shot.png")] } }),
        );
        let source = WikipediaScreenshots::new(&fetcher, API, 6, Duration::from_secs(1));
        assert_eq!(
            source.screenshots("Debian").expect("screenshots"),
            vec!["https://img/shot.png".to_string()]
        );

        let offline = FakeFetcher::default();
        let source = WikipediaScreenshots::new(&offline, API, 6, Duration::from_secs(1));
        let error = source.screenshots("Debian").expect_err("no canned response");
        assert!(error.to_string().contains("`Debian`"));
    }
}
