use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://bestlinuxdistros.com";
pub const DEFAULT_BRAND_NAME: &str = "BESTLINUXDISTROS";
pub const DEFAULT_USER_AGENT: &str = "bestlinuxdistros-bot/1.0";
pub const DEFAULT_LOGO_SERVICE_URL: &str = "https://logo.clearbit.com/";
pub const DEFAULT_SCREENSHOT_API_URL: &str = "https://en.wikipedia.org/w/api.php";
pub const DEFAULT_SCREENSHOT_LIMIT: usize = 6;
pub const DEFAULT_SNAPSHOT_GLOBAL: &str = "__BLD_DATA__";
const DEFAULT_LOGO_TIMEOUT_MS: u64 = 15_000;
const DEFAULT_SCREENSHOT_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_PREVIEW_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_API_RETRIES: usize = 0;

pub const DEFAULT_STATIC_PAGES: &[&str] = &[
    "/index.html",
    "/distros.html",
    "/compare.html",
    "/blog/index.html",
    "/blog/best-linux-distros-for-beginners-2025.html",
    "/blog/best-linux-distros-for-developers-and-programmers-2025.html",
    "/blog/best-lightweight-linux-distros-for-old-laptops-2025.html",
    "/blog/best-rolling-release-linux-distros-2025.html",
    "/blog/best-linux-distros-for-gaming-and-steam-deck-2025.html",
    "/blog/best-linux-distros-for-servers-and-cloud-2025.html",
    "/blog/best-linux-distros-for-security-and-penetration-testing-2025.html",
    "/blog/best-linux-distros-for-data-science-and-ai-2025.html",
    "/blog/best-linux-distros-for-designers-and-creatives-2025.html",
    "/blog/homelab-linux-distros-and-tools-2025.html",
    "/blog/best-linux-distros-for-privacy-and-anonymity-2025.html",
    "/blog/best-linux-distros-for-raspberry-pi-and-arm-2025.html",
    "/blog/linux-distros-for-educators-and-classrooms-2025.html",
    "/guides/index.html",
    "/guides/linux-beginners-guide-2025.html",
    "/guides/linux-security-hardening-2025.html",
    "/guides/how-to-choose-a-linux-distro.html",
    "/guides/linux-performance-tuning-2025.html",
    "/tools/index.html",
    "/tools/hardware-compatibility-checker.html",
    "/tools/package-manager-cheatsheet.html",
    "/tools/kernel-update-guide.html",
    "/tools/linux-filesystem-explained.html",
];

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct SiteConfig {
    #[serde(default)]
    pub site: SiteSection,
    #[serde(default)]
    pub network: NetworkSection,
    #[serde(default)]
    pub sources: SourcesSection,
    #[serde(default)]
    pub output: OutputSection,
    #[serde(default)]
    pub sitemap: SitemapSection,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct SiteSection {
    pub base_url: Option<String>,
    pub brand_name: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct NetworkSection {
    pub logo_timeout_ms: Option<u64>,
    pub screenshot_timeout_ms: Option<u64>,
    pub preview_timeout_ms: Option<u64>,
    pub api_retries: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct SourcesSection {
    pub logo_service_url: Option<String>,
    pub screenshot_api_url: Option<String>,
    pub screenshot_limit: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct OutputSection {
    pub snapshot_global: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct SitemapSection {
    pub static_pages: Option<Vec<String>>,
}

/// Per-request timeouts for the three kinds of network calls a build makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub logo: Duration,
    pub screenshot: Duration,
    pub preview: Duration,
}

impl SiteConfig {
    /// Resolve the public site URL: env DISTROSITE_BASE_URL > config > default.
    pub fn base_url(&self) -> String {
        env_override("DISTROSITE_BASE_URL")
            .or_else(|| self.site.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string()
    }

    pub fn brand_name(&self) -> String {
        self.site
            .brand_name
            .clone()
            .unwrap_or_else(|| DEFAULT_BRAND_NAME.to_string())
    }

    /// Resolve user agent: env DISTROSITE_USER_AGENT > config > default.
    pub fn user_agent(&self) -> String {
        env_override("DISTROSITE_USER_AGENT")
            .or_else(|| self.site.user_agent.clone())
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string())
    }

    /// DISTROSITE_HTTP_TIMEOUT_MS, when set, replaces every configured timeout.
    pub fn timeouts(&self) -> Timeouts {
        let global = env_override("DISTROSITE_HTTP_TIMEOUT_MS")
            .and_then(|value| value.parse::<u64>().ok());
        let pick = |configured: Option<u64>, default: u64| {
            Duration::from_millis(global.or(configured).unwrap_or(default))
        };
        Timeouts {
            logo: pick(self.network.logo_timeout_ms, DEFAULT_LOGO_TIMEOUT_MS),
            screenshot: pick(
                self.network.screenshot_timeout_ms,
                DEFAULT_SCREENSHOT_TIMEOUT_MS,
            ),
            preview: pick(self.network.preview_timeout_ms, DEFAULT_PREVIEW_TIMEOUT_MS),
        }
    }

    pub fn api_retries(&self) -> usize {
        self.network.api_retries.unwrap_or(DEFAULT_API_RETRIES)
    }

    pub fn logo_service_url(&self) -> &str {
        self.sources
            .logo_service_url
            .as_deref()
            .unwrap_or(DEFAULT_LOGO_SERVICE_URL)
    }

    pub fn screenshot_api_url(&self) -> &str {
        self.sources
            .screenshot_api_url
            .as_deref()
            .unwrap_or(DEFAULT_SCREENSHOT_API_URL)
    }

    pub fn screenshot_limit(&self) -> usize {
        self.sources
            .screenshot_limit
            .unwrap_or(DEFAULT_SCREENSHOT_LIMIT)
    }

    pub fn snapshot_global(&self) -> &str {
        self.output
            .snapshot_global
            .as_deref()
            .unwrap_or(DEFAULT_SNAPSHOT_GLOBAL)
    }

    pub fn static_pages(&self) -> Vec<String> {
        match &self.sitemap.static_pages {
            Some(pages) => pages.clone(),
            None => DEFAULT_STATIC_PAGES
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

/// Load and parse a SiteConfig from a TOML file. Returns default if file doesn't exist.
pub fn load_config(config_path: &Path) -> Result<SiteConfig> {
    if !config_path.exists() {
        return Ok(SiteConfig::default());
    }
    let content = fs::read_to_string(config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let parsed: SiteConfig = toml::from_str(&content)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;
    Ok(parsed)
}

pub fn render_default_config() -> String {
    format!(
        "# distrosite build configuration (materialized by `distrosite init`)\n# Every key is optional; the values shown are the built-in defaults.\n\n[site]\n# base_url = \"{DEFAULT_BASE_URL}\"\n# brand_name = \"{DEFAULT_BRAND_NAME}\"\n# user_agent = \"{DEFAULT_USER_AGENT}\"\n\n[network]\n# logo_timeout_ms = {DEFAULT_LOGO_TIMEOUT_MS}\n# screenshot_timeout_ms = {DEFAULT_SCREENSHOT_TIMEOUT_MS}\n# preview_timeout_ms = {DEFAULT_PREVIEW_TIMEOUT_MS}\n# api_retries = {DEFAULT_API_RETRIES}\n\n[sources]\n# logo_service_url = \"{DEFAULT_LOGO_SERVICE_URL}\"\n# screenshot_api_url = \"{DEFAULT_SCREENSHOT_API_URL}\"\n# screenshot_limit = {DEFAULT_SCREENSHOT_LIMIT}\n\n[output]\n# snapshot_global = \"{DEFAULT_SNAPSHOT_GLOBAL}\"\n\n[sitemap]\n# static_pages = [\"/index.html\", \"/distros.html\"]\n",
    )
}

fn env_override(key: &str) -> Option<String> {
    let value = env::var(key).ok()?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
