//! Per-distribution detail pages.
//!
//! Pages live under `distros/`, so every local link is written relative to
//! that directory (`../css/styles.css`, `../assets/og/<id>.png`).

use reqwest::Url;
use serde_json::{Value, json};

use crate::config::SiteConfig;
use crate::enrich::EnrichedRecord;
use crate::metadata::Hint;
use crate::related::{DEFAULT_RELATED_LIMIT, related_to};
use crate::urls::{absolute_media_url, detail_logo_src, extract_domain};

const FALLBACK_CATEGORY: &str = "Curated distro";
const NOT_LISTED: &str = "Not listed";
const NOT_PUBLISHED: &str = "Not published";
const BEGINNER_SCORE_THRESHOLD: u32 = 8;
const PLACEHOLDER_SHOTS: &[(&str, &str)] = &[
    ("https://dummyimage.com/800x450/13142a/33ff57", "Desktop"),
    ("https://dummyimage.com/800x450/0b0c18/f0f6ff", "Apps"),
];

/// Public identity of the site the pages are rendered for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteIdentity {
    pub base_url: String,
    pub brand_name: String,
}

impl SiteIdentity {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            base_url: config.base_url(),
            brand_name: config.brand_name(),
        }
    }

    pub fn page_url(&self, id: &str) -> String {
        format!("{}/distros/{id}.html", self.base_url)
    }

    pub fn preview_url(&self, id: &str) -> String {
        format!("{}/assets/og/{id}.png", self.base_url)
    }
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Audience and cadence badges shown in the hero, in display order.
pub fn build_badges(record: &EnrichedRecord) -> Vec<String> {
    let category = record.record.category.to_lowercase();
    let mut badges = Vec::new();
    if category.contains("beginner")
        || record.has_hint(Hint::Beginner)
        || record.record.benchmarks.beginner_score >= BEGINNER_SCORE_THRESHOLD
    {
        badges.push("Beginner".to_string());
    }
    if category.contains("server") || record.has_hint(Hint::Server) {
        badges.push("Server".to_string());
    }
    if category.contains("security") || record.has_hint(Hint::Security) {
        badges.push("Security".to_string());
    }
    if record.release_model.is_badge() {
        badges.push(record.release_model.to_string());
    }
    dedupe(badges)
}

pub fn split_categories(raw: &str) -> Vec<String> {
    let parts = raw
        .split(['/', ','])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(ToString::to_string)
        .collect::<Vec<_>>();
    if parts.is_empty() {
        vec![FALLBACK_CATEGORY.to_string()]
    } else {
        parts
    }
}

/// Stand-in screenshot URLs for records without any.
pub fn placeholder_screenshots(name: &str) -> Vec<String> {
    let label = if name.trim().is_empty() { "Linux" } else { name };
    PLACEHOLDER_SHOTS
        .iter()
        .filter_map(|(base, suffix)| {
            Url::parse_with_params(base, &[("text", format!("{label} {suffix}"))]).ok()
        })
        .map(String::from)
        .collect()
}

fn dedupe(items: Vec<String>) -> Vec<String> {
    let mut deduped: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        if !deduped.contains(&item) {
            deduped.push(item);
        }
    }
    deduped
}

fn or_default<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    value.filter(|text| !text.trim().is_empty()).unwrap_or(fallback)
}

fn data_articles(items: &[(&str, String)]) -> String {
    let mut output = String::new();
    for (label, value) in items {
        if value.is_empty() {
            continue;
        }
        output.push_str(&format!(
            r#"
        <article>
          <p class="muted-label">{}</p>
          <p class="data-value">{}</p>
        </article>"#,
            escape_html(label),
            escape_html(value)
        ));
    }
    output
}

fn list_items(items: &[String], fallback: Option<&str>) -> String {
    if items.is_empty() {
        return fallback
            .map(|text| format!("<li>{}</li>", escape_html(text)))
            .unwrap_or_default();
    }
    items
        .iter()
        .map(|item| format!("<li>{}</li>", escape_html(item)))
        .collect()
}

fn score_rows(rows: &[(&str, u32)]) -> String {
    let mut output = String::new();
    for (label, score) in rows {
        if *score == 0 {
            output.push_str(&format!(
                r#"
        <div class="score-row pending">
          <span>{}</span>
          <p class="muted">Not rated yet</p>
        </div>"#,
                escape_html(label)
            ));
        } else {
            output.push_str(&format!(
                r#"
        <div class="score-row">
          <span>{}</span>
          <div class="score-bar"><span style="width: {}%"></span></div>
          <strong>{score}/10</strong>
        </div>"#,
                escape_html(label),
                (*score).min(10) * 10
            ));
        }
    }
    output
}

fn related_section(record: &EnrichedRecord, all: &[EnrichedRecord]) -> String {
    let related = related_to(record, all, DEFAULT_RELATED_LIMIT);
    if related.is_empty() {
        return String::new();
    }
    let mut cards = String::new();
    for other in related {
        let name = escape_html(&other.record.name);
        let subtitle = if other.record.family.is_empty() {
            &other.record.category
        } else {
            &other.record.family
        };
        cards.push_str(&format!(
            r#"
                <article class="distro-card">
                  <div class="distro-logo">
                    <img src="{}" alt="{name} logo" loading="lazy" decoding="async" referrerpolicy="no-referrer" />
                  </div>
                  <h3>{name}</h3>
                  <p class="muted-label">{}</p>
                  <a class="link-arrow" href="../distros/{}.html">View details &rsaquo;</a>
                </article>"#,
            escape_html(&detail_logo_src(&other.record.logo)),
            escape_html(subtitle),
            escape_html(other.id())
        ));
    }
    format!(
        r#"
            <section class="detail-card related-panel">
              <div class="section-heading">
                <h2>You may also like</h2>
                <p>Explore similar distributions with shared traits.</p>
              </div>
              <div class="related-grid">{cards}
              </div>
            </section>"#
    )
}

fn structured_data(
    record: &EnrichedRecord,
    description: &str,
    screenshots: &[String],
    site: &SiteIdentity,
) -> Value {
    let distro = &record.record;
    let page_url = site.page_url(&distro.id);
    let status = or_default(distro.status.as_deref(), "Active");
    let version = distro.first_release.as_deref().unwrap_or_default();
    let logo = if distro.logo.is_empty() {
        &record.logo_source
    } else {
        &distro.logo
    };
    let download = if distro.download_url.is_empty() {
        &distro.website
    } else {
        &distro.download_url
    };

    let mut application = json!({
        "@context": "https://schema.org",
        "@type": "SoftwareApplication",
        "applicationCategory": "UtilitiesApplication",
        "operatingSystem": "GNU/Linux",
        "name": distro.name,
        "description": description,
        "image": absolute_media_url(logo, &site.base_url),
        "url": page_url,
        "softwareVersion": version,
        "publisher": { "@type": "Organization", "name": site.brand_name },
        "offers": { "@type": "Offer", "price": "0", "priceCurrency": "USD" },
        "releaseNotes": format!("{} cadence - {status}", record.release_model),
        "downloadUrl": download,
        "screenshot": screenshots,
        "keywords": distro.badges,
    });
    let mut operating_system = json!({
        "@context": "https://schema.org",
        "@type": "OperatingSystem",
        "name": distro.name,
        "url": page_url,
        "description": description,
        "operatingSystemType": or_default(Some(distro.family.as_str()), "Linux"),
        "screenshot": screenshots,
        "softwareVersion": version,
        "image": site.preview_url(&distro.id),
    });
    if let Some(developer) = distro.developer.as_deref().filter(|name| !name.is_empty()) {
        let organization = json!({ "@type": "Organization", "name": developer });
        application["provider"] = organization.clone();
        operating_system["manufacturer"] = organization;
    }
    json!([application, operating_system])
}

/// Full HTML document for one distribution.
pub fn render_detail_page(
    record: &EnrichedRecord,
    last_updated: &str,
    all: &[EnrichedRecord],
    site: &SiteIdentity,
) -> String {
    let distro = &record.record;
    let id = escape_html(&distro.id);
    let name = escape_html(&distro.name);
    let brand = escape_html(&site.brand_name);
    let release_model = record.release_model.as_str();
    let status = escape_html(or_default(distro.status.as_deref(), "Active"));
    let page_url = escape_html(&site.page_url(&distro.id));

    let description_text = match distro.seo_description.as_deref() {
        Some(text) if !text.trim().is_empty() => text.to_string(),
        _ => format!(
            "{} Linux review covering a {release_model} cadence, hardware requirements, package tooling, and recommended use cases.",
            distro.name
        ),
    };
    let meta_description = escape_html(&description_text);
    let lede = if distro.description.is_empty() {
        meta_description.clone()
    } else {
        escape_html(&distro.description)
    };

    let badge_markup = build_badges(record)
        .iter()
        .map(|badge| {
            let badge = escape_html(badge);
            format!(r#"<span class="pill" data-pill="{badge}">{badge}</span>"#)
        })
        .collect::<String>();
    let category_markup = split_categories(&distro.category)
        .iter()
        .map(|label| format!(r#"<span class="eyebrow-chip">{}</span>"#, escape_html(label)))
        .collect::<String>();
    let tag_markup = if distro.badges.is_empty() {
        String::new()
    } else {
        let chips = distro
            .badges
            .iter()
            .map(|label| format!(r#"<span class="tag-pill">{}</span>"#, escape_html(label)))
            .collect::<String>();
        format!(r#"<div class="distro-tag-badges">{chips}</div>"#)
    };

    let origin = or_default(distro.origin.as_deref(), "Global").to_string();
    let architectures = distro.architecture.join(", ");
    let desktop = or_default(distro.desktop.as_deref(), "Multiple").to_string();
    let package_manager = or_default(distro.package_manager.as_deref(), "Unknown").to_string();
    let hero_meta = data_articles(&[
        ("Origin", origin.clone()),
        (
            "First release",
            or_default(distro.first_release.as_deref(), "Unknown").to_string(),
        ),
        ("Architectures", architectures.clone()),
        ("Desktop", desktop.clone()),
        ("Package manager", package_manager.clone()),
    ]);
    let info_markup = data_articles(&[
        ("Origin", origin),
        ("Architectures", architectures),
        ("Desktop environment", desktop),
        ("Package manager", package_manager),
        ("Release model", release_model.to_string()),
        ("Status", or_default(distro.status.as_deref(), "Active").to_string()),
    ]);

    let mut hero_actions = Vec::new();
    if !distro.download_url.is_empty() {
        hero_actions.push(format!(
            r#"<a class="primary-btn" href="{}" target="_blank" rel="noopener">Download {name}</a>"#,
            escape_html(&distro.download_url)
        ));
    }
    if !distro.website.is_empty() {
        hero_actions.push(format!(
            r#"<a class="ghost-btn" href="{}" target="_blank" rel="noopener">Official Website</a>"#,
            escape_html(&distro.website)
        ));
    }
    hero_actions.push(format!(
        r#"<a class="ghost-btn" href="../compare.html?ids={id}">Add to compare</a>"#
    ));
    let hero_actions = hero_actions.join("\n                    ");

    let hardware = &distro.hardware_requirements;
    let hardware_rows = [
        ("CPU", &hardware.minimum.cpu, &hardware.recommended.cpu),
        ("RAM", &hardware.minimum.ram, &hardware.recommended.ram),
        ("Storage", &hardware.minimum.storage, &hardware.recommended.storage),
    ]
    .iter()
    .map(|(label, minimum, recommended)| {
        format!(
            "<tr><td>{label}</td><td>{}</td><td>{}</td></tr>",
            escape_html(or_default(minimum.as_deref(), NOT_LISTED)),
            escape_html(or_default(recommended.as_deref(), NOT_LISTED))
        )
    })
    .collect::<String>();

    let package_name = escape_html(or_default(distro.package_manager.as_deref(), "Not provided"));
    let package_blurb = match distro.package_manager_explained.as_deref() {
        Some(text) if !text.trim().is_empty() => escape_html(text),
        _ => escape_html(&format!(
            "{} uses {} to handle repositories, updates, and upgrades for this {release_model} cadence.",
            distro.name,
            or_default(distro.package_manager.as_deref(), "its default package manager")
        )),
    };

    let screenshots = if distro.screenshots.is_empty() {
        placeholder_screenshots(&distro.name)
    } else {
        distro.screenshots.clone()
    };
    let screenshot_markup = screenshots
        .iter()
        .map(|url| {
            let url = escape_html(url);
            format!(
                r#"
        <div class="screenshot-card" data-full="{url}">
          <img src="{url}" alt="{name} screenshot" loading="lazy" decoding="async" />
        </div>"#
            )
        })
        .collect::<String>();

    let benchmarks = &distro.benchmarks;
    let boot_time = escape_html(or_default(benchmarks.boot_time.as_deref(), NOT_PUBLISHED));
    let resource_usage = escape_html(or_default(
        benchmarks.resource_usage.as_deref(),
        NOT_PUBLISHED,
    ));
    let score_markup = score_rows(&[
        ("Stability", benchmarks.stability_score),
        ("Beginner friendly", benchmarks.beginner_score),
        ("Power user score", benchmarks.power_user_score),
    ]);

    let compatibility = &distro.compatibility;
    let target_markup = if distro.target_users.is_empty() {
        r#"<span class="user-pill muted">General purpose installs</span>"#.to_string()
    } else {
        distro
            .target_users
            .iter()
            .map(|user| format!(r#"<span class="user-pill">{}</span>"#, escape_html(user)))
            .collect()
    };
    let best_markup = list_items(&compatibility.best_for, Some("General purpose desktops"));
    let not_ideal_markup = list_items(
        &compatibility.not_ideal_for,
        Some("Very old or low-power hardware"),
    );
    let use_case_markup = list_items(&compatibility.use_cases, Some("Daily driver workloads"));
    let pros_markup = list_items(&distro.pros, None);
    let cons_markup = list_items(&distro.cons, None);

    let keywords = [
        distro.name.as_str(),
        "Linux",
        "Distro",
        release_model,
        distro.category.as_str(),
        distro.package_manager.as_deref().unwrap_or_default(),
    ]
    .into_iter()
    .filter(|term| !term.is_empty())
    .collect::<Vec<_>>()
    .join(", ");

    let schema = structured_data(record, &description_text, &screenshots, site)
        .to_string()
        .replace('<', "\\u003c");
    let hero_logo = escape_html(&detail_logo_src(&distro.logo));
    let domain = escape_html(&extract_domain(&distro.website));
    let related_markup = related_section(record, all);
    let last_updated = escape_html(last_updated);
    let brand_mark = escape_html(&site.brand_name.to_lowercase());

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{name} Linux Review | {brand}</title>
  <meta name="description" content="{meta_description}" />
  <meta name="keywords" content="{keywords}" />
  <meta property="og:title" content="{name} Linux Review | {brand}" />
  <meta property="og:description" content="{meta_description}" />
  <meta property="og:type" content="website" />
  <meta property="og:url" content="{page_url}" />
  <meta property="og:image" content="../assets/og/{id}.png" />
  <meta property="twitter:card" content="summary_large_image" />
  <link rel="canonical" href="{page_url}" />
  <link rel="preconnect" href="https://fonts.googleapis.com" />
  <link rel="preconnect" href="https://fonts.gstatic.com" crossorigin />
  <link rel="preload" as="style" href="https://fonts.googleapis.com/css2?family=JetBrains+Mono:wght@400;500;600;700&amp;display=swap" />
  <link rel="stylesheet" href="../css/styles.css" />
  <script type="application/ld+json">
  {schema}
  </script>
</head>
<body class="page detail" data-distro="{id}">
  <header class="site-header floating">
    <div class="logo-mark"><a href="../index.html">{brand_mark}</a></div>
    <button class="nav-toggle" id="navToggle" aria-expanded="false" aria-label="Toggle navigation" aria-controls="site-nav">
      <span></span><span></span><span></span>
    </button>
    <nav class="primary-nav" id="site-nav">
      <a href="../index.html">Home</a>
      <a href="../distros.html">Distros</a>
      <a href="../compare.html">Compare</a>
      <a href="../blog/index.html">Blog</a>
      <a href="../index.html#guides">Guides</a>
      <a href="../index.html#tools">Tools</a>
      <a href="../distros.html#search" data-nav-search>Search</a>
    </nav>
  </header>
  <main class="detail-main">
    <a class="back-link" href="../distros.html">&larr; Back to catalog</a>
    <section class="detail-card detail-hero">
      <div class="hero-stack">
        <div class="hero-logo" data-name="{name}">
          <img src="{hero_logo}" alt="{name} logo" loading="lazy" decoding="async" referrerpolicy="no-referrer" data-domain="{domain}" />
        </div>
        <div class="hero-content">
          <div class="eyebrow">{category_markup}</div>
          <h1>{name}</h1>
          <p class="lede">{lede}</p>
          {tag_markup}
          <div class="badge-row">
            <span class="status-badge" data-status="{status}">{status}</span>
            {badge_markup}
          </div>
          <div class="hero-meta-grid">{hero_meta}
          </div>
          <div class="hero-actions">
                    {hero_actions}
          </div>
        </div>
      </div>
    </section>
    <nav class="breadcrumb">
      <a href="../index.html">Home</a>
      <span>&rsaquo;</span>
      <a href="../distros.html">Distros</a>
      <span>&rsaquo;</span>
      <span>{name}</span>
    </nav>
    <section class="detail-card overview-panel">
      <div class="section-heading">
        <h2>Overview</h2>
        <p>This snapshot highlights the {release_model} cadence, default desktop, and tooling so you know what to expect before installing.</p>
      </div>
      <div class="info-grid">{info_markup}
      </div>
    </section>
    <section class="detail-card audience-panel">
      <h2>Audience fit</h2>
      <div class="user-badges">
        {target_markup}
      </div>
      <div class="compat-grid">
        <article>
          <h3>Best suited for</h3>
          <ul>{best_markup}</ul>
        </article>
        <article>
          <h3>Consider alternatives if</h3>
          <ul>{not_ideal_markup}</ul>
        </article>
        <article>
          <h3>Common deployments</h3>
          <ul>{use_case_markup}</ul>
        </article>
      </div>
    </section>
    <section class="detail-card pros-cons">
      <div>
        <h3>Pros</h3>
        <ul>{pros_markup}</ul>
      </div>
      <div>
        <h3>Cons</h3>
        <ul>{cons_markup}</ul>
      </div>
    </section>
    <section class="detail-card hardware-panel">
      <h2>Hardware requirements</h2>
      <table class="hw-table">
        <thead>
          <tr>
            <th>Spec</th>
            <th>Minimum</th>
            <th>Recommended</th>
          </tr>
        </thead>
        <tbody>
          {hardware_rows}
        </tbody>
      </table>
    </section>
    <section class="detail-card package-panel">
      <h2>Package manager &amp; ecosystem</h2>
      <p class="package-name">{package_name}</p>
      <p>{package_blurb}</p>
    </section>
    <section class="detail-card screenshots-panel">
      <div class="section-heading">
        <h2>Screenshots</h2>
        <p>Tap or click to open full-size UI captures.</p>
      </div>
      <div class="screenshots-grid">{screenshot_markup}
      </div>
    </section>
    <section class="detail-card benchmark-panel">
      <h2>Benchmarks &amp; signals</h2>
      <div class="benchmark-grid">
        <article>
          <p class="muted-label">Boot time</p>
          <span class="pill soft">{boot_time}</span>
        </article>
        <article>
          <p class="muted-label">Resource usage</p>
          <span class="pill soft">{resource_usage}</span>
        </article>
      </div>
      <div class="score-list">{score_markup}
      </div>
    </section>{related_markup}
    <a class="back-link bottom" href="../distros.html">&larr; Back to catalog</a>
  </main>
  <footer class="site-footer">
    <div>
      <p class="last-updated" data-last-updated="{last_updated}">Last updated {last_updated}</p>
    </div>
    <div class="footer-links">
      <a href="../index.html#about">About</a>
      <a href="../index.html#privacy">Privacy</a>
      <a href="../sitemap.xml">Sitemap</a>
    </div>
    <p class="footer-note">&copy; {brand}. Made for Linux users, by Linux users.</p>
  </footer>
  <script src="../js/distro-data.js" defer></script>
  <script src="../js/app.js" defer></script>
  <script src="../js/detail.js" defer></script>
</body>
</html>
"#,
        keywords = escape_html(&keywords),
    )
}
