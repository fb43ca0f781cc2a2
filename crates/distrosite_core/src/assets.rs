use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};

use crate::fetch::HttpFetch;
use crate::imaging::{BLANK_PNG, ImageComposer, initials};
use crate::urls::{extract_domain, infer_logo_suffix};

pub const LOGO_RELATIVE_DIR: &str = "assets/logos";

#[derive(Debug, Clone, Copy)]
pub struct LogoRequest<'a> {
    pub id: &'a str,
    pub name: &'a str,
    /// Remote logo URL from the catalogue; may be empty.
    pub logo_url: &'a str,
    /// Normalized website URL; may be empty.
    pub website: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLogo {
    /// Site-relative path, e.g. `assets/logos/arch.svg`.
    pub relative_path: String,
    pub provider: &'static str,
    pub from_cache: bool,
}

/// One tier of the logo fallback chain.
pub trait LogoProvider {
    fn name(&self) -> &'static str;
    fn resolve(&self, request: &LogoRequest<'_>) -> Result<ResolvedLogo>;
}

/// On-disk logo directory plus the site-relative prefix it is served under.
#[derive(Debug, Clone)]
pub struct LogoCache {
    dir: PathBuf,
    relative_prefix: String,
}

impl LogoCache {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            relative_prefix: LOGO_RELATIVE_DIR.to_string(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn relative(&self, filename: &str) -> String {
        format!("{}/{filename}", self.relative_prefix)
    }

    /// Relative path of `filename` when it is already cached with content.
    fn lookup(&self, filename: &str) -> Option<String> {
        let metadata = fs::metadata(self.dir.join(filename)).ok()?;
        if metadata.is_file() && metadata.len() > 0 {
            Some(self.relative(filename))
        } else {
            None
        }
    }

    fn store(&self, filename: &str, bytes: &[u8]) -> Result<String> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        let target = self.dir.join(filename);
        fs::write(&target, bytes).with_context(|| format!("failed to write {}", target.display()))?;
        Ok(self.relative(filename))
    }
}

/// Shared body of the two network tiers: cache hit, else one bounded fetch.
fn fetch_into_cache(
    provider: &'static str,
    fetcher: &dyn HttpFetch,
    cache: &LogoCache,
    url: &str,
    filename: &str,
    timeout: Duration,
) -> Result<ResolvedLogo> {
    if let Some(relative_path) = cache.lookup(filename) {
        log::debug!("logo cache hit: {relative_path}");
        return Ok(ResolvedLogo {
            relative_path,
            provider,
            from_cache: true,
        });
    }
    let bytes = fetcher.get_bytes(url, timeout)?;
    let relative_path = cache.store(filename, &bytes)?;
    Ok(ResolvedLogo {
        relative_path,
        provider,
        from_cache: false,
    })
}

/// The logo URL supplied by the catalogue entry.
pub struct RemoteLogoProvider<'a> {
    fetcher: &'a dyn HttpFetch,
    cache: LogoCache,
    timeout: Duration,
}

impl<'a> RemoteLogoProvider<'a> {
    pub fn new(fetcher: &'a dyn HttpFetch, cache: LogoCache, timeout: Duration) -> Self {
        Self {
            fetcher,
            cache,
            timeout,
        }
    }
}

impl LogoProvider for RemoteLogoProvider<'_> {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn resolve(&self, request: &LogoRequest<'_>) -> Result<ResolvedLogo> {
        let url = request.logo_url.trim();
        if url.is_empty() {
            bail!("catalogue has no logo URL");
        }
        let filename = format!("{}{}", request.id, infer_logo_suffix(url));
        fetch_into_cache(
            self.name(),
            self.fetcher,
            &self.cache,
            url,
            &filename,
            self.timeout,
        )
    }
}

/// Logo lookup service keyed by the website's domain.
pub struct DomainLogoProvider<'a> {
    fetcher: &'a dyn HttpFetch,
    cache: LogoCache,
    service_base: String,
    timeout: Duration,
}

impl<'a> DomainLogoProvider<'a> {
    pub fn new(
        fetcher: &'a dyn HttpFetch,
        cache: LogoCache,
        service_base: &str,
        timeout: Duration,
    ) -> Self {
        Self {
            fetcher,
            cache,
            service_base: service_base.to_string(),
            timeout,
        }
    }
}

impl LogoProvider for DomainLogoProvider<'_> {
    fn name(&self) -> &'static str {
        "domain"
    }

    fn resolve(&self, request: &LogoRequest<'_>) -> Result<ResolvedLogo> {
        let domain = extract_domain(request.website);
        if domain.is_empty() {
            bail!("no website domain to look up");
        }
        let url = format!("{}{domain}", self.service_base);
        let filename = format!("{}.png", request.id);
        fetch_into_cache(
            self.name(),
            self.fetcher,
            &self.cache,
            &url,
            &filename,
            self.timeout,
        )
    }
}

/// Generated stand-in; only fails when the file cannot be written.
pub struct PlaceholderLogoProvider<'a> {
    composer: &'a dyn ImageComposer,
    cache: LogoCache,
}

impl<'a> PlaceholderLogoProvider<'a> {
    pub fn new(composer: &'a dyn ImageComposer, cache: LogoCache) -> Self {
        Self { composer, cache }
    }
}

impl LogoProvider for PlaceholderLogoProvider<'_> {
    fn name(&self) -> &'static str {
        "placeholder"
    }

    fn resolve(&self, request: &LogoRequest<'_>) -> Result<ResolvedLogo> {
        let filename = format!("{}-placeholder.png", request.id);
        if let Some(relative_path) = self.cache.lookup(&filename) {
            return Ok(ResolvedLogo {
                relative_path,
                provider: self.name(),
                from_cache: true,
            });
        }
        let label = initials(request.name, request.id);
        let bytes = match self.composer.placeholder_logo(&label) {
            Ok(bytes) => bytes,
            Err(error) => {
                log::warn!(
                    "[{}] {} placeholder failed, writing blank PNG: {error:#}",
                    request.id,
                    self.composer.name()
                );
                BLANK_PNG.to_vec()
            }
        };
        let relative_path = self.cache.store(&filename, &bytes)?;
        Ok(ResolvedLogo {
            relative_path,
            provider: self.name(),
            from_cache: false,
        })
    }
}

/// Ordered logo tiers; the first success wins and each tier runs at most once.
pub struct AssetResolver<'a> {
    providers: Vec<Box<dyn LogoProvider + 'a>>,
}

impl<'a> AssetResolver<'a> {
    pub fn new(providers: Vec<Box<dyn LogoProvider + 'a>>) -> Self {
        Self { providers }
    }

    /// Remote logo, then domain logo service, then generated placeholder.
    pub fn standard(
        fetcher: &'a dyn HttpFetch,
        composer: &'a dyn ImageComposer,
        cache: &LogoCache,
        logo_service_url: &str,
        timeout: Duration,
    ) -> Self {
        Self::new(vec![
            Box::new(RemoteLogoProvider::new(fetcher, cache.clone(), timeout)),
            Box::new(DomainLogoProvider::new(
                fetcher,
                cache.clone(),
                logo_service_url,
                timeout,
            )),
            Box::new(PlaceholderLogoProvider::new(composer, cache.clone())),
        ])
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|provider| provider.name()).collect()
    }

    pub fn resolve(&self, request: &LogoRequest<'_>) -> Result<ResolvedLogo> {
        let mut failures = Vec::new();
        for provider in &self.providers {
            match provider.resolve(request) {
                Ok(resolved) => return Ok(resolved),
                Err(error) => {
                    log::warn!(
                        "[{}] logo tier `{}` failed: {error:#}",
                        request.id,
                        provider.name()
                    );
                    failures.push(format!("{}: {error}", provider.name()));
                }
            }
        }
        bail!(
            "no logo could be resolved for `{}` ({})",
            request.id,
            failures.join("; ")
        )
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::Duration;

    use anyhow::{Result, bail};
    use tempfile::tempdir;

    use super::{AssetResolver, LogoCache, LogoRequest};
    use crate::imaging::{BLANK_PNG, ImageComposer, MinimalComposer};
    use crate::test_support::FakeFetcher;

    const TIMEOUT: Duration = Duration::from_secs(1);
    const SERVICE: &str = "https://logos.example/";

    struct BrokenComposer;

    impl ImageComposer for BrokenComposer {
        fn placeholder_logo(&self, _label: &str) -> Result<Vec<u8>> {
            bail!("no canvas")
        }

        fn preview_card(&self, _title: &str, _background: Option<&[u8]>) -> Result<Vec<u8>> {
            bail!("no canvas")
        }

        fn name(&self) -> &'static str {
            "broken"
        }
    }

    fn request<'a>(logo_url: &'a str, website: &'a str) -> LogoRequest<'a> {
        LogoRequest {
            id: "arch",
            name: "Arch Linux",
            logo_url,
            website,
        }
    }

    #[test]
    fn remote_logo_is_fetched_and_cached() {
        let temp = tempdir().expect("tempdir");
        let cache = LogoCache::new(&temp.path().join("logos"));
        let fetcher = FakeFetcher::default().with_bytes("https://arch.example/logo.png", b"PNG");
        let composer = MinimalComposer;
        let resolver = AssetResolver::standard(&fetcher, &composer, &cache, SERVICE, TIMEOUT);

        let resolved = resolver
            .resolve(&request("https://arch.example/logo.png", ""))
            .expect("resolve");
        assert_eq!(resolved.relative_path, "assets/logos/arch.png");
        assert_eq!(resolved.provider, "remote");
        assert!(!resolved.from_cache);
        assert_eq!(
            fs::read(temp.path().join("logos").join("arch.png")).expect("read"),
            b"PNG"
        );

        let again = resolver
            .resolve(&request("https://arch.example/logo.png", ""))
            .expect("resolve again");
        assert!(again.from_cache);
        assert_eq!(fetcher.request_count(), 1);
    }

    #[test]
    fn domain_service_is_used_when_remote_fails() {
        let temp = tempdir().expect("tempdir");
        let cache = LogoCache::new(temp.path());
        let fetcher = FakeFetcher::default().with_bytes("https://logos.example/archlinux.org", b"DOMAIN");
        let composer = MinimalComposer;
        let resolver = AssetResolver::standard(&fetcher, &composer, &cache, SERVICE, TIMEOUT);

        let resolved = resolver
            .resolve(&request(
                "https://broken.example/logo.svg",
                "https://www.archlinux.org",
            ))
            .expect("resolve");
        assert_eq!(resolved.provider, "domain");
        assert_eq!(resolved.relative_path, "assets/logos/arch.png");
        assert_eq!(
            *fetcher.requests.borrow(),
            vec![
                "https://broken.example/logo.svg".to_string(),
                "https://logos.example/archlinux.org".to_string()
            ]
        );
    }

    #[test]
    fn placeholder_is_written_when_network_tiers_fail() {
        let temp = tempdir().expect("tempdir");
        let cache = LogoCache::new(temp.path());
        let fetcher = FakeFetcher::default();
        let composer = MinimalComposer;
        let resolver = AssetResolver::standard(&fetcher, &composer, &cache, SERVICE, TIMEOUT);

        let resolved = resolver.resolve(&request("", "")).expect("resolve");
        assert_eq!(resolved.provider, "placeholder");
        assert_eq!(resolved.relative_path, "assets/logos/arch-placeholder.png");
        assert_eq!(fetcher.request_count(), 0);

        let again = resolver.resolve(&request("", "")).expect("resolve again");
        assert!(again.from_cache);
    }

    #[test]
    fn broken_composer_degrades_to_blank_png() {
        let temp = tempdir().expect("tempdir");
        let cache = LogoCache::new(temp.path());
        let fetcher = FakeFetcher::default();
        let composer = BrokenComposer;
        let resolver = AssetResolver::standard(&fetcher, &composer, &cache, SERVICE, TIMEOUT);

        resolver.resolve(&request("", "")).expect("resolve");
        assert_eq!(
            fs::read(temp.path().join("arch-placeholder.png")).expect("read"),
            BLANK_PNG
        );
    }

    #[test]
    fn empty_cached_file_is_refetched() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("arch.svg"), b"").expect("empty file");
        let cache = LogoCache::new(temp.path());
        let fetcher = FakeFetcher::default().with_bytes("https://arch.example/logo.svg", b"<svg/>");
        let composer = MinimalComposer;
        let resolver = AssetResolver::standard(&fetcher, &composer, &cache, SERVICE, TIMEOUT);

        let resolved = resolver
            .resolve(&request("https://arch.example/logo.svg", ""))
            .expect("resolve");
        assert!(!resolved.from_cache);
        assert_eq!(fetcher.request_count(), 1);
    }

    #[test]
    fn resolver_errors_only_when_every_tier_fails() {
        let temp = tempdir().expect("tempdir");
        let blocked = temp.path().join("not-a-dir");
        fs::write(&blocked, b"file").expect("write blocker");
        let cache = LogoCache::new(&blocked);
        let fetcher = FakeFetcher::default();
        let composer = MinimalComposer;
        let resolver = AssetResolver::standard(&fetcher, &composer, &cache, SERVICE, TIMEOUT);

        let error = resolver.resolve(&request("", "")).expect_err("must fail");
        assert!(error.to_string().contains("no logo could be resolved for `arch`"));
        assert_eq!(
            resolver.provider_names(),
            vec!["remote", "domain", "placeholder"]
        );
    }
}
