use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::render_default_config;
use crate::metadata::embedded_metadata_source;

pub const DEFAULT_CATALOGUE: &str = "api/linux_distros_full.json";
pub const STATE_DIR_NAME: &str = ".distrosite";
pub const METADATA_FILENAME: &str = "curated-metadata.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    Flag,
    Env,
    Heuristic,
    Default,
}

impl ValueSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flag => "flag",
            Self::Env => "env",
            Self::Heuristic => "heuristic",
            Self::Default => "default",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PathOverrides {
    pub project_root: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub catalogue: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ResolutionContext {
    pub cwd: PathBuf,
    pub executable_dir: Option<PathBuf>,
}

impl ResolutionContext {
    pub fn from_process() -> Result<Self> {
        let cwd = env::current_dir().context("failed to read current directory")?;
        let executable_dir = env::current_exe()
            .ok()
            .and_then(|path| path.parent().map(Path::to_path_buf));
        Ok(Self {
            cwd,
            executable_dir,
        })
    }
}

/// Every input and output location of a build, anchored at the project root.
#[derive(Debug, Clone)]
pub struct ResolvedPaths {
    pub project_root: PathBuf,
    pub catalogue_path: PathBuf,
    pub pages_dir: PathBuf,
    pub assets_dir: PathBuf,
    pub logo_dir: PathBuf,
    pub og_dir: PathBuf,
    pub snapshot_path: PathBuf,
    pub sitemap_path: PathBuf,
    pub state_dir: PathBuf,
    pub config_path: PathBuf,
    pub metadata_path: PathBuf,
    pub root_source: ValueSource,
    pub config_source: ValueSource,
    pub catalogue_source: ValueSource,
}

impl ResolvedPaths {
    /// Layout rooted at `project_root` with every path at its default.
    pub fn for_root(project_root: &Path) -> Self {
        let project_root = project_root.to_path_buf();
        let state_dir = project_root.join(STATE_DIR_NAME);
        let assets_dir = project_root.join("assets");
        Self {
            catalogue_path: project_root.join(DEFAULT_CATALOGUE),
            pages_dir: project_root.join("distros"),
            logo_dir: assets_dir.join("logos"),
            og_dir: assets_dir.join("og"),
            assets_dir,
            snapshot_path: project_root.join("js").join("distro-data.js"),
            sitemap_path: project_root.join("sitemap.xml"),
            config_path: state_dir.join("config.toml"),
            metadata_path: state_dir.join(METADATA_FILENAME),
            state_dir,
            project_root,
            root_source: ValueSource::Default,
            config_source: ValueSource::Default,
            catalogue_source: ValueSource::Default,
        }
    }

    pub fn diagnostics(&self) -> String {
        format!(
            "project_root={} ({})\ncatalogue_path={} ({})\nconfig_path={} ({})\nmetadata_path={} ({})\npages_dir={}\nlogo_dir={}\nog_dir={}\nsnapshot_path={}\nsitemap_path={}",
            normalize_for_display(&self.project_root),
            self.root_source.as_str(),
            normalize_for_display(&self.catalogue_path),
            self.catalogue_source.as_str(),
            normalize_for_display(&self.config_path),
            self.config_source.as_str(),
            normalize_for_display(&self.metadata_path),
            if self.metadata_path.exists() {
                "override"
            } else {
                "embedded"
            },
            normalize_for_display(&self.pages_dir),
            normalize_for_display(&self.logo_dir),
            normalize_for_display(&self.og_dir),
            normalize_for_display(&self.snapshot_path),
            normalize_for_display(&self.sitemap_path),
        )
    }
}

#[derive(Debug, Clone)]
pub struct InitReport {
    pub created_dirs: Vec<PathBuf>,
    pub wrote_config: bool,
    pub wrote_metadata: bool,
}

pub fn resolve_paths(
    context: &ResolutionContext,
    overrides: &PathOverrides,
) -> Result<ResolvedPaths> {
    resolve_paths_with_lookup(context, overrides, |key| env::var(key).ok())
}

fn resolve_paths_with_lookup<F>(
    context: &ResolutionContext,
    overrides: &PathOverrides,
    lookup_env: F,
) -> Result<ResolvedPaths>
where
    F: Fn(&str) -> Option<String>,
{
    let (project_root, root_source) = resolve_project_root(context, overrides, &lookup_env)
        .context("failed to resolve project root")?;
    let mut paths = ResolvedPaths::for_root(&project_root);
    paths.root_source = root_source;

    if let Some(path) = overrides.config.as_deref() {
        paths.config_path = absolutize(path, &project_root);
        paths.config_source = ValueSource::Flag;
    } else if let Some(value) = lookup_env("DISTROSITE_CONFIG") {
        paths.config_path = absolutize(Path::new(value.trim()), &project_root);
        paths.config_source = ValueSource::Env;
    }

    if let Some(path) = overrides.catalogue.as_deref() {
        paths.catalogue_path = absolutize(path, &context.cwd);
        paths.catalogue_source = ValueSource::Flag;
    } else if let Some(value) = lookup_env("DISTROSITE_CATALOGUE") {
        paths.catalogue_path = absolutize(Path::new(value.trim()), &project_root);
        paths.catalogue_source = ValueSource::Env;
    }

    Ok(paths)
}

/// Create the state directory and write the default config and curated
/// metadata files. Existing files are left alone unless `force` is set.
pub fn init_layout(paths: &ResolvedPaths, force: bool) -> Result<InitReport> {
    let mut created_dirs = Vec::new();
    for dir in [&paths.state_dir, &paths.pages_dir, &paths.logo_dir, &paths.og_dir] {
        if !dir.exists() {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
            created_dirs.push(dir.clone());
        }
    }

    let wrote_config = write_text_file(&paths.config_path, &render_default_config(), force)?;
    let wrote_metadata = write_text_file(&paths.metadata_path, embedded_metadata_source(), force)?;

    Ok(InitReport {
        created_dirs,
        wrote_config,
        wrote_metadata,
    })
}

fn resolve_project_root<F>(
    context: &ResolutionContext,
    overrides: &PathOverrides,
    lookup_env: &F,
) -> Result<(PathBuf, ValueSource)>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = overrides.project_root.as_deref() {
        return Ok((absolutize(path, &context.cwd), ValueSource::Flag));
    }

    if let Some(value) = lookup_env("DISTROSITE_PROJECT_ROOT") {
        return Ok((
            absolutize(Path::new(value.trim()), &context.cwd),
            ValueSource::Env,
        ));
    }

    match detect_project_root_heuristic(&context.cwd, context.executable_dir.as_deref()) {
        Some(root) => Ok((root, ValueSource::Heuristic)),
        None => Ok((context.cwd.clone(), ValueSource::Default)),
    }
}

fn detect_project_root_heuristic(cwd: &Path, executable_dir: Option<&Path>) -> Option<PathBuf> {
    let mut seen = HashSet::new();
    for candidate in candidate_roots(cwd, executable_dir) {
        let key = normalize_for_display(&candidate);
        if !seen.insert(key) {
            continue;
        }
        if candidate.join(DEFAULT_CATALOGUE).exists() {
            return Some(candidate);
        }
    }
    None
}

fn candidate_roots(cwd: &Path, executable_dir: Option<&Path>) -> Vec<PathBuf> {
    let mut out = cwd.ancestors().map(Path::to_path_buf).collect::<Vec<_>>();
    if let Some(exe_dir) = executable_dir {
        out.extend(exe_dir.ancestors().map(Path::to_path_buf));
    }
    out
}

fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn write_text_file(path: &Path, content: &str, force: bool) -> Result<bool> {
    if path.exists() && !force {
        return Ok(false);
    }

    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("path has no parent: {}", path.display()))?;
    fs::create_dir_all(parent)
        .with_context(|| format!("failed to create parent directory {}", parent.display()))?;
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(true)
}

pub fn normalize_for_display(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;

    use tempfile::tempdir;

    use super::{
        DEFAULT_CATALOGUE, PathOverrides, ResolutionContext, ValueSource, init_layout,
        resolve_paths_with_lookup,
    };
    use crate::config::load_config;
    use crate::metadata::MetadataStore;

    #[test]
    fn resolve_paths_prefers_flag_over_env() {
        let temp = tempdir().expect("tempdir");
        let cwd = temp.path().join("cwd");
        let from_flag = temp.path().join("flag-root");
        fs::create_dir_all(&cwd).expect("create cwd");

        let overrides = PathOverrides {
            project_root: Some(from_flag.clone()),
            ..PathOverrides::default()
        };
        let context = ResolutionContext {
            cwd: cwd.clone(),
            executable_dir: None,
        };

        let env = HashMap::from([(
            "DISTROSITE_PROJECT_ROOT".to_string(),
            temp.path().join("env-root").to_string_lossy().to_string(),
        )]);

        let resolved = resolve_paths_with_lookup(&context, &overrides, |key| env.get(key).cloned())
            .expect("resolve paths");
        assert_eq!(resolved.project_root, from_flag);
        assert_eq!(resolved.root_source, ValueSource::Flag);
        assert_eq!(resolved.pages_dir, from_flag.join("distros"));
        assert_eq!(resolved.logo_dir, from_flag.join("assets").join("logos"));
    }

    #[test]
    fn resolve_paths_finds_catalogue_in_ancestor() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path().join("site");
        let nested = root.join("tools").join("scripts");
        fs::create_dir_all(&nested).expect("nested");
        let catalogue = root.join(DEFAULT_CATALOGUE);
        fs::create_dir_all(catalogue.parent().expect("parent")).expect("api dir");
        fs::write(&catalogue, "[]").expect("write catalogue");

        let context = ResolutionContext {
            cwd: nested,
            executable_dir: None,
        };
        let resolved =
            resolve_paths_with_lookup(&context, &PathOverrides::default(), |_| None).expect("resolve");
        assert_eq!(resolved.project_root, root);
        assert_eq!(resolved.root_source, ValueSource::Heuristic);
        assert_eq!(resolved.catalogue_path, catalogue);
    }

    #[test]
    fn resolve_paths_falls_back_to_cwd() {
        let temp = tempdir().expect("tempdir");
        let context = ResolutionContext {
            cwd: temp.path().to_path_buf(),
            executable_dir: None,
        };
        let resolved =
            resolve_paths_with_lookup(&context, &PathOverrides::default(), |_| None).expect("resolve");
        assert_eq!(resolved.project_root, temp.path());
        assert_eq!(resolved.root_source, ValueSource::Default);
    }

    #[test]
    fn resolve_paths_applies_env_config_and_catalogue() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path().join("root");
        let overrides = PathOverrides {
            project_root: Some(root.clone()),
            ..PathOverrides::default()
        };
        let context = ResolutionContext {
            cwd: temp.path().to_path_buf(),
            executable_dir: None,
        };
        let env = HashMap::from([
            ("DISTROSITE_CONFIG".to_string(), "site.toml".to_string()),
            ("DISTROSITE_CATALOGUE".to_string(), "data/feed.json".to_string()),
        ]);
        let resolved = resolve_paths_with_lookup(&context, &overrides, |key| env.get(key).cloned())
            .expect("resolve");
        assert_eq!(resolved.config_path, root.join("site.toml"));
        assert_eq!(resolved.config_source, ValueSource::Env);
        assert_eq!(resolved.catalogue_path, root.join("data").join("feed.json"));
        assert_eq!(resolved.catalogue_source, ValueSource::Env);
    }

    #[test]
    fn init_layout_writes_config_once_unless_forced() {
        let temp = tempdir().expect("tempdir");
        let context = ResolutionContext {
            cwd: temp.path().to_path_buf(),
            executable_dir: None,
        };
        let overrides = PathOverrides {
            project_root: Some(temp.path().to_path_buf()),
            ..PathOverrides::default()
        };
        let paths = resolve_paths_with_lookup(&context, &overrides, |_| None).expect("resolve");

        let report = init_layout(&paths, false).expect("init");
        assert!(report.wrote_config);
        assert!(report.wrote_metadata);
        assert!(!report.created_dirs.is_empty());
        assert!(paths.og_dir.exists());
        load_config(&paths.config_path).expect("config parses");
        assert_eq!(
            MetadataStore::load(&paths.metadata_path)
                .expect("metadata parses")
                .len(),
            30
        );

        let again = init_layout(&paths, false).expect("init again");
        assert!(!again.wrote_config);
        assert!(again.created_dirs.is_empty());

        let forced = init_layout(&paths, true).expect("init forced");
        assert!(forced.wrote_config);
    }
}
