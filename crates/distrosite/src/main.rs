use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use chrono::Utc;
use clap::{Args, CommandFactory, Parser, Subcommand};
use distrosite_core::config::load_config;
use distrosite_core::fetch::{HttpClient, HttpFetch, OfflineFetcher};
use distrosite_core::imaging::{ImageComposer, MinimalComposer, default_composer};
use distrosite_core::pipeline::{BuildServices, check_inputs, curated_records, run_build};
use distrosite_core::related::{DEFAULT_RELATED_LIMIT, score_related};
use distrosite_core::runtime::{
    PathOverrides, ResolutionContext, ResolvedPaths, init_layout, resolve_paths,
};

#[derive(Debug, Parser)]
#[command(
    name = "distrosite",
    version,
    about = "Static build step for the Linux distribution catalogue site"
)]
struct Cli {
    #[arg(long, global = true, value_name = "PATH")]
    project_root: Option<PathBuf>,
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[arg(long, global = true, value_name = "PATH", help = "Catalogue JSON to build from")]
    catalogue: Option<PathBuf>,
    #[arg(long, global = true, help = "Print resolved runtime diagnostics")]
    diagnostics: bool,
    #[arg(short, long, global = true, conflicts_with = "quiet", help = "Log debug detail")]
    verbose: bool,
    #[arg(short, long, global = true, help = "Only log warnings and errors")]
    quiet: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Clone)]
struct RuntimeOptions {
    project_root: Option<PathBuf>,
    config: Option<PathBuf>,
    catalogue: Option<PathBuf>,
    diagnostics: bool,
}

impl RuntimeOptions {
    fn from_cli(cli: &Cli) -> Self {
        Self {
            project_root: cli.project_root.clone(),
            config: cli.config.clone(),
            catalogue: cli.catalogue.clone(),
            diagnostics: cli.diagnostics,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Enrich the catalogue and write pages, assets, snapshot and sitemap")]
    Build(BuildArgs),
    #[command(about = "Validate the catalogue against curated metadata without writing")]
    Check,
    #[command(about = "Show the related distributions computed for one id")]
    Related(RelatedArgs),
    #[command(about = "Write the default config and curated metadata files")]
    Init(InitArgs),
}

#[derive(Debug, Args)]
struct BuildArgs {
    #[arg(long, help = "Skip all network fetches; logos fall back to placeholders")]
    offline: bool,
    #[arg(long, help = "Keep catalogue screenshots instead of querying the reference source")]
    no_screenshots: bool,
    #[arg(long, help = "Write 1x1 placeholder images instead of rendered ones")]
    minimal_images: bool,
}

#[derive(Debug, Args)]
struct RelatedArgs {
    id: String,
    #[arg(long, default_value_t = DEFAULT_RELATED_LIMIT)]
    limit: usize,
}

#[derive(Debug, Args)]
struct InitArgs {
    #[arg(long, help = "Overwrite existing config/metadata files")]
    force: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        log::Level::Debug
    } else if cli.quiet {
        log::Level::Warn
    } else {
        log::Level::Info
    };
    simple_logger::init_with_level(level)?;
    let runtime = RuntimeOptions::from_cli(&cli);

    match cli.command {
        Some(Commands::Build(args)) => run_build_command(&runtime, args),
        Some(Commands::Check) => run_check(&runtime),
        Some(Commands::Related(args)) => run_related(&runtime, args),
        Some(Commands::Init(args)) => run_init(&runtime, args),
        None => {
            let mut command = Cli::command();
            command.print_help()?;
            println!();
            Ok(())
        }
    }
}

fn run_build_command(runtime: &RuntimeOptions, args: BuildArgs) -> Result<()> {
    let paths = resolve_runtime_paths(runtime)?;
    let config = load_config(&paths.config_path)?;

    let fetcher: Box<dyn HttpFetch> = if args.offline {
        Box::new(OfflineFetcher)
    } else {
        Box::new(HttpClient::new(&config.user_agent(), config.api_retries())?)
    };
    let composer: Box<dyn ImageComposer> = if args.minimal_images {
        Box::new(MinimalComposer)
    } else {
        default_composer()
    };
    let services = BuildServices {
        fetcher: fetcher.as_ref(),
        composer: composer.as_ref(),
        fetch_screenshots: !args.offline && !args.no_screenshots,
    };

    let report = run_build(&paths, &config, &services, Utc::now())?;

    println!("build complete");
    println!("project_root: {}", normalize_path(&paths.project_root));
    println!("catalogue: {}", normalize_path(&paths.catalogue_path));
    println!("offline: {}", format_flag(args.offline));
    println!("composer: {}", report.composer);
    println!("records: {}", report.records);
    println!("pages_written: {}", report.pages_written);
    println!("pages_dir: {}", normalize_path(&report.pages_dir));
    println!("logos.fetched: {}", report.logos_fetched);
    println!("logos.cached: {}", report.logos_cached);
    println!("logos.placeholder: {}", report.placeholder_logos);
    println!("screenshots.refreshed: {}", report.screenshot_refreshes);
    println!("preview_images: {}", report.preview_images);
    println!("snapshot: {}", normalize_path(&report.snapshot_path));
    println!("sitemap: {}", normalize_path(&report.sitemap_path));
    println!("sitemap.urls: {}", report.sitemap_urls);
    if runtime.diagnostics {
        println!("\n[diagnostics]\n{}", paths.diagnostics());
    }

    Ok(())
}

fn run_check(runtime: &RuntimeOptions) -> Result<()> {
    let paths = resolve_runtime_paths(runtime)?;
    let report = check_inputs(&paths)?;

    println!("catalogue check");
    println!("catalogue: {}", normalize_path(&paths.catalogue_path));
    println!("records: {}", report.records);
    println!("metadata.source: {}", report.metadata_source);
    println!("metadata.entries: {}", report.metadata_entries);
    println!("metadata.coverage: complete");
    println!("screenshot_sources: {}", report.with_wiki_title);
    if runtime.diagnostics {
        println!("\n[diagnostics]\n{}", paths.diagnostics());
    }

    Ok(())
}

fn run_related(runtime: &RuntimeOptions, args: RelatedArgs) -> Result<()> {
    let paths = resolve_runtime_paths(runtime)?;
    let records = curated_records(&paths)?;
    let Some(subject) = records.iter().find(|record| record.id() == args.id) else {
        bail!("unknown distribution id `{}`", args.id);
    };

    println!("related distributions");
    println!("subject: {}", subject.id());
    println!("limit: {}", args.limit);
    let related = score_related(subject, &records, args.limit);
    println!("related.count: {}", related.len());
    if related.is_empty() {
        println!("related: <none>");
    }
    for entry in related {
        println!(
            "related.entry: {} (score {:.1}, rank {})",
            entry.record.id(),
            entry.score,
            entry.record.rank()
        );
    }
    if runtime.diagnostics {
        println!("\n[diagnostics]\n{}", paths.diagnostics());
    }

    Ok(())
}

fn run_init(runtime: &RuntimeOptions, args: InitArgs) -> Result<()> {
    let paths = resolve_runtime_paths(runtime)?;
    let report = init_layout(&paths, args.force)?;

    println!("Initialized distrosite project layout");
    println!("project_root: {}", normalize_path(&paths.project_root));
    println!("state_dir: {}", normalize_path(&paths.state_dir));
    println!("config_path: {}", normalize_path(&paths.config_path));
    println!("metadata_path: {}", normalize_path(&paths.metadata_path));
    println!("created_dirs: {}", report.created_dirs.len());
    println!("wrote_config: {}", report.wrote_config);
    println!("wrote_metadata: {}", report.wrote_metadata);
    if runtime.diagnostics {
        println!("\n[diagnostics]\n{}", paths.diagnostics());
    }

    Ok(())
}

fn resolve_runtime_paths(runtime: &RuntimeOptions) -> Result<ResolvedPaths> {
    dotenvy::dotenv().ok();

    let context = ResolutionContext::from_process()?;
    let overrides = PathOverrides {
        project_root: runtime.project_root.clone(),
        config: runtime.config.clone(),
        catalogue: runtime.catalogue.clone(),
    };

    let initial = resolve_paths(&context, &overrides)?;
    let project_env = initial.project_root.join(".env");
    if project_env.exists() {
        let _ = dotenvy::from_path_override(&project_env);
    }

    resolve_paths(&context, &overrides)
}

fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn format_flag(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Commands};

    #[test]
    fn build_flags_parse() {
        let cli = Cli::try_parse_from(["distrosite", "build", "--offline", "--minimal-images"])
            .expect("parse");
        let Some(Commands::Build(args)) = cli.command else {
            panic!("expected build command");
        };
        assert!(args.offline);
        assert!(args.minimal_images);
        assert!(!args.no_screenshots);
    }

    #[test]
    fn related_limit_defaults_and_globals_apply_after_subcommand() {
        let cli = Cli::try_parse_from(["distrosite", "related", "arch", "--verbose"])
            .expect("parse");
        assert!(cli.verbose);
        let Some(Commands::Related(args)) = cli.command else {
            panic!("expected related command");
        };
        assert_eq!(args.id, "arch");
        assert_eq!(args.limit, 3);
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["distrosite", "--verbose", "--quiet", "check"]).is_err());
    }
}
