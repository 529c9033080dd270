use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use postman_publisher_core::config::{
    DEFAULT_CONFIG_FILENAME, PublisherSettings, SettingsOverrides, load_config,
};
use postman_publisher_core::publish::{PublishReport, publish_spec, reorganize_existing};
use postman_publisher_core::reorganize::{
    LayoutReport, MoveRule, ReorganizeOptions, ReorganizeReport, layout,
};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "postman_publisher=info,postman_publisher_core=info";

#[derive(Debug, Parser)]
#[command(
    name = "postman-publisher",
    version,
    about = "Publish an OpenAPI spec to a Postman workspace as a reorganized collection"
)]
struct Cli {
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[arg(long, global = true, value_name = "KEY", help = "Postman API key")]
    api_key: Option<String>,
    #[arg(long, global = true, value_name = "PATH", help = "OpenAPI spec document")]
    spec: Option<PathBuf>,
    #[arg(long, global = true, value_name = "NAME", help = "Target workspace name")]
    workspace: Option<String>,
    #[arg(long, global = true, value_name = "NAME", help = "Collection name to replace")]
    collection: Option<String>,
    #[arg(long, global = true, value_name = "URL")]
    base_url: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Replace the collection with a fresh import and reorganize it (default)")]
    Publish(PublishArgs),
    #[command(about = "Re-run the folder reorganization on an existing collection")]
    Reorganize(ReorganizeArgs),
    #[command(about = "Print the fixed folder layout")]
    Layout(LayoutArgs),
}

#[derive(Debug, Args)]
struct LayoutArgs {
    #[arg(long, help = "Print the layout as JSON")]
    json: bool,
}

#[derive(Debug, Args, Default)]
struct PublishArgs {
    #[arg(long, help = "Print the report as JSON")]
    json: bool,
}

#[derive(Debug, Args)]
struct ReorganizeArgs {
    collection_id: String,
    #[arg(long, help = "Compute the new layout without updating the collection")]
    dry_run: bool,
    #[arg(long, help = "Print the report as JSON")]
    json: bool,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            println!("An error occurred: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Layout(ref args)) => run_layout(args),
        Some(Commands::Reorganize(ref args)) => run_reorganize(&resolve_settings(&cli)?, args),
        Some(Commands::Publish(ref args)) => run_publish(&resolve_settings(&cli)?, args),
        None => run_publish(&resolve_settings(&cli)?, &PublishArgs::default()),
    }
}

fn run_publish(settings: &PublisherSettings, args: &PublishArgs) -> Result<()> {
    let report = publish_spec(settings)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    print_publish_report(settings, &report);
    Ok(())
}

fn run_reorganize(settings: &PublisherSettings, args: &ReorganizeArgs) -> Result<()> {
    let report = reorganize_existing(
        settings,
        &args.collection_id,
        &ReorganizeOptions {
            dry_run: args.dry_run,
        },
    )?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    println!("reorganize");
    print_reorganize_report("reorganize", &report);
    Ok(())
}

fn run_layout(args: &LayoutArgs) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(layout())?);
        return Ok(());
    }
    println!("folder layout");
    for (index, step) in layout().iter().enumerate() {
        let rule = match step.rule {
            MoveRule::WhenDestinationPresent => "when destination present",
            MoveRule::DestinationRequired => "destination required",
        };
        println!(
            "layout.{}: {} -> {} ({rule})",
            index + 1,
            step.folder,
            step.destination
        );
    }
    Ok(())
}

fn print_publish_report(settings: &PublisherSettings, report: &PublishReport) {
    println!("publish");
    println!("spec_path: {}", normalize_path(&settings.spec_path));
    println!("workspace: {} ({})", report.workspace_name, report.workspace_id);
    println!("collection_name: {}", report.collection_name);
    println!(
        "deleted_collection: {}",
        report.deleted_collection_id.as_deref().unwrap_or("<none>")
    );
    println!("collection_id: {}", report.collection_id);
    print_reorganize_report("reorganize", &report.reorganize);
    println!("request_count: {}", report.request_count);
}

fn print_reorganize_report(prefix: &str, report: &ReorganizeReport) {
    println!("{prefix}.collection_id: {}", report.collection_id);
    println!("{prefix}.dry_run: {}", format_flag(report.dry_run));
    println!("{prefix}.pushed: {}", format_flag(report.pushed));
    print_layout_report(prefix, &report.layout);
}

fn print_layout_report(prefix: &str, layout: &LayoutReport) {
    println!("{prefix}.moved: {}", layout.moved());
    for item in &layout.moves {
        println!(
            "{prefix}.move: {} -> {} ({})",
            item.folder,
            item.destination,
            item.outcome.as_str()
        );
    }
    if layout.top_level.is_empty() {
        println!("{prefix}.top_level: <empty>");
    } else {
        for name in &layout.top_level {
            println!("{prefix}.top_level: {name}");
        }
    }
}

fn resolve_settings(cli: &Cli) -> Result<PublisherSettings> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILENAME));
    let config = load_config(&config_path)?;
    let overrides = SettingsOverrides {
        api_key: cli.api_key.clone(),
        spec_path: cli.spec.clone(),
        workspace_name: cli.workspace.clone(),
        collection_name: cli.collection.clone(),
        base_url: cli.base_url.clone(),
    };
    Ok(PublisherSettings::resolve(&config, &overrides))
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn format_flag(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
