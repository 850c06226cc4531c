use std::path::{Path, PathBuf};

use anyhow::Result;
use blogport_core::config::{BlogportConfig, ResolvedConfig, load_config};
use blogport_core::migrate::{MigrateOptions, MigrationEvent, run_migration};
use blogport_core::publish::{HttpPublisher, PublisherConfig, ThreadSleeper};
use blogport_core::source::PgArticleSource;
use clap::{Args, CommandFactory, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "blogport",
    version,
    about = "Migrate a legacy blog database to a hosted publishing API"
)]
struct Cli {
    #[arg(
        long,
        global = true,
        value_name = "PATH",
        default_value = "blogport.toml"
    )]
    config: PathBuf,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Publish every eligible article and write the rewrite-rule file")]
    Run(RunArgs),
    #[command(about = "Print the resolved configuration with secrets masked")]
    Config,
}

#[derive(Debug, Args)]
struct RunArgs {
    #[arg(long, help = "Report what would be published without calling the API")]
    dry_run: bool,
    #[arg(long, help = "Print the final report as JSON instead of a summary")]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run(args)) => run_migrate(&cli.config, args),
        Some(Commands::Config) => run_config(&cli.config),
        None => {
            let mut command = Cli::command();
            command.print_help()?;
            println!();
            Ok(())
        }
    }
}

fn run_migrate(config_path: &Path, args: RunArgs) -> Result<()> {
    let resolved = resolve_config(config_path)?;

    let mut source = PgArticleSource::connect(&resolved.database)?;
    let mut publisher = HttpPublisher::new(PublisherConfig::new(
        resolved.endpoint_url.clone(),
        resolved.account.email.clone(),
        resolved.account.password.clone(),
    ))?;
    let sleeper = ThreadSleeper;
    let options = MigrateOptions {
        delay: resolved.delay,
        new_base_url: resolved.new_base_url.clone(),
        output_path: resolved.output_path.clone(),
        match_trailing_path: resolved.match_trailing_path,
        dry_run: args.dry_run,
    };

    if args.dry_run {
        println!("Dry run against account: {}", resolved.account.email);
    } else {
        println!("Publishing to account: {}", resolved.account.email);
    }

    let mut progress = |event: &MigrationEvent| match event {
        MigrationEvent::Published {
            index,
            title,
            tags,
            response,
        } => println!("Article {index}: {title} (Tags: {tags}) ... {response}"),
        MigrationEvent::Planned { index, title, tags } => {
            println!("Article {index}: {title} (Tags: {tags}) ... would publish")
        }
        MigrationEvent::WritingRules { path } => {
            println!("Creating rewrite file: {}", path.display())
        }
    };

    let report = run_migration(
        &mut source,
        &mut publisher,
        None,
        &sleeper,
        &options,
        Some(&mut progress),
    )?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("dry_run: {}", report.dry_run);
    println!("eligible: {}", report.eligible);
    println!("published: {}", report.published);
    println!("skipped: {}", report.skipped);
    println!(
        "output_path: {}",
        report.output_path.as_deref().unwrap_or("<none>")
    );
    Ok(())
}

fn run_config(config_path: &Path) -> Result<()> {
    let resolved = resolve_config(config_path)?;

    println!("config_path: {}", config_path.display());
    println!("database.host: {}", resolved.database.host);
    println!("database.port: {}", resolved.database.port);
    println!("database.dbname: {}", resolved.database.dbname);
    println!("database.user: {}", resolved.database.user);
    println!(
        "database.password: {}",
        mask(resolved.database.password.as_deref())
    );
    println!("account.email: {}", resolved.account.email);
    println!("account.password: {}", mask(Some(&resolved.account.password)));
    println!("publish.endpoint_url: {}", resolved.endpoint_url);
    println!("publish.delay_ms: {}", resolved.delay.as_millis());
    println!("site.new_base_url: {}", resolved.new_base_url);
    println!("rewrite.output_path: {}", resolved.output_path.display());
    println!(
        "rewrite.match_trailing_path: {}",
        resolved.match_trailing_path
    );
    Ok(())
}

fn resolve_config(config_path: &Path) -> Result<ResolvedConfig> {
    dotenvy::dotenv().ok();
    let config: BlogportConfig = load_config(config_path)?;
    config.resolve()
}

fn mask(value: Option<&str>) -> &'static str {
    match value {
        Some(value) if !value.is_empty() => "<set>",
        _ => "<missing>",
    }
}
