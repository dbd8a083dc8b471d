//! notion-review - summaries of personal Notion databases
//!
//! A CLI tool that streams rows out of Notion databases and folds them
//! into reports: a job-application cycle review, the list of companies
//! applied to, and subscription cost totals. It can also move rich-text
//! notes into the body of their pages.
//!
//! Exit codes:
//!   0 - Success (skipped rows and pages do not change this)
//!   1 - Runtime error (config, token, Notion unreachable or malformed, no rows)

mod analysis;
mod cli;
mod config;
mod models;
mod notes;
mod notion;
mod report;

use anyhow::{bail, Context, Result};
use cli::{Args, Command, MigrateNotesArgs, OutputFormat, ReviewArgs};
use config::{Config, PropertiesConfig, CONFIG_FILE};
use futures::{Stream, StreamExt, TryStreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use models::{CycleReport, RawRow, SubscriptionTotals};
use notion::client::SourceError;
use notion::page::{decode_application, decode_company, decode_notes, decode_subscription};
use notion::{rich_text_not_empty, select_equals, ClientConfig, NotionClient};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("notion-review v{}", env!("CARGO_PKG_VERSION"));
    // Args carries the token, so only the command is logged.
    debug!("Command: {:?}", args.command);

    if let Err(e) = run(args).await {
        error!("Run failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .notion-review.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to set database IDs, property names and a default cycle.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so reports printed to stdout stay clean.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the selected command.
async fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let client = build_client(&args, &config)?;

    match args.command {
        Some(Command::Review(ref review)) => run_review(&client, &config, review, args.quiet).await,
        Some(Command::Companies) => run_companies(&client, &config, args.quiet).await,
        Some(Command::Subscriptions) => run_subscriptions(&client, &config, args.quiet).await,
        Some(Command::MigrateNotes(ref migrate)) => {
            run_migrate_notes(&client, &config, migrate, args.quiet).await
        }
        None => bail!("No command given"),
    }
}

/// Review one job-application cycle.
async fn run_review(
    client: &NotionClient,
    config: &Config,
    review: &ReviewArgs,
    quiet: bool,
) -> Result<()> {
    let cycle = review
        .cycle
        .clone()
        .or_else(|| config.review.default_cycle.clone())
        .context("No cycle given. Pass --cycle or set review.default_cycle in the config")?;
    let database_id = config.databases.applications.as_deref().context(
        "No applications database configured. Set APPLICATION_DATABASE_ID or --applications-db",
    )?;

    info!("Reviewing cycle '{}'", cycle);

    let filter = select_equals(&config.properties.cycle, &cycle);
    let props = &config.properties;
    let progress = row_spinner(quiet, "Reading applications");

    let rows = client
        .query_database(database_id, Some(filter))
        .inspect_ok(|_| progress.inc(1))
        .map(|page| page.and_then(|page| decode_application(page, props)));

    let report = with_spinner(&progress, review_cycle(&cycle, rows)).await?;

    if report.skipped > 0 {
        warn!("{} row(s) could not be classified and were skipped", report.skipped);
    }
    info!(
        "Folded {} rows ({} applications, hired: {})",
        report.rows_seen(),
        report.total,
        report.hiring.is_hired()
    );

    let output = match review.format {
        OutputFormat::Text => report::generate_text_summary(&cycle, &report),
        OutputFormat::Markdown => report::generate_markdown_report(&cycle, &report),
        OutputFormat::Json => report::generate_json_report(&cycle, &report)?,
    };

    match review.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            println!("✅ Report saved to: {}", path.display());
        }
        None => println!("{}", output),
    }

    Ok(())
}

/// List every company in the applications database.
async fn run_companies(client: &NotionClient, config: &Config, quiet: bool) -> Result<()> {
    let database_id = match config.databases.applications {
        Some(ref id) => id.clone(),
        None => {
            info!(
                "No applications database ID set, searching for '{}'",
                config.databases.applications_title
            );
            client
                .search_database(&config.databases.applications_title)
                .await
                .context("Failed to search Notion for the applications database")?
                .with_context(|| {
                    format!(
                        "Could not find {} database.",
                        config.databases.applications_title
                    )
                })?
        }
    };

    let props = &config.properties;
    let progress = row_spinner(quiet, "Reading companies");

    let titles = client
        .query_database(&database_id, None)
        .inspect_ok(|_| progress.inc(1))
        .map(|page| page.and_then(|page| decode_company(page, props)));

    let companies = with_spinner(&progress, analysis::collect_companies(titles))
        .await
        .context("Failed to read the applications database")?;

    if companies.is_empty() {
        warn!("No companies found");
    }
    for company in &companies {
        println!("{}", company);
    }

    Ok(())
}

/// Print monthly and yearly subscription totals.
async fn run_subscriptions(client: &NotionClient, config: &Config, quiet: bool) -> Result<()> {
    let database_id = config.databases.subscriptions.as_deref().context(
        "No subscriptions database configured. Set SUBSCRIPTION_DATABASE_ID or --subscriptions-db",
    )?;

    let props = &config.properties;
    let progress = row_spinner(quiet, "Reading subscriptions");

    let rows = client
        .query_database(database_id, None)
        .inspect_ok(|_| progress.inc(1))
        .map(|page| page.and_then(|page| decode_subscription(page, props)));

    let totals = with_spinner(&progress, SubscriptionTotals::accumulate(rows))
        .await
        .context("Failed to read the subscriptions database")?;

    debug!("Counted {} subscriptions", totals.counted);
    println!("{}", report::generate_subscription_summary(&totals));

    Ok(())
}

/// Fold a cycle's rows into a report.
///
/// A source fault and a cycle without any rows are reported as different
/// errors.
async fn review_cycle<S>(cycle: &str, rows: S) -> Result<CycleReport>
where
    S: Stream<Item = Result<RawRow, SourceError>>,
{
    let report = analysis::aggregate(rows)
        .await
        .with_context(|| format!("Failed to read applications for cycle '{}'", cycle))?;

    if report.rows_seen() == 0 {
        bail!("No rows found for cycle '{}'", cycle);
    }

    Ok(report)
}

/// Move each page's notes property into its body.
async fn run_migrate_notes(
    client: &NotionClient,
    config: &Config,
    migrate: &MigrateNotesArgs,
    quiet: bool,
) -> Result<()> {
    let database_id = match migrate
        .database
        .clone()
        .or_else(|| config.databases.notes.clone())
    {
        Some(id) => id,
        None => {
            info!(
                "No notes database ID set, searching for '{}'",
                config.databases.notes_title
            );
            client
                .search_database(&config.databases.notes_title)
                .await
                .context("Failed to search Notion for the notes database")?
                .with_context(|| {
                    format!("Could not find {} database.", config.databases.notes_title)
                })?
        }
    };

    if migrate.dry_run {
        info!("Dry run: nothing will be written");
    }

    let props = &config.properties;
    let filter = rich_text_not_empty(&props.notes);
    let progress = row_spinner(quiet, "Migrating notes");

    let pages = client
        .query_database(&database_id, Some(filter))
        .inspect_ok(|_| progress.inc(1));

    let summary = with_spinner(
        &progress,
        notes::migrate_pages(pages, migrate.concurrency, move |page| {
            migrate_page(client, page, props, migrate.dry_run)
        }),
    )
    .await
    .context("Failed to read the notes database")?;

    let verb = if migrate.dry_run { "Would migrate" } else { "Migrated" };
    println!(
        "{} notes of {} page(s) into {} paragraph(s)",
        verb, summary.migrated, summary.blocks
    );
    if summary.failed > 0 {
        println!("⚠️  {} page(s) failed, see the log", summary.failed);
    }

    Ok(())
}

/// Append one page's notes to its body. Returns the number of blocks.
async fn migrate_page(
    client: &NotionClient,
    page: Value,
    props: &PropertiesConfig,
    dry_run: bool,
) -> Result<usize> {
    let (page_id, rich_text) = decode_notes(page, props)?;
    let blocks = notes::split_paragraphs(rich_text)
        .with_context(|| format!("Cannot convert the notes of page {}", page_id))?;

    if blocks.is_empty() {
        debug!("Page {} has no notes", page_id);
        return Ok(0);
    }

    if !dry_run {
        client
            .append_block_children(&page_id, &blocks)
            .await
            .with_context(|| format!("Failed to append notes to page {}", page_id))?;
    }

    Ok(blocks.len())
}

/// Build the Notion client from the token and merged config.
fn build_client(args: &Args, config: &Config) -> Result<NotionClient> {
    let token = args
        .token
        .clone()
        .context("Missing Notion token. Set NOTION_TOKEN or pass --token")?;

    let client = NotionClient::new(ClientConfig {
        api_url: config.notion.api_url.clone(),
        api_version: config.notion.api_version.clone(),
        token,
        timeout_seconds: config.notion.timeout_seconds,
        page_size: config.notion.page_size,
    })
    .context("Failed to create HTTP client")?;

    Ok(client)
}

/// Spinner counting streamed rows. Hidden in quiet mode.
fn row_spinner(quiet: bool, message: &str) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) =
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}: {pos} rows")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Await `work`, then clear the spinner whether or not it succeeded.
async fn with_spinner<T>(progress: &ProgressBar, work: impl Future<Output = T>) -> T {
    let output = work.await;
    progress.finish_and_clear();
    output
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
