//! CLI command definitions, routing, and tracing setup.

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use tracing::info;

use researchbrief_core::{ComponentStatus, Orchestrator};
use researchbrief_extractor::ContentExtractor;
use researchbrief_llm::{BriefGenerator, LlmClient};
use researchbrief_shared::{
    AppConfig, Brief, BriefError, config_file_path, expand_home, init_config, load_config,
    resolve_api_key,
};
use researchbrief_storage::BriefStore;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// ResearchBrief — synthesize web sources into a research brief.
#[derive(Parser)]
#[command(
    name = "researchbrief",
    version,
    about = "Generate structured research briefs from a batch of URLs.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Generate a brief from 1-10 source URLs.
    Generate {
        /// Source URLs (http or https).
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// List recently generated briefs.
    History {
        /// Number of briefs to show.
        #[arg(short, long)]
        limit: Option<u32>,
    },

    /// Show a stored brief by id.
    Show {
        /// Brief id from `history`.
        id: i64,
    },

    /// Check connectivity to the database and the model provider.
    Status,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "researchbrief=info",
        1 => "researchbrief=debug",
        _ => "researchbrief=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Generate { urls } => cmd_generate(&urls).await,
        Command::History { limit } => cmd_history(limit).await,
        Command::Show { id } => cmd_show(id).await,
        Command::Status => cmd_status().await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

async fn open_store(config: &AppConfig) -> Result<BriefStore> {
    let db_path = expand_home(&config.defaults.db_path)?;
    Ok(BriefStore::open(&db_path).await?)
}

fn build_client(config: &AppConfig) -> Result<LlmClient> {
    let api_key = resolve_api_key(config)?;
    Ok(LlmClient::new(
        &config.groq.base_url,
        &api_key,
        &config.groq.model,
    )?)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_generate(urls: &[String]) -> Result<()> {
    let config = load_config()?;
    let client = build_client(&config)?;
    let generator = BriefGenerator::new(client);
    let extractor = ContentExtractor::new()?;
    let store = open_store(&config).await?;

    info!(count = urls.len(), "generating brief");
    let orchestrator = Orchestrator::new(extractor, generator, store);

    let outcome = match orchestrator.run(urls).await {
        Ok(outcome) => outcome,
        Err(BriefError::InvalidInput { message, invalid }) => {
            let mut report = format!("invalid request: {message}");
            for url in &invalid {
                report.push_str(&format!("\n  - {url}"));
            }
            return Err(eyre!(report));
        }
        Err(BriefError::ExtractionFailed { failures }) => {
            let mut report = String::from("no source could be extracted:");
            for failure in &failures {
                report.push_str(&format!("\n  - {}: {}", failure.url, failure.reason));
            }
            return Err(eyre!(report));
        }
        Err(BriefError::Auth { message }) => return Err(eyre!(message)),
        Err(e) => return Err(e.into()),
    };

    println!();
    print_brief(&outcome.brief);

    println!("  Sources:");
    for (i, source) in outcome.sources.iter().enumerate() {
        println!("    [{}] {} — {}", i + 1, source.title, source.url);
    }
    if !outcome.failed_sources.is_empty() {
        println!();
        println!("  Skipped sources:");
        for failure in &outcome.failed_sources {
            println!("    {} ({})", failure.url, failure.reason);
        }
    }
    println!();
    println!("  Saved as brief #{}", outcome.id);
    Ok(())
}

async fn cmd_history(limit: Option<u32>) -> Result<()> {
    let config = load_config()?;
    let store = open_store(&config).await?;

    let limit = limit.unwrap_or(config.defaults.history_limit);
    let summaries = store.list_recent(limit).await?;

    if summaries.is_empty() {
        println!("No briefs yet. Run `researchbrief generate <url>...` first.");
        return Ok(());
    }

    for summary in &summaries {
        println!(
            "  #{:<4} {}  [{}]  ({} source{})",
            summary.id,
            summary.created_at.format("%Y-%m-%d %H:%M"),
            summary.title,
            summary.urls.len(),
            if summary.urls.len() == 1 { "" } else { "s" },
        );
        if !summary.tags.is_empty() {
            println!("        tags: {}", summary.tags.join(", "));
        }
    }
    Ok(())
}

async fn cmd_show(id: i64) -> Result<()> {
    let config = load_config()?;
    let store = open_store(&config).await?;

    let record = store
        .get_brief(id)
        .await?
        .ok_or_else(|| eyre!("no brief with id {id}"))?;

    println!();
    println!("  Brief #{} — {}", record.id, record.created_at.to_rfc3339());
    print_brief(&record.brief);

    println!("  Sources:");
    for (i, source) in record.sources.iter().enumerate() {
        println!("    [{}] {} — {}", i + 1, source.title, source.url);
    }
    println!();
    Ok(())
}

async fn cmd_status() -> Result<()> {
    let config = load_config()?;
    let store = open_store(&config).await?;
    let client = build_client(&config)?;

    let report = researchbrief_core::check(&store, &client).await;

    let render = |status: &ComponentStatus| match &status.detail {
        None => "ok".to_string(),
        Some(detail) => format!("DOWN ({detail})"),
    };
    println!("  database: {}", render(&report.store));
    println!("  llm:      {} (model {})", render(&report.llm), client.model());

    if report.healthy() {
        Ok(())
    } else {
        Err(eyre!("one or more components are unavailable"))
    }
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config written to {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    let path = config_file_path()?;
    println!("# {}", path.display());
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn print_brief(brief: &Brief) {
    println!("  {}", brief.title);
    println!();
    println!("  {}", brief.summary);
    println!();

    if !brief.key_points.is_empty() {
        println!("  Key points:");
        for point in &brief.key_points {
            // sourceIndex is 0-based on the wire; the source list prints 1-based.
            println!("    [{}] {}", point.source_index + 1, point.point);
            if !point.snippet.is_empty() {
                println!("        \"{}\"", point.snippet);
            }
        }
        println!();
    }

    if !brief.conflicting_claims.is_empty() {
        println!("  Conflicting claims:");
        for claim in &brief.conflicting_claims {
            println!(
                "    sources {} vs {}: {}",
                claim.source_a + 1,
                claim.source_b + 1,
                claim.claim
            );
            if !claim.details.is_empty() {
                println!("        {}", claim.details);
            }
        }
        println!();
    }

    if !brief.to_verify.is_empty() {
        println!("  To verify:");
        for item in &brief.to_verify {
            println!("    - {item}");
        }
        println!();
    }

    if !brief.tags.is_empty() {
        println!("  Tags: {}", brief.tags.join(", "));
        println!();
    }
}
