//! Sitegauge main entry point
//!
//! This is the command-line interface for the Sitegauge audit engine.

use anyhow::Context;
use clap::{Parser, Subcommand};
use sitegauge::audit::{continue_audit, init_audit, score_audit, InitRequest, ScoreResponse};
use sitegauge::config::EngineConfig;
use sitegauge::crawler::{build_http_client, CancelFlag};
use sitegauge::storage::{open_storage, SqliteStorage, Storage};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Sitegauge: a progressive website visibility audit engine
///
/// Sitegauge crawls a bounded sample of a site, evaluates a fixed catalog
/// of visibility checks, and reports a weighted score with a prioritized
/// fix list. Crawling happens in resumable batches, so a large audit can
/// progress across separate invocations.
#[derive(Parser, Debug)]
#[command(name = "sitegauge")]
#[command(version)]
#[command(about = "A progressive website visibility auditor", long_about = None)]
struct Cli {
    /// Path to the SQLite database file
    #[arg(long, global = true, default_value = "sitegauge.db")]
    db: PathBuf,

    /// Path to a TOML engine configuration file
    #[arg(long, global = true, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new audit and queue its root URL
    Init {
        /// Domain to audit (a bare "example.com" is accepted)
        domain: String,

        /// Brand name used by naming checks
        #[arg(long)]
        brand: Option<String>,

        /// Business type (e.g. "saas", "ecommerce", "local")
        #[arg(long)]
        business_type: Option<String>,

        /// Page budget for the crawl
        #[arg(long)]
        limit: Option<u32>,

        /// Treat subdomains as part of the audited site
        #[arg(long)]
        allow_subdomains: bool,
    },

    /// Advance an existing audit by one crawl batch
    Continue {
        /// Audit ID returned by init
        audit_id: i64,
    },

    /// Score whatever has been crawled so far
    Score {
        /// Audit ID returned by init
        audit_id: i64,
    },

    /// Init, crawl to completion, and score in one invocation
    Run {
        /// Domain to audit (a bare "example.com" is accepted)
        domain: String,

        /// Brand name used by naming checks
        #[arg(long)]
        brand: Option<String>,

        /// Business type (e.g. "saas", "ecommerce", "local")
        #[arg(long)]
        business_type: Option<String>,

        /// Page budget for the crawl
        #[arg(long)]
        limit: Option<u32>,

        /// Treat subdomains as part of the audited site
        #[arg(long)]
        allow_subdomains: bool,
    },

    /// Show stored progress and scores for an audit
    Stats {
        /// Audit ID returned by init
        audit_id: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            EngineConfig::load(path).with_context(|| format!("loading {}", path.display()))?
        }
        None => EngineConfig::default(),
    };

    let mut storage = open_storage(&cli.db)
        .with_context(|| format!("opening database {}", cli.db.display()))?;

    match cli.command {
        Command::Init {
            domain,
            brand,
            business_type,
            limit,
            allow_subdomains,
        } => {
            let client = build_http_client(&config)?;
            let request = InitRequest {
                domain,
                brand_name: brand,
                business_type,
                crawl_limit: limit,
                allow_subdomains,
            };
            let response = init_audit(&mut storage, &client, &config, &request).await?;
            println!("Audit {} created", response.audit_id);
            println!("  Crawl limit: {}", response.crawl_limit);
            println!("  robots.txt: {}", found(response.robots_found));
            println!("  sitemap.xml: {}", found(response.sitemap_found));
            println!("  llms.txt: {}", found(response.llms_txt_found));
        }

        Command::Continue { audit_id } => {
            let client = build_http_client(&config)?;
            let cancel = cancel_on_ctrl_c();
            let response =
                continue_audit(&mut storage, &client, &config, audit_id, &cancel).await?;
            println!(
                "Batch complete: +{} pages ({} skipped), {}/{} crawled, {} queued",
                response.pages_this_batch,
                response.skipped,
                response.crawled_count,
                response.crawl_limit,
                response.queue_size,
            );
            if response.done {
                println!("Crawl finished; run `sitegauge score {}`", audit_id);
            }
        }

        Command::Score { audit_id } => {
            let response = score_audit(&mut storage, &config, audit_id, chrono::Utc::now())?;
            print_scorecard(audit_id, &response);
        }

        Command::Run {
            domain,
            brand,
            business_type,
            limit,
            allow_subdomains,
        } => {
            let client = build_http_client(&config)?;
            let request = InitRequest {
                domain,
                brand_name: brand,
                business_type,
                crawl_limit: limit,
                allow_subdomains,
            };
            let init = init_audit(&mut storage, &client, &config, &request).await?;
            let audit_id = init.audit_id;
            tracing::info!("Audit {} created, crawling...", audit_id);

            let cancel = cancel_on_ctrl_c();
            loop {
                if cancel.is_cancelled() {
                    tracing::warn!("Interrupted; resume with `sitegauge continue {}`", audit_id);
                    break;
                }
                let batch =
                    continue_audit(&mut storage, &client, &config, audit_id, &cancel).await?;
                if batch.done {
                    break;
                }
            }

            let response = score_audit(&mut storage, &config, audit_id, chrono::Utc::now())?;
            print_scorecard(audit_id, &response);
        }

        Command::Stats { audit_id } => {
            handle_stats(&storage, audit_id)?;
        }
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitegauge=info,warn"),
            1 => EnvFilter::new("sitegauge=debug,info"),
            2 => EnvFilter::new("sitegauge=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// A cancel flag wired to Ctrl-C
///
/// The first Ctrl-C stops dispatching new fetches; in-flight work drains
/// and state is saved, so the audit stays resumable.
fn cancel_on_ctrl_c() -> CancelFlag {
    let cancel = CancelFlag::new();
    let handle = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Ctrl-C received, finishing in-flight fetches");
            handle.cancel();
        }
    });
    cancel
}

fn found(present: bool) -> &'static str {
    if present {
        "found"
    } else {
        "not found"
    }
}

fn print_scorecard(audit_id: i64, response: &ScoreResponse) {
    println!("=== Audit {} ===\n", audit_id);
    println!(
        "Overall score: {:.1} ({} pages crawled)\n",
        response.overall_score, response.pages_crawled
    );

    println!("Module scores:");
    for (module, score) in &response.module_scores {
        println!("  {:<14} {:>5.1}", module, score);
    }

    if !response.top_fixes.is_empty() {
        println!("\nTop fixes:");
        for (i, fix) in response.top_fixes.iter().enumerate() {
            println!(
                "  {}. [{}] {} (impact: {}, effort: {})",
                i + 1,
                fix.module.as_str(),
                fix.key,
                fix.impact.as_str(),
                fix.effort.as_str(),
            );
            println!("     {}", fix.fix);
        }
    }
}

/// Handles the stats subcommand: shows stored progress for one audit
fn handle_stats(storage: &SqliteStorage, audit_id: i64) -> anyhow::Result<()> {
    let audit = storage.get_audit(audit_id)?;
    let pages = storage.count_pages(audit_id)?;
    let state = storage.load_crawl_state(audit_id)?;

    println!("=== Audit {} ===\n", audit_id);
    println!("Domain: {}", audit.domain);
    if let Some(brand) = &audit.brand_name {
        println!("Brand: {}", brand);
    }
    if let Some(business_type) = &audit.business_type {
        println!("Business type: {}", business_type);
    }
    println!("Status: {}", audit.status.to_db_string());
    println!("Pages stored: {} / {}", pages, audit.crawl_limit);

    if let Some(state) = state {
        println!("Crawl: {} ({} queued)", state.status.as_str(), state.queue_size());
    }

    if let Some(overall) = audit.overall_score {
        println!("\nOverall score: {:.1}", overall);
        for (module, score) in &audit.module_scores {
            println!("  {:<14} {:>5.1}", module, score);
        }
    } else {
        println!("\nNot scored yet; run `sitegauge score {}`", audit_id);
    }

    println!("\nCreated: {}", audit.created_at);
    println!("Updated: {}", audit.updated_at);

    Ok(())
}
