//! Audit lifecycle operations
//!
//! The three operations exposed to callers: Init creates an audit and its
//! initial crawl state, Continue advances the crawl by one bounded batch,
//! and Score evaluates the check catalog over whatever has been crawled so
//! far. Each operation loads everything it needs from storage and persists
//! everything it changed before returning, so operations can run in
//! separate process invocations.
//!
//! Precondition: at most one Continue per audit may be in flight at a time.
//! Interleaved batches for the same audit would race on the state snapshot.

use crate::checks::{self, AuditContext, AuxSignals, CheckResult};
use crate::config::EngineConfig;
use crate::crawler::{advance, fetch_aux_text, CancelFlag, CrawlState, CrawlStatus};
use crate::robots::RobotsRules;
use crate::score::{self, TopFix};
use crate::storage::{AuditStatus, NewAudit, Storage};
use crate::url::normalize_url;
use crate::{AuditError, ConfigError, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::collections::BTreeMap;
use url::Url;

/// Parameters for creating a new audit
#[derive(Debug, Clone)]
pub struct InitRequest {
    /// Domain or URL of the site to audit ("example.com" is accepted)
    pub domain: String,
    pub brand_name: Option<String>,
    pub business_type: Option<String>,
    /// Page budget; `None` uses the engine default
    pub crawl_limit: Option<u32>,
    /// Whether subdomain hosts belong to the audit's scope
    pub allow_subdomains: bool,
}

/// What Init produced
#[derive(Debug)]
pub struct InitResponse {
    pub audit_id: i64,
    pub queue_size: usize,
    pub crawl_limit: u32,
    pub robots_found: bool,
    pub sitemap_found: bool,
    pub llms_txt_found: bool,
}

/// What one Continue call accomplished
#[derive(Debug)]
pub struct BatchResponse {
    pub crawled_count: u32,
    pub crawl_limit: u32,
    pub queue_size: usize,
    pub pages_this_batch: usize,
    pub skipped: u32,
    pub done: bool,
}

/// The computed scorecard for an audit
#[derive(Debug)]
pub struct ScoreResponse {
    pub overall_score: f64,
    pub module_scores: BTreeMap<String, f64>,
    pub top_fixes: Vec<TopFix>,
    pub checks: Vec<CheckResult>,
    pub pages_crawled: usize,
}

/// Normalizes and validates the domain of an Init request
///
/// A bare domain gets an https scheme prepended before normalization.
fn resolve_root_url(domain: &str) -> Result<Url> {
    let trimmed = domain.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::InvalidDomain(domain.to_string()).into());
    }
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };
    normalize_url(&with_scheme).map_err(|_| ConfigError::InvalidDomain(domain.to_string()).into())
}

/// Creates a new audit: validates the request, fetches the one-time
/// auxiliary signals (robots.txt, sitemap.xml, llms.txt), and persists the
/// initial crawl state with the root URL queued.
pub async fn init_audit(
    storage: &mut impl Storage,
    client: &Client,
    config: &EngineConfig,
    request: &InitRequest,
) -> Result<InitResponse> {
    let root = resolve_root_url(&request.domain)?;

    let crawl_limit = match request.crawl_limit {
        Some(0) => return Err(ConfigError::InvalidCrawlLimit(0).into()),
        Some(limit) => limit,
        None => config.default_crawl_limit,
    };

    tracing::info!("Initializing audit for {} (limit {})", root, crawl_limit);

    let robots = match fetch_aux_text(client, &root, "/robots.txt").await {
        Some(body) => RobotsRules::from_content(&body),
        None => RobotsRules::allow_all(),
    };
    let sitemap_exists = fetch_aux_text(client, &root, "/sitemap.xml").await.is_some();
    let llms_txt = fetch_aux_text(client, &root, "/llms.txt").await;

    let audit_id = storage.create_audit(&NewAudit {
        domain: root.as_str(),
        brand_name: request.brand_name.as_deref(),
        business_type: request.business_type.as_deref(),
        crawl_limit,
    })?;

    let mut state = CrawlState::new(&root, crawl_limit, request.allow_subdomains, robots);
    state.sitemap_exists = sitemap_exists;
    state.llms_txt = llms_txt;

    let response = InitResponse {
        audit_id,
        queue_size: state.queue_size(),
        crawl_limit,
        robots_found: state.robots.exists(),
        sitemap_found: state.sitemap_exists,
        llms_txt_found: state.llms_txt.is_some(),
    };

    storage.save_crawl_state(audit_id, &state)?;

    Ok(response)
}

/// Advances an audit's crawl by one batch and persists the results
///
/// The state snapshot is saved after the batch whether or not the batch was
/// cancelled partway, so a subsequent Continue picks up exactly where this
/// one stopped.
pub async fn continue_audit(
    storage: &mut impl Storage,
    client: &Client,
    config: &EngineConfig,
    audit_id: i64,
    cancel: &CancelFlag,
) -> Result<BatchResponse> {
    let audit = storage.get_audit(audit_id)?;

    let Some(mut state) = storage.load_crawl_state(audit_id)? else {
        storage.update_audit_status(audit_id, AuditStatus::Failed)?;
        return Err(AuditError::StateNotFound { audit_id });
    };

    if audit.status == AuditStatus::Pending {
        storage.update_audit_status(audit_id, AuditStatus::Running)?;
    }

    let user_agent = config.user_agent_string();
    let report = advance(&mut state, client, config, &user_agent, cancel).await;

    tracing::info!(
        "Audit {}: batch {} crawled {} pages ({} skipped), {}/{} used, {} queued",
        audit_id,
        state.last_cursor,
        report.pages.len(),
        report.skipped,
        state.crawled_count,
        state.crawl_limit,
        state.queue_size(),
    );

    storage.append_pages(audit_id, &report.pages)?;
    storage.save_crawl_state(audit_id, &state)?;

    // A crawl that terminated without fetching any page fails the audit
    if state.status == CrawlStatus::Error {
        storage.update_audit_status(audit_id, AuditStatus::Failed)?;
    }

    Ok(BatchResponse {
        crawled_count: state.crawled_count,
        crawl_limit: state.crawl_limit,
        queue_size: state.queue_size(),
        pages_this_batch: report.pages.len(),
        skipped: report.skipped,
        done: report.done,
    })
}

/// Evaluates the check catalog over everything crawled so far and persists
/// the scorecard
///
/// Scoring is idempotent: it reads the stored pages and auxiliary signals,
/// never the network, and overwrites any earlier results. It can be called
/// mid-crawl for a partial scorecard or after completion for the final one.
pub fn score_audit(
    storage: &mut impl Storage,
    config: &EngineConfig,
    audit_id: i64,
    now: DateTime<Utc>,
) -> Result<ScoreResponse> {
    let audit = storage.get_audit(audit_id)?;

    let Some(state) = storage.load_crawl_state(audit_id)? else {
        return Err(AuditError::StateNotFound { audit_id });
    };

    let pages = storage.load_pages(audit_id)?;
    let root_url = Url::parse(&audit.domain)?;
    let user_agent = config.user_agent_string();

    let aux = AuxSignals {
        robots_txt: state.robots.content().map(str::to_string),
        sitemap_exists: state.sitemap_exists,
        llms_txt: state.llms_txt.clone(),
    };

    let ctx = AuditContext {
        pages: &pages,
        aux: &aux,
        business_type: audit.business_type.as_deref(),
        brand_name: audit.brand_name.as_deref(),
        root_url: &root_url,
        user_agent: &user_agent,
        now,
    };

    let results = checks::evaluate(&ctx);
    let card = score::score(&results);

    storage.upsert_checks(audit_id, &results)?;
    storage.update_audit_scores(audit_id, card.overall, &card.modules)?;
    if state.status == CrawlStatus::Done {
        storage.update_audit_status(audit_id, AuditStatus::Completed)?;
    }

    tracing::info!(
        "Audit {}: overall score {:.1} across {} pages",
        audit_id,
        card.overall,
        pages.len(),
    );

    Ok(ScoreResponse {
        overall_score: card.overall,
        module_scores: card.modules,
        top_fixes: card.top_fixes,
        checks: results,
        pages_crawled: pages.len(),
    })
}
