//! Batch crawl machine
//!
//! Advances a crawl by one bounded batch: pops up to a batch worth of URLs
//! off the frontier, fetches them through a bounded worker pool, parses the
//! successful responses on the coordinator, and appends newly discovered
//! in-scope links back onto the frontier.
//!
//! Precondition: at most one batch per audit may be in flight at a time.
//! The state is owned exclusively by the coordinator for the duration of a
//! batch; serializing Continue calls is the caller's responsibility.

use crate::config::EngineConfig;
use crate::crawler::fetcher::{fetch_url, FetchOutcome};
use crate::crawler::parser::{parse_page, PageRecord};
use crate::crawler::state::{CrawlState, CrawlStatus};
use crate::url::{host_in_scope, normalize_url};
use reqwest::Client;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

/// External cancellation signal for a running batch
///
/// Cancelling stops new fetches from being dispatched; in-flight fetches
/// finish (or hit their own timeout) and their results are kept. The crawl
/// state remains valid and resumable after an aborted batch.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What one batch accomplished
#[derive(Debug)]
pub struct BatchReport {
    /// Pages successfully fetched and parsed this batch
    pub pages: Vec<PageRecord>,
    /// URLs that consumed budget but produced no page
    pub skipped: u32,
    /// Whether the crawl reached its limit or emptied the frontier
    pub done: bool,
}

/// Advances the crawl by one batch
///
/// Pulls up to `min(batch_size, remaining budget)` URLs, fetches them with
/// bounded parallelism, and processes results in frontier-pop order so the
/// link-append order (and therefore the whole traversal) is reproducible on
/// a static site. Fetch failures consume a frontier slot and increment
/// `crawled_count` to guarantee termination, but contribute no page.
pub async fn advance(
    state: &mut CrawlState,
    client: &Client,
    config: &EngineConfig,
    user_agent: &str,
    cancel: &CancelFlag,
) -> BatchReport {
    if state.status.is_terminal() {
        return BatchReport {
            pages: Vec::new(),
            skipped: 0,
            done: true,
        };
    }
    state.status = CrawlStatus::Running;

    let budget = state.remaining_budget().min(config.batch_size) as usize;
    let mut batch: Vec<String> = Vec::with_capacity(budget);
    while batch.len() < budget {
        match state.pop_next() {
            Some(url) => batch.push(url),
            None => break,
        }
    }

    let semaphore = Arc::new(Semaphore::new(config.max_concurrent_fetches as usize));
    let mut tasks: JoinSet<(usize, String, Option<FetchOutcome>)> = JoinSet::new();

    for (idx, url) in batch.iter().cloned().enumerate() {
        let client = client.clone();
        let semaphore = semaphore.clone();
        let cancel = cancel.clone();
        tasks.spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return (idx, url, None);
            };
            // A fetch whose permit arrives after cancellation is never sent
            if cancel.is_cancelled() {
                return (idx, url, None);
            }
            let outcome = fetch_url(&client, &url).await;
            (idx, url, Some(outcome))
        });
    }

    let mut results: Vec<(usize, String, Option<FetchOutcome>)> = Vec::with_capacity(batch.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(result) => results.push(result),
            Err(e) => tracing::error!("Fetch task failed to join: {}", e),
        }
    }
    // Frontier-pop order, regardless of completion order
    results.sort_by_key(|(idx, _, _)| *idx);

    let mut pages = Vec::new();
    let mut skipped = 0u32;
    let mut requeue = Vec::new();

    for (_, url, outcome) in results {
        let Some(outcome) = outcome else {
            // Never dispatched; goes back to the head of the frontier
            requeue.push(url);
            continue;
        };

        state.crawled_count += 1;

        match outcome {
            FetchOutcome::Success {
                status,
                final_url,
                body,
            } => {
                if !final_host_in_scope(&final_url, state) {
                    tracing::info!("{} redirected out of scope to {}", url, final_url);
                    skipped += 1;
                    continue;
                }

                let Ok(base) = Url::parse(&url) else {
                    skipped += 1;
                    continue;
                };
                let parsed = parse_page(&body, &base);

                let mut internal_links = Vec::new();
                for link in &parsed.links {
                    if let Ok(normalized) = normalize_url(link) {
                        let in_scope = normalized.host_str().is_some_and(|host| {
                            host_in_scope(host, &state.root_host, state.allow_subdomains)
                        });
                        if in_scope {
                            let link_str = normalized.to_string();
                            if !internal_links.contains(&link_str) {
                                internal_links.push(link_str);
                            }
                        }
                    }
                }

                // Document order keeps the traversal reproducible
                for link in &internal_links {
                    state.try_enqueue(link, user_agent);
                }

                pages.push(parsed.into_record(url, status, internal_links));
            }
            FetchOutcome::ContentMismatch { content_type } => {
                tracing::info!("{} skipped: non-HTML content ({})", url, content_type);
                skipped += 1;
            }
            FetchOutcome::HttpError { status } => {
                tracing::info!("{} skipped: HTTP {}", url, status);
                skipped += 1;
            }
            FetchOutcome::NetworkError { error, timed_out } => {
                tracing::info!("{} skipped: {} (timeout: {})", url, error, timed_out);
                skipped += 1;
            }
        }
    }

    state.requeue_front(requeue);
    state.page_count += pages.len() as u32;
    state.last_cursor += 1;

    let done = state.is_done();
    if done {
        // A crawl that ends without a single page is a failure, not a result
        state.status = if state.page_count == 0 {
            CrawlStatus::Error
        } else {
            CrawlStatus::Done
        };
    }

    BatchReport {
        pages,
        skipped,
        done,
    }
}

/// Whether the post-redirect URL still belongs to the audited site
fn final_host_in_scope(final_url: &str, state: &CrawlState) -> bool {
    match Url::parse(final_url) {
        Ok(parsed) => parsed
            .host_str()
            .is_some_and(|host| host_in_scope(host, &state.root_host, state.allow_subdomains)),
        Err(_) => false,
    }
}
