//! Resumable crawl state
//!
//! `CrawlState` is the complete traversal state of one audit: the frontier
//! queue, the seen-hash set, the crawl budget, robots rules, and the cached
//! auxiliary signals. It is serialized as one JSON snapshot after every
//! batch; a batch can run in a different process than the next, so nothing
//! about the traversal may live outside this struct.

use crate::robots::RobotsRules;
use crate::url::{host_in_scope, normalize_url, url_fingerprint};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use url::Url;

/// Lifecycle status of a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlStatus {
    Pending,
    Running,
    Done,
    Error,
}

impl CrawlStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Done => "done",
            Self::Error => "error",
        }
    }

    /// Terminal states accept no further batches
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

/// The persisted traversal state of one audit
///
/// Invariants:
/// - `crawled_count <= crawl_limit` after every batch
/// - every URL whose fingerprint is in `seen` is never re-enqueued
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlState {
    /// Pending URLs in breadth-first order
    pub frontier: VecDeque<String>,
    /// Fingerprints of every URL ever enqueued or visited
    pub seen: HashSet<String>,
    /// Pages consumed so far (successful or skipped)
    pub crawled_count: u32,
    /// Pages successfully fetched and parsed so far
    #[serde(default)]
    pub page_count: u32,
    /// Hard page budget for this audit
    pub crawl_limit: u32,
    /// Whether subdomain hosts are eligible for the frontier
    pub allow_subdomains: bool,
    /// Normalized host of the audited site
    pub root_host: String,
    /// Robots rules fetched once at audit init
    pub robots: RobotsRules,
    /// Whether a sitemap.xml was found at audit init
    pub sitemap_exists: bool,
    /// llms.txt body fetched at audit init, if present
    pub llms_txt: Option<String>,
    /// Lifecycle status
    pub status: CrawlStatus,
    /// Number of batches executed so far
    pub last_cursor: u32,
}

impl CrawlState {
    /// Creates the initial state for an audit, seeded with the root URL
    pub fn new(root: &Url, crawl_limit: u32, allow_subdomains: bool, robots: RobotsRules) -> Self {
        let mut frontier = VecDeque::new();
        let mut seen = HashSet::new();
        frontier.push_back(root.to_string());
        seen.insert(url_fingerprint(root));

        Self {
            frontier,
            seen,
            crawled_count: 0,
            page_count: 0,
            crawl_limit,
            allow_subdomains,
            root_host: root.host_str().unwrap_or_default().to_string(),
            robots,
            sitemap_exists: false,
            llms_txt: None,
            status: CrawlStatus::Pending,
            last_cursor: 0,
        }
    }

    /// Number of URLs still queued
    pub fn queue_size(&self) -> usize {
        self.frontier.len()
    }

    /// Remaining page budget
    pub fn remaining_budget(&self) -> u32 {
        self.crawl_limit.saturating_sub(self.crawled_count)
    }

    /// Whether the crawl has nothing left to do
    pub fn is_done(&self) -> bool {
        self.crawled_count >= self.crawl_limit || self.frontier.is_empty()
    }

    /// Pops the next URL off the frontier
    pub fn pop_next(&mut self) -> Option<String> {
        self.frontier.pop_front()
    }

    /// Puts URLs back at the head of the frontier, preserving their order
    ///
    /// Used when a batch is cancelled before dispatching all of its URLs.
    pub fn requeue_front(&mut self, urls: Vec<String>) {
        for url in urls.into_iter().rev() {
            self.frontier.push_front(url);
        }
    }

    /// Offers a discovered link for the frontier
    ///
    /// The link is enqueued only if it normalizes, its host is within the
    /// audit's scope, it passes robots rules, and its fingerprint has not
    /// been seen. Returns true when the link was enqueued.
    pub fn try_enqueue(&mut self, raw_url: &str, user_agent: &str) -> bool {
        let Ok(normalized) = normalize_url(raw_url) else {
            return false;
        };

        let Some(host) = normalized.host_str() else {
            return false;
        };
        if !host_in_scope(host, &self.root_host, self.allow_subdomains) {
            return false;
        }

        if !self.robots.is_allowed(normalized.path(), user_agent) {
            tracing::debug!("Robots disallows {}, not enqueueing", normalized);
            return false;
        }

        let fingerprint = url_fingerprint(&normalized);
        if !self.seen.insert(fingerprint) {
            return false;
        }

        self.frontier.push_back(normalized.to_string());
        true
    }
}
