//! Check engine
//!
//! Evaluates a fixed, hand-authored catalog of rule-based checks against the
//! crawled page set and auxiliary signals. Checks are grouped into six
//! modules (crawl, onpage, entity, ai_readiness, offsite, performance) and
//! are pure and order-independent: evaluating the same page set twice yields
//! identical results, which is what makes rescoring idempotent.

mod ai_readiness;
mod crawl;
mod entity;
mod offsite;
mod onpage;
mod performance;

use crate::crawler::PageRecord;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

/// One of the six scoring categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    Crawl,
    Onpage,
    Entity,
    AiReadiness,
    Offsite,
    Performance,
}

impl Module {
    pub const ALL: [Module; 6] = [
        Module::Crawl,
        Module::Onpage,
        Module::Entity,
        Module::AiReadiness,
        Module::Offsite,
        Module::Performance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Crawl => "crawl",
            Self::Onpage => "onpage",
            Self::Entity => "entity",
            Self::AiReadiness => "ai_readiness",
            Self::Offsite => "offsite",
            Self::Performance => "performance",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "crawl" => Some(Self::Crawl),
            "onpage" => Some(Self::Onpage),
            "entity" => Some(Self::Entity),
            "ai_readiness" => Some(Self::AiReadiness),
            "offsite" => Some(Self::Offsite),
            "performance" => Some(Self::Performance),
            _ => None,
        }
    }
}

/// Outcome classification of one check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Warn => "warn",
            Self::Fail => "fail",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pass" => Some(Self::Pass),
            "warn" => Some(Self::Warn),
            "fail" => Some(Self::Fail),
            _ => None,
        }
    }
}

/// Impact/effort classification, baked into each check definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Low,
    Medium,
    High,
}

impl Rating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// Structured facts justifying a check's status
///
/// Counts and flags, never full page dumps. Backed by a sorted JSON map, so
/// serialized evidence is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Evidence(pub serde_json::Map<String, Value>);

impl Evidence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

/// The result of evaluating one check for one audit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub module: Module,
    pub key: String,
    pub status: CheckStatus,
    /// 0..=100
    pub score: f64,
    pub evidence: Evidence,
    /// Rationale for the status
    pub why: String,
    /// Remediation text; empty when there is nothing actionable
    pub fix: String,
    pub impact: Rating,
    pub effort: Rating,
}

/// What a check function produces; impact/effort come from the definition
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub status: CheckStatus,
    pub score: f64,
    pub evidence: Evidence,
    pub why: String,
    pub fix: String,
}

/// One entry of the fixed check catalog
pub struct CheckDef {
    pub key: &'static str,
    pub module: Module,
    pub impact: Rating,
    pub effort: Rating,
    pub eval: fn(&AuditContext) -> CheckOutcome,
}

/// Auxiliary signals fetched once at audit init
#[derive(Debug, Clone, Default)]
pub struct AuxSignals {
    pub robots_txt: Option<String>,
    pub sitemap_exists: bool,
    pub llms_txt: Option<String>,
}

/// Everything the check engine evaluates against
///
/// `now` is pinned by the caller so freshness windows are deterministic for
/// a given input.
pub struct AuditContext<'a> {
    pub pages: &'a [PageRecord],
    pub aux: &'a AuxSignals,
    pub business_type: Option<&'a str>,
    pub brand_name: Option<&'a str>,
    pub root_url: &'a Url,
    pub user_agent: &'a str,
    pub now: DateTime<Utc>,
}

impl<'a> AuditContext<'a> {
    /// The crawled root page, if the crawl reached it
    pub fn homepage(&self) -> Option<&PageRecord> {
        self.pages.iter().find(|page| {
            Url::parse(&page.url)
                .map(|u| u.path() == "/")
                .unwrap_or(false)
        })
    }

    /// Whether any crawled URL or discovered internal link path matches the
    /// given case-insensitive pattern
    pub fn any_path_matches(&self, pattern: &str) -> bool {
        let Ok(re) = Regex::new(&format!("(?i){}", pattern)) else {
            return false;
        };
        self.known_paths().any(|path| re.is_match(&path))
    }

    fn known_paths(&self) -> impl Iterator<Item = String> + '_ {
        self.pages
            .iter()
            .map(|p| p.url.as_str())
            .chain(
                self.pages
                    .iter()
                    .flat_map(|p| p.internal_links.iter().map(|l| l.as_str())),
            )
            .filter_map(|raw| Url::parse(raw).ok())
            .map(|u| u.path().to_string())
    }
}

/// The fixed check catalog, in stable evaluation order
///
/// Catalog order is the tiebreaker for top-fix ranking, so entries must not
/// be reordered casually.
pub fn catalog() -> Vec<CheckDef> {
    let mut defs = Vec::new();
    defs.extend(crawl::checks());
    defs.extend(onpage::checks());
    defs.extend(entity::checks());
    defs.extend(ai_readiness::checks());
    defs.extend(offsite::checks());
    defs.extend(performance::checks());
    defs
}

/// Evaluates the full catalog against one audit's data
pub fn evaluate(ctx: &AuditContext) -> Vec<CheckResult> {
    catalog()
        .iter()
        .map(|def| {
            let outcome = (def.eval)(ctx);
            CheckResult {
                module: def.module,
                key: def.key.to_string(),
                status: outcome.status,
                score: outcome.score.clamp(0.0, 100.0),
                evidence: outcome.evidence,
                why: outcome.why,
                fix: outcome.fix,
                impact: def.impact,
                effort: def.effort,
            }
        })
        .collect()
}

/// Share of `part` in `total`; zero when the denominator is zero
pub(crate) fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

/// Standard pass/warn/fail classification for presence ratios
pub(crate) fn ratio_status(r: f64, pass_at: f64, warn_at: f64) -> CheckStatus {
    if r >= pass_at {
        CheckStatus::Pass
    } else if r >= warn_at {
        CheckStatus::Warn
    } else {
        CheckStatus::Fail
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use chrono::TimeZone;

    /// A page with sensible defaults; tests override the fields they probe
    pub fn page(url: &str) -> PageRecord {
        PageRecord {
            url: url.to_string(),
            status: 200,
            title: Some("Title".to_string()),
            h1: Some("Heading".to_string()),
            meta_description: Some("Description".to_string()),
            canonical: None,
            noindex: false,
            has_schema: false,
            schema_types: Vec::new(),
            word_count: 500,
            image_count: 3,
            images_with_alt: 3,
            heading_counts: [1, 2, 0, 0, 0, 0],
            stylesheet_count: 1,
            blocking_script_count: 0,
            modified_at: None,
            internal_links: Vec::new(),
            social_links: Vec::new(),
        }
    }

    pub fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap()
    }

    pub struct CtxOwner {
        pub pages: Vec<PageRecord>,
        pub aux: AuxSignals,
        pub root_url: Url,
    }

    impl CtxOwner {
        pub fn new(pages: Vec<PageRecord>) -> Self {
            Self {
                pages,
                aux: AuxSignals::default(),
                root_url: Url::parse("https://example.com/").unwrap(),
            }
        }

        pub fn ctx(&self) -> AuditContext<'_> {
            AuditContext {
                pages: &self.pages,
                aux: &self.aux,
                business_type: None,
                brand_name: None,
                root_url: &self.root_url,
                user_agent: "Sitegauge/0.1",
                now: fixed_now(),
            }
        }
    }
}
