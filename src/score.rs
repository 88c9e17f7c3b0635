//! Scoring and fix prioritization
//!
//! Turns evaluated check results into per-module scores, one weighted
//! overall score, and a short ranked list of the most worthwhile fixes.
//! All of it is pure arithmetic over `CheckResult`s, so rescoring the
//! same audit always produces the same numbers.

use crate::checks::{CheckResult, CheckStatus, Module, Rating};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How many fixes make the prioritized list
pub const TOP_FIX_LIMIT: usize = 7;

/// Relative weight of each module in the overall score
///
/// Weights sum to 100, but the overall score normalizes by the weights of
/// the modules actually present, so a partial result set still yields a
/// 0..=100 score.
pub fn module_weight(module: Module) -> f64 {
    match module {
        Module::Crawl => 20.0,
        Module::Performance => 15.0,
        Module::Onpage => 15.0,
        Module::Entity => 20.0,
        Module::AiReadiness => 20.0,
        Module::Offsite => 10.0,
    }
}

/// One entry of the prioritized fix list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopFix {
    pub key: String,
    pub module: Module,
    pub status: CheckStatus,
    pub impact: Rating,
    pub effort: Rating,
    pub why: String,
    pub fix: String,
}

/// Aggregate scores for one audit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scorecard {
    /// Weighted overall score, 0..=100
    pub overall: f64,
    /// Per-module mean scores, keyed by module name
    pub modules: BTreeMap<String, f64>,
    pub top_fixes: Vec<TopFix>,
}

/// Computes module scores, the weighted overall score, and the top fixes
/// from a full set of check results.
pub fn score(results: &[CheckResult]) -> Scorecard {
    let modules = module_scores(results);
    Scorecard {
        overall: overall_score(&modules),
        top_fixes: top_fixes(results),
        modules,
    }
}

/// Mean check score per module, for modules that have at least one result
fn module_scores(results: &[CheckResult]) -> BTreeMap<String, f64> {
    let mut sums: BTreeMap<Module, (f64, u32)> = BTreeMap::new();
    for result in results {
        let entry = sums.entry(result.module).or_insert((0.0, 0));
        entry.0 += result.score;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(module, (sum, count))| (module.as_str().to_string(), sum / count as f64))
        .collect()
}

/// Weighted mean of the module scores, normalized by the weights of the
/// modules present
fn overall_score(modules: &BTreeMap<String, f64>) -> f64 {
    let mut weighted = 0.0;
    let mut weight_total = 0.0;
    for (name, score) in modules {
        let Some(module) = Module::from_str(name) else {
            continue;
        };
        let weight = module_weight(module);
        weighted += score * weight;
        weight_total += weight;
    }
    if weight_total == 0.0 {
        0.0
    } else {
        weighted / weight_total
    }
}

fn impact_weight(rating: Rating) -> u32 {
    match rating {
        Rating::High => 3,
        Rating::Medium => 2,
        Rating::Low => 1,
    }
}

/// Low effort ranks higher: an easy fix with the same impact comes first
fn effort_weight(rating: Rating) -> u32 {
    match rating {
        Rating::Low => 3,
        Rating::Medium => 2,
        Rating::High => 1,
    }
}

/// Ranks non-passing checks by impact times inverse effort and keeps the
/// best [`TOP_FIX_LIMIT`]. Checks with an empty fix carry nothing
/// actionable and are excluded. Sorting is stable, so ties keep catalog
/// order.
pub fn top_fixes(results: &[CheckResult]) -> Vec<TopFix> {
    let mut candidates: Vec<&CheckResult> = results
        .iter()
        .filter(|r| r.status != CheckStatus::Pass && !r.fix.is_empty())
        .collect();
    candidates.sort_by_key(|r| std::cmp::Reverse(impact_weight(r.impact) * effort_weight(r.effort)));
    candidates
        .into_iter()
        .take(TOP_FIX_LIMIT)
        .map(|r| TopFix {
            key: r.key.clone(),
            module: r.module,
            status: r.status,
            impact: r.impact,
            effort: r.effort,
            why: r.why.clone(),
            fix: r.fix.clone(),
        })
        .collect()
}
