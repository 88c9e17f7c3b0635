//! On-page content checks
//!
//! Presence ratios for titles, meta descriptions, and H1s across the crawled
//! sample, heading-hierarchy sanity, duplicate titles, and thin content.

use super::{
    ratio, ratio_status, AuditContext, CheckDef, CheckOutcome, CheckStatus, Evidence, Module,
    Rating,
};
use serde_json::Value;
use std::collections::BTreeMap;

/// Pages below this body word count are considered thin
const THIN_CONTENT_FLOOR: u32 = 250;

pub(super) fn checks() -> Vec<CheckDef> {
    vec![
        CheckDef {
            key: "title_present",
            module: Module::Onpage,
            impact: Rating::High,
            effort: Rating::Low,
            eval: title_present,
        },
        CheckDef {
            key: "meta_description_present",
            module: Module::Onpage,
            impact: Rating::Medium,
            effort: Rating::Low,
            eval: meta_description_present,
        },
        CheckDef {
            key: "h1_present",
            module: Module::Onpage,
            impact: Rating::Medium,
            effort: Rating::Low,
            eval: h1_present,
        },
        CheckDef {
            key: "heading_hierarchy",
            module: Module::Onpage,
            impact: Rating::Low,
            effort: Rating::Medium,
            eval: heading_hierarchy,
        },
        CheckDef {
            key: "duplicate_titles_across_sample",
            module: Module::Onpage,
            impact: Rating::Medium,
            effort: Rating::Medium,
            eval: duplicate_titles,
        },
        CheckDef {
            key: "thin_content",
            module: Module::Onpage,
            impact: Rating::High,
            effort: Rating::High,
            eval: thin_content,
        },
    ]
}

/// Shared shape of the three presence-ratio checks
fn presence_check(
    ctx: &AuditContext,
    field: &str,
    present: impl Fn(&crate::crawler::PageRecord) -> bool,
    fix: &str,
) -> CheckOutcome {
    let total = ctx.pages.len();
    let with = ctx.pages.iter().filter(|p| present(p)).count();

    if total == 0 {
        return CheckOutcome {
            status: CheckStatus::Warn,
            score: 0.0,
            evidence: Evidence::new().with("pages", 0),
            why: format!("No pages were crawled, so {} coverage is unknown.", field),
            fix: String::new(),
        };
    }

    let r = ratio(with, total);
    let status = ratio_status(r, 0.9, 0.7);
    CheckOutcome {
        status,
        score: r * 100.0,
        evidence: Evidence::new()
            .with("pages", total)
            .with("present", with)
            .with("missing", total - with),
        why: format!("{} of {} crawled pages have a {}.", with, total, field),
        fix: if status == CheckStatus::Pass {
            String::new()
        } else {
            fix.to_string()
        },
    }
}

fn title_present(ctx: &AuditContext) -> CheckOutcome {
    presence_check(
        ctx,
        "title",
        |p| p.title.is_some(),
        "Give every page a unique, descriptive <title>.",
    )
}

fn meta_description_present(ctx: &AuditContext) -> CheckOutcome {
    presence_check(
        ctx,
        "meta description",
        |p| p.meta_description.is_some(),
        "Write a meta description for every page; it is the snippet both \
         search engines and answer engines quote.",
    )
}

fn h1_present(ctx: &AuditContext) -> CheckOutcome {
    presence_check(
        ctx,
        "H1 heading",
        |p| p.h1.is_some(),
        "Add a single H1 to each page stating what the page is about.",
    )
}

/// Exactly one H1 plus at least one H2 is the sane baseline structure
fn heading_hierarchy(ctx: &AuditContext) -> CheckOutcome {
    let total = ctx.pages.len();
    let sane = ctx
        .pages
        .iter()
        .filter(|p| p.heading_counts[0] == 1 && p.heading_counts[1] >= 1)
        .count();

    if total == 0 {
        return CheckOutcome {
            status: CheckStatus::Warn,
            score: 0.0,
            evidence: Evidence::new().with("pages", 0),
            why: "No pages were crawled.".to_string(),
            fix: String::new(),
        };
    }

    let r = ratio(sane, total);
    let status = ratio_status(r, 0.8, 0.5);
    CheckOutcome {
        status,
        score: r * 100.0,
        evidence: Evidence::new().with("pages", total).with("well_structured", sane),
        why: format!(
            "{} of {} pages have exactly one H1 and at least one H2.",
            sane, total
        ),
        fix: if status == CheckStatus::Pass {
            String::new()
        } else {
            "Structure each page with one H1 and H2 subsections.".to_string()
        },
    }
}

fn duplicate_titles(ctx: &AuditContext) -> CheckOutcome {
    let mut by_title: BTreeMap<&str, u32> = BTreeMap::new();
    for page in ctx.pages {
        if let Some(title) = page.title.as_deref() {
            *by_title.entry(title).or_insert(0) += 1;
        }
    }

    let duplicates: Vec<(&str, u32)> = by_title
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .collect();

    if duplicates.is_empty() {
        return CheckOutcome {
            status: CheckStatus::Pass,
            score: 100.0,
            evidence: Evidence::new().with("duplicate_groups", 0),
            why: "Every crawled page has a distinct title.".to_string(),
            fix: String::new(),
        };
    }

    let affected: u32 = duplicates.iter().map(|(_, count)| count).sum();
    let with_title = ctx.pages.iter().filter(|p| p.title.is_some()).count();
    let affected_ratio = ratio(affected as usize, with_title);

    let issues: Vec<Value> = duplicates
        .iter()
        .map(|(title, count)| {
            Value::String(format!("{} pages share the title \"{}\"", count, title))
        })
        .collect();

    let status = if affected_ratio <= 0.3 {
        CheckStatus::Warn
    } else {
        CheckStatus::Fail
    };
    CheckOutcome {
        status,
        score: (1.0 - affected_ratio) * 100.0,
        evidence: Evidence::new()
            .with("duplicate_groups", duplicates.len())
            .with("affected_pages", affected)
            .with("issues", Value::Array(issues)),
        why: format!(
            "{} pages share a title with at least one other page.",
            affected
        ),
        fix: "Rewrite duplicated titles so each page describes its own content.".to_string(),
    }
}

fn thin_content(ctx: &AuditContext) -> CheckOutcome {
    let total = ctx.pages.len();
    let thin = ctx
        .pages
        .iter()
        .filter(|p| p.word_count < THIN_CONTENT_FLOOR)
        .count();

    if total == 0 {
        return CheckOutcome {
            status: CheckStatus::Warn,
            score: 0.0,
            evidence: Evidence::new().with("pages", 0),
            why: "No pages were crawled.".to_string(),
            fix: String::new(),
        };
    }

    let thin_ratio = ratio(thin, total);
    let status = if thin_ratio <= 0.1 {
        CheckStatus::Pass
    } else if thin_ratio <= 0.3 {
        CheckStatus::Warn
    } else {
        CheckStatus::Fail
    };
    CheckOutcome {
        status,
        score: (1.0 - thin_ratio) * 100.0,
        evidence: Evidence::new()
            .with("pages", total)
            .with("thin_pages", thin)
            .with("word_floor", THIN_CONTENT_FLOOR),
        why: format!(
            "{} of {} pages have fewer than {} words.",
            thin, total, THIN_CONTENT_FLOOR
        ),
        fix: if status == CheckStatus::Pass {
            String::new()
        } else {
            "Expand thin pages with substantive content or consolidate them.".to_string()
        },
    }
}
