//! AI-readiness checks
//!
//! Signals that answer engines look for beyond classic SEO: llms.txt,
//! machine-discoverable pricing and FAQ content, and content freshness.

use super::{ratio, AuditContext, CheckDef, CheckOutcome, CheckStatus, Evidence, Module, Rating};
use chrono::Duration;

const PRICING_PATTERN: &str = r"/(pricing|plans|prices|shop|store|buy)(/|$)";
const FAQ_PATTERN: &str = r"/(faq|faqs|help|support|questions)(/|$)";

/// Business types for which a pricing page is required rather than optional
const PRICING_REQUIRED_TYPES: &[&str] = &["saas", "ecommerce", "e-commerce"];

pub(super) fn checks() -> Vec<CheckDef> {
    vec![
        CheckDef {
            key: "llms_txt_exists",
            module: Module::AiReadiness,
            impact: Rating::High,
            effort: Rating::Low,
            eval: llms_txt_exists,
        },
        CheckDef {
            key: "llms_txt_richness",
            module: Module::AiReadiness,
            impact: Rating::Medium,
            effort: Rating::Low,
            eval: llms_txt_richness,
        },
        CheckDef {
            key: "pricing_page_exists",
            module: Module::AiReadiness,
            impact: Rating::Medium,
            effort: Rating::Medium,
            eval: pricing_page_exists,
        },
        CheckDef {
            key: "faq_present",
            module: Module::AiReadiness,
            impact: Rating::Medium,
            effort: Rating::Medium,
            eval: faq_present,
        },
        CheckDef {
            key: "content_freshness",
            module: Module::AiReadiness,
            impact: Rating::Medium,
            effort: Rating::High,
            eval: content_freshness,
        },
    ]
}

fn llms_txt_exists(ctx: &AuditContext) -> CheckOutcome {
    let exists = ctx.aux.llms_txt.is_some();
    let evidence = Evidence::new().with("exists", exists);
    if exists {
        CheckOutcome {
            status: CheckStatus::Pass,
            score: 100.0,
            evidence,
            why: "An llms.txt file is available.".to_string(),
            fix: String::new(),
        }
    } else {
        CheckOutcome {
            status: CheckStatus::Fail,
            score: 0.0,
            evidence,
            why: "No llms.txt file was found.".to_string(),
            fix: "Publish an llms.txt summarizing the site for AI crawlers.".to_string(),
        }
    }
}

fn llms_txt_richness(ctx: &AuditContext) -> CheckOutcome {
    let Some(content) = ctx.aux.llms_txt.as_deref() else {
        return CheckOutcome {
            status: CheckStatus::Fail,
            score: 0.0,
            evidence: Evidence::new().with("exists", false),
            why: "There is no llms.txt to assess.".to_string(),
            fix: "Publish an llms.txt before worrying about its depth.".to_string(),
        };
    };

    let lines = content
        .lines()
        .filter(|l| {
            let trimmed = l.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .count();
    let chars = content.chars().count();
    let evidence = Evidence::new()
        .with("exists", true)
        .with("content_lines", lines)
        .with("chars", chars);

    if lines >= 10 || chars >= 400 {
        CheckOutcome {
            status: CheckStatus::Pass,
            score: 100.0,
            evidence,
            why: format!("llms.txt has {} content lines.", lines),
            fix: String::new(),
        }
    } else if lines >= 3 {
        CheckOutcome {
            status: CheckStatus::Warn,
            score: 60.0,
            evidence,
            why: format!("llms.txt is sparse ({} content lines).", lines),
            fix: "Expand llms.txt with page summaries and key links.".to_string(),
        }
    } else {
        CheckOutcome {
            status: CheckStatus::Fail,
            score: 20.0,
            evidence,
            why: "llms.txt is nearly empty.".to_string(),
            fix: "Fill llms.txt with a real summary of the site's content.".to_string(),
        }
    }
}

fn pricing_page_exists(ctx: &AuditContext) -> CheckOutcome {
    let required = ctx
        .business_type
        .map(|bt| PRICING_REQUIRED_TYPES.contains(&bt.to_lowercase().as_str()))
        .unwrap_or(false);
    let found = ctx.any_path_matches(PRICING_PATTERN);
    let evidence = Evidence::new().with("found", found).with("required", required);

    if found {
        CheckOutcome {
            status: CheckStatus::Pass,
            score: 100.0,
            evidence,
            why: "A pricing or plans page is linked from the crawled sample.".to_string(),
            fix: String::new(),
        }
    } else if required {
        CheckOutcome {
            status: CheckStatus::Fail,
            score: 0.0,
            evidence,
            why: "No pricing page was found, and this business type needs one.".to_string(),
            fix: "Publish a crawlable pricing page; answer engines quote prices from it."
                .to_string(),
        }
    } else {
        CheckOutcome {
            status: CheckStatus::Warn,
            score: 50.0,
            evidence,
            why: "No pricing page was found (optional for this business type).".to_string(),
            fix: "Consider a public pricing or plans page.".to_string(),
        }
    }
}

fn faq_present(ctx: &AuditContext) -> CheckOutcome {
    let by_url = ctx.any_path_matches(FAQ_PATTERN);
    let by_schema = ctx
        .pages
        .iter()
        .any(|p| p.schema_types.iter().any(|t| t == "FAQPage"));
    let evidence = Evidence::new()
        .with("faq_url", by_url)
        .with("faq_schema", by_schema);

    if by_url || by_schema {
        CheckOutcome {
            status: CheckStatus::Pass,
            score: 100.0,
            evidence,
            why: "FAQ content is discoverable by URL or FAQPage schema.".to_string(),
            fix: String::new(),
        }
    } else {
        CheckOutcome {
            status: CheckStatus::Fail,
            score: 0.0,
            evidence,
            why: "No FAQ page or FAQPage structured data was found.".to_string(),
            fix: "Add an FAQ page with FAQPage JSON-LD; question-answer pairs are prime \
                  answer-engine material."
                .to_string(),
        }
    }
}

/// Share of pages with modification metadata inside the 6/12-month windows
fn content_freshness(ctx: &AuditContext) -> CheckOutcome {
    let total = ctx.pages.len();
    if total == 0 {
        return CheckOutcome {
            status: CheckStatus::Warn,
            score: 0.0,
            evidence: Evidence::new().with("pages", 0),
            why: "No pages were crawled.".to_string(),
            fix: String::new(),
        };
    }

    let six_months = ctx.now - Duration::days(182);
    let twelve_months = ctx.now - Duration::days(365);

    let with_dates = ctx.pages.iter().filter(|p| p.modified_at.is_some()).count();
    let fresh_6 = ctx
        .pages
        .iter()
        .filter(|p| p.modified_at.is_some_and(|ts| ts >= six_months))
        .count();
    let fresh_12 = ctx
        .pages
        .iter()
        .filter(|p| p.modified_at.is_some_and(|ts| ts >= twelve_months))
        .count();

    let r6 = ratio(fresh_6, total);
    let r12 = ratio(fresh_12, total);
    let evidence = Evidence::new()
        .with("pages", total)
        .with("with_dates", with_dates)
        .with("fresh_6mo", fresh_6)
        .with("fresh_12mo", fresh_12);

    let status = if r6 >= 0.3 {
        CheckStatus::Pass
    } else if r12 >= 0.3 {
        CheckStatus::Warn
    } else {
        CheckStatus::Fail
    };
    CheckOutcome {
        status,
        score: r6 * 100.0,
        evidence,
        why: format!(
            "{} of {} pages show a modification date within six months.",
            fresh_6, total
        ),
        fix: if status == CheckStatus::Pass {
            String::new()
        } else {
            "Expose modification dates (article:modified_time or dateModified) and keep \
             key pages updated."
                .to_string()
        },
    }
}
