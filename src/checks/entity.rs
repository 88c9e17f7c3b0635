//! Entity and trust checks
//!
//! Does the site tell machines who is behind it: organization structured
//! data, about/contact pages, and legal policy pages.

use super::{AuditContext, CheckDef, CheckOutcome, CheckStatus, Evidence, Module, Rating};

const ABOUT_PATTERN: &str = r"/(about|about-us|company|team|who-we-are)(/|$)";
const CONTACT_PATTERN: &str = r"/(contact|contact-us|kontakt)(/|$)";
const PRIVACY_PATTERN: &str = r"/(privacy|privacy-policy|datenschutz)(/|$)";
const TERMS_PATTERN: &str = r"/(terms|terms-of-service|terms-and-conditions|tos|legal|imprint)(/|$)";

pub(super) fn checks() -> Vec<CheckDef> {
    vec![
        CheckDef {
            key: "organization_schema_present",
            module: Module::Entity,
            impact: Rating::High,
            effort: Rating::Medium,
            eval: organization_schema_present,
        },
        CheckDef {
            key: "any_schema_present",
            module: Module::Entity,
            impact: Rating::Medium,
            effort: Rating::Medium,
            eval: any_schema_present,
        },
        CheckDef {
            key: "about_page_exists",
            module: Module::Entity,
            impact: Rating::Medium,
            effort: Rating::Medium,
            eval: about_page_exists,
        },
        CheckDef {
            key: "contact_page_exists",
            module: Module::Entity,
            impact: Rating::Medium,
            effort: Rating::Low,
            eval: contact_page_exists,
        },
        CheckDef {
            key: "policy_pages_present",
            module: Module::Entity,
            impact: Rating::Low,
            effort: Rating::Low,
            eval: policy_pages_present,
        },
    ]
}

fn organization_schema_present(ctx: &AuditContext) -> CheckOutcome {
    let found = ctx.pages.iter().any(|p| {
        p.schema_types
            .iter()
            .any(|t| t == "Organization" || t == "LocalBusiness")
    });
    if found {
        CheckOutcome {
            status: CheckStatus::Pass,
            score: 100.0,
            evidence: Evidence::new().with("found", true),
            why: "Organization or LocalBusiness structured data is present.".to_string(),
            fix: String::new(),
        }
    } else {
        CheckOutcome {
            status: CheckStatus::Fail,
            score: 0.0,
            evidence: Evidence::new().with("found", false),
            why: "No page declares Organization or LocalBusiness structured data.".to_string(),
            fix: "Add Organization JSON-LD (name, logo, sameAs) to the homepage.".to_string(),
        }
    }
}

fn any_schema_present(ctx: &AuditContext) -> CheckOutcome {
    let with_schema = ctx.pages.iter().filter(|p| p.has_schema).count();
    let evidence = Evidence::new()
        .with("pages", ctx.pages.len())
        .with("pages_with_schema", with_schema);
    if with_schema > 0 {
        CheckOutcome {
            status: CheckStatus::Pass,
            score: 100.0,
            evidence,
            why: format!("{} crawled pages carry structured data.", with_schema),
            fix: String::new(),
        }
    } else {
        CheckOutcome {
            status: CheckStatus::Fail,
            score: 0.0,
            evidence,
            why: "No crawled page carries any structured data.".to_string(),
            fix: "Add JSON-LD structured data so machines can read the site's entities."
                .to_string(),
        }
    }
}

fn page_exists_check(
    ctx: &AuditContext,
    pattern: &str,
    label: &str,
    fix: &str,
) -> CheckOutcome {
    let found = ctx.any_path_matches(pattern);
    let evidence = Evidence::new().with("found", found);
    if found {
        CheckOutcome {
            status: CheckStatus::Pass,
            score: 100.0,
            evidence,
            why: format!("A {} page is linked from the crawled sample.", label),
            fix: String::new(),
        }
    } else {
        CheckOutcome {
            status: CheckStatus::Fail,
            score: 0.0,
            evidence,
            why: format!("No {} page was found in the crawled sample.", label),
            fix: fix.to_string(),
        }
    }
}

fn about_page_exists(ctx: &AuditContext) -> CheckOutcome {
    page_exists_check(
        ctx,
        ABOUT_PATTERN,
        "about",
        "Publish an About page describing who runs the site.",
    )
}

fn contact_page_exists(ctx: &AuditContext) -> CheckOutcome {
    page_exists_check(
        ctx,
        CONTACT_PATTERN,
        "contact",
        "Publish a Contact page with a reachable address.",
    )
}

fn policy_pages_present(ctx: &AuditContext) -> CheckOutcome {
    let privacy = ctx.any_path_matches(PRIVACY_PATTERN);
    let terms = ctx.any_path_matches(TERMS_PATTERN);
    let evidence = Evidence::new().with("privacy", privacy).with("terms", terms);

    match (privacy, terms) {
        (true, true) => CheckOutcome {
            status: CheckStatus::Pass,
            score: 100.0,
            evidence,
            why: "Privacy and terms pages are both present.".to_string(),
            fix: String::new(),
        },
        (false, false) => CheckOutcome {
            status: CheckStatus::Fail,
            score: 0.0,
            evidence,
            why: "Neither a privacy policy nor terms page was found.".to_string(),
            fix: "Publish privacy and terms pages; they are baseline trust signals.".to_string(),
        },
        _ => CheckOutcome {
            status: CheckStatus::Warn,
            score: 50.0,
            evidence,
            why: "Only one of the privacy/terms pair was found.".to_string(),
            fix: "Publish the missing policy page.".to_string(),
        },
    }
}
