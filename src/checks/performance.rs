//! Performance checks
//!
//! Static proxies derived from crawled markup. Nothing here executes
//! pages or measures real timings; `mobile_speed` is a placeholder that
//! always reports an unmeasured warning.

use super::{AuditContext, CheckDef, CheckOutcome, CheckStatus, Evidence, Module, Rating};

pub(super) fn checks() -> Vec<CheckDef> {
    vec![
        CheckDef {
            key: "image_weight",
            module: Module::Performance,
            impact: Rating::Medium,
            effort: Rating::Medium,
            eval: image_weight,
        },
        CheckDef {
            key: "render_blocking_assets",
            module: Module::Performance,
            impact: Rating::Medium,
            effort: Rating::Medium,
            eval: render_blocking_assets,
        },
        CheckDef {
            key: "mobile_speed",
            module: Module::Performance,
            impact: Rating::Medium,
            effort: Rating::High,
            eval: mobile_speed,
        },
    ]
}

fn image_weight(ctx: &AuditContext) -> CheckOutcome {
    if ctx.pages.is_empty() {
        return CheckOutcome {
            status: CheckStatus::Warn,
            score: 0.0,
            evidence: Evidence::new().with("pages", 0),
            why: "No pages were crawled, so image usage cannot be judged.".to_string(),
            fix: String::new(),
        };
    }

    let total_images: u32 = ctx.pages.iter().map(|p| p.image_count).sum();
    let with_alt: u32 = ctx.pages.iter().map(|p| p.images_with_alt).sum();
    let avg = total_images as f64 / ctx.pages.len() as f64;
    let alt_ratio = if total_images == 0 {
        1.0
    } else {
        with_alt as f64 / total_images as f64
    };

    let evidence = Evidence::new()
        .with("avg_images_per_page", (avg * 10.0).round() / 10.0)
        .with("alt_coverage", (alt_ratio * 100.0).round() / 100.0);

    let (status, score) = if avg <= 15.0 {
        (CheckStatus::Pass, 100.0)
    } else if avg <= 30.0 {
        (CheckStatus::Warn, 60.0)
    } else {
        (CheckStatus::Fail, 20.0)
    };

    CheckOutcome {
        status,
        score,
        evidence,
        why: format!("Pages average {:.1} images each.", avg),
        fix: if status == CheckStatus::Pass {
            String::new()
        } else {
            "Trim heavy pages: lazy-load below-the-fold images and serve modern formats \
             at appropriate sizes."
                .to_string()
        },
    }
}

fn render_blocking_assets(ctx: &AuditContext) -> CheckOutcome {
    let Some(home) = ctx.homepage() else {
        return CheckOutcome {
            status: CheckStatus::Warn,
            score: 50.0,
            evidence: Evidence::new().with("homepage_found", false),
            why: "The homepage was not crawled, so render-blocking assets are unknown."
                .to_string(),
            fix: String::new(),
        };
    };

    let blocking = home.stylesheet_count + home.blocking_script_count;
    let evidence = Evidence::new()
        .with("stylesheets", home.stylesheet_count)
        .with("blocking_scripts", home.blocking_script_count);

    let (status, score) = if blocking <= 5 {
        (CheckStatus::Pass, 100.0)
    } else if blocking <= 12 {
        (CheckStatus::Warn, 60.0)
    } else {
        (CheckStatus::Fail, 20.0)
    };

    CheckOutcome {
        status,
        score,
        evidence,
        why: format!(
            "The homepage loads {} render-blocking assets ({} stylesheets, {} synchronous scripts).",
            blocking, home.stylesheet_count, home.blocking_script_count
        ),
        fix: if status == CheckStatus::Pass {
            String::new()
        } else {
            "Bundle stylesheets and add async or defer to scripts that are not needed \
             during first paint."
                .to_string()
        },
    }
}

/// Real field data needs a lab or CrUX integration, which the engine
/// deliberately does not ship. The empty fix keeps this placeholder out
/// of the prioritized fix list.
fn mobile_speed(_ctx: &AuditContext) -> CheckOutcome {
    CheckOutcome {
        status: CheckStatus::Warn,
        score: 50.0,
        evidence: Evidence::new().with("measured", false),
        why: "Mobile speed is not measured by the static crawl.".to_string(),
        fix: String::new(),
    }
}
