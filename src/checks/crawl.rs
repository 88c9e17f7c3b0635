//! Crawlability checks
//!
//! Can a crawler reach the site at all, and does the site tell crawlers the
//! right things: HTTPS, robots.txt, sitemap, homepage health, canonical
//! consistency, and the absence of an accidental noindex.

use super::{
    ratio, ratio_status, AuditContext, CheckDef, CheckOutcome, CheckStatus, Evidence, Module,
    Rating,
};
use crate::robots::RobotsRules;
use crate::url::{normalize_url, url_fingerprint};

pub(super) fn checks() -> Vec<CheckDef> {
    vec![
        CheckDef {
            key: "https_enforced",
            module: Module::Crawl,
            impact: Rating::High,
            effort: Rating::Medium,
            eval: https_enforced,
        },
        CheckDef {
            key: "robots_exists_and_allows",
            module: Module::Crawl,
            impact: Rating::High,
            effort: Rating::Low,
            eval: robots_exists_and_allows,
        },
        CheckDef {
            key: "sitemap_exists",
            module: Module::Crawl,
            impact: Rating::Medium,
            effort: Rating::Low,
            eval: sitemap_exists,
        },
        CheckDef {
            key: "homepage_ok",
            module: Module::Crawl,
            impact: Rating::High,
            effort: Rating::Medium,
            eval: homepage_ok,
        },
        CheckDef {
            key: "canonical_consistency",
            module: Module::Crawl,
            impact: Rating::Medium,
            effort: Rating::Medium,
            eval: canonical_consistency,
        },
        CheckDef {
            key: "homepage_noindex",
            module: Module::Crawl,
            impact: Rating::High,
            effort: Rating::Low,
            eval: homepage_noindex,
        },
    ]
}

fn https_enforced(ctx: &AuditContext) -> CheckOutcome {
    let https = ctx.root_url.scheme() == "https";
    let evidence = Evidence::new().with("https", https);
    if https {
        CheckOutcome {
            status: CheckStatus::Pass,
            score: 100.0,
            evidence,
            why: "The site is served over HTTPS.".to_string(),
            fix: String::new(),
        }
    } else {
        CheckOutcome {
            status: CheckStatus::Fail,
            score: 0.0,
            evidence,
            why: "The site is served over plain HTTP.".to_string(),
            fix: "Serve the site over HTTPS and redirect HTTP traffic to it.".to_string(),
        }
    }
}

fn robots_exists_and_allows(ctx: &AuditContext) -> CheckOutcome {
    match &ctx.aux.robots_txt {
        Some(content) => {
            let rules = RobotsRules::from_content(content);
            let allows_crawl = rules.is_allowed("/", ctx.user_agent);
            let evidence = Evidence::new()
                .with("exists", true)
                .with("allows_crawl", allows_crawl);
            if allows_crawl {
                CheckOutcome {
                    status: CheckStatus::Pass,
                    score: 100.0,
                    evidence,
                    why: "robots.txt exists and permits crawling.".to_string(),
                    fix: String::new(),
                }
            } else {
                CheckOutcome {
                    status: CheckStatus::Warn,
                    score: 50.0,
                    evidence,
                    why: "robots.txt blocks crawlers from the site root.".to_string(),
                    fix: "Review robots.txt; a blanket Disallow hides the site from search and \
                          AI crawlers alike."
                        .to_string(),
                }
            }
        }
        None => CheckOutcome {
            status: CheckStatus::Warn,
            score: 40.0,
            evidence: Evidence::new().with("exists", false),
            why: "No robots.txt was found.".to_string(),
            fix: "Add a robots.txt that states your crawl policy and links your sitemap."
                .to_string(),
        },
    }
}

fn sitemap_exists(ctx: &AuditContext) -> CheckOutcome {
    let exists = ctx.aux.sitemap_exists;
    let evidence = Evidence::new().with("exists", exists);
    if exists {
        CheckOutcome {
            status: CheckStatus::Pass,
            score: 100.0,
            evidence,
            why: "A sitemap.xml is available.".to_string(),
            fix: String::new(),
        }
    } else {
        CheckOutcome {
            status: CheckStatus::Fail,
            score: 0.0,
            evidence,
            why: "No sitemap.xml was found.".to_string(),
            fix: "Publish a sitemap.xml so crawlers can discover every page.".to_string(),
        }
    }
}

fn homepage_ok(ctx: &AuditContext) -> CheckOutcome {
    match ctx.homepage() {
        Some(home) if home.status == 200 => CheckOutcome {
            status: CheckStatus::Pass,
            score: 100.0,
            evidence: Evidence::new().with("found", true).with("status", home.status),
            why: "The homepage responds with HTTP 200.".to_string(),
            fix: String::new(),
        },
        Some(home) => CheckOutcome {
            status: CheckStatus::Fail,
            score: 0.0,
            evidence: Evidence::new().with("found", true).with("status", home.status),
            why: format!("The homepage responds with HTTP {}.", home.status),
            fix: "Make the homepage return HTTP 200.".to_string(),
        },
        None => CheckOutcome {
            status: CheckStatus::Fail,
            score: 0.0,
            evidence: Evidence::new().with("found", false),
            why: "The homepage could not be fetched.".to_string(),
            fix: "Ensure the site root is reachable; the crawl never obtained it.".to_string(),
        },
    }
}

/// Compares each page's canonical URL to the page's own URL
///
/// Policy choice: a canonical is "consistent" when it points at the same
/// normalized URL as the page itself. Legitimate cross-path canonicals
/// (pagination collapsing onto page one) count against the ratio, which is
/// why a mid ratio only warns.
fn canonical_consistency(ctx: &AuditContext) -> CheckOutcome {
    let with_canonical: Vec<_> = ctx
        .pages
        .iter()
        .filter_map(|p| p.canonical.as_deref().map(|c| (p, c)))
        .collect();

    if with_canonical.is_empty() {
        return CheckOutcome {
            status: CheckStatus::Warn,
            score: 50.0,
            evidence: Evidence::new().with("pages_with_canonical", 0),
            why: "No crawled page declares a canonical URL.".to_string(),
            fix: "Add rel=canonical tags so duplicate URLs consolidate signals.".to_string(),
        };
    }

    let consistent = with_canonical
        .iter()
        .filter(|(page, canonical)| {
            match (normalize_url(&page.url), normalize_url(canonical)) {
                (Ok(a), Ok(b)) => url_fingerprint(&a) == url_fingerprint(&b),
                _ => false,
            }
        })
        .count();

    let r = ratio(consistent, with_canonical.len());
    let status = ratio_status(r, 0.9, 0.7);
    CheckOutcome {
        status,
        score: r * 100.0,
        evidence: Evidence::new()
            .with("pages_with_canonical", with_canonical.len())
            .with("consistent", consistent),
        why: format!(
            "{} of {} canonical tags point at the page's own URL.",
            consistent,
            with_canonical.len()
        ),
        fix: if status == CheckStatus::Pass {
            String::new()
        } else {
            "Point each page's canonical at its own preferred URL unless it is an \
             intentional duplicate."
                .to_string()
        },
    }
}

fn homepage_noindex(ctx: &AuditContext) -> CheckOutcome {
    match ctx.homepage() {
        Some(home) if home.noindex => CheckOutcome {
            status: CheckStatus::Fail,
            score: 0.0,
            evidence: Evidence::new().with("found", true).with("noindex", true),
            why: "The homepage carries a noindex robots meta tag.".to_string(),
            fix: "Remove the noindex directive from the homepage.".to_string(),
        },
        Some(_) => CheckOutcome {
            status: CheckStatus::Pass,
            score: 100.0,
            evidence: Evidence::new().with("found", true).with("noindex", false),
            why: "The homepage is indexable.".to_string(),
            fix: String::new(),
        },
        None => CheckOutcome {
            status: CheckStatus::Warn,
            score: 50.0,
            evidence: Evidence::new().with("found", false),
            why: "The homepage was not crawled, so its robots meta is unknown.".to_string(),
            fix: String::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn test_robots_disallow_all_warns_at_fifty() {
        let mut owner = CtxOwner::new(vec![page("https://example.com/")]);
        owner.aux.robots_txt = Some("User-agent: *\nDisallow: /".to_string());
        let outcome = robots_exists_and_allows(&owner.ctx());

        assert_eq!(outcome.status, CheckStatus::Warn);
        assert_eq!(outcome.score, 50.0);
        assert_eq!(outcome.evidence.get("exists"), Some(&true.into()));
        assert_eq!(outcome.evidence.get("allows_crawl"), Some(&false.into()));
    }

    #[test]
    fn test_robots_ungrouped_disallow_all_warns_at_fifty() {
        // Real-world robots.txt files sometimes omit the User-agent line
        let mut owner = CtxOwner::new(vec![page("https://example.com/")]);
        owner.aux.robots_txt = Some("Disallow: /".to_string());
        let outcome = robots_exists_and_allows(&owner.ctx());

        assert_eq!(outcome.status, CheckStatus::Warn);
        assert_eq!(outcome.score, 50.0);
        assert_eq!(outcome.evidence.get("exists"), Some(&true.into()));
        assert_eq!(outcome.evidence.get("allows_crawl"), Some(&false.into()));
    }

    #[test]
    fn test_robots_permissive_passes() {
        let mut owner = CtxOwner::new(vec![page("https://example.com/")]);
        owner.aux.robots_txt = Some("User-agent: *\nAllow: /".to_string());
        let outcome = robots_exists_and_allows(&owner.ctx());
        assert_eq!(outcome.status, CheckStatus::Pass);
        assert_eq!(outcome.score, 100.0);
    }

    #[test]
    fn test_robots_missing_warns() {
        let owner = CtxOwner::new(vec![page("https://example.com/")]);
        let outcome = robots_exists_and_allows(&owner.ctx());
        assert_eq!(outcome.status, CheckStatus::Warn);
        assert_eq!(outcome.evidence.get("exists"), Some(&false.into()));
    }

    #[test]
    fn test_https_enforced_on_http_root() {
        let mut owner = CtxOwner::new(vec![]);
        owner.root_url = url::Url::parse("http://example.com/").unwrap();
        let outcome = https_enforced(&owner.ctx());
        assert_eq!(outcome.status, CheckStatus::Fail);
        assert!(!outcome.fix.is_empty());
    }

    #[test]
    fn test_homepage_ok_variants() {
        let owner = CtxOwner::new(vec![page("https://example.com/")]);
        assert_eq!(homepage_ok(&owner.ctx()).status, CheckStatus::Pass);

        let mut broken = page("https://example.com/");
        broken.status = 500;
        let owner = CtxOwner::new(vec![broken]);
        assert_eq!(homepage_ok(&owner.ctx()).status, CheckStatus::Fail);

        let owner = CtxOwner::new(vec![page("https://example.com/about")]);
        let outcome = homepage_ok(&owner.ctx());
        assert_eq!(outcome.status, CheckStatus::Fail);
        assert_eq!(outcome.evidence.get("found"), Some(&false.into()));
    }

    #[test]
    fn test_canonical_consistency_ratio() {
        let mut a = page("https://example.com/");
        a.canonical = Some("https://example.com/".to_string());
        let mut b = page("https://example.com/blog/page-2");
        b.canonical = Some("https://example.com/blog".to_string());
        let owner = CtxOwner::new(vec![a, b]);

        let outcome = canonical_consistency(&owner.ctx());
        assert_eq!(outcome.score, 50.0);
        assert_eq!(outcome.status, CheckStatus::Fail);
        assert_eq!(outcome.evidence.get("consistent"), Some(&1u32.into()));
    }

    #[test]
    fn test_canonical_scheme_variance_is_consistent() {
        // http canonical for an https page dedupes to the same fingerprint
        let mut a = page("https://example.com/page");
        a.canonical = Some("http://www.example.com/page".to_string());
        let owner = CtxOwner::new(vec![a]);
        assert_eq!(canonical_consistency(&owner.ctx()).status, CheckStatus::Pass);
    }

    #[test]
    fn test_homepage_noindex() {
        let mut home = page("https://example.com/");
        home.noindex = true;
        let owner = CtxOwner::new(vec![home]);
        let outcome = homepage_noindex(&owner.ctx());
        assert_eq!(outcome.status, CheckStatus::Fail);
        assert_eq!(outcome.score, 0.0);
    }
}
