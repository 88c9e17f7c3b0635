//! Off-site presence checks
//!
//! Signals that tie the site to an identity elsewhere: linked social
//! profiles and brand naming on the homepage.

use super::{AuditContext, CheckDef, CheckOutcome, CheckStatus, Evidence, Module, Rating};
use serde_json::Value;

pub(super) fn checks() -> Vec<CheckDef> {
    vec![
        CheckDef {
            key: "social_profiles_present",
            module: Module::Offsite,
            impact: Rating::Medium,
            effort: Rating::Low,
            eval: social_profiles_present,
        },
        CheckDef {
            key: "brand_in_homepage",
            module: Module::Offsite,
            impact: Rating::Medium,
            effort: Rating::Low,
            eval: brand_in_homepage,
        },
    ]
}

fn social_profiles_present(ctx: &AuditContext) -> CheckOutcome {
    let mut profiles: Vec<String> = ctx
        .pages
        .iter()
        .flat_map(|p| p.social_links.iter().cloned())
        .collect();
    profiles.sort();
    profiles.dedup();

    let evidence = Evidence::new().with(
        "profiles",
        Value::Array(profiles.iter().cloned().map(Value::String).collect()),
    );

    if profiles.is_empty() {
        CheckOutcome {
            status: CheckStatus::Fail,
            score: 0.0,
            evidence,
            why: "No social profile links were found on any crawled page.".to_string(),
            fix: "Link your social profiles from the site (footer is fine) so engines can \
                  connect the brand across the web."
                .to_string(),
        }
    } else {
        CheckOutcome {
            status: CheckStatus::Pass,
            score: 100.0,
            evidence,
            why: format!("{} distinct social profiles are linked.", profiles.len()),
            fix: String::new(),
        }
    }
}

fn brand_in_homepage(ctx: &AuditContext) -> CheckOutcome {
    let brand = match ctx.brand_name {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        // Fall back to the first label of the root host ("acme" in acme.io)
        _ => ctx
            .root_url
            .host_str()
            .unwrap_or_default()
            .trim_start_matches("www.")
            .split('.')
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    let Some(home) = ctx.homepage() else {
        return CheckOutcome {
            status: CheckStatus::Warn,
            score: 50.0,
            evidence: Evidence::new().with("homepage_found", false),
            why: "The homepage was not crawled, so brand naming is unknown.".to_string(),
            fix: String::new(),
        };
    };

    let needle = brand.to_lowercase();
    let in_title = home
        .title
        .as_deref()
        .is_some_and(|t| t.to_lowercase().contains(&needle));
    let in_h1 = home
        .h1
        .as_deref()
        .is_some_and(|h| h.to_lowercase().contains(&needle));
    let evidence = Evidence::new()
        .with("brand", brand.clone())
        .with("in_title", in_title)
        .with("in_h1", in_h1);

    if in_title || in_h1 {
        CheckOutcome {
            status: CheckStatus::Pass,
            score: 100.0,
            evidence,
            why: format!("The brand \"{}\" appears in the homepage title or H1.", brand),
            fix: String::new(),
        }
    } else {
        CheckOutcome {
            status: CheckStatus::Fail,
            score: 0.0,
            evidence,
            why: format!(
                "The brand \"{}\" appears in neither the homepage title nor its H1.",
                brand
            ),
            fix: "Put the brand name in the homepage title so engines associate the name \
                  with the domain."
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn test_social_profiles_collected_across_pages() {
        let mut a = page("https://example.com/");
        a.social_links = vec!["https://x.com/acme".to_string()];
        let mut b = page("https://example.com/about");
        b.social_links = vec![
            "https://x.com/acme".to_string(),
            "https://www.linkedin.com/company/acme".to_string(),
        ];
        let owner = CtxOwner::new(vec![a, b]);

        let outcome = social_profiles_present(&owner.ctx());
        assert_eq!(outcome.status, CheckStatus::Pass);
        let profiles = outcome.evidence.get("profiles").unwrap().as_array().unwrap();
        assert_eq!(profiles.len(), 2);
    }

    #[test]
    fn test_no_social_profiles_fails() {
        let owner = CtxOwner::new(vec![page("https://example.com/")]);
        assert_eq!(
            social_profiles_present(&owner.ctx()).status,
            CheckStatus::Fail
        );
    }

    #[test]
    fn test_brand_from_explicit_name() {
        let mut home = page("https://example.com/");
        home.title = Some("Acme Widgets | Home".to_string());
        let owner = CtxOwner::new(vec![home]);
        let mut ctx = owner.ctx();
        ctx.brand_name = Some("Acme Widgets");

        assert_eq!(brand_in_homepage(&ctx).status, CheckStatus::Pass);
    }

    #[test]
    fn test_brand_derived_from_host() {
        // No explicit brand; "example" comes from the host
        let mut home = page("https://example.com/");
        home.title = Some("Example, the best site".to_string());
        let owner = CtxOwner::new(vec![home]);
        assert_eq!(brand_in_homepage(&owner.ctx()).status, CheckStatus::Pass);
    }

    #[test]
    fn test_brand_absent_fails() {
        let mut home = page("https://example.com/");
        home.title = Some("Welcome".to_string());
        home.h1 = Some("Hello".to_string());
        let owner = CtxOwner::new(vec![home]);
        assert_eq!(brand_in_homepage(&owner.ctx()).status, CheckStatus::Fail);
    }
}
