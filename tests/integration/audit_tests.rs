//! Integration tests for the audit engine
//!
//! These tests use wiremock to create mock HTTP servers and exercise the
//! full init/continue/score cycle end-to-end against a SQLite database.

use sitegauge::audit::{continue_audit, init_audit, score_audit, InitRequest};
use sitegauge::checks::CheckStatus;
use sitegauge::config::EngineConfig;
use sitegauge::crawler::{build_http_client, CancelFlag, CrawlStatus};
use sitegauge::storage::{AuditStatus, SqliteStorage, Storage};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config() -> EngineConfig {
    EngineConfig {
        fetch_timeout_secs: 5,
        ..EngineConfig::default()
    }
}

fn request_for(server: &MockServer, limit: u32) -> InitRequest {
    InitRequest {
        domain: server.uri(),
        brand_name: Some("Acme".to_string()),
        business_type: Some("saas".to_string()),
        crawl_limit: Some(limit),
        allow_subdomains: false,
    }
}

/// Mounts an HTML page at the given path
async fn serve_page(server: &MockServer, route: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html; charset=utf-8"))
        .mount(server)
        .await;
}

fn html_page(title: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|l| format!("<a href=\"{}\">{}</a>", l, l))
        .collect();
    format!(
        "<html><head><title>{title}</title>\
         <meta name=\"description\" content=\"About {title}\"></head>\
         <body><h1>{title}</h1><p>Some body copy about {title}.</p>{anchors}</body></html>"
    )
}

/// Runs continue until the crawl reports done
async fn crawl_to_completion(
    storage: &mut SqliteStorage,
    config: &EngineConfig,
    audit_id: i64,
) -> u32 {
    let client = build_http_client(config).unwrap();
    let cancel = CancelFlag::new();
    for _ in 0..50 {
        let batch = continue_audit(storage, &client, config, audit_id, &cancel)
            .await
            .unwrap();
        if batch.done {
            return batch.crawled_count;
        }
    }
    panic!("crawl did not finish within 50 batches");
}

#[tokio::test]
async fn test_full_audit_cycle() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nAllow: /"))
        .mount(&server)
        .await;

    let home = format!(
        "<html><head><title>Acme Widgets</title>\
         <meta name=\"description\" content=\"Widgets by Acme\">\
         <script type=\"application/ld+json\">\
         {{\"@context\":\"https://schema.org\",\"@type\":\"Organization\",\"name\":\"Acme\"}}\
         </script></head>\
         <body><h1>Acme</h1><p>Widgets for everyone.</p>\
         <a href=\"/about\">About</a><a href=\"/contact\">Contact</a></body></html>"
    );
    serve_page(&server, "/", home).await;
    serve_page(&server, "/about", html_page("About Acme", &["/", "/contact"])).await;
    serve_page(&server, "/contact", html_page("Contact Acme", &["/"])).await;

    let dir = tempfile::tempdir().unwrap();
    let mut storage = SqliteStorage::new(&dir.path().join("audit.db")).unwrap();
    let config = test_config();
    let client = build_http_client(&config).unwrap();

    let init = init_audit(&mut storage, &client, &config, &request_for(&server, 10))
        .await
        .unwrap();
    assert!(init.robots_found);
    assert!(!init.sitemap_found);
    assert_eq!(init.queue_size, 1);

    let crawled = crawl_to_completion(&mut storage, &config, init.audit_id).await;
    assert_eq!(crawled, 3);

    let score = score_audit(&mut storage, &config, init.audit_id, chrono::Utc::now()).unwrap();
    assert_eq!(score.pages_crawled, 3);
    assert_eq!(score.checks.len(), 27);
    assert_eq!(score.module_scores.len(), 6);
    assert!(score.overall_score > 0.0 && score.overall_score <= 100.0);
    assert!(score.top_fixes.len() <= 7);

    let by_key = |key: &str| score.checks.iter().find(|c| c.key == key).unwrap();
    // The mock server speaks plain http, so this one must fail
    assert_eq!(by_key("https_enforced").status, CheckStatus::Fail);
    assert_eq!(by_key("robots_exists_and_allows").status, CheckStatus::Pass);
    assert_eq!(by_key("sitemap_exists").status, CheckStatus::Fail);
    assert_eq!(by_key("homepage_ok").status, CheckStatus::Pass);
    assert_eq!(by_key("title_present").status, CheckStatus::Pass);
    assert_eq!(by_key("organization_schema_present").status, CheckStatus::Pass);
    assert_eq!(by_key("about_page_exists").status, CheckStatus::Pass);
    assert_eq!(by_key("contact_page_exists").status, CheckStatus::Pass);
    assert_eq!(by_key("brand_in_homepage").status, CheckStatus::Pass);
    assert_eq!(by_key("llms_txt_exists").status, CheckStatus::Fail);

    let audit = storage.get_audit(init.audit_id).unwrap();
    assert_eq!(audit.status, AuditStatus::Completed);
    assert!(audit.overall_score.is_some());
}

#[tokio::test]
async fn test_crawl_limit_bounds_the_crawl() {
    let server = MockServer::start().await;

    let links: Vec<String> = (1..=10).map(|i| format!("/page{}", i)).collect();
    let link_refs: Vec<&str> = links.iter().map(String::as_str).collect();
    serve_page(&server, "/", html_page("Home", &link_refs)).await;
    for link in &links {
        serve_page(&server, link, html_page(link, &["/"])).await;
    }

    let dir = tempfile::tempdir().unwrap();
    let mut storage = SqliteStorage::new(&dir.path().join("audit.db")).unwrap();
    let config = test_config();
    let client = build_http_client(&config).unwrap();

    let init = init_audit(&mut storage, &client, &config, &request_for(&server, 5))
        .await
        .unwrap();
    let crawled = crawl_to_completion(&mut storage, &config, init.audit_id).await;

    assert_eq!(crawled, 5);
    assert_eq!(storage.count_pages(init.audit_id).unwrap(), 5);

    // The remaining discoveries are still queued, just out of budget
    let state = storage.load_crawl_state(init.audit_id).unwrap().unwrap();
    assert_eq!(state.crawled_count, 5);
    assert!(state.queue_size() > 0);
}

#[tokio::test]
async fn test_urls_are_never_fetched_twice() {
    let server = MockServer::start().await;

    // Every page links back to every other page
    serve_page(&server, "/", html_page("Home", &["/a", "/b", "/"])).await;
    serve_page(&server, "/a", html_page("A", &["/", "/b", "/a"])).await;
    serve_page(&server, "/b", html_page("B", &["/", "/a", "/b"])).await;

    let dir = tempfile::tempdir().unwrap();
    let mut storage = SqliteStorage::new(&dir.path().join("audit.db")).unwrap();
    let config = test_config();
    let client = build_http_client(&config).unwrap();

    let init = init_audit(&mut storage, &client, &config, &request_for(&server, 20))
        .await
        .unwrap();
    let crawled = crawl_to_completion(&mut storage, &config, init.audit_id).await;

    // Three distinct URLs, despite the dense cross-linking
    assert_eq!(crawled, 3);
    let pages = storage.load_pages(init.audit_id).unwrap();
    let mut urls: Vec<&str> = pages.iter().map(|p| p.url.as_str()).collect();
    urls.sort();
    urls.dedup();
    assert_eq!(urls.len(), 3);
}

#[tokio::test]
async fn test_audit_resumes_across_storage_reopens() {
    let server = MockServer::start().await;

    serve_page(&server, "/", html_page("Home", &["/a", "/b", "/c"])).await;
    serve_page(&server, "/a", html_page("A", &[])).await;
    serve_page(&server, "/b", html_page("B", &[])).await;
    serve_page(&server, "/c", html_page("C", &[])).await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("audit.db");
    let config = EngineConfig {
        batch_size: 1,
        ..test_config()
    };
    let client = build_http_client(&config).unwrap();
    let cancel = CancelFlag::new();

    let audit_id = {
        let mut storage = SqliteStorage::new(&db_path).unwrap();
        let init = init_audit(&mut storage, &client, &config, &request_for(&server, 10))
            .await
            .unwrap();
        // One single-page batch, then drop the storage handle entirely
        let batch = continue_audit(&mut storage, &client, &config, init.audit_id, &cancel)
            .await
            .unwrap();
        assert_eq!(batch.pages_this_batch, 1);
        assert!(!batch.done);
        init.audit_id
    };

    // A fresh process picks up from the snapshot
    let mut storage = SqliteStorage::new(&db_path).unwrap();
    let crawled = crawl_to_completion(&mut storage, &config, audit_id).await;

    assert_eq!(crawled, 4);
    assert_eq!(storage.count_pages(audit_id).unwrap(), 4);
    let state = storage.load_crawl_state(audit_id).unwrap().unwrap();
    assert!(state.status.is_terminal());
}

#[tokio::test]
async fn test_cancel_mid_batch_keeps_finished_pages_and_requeues_the_rest() {
    let server = MockServer::start().await;

    serve_page(&server, "/", html_page("Home", &["/slow", "/a", "/b"])).await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(html_page("Slow", &[]), "text/html; charset=utf-8")
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&server)
        .await;
    serve_page(&server, "/a", html_page("A", &[])).await;
    serve_page(&server, "/b", html_page("B", &[])).await;

    let dir = tempfile::tempdir().unwrap();
    let mut storage = SqliteStorage::new(&dir.path().join("audit.db")).unwrap();
    // One fetch at a time, so /slow holds the pool while the flag flips
    let config = EngineConfig {
        max_concurrent_fetches: 1,
        ..test_config()
    };
    let client = build_http_client(&config).unwrap();
    let cancel = CancelFlag::new();

    let init = init_audit(&mut storage, &client, &config, &request_for(&server, 10))
        .await
        .unwrap();
    let first = continue_audit(&mut storage, &client, &config, init.audit_id, &cancel)
        .await
        .unwrap();
    assert_eq!(first.pages_this_batch, 1);

    // Cancel while /slow is still in flight; /a and /b wait behind it
    let flag = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        flag.cancel();
    });
    let batch = continue_audit(&mut storage, &client, &config, init.audit_id, &cancel)
        .await
        .unwrap();

    // The in-flight fetch finished and was kept; the rest never dispatched
    assert_eq!(batch.pages_this_batch, 1);
    assert_eq!(batch.crawled_count, 2);
    assert_eq!(batch.queue_size, 2);
    assert!(!batch.done);
    let pages = storage.load_pages(init.audit_id).unwrap();
    assert!(pages.iter().any(|p| p.url.ends_with("/slow")));

    // The undispatched URLs sit at the head of the frontier, in order
    let mut state = storage.load_crawl_state(init.audit_id).unwrap().unwrap();
    assert!(state.pop_next().unwrap().ends_with("/a"));
    assert!(state.pop_next().unwrap().ends_with("/b"));

    // A fresh flag resumes from the snapshot and finishes the crawl
    let crawled = crawl_to_completion(&mut storage, &config, init.audit_id).await;
    assert_eq!(crawled, 4);
    assert_eq!(storage.count_pages(init.audit_id).unwrap(), 4);
}

#[tokio::test]
async fn test_unreachable_site_fails_the_audit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut storage = SqliteStorage::new(&dir.path().join("audit.db")).unwrap();
    let config = test_config();
    let client = build_http_client(&config).unwrap();
    let cancel = CancelFlag::new();

    let init = init_audit(&mut storage, &client, &config, &request_for(&server, 10))
        .await
        .unwrap();
    let batch = continue_audit(&mut storage, &client, &config, init.audit_id, &cancel)
        .await
        .unwrap();

    // The crawl is over, but it never produced a page
    assert!(batch.done);
    assert_eq!(batch.pages_this_batch, 0);
    let state = storage.load_crawl_state(init.audit_id).unwrap().unwrap();
    assert_eq!(state.status, CrawlStatus::Error);
    assert_eq!(storage.get_audit(init.audit_id).unwrap().status, AuditStatus::Failed);

    // A provisional score is still available, but never flips the audit
    // back to completed
    let score = score_audit(&mut storage, &config, init.audit_id, chrono::Utc::now()).unwrap();
    assert_eq!(score.pages_crawled, 0);
    assert_eq!(score.checks.len(), 27);
    assert_eq!(storage.get_audit(init.audit_id).unwrap().status, AuditStatus::Failed);
}

#[tokio::test]
async fn test_robots_disallowed_paths_are_not_crawled() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private"),
        )
        .mount(&server)
        .await;

    serve_page(&server, "/", html_page("Home", &["/private/report", "/public"])).await;
    serve_page(&server, "/public", html_page("Public", &[])).await;
    // If the crawler ever requests this, the test fails
    Mock::given(method("GET"))
        .and(path("/private/report"))
        .respond_with(ResponseTemplate::new(200).set_body_string("secret"))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut storage = SqliteStorage::new(&dir.path().join("audit.db")).unwrap();
    let config = test_config();
    let client = build_http_client(&config).unwrap();

    let init = init_audit(&mut storage, &client, &config, &request_for(&server, 10))
        .await
        .unwrap();
    let crawled = crawl_to_completion(&mut storage, &config, init.audit_id).await;

    assert_eq!(crawled, 2);
    let pages = storage.load_pages(init.audit_id).unwrap();
    assert!(pages.iter().all(|p| !p.url.contains("/private")));
}

#[tokio::test]
async fn test_scoring_flags_missing_metadata() {
    let server = MockServer::start().await;

    // Pages with no title, no description, no h1, no schema
    let bare = "<html><head></head><body><p>words words words</p>\
                <a href=\"/other\">other</a></body></html>";
    serve_page(&server, "/", bare.to_string()).await;
    serve_page(&server, "/other", bare.to_string()).await;

    let dir = tempfile::tempdir().unwrap();
    let mut storage = SqliteStorage::new(&dir.path().join("audit.db")).unwrap();
    let config = test_config();
    let client = build_http_client(&config).unwrap();

    let init = init_audit(&mut storage, &client, &config, &request_for(&server, 10))
        .await
        .unwrap();
    crawl_to_completion(&mut storage, &config, init.audit_id).await;
    let score = score_audit(&mut storage, &config, init.audit_id, chrono::Utc::now()).unwrap();

    let by_key = |key: &str| score.checks.iter().find(|c| c.key == key).unwrap();
    assert_eq!(by_key("title_present").status, CheckStatus::Fail);
    assert_eq!(by_key("meta_description_present").status, CheckStatus::Fail);
    assert_eq!(by_key("h1_present").status, CheckStatus::Fail);
    assert_eq!(by_key("organization_schema_present").status, CheckStatus::Fail);
    assert_eq!(by_key("thin_content").status, CheckStatus::Fail);

    // Plenty wrong with this site, so the fix list is full
    assert_eq!(score.top_fixes.len(), 7);
    // And ordered by impact times inverse effort
    for pair in score.top_fixes.windows(2) {
        let rank = |f: &sitegauge::score::TopFix| {
            let impact = match f.impact {
                sitegauge::checks::Rating::High => 3,
                sitegauge::checks::Rating::Medium => 2,
                sitegauge::checks::Rating::Low => 1,
            };
            let effort = match f.effort {
                sitegauge::checks::Rating::Low => 3,
                sitegauge::checks::Rating::Medium => 2,
                sitegauge::checks::Rating::High => 1,
            };
            impact * effort
        };
        assert!(rank(&pair[0]) >= rank(&pair[1]));
    }
}

#[tokio::test]
async fn test_scoring_is_idempotent() {
    let server = MockServer::start().await;
    serve_page(&server, "/", html_page("Home", &["/a"])).await;
    serve_page(&server, "/a", html_page("A", &[])).await;

    let dir = tempfile::tempdir().unwrap();
    let mut storage = SqliteStorage::new(&dir.path().join("audit.db")).unwrap();
    let config = test_config();
    let client = build_http_client(&config).unwrap();

    let init = init_audit(&mut storage, &client, &config, &request_for(&server, 10))
        .await
        .unwrap();
    crawl_to_completion(&mut storage, &config, init.audit_id).await;

    let first = score_audit(&mut storage, &config, init.audit_id, chrono::Utc::now()).unwrap();
    let second = score_audit(&mut storage, &config, init.audit_id, chrono::Utc::now()).unwrap();

    assert_eq!(first.overall_score, second.overall_score);
    assert_eq!(first.module_scores, second.module_scores);

    // Rescoring overwrote, it did not accumulate
    let stored = storage.load_checks(init.audit_id).unwrap();
    assert_eq!(stored.len(), 27);
}

#[tokio::test]
async fn test_partial_score_mid_crawl() {
    let server = MockServer::start().await;
    serve_page(&server, "/", html_page("Home", &["/a", "/b"])).await;
    serve_page(&server, "/a", html_page("A", &[])).await;
    serve_page(&server, "/b", html_page("B", &[])).await;

    let dir = tempfile::tempdir().unwrap();
    let mut storage = SqliteStorage::new(&dir.path().join("audit.db")).unwrap();
    let config = EngineConfig {
        batch_size: 1,
        ..test_config()
    };
    let client = build_http_client(&config).unwrap();
    let cancel = CancelFlag::new();

    let init = init_audit(&mut storage, &client, &config, &request_for(&server, 10))
        .await
        .unwrap();
    let batch = continue_audit(&mut storage, &client, &config, init.audit_id, &cancel)
        .await
        .unwrap();
    assert!(!batch.done);

    // Scoring mid-crawl yields a provisional scorecard over one page
    let score = score_audit(&mut storage, &config, init.audit_id, chrono::Utc::now()).unwrap();
    assert_eq!(score.pages_crawled, 1);
    assert_eq!(score.checks.len(), 27);

    // The audit is not completed until the crawl itself finishes
    let audit = storage.get_audit(init.audit_id).unwrap();
    assert_eq!(audit.status, AuditStatus::Running);
}

#[tokio::test]
async fn test_http_errors_consume_budget_without_pages() {
    let server = MockServer::start().await;
    serve_page(&server, "/", html_page("Home", &["/gone", "/ok"])).await;
    serve_page(&server, "/ok", html_page("Ok", &[])).await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut storage = SqliteStorage::new(&dir.path().join("audit.db")).unwrap();
    let config = test_config();
    let client = build_http_client(&config).unwrap();

    let init = init_audit(&mut storage, &client, &config, &request_for(&server, 10))
        .await
        .unwrap();
    let crawled = crawl_to_completion(&mut storage, &config, init.audit_id).await;

    // All three URLs consumed budget, but only two produced pages
    assert_eq!(crawled, 3);
    assert_eq!(storage.count_pages(init.audit_id).unwrap(), 2);
}

#[tokio::test]
async fn test_init_rejects_bad_requests() {
    let dir = tempfile::tempdir().unwrap();
    let mut storage = SqliteStorage::new(&dir.path().join("audit.db")).unwrap();
    let config = test_config();
    let client = build_http_client(&config).unwrap();

    let bad_domain = InitRequest {
        domain: "not a domain".to_string(),
        brand_name: None,
        business_type: None,
        crawl_limit: None,
        allow_subdomains: false,
    };
    assert!(init_audit(&mut storage, &client, &config, &bad_domain)
        .await
        .is_err());

    let zero_limit = InitRequest {
        domain: "example.com".to_string(),
        brand_name: None,
        business_type: None,
        crawl_limit: Some(0),
        allow_subdomains: false,
    };
    assert!(init_audit(&mut storage, &client, &config, &zero_limit)
        .await
        .is_err());
}
