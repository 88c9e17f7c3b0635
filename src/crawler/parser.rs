//! HTML page parser
//!
//! Converts raw HTML into the structured signals the check engine evaluates:
//! title, first H1, meta description, canonical, robots-meta noindex, JSON-LD
//! schema types, heading counts, body word count, image/alt counts,
//! render-blocking asset counts, freshness metadata, outbound links, and
//! social-profile links.
//!
//! Parsing is pure and infallible: malformed HTML degrades to empty or zero
//! fields, it never aborts a crawl.

use chrono::{DateTime, NaiveDate, Utc};
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

/// Hosts recognized as social profile destinations
const SOCIAL_HOSTS: &[&str] = &[
    "facebook.com",
    "instagram.com",
    "twitter.com",
    "x.com",
    "linkedin.com",
    "youtube.com",
    "tiktok.com",
    "github.com",
];

/// A fully crawled page, immutable once written
///
/// One record is written at most once per audit; the seen-hash set enforces
/// URL uniqueness before a fetch is ever dispatched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    /// Normalized URL of the page
    pub url: String,
    /// HTTP status of the final response
    pub status: u16,
    /// First `<title>` text, if any
    pub title: Option<String>,
    /// First `<h1>` text, if any
    pub h1: Option<String>,
    /// `meta[name=description]` content, if any
    pub meta_description: Option<String>,
    /// `link[rel=canonical]` href resolved against the page URL
    pub canonical: Option<String>,
    /// Whether a robots meta tag carries `noindex`
    pub noindex: bool,
    /// Whether any JSON-LD block parsed successfully
    pub has_schema: bool,
    /// Deduplicated, sorted JSON-LD `@type` values
    pub schema_types: Vec<String>,
    /// Whitespace-tokenized body word count
    pub word_count: u32,
    /// Number of `<img>` tags
    pub image_count: u32,
    /// Number of `<img>` tags with a non-empty `alt`
    pub images_with_alt: u32,
    /// Heading counts for h1 through h6
    pub heading_counts: [u32; 6],
    /// Number of `link[rel=stylesheet]` tags
    pub stylesheet_count: u32,
    /// Number of external scripts without `async`/`defer`
    pub blocking_script_count: u32,
    /// Modification timestamp from page metadata, if any
    pub modified_at: Option<DateTime<Utc>>,
    /// Same-site links discovered on this page, in document order
    pub internal_links: Vec<String>,
    /// Social profile links found on this page
    pub social_links: Vec<String>,
}

/// Raw extraction result, before audit-scope link filtering
///
/// `links` holds every resolvable HTTP(S) `<a href>` target in document
/// order; the batch machine decides which of those are in scope for the
/// audit and builds the final [`PageRecord`].
#[derive(Debug, Clone)]
pub struct ParsedPage {
    pub title: Option<String>,
    pub h1: Option<String>,
    pub meta_description: Option<String>,
    pub canonical: Option<String>,
    pub noindex: bool,
    pub schema_types: Vec<String>,
    pub word_count: u32,
    pub image_count: u32,
    pub images_with_alt: u32,
    pub heading_counts: [u32; 6],
    pub stylesheet_count: u32,
    pub blocking_script_count: u32,
    pub modified_at: Option<DateTime<Utc>>,
    /// All resolvable HTTP(S) anchor targets, document order
    pub links: Vec<String>,
    /// Subset of links pointing at social profile hosts
    pub social_links: Vec<String>,
}

impl ParsedPage {
    /// Builds the immutable page record from this extraction
    pub fn into_record(self, url: String, status: u16, internal_links: Vec<String>) -> PageRecord {
        PageRecord {
            url,
            status,
            title: self.title,
            h1: self.h1,
            meta_description: self.meta_description,
            canonical: self.canonical,
            noindex: self.noindex,
            has_schema: !self.schema_types.is_empty(),
            schema_types: self.schema_types,
            word_count: self.word_count,
            image_count: self.image_count,
            images_with_alt: self.images_with_alt,
            heading_counts: self.heading_counts,
            stylesheet_count: self.stylesheet_count,
            blocking_script_count: self.blocking_script_count,
            modified_at: self.modified_at,
            internal_links,
            social_links: self.social_links,
        }
    }
}

/// Parses HTML into a [`ParsedPage`]
///
/// Pure function, no I/O. Relative links are resolved against `base_url`.
pub fn parse_page(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    let (links, social_links) = extract_links(&document, base_url);
    let (image_count, images_with_alt) = count_images(&document);

    ParsedPage {
        title: first_text(&document, "title"),
        h1: first_text(&document, "h1"),
        meta_description: meta_content(&document, "meta[name='description']"),
        canonical: extract_canonical(&document, base_url),
        noindex: extract_noindex(&document),
        schema_types: extract_schema_types(&document),
        word_count: count_words(&document),
        image_count,
        images_with_alt,
        heading_counts: count_headings(&document),
        stylesheet_count: count_selector(&document, "link[rel='stylesheet']"),
        blocking_script_count: count_blocking_scripts(&document),
        modified_at: extract_modified_at(&document),
        links,
        social_links,
    }
}

/// Text of the first element matching `selector`, trimmed, None when empty
fn first_text(document: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    document
        .select(&sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// `content` attribute of the first element matching `selector`
fn meta_content(document: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    document
        .select(&sel)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn extract_canonical(document: &Html, base_url: &Url) -> Option<String> {
    let sel = Selector::parse("link[rel='canonical'][href]").ok()?;
    let href = document
        .select(&sel)
        .next()
        .and_then(|el| el.value().attr("href"))?;
    base_url.join(href.trim()).ok().map(|u| u.to_string())
}

fn extract_noindex(document: &Html) -> bool {
    for selector in ["meta[name='robots']", "meta[name='googlebot']"] {
        if let Ok(sel) = Selector::parse(selector) {
            for el in document.select(&sel) {
                if let Some(content) = el.value().attr("content") {
                    if content.to_lowercase().contains("noindex") {
                        return true;
                    }
                }
            }
        }
    }
    false
}

/// Collects `@type` values from all JSON-LD blocks
///
/// Invalid JSON is skipped rather than treated as fatal. Types nested in
/// `@graph` arrays are collected too. The result is deduplicated and sorted
/// so repeated parses of the same bytes are byte-identical.
fn extract_schema_types(document: &Html) -> Vec<String> {
    let mut types = Vec::new();

    if let Ok(sel) = Selector::parse("script[type='application/ld+json']") {
        for el in document.select(&sel) {
            let raw: String = el.text().collect();
            if let Ok(value) = serde_json::from_str::<Value>(&raw) {
                collect_types(&value, &mut types);
            }
        }
    }

    types.sort();
    types.dedup();
    types
}

fn collect_types(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            match map.get("@type") {
                Some(Value::String(t)) => out.push(t.clone()),
                Some(Value::Array(items)) => {
                    for item in items {
                        if let Value::String(t) = item {
                            out.push(t.clone());
                        }
                    }
                }
                _ => {}
            }
            if let Some(graph) = map.get("@graph") {
                collect_types(graph, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_types(item, out);
            }
        }
        _ => {}
    }
}

fn count_words(document: &Html) -> u32 {
    let body_sel = match Selector::parse("body") {
        Ok(sel) => sel,
        Err(_) => return 0,
    };
    match document.select(&body_sel).next() {
        Some(body) => body
            .text()
            .flat_map(|t| t.split_whitespace())
            .count() as u32,
        None => 0,
    }
}

fn count_images(document: &Html) -> (u32, u32) {
    let sel = match Selector::parse("img") {
        Ok(sel) => sel,
        Err(_) => return (0, 0),
    };
    let mut total = 0;
    let mut with_alt = 0;
    for el in document.select(&sel) {
        total += 1;
        if el
            .value()
            .attr("alt")
            .is_some_and(|alt| !alt.trim().is_empty())
        {
            with_alt += 1;
        }
    }
    (total, with_alt)
}

fn count_headings(document: &Html) -> [u32; 6] {
    let mut counts = [0u32; 6];
    for (i, tag) in ["h1", "h2", "h3", "h4", "h5", "h6"].iter().enumerate() {
        counts[i] = count_selector(document, tag);
    }
    counts
}

fn count_selector(document: &Html, selector: &str) -> u32 {
    match Selector::parse(selector) {
        Ok(sel) => document.select(&sel).count() as u32,
        Err(_) => 0,
    }
}

/// External scripts without `async`, `defer`, or `type=module` block
/// rendering while they download
fn count_blocking_scripts(document: &Html) -> u32 {
    let sel = match Selector::parse("script[src]") {
        Ok(sel) => sel,
        Err(_) => return 0,
    };
    document
        .select(&sel)
        .filter(|el| {
            let v = el.value();
            v.attr("async").is_none()
                && v.attr("defer").is_none()
                && v.attr("type") != Some("module")
        })
        .count() as u32
}

/// Looks for a modification timestamp in page metadata
///
/// Sources, in order: `article:modified_time`, `og:updated_time`,
/// `article:published_time`, then `dateModified`/`datePublished` in any
/// JSON-LD block.
fn extract_modified_at(document: &Html) -> Option<DateTime<Utc>> {
    for selector in [
        "meta[property='article:modified_time']",
        "meta[property='og:updated_time']",
        "meta[property='article:published_time']",
    ] {
        if let Some(raw) = meta_content(document, selector) {
            if let Some(parsed) = parse_timestamp(&raw) {
                return Some(parsed);
            }
        }
    }

    if let Ok(sel) = Selector::parse("script[type='application/ld+json']") {
        for el in document.select(&sel) {
            let raw: String = el.text().collect();
            if let Ok(value) = serde_json::from_str::<Value>(&raw) {
                if let Some(parsed) = json_ld_timestamp(&value) {
                    return Some(parsed);
                }
            }
        }
    }

    None
}

fn json_ld_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Object(map) => {
            for key in ["dateModified", "datePublished"] {
                if let Some(Value::String(raw)) = map.get(key) {
                    if let Some(parsed) = parse_timestamp(raw) {
                        return Some(parsed);
                    }
                }
            }
            map.get("@graph").and_then(json_ld_timestamp)
        }
        Value::Array(items) => items.iter().find_map(json_ld_timestamp),
        _ => None,
    }
}

/// Parses RFC 3339 timestamps and bare `YYYY-MM-DD` dates
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Extracts anchor targets and classifies social profile links
fn extract_links(document: &Html, base_url: &Url) -> (Vec<String>, Vec<String>) {
    let mut links = Vec::new();
    let mut social = Vec::new();

    if let Ok(sel) = Selector::parse("a[href]") {
        for el in document.select(&sel) {
            let Some(href) = el.value().attr("href") else {
                continue;
            };
            let Some(resolved) = resolve_link(href, base_url) else {
                continue;
            };
            if is_social_link(&resolved) {
                social.push(resolved.to_string());
            } else {
                links.push(resolved.to_string());
            }
        }
    }

    social.sort();
    social.dedup();
    (links, social)
}

/// Resolves an href against the page URL, dropping non-HTTP(S) and
/// fragment-only targets
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let resolved = base_url.join(href).ok()?;
    if resolved.scheme() == "http" || resolved.scheme() == "https" {
        Some(resolved)
    } else {
        None
    }
}

fn is_social_link(url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.strip_prefix("www.").unwrap_or(host);
    SOCIAL_HOSTS
        .iter()
        .any(|social| host == *social || host.ends_with(&format!(".{}", social)))
}
