//! URL handling for the audit crawler
//!
//! Provides URL normalization, fingerprinting for the seen-hash set, and the
//! host-scope policy that decides whether a discovered link belongs to the
//! audited site.

use crate::{UrlError, UrlResult};
use sha2::{Digest, Sha256};
use url::Url;

/// Tracking query parameters removed during normalization
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid", "ref", "source"];

/// Normalizes a URL so that trivially-different spellings of the same page
/// dedupe to one frontier entry
///
/// Normalization steps:
///
/// 1. Parse; reject non-HTTP(S) schemes
/// 2. Lowercase the host and strip a leading `www.`
/// 3. Drop default ports (the `url` crate does this on parse)
/// 4. Collapse dot segments, drop the trailing slash (except root)
/// 5. Drop the fragment
/// 6. Drop tracking parameters, sort the rest
pub fn normalize_url(url_str: &str) -> UrlResult<Url> {
    let mut url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    match url.host_str() {
        Some(host) => {
            let normalized_host = normalize_host(host);
            url.set_host(Some(&normalized_host))
                .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;
        }
        None => return Err(UrlError::MissingHost),
    }

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    url.set_fragment(None);

    if url.query().is_some() {
        let params = filter_and_sort_query_params(&url);
        if params.is_empty() {
            url.set_query(None);
        } else {
            let query_string = params
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("&");
            url.set_query(Some(&query_string));
        }
    }

    Ok(url)
}

/// Lowercases a host and strips a leading `www.`
pub fn normalize_host(host: &str) -> String {
    let lowered = host.to_lowercase();
    match lowered.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => lowered,
    }
}

/// Computes the seen-hash fingerprint of a normalized URL
///
/// The fingerprint is scheme-blind: `http://x.com/` and `https://x.com`
/// produce the same value, so a site that serves both never gets crawled
/// twice.
pub fn url_fingerprint(url: &Url) -> String {
    let scheme_blind = format!(
        "{}{}{}",
        url.host_str().unwrap_or(""),
        url.path(),
        url.query().map(|q| format!("?{}", q)).unwrap_or_default()
    );
    let mut hasher = Sha256::new();
    hasher.update(scheme_blind.as_bytes());
    hex::encode(hasher.finalize())
}

/// Decides whether a link host belongs to the audited site
///
/// A host is in scope when it equals the audit's root host, or (with
/// `allow_subdomains`) when it is a subdomain of it. Hosts are compared in
/// normalized form, so `www.` variants count as the root host either way.
///
/// Scope hangs off the root host itself, not its registrable domain. When
/// the audited root is already a subdomain (`blog.example.com`), sibling
/// hosts like `shop.example.com` stay out of scope even with
/// `allow_subdomains` on; audit the apex host to cover them.
pub fn host_in_scope(host: &str, root_host: &str, allow_subdomains: bool) -> bool {
    let host = normalize_host(host);
    if host == root_host {
        return true;
    }
    allow_subdomains && host.ends_with(&format!(".{}", root_host))
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", segments.join("/"))
}

/// Filters out tracking parameters and sorts the remainder by key
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    params.sort_by(|a, b| a.0.cmp(&b.0));
    params
}

fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
