//! HTTP fetcher
//!
//! All network access for an audit goes through this module: the bounded
//! page fetches inside a batch and the one-off auxiliary fetches at init
//! (robots.txt, sitemap.xml, llms.txt). Every request carries the engine's
//! user agent and a hard timeout; redirects are followed transparently but
//! the final URL is reported so the batch machine can detect cross-origin
//! redirects.

use crate::config::EngineConfig;
use reqwest::Client;
use url::Url;

/// Result of a single page fetch
#[derive(Debug)]
pub enum FetchOutcome {
    /// Successfully fetched an HTML page
    Success {
        /// HTTP status of the final response
        status: u16,
        /// Final URL after redirects
        final_url: String,
        /// Response body
        body: String,
    },

    /// The final response was not HTML
    ContentMismatch {
        /// The Content-Type that was received
        content_type: String,
    },

    /// The final response had a non-success status
    HttpError {
        /// HTTP status of the final response
        status: u16,
    },

    /// Network-level failure (timeout, DNS, connection refused, TLS)
    NetworkError {
        /// Error description
        error: String,
        /// Whether the failure was a timeout
        timed_out: bool,
    },
}

/// Builds the HTTP client used for one audit
///
/// Redirects are followed by the client (up to reqwest's default of 10
/// hops); the per-request timeout comes from the engine config.
pub fn build_http_client(config: &EngineConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent_string())
        .timeout(config.fetch_timeout())
        .connect_timeout(config.fetch_timeout())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a single page
///
/// Never returns an error: every failure mode is folded into a
/// `FetchOutcome` variant so one bad page can be recorded as a skip without
/// aborting the batch.
pub async fn fetch_url(client: &Client, url: &str) -> FetchOutcome {
    match client.get(url).send().await {
        Ok(response) => {
            let status = response.status();
            let final_url = response.url().to_string();

            if !status.is_success() {
                return FetchOutcome::HttpError {
                    status: status.as_u16(),
                };
            }

            let content_type = response
                .headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string();

            // An absent Content-Type is given the benefit of the doubt
            if !content_type.is_empty() && !content_type.contains("text/html") {
                return FetchOutcome::ContentMismatch { content_type };
            }

            match response.text().await {
                Ok(body) => FetchOutcome::Success {
                    status: status.as_u16(),
                    final_url,
                    body,
                },
                Err(e) => FetchOutcome::NetworkError {
                    error: e.to_string(),
                    timed_out: e.is_timeout(),
                },
            }
        }
        Err(e) => FetchOutcome::NetworkError {
            error: classify_error(&e),
            timed_out: e.is_timeout(),
        },
    }
}

/// Fetches an auxiliary text file relative to the site root
///
/// Used for robots.txt, sitemap.xml, and llms.txt. Returns the body only on
/// a 2xx final status; any failure or non-success status yields `None`,
/// which callers treat as "file absent".
pub async fn fetch_aux_text(client: &Client, root: &Url, file: &str) -> Option<String> {
    let url = root.join(file).ok()?;
    let response = client.get(url).send().await.ok()?;
    if !response.status().is_success() {
        return None;
    }
    response.text().await.ok()
}

fn classify_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        "Connection failed".to_string()
    } else if e.is_redirect() {
        "Too many redirects".to_string()
    } else {
        e.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        let config = EngineConfig::default();
        assert!(build_http_client(&config).is_ok());
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let config = EngineConfig::default();
        let client = build_http_client(&config).unwrap();

        // Port 1 is essentially never listening
        let outcome = fetch_url(&client, "http://127.0.0.1:1/").await;
        assert!(matches!(outcome, FetchOutcome::NetworkError { .. }));
    }

    #[tokio::test]
    async fn test_fetch_aux_absent_host() {
        let config = EngineConfig::default();
        let client = build_http_client(&config).unwrap();
        let root = Url::parse("http://127.0.0.1:1/").unwrap();

        let body = fetch_aux_text(&client, &root, "robots.txt").await;
        assert!(body.is_none());
    }
}
