//! Robots.txt rules
//!
//! A serializable wrapper around the `robotstxt` crate. The raw robots.txt
//! body is stored in the crawl state snapshot (fetched once per audit), and
//! matching is done on demand with longest-match-wins Allow/Disallow
//! semantics.

use robotstxt::DefaultMatcher;
use serde::{Deserialize, Serialize};

/// Robots.txt rules cached for one audit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotsRules {
    /// Raw robots.txt content; `None` means the file was absent or
    /// unreachable, which is treated as allow-all
    content: Option<String>,
}

impl RobotsRules {
    /// Wraps a fetched robots.txt body
    pub fn from_content(content: &str) -> Self {
        Self {
            content: Some(content.to_string()),
        }
    }

    /// Permissive rules used when robots.txt does not exist
    pub fn allow_all() -> Self {
        Self { content: None }
    }

    /// Whether a robots.txt file was found for the site
    pub fn exists(&self) -> bool {
        self.content.is_some()
    }

    /// The raw robots.txt body, if one was fetched
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// Checks whether a URL is allowed for the given user agent
    ///
    /// `url` may be a full URL or a path. Longest-match-wins semantics (an
    /// Allow rule overrides a shorter Disallow) come from the matcher.
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        match &self.content {
            Some(content) if !content.is_empty() => {
                let mut matcher = DefaultMatcher::default();
                // The matcher drops rules that precede any User-agent line,
                // so a bare `Disallow: /` body would read as allow-all.
                // Treat ungrouped rules as applying to every agent.
                if has_agent_line(content) {
                    matcher.one_agent_allowed_by_robots(content, user_agent, url)
                } else {
                    let grouped = format!("User-agent: *\n{}", content);
                    matcher.one_agent_allowed_by_robots(&grouped, user_agent, url)
                }
            }
            _ => true,
        }
    }
}

fn has_agent_line(content: &str) -> bool {
    content
        .lines()
        .any(|line| line.trim_start().to_ascii_lowercase().starts_with("user-agent"))
}
