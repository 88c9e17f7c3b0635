//! Crawler module
//!
//! Contains the page fetcher, the HTML parser, the resumable crawl state,
//! and the batch machine that advances a crawl by one bounded batch per
//! invocation.

mod fetcher;
mod machine;
mod parser;
mod state;

pub use fetcher::{build_http_client, fetch_aux_text, fetch_url, FetchOutcome};
pub use machine::{advance, BatchReport, CancelFlag};
pub use parser::{parse_page, PageRecord, ParsedPage};
pub use state::{CrawlState, CrawlStatus};
