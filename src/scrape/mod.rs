//! Guidance lookup clients for public tax-authority sites.
//!
//! Thin HTTP wrappers over IRS.gov and OECD.org. These are best-effort
//! collaborators: no retries, no pagination, just GET/HEAD plus anchor-link
//! scraping, with a fixed polite delay between successive page fetches.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::ScrapeConfig;
use crate::error::Result;

pub use self::irs::IrsClient;
pub use self::oecd::OecdClient;

mod irs;
mod oecd;

lazy_static! {
    static ref ANCHOR_RE: Regex =
        Regex::new(r#"(?is)<a\s[^>]*href\s*=\s*"([^"]+)"[^>]*>(.*?)</a>"#).unwrap();
    static ref TAG_RE: Regex = Regex::new(r"<[^>]+>").unwrap();
}

/// One guidance document surfaced by a lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuidanceHit {
    pub title: String,
    pub url: String,
    pub source_type: String,
    #[serde(default)]
    pub year: Option<i32>,
}

/// A guidance lookup backend.
#[async_trait]
pub trait GuidanceSource: Send + Sync {
    /// Search for guidance matching `term`, optionally scoped to a year.
    async fn search(&self, term: &str, year: Option<i32>) -> Result<Vec<GuidanceHit>>;
}

/// An anchor link pulled out of an HTML page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Link {
    pub href: String,
    pub text: String,
}

/// Extract every `<a href>` link and its visible text from an HTML page.
pub(crate) fn extract_links(html: &str) -> Vec<Link> {
    ANCHOR_RE
        .captures_iter(html)
        .map(|caps| Link {
            href: caps[1].to_string(),
            text: strip_tags(&caps[2]),
        })
        .filter(|link| !link.text.is_empty())
        .collect()
}

/// Remove markup and collapse whitespace in link text.
fn strip_tags(html: &str) -> String {
    let text = TAG_RE.replace_all(html, " ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Make a site-relative href absolute.
pub(crate) fn absolutize(base_url: &str, href: &str) -> String {
    if href.starts_with('/') {
        format!("{}{}", base_url, href)
    } else {
        href.to_string()
    }
}

/// Build the shared HTTP client from scrape settings.
pub(crate) fn build_http_client(config: &ScrapeConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.timeout_secs))
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(|e| crate::TaxMemoError::Scrape(format!("Failed to create HTTP client: {}", e)))
}

/// Fixed polite delay between successive page fetches.
pub async fn polite_delay(config: &ScrapeConfig) {
    tokio::time::sleep(std::time::Duration::from_millis(config.delay_ms)).await;
}
