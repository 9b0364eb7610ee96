//! IRS.gov lookup client.
//!
//! Searches Internal Revenue Bulletin indexes and verifies that Notices and
//! Revenue Rulings actually exist, via the public PDF drop or the IRB index.

use async_trait::async_trait;
use chrono::Datelike;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::ScrapeConfig;
use crate::error::{Result, TaxMemoError};

use super::{GuidanceHit, GuidanceSource, absolutize, build_http_client, extract_links};

const BASE_URL: &str = "https://www.irs.gov";
const IRB_BASE: &str = "https://www.irs.gov/irb";

/// How many recent years an unscoped search covers.
const DEFAULT_YEAR_SPAN: i32 = 5;

lazy_static! {
    static ref GUIDANCE_NUMBER_RE: Regex = Regex::new(r"^(\d{4})-(\d+)$").unwrap();
}

/// Outcome of a citation existence check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verification {
    pub valid: bool,
    pub citation: String,
    pub url: Option<String>,
    pub source_type: String,
    /// True when the hit came from the IRB index rather than the PDF drop.
    #[serde(default)]
    pub via_irb: bool,
}

/// Client for public IRS.gov guidance.
pub struct IrsClient {
    http: reqwest::Client,
    config: ScrapeConfig,
}

impl IrsClient {
    pub fn new(config: ScrapeConfig) -> Result<Self> {
        let http = build_http_client(&config)?;
        Ok(Self { http, config })
    }

    /// Search one year's Internal Revenue Bulletin index for a term.
    pub async fn search_irb(&self, year: i32, term: &str) -> Result<Vec<GuidanceHit>> {
        let url = format!("{}/{}", IRB_BASE, year);
        let body = self.fetch(&url).await?;

        let term_lower = term.to_lowercase();
        let hits = extract_links(&body)
            .into_iter()
            .filter(|link| link.text.to_lowercase().contains(&term_lower))
            .map(|link| GuidanceHit {
                source_type: detect_guidance_type(&link.text).to_string(),
                url: absolutize(BASE_URL, &link.href),
                title: link.text,
                year: Some(year),
            })
            .collect();

        Ok(hits)
    }

    /// Verify a Notice citation exists (e.g. "2020-69").
    pub async fn verify_notice_exists(&self, notice_number: &str) -> Result<Verification> {
        self.verify_guidance(notice_number, "Notice", "n").await
    }

    /// Verify a Revenue Ruling exists (e.g. "2019-01").
    pub async fn verify_revenue_ruling(&self, rev_rul_number: &str) -> Result<Verification> {
        self.verify_guidance(rev_rul_number, "Revenue Ruling", "rr").await
    }

    /// Shared verification flow: try the direct PDF drop, then fall back to
    /// searching the IRB index for that year.
    async fn verify_guidance(
        &self,
        number: &str,
        label: &str,
        pdf_prefix: &str,
    ) -> Result<Verification> {
        let caps = GUIDANCE_NUMBER_RE
            .captures(number)
            .ok_or_else(|| TaxMemoError::Scrape(format!("Invalid {} number: {}", label, number)))?;
        let year: i32 = caps[1]
            .parse()
            .map_err(|_| TaxMemoError::Scrape(format!("Invalid year in: {}", number)))?;

        let pdf_url =
            format!("{}/pub/irs-drop/{}-{}.pdf", BASE_URL, pdf_prefix, number.replace('-', ""));

        let head = self
            .http
            .head(&pdf_url)
            .send()
            .await
            .map_err(|e| TaxMemoError::Scrape(format!("HEAD {} failed: {}", pdf_url, e)))?;

        if head.status().is_success() {
            return Ok(Verification {
                valid: true,
                citation: number.to_string(),
                url: Some(pdf_url),
                source_type: label.to_string(),
                via_irb: false,
            });
        }

        log::debug!("{} {} not in PDF drop, trying IRB index", label, number);
        let search_term = format!("{} {}", if label == "Notice" { "Notice" } else { "Rev. Rul." }, number);
        let irb_hits = self.search_irb(year, &search_term).await?;

        match irb_hits.into_iter().next() {
            Some(hit) => Ok(Verification {
                valid: true,
                citation: number.to_string(),
                url: Some(hit.url),
                source_type: label.to_string(),
                via_irb: true,
            }),
            None => Ok(Verification {
                valid: false,
                citation: number.to_string(),
                url: None,
                source_type: label.to_string(),
                via_irb: false,
            }),
        }
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| TaxMemoError::Scrape(format!("GET {} failed: {}", url, e)))?
            .error_for_status()
            .map_err(|e| TaxMemoError::Scrape(format!("GET {} failed: {}", url, e)))?;

        response
            .text()
            .await
            .map_err(|e| TaxMemoError::Scrape(format!("Failed to read {}: {}", url, e)))
    }
}

#[async_trait]
impl GuidanceSource for IrsClient {
    async fn search(&self, term: &str, year: Option<i32>) -> Result<Vec<GuidanceHit>> {
        match year {
            Some(y) => self.search_irb(y, term).await,
            None => {
                // Unscoped: walk the most recent bulletins
                let current = chrono::Local::now().year();
                let mut all = Vec::new();
                for y in ((current - DEFAULT_YEAR_SPAN + 1)..=current).rev() {
                    match self.search_irb(y, term).await {
                        Ok(hits) => all.extend(hits),
                        Err(e) => log::warn!("IRB search for {} failed: {}", y, e),
                    }
                    super::polite_delay(&self.config).await;
                }
                Ok(all)
            }
        }
    }
}

/// Classify IRS guidance from link text.
pub fn detect_guidance_type(text: &str) -> &'static str {
    let text_lower = text.to_lowercase();

    if text_lower.contains("notice") {
        "Notice"
    } else if text_lower.contains("revenue ruling") || text_lower.contains("rev. rul.") {
        "Revenue Ruling"
    } else if text_lower.contains("revenue procedure") || text_lower.contains("rev. proc.") {
        "Revenue Procedure"
    } else if text_lower.contains("announcement") {
        "Announcement"
    } else if text_lower.contains("private letter ruling") || text_lower.contains("plr") {
        "Private Letter Ruling"
    } else if text_lower.contains("chief counsel advice") || text_lower.contains("cca") {
        "Chief Counsel Advice"
    } else {
        "Other"
    }
}
