//! Citation format validator.
//!
//! Enforces house citation style for IRC sections, Treasury Regulations,
//! cases, IRS guidance, treaties, and OECD materials using a fixed pattern
//! registry. Checks are purely syntactic: whether a cited authority actually
//! exists is left to the guidance lookup clients.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TaxMemoError};

/// Sentinel the drafting workflow inserts next to citations it could not
/// verify. Its presence is always a reportable issue.
pub const UNVERIFIED_SENTINEL: &str = "Unknown—needs manual check";

lazy_static! {
    static ref IRC_RE: Regex =
        Regex::new(r"IRC\s*§\s*\d+[A-Z]?(?:\([a-z0-9]+\))*(?:\([A-Z]\))?(?:\([ivx]+\))?").unwrap();
    static ref REG_RE: Regex =
        Regex::new(r"Treas\.\s*Reg\.\s*§\s*\d+\.\d+[A-Z]?-\d+(?:\([a-z0-9]+\))*").unwrap();
    static ref CASE_RE: Regex =
        Regex::new(r"\*[^*]+\*,\s*\d+\s+[A-Z][A-Za-z0-9\.]*\s+\d+,\s*\d+\s+\([^)]+\s+\d{4}\)")
            .unwrap();
    static ref NOTICE_RE: Regex =
        Regex::new(r"Notice\s+\d{4}-\d+,\s*\d{4}-\d+\s+I\.R\.B\.\s+\d+").unwrap();
    static ref REV_RUL_RE: Regex =
        Regex::new(r"Rev\.\s*Rul\.\s+\d{4}-\d+,\s*\d{4}-\d+\s+I\.R\.B\.\s+\d+").unwrap();
    static ref TREATY_RE: Regex =
        Regex::new(r"(?:Convention|Treaty|Agreement)[^,]+,\s*Art\.\s*\d+(?:\([a-z0-9]+\))*")
            .unwrap();
    static ref OECD_RE: Regex =
        Regex::new(r"OECD[^,]+(?:Art\.|¶)\s*\d+(?:\([a-z0-9]+\))*").unwrap();

    // Candidate shapes used to spot citations that then fail the strict
    // patterns above.
    static ref IRC_SECTION_WORD_RE: Regex = Regex::new(r"(?i)\bIRC\s+Section\s+\d+").unwrap();
    static ref IRC_BARE_RE: Regex = Regex::new(r"\bIRC\s+\d+[A-Z]?").unwrap();
    static ref REG_CANDIDATE_RE: Regex =
        Regex::new(r"Treas\.\s*Reg\.?\s*§?\s*\d[\dA-Z\.\-]*").unwrap();
    static ref CASE_CANDIDATE_RE: Regex = Regex::new(r"\*[^*]+\*[^\n]*").unwrap();
    static ref CASE_REPORTER_RE: Regex = Regex::new(r"\d+\s+[A-Z][A-Za-z0-9\.]*\s+\d+").unwrap();
    static ref CASE_COURT_YEAR_RE: Regex = Regex::new(r"\(\w+\.?\s*\w*\.?\s*\d{4}\)").unwrap();
    static ref NOTICE_CANDIDATE_RE: Regex = Regex::new(r"Notice\s+\d{4}-\d+").unwrap();
    static ref REV_RUL_CANDIDATE_RE: Regex = Regex::new(r"Rev\.\s*Rul\.\s+\d{4}-\d+").unwrap();
    static ref URL_RE: Regex = Regex::new(r"https?://[^\s\)]+").unwrap();
}

/// The citation categories the validator knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationKind {
    Irc,
    Regulation,
    Case,
    Notice,
    RevenueRuling,
    Treaty,
    Oecd,
}

impl CitationKind {
    /// Every kind, in summary display order.
    pub const ALL: [CitationKind; 7] = [
        CitationKind::Irc,
        CitationKind::Regulation,
        CitationKind::Case,
        CitationKind::Notice,
        CitationKind::RevenueRuling,
        CitationKind::Treaty,
        CitationKind::Oecd,
    ];

    /// The strict house-style pattern for this kind.
    pub fn pattern(&self) -> &'static Regex {
        match self {
            CitationKind::Irc => &IRC_RE,
            CitationKind::Regulation => &REG_RE,
            CitationKind::Case => &CASE_RE,
            CitationKind::Notice => &NOTICE_RE,
            CitationKind::RevenueRuling => &REV_RUL_RE,
            CitationKind::Treaty => &TREATY_RE,
            CitationKind::Oecd => &OECD_RE,
        }
    }

    /// Key used in citation summaries and JSON output.
    pub fn summary_key(&self) -> &'static str {
        match self {
            CitationKind::Irc => "irc_sections",
            CitationKind::Regulation => "regulations",
            CitationKind::Case => "cases",
            CitationKind::Notice => "notices",
            CitationKind::RevenueRuling => "revenue_rulings",
            CitationKind::Treaty => "treaties",
            CitationKind::Oecd => "oecd",
        }
    }

    /// Parse a user-supplied kind tag.
    pub fn parse(tag: &str) -> Result<Self> {
        match tag {
            "irc" => Ok(CitationKind::Irc),
            "reg" | "regulation" => Ok(CitationKind::Regulation),
            "case" => Ok(CitationKind::Case),
            "notice" => Ok(CitationKind::Notice),
            "revenue_ruling" => Ok(CitationKind::RevenueRuling),
            "treaty" => Ok(CitationKind::Treaty),
            "oecd" => Ok(CitationKind::Oecd),
            other => Err(TaxMemoError::InvalidCitationKind(other.to_string())),
        }
    }
}

/// What kind of problem an issue describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
    Format,
    Verification,
}

/// A citation formatting or verification issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitationIssue {
    /// The offending citation text (may be empty for document-wide issues).
    pub citation: String,
    pub issue_type: IssueType,
    pub message: String,
    pub line_number: Option<usize>,
}

/// Validate citation formats against house style.
#[derive(Debug, Default)]
pub struct CitationValidator {
    issues: Vec<CitationIssue>,
}

impl CitationValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run all citation validations, returning overall validity and the
    /// ordered issue list.
    pub fn validate_all(&mut self, text: &str) -> (bool, Vec<CitationIssue>) {
        self.issues.clear();

        self.validate_irc(text);
        self.validate_regulations(text);
        self.validate_cases(text);
        self.validate_irb_guidance(text);
        self.validate_general_format(text);

        (self.issues.is_empty(), self.issues.clone())
    }

    /// IRC citations must use the section symbol, not the word "Section".
    pub fn validate_irc(&mut self, text: &str) -> bool {
        let before = self.issues.len();

        if IRC_SECTION_WORD_RE.is_match(text) {
            self.push_issue(
                "IRC Section X",
                IssueType::Format,
                "Use 'IRC §' not 'IRC Section'",
                None,
            );
        }

        // "IRC 951A" with no § anywhere between IRC and the number
        for m in IRC_BARE_RE.find_iter(text) {
            let trailing = &text[m.end()..];
            if trailing.trim_start().starts_with('§') {
                continue;
            }
            self.push_issue(
                m.as_str(),
                IssueType::Format,
                "Missing § symbol",
                Some(line_of(text, m.start())),
            );
        }

        self.issues.len() == before
    }

    /// Treasury Regulation citations must match `Treas. Reg. § X.XXX-X(x)`.
    pub fn validate_regulations(&mut self, text: &str) -> bool {
        let before = self.issues.len();

        for m in REG_CANDIDATE_RE.find_iter(text) {
            let candidate = m.as_str();
            let strict = REG_RE.find(candidate).is_some_and(|sm| sm.start() == 0);
            if !strict {
                self.push_issue(
                    candidate,
                    IssueType::Format,
                    "Should be 'Treas. Reg. § X.XXX-X(x)(x)'",
                    Some(line_of(text, m.start())),
                );
            }
        }

        self.issues.len() == before
    }

    /// Case citations need a reporter cite and a court/year parenthetical.
    pub fn validate_cases(&mut self, text: &str) -> bool {
        let before = self.issues.len();

        for m in CASE_CANDIDATE_RE.find_iter(text) {
            let case_text = m.as_str();
            if !case_text.to_lowercase().contains("v.") {
                continue;
            }

            if !CASE_REPORTER_RE.is_match(case_text) {
                self.push_issue(
                    &truncate(case_text, 100),
                    IssueType::Format,
                    "Missing reporter citation (e.g., '123 F.3d 456')",
                    Some(line_of(text, m.start())),
                );
            }

            if !CASE_COURT_YEAR_RE.is_match(case_text) {
                self.push_issue(
                    &truncate(case_text, 100),
                    IssueType::Format,
                    "Missing court and year, e.g., (Fed. Cir. 2010)",
                    Some(line_of(text, m.start())),
                );
            }
        }

        self.issues.len() == before
    }

    /// Notices and Revenue Rulings must carry their I.R.B. citation.
    pub fn validate_irb_guidance(&mut self, text: &str) -> bool {
        let before = self.issues.len();

        for m in NOTICE_CANDIDATE_RE.find_iter(text) {
            if !starts_full_match(&NOTICE_RE, text, m.start()) {
                self.push_issue(
                    m.as_str(),
                    IssueType::Format,
                    "Should include I.R.B. citation, e.g., 'Notice 2020-69, 2020-40 I.R.B. 600'",
                    Some(line_of(text, m.start())),
                );
            }
        }

        for m in REV_RUL_CANDIDATE_RE.find_iter(text) {
            if !starts_full_match(&REV_RUL_RE, text, m.start()) {
                self.push_issue(
                    m.as_str(),
                    IssueType::Format,
                    "Should include I.R.B. citation",
                    Some(line_of(text, m.start())),
                );
            }
        }

        self.issues.len() == before
    }

    /// Document-wide checks: unverified-citation sentinel and bare URLs.
    pub fn validate_general_format(&mut self, text: &str) -> bool {
        let before = self.issues.len();

        if text.contains(UNVERIFIED_SENTINEL) {
            self.push_issue(
                "",
                IssueType::Verification,
                format!("Document contains unverified citations marked '{}'", UNVERIFIED_SENTINEL),
                None,
            );
        }

        for m in URL_RE.find_iter(text) {
            // Access-date marker must appear within 100 chars of the URL
            let window: String = text[m.start()..].chars().take(100).collect();
            let window = window.to_lowercase();
            if !window.contains("accessed") && !window.contains("retrieved") {
                self.push_issue(
                    m.as_str(),
                    IssueType::Format,
                    "Web citations should include date accessed",
                    Some(line_of(text, m.start())),
                );
            }
        }

        self.issues.len() == before
    }

    fn push_issue(
        &mut self,
        citation: impl Into<String>,
        issue_type: IssueType,
        message: impl Into<String>,
        line_number: Option<usize>,
    ) {
        self.issues.push(CitationIssue {
            citation: citation.into(),
            issue_type,
            message: message.into(),
            line_number,
        });
    }
}

/// Count citations of each kind, iterating the pattern registry uniformly.
pub fn citation_summary(text: &str) -> BTreeMap<&'static str, usize> {
    CitationKind::ALL
        .iter()
        .map(|kind| (kind.summary_key(), kind.pattern().find_iter(text).count()))
        .collect()
}

/// Validate a single citation string against one category's pattern.
///
/// Unknown kind tags are an error, never a silent `false`.
pub fn validate_specific(citation: &str, kind_tag: &str) -> Result<(bool, String)> {
    let kind = CitationKind::parse(kind_tag)?;
    let trimmed = citation.trim();

    let valid = kind.pattern().find(trimmed).is_some_and(|m| m.start() == 0);
    let message = if valid {
        "Valid format".to_string()
    } else {
        format!("Does not match {} format", kind_tag)
    };
    Ok((valid, message))
}

/// Whether `pattern` matches starting exactly at `pos`.
fn starts_full_match(pattern: &Regex, text: &str, pos: usize) -> bool {
    pattern.find_at(text, pos).is_some_and(|m| m.start() == pos)
}

/// 1-based line number containing byte offset `pos`.
fn line_of(text: &str, pos: usize) -> usize {
    text[..pos].bytes().filter(|b| *b == b'\n').count() + 1
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_irc_citation() {
        let mut validator = CitationValidator::new();
        assert!(validator.validate_irc("IRC § 951A(c)(2)(A)(i) provides that..."));
    }

    #[test]
    fn test_irc_section_word_flagged() {
        let mut validator = CitationValidator::new();
        let ok = validator.validate_irc("IRC Section 951A provides that...");
        assert!(!ok);

        let (valid, issues) = validator.validate_all("IRC Section 951A provides that...");
        assert!(!valid);
        assert!(issues.iter().any(|i| i.message.contains("not 'IRC Section'")));
    }

    #[test]
    fn test_irc_missing_symbol_flagged() {
        let mut validator = CitationValidator::new();
        let ok = validator.validate_irc("See IRC 951A for the general rule.");
        assert!(!ok);
    }

    #[test]
    fn test_valid_regulation() {
        let mut validator = CitationValidator::new();
        assert!(validator.validate_regulations("Treas. Reg. § 1.951A-2(b)(2)(i)"));
    }

    #[test]
    fn test_malformed_regulation_flagged() {
        let mut validator = CitationValidator::new();
        let ok = validator.validate_regulations("See Treas. Reg. 1.951-2 generally.");
        assert!(!ok);
    }

    #[test]
    fn test_complete_case_citation_passes() {
        let mut validator = CitationValidator::new();
        let text = "*WH Holdings, LLC v. United States*, 601 F.3d 1319, 1323 (Fed. Cir. 2010).";
        assert!(validator.validate_cases(text));
    }

    #[test]
    fn test_case_missing_reporter_flagged() {
        let mut validator = CitationValidator::new();
        let ok = validator.validate_cases("*Smith v. Commissioner* held otherwise");
        assert!(!ok);
    }

    #[test]
    fn test_notice_with_irb_passes() {
        let mut validator = CitationValidator::new();
        assert!(validator.validate_irb_guidance("Notice 2020-69, 2020-40 I.R.B. 600."));
    }

    #[test]
    fn test_notice_without_irb_flagged() {
        let mut validator = CitationValidator::new();
        let ok = validator.validate_irb_guidance("Notice 2020-69 addressed this.");
        assert!(!ok);
    }

    #[test]
    fn test_rev_rul_without_irb_flagged() {
        let mut validator = CitationValidator::new();
        let ok = validator.validate_irb_guidance("Rev. Rul. 2019-01 concluded...");
        assert!(!ok);
    }

    #[test]
    fn test_unverified_sentinel_flagged() {
        let mut validator = CitationValidator::new();
        let text = format!("See Notice 2020-69, 2020-40 I.R.B. 600 ({}).", UNVERIFIED_SENTINEL);
        let (valid, issues) = validator.validate_all(&text);
        assert!(!valid);
        assert!(issues.iter().any(|i| i.issue_type == IssueType::Verification));
    }

    #[test]
    fn test_url_without_access_date_flagged() {
        let mut validator = CitationValidator::new();
        let ok = validator.validate_general_format("Available at https://www.irs.gov/irb/2020");
        assert!(!ok);
    }

    #[test]
    fn test_url_with_access_date_passes() {
        let mut validator = CitationValidator::new();
        let ok = validator
            .validate_general_format("https://www.irs.gov/irb/2020 (accessed June 1, 2025)");
        assert!(ok);
    }

    #[test]
    fn test_validate_all_clean_text() {
        let mut validator = CitationValidator::new();
        let text = "IRC § 951A(c)(2) and Treas. Reg. § 1.951A-2(b) govern.";
        let (valid, issues) = validator.validate_all(text);
        assert!(valid);
        assert!(issues.is_empty());
    }

    #[test]
    fn test_citation_summary_counts() {
        let text = "IRC § 951A(c)(2) and IRC § 954(a) apply.\n\
                    See Treas. Reg. § 1.951A-2(b).\n\
                    Notice 2020-69, 2020-40 I.R.B. 600.";
        let summary = citation_summary(text);

        assert!(summary["irc_sections"] >= 2);
        assert!(summary["regulations"] >= 1);
        assert!(summary["notices"] >= 1);
        assert_eq!(summary["cases"], 0);
    }

    #[test]
    fn test_validate_specific_irc() {
        let (valid, _) = validate_specific("IRC § 951A(c)(2)(A)(i)", "irc").unwrap();
        assert!(valid);

        let (valid, msg) = validate_specific("IRC Section 951A", "irc").unwrap();
        assert!(!valid);
        assert!(msg.contains("irc"));
    }

    #[test]
    fn test_validate_specific_case() {
        let citation = "*WH Holdings, LLC v. United States*, 601 F.3d 1319, 1323 (Fed. Cir. 2010).";
        let (valid, _) = validate_specific(citation, "case").unwrap();
        assert!(valid);
    }

    #[test]
    fn test_validate_specific_unknown_kind_errors() {
        let err = validate_specific("IRC § 1", "statute").unwrap_err();
        assert!(matches!(err, TaxMemoError::InvalidCitationKind(_)));
    }

    #[test]
    fn test_line_numbers_reported() {
        let mut validator = CitationValidator::new();
        let text = "First line fine.\nSee IRC 951A here.";
        let (_, issues) = validator.validate_all(text);
        let issue = issues.iter().find(|i| i.message.contains('§')).unwrap();
        assert_eq!(issue.line_number, Some(2));
    }
}
