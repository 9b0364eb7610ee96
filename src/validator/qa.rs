//! QA checklist engine.
//!
//! Runs a fixed battery of checks over a drafted memo: structure,
//! citations, formatting, word counts, risk assessment, and a
//! defense-in-depth sanitization scan. Every check lands in one of three
//! states: pass, fail, or warning (needs human judgment). Warnings never
//! block an overall pass.

use lazy_static::lazy_static;
use regex::Regex;
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use super::citation::{CitationValidator, UNVERIFIED_SENTINEL};
use super::section;

lazy_static! {
    static ref PINCITE_RE: Regex =
        Regex::new(r"(?:IRC\s*§|Treas\.\s*Reg\.\s*§|Art\.)\s*[\d\.]+[A-Z]?").unwrap();
    static ref CASE_COUNT_RE: Regex =
        Regex::new(r"\*[^*]+\*[^.]*\d+\s+[A-Z][A-Za-z0-9\.]*\s+\d+").unwrap();
    static ref SHEPARDIZE_RE: Regex = Regex::new(r"shepard|bcite|cite check").unwrap();
    static ref IRC_SECTION_WORD_RE: Regex = Regex::new(r"(?i)\bIRC\s+Section\s+\d+").unwrap();
    static ref VERSUS_RE: Regex = Regex::new(r"\b\w+\s+v\.\s+\w+\b").unwrap();
    static ref ITALIC_SPAN_RE: Regex = Regex::new(r"\*[^*\n]+\*").unwrap();
    static ref NUMBERED_ITEM_RE: Regex = Regex::new(r"(?m)^\s*\d+\.").unwrap();
    static ref BULLET_ITEM_RE: Regex = Regex::new(r"(?m)^\s*[-*]").unwrap();
    static ref LIKELIHOOD_RE: Regex = Regex::new(r"(?i)\b(?:low|medium|med|high)\b").unwrap();
    static ref EMAIL_LEAK_RE: Regex =
        Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap();
    static ref AMOUNT_LEAK_RE: Regex = Regex::new(r"\$\d+,\d{3},\d{3}(?:\.\d{2})").unwrap();
    static ref ENTITY_LEAK_RE: Regex =
        Regex::new(r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*\s+(?:LLC|Inc\.|Corp\.)").unwrap();
}

/// Fixed-vocabulary opinion levels, in detection priority order.
pub const OPINION_LEVELS: [&str; 4] = [
    "Reasonable authority",
    "Substantial authority",
    "More likely than not",
    "Should",
];

/// Outcome of a single QA check.
///
/// `Warning` marks checks that need human judgment (e.g. pincite accuracy)
/// and never counts against the overall pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    Pass,
    Fail,
    Warning,
}

impl CheckOutcome {
    pub fn from_bool(passed: bool) -> Self {
        if passed { CheckOutcome::Pass } else { CheckOutcome::Fail }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            CheckOutcome::Pass => "✓",
            CheckOutcome::Fail => "✗",
            CheckOutcome::Warning => "⚠",
        }
    }
}

// Serialized as true / false / null so JSON reports read naturally.
impl Serialize for CheckOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            CheckOutcome::Pass => serializer.serialize_bool(true),
            CheckOutcome::Fail => serializer.serialize_bool(false),
            CheckOutcome::Warning => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for CheckOutcome {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(match Option::<bool>::deserialize(deserializer)? {
            Some(true) => CheckOutcome::Pass,
            Some(false) => CheckOutcome::Fail,
            None => CheckOutcome::Warning,
        })
    }
}

/// Individual QA check result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaCheck {
    pub category: String,
    pub check_name: String,
    pub outcome: CheckOutcome,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub expected: String,
    #[serde(default)]
    pub actual: String,
    #[serde(default)]
    pub line_number: Option<usize>,
}

impl QaCheck {
    fn new(category: &str, check_name: impl Into<String>, outcome: CheckOutcome) -> Self {
        Self {
            category: category.to_string(),
            check_name: check_name.into(),
            outcome,
            details: String::new(),
            expected: String::new(),
            actual: String::new(),
            line_number: None,
        }
    }

    fn details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    fn expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = expected.into();
        self
    }

    fn actual(mut self, actual: impl Into<String>) -> Self {
        self.actual = actual.into();
        self
    }

    fn line(mut self, line_number: Option<usize>) -> Self {
        self.line_number = line_number;
        self
    }
}

/// Complete QA report.
///
/// Totals are always recomputed from the check list so they cannot drift
/// from the underlying checks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QaReport {
    pub total_checks: usize,
    pub passed_checks: usize,
    pub failed_checks: usize,
    pub warnings: usize,
    pub checks: Vec<QaCheck>,
}

impl QaReport {
    fn push(&mut self, check: QaCheck) {
        self.checks.push(check);
        self.recompute();
    }

    fn recompute(&mut self) {
        self.total_checks = self.checks.len();
        self.passed_checks =
            self.checks.iter().filter(|c| c.outcome == CheckOutcome::Pass).count();
        self.failed_checks =
            self.checks.iter().filter(|c| c.outcome == CheckOutcome::Fail).count();
        self.warnings =
            self.checks.iter().filter(|c| c.outcome == CheckOutcome::Warning).count();
    }

    /// "passed/total" score string.
    pub fn score(&self) -> String {
        format!("{}/{}", self.passed_checks, self.total_checks)
    }

    /// Overall pass: no failed checks. Warnings do not block.
    pub fn passed(&self) -> bool {
        self.failed_checks == 0
    }
}

/// Automated QA checklist validation for tax memos.
pub struct QaChecker {
    memo: String,
    memo_lower: String,
    self_identifier: String,
    report: QaReport,
}

impl QaChecker {
    /// Create a checker over the full memo text. `self_identifier` is the
    /// organization's own name prefix, excluded from the entity-leak scan.
    pub fn new(memo: impl Into<String>, self_identifier: impl Into<String>) -> Self {
        let memo = memo.into();
        Self {
            memo_lower: memo.to_lowercase(),
            memo,
            self_identifier: self_identifier.into(),
            report: QaReport::default(),
        }
    }

    /// Run the complete checklist and return the report.
    pub fn run_all_checks(&mut self) -> QaReport {
        self.check_structure();
        self.check_citations();
        self.check_formatting();
        self.check_word_counts();
        self.check_risk_assessment();
        self.check_sanitization();

        self.report.clone()
    }

    /// The report accumulated so far.
    pub fn report(&self) -> &QaReport {
        &self.report
    }

    fn lines(&self) -> Vec<&str> {
        self.memo.split('\n').collect()
    }

    /// Structure: every core section present, plus Red-Team and Exhibits.
    pub fn check_structure(&mut self) {
        let lines = self.lines();

        let core_sections =
            ["Executive Answer", "Issue Presented", "Facts", "Analysis", "Conclusion"];

        let mut found_checks = Vec::new();
        for section_name in core_sections {
            let line = section::find_section(&lines, section_name);
            let found = line.is_some();
            found_checks.push(
                QaCheck::new(
                    "Structure",
                    format!("Section: {}", section_name),
                    CheckOutcome::from_bool(found),
                )
                .details(match line {
                    Some(n) => format!("Found at line {}", n),
                    None => "Section not found".to_string(),
                })
                .line(line),
            );
        }

        // Red-Team accepts any of three heading variants
        let red_team_found = section::find_section(&lines, "Red-Team").is_some()
            || section::find_section(&lines, "Red Team").is_some()
            || section::find_section(&lines, "Counter-Arguments").is_some();
        found_checks.push(
            QaCheck::new(
                "Structure",
                "Section: Red-Team/Counter-Arguments",
                CheckOutcome::from_bool(red_team_found),
            )
            .details(if red_team_found { "Found" } else { "Section not found" }),
        );

        let exhibits_found = section::find_section(&lines, "Exhibits").is_some();
        found_checks.push(
            QaCheck::new("Structure", "Section: Exhibits", CheckOutcome::from_bool(exhibits_found))
                .details(if exhibits_found { "Found" } else { "Section not found" }),
        );

        for check in found_checks {
            self.report.push(check);
        }
    }

    /// Citations: delegate format validity, pincite presence, sentinel flags.
    pub fn check_citations(&mut self) {
        let mut validator = CitationValidator::new();
        let (valid, issues) = validator.validate_all(&self.memo);

        self.report.push(
            QaCheck::new(
                "Citations",
                "All citations properly formatted",
                CheckOutcome::from_bool(valid),
            )
            .details(if valid {
                "All citations valid".to_string()
            } else {
                format!("Found {} citation issues", issues.len())
            }),
        );

        // Pincite accuracy needs human eyes, so this is always a warning.
        let citations = PINCITE_RE.find_iter(&self.memo).count();
        self.report.push(
            QaCheck::new("Citations", "Citations include pincites", CheckOutcome::Warning)
                .details(format!("Found {} citations - verify pincites manually", citations))
                .actual(citations.to_string()),
        );

        let has_unknown = self.memo.contains(UNVERIFIED_SENTINEL);
        self.report.push(
            QaCheck::new(
                "Citations",
                "No unverified citations",
                CheckOutcome::from_bool(!has_unknown),
            )
            .details(if has_unknown {
                format!("Found '{}' flags", UNVERIFIED_SENTINEL)
            } else {
                "All citations appear verified".to_string()
            }),
        );

        let cases = CASE_COUNT_RE.find_iter(&self.memo).count();
        if cases > 0 {
            let shepardize_mentioned = SHEPARDIZE_RE.is_match(&self.memo_lower);
            self.report.push(
                QaCheck::new("Citations", "Case validation documented", CheckOutcome::Warning)
                    .details(format!(
                        "Found {} cases - Shepardization {}",
                        cases,
                        if shepardize_mentioned { "mentioned" } else { "not mentioned" }
                    ))
                    .actual(cases.to_string()),
            );
        }
    }

    /// Formatting: § usage, case italics, markdown headings.
    pub fn check_formatting(&mut self) {
        let bad_irc = IRC_SECTION_WORD_RE.find_iter(&self.memo).count();
        self.report.push(
            QaCheck::new(
                "Formatting",
                "IRC uses § symbol (not 'Section')",
                CheckOutcome::from_bool(bad_irc == 0),
            )
            .details(if bad_irc > 0 {
                format!("Found {} instances of 'IRC Section X'", bad_irc)
            } else {
                "Correct".to_string()
            }),
        );

        // A "Name v. Name" token counts as italicized when it sits inside
        // any *...* emphasis span.
        let italic_spans: Vec<(usize, usize)> =
            ITALIC_SPAN_RE.find_iter(&self.memo).map(|m| (m.start(), m.end())).collect();
        let potential_cases: Vec<_> = VERSUS_RE.find_iter(&self.memo).collect();
        let unitalicized: Vec<&str> = potential_cases
            .iter()
            .filter(|m| {
                !italic_spans.iter().any(|(start, end)| *start <= m.start() && m.end() <= *end)
            })
            .map(|m| m.as_str())
            .collect();

        if !potential_cases.is_empty() {
            self.report.push(
                QaCheck::new(
                    "Formatting",
                    "Case names italicized",
                    CheckOutcome::from_bool(unitalicized.is_empty()),
                )
                .details(if unitalicized.is_empty() {
                    "Correct".to_string()
                } else {
                    format!("Found {} potentially unitalicized cases", unitalicized.len())
                }),
            );
        }

        let headings = self.lines().iter().filter(|l| l.starts_with('#')).count();
        self.report.push(
            QaCheck::new(
                "Formatting",
                "Uses markdown headings",
                CheckOutcome::from_bool(headings > 0),
            )
            .details(format!("Found {} headings", headings))
            .actual(headings.to_string()),
        );
    }

    /// Word counts: Executive Answer limit, whole-memo floor.
    pub fn check_word_counts(&mut self) {
        let lines = self.lines();

        match section::extract_section(&lines, "Executive Answer") {
            Some(body) => {
                let word_count = body.split_whitespace().count();
                self.report.push(
                    QaCheck::new(
                        "Word Counts",
                        "Executive Answer ≤150 words",
                        CheckOutcome::from_bool(word_count <= 150),
                    )
                    .details(format!("{} words", word_count))
                    .expected("≤150")
                    .actual(word_count.to_string()),
                );
            }
            None => {
                self.report.push(
                    QaCheck::new("Word Counts", "Executive Answer ≤150 words", CheckOutcome::Fail)
                        .details("Executive Answer section not found"),
                );
            }
        }

        let total_words = self.memo.split_whitespace().count();
        self.report.push(
            QaCheck::new(
                "Word Counts",
                "Memo is substantial (>500 words)",
                CheckOutcome::from_bool(total_words > 500),
            )
            .details(format!("{} total words", total_words))
            .actual(total_words.to_string()),
        );
    }

    /// Risk assessment: opinion level, Red-Team counter-arguments.
    pub fn check_risk_assessment(&mut self) {
        let opinion_used: Option<&'static str> = OPINION_LEVELS
            .into_iter()
            .find(|level| self.memo_lower.contains(&level.to_lowercase()));

        self.report.push(
            QaCheck::new(
                "Risk Assessment",
                "Opinion level stated",
                CheckOutcome::from_bool(opinion_used.is_some()),
            )
            .details(match opinion_used {
                Some(level) => format!("Found: {}", level),
                None => "No opinion level found".to_string(),
            })
            .actual(opinion_used.unwrap_or("None")),
        );

        let lines = self.lines();
        let red_team = section::extract_section(&lines, "Red-Team")
            .or_else(|| section::extract_section(&lines, "Red Team"));

        if let Some(body) = red_team {
            let numbered = NUMBERED_ITEM_RE.find_iter(&body).count();
            let bullets = BULLET_ITEM_RE.find_iter(&body).count();
            let counter_args = numbered.max(bullets);

            self.report.push(
                QaCheck::new(
                    "Risk Assessment",
                    "Red-Team has 3 counter-arguments",
                    CheckOutcome::from_bool(counter_args >= 3),
                )
                .details(format!("Found {} counter-arguments", counter_args))
                .expected("3")
                .actual(counter_args.to_string()),
            );

            let has_likelihood = LIKELIHOOD_RE.is_match(&body);
            self.report.push(
                QaCheck::new(
                    "Risk Assessment",
                    "Counter-arguments include likelihood",
                    CheckOutcome::from_bool(has_likelihood),
                )
                .details(if has_likelihood {
                    "Likelihood assessments found"
                } else {
                    "No likelihood assessments found"
                }),
            );
        }

        // Whether the risk section belongs at all depends on the risk level,
        // which only a reviewer can judge.
        let has_risk_section = self.memo.contains("Risk & Penalty Shield")
            || self.memo.contains("Risk and Penalty Shield");
        self.report.push(
            QaCheck::new(
                "Risk Assessment",
                "Risk & Penalty Shield section appropriateness",
                CheckOutcome::Warning,
            )
            .details(if has_risk_section {
                "Risk section present - verify only included if risk > Medium"
            } else {
                "No risk section - acceptable if risk ≤ Medium"
            }),
        );
    }

    /// Sanitization: scan the drafted memo itself for leaked identifiers.
    pub fn check_sanitization(&mut self) {
        let mut findings = Vec::new();

        let emails = EMAIL_LEAK_RE.find_iter(&self.memo).count();
        if emails > 0 {
            findings.push(format!("Found {} email addresses", emails));
        }

        let amounts = AMOUNT_LEAK_RE.find_iter(&self.memo).count();
        if amounts > 0 {
            findings.push(format!("Found {} specific dollar amounts", amounts));
        }

        let entities = ENTITY_LEAK_RE
            .find_iter(&self.memo)
            .filter(|m| {
                self.self_identifier.is_empty() || !m.as_str().starts_with(&self.self_identifier)
            })
            .count();
        if entities > 0 {
            findings.push(format!("Found {} named entities (verify sanitized)", entities));
        }

        let sanitized = findings.is_empty();
        self.report.push(
            QaCheck::new(
                "Sanitization",
                "Facts appear sanitized",
                CheckOutcome::from_bool(sanitized),
            )
            .details(if sanitized { "Looks sanitized".to_string() } else { findings.join("; ") }),
        );
    }
}

/// Render a human-readable text report.
pub fn generate_qa_report_text(report: &QaReport) -> String {
    let mut lines = Vec::new();
    let rule = "=".repeat(60);

    lines.push(rule.clone());
    lines.push(format!("QA REPORT: {}", report.score()));
    lines.push(format!("Status: {}", if report.passed() { "✓ PASSED" } else { "✗ FAILED" }));
    lines.push(rule.clone());
    lines.push(String::new());

    // Group by category, preserving first-seen order
    let mut categories: Vec<(&str, Vec<&QaCheck>)> = Vec::new();
    for check in &report.checks {
        match categories.iter_mut().find(|(name, _)| *name == check.category) {
            Some((_, checks)) => checks.push(check),
            None => categories.push((check.category.as_str(), vec![check])),
        }
    }

    for (category, checks) in categories {
        lines.push(format!("\n{}:", category.to_uppercase()));
        lines.push("-".repeat(60));

        for check in checks {
            lines.push(format!("  {} {}", check.outcome.symbol(), check.check_name));
            if !check.details.is_empty() {
                lines.push(format!("      {}", check.details));
            }
            if !check.expected.is_empty() && !check.actual.is_empty() {
                lines.push(format!("      Expected: {}, Actual: {}", check.expected, check.actual));
            }
        }
    }

    lines.push(format!("\n{}", rule));
    lines.push(format!(
        "Summary: {} passed, {} failed, {} warnings",
        report.passed_checks, report.failed_checks, report.warnings
    ));
    lines.push(rule);

    lines.join("\n")
}
