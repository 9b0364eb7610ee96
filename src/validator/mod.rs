//! Memo validators: citation house style and the QA checklist.

pub use self::citation::{
    CitationIssue, CitationKind, CitationValidator, IssueType, UNVERIFIED_SENTINEL,
    citation_summary, validate_specific,
};
pub use self::qa::{
    CheckOutcome, OPINION_LEVELS, QaCheck, QaChecker, QaReport, generate_qa_report_text,
};
pub use self::section::{extract_section, find_section};

mod citation;
mod qa;
mod section;
