//! The ordered redaction passes.
//!
//! Each pass is a free function taking the shared [`SanitizationContext`]
//! and the current text, returning the rewritten text. Order matters:
//! entities go first so person patterns never fire inside company names,
//! and dates go last so anchor phrases survive the earlier rewrites intact.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use super::context::SanitizationContext;

lazy_static! {
    /// Legal-entity names: capitalized words followed by a legal suffix.
    static ref ENTITY_PATTERNS: Vec<Regex> = vec![
        // LLC, Inc, Corp, Ltd variants. Single-letter words are allowed so
        // lettered series entities ("Orchard A LLC") redact correctly.
        Regex::new(
            r"\b([A-Z][a-zA-Z&'\-]*(?:\s+[A-Z][a-zA-Z&'\-]*)*)\s+(?:LLC|L\.L\.C\.|Inc\.|Incorporated|Corp\.|Corporation|Ltd\.|Limited|LLP|L\.P\.|LP)"
        )
        .unwrap(),
        // GmbH, AG, SA, BV (international entities)
        Regex::new(
            r"\b([A-Z][a-zA-Z&'\-]*(?:\s+[A-Z][a-zA-Z&'\-]*)*)\s+(?:GmbH|AG|SA|SAS|BV|NV|AB|SpA|Oy)"
        )
        .unwrap(),
    ];

    /// `Name, Title` and `Name (Title)` forms with the fixed title vocabulary.
    static ref PERSON_TITLE_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"\b([A-Z][a-z]+\s+[A-Z][a-z]+),?\s+(CFO|CEO|President|VP|Vice President)")
            .unwrap(),
        Regex::new(r"\b([A-Z][a-z]+\s+[A-Z][a-z]+),?\s+(Manager|Director|Controller|Treasurer)")
            .unwrap(),
        Regex::new(r"\b([A-Z][a-z]+\s+[A-Z][a-z]+)\s+\((CFO|CEO|Manager|Director|VP)\)").unwrap(),
    ];

    /// Names anchored by a preceding verb ("signed by John Smith").
    static ref PERSON_CONTEXT_PATTERN: Regex =
        Regex::new(r"(?i)(?:signed by|prepared by|reviewed by|contact)\s+([A-Z][a-z]+\s+[A-Z][a-z]+)")
            .unwrap();

    /// Currency amounts with optional cents, scale word, and ISO code.
    static ref AMOUNT_PATTERN: Regex =
        Regex::new(r"(?i)\$\s*[\d,]+(?:\.\d{2})?(?:\s*(?:million|billion|thousand|USD|EUR|GBP))?")
            .unwrap();

    /// Spelled-out amounts ending in "dollar(s)".
    static ref WRITTEN_AMOUNT_PATTERN: Regex = Regex::new(
        r"(?i)\b(?:one|two|three|four|five|six|seven|eight|nine|ten|twenty|thirty|forty|fifty|hundred|thousand|million|billion)\s+(?:hundred|thousand|million|billion)?\s*dollars?\b"
    )
    .unwrap();

    static ref EMAIL_PATTERN: Regex =
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap();

    /// Dates are only redacted behind these anchor phrases; group 1 is the
    /// date token to replace.
    static ref SENSITIVE_DATE_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)(?:signed on|executed on|dated)\s+([A-Z][a-z]+\s+\d{1,2},\s+\d{4})")
            .unwrap(),
        Regex::new(r"(?i)(?:birth date|DOB|born on)\s*:?\s*(\d{1,2}/\d{1,2}/\d{4})").unwrap(),
    ];
}

/// Replace company/entity names with stable placeholders.
pub fn sanitize_entities(ctx: &mut SanitizationContext, text: &str) -> String {
    let mut result = text.to_string();
    for pattern in ENTITY_PATTERNS.iter() {
        result = pattern
            .replace_all(&result, |caps: &Captures| {
                ctx.entity_placeholder(&caps[0])
            })
            .into_owned();
    }
    result
}

/// Replace personal names with role or numbered placeholders.
pub fn sanitize_people(ctx: &mut SanitizationContext, text: &str) -> String {
    let mut result = text.to_string();

    // Title-anchored: "John Smith, CFO" or "Jane Doe (Manager)" → "[CFO]"
    for pattern in PERSON_TITLE_PATTERNS.iter() {
        result = pattern
            .replace_all(&result, |caps: &Captures| {
                ctx.person_title_placeholder(&caps[1], &caps[2])
            })
            .into_owned();
    }

    // Context-anchored: keep the verb, replace only the name.
    result = PERSON_CONTEXT_PATTERN
        .replace_all(&result, |caps: &Captures| {
            let name = caps[1].to_string();
            let placeholder = ctx.person_numbered_placeholder(&name);
            caps[0].replace(&name, &placeholder)
        })
        .into_owned();

    result
}

/// Redact dollar amounts, both symbolic and spelled out.
pub fn sanitize_amounts(ctx: &mut SanitizationContext, text: &str) -> String {
    let stub = if ctx.preserve_structure { "[Amount]" } else { "[REDACTED]" };

    let result = AMOUNT_PATTERN
        .replace_all(text, |caps: &Captures| {
            ctx.report.record_amount(&caps[0]);
            stub.to_string()
        })
        .into_owned();

    WRITTEN_AMOUNT_PATTERN
        .replace_all(&result, |caps: &Captures| {
            ctx.report.record_amount(&caps[0]);
            stub.to_string()
        })
        .into_owned()
}

/// Remove email addresses.
pub fn sanitize_emails(ctx: &mut SanitizationContext, text: &str) -> String {
    EMAIL_PATTERN
        .replace_all(text, |caps: &Captures| {
            ctx.report.record_email(&caps[0]);
            "[Email]".to_string()
        })
        .into_owned()
}

/// Redact dates that follow a sensitive anchor phrase, keeping the anchor.
///
/// Dates elsewhere in the text are left alone so useful chronology survives.
pub fn sanitize_specific_dates(ctx: &mut SanitizationContext, text: &str) -> String {
    let mut result = text.to_string();
    for pattern in SENSITIVE_DATE_PATTERNS.iter() {
        result = pattern
            .replace_all(&result, |caps: &Captures| {
                let date = caps[1].to_string();
                ctx.report.record_date(&date);
                caps[0].replace(&date, "[Date]")
            })
            .into_owned();
    }
    result
}
