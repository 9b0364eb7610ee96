//! Fact sanitizer.
//!
//! Redacts confidential information from raw fact patterns before they are
//! shared with external services or pasted into memos. Pure pattern
//! matching over in-memory text: no network calls, no persistence, and the
//! same input always produces the same output for a fresh sanitizer.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::Result;

pub use self::context::SanitizationContext;
pub use self::report::RedactionReport;

mod context;
mod passes;
mod report;

/// Sanitize confidential information from text.
///
/// Passes run in a fixed order: entities, people, amounts, emails, then
/// sensitive dates. Each document should use a fresh sanitizer so the
/// placeholder maps start empty.
#[derive(Debug)]
pub struct FactSanitizer {
    ctx: SanitizationContext,
}

impl Default for FactSanitizer {
    fn default() -> Self {
        Self::new(true, "")
    }
}

impl FactSanitizer {
    /// Create a sanitizer.
    ///
    /// `preserve_structure` keeps labeled placeholders like `[Amount]`
    /// instead of a generic `[REDACTED]` stub. `self_identifier` is the
    /// organization's own name prefix, used to tell own-side entities from
    /// third parties.
    pub fn new(preserve_structure: bool, self_identifier: impl Into<String>) -> Self {
        Self {
            ctx: SanitizationContext::new(preserve_structure, self_identifier),
        }
    }

    /// Apply all sanitization rules and return the rewritten text.
    pub fn sanitize_text(&mut self, text: &str) -> String {
        let text = passes::sanitize_entities(&mut self.ctx, text);
        let text = passes::sanitize_people(&mut self.ctx, &text);
        let text = passes::sanitize_amounts(&mut self.ctx, &text);
        let text = passes::sanitize_emails(&mut self.ctx, &text);
        passes::sanitize_specific_dates(&mut self.ctx, &text)
    }

    /// The report accumulated across every call to [`sanitize_text`].
    ///
    /// [`sanitize_text`]: FactSanitizer::sanitize_text
    pub fn report(&self) -> &RedactionReport {
        &self.ctx.report
    }

    /// Placeholder → original mapping, for internal unredaction only.
    pub fn reverse_map(&self) -> HashMap<String, String> {
        self.ctx.reverse_map()
    }
}

/// Sanitize `input` and write the result to `output`, returning the report.
pub fn sanitize_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    preserve_structure: bool,
    self_identifier: &str,
) -> Result<RedactionReport> {
    let text = fs::read_to_string(input)?;

    let mut sanitizer = FactSanitizer::new(preserve_structure, self_identifier);
    let sanitized = sanitizer.sanitize_text(&text);

    fs::write(output, sanitized)?;
    Ok(sanitizer.report().clone())
}

/// One-shot sanitization helper.
pub fn quick_sanitize(text: &str) -> (String, RedactionReport) {
    let mut sanitizer = FactSanitizer::default();
    let sanitized = sanitizer.sanitize_text(text);
    let report = sanitizer.report().clone();
    (sanitized, report)
}
