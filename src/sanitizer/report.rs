//! Redaction report accumulated while sanitizing a document.

use serde::{Deserialize, Serialize};

/// Summary of what was redacted from a single document.
///
/// Counters are bumped by the passes as they rewrite text; `details` holds
/// one human-readable line per redaction in the order they happened.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RedactionReport {
    pub entities_redacted: usize,
    pub people_redacted: usize,
    pub amounts_redacted: usize,
    pub emails_redacted: usize,
    pub dates_redacted: usize,
    pub total_redactions: usize,
    pub details: Vec<String>,
}

impl RedactionReport {
    /// Record an entity redaction.
    pub fn record_entity(&mut self, original: &str, placeholder: &str) {
        self.details.push(format!("Entity: {} → {}", original, placeholder));
        self.entities_redacted += 1;
        self.total_redactions += 1;
    }

    /// Record a person redaction.
    pub fn record_person(&mut self, original: &str, placeholder: &str) {
        self.details.push(format!("Person: {} → {}", original, placeholder));
        self.people_redacted += 1;
        self.total_redactions += 1;
    }

    /// Record an amount redaction.
    pub fn record_amount(&mut self, original: &str) {
        self.details.push(format!("Amount redacted: {}", original));
        self.amounts_redacted += 1;
        self.total_redactions += 1;
    }

    /// Record an email redaction.
    pub fn record_email(&mut self, original: &str) {
        self.details.push(format!("Email redacted: {}", original));
        self.emails_redacted += 1;
        self.total_redactions += 1;
    }

    /// Record a sensitive-date redaction.
    pub fn record_date(&mut self, original: &str) {
        self.details.push(format!("Date redacted: {}", original));
        self.dates_redacted += 1;
        self.total_redactions += 1;
    }
}
