//! Mutable state threaded through the sanitization passes.
//!
//! All placeholder maps and counters live here so the passes themselves can
//! stay free functions over `(&mut SanitizationContext, &str)`.

use std::collections::HashMap;

use super::report::RedactionReport;

/// Per-document sanitization state.
///
/// Owns the entity and person placeholder maps plus the counters that drive
/// label allocation. Entities share one counter across own-side and
/// third-party names; context-anchored people use a separate counter.
/// Identical input strings always resolve to the same placeholder within one
/// context, so a document stays internally consistent after redaction.
#[derive(Debug, Default)]
pub struct SanitizationContext {
    /// Replace values with labeled placeholders instead of a generic stub.
    pub preserve_structure: bool,
    /// Prefix identifying the organization's own entities (empty disables
    /// own-side classification).
    pub self_identifier: String,

    entity_counter: usize,
    person_counter: usize,
    entity_map: HashMap<String, String>,
    person_map: HashMap<String, String>,
    pub report: RedactionReport,
}

impl SanitizationContext {
    pub fn new(preserve_structure: bool, self_identifier: impl Into<String>) -> Self {
        Self {
            preserve_structure,
            self_identifier: self_identifier.into(),
            ..Default::default()
        }
    }

    /// Look up or assign the placeholder for an entity span.
    ///
    /// Labels run `A..Z` for the first 26 distinct entities, then fall back
    /// to decimal. The counter is shared between own-side and third-party
    /// entities.
    pub fn entity_placeholder(&mut self, entity: &str) -> String {
        if let Some(existing) = self.entity_map.get(entity) {
            return existing.clone();
        }

        self.entity_counter += 1;
        let label = Self::counter_label(self.entity_counter);

        let own_side =
            !self.self_identifier.is_empty() && entity.starts_with(&self.self_identifier);
        let placeholder = if own_side {
            format!("[{} Entity {}]", self.self_identifier, label)
        } else {
            format!("[Third Party Entity {}]", label)
        };

        self.entity_map.insert(entity.to_string(), placeholder.clone());
        self.report.record_entity(entity, &placeholder);
        placeholder
    }

    /// Look up or assign the role placeholder for a title-anchored name.
    pub fn person_title_placeholder(&mut self, name: &str, title: &str) -> String {
        if let Some(existing) = self.person_map.get(name) {
            return existing.clone();
        }

        let placeholder = format!("[{}]", title);
        self.person_map.insert(name.to_string(), placeholder.clone());
        self.report.record_person(name, &placeholder);
        placeholder
    }

    /// Look up or assign a numbered placeholder for a context-anchored name.
    ///
    /// Uses its own counter, independent of the entity sequence.
    pub fn person_numbered_placeholder(&mut self, name: &str) -> String {
        if let Some(existing) = self.person_map.get(name) {
            return existing.clone();
        }

        self.person_counter += 1;
        let placeholder = format!("[Person {}]", self.person_counter);
        self.person_map.insert(name.to_string(), placeholder.clone());
        self.report.record_person(name, &placeholder);
        placeholder
    }

    /// Placeholder → original mapping for internal unredaction.
    pub fn reverse_map(&self) -> HashMap<String, String> {
        self.entity_map
            .iter()
            .chain(self.person_map.iter())
            .map(|(original, placeholder)| (placeholder.clone(), original.clone()))
            .collect()
    }

    /// Number of distinct entities mapped so far.
    pub fn entity_count(&self) -> usize {
        self.entity_map.len()
    }

    fn counter_label(n: usize) -> String {
        if n <= 26 {
            char::from(b'A' + (n as u8 - 1)).to_string()
        } else {
            n.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_placeholder_stable() {
        let mut ctx = SanitizationContext::new(true, "Orchard");
        let first = ctx.entity_placeholder("Maple Trading LLC");
        let second = ctx.entity_placeholder("Maple Trading LLC");

        assert_eq!(first, second);
        assert_eq!(ctx.report.entities_redacted, 1);
    }

    #[test]
    fn test_entity_counter_shared_across_categories() {
        let mut ctx = SanitizationContext::new(true, "Orchard");
        let own = ctx.entity_placeholder("Orchard Grain LLC");
        let third = ctx.entity_placeholder("Maple Trading LLC");

        assert_eq!(own, "[Orchard Entity A]");
        assert_eq!(third, "[Third Party Entity B]");
    }

    #[test]
    fn test_entity_label_falls_back_to_numbers() {
        let mut ctx = SanitizationContext::new(true, "");
        for i in 0..26 {
            ctx.entity_placeholder(&format!("Entity Number{} LLC", i));
        }
        let overflow = ctx.entity_placeholder("Entity Overflow LLC");
        assert_eq!(overflow, "[Third Party Entity 27]");
    }

    #[test]
    fn test_empty_self_identifier_is_third_party() {
        let mut ctx = SanitizationContext::new(true, "");
        let placeholder = ctx.entity_placeholder("Orchard Grain LLC");
        assert!(placeholder.starts_with("[Third Party Entity"));
    }

    #[test]
    fn test_person_title_placeholder_keyed_by_name() {
        let mut ctx = SanitizationContext::new(true, "");
        let first = ctx.person_title_placeholder("John Smith", "CFO");
        let second = ctx.person_title_placeholder("John Smith", "CEO");

        // The name was already mapped, so the original role sticks.
        assert_eq!(first, "[CFO]");
        assert_eq!(second, "[CFO]");
        assert_eq!(ctx.report.people_redacted, 1);
    }

    #[test]
    fn test_person_counter_independent_of_entities() {
        let mut ctx = SanitizationContext::new(true, "");
        ctx.entity_placeholder("Maple Trading LLC");
        ctx.entity_placeholder("Cedar Holdings Inc.");
        let person = ctx.person_numbered_placeholder("Jane Doe");

        assert_eq!(person, "[Person 1]");
    }

    #[test]
    fn test_person_numbered_placeholder_stable() {
        let mut ctx = SanitizationContext::new(true, "");
        let first = ctx.person_numbered_placeholder("Jane Doe");
        let second = ctx.person_numbered_placeholder("Jane Doe");
        let other = ctx.person_numbered_placeholder("Jim Beam");

        assert_eq!(first, second);
        assert_eq!(other, "[Person 2]");
        assert_eq!(ctx.report.people_redacted, 2);
    }

    #[test]
    fn test_reverse_map_round_trip() {
        let mut ctx = SanitizationContext::new(true, "Orchard");
        let entity = ctx.entity_placeholder("Maple Trading LLC");
        let person = ctx.person_title_placeholder("John Smith", "CFO");

        let reverse = ctx.reverse_map();
        assert_eq!(reverse.get(&entity).unwrap(), "Maple Trading LLC");
        assert_eq!(reverse.get(&person).unwrap(), "John Smith");
    }
}
