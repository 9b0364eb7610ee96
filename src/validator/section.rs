//! Heading detection and section extraction for memo text.
//!
//! A section is "found" when any line matches one of three heading shapes:
//! a markdown heading consisting of the name, a markdown heading where the
//! name is followed by a colon or more text, or a bold-emphasis line
//! starting with the name. Matching is case-insensitive and the first hit
//! wins, scanning top to bottom.

use regex::RegexBuilder;

/// Locate a section heading, returning its 1-based line number.
pub fn find_section(lines: &[&str], section_name: &str) -> Option<usize> {
    let escaped = regex::escape(section_name);
    let patterns = [
        format!(r"^#+\s*{}\s*$", escaped),
        format!(r"^#+\s*{}[:\s]", escaped),
        format!(r"^\*\*{}\*\*", escaped),
    ];

    let compiled: Vec<_> = patterns
        .iter()
        .map(|p| {
            RegexBuilder::new(p)
                .case_insensitive(true)
                .build()
                .expect("section patterns are valid")
        })
        .collect();

    for (i, line) in lines.iter().enumerate() {
        if compiled.iter().any(|re| re.is_match(line)) {
            return Some(i + 1);
        }
    }

    None
}

/// Extract the body of a section: every line strictly between the heading
/// and the next markdown heading of any level, trimmed. `None` if the
/// section heading is never found.
pub fn extract_section(lines: &[&str], section_name: &str) -> Option<String> {
    let start_line = find_section(lines, section_name)?;

    let mut content = Vec::new();
    for line in lines.iter().skip(start_line) {
        // Stop at the next heading
        if is_heading(line) {
            break;
        }
        content.push(*line);
    }

    Some(content.join("\n").trim().to_string())
}

fn is_heading(line: &str) -> bool {
    let mut chars = line.chars();
    match chars.next() {
        Some('#') => {
            let rest = chars.as_str();
            let after_hashes = rest.trim_start_matches('#');
            after_hashes.starts_with(char::is_whitespace)
        }
        _ => false,
    }
}
