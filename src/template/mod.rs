//! Memo and research-plan template generation.
//!
//! Renders blank house-style documents with Handlebars. The templates carry
//! every required section so a drafter starts from a structure the QA
//! checklist will accept.

use chrono::Local;
use handlebars::Handlebars;
use serde_json::json;

use crate::error::{Result, TaxMemoError};

const MEMO_TEMPLATE: &str = r#"# International Tax Memo: {{matter_title}}

**Date:** {{date}}
**Prepared by:** {{author}}
**Matter:** {{matter_title}}

---

## Executive Answer

[Provide bottom-line answer in ≤150 words. State the conclusion first, then key supporting points. No citations unless critical.]

---

## Issue Presented

{{question}}

---

## Facts (Sanitized)

[Concise bullets of essential facts. Use placeholders for entities: [Entity A], [Entity B]. Redact confidential figures unless essential.]

-
-
-

---

## Law & Authorities

[Primary sources first, with pincites. List in logical order.]

### U.S. Statutes & Regulations

- IRC § [section]([subsection])
- Treas. Reg. § [regulation]

### IRS Guidance

- Notice [number], [IRB citation]
- Rev. Rul. [number], [IRB citation]

### Cases

- *[Case Name]*, [Reporter] [Page], [Pincite] ([Court] [Year])

### Treaties & Technical Explanations

- [Treaty name], Art. [number]

### OECD Guidance

- OECD Model Tax Convention, Art. [number], Commentary ¶[number]

### Secondary Sources (if applicable - label clearly)

- [Source] (secondary)

---

## Analysis

[Apply law to facts. Organize by sub-issue. Address counterpoints inline.]

### Sub-Issue 1: [Title]

[Analysis with citations]

### Sub-Issue 2: [Title]

[Analysis with citations]

---

## Conclusion

On balance, we assess **[Opinion Level]** that [restate conclusion].

Opinion levels:
- **Reasonable authority** (~20-30%): Non-frivolous basis in law
- **Substantial authority** (~35-45%): Substantial weight of authorities
- **More likely than not** (>50%): Likely to be sustained
- **Should** (~70-80%): High confidence

[2-3 sentences explaining why this level is appropriate based on authorities and facts]

---

## Red-Team (Counter-Arguments)

[Present 3 strongest counter-arguments, each with: (1) thesis, (2) authority cite, (3) likelihood (Low/Med/High), (4) mitigation]

### 1. [Counter-Argument Title]

**Thesis:** [Brief description]

**Authority:** [Citation]

**Likelihood:** [Low/Medium/High]

**Mitigation:** [How to address]

### 2. [Counter-Argument Title]

**Thesis:** [Brief description]

**Authority:** [Citation]

**Likelihood:** [Low/Medium/High]

**Mitigation:** [How to address]

### 3. [Counter-Argument Title]

**Thesis:** [Brief description]

**Authority:** [Citation]

**Likelihood:** [Low/Medium/High]

**Mitigation:** [How to address]

---

## Risk & Penalty Shield

[Include ONLY if overall risk > Medium]

[Discuss reasonable-cause defense, substantial authority standard, and documentation requirements. Reference contemporaneous records needed.]

---

## Follow-Ups & Assumptions

### Assumptions

1.
2.
3.

### Follow-Up Questions

1.
2.
3.

### Additional Data Needed

-
-

---

## Exhibits / Evidence List

- **Ex. A** — [Description]
- **Ex. B** — [Description]
- **Ex. C** — [Description]

---

## QA Checklist

- [ ] All required sections present
- [ ] Executive Answer ≤150 words
- [ ] Citations properly formatted with pincites
- [ ] Cases use Bluebook format
- [ ] IRC citations use § symbol
- [ ] IRS guidance includes I.R.B. citations
- [ ] Opinion level stated in Conclusion
- [ ] Red-Team has 3 counter-arguments with likelihoods
- [ ] Risk section included only if risk > Medium
- [ ] Facts sanitized (no client identifiers)
- [ ] URLs include date accessed
- [ ] No fabricated citations
- [ ] Cases Shepardized (evidence on file)

**Reviewer:** _________________ **Date:** _________

---

*This memo is attorney work product prepared for internal use. Confidential and privileged.*
"#;

const RESEARCH_PLAN_TEMPLATE: &str = r#"# Research Plan: {{matter_title}}

**Date:** {{date}}
**Question:** {{question}}

---

## 1) Matter Snapshot

- **Short Title:** {{matter_title}}
- **Question to Answer:** {{question}}
- **Jurisdictions / Regimes:** [US Subpart F/GILTI; OECD Pillar Two; Treaty X-Y; Country A/B]
- **Time Period / Tax Years:** [Specify]
- **Deliverable:** Executive answer + Practitioner memo
- **Deadline:** [Date]

---

## 2) Facts (Sanitized)

[3-10 bullets of essential facts. Remove/mask identifiers.]

-
-
-

---

## 3) Issues & Sub-Issues

1. **[Sub-issue #1]**
   - Hypothesis / what would prove or refute:

2. **[Sub-issue #2]**
   - Hypothesis:

3. **[Sub-issue #3]**
   - Hypothesis:

---

## 4) Authorities to Consult

### 4.1 U.S. Primary

- **IRC:** § [section]
- **Treasury Regulations:** § [regulation]
- **IRS Guidance:** Notice [number]; Rev. Rul. [number]
- **Cases:** [Bluebook cites with pincites]

### 4.2 OECD / Pillar Two

- **Model Convention:** Art. [number], Commentary ¶[number]
- **Administrative Guidance:** §[section] ([Month YYYY] update)

### 4.3 Treaties & Technical Explanations

- **Treaty (X-Y):** Art. [number], LOB provisions
- **Technical Explanation:** pages [number]

### 4.4 Local Law

- **Statutes:** [citation]
- **Regulations:** [citation]
- **Official translations:** [Yes/No]

### 4.5 Secondary (label as secondary)

- [Big Four / law firm memos]
- [Treatises / journals]

---

## 5) Search Strategy & Source Locations

### Government Portals

- IRS.gov: [specific pages]
- OECD.org: [specific pages]
- EUR-Lex / official gazettes: [if applicable]

### Search Strings

- `"[term]" + site:irs.gov + "IRC"`
- `"[term]" + site:oecd.org + "Article X"`

### Case Law

- [Public sources; note Shepardization needed]

---

## 6) Expected Deliverables & Exhibits

### Tables/Appendices

- [ ] Treaty LOB/BO table
- [ ] PE risk grid
- [ ] Withholding rate matrix
- [ ] Other: [specify]

---

## 7) Assumptions, Unknowns, Data Requests

### Assumptions (to proceed)

1.
2.
3.

### Unknowns / Clarifications Needed

1.
2.
3.

### Data / Documents to Request

- Contracts
- Org charts
- Payment logs
- TP documentation
- Other:

---

## 8) Risk Forecasters (Early View)

- **Sub-issue #1:** [Reasonable authority / Substantial authority / MLTN / Should] (tentative)
- **Sub-issue #2:** [Level] (tentative)
- **Overall:** [Level] (tentative)

**Penalty shield needed:** [Yes/No - only if overall risk > Medium]

---

## 9) Plan Approval

- **Reviewer:** [Name]
- **Date:** [Date]
- **Decision:** [Approved / Revise: ...]
- **Notes:**

---
"#;

/// Renders blank memo and research-plan documents.
pub struct MemoTemplate {
    handlebars: Handlebars<'static>,
}

impl Default for MemoTemplate {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoTemplate {
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        // Markdown output, never HTML-escape
        handlebars.register_escape_fn(handlebars::no_escape);
        Self { handlebars }
    }

    /// Generate a blank memo with all required sections.
    ///
    /// `author` defaults to a placeholder and `date` to today.
    pub fn blank_memo(
        &self,
        matter_title: &str,
        question: &str,
        author: Option<&str>,
        date: Option<&str>,
    ) -> Result<String> {
        let context = json!({
            "matter_title": matter_title,
            "question": question,
            "author": author.unwrap_or("[Author]"),
            "date": date.map(str::to_string).unwrap_or_else(today),
        });

        self.handlebars
            .render_template(MEMO_TEMPLATE, &context)
            .map_err(|e| TaxMemoError::Template(format!("Failed to render memo template: {}", e)))
    }

    /// Generate a research-plan template.
    pub fn research_plan(&self, matter_title: &str, question: &str) -> Result<String> {
        let context = json!({
            "matter_title": matter_title,
            "question": question,
            "date": today(),
        });

        self.handlebars
            .render_template(RESEARCH_PLAN_TEMPLATE, &context)
            .map_err(|e| TaxMemoError::Template(format!("Failed to render plan template: {}", e)))
    }
}

fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// Quick helper to generate a blank memo.
pub fn generate_memo(matter_title: &str, question: &str) -> Result<String> {
    MemoTemplate::new().blank_memo(matter_title, question, None, None)
}

/// Quick helper to generate a research plan.
pub fn generate_research_plan(matter_title: &str, question: &str) -> Result<String> {
    MemoTemplate::new().research_plan(matter_title, question)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::{QaChecker, find_section};

    #[test]
    fn test_blank_memo_substitutes_fields() {
        let memo = MemoTemplate::new()
            .blank_memo("GILTI Inclusion", "Does § 951A apply?", Some("A. Reviewer"), Some("2025-01-15"))
            .unwrap();

        assert!(memo.contains("# International Tax Memo: GILTI Inclusion"));
        assert!(memo.contains("Does § 951A apply?"));
        assert!(memo.contains("**Prepared by:** A. Reviewer"));
        assert!(memo.contains("**Date:** 2025-01-15"));
    }

    #[test]
    fn test_blank_memo_defaults() {
        let memo = generate_memo("Test Matter", "Question?").unwrap();
        assert!(memo.contains("[Author]"));
    }

    #[test]
    fn test_blank_memo_has_all_core_sections() {
        let memo = generate_memo("Test Matter", "Question?").unwrap();
        let lines: Vec<&str> = memo.split('\n').collect();

        for section in
            ["Executive Answer", "Issue Presented", "Facts", "Analysis", "Conclusion", "Exhibits"]
        {
            assert!(find_section(&lines, section).is_some(), "missing section: {}", section);
        }
    }

    #[test]
    fn test_blank_memo_structure_satisfies_qa() {
        let memo = generate_memo("Test Matter", "Question?").unwrap();
        let mut checker = QaChecker::new(memo, "");
        checker.check_structure();

        let failed = checker.report().failed_checks;
        assert_eq!(failed, 0);
    }

    #[test]
    fn test_research_plan_sections() {
        let plan = generate_research_plan("Pillar Two ETR", "Is the ETR below 15%?").unwrap();

        assert!(plan.contains("# Research Plan: Pillar Two ETR"));
        assert!(plan.contains("Is the ETR below 15%?"));
        assert!(plan.contains("## 1) Matter Snapshot"));
        assert!(plan.contains("## 8) Risk Forecasters (Early View)"));
        assert!(plan.contains("## 9) Plan Approval"));
    }

    #[test]
    fn test_templates_do_not_escape_markdown() {
        let memo = generate_memo("A & B Venture", "Apply § 954?").unwrap();
        assert!(memo.contains("A & B Venture"));
        assert!(!memo.contains("&amp;"));
    }
}
