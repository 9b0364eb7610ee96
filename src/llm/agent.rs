//! Research agent: LLM-backed drafting and review.
//!
//! Thin orchestration over an [`LlmClient`]: builds prompts, sends them,
//! and parses JSON out of the completions. A completion that does not parse
//! is surfaced as [`AgentReview::Unparsed`] carrying the raw response, never
//! as an error, so callers can fall back to the rule-based checks.

use serde::Deserialize;

use crate::error::Result;
use crate::llm::client::LlmClient;
use crate::llm::types::CompletionRequest;

const DRAFTING_SYSTEM_PROMPT: &str =
    "You are an international tax expert drafting practitioner-grade tax memos.";

const CITATION_SYSTEM_PROMPT: &str = "You are a tax citation expert. Review citations for:
1. Proper format (IRC §, Treas. Reg. §, Bluebook cases)
2. Pincites present
3. Public URLs included where applicable
4. No hallucinated citations
5. Primary sources cited before secondary
6. Treaties include article numbers

Flag any suspicious or improperly formatted citations.";

/// Result of an LLM review pass: either parsed structured output, or the
/// raw completion when it was not valid JSON.
#[derive(Debug, Clone)]
pub enum AgentReview<T> {
    Parsed(T),
    Unparsed { raw: String },
}

impl<T> AgentReview<T> {
    pub fn parsed(&self) -> Option<&T> {
        match self {
            AgentReview::Parsed(value) => Some(value),
            AgentReview::Unparsed { .. } => None,
        }
    }
}

/// Structure review returned by the LLM.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StructureReview {
    #[serde(default)]
    pub all_sections_present: bool,
    #[serde(default)]
    pub missing_sections: Vec<String>,
    #[serde(default)]
    pub executive_answer_word_count: Option<u64>,
    #[serde(default)]
    pub executive_answer_ok: Option<bool>,
    #[serde(default)]
    pub opinion_level_stated: Option<bool>,
    #[serde(default)]
    pub opinion_level: Option<String>,
    #[serde(default)]
    pub red_team_counter_args: Option<u64>,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub overall_assessment: Option<String>,
}

/// One citation finding from the LLM review.
#[derive(Debug, Clone, Deserialize)]
pub struct CitationFinding {
    #[serde(default)]
    pub citation: String,
    #[serde(default)]
    pub issue: String,
    #[serde(default)]
    pub severity: String,
}

/// Citation review returned by the LLM.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CitationReview {
    #[serde(default)]
    pub total_citations: Option<u64>,
    #[serde(default)]
    pub issues: Vec<CitationFinding>,
    #[serde(default)]
    pub overall_quality: Option<String>,
}

/// Orchestrates the research workflow over a text-generation backend.
pub struct ResearchAgent {
    client: Box<dyn LlmClient>,
}

impl ResearchAgent {
    pub fn new(client: Box<dyn LlmClient>) -> Self {
        Self { client }
    }

    /// Generate a research plan for a sanitized fact pattern.
    pub async fn generate_research_plan(
        &self,
        question: &str,
        facts: &str,
        jurisdictions: Option<&[String]>,
    ) -> Result<String> {
        let jurisdictions_str = match jurisdictions {
            Some(j) if !j.is_empty() => j.join(", "),
            _ => "To be determined".to_string(),
        };

        let prompt = format!(
            "Generate a comprehensive research plan for this international tax matter.\n\n\
## Question\n{question}\n\n\
## Facts (Sanitized)\n{facts}\n\n\
## Jurisdictions\n{jurisdictions_str}\n\n\
Create a research plan following the house research plan template format. Include:\n\n\
1. Matter snapshot (question, jurisdictions, time period)\n\
2. Essential facts (3-10 bullets)\n\
3. Issues & sub-issues with hypotheses\n\
4. Authorities to consult:\n\
   - U.S. primary (IRC sections, regulations, IRS guidance, cases)\n\
   - OECD / Pillar Two guidance\n\
   - Treaties & Technical Explanations\n\
   - Local law\n\
   - Secondary sources (labeled)\n\
5. Search strategy with specific search strings\n\
6. Expected deliverables & exhibits\n\
7. Assumptions, unknowns, data requests\n\
8. Risk forecasters (tentative opinion levels)\n\n\
Format as markdown with clear sections. Be specific about IRC sections, regulation citations, and OECD guidance to review."
        );

        let request =
            CompletionRequest::new("").with_user_message(prompt).with_max_tokens(4000);
        let response = self.client.complete(request).await?;
        Ok(response.content)
    }

    /// Ask the LLM to check memo structure comprehensively.
    pub async fn validate_memo_structure(&self, memo: &str) -> Result<AgentReview<StructureReview>> {
        let prompt = format!(
            "Review this tax memo draft and verify it follows house style requirements.\n\n\
Check for ALL required sections:\n\
1. Executive Answer (≤150 words)\n\
2. Issue Presented (framed as question)\n\
3. Facts (Sanitized)\n\
4. Law & Authorities (with pincites)\n\
5. Analysis (apply law to facts)\n\
6. Conclusion (firm, mirrored to issue)\n\
7. Red-Team (3 counter-arguments with authorities and likelihoods)\n\
8. Risk & Penalty Shield (only if risk > Medium)\n\
9. Follow-Ups & Assumptions\n\
10. Exhibits / Evidence List\n\n\
Also check:\n\
- Executive Answer word count\n\
- Opinion level stated (Reasonable authority / Substantial authority / More likely than not / Should)\n\
- Citations include pincites\n\
- Red-Team has 3 counter-arguments with likelihood ratings\n\
- Professional tone, active voice\n\n\
Memo:\n{memo}\n\n\
Return detailed JSON with:\n\
{{\n\
  \"all_sections_present\": true/false,\n\
  \"missing_sections\": [],\n\
  \"executive_answer_word_count\": X,\n\
  \"executive_answer_ok\": true/false,\n\
  \"opinion_level_stated\": true/false,\n\
  \"opinion_level\": \"...\",\n\
  \"red_team_counter_args\": X,\n\
  \"issues\": [\"list of specific issues\"],\n\
  \"overall_assessment\": \"...\"\n\
}}"
        );

        let request =
            CompletionRequest::new("").with_user_message(prompt).with_max_tokens(2000);
        let response = self.client.complete(request).await?;
        Ok(parse_review(&response.content))
    }

    /// Ask the LLM to substantively review citations.
    pub async fn review_citations(&self, memo: &str) -> Result<AgentReview<CitationReview>> {
        let prompt = format!(
            "Review all citations in this tax memo:\n\n{memo}\n\n\
Identify:\n\
1. Improperly formatted citations\n\
2. Missing pincites\n\
3. Missing I.R.B. citations for Notices/Rev. Ruls.\n\
4. Cases without Bluebook format\n\
5. Any citations that seem fabricated or questionable\n\
6. URLs without date accessed\n\n\
Return JSON:\n\
{{\n\
  \"total_citations\": X,\n\
  \"issues\": [\n\
    {{\n\
      \"citation\": \"...\",\n\
      \"issue\": \"...\",\n\
      \"severity\": \"high|medium|low\"\n\
    }}\n\
  ],\n\
  \"overall_quality\": \"excellent|good|needs_work|poor\"\n\
}}"
        );

        let request = CompletionRequest::new(CITATION_SYSTEM_PROMPT)
            .with_user_message(prompt)
            .with_max_tokens(3000);
        let response = self.client.complete(request).await?;
        Ok(parse_review(&response.content))
    }

    /// Draft an initial memo from an approved plan and sanitized facts.
    pub async fn draft_memo(
        &self,
        research_plan: &str,
        sanitized_facts: &str,
        additional_context: Option<&str>,
    ) -> Result<String> {
        let context = match additional_context {
            Some(extra) => format!("\n\nAdditional Context:\n{}", extra),
            None => String::new(),
        };

        let prompt = format!(
            "Draft a comprehensive international tax memo following house style.\n\n\
## Research Plan\n{research_plan}\n\n\
## Sanitized Facts\n{sanitized_facts}\n{context}\n\n\
Create a complete memo with ALL required sections:\n\
1. Executive Answer (≤150 words, bottom line first)\n\
2. Issue Presented (as a question)\n\
3. Facts (sanitized bullets)\n\
4. Law & Authorities (primary sources with pincites)\n\
5. Analysis (apply law to facts, address counterpoints)\n\
6. Conclusion (firm, with opinion level)\n\
7. Red-Team (3 counter-arguments with authority and likelihood)\n\
8. Risk & Penalty Shield (only if risk > Medium)\n\
9. Follow-Ups & Assumptions\n\
10. Exhibits / Evidence List\n\n\
Requirements:\n\
- Use actual IRC sections, regulations, and authorities from research plan\n\
- Include proper citations with pincites\n\
- State opinion level (Reasonable authority / Substantial authority / MLTN / Should)\n\
- Professional tone, active voice, concise\n\
- Mark any uncertain citations as \"Unknown—needs manual check\"\n\n\
Return the complete memo in markdown format."
        );

        let request = CompletionRequest::new(DRAFTING_SYSTEM_PROMPT)
            .with_user_message(prompt)
            .with_max_tokens(8000);
        let response = self.client.complete(request).await?;
        Ok(response.content)
    }

    /// Suggest improvements given a failed QA report.
    pub async fn suggest_improvements(&self, memo: &str, qa_report: &str) -> Result<String> {
        let truncated: String = memo.chars().take(5000).collect();
        let suffix = if memo.chars().count() > 5000 { "... [truncated]" } else { "" };

        let prompt = format!(
            "Review this tax memo and QA report, then suggest specific improvements.\n\n\
## QA Report\n{qa_report}\n\n\
## Memo\n{truncated}{suffix}\n\n\
Based on the failed QA checks, provide:\n\
1. Specific sections that need work\n\
2. Citation formatting fixes needed\n\
3. Missing required elements\n\
4. Structural improvements\n\n\
Format as a numbered list of actionable items."
        );

        let request =
            CompletionRequest::new("").with_user_message(prompt).with_max_tokens(2000);
        let response = self.client.complete(request).await?;
        Ok(response.content)
    }

    /// Whether the backing client is configured.
    pub fn is_ready(&self) -> bool {
        self.client.is_ready()
    }
}

/// Parse JSON out of a completion, unwrapping a markdown code fence if the
/// model added one.
fn parse_review<T: for<'de> Deserialize<'de>>(content: &str) -> AgentReview<T> {
    let block = extract_json_block(content);
    match serde_json::from_str::<T>(block) {
        Ok(value) => AgentReview::Parsed(value),
        Err(_) => AgentReview::Unparsed { raw: content.to_string() },
    }
}

fn extract_json_block(content: &str) -> &str {
    if let Some(start) = content.find("```json") {
        let after = &content[start + 7..];
        match after.find("```") {
            Some(end) => after[..end].trim(),
            None => after.trim(),
        }
    } else if let Some(start) = content.find("```") {
        let after = &content[start + 3..];
        match after.find("```") {
            Some(end) => after[..end].trim(),
            None => after.trim(),
        }
    } else {
        content.trim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::{CompletionResponse, StopReason, Usage};
    use async_trait::async_trait;

    /// Client returning a canned response.
    struct CannedClient {
        response: String,
    }

    impl CannedClient {
        fn new(response: impl Into<String>) -> Self {
            Self { response: response.into() }
        }
    }

    #[async_trait]
    impl LlmClient for CannedClient {
        async fn complete(&self, _request: CompletionRequest) -> crate::Result<CompletionResponse> {
            Ok(CompletionResponse {
                content: self.response.clone(),
                stop_reason: StopReason::EndTurn,
                usage: Usage::default(),
            })
        }

        fn model(&self) -> &str {
            "canned"
        }

        fn is_ready(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_extract_json_block_fenced() {
        let content = "Here you go:\n```json\n{\"a\": 1}\n```\nDone.";
        assert_eq!(extract_json_block(content), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_json_block_plain_fence() {
        let content = "```\n{\"a\": 1}\n```";
        assert_eq!(extract_json_block(content), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_json_block_bare() {
        let content = "  {\"a\": 1}  ";
        assert_eq!(extract_json_block(content), "{\"a\": 1}");
    }

    #[test]
    fn test_parse_review_well_formed() {
        let content = "```json\n{\"all_sections_present\": true, \"missing_sections\": []}\n```";
        let review: AgentReview<StructureReview> = parse_review(content);
        let parsed = review.parsed().unwrap();
        assert!(parsed.all_sections_present);
        assert!(parsed.missing_sections.is_empty());
    }

    #[test]
    fn test_parse_review_malformed_keeps_raw() {
        let content = "I could not produce JSON, sorry.";
        let review: AgentReview<StructureReview> = parse_review(content);
        match review {
            AgentReview::Unparsed { raw } => assert_eq!(raw, content),
            AgentReview::Parsed(_) => panic!("expected unparsed"),
        }
    }

    #[tokio::test]
    async fn test_generate_research_plan_includes_inputs() {
        let client = CannedClient::new("# Research Plan\n...");
        let agent = ResearchAgent::new(Box::new(client));

        let plan = agent
            .generate_research_plan(
                "Does § 951A apply?",
                "[Entity A] earns services income.",
                Some(&["US".to_string(), "Ireland".to_string()]),
            )
            .await
            .unwrap();

        assert!(plan.starts_with("# Research Plan"));
    }

    #[tokio::test]
    async fn test_validate_memo_structure_parses_json() {
        let client = CannedClient::new(
            "```json\n{\"all_sections_present\": false, \"missing_sections\": [\"Red-Team\"], \"executive_answer_word_count\": 120}\n```",
        );
        let agent = ResearchAgent::new(Box::new(client));

        let review = agent.validate_memo_structure("# Memo").await.unwrap();
        let parsed = review.parsed().unwrap();
        assert!(!parsed.all_sections_present);
        assert_eq!(parsed.missing_sections, vec!["Red-Team".to_string()]);
        assert_eq!(parsed.executive_answer_word_count, Some(120));
    }

    #[tokio::test]
    async fn test_review_citations_parses_findings() {
        let client = CannedClient::new(
            "```json\n{\"total_citations\": 4, \"issues\": [{\"citation\": \"IRC Section 951A\", \"issue\": \"word form\", \"severity\": \"high\"}], \"overall_quality\": \"needs_work\"}\n```",
        );
        let agent = ResearchAgent::new(Box::new(client));

        let review = agent.review_citations("# Memo").await.unwrap();
        let parsed = review.parsed().unwrap();
        assert_eq!(parsed.total_citations, Some(4));
        assert_eq!(parsed.issues.len(), 1);
        assert_eq!(parsed.issues[0].severity, "high");
    }

    #[tokio::test]
    async fn test_review_unparsed_on_prose() {
        let client = CannedClient::new("The memo looks fine overall.");
        let agent = ResearchAgent::new(Box::new(client));

        let review = agent.review_citations("# Memo").await.unwrap();
        assert!(review.parsed().is_none());
    }

    #[tokio::test]
    async fn test_draft_memo_returns_content() {
        let client = CannedClient::new("# International Tax Memo\n\n## Executive Answer\n...");
        let agent = ResearchAgent::new(Box::new(client));

        let memo = agent.draft_memo("plan", "facts", Some("extra context")).await.unwrap();
        assert!(memo.contains("Executive Answer"));
    }

    #[tokio::test]
    async fn test_suggest_improvements_truncates_long_memo() {
        let client = CannedClient::new("1. Fix the Red-Team section.");
        let agent = ResearchAgent::new(Box::new(client));

        let long_memo = "word ".repeat(3000);
        let suggestions = agent.suggest_improvements(&long_memo, "QA REPORT: 3/10").await.unwrap();
        assert!(suggestions.contains("Red-Team"));
    }
}
