//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - sanitize: redact confidential facts in a text file
//! - validate / qa: check a memo's citations and QA checklist
//! - plan / review: LLM-backed plan generation and memo review
//! - search-irs / search-oecd / verify-citation: guidance lookups
//! - template: blank memo or research plan

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// taxmemo - international tax research automation
#[derive(Parser, Debug)]
#[command(name = "taxmemo")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Citation type for existence verification
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CitationType {
    Notice,
    RevenueRuling,
    Irc,
}

/// Template flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TemplateKind {
    Memo,
    ResearchPlan,
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sanitize confidential facts in a text file
    Sanitize {
        /// File with confidential information
        input_file: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Save the redaction report (JSON) to this file
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// Validate memo citations and format
    Validate {
        /// Memo file to validate
        memo_file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Output file for results
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the QA checklist on a memo
    Qa {
        /// Memo file to check
        memo_file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Output report file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate a research plan with the LLM agent
    Plan {
        /// Tax research question
        #[arg(short, long)]
        question: String,

        /// Sanitized facts file
        #[arg(short, long)]
        facts: Option<PathBuf>,

        /// Jurisdictions involved (repeatable)
        #[arg(short, long)]
        jurisdictions: Vec<String>,

        /// Output file
        #[arg(short, long, default_value = "research_plan.md")]
        output: PathBuf,
    },

    /// Search IRS.gov bulletins for guidance
    SearchIrs {
        /// Search term (e.g., "951A", "Subpart F")
        search_term: String,

        /// Tax year (e.g., 2020); recent years when omitted
        #[arg(short, long)]
        year: Option<i32>,

        /// Save results (JSON) to file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Search OECD guidance
    SearchOecd {
        /// Keyword (e.g., "GloBE", "IIR")
        keyword: String,

        /// Save results (JSON) to file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Verify a citation exists on the public sites
    VerifyCitation {
        /// Citation text
        citation: String,

        /// Citation type
        #[arg(short = 't', long = "type", value_enum)]
        citation_type: Option<CitationType>,
    },

    /// Generate a blank memo or research plan template
    Template {
        /// Short matter title
        #[arg(short, long)]
        matter: String,

        /// Research question
        #[arg(short, long)]
        question: String,

        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Template type
        #[arg(short = 't', long = "type", value_enum, default_value_t = TemplateKind::Memo)]
        kind: TemplateKind,
    },

    /// Use the LLM agent to comprehensively review a memo
    Review {
        /// Memo file to review
        memo_file: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sanitize() {
        let cli = Cli::parse_from(["taxmemo", "sanitize", "facts.txt", "-o", "out.txt"]);
        match cli.command {
            Commands::Sanitize { input_file, output, report } => {
                assert_eq!(input_file, PathBuf::from("facts.txt"));
                assert_eq!(output, Some(PathBuf::from("out.txt")));
                assert!(report.is_none());
            }
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn test_parse_qa_json_format() {
        let cli = Cli::parse_from(["taxmemo", "qa", "memo.md", "--format", "json"]);
        match cli.command {
            Commands::Qa { format, .. } => assert_eq!(format, OutputFormat::Json),
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn test_parse_plan_jurisdictions() {
        let cli = Cli::parse_from([
            "taxmemo", "plan", "-q", "Does 951A apply?", "-j", "US", "-j", "Ireland",
        ]);
        match cli.command {
            Commands::Plan { question, jurisdictions, output, .. } => {
                assert_eq!(question, "Does 951A apply?");
                assert_eq!(jurisdictions, vec!["US".to_string(), "Ireland".to_string()]);
                assert_eq!(output, PathBuf::from("research_plan.md"));
            }
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn test_parse_search_irs_with_year() {
        let cli = Cli::parse_from(["taxmemo", "search-irs", "951A", "--year", "2020"]);
        match cli.command {
            Commands::SearchIrs { search_term, year, .. } => {
                assert_eq!(search_term, "951A");
                assert_eq!(year, Some(2020));
            }
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn test_parse_template_kind() {
        let cli = Cli::parse_from([
            "taxmemo", "template", "-m", "GILTI", "-q", "Q?", "--type", "research-plan",
        ]);
        match cli.command {
            Commands::Template { kind, .. } => assert_eq!(kind, TemplateKind::ResearchPlan),
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn test_parse_verify_citation_type() {
        let cli = Cli::parse_from([
            "taxmemo", "verify-citation", "Notice 2020-69", "--type", "notice",
        ]);
        match cli.command {
            Commands::VerifyCitation { citation_type, .. } => {
                assert_eq!(citation_type, Some(CitationType::Notice));
            }
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["taxmemo", "--verbose", "qa", "memo.md"]);
        assert!(cli.verbose);
    }
}
