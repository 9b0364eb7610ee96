use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use taxmemo::cli::{Cli, CitationType, Commands, OutputFormat, TemplateKind};
use taxmemo::config::GlobalConfig;
use taxmemo::llm::{AnthropicClient, AnthropicConfig, ResearchAgent};
use taxmemo::sanitizer;
use taxmemo::scrape::{GuidanceHit, GuidanceSource, IrsClient, OecdClient};
use taxmemo::template::MemoTemplate;
use taxmemo::validator::{
    CitationValidator, QaChecker, citation_summary, generate_qa_report_text,
};

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taxmemo")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("taxmemo.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging()?;

    let config = GlobalConfig::load(cli.config.as_ref())?;
    config.validate()?;

    if cli.verbose {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match cli.command {
        Commands::Sanitize { input_file, output, report } => {
            handle_sanitize(&input_file, output.as_deref(), report.as_deref(), &config)
        }
        Commands::Validate { memo_file, format, output } => {
            handle_validate(&memo_file, format, output.as_deref())
        }
        Commands::Qa { memo_file, format, output } => {
            handle_qa(&memo_file, format, output.as_deref(), &config)
        }
        Commands::Plan { question, facts, jurisdictions, output } => {
            handle_plan(&question, facts.as_deref(), &jurisdictions, &output, &config).await
        }
        Commands::SearchIrs { search_term, year, output } => {
            handle_search_irs(&search_term, year, output.as_deref(), &config).await
        }
        Commands::SearchOecd { keyword, output } => {
            handle_search_oecd(&keyword, output.as_deref(), &config).await
        }
        Commands::VerifyCitation { citation, citation_type } => {
            handle_verify_citation(&citation, citation_type, &config).await
        }
        Commands::Template { matter, question, output, kind } => {
            handle_template(&matter, &question, output.as_deref(), kind)
        }
        Commands::Review { memo_file } => handle_review(&memo_file, &config).await,
    }
}

fn handle_sanitize(
    input: &Path,
    output: Option<&Path>,
    report_path: Option<&Path>,
    config: &GlobalConfig,
) -> Result<()> {
    println!("Sanitizing {}...", input.display());

    let default_output = input.with_extension("").to_string_lossy().to_string() + "_sanitized.txt";
    let output_path = output.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(default_output));

    let report = sanitizer::sanitize_file(
        input,
        &output_path,
        config.sanitizer.preserve_structure,
        &config.sanitizer.self_identifier,
    )?;

    println!("{} Sanitized text saved to {}", "✓".green(), output_path.display());
    println!("  Entities redacted: {}", report.entities_redacted);
    println!("  People redacted: {}", report.people_redacted);
    println!("  Amounts redacted: {}", report.amounts_redacted);
    println!("  Emails redacted: {}", report.emails_redacted);
    println!("  Dates redacted: {}", report.dates_redacted);
    println!("  Total redactions: {}", report.total_redactions);

    if let Some(path) = report_path {
        fs::write(path, serde_json::to_string_pretty(&report)?)?;
        println!("  Report saved to {}", path.display());
    }

    Ok(())
}

fn handle_validate(memo_file: &Path, format: OutputFormat, output: Option<&Path>) -> Result<()> {
    println!("Validating {}...", memo_file.display());

    let memo = fs::read_to_string(memo_file)
        .context(format!("Failed to read {}", memo_file.display()))?;

    let mut validator = CitationValidator::new();
    let (valid, issues) = validator.validate_all(&memo);
    let summary = citation_summary(&memo);

    match format {
        OutputFormat::Json => {
            let results = serde_json::json!({
                "valid": valid,
                "total_issues": issues.len(),
                "issues": issues,
                "summary": summary,
            });
            let output_text = serde_json::to_string_pretty(&results)?;
            println!("{}", output_text);

            if let Some(path) = output {
                fs::write(path, output_text)?;
            }
        }
        OutputFormat::Text => {
            println!("\n{}", "=".repeat(60));
            println!("CITATION VALIDATION REPORT");
            println!("{}", "=".repeat(60));

            println!("\nCitation Summary:");
            for (category, count) in &summary {
                println!("  {}: {}", category, count);
            }

            if valid {
                println!("\n{} All citations valid", "✓".green());
            } else {
                println!("\n{} Found {} citation issues:\n", "✗".red(), issues.len());
                for issue in &issues {
                    println!(
                        "  {}: {}",
                        format!("{:?}", issue.issue_type).to_uppercase(),
                        issue.message
                    );
                    if !issue.citation.is_empty() {
                        let citation: String = issue.citation.chars().take(80).collect();
                        println!("    Citation: {}", citation);
                    }
                    if let Some(line) = issue.line_number {
                        println!("    Line: {}", line);
                    }
                    println!();
                }
            }
        }
    }

    Ok(())
}

fn handle_qa(
    memo_file: &Path,
    format: OutputFormat,
    output: Option<&Path>,
    config: &GlobalConfig,
) -> Result<()> {
    println!("Running QA checklist on {}...", memo_file.display());

    let memo = fs::read_to_string(memo_file)
        .context(format!("Failed to read {}", memo_file.display()))?;

    let mut checker = QaChecker::new(memo, config.sanitizer.self_identifier.clone());
    let report = checker.run_all_checks();

    match format {
        OutputFormat::Json => {
            let results = serde_json::json!({
                "score": report.score(),
                "passed": report.passed(),
                "total_checks": report.total_checks,
                "passed_checks": report.passed_checks,
                "failed_checks": report.failed_checks,
                "warnings": report.warnings,
                "checks": report.checks,
            });
            let output_text = serde_json::to_string_pretty(&results)?;

            match output {
                Some(path) => {
                    fs::write(path, output_text)?;
                    println!("{} QA report saved to {}", "✓".green(), path.display());
                }
                None => println!("{}", output_text),
            }
        }
        OutputFormat::Text => {
            let report_text = generate_qa_report_text(&report);
            println!("\n{}", report_text);

            if let Some(path) = output {
                fs::write(path, &report_text)?;
                println!("\n{} QA report saved to {}", "✓".green(), path.display());
            }

            if report.passed() {
                println!("\n{}", "All QA checks passed!".green());
            } else {
                println!(
                    "\n{}",
                    format!("{} checks failed - review issues above", report.failed_checks)
                        .yellow()
                );
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

async fn handle_plan(
    question: &str,
    facts: Option<&Path>,
    jurisdictions: &[String],
    output: &Path,
    config: &GlobalConfig,
) -> Result<()> {
    println!("Generating research plan...");

    let facts_text = match facts {
        Some(path) => {
            fs::read_to_string(path).context(format!("Failed to read {}", path.display()))?
        }
        None => {
            println!("{}", "Tip: provide --facts file for better results".yellow());
            String::new()
        }
    };

    let agent = build_agent(config)?;
    let jurisdictions = (!jurisdictions.is_empty()).then_some(jurisdictions);
    let plan = agent.generate_research_plan(question, &facts_text, jurisdictions).await?;

    fs::write(output, &plan)?;
    println!("{} Research plan saved to {}", "✓".green(), output.display());

    println!("\nPreview:");
    println!("{}", "─".repeat(60));
    let preview: String = plan.chars().take(800).collect();
    if plan.chars().count() > 800 {
        println!("{}...", preview);
    } else {
        println!("{}", preview);
    }

    Ok(())
}

async fn handle_search_irs(
    search_term: &str,
    year: Option<i32>,
    output: Option<&Path>,
    config: &GlobalConfig,
) -> Result<()> {
    println!("Searching IRS.gov for: {}", search_term);

    let client = IrsClient::new(config.scrape.clone())?;
    let results = client.search(search_term, year).await?;

    print_hits(&results, output)?;
    Ok(())
}

async fn handle_search_oecd(
    keyword: &str,
    output: Option<&Path>,
    config: &GlobalConfig,
) -> Result<()> {
    println!("Searching OECD for: {}", keyword);

    let client = OecdClient::new(config.scrape.clone())?;
    let results = client.search_pillar_two(keyword).await?;

    print_hits(&results, output)?;
    Ok(())
}

fn print_hits(results: &[GuidanceHit], output: Option<&Path>) -> Result<()> {
    if results.is_empty() {
        println!("  No results found");
        return Ok(());
    }

    println!("\n{} Found {} results:\n", "✓".green(), results.len());
    for (i, hit) in results.iter().take(10).enumerate() {
        println!("  {}. {}", i + 1, hit.title);
        println!("     {}", hit.url);
        println!("     Type: {}", hit.source_type);
        println!();
    }

    if let Some(path) = output {
        fs::write(path, serde_json::to_string_pretty(results)?)?;
        println!("{} Results saved to {}", "✓".green(), path.display());
    }

    Ok(())
}

async fn handle_verify_citation(
    citation: &str,
    citation_type: Option<CitationType>,
    config: &GlobalConfig,
) -> Result<()> {
    println!("Verifying: {}", citation);

    let number_re = regex::Regex::new(r"(\d{4}-\d+)")?;
    let number = number_re.find(citation).map(|m| m.as_str());

    let is_notice = matches!(citation_type, Some(CitationType::Notice))
        || citation.contains("Notice");
    let is_rev_rul = matches!(citation_type, Some(CitationType::RevenueRuling))
        || citation.contains("Rev. Rul.");

    if !is_notice && !is_rev_rul {
        println!("{}", "Specify --type (notice|revenue-ruling|irc)".yellow());
        return Ok(());
    }

    let Some(number) = number else {
        println!("{} No YYYY-NN citation number found", "✗".red());
        return Ok(());
    };

    let client = IrsClient::new(config.scrape.clone())?;
    let verification = if is_notice {
        client.verify_notice_exists(number).await?
    } else {
        client.verify_revenue_ruling(number).await?
    };

    if verification.valid {
        println!("{} Citation verified", "✓".green());
        if let Some(url) = verification.url {
            println!("  URL: {}", url);
        }
    } else {
        println!("{} Citation not found", "✗".red());
    }

    Ok(())
}

fn handle_template(
    matter: &str,
    question: &str,
    output: Option<&Path>,
    kind: TemplateKind,
) -> Result<()> {
    let templates = MemoTemplate::new();

    let (content, default_name) = match kind {
        TemplateKind::Memo => (
            templates.blank_memo(matter, question, None, None)?,
            format!("{}_memo.md", matter.replace(' ', "_")),
        ),
        TemplateKind::ResearchPlan => (
            templates.research_plan(matter, question)?,
            format!("{}_research_plan.md", matter.replace(' ', "_")),
        ),
    };

    let output_path =
        output.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(default_name));
    fs::write(&output_path, content)?;

    println!("{} Template saved to {}", "✓".green(), output_path.display());
    Ok(())
}

async fn handle_review(memo_file: &Path, config: &GlobalConfig) -> Result<()> {
    println!("Reviewing {} with the LLM agent...", memo_file.display());

    let memo = fs::read_to_string(memo_file)
        .context(format!("Failed to read {}", memo_file.display()))?;

    let agent = build_agent(config)?;

    println!("\n1. Checking structure...");
    match agent.validate_memo_structure(&memo).await? {
        taxmemo::llm::AgentReview::Parsed(structure) => {
            match structure.executive_answer_word_count {
                Some(count) => println!("   Executive Answer: {} words", count),
                None => println!("   Executive Answer: word count not reported"),
            }
            println!(
                "   Opinion Level: {}",
                structure.opinion_level.as_deref().unwrap_or("Not stated")
            );
            println!(
                "   Sections: {}",
                if structure.all_sections_present {
                    "✓ Complete".green()
                } else {
                    "✗ Missing sections".red()
                }
            );
            if !structure.missing_sections.is_empty() {
                println!("   Missing: {}", structure.missing_sections.join(", "));
            }
        }
        taxmemo::llm::AgentReview::Unparsed { raw } => {
            println!("{}", "   Could not parse structure review; raw response:".yellow());
            let preview: String = raw.chars().take(400).collect();
            println!("   {}", preview);
        }
    }

    println!("\n2. Reviewing citations...");
    match agent.review_citations(&memo).await? {
        taxmemo::llm::AgentReview::Parsed(citations) => {
            match citations.total_citations {
                Some(total) => println!("   Total citations: {}", total),
                None => println!("   Total citations: not reported"),
            }
            println!(
                "   Quality: {}",
                citations.overall_quality.as_deref().unwrap_or("unknown")
            );
            if !citations.issues.is_empty() {
                println!("   Issues found: {}", citations.issues.len());
                for issue in citations.issues.iter().take(5) {
                    println!("     - {} ({})", issue.issue, issue.severity);
                }
            }
        }
        taxmemo::llm::AgentReview::Unparsed { raw } => {
            println!("{}", "   Could not parse citation review; raw response:".yellow());
            let preview: String = raw.chars().take(400).collect();
            println!("   {}", preview);
        }
    }

    println!("\n{} Review complete", "✓".green());
    Ok(())
}

fn build_agent(config: &GlobalConfig) -> Result<ResearchAgent> {
    let anthropic_config = AnthropicConfig {
        model: config.llm.model.clone(),
        timeout: std::time::Duration::from_millis(config.llm.timeout_ms),
        api_key_env: config.llm.api_key_env.clone(),
        ..AnthropicConfig::default()
    };

    let client = AnthropicClient::new(anthropic_config)
        .context("LLM client unavailable (is the API key set?)")?;
    Ok(ResearchAgent::new(Box::new(client)))
}
