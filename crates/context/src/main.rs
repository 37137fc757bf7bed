//! PaperDigest command-line entry point.
//!
//! Search arXiv, or fetch and process papers and produce a Markdown report
//! with answers, summaries, highlights and a comparison.
//!
//! # Examples
//!
//! ```bash
//! paperdigest search "graph neural networks" --max-results 3
//! paperdigest report --query "graph neural networks" --fetch 2 \
//!     --question "Which datasets are used?" --highlights --output report.md
//! paperdigest report --pdf papers/attention.pdf --section-wise
//! paperdigest report --dir ./documents --question "What is compared?"
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use paperdigest_common::config::AppConfig;
use paperdigest_common::models::Paper;
use paperdigest_common::{metrics, telemetry, VERSION};
use paperdigest_context::export::{write_markdown, write_plain_text};
use paperdigest_context::ResearchAssistant;
use std::fmt::Write as _;
use std::path::PathBuf;
use tracing::{error, info};

/// Output format for search results
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "paperdigest",
    version,
    about = "Retrieve, summarize and compare academic papers"
)]
struct Cli {
    /// Configuration file (defaults to config/default, config/$APP_ENV and APP__* variables)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List papers matching a query
    Search {
        query: String,

        /// Number of papers to list
        #[arg(long, value_name = "N")]
        max_results: Option<usize>,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Process papers and write a report
    Report {
        /// Fetch papers matching this query
        #[arg(long, value_name = "TEXT")]
        query: Option<String>,

        /// How many fetched papers to process
        #[arg(long, value_name = "N")]
        fetch: Option<usize>,

        /// Local PDF or text files to process
        #[arg(long = "pdf", value_name = "PATH")]
        pdfs: Vec<PathBuf>,

        /// Process every PDF in this directory
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,

        /// Question answered from all processed papers
        #[arg(long, value_name = "TEXT")]
        question: Option<String>,

        /// Summarize each detected section separately
        #[arg(long)]
        section_wise: bool,

        /// Include five highlights per paper
        #[arg(long)]
        highlights: bool,

        /// Skip the cross-paper comparison
        #[arg(long)]
        no_compare: bool,

        /// Write the Markdown report here
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Also write a plain-text rendition here
        #[arg(long, value_name = "PATH")]
        plain_text: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.config.as_deref() {
        Some(path) => AppConfig::from_file(path),
        None => AppConfig::load(),
    }
    .context("Failed to load configuration")?;

    telemetry::init_tracing(&config.observability);
    metrics::register_metrics();
    info!("Starting PaperDigest v{}", VERSION);

    let assistant =
        ResearchAssistant::from_config(config).context("Failed to initialize assistant")?;

    match cli.command {
        Command::Search {
            query,
            max_results,
            format,
        } => run_search(&assistant, &query, max_results, format).await,
        Command::Report {
            query,
            fetch,
            pdfs,
            dir,
            question,
            section_wise,
            highlights,
            no_compare,
            output,
            plain_text,
        } => {
            let mut papers = Vec::new();
            if let Some(query) = query.as_deref() {
                papers.extend(assistant.discover(query, fetch).await?);
            }
            papers.extend(pdfs.iter().map(|p| Paper::from_local_file(p)));
            if papers.is_empty() && dir.is_none() {
                anyhow::bail!("nothing to process: pass --query, --pdf or --dir");
            }

            let mut processed = process_all(&assistant, &papers).await;
            if let Some(dir) = &dir {
                let from_dir = assistant
                    .process_directory(dir)
                    .await
                    .with_context(|| format!("Failed to read {}", dir.display()))?;
                processed.extend(from_dir);
            }
            if processed.is_empty() {
                anyhow::bail!("no paper could be processed");
            }

            let options = ReportOptions {
                question,
                section_wise,
                highlights,
                compare: !no_compare,
            };
            let report = build_report(&assistant, &processed, &options).await?;

            match &output {
                Some(path) => write_markdown(path, &report)?,
                None => println!("{}", report),
            }
            if let Some(path) = &plain_text {
                write_plain_text(path, &report)?;
            }
            Ok(())
        }
    }
}

async fn run_search(
    assistant: &ResearchAssistant,
    query: &str,
    max_results: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let papers = assistant.discover(query, max_results).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&papers)?),
        OutputFormat::Text => {
            for paper in &papers {
                let preview: String = paper.summary.chars().take(200).collect();
                println!("{} [{}]", paper.title, paper.id);
                println!("  by {}", paper.authors.join(", "));
                println!("  {}...\n", preview);
            }
            if papers.is_empty() {
                println!("No papers found.");
            }
        }
    }
    Ok(())
}

struct ReportOptions {
    question: Option<String>,
    section_wise: bool,
    highlights: bool,
    compare: bool,
}

/// Process papers one at a time, keeping the ones that succeed
async fn process_all(assistant: &ResearchAssistant, papers: &[Paper]) -> Vec<Paper> {
    let mut processed = Vec::new();
    for paper in papers {
        match assistant.process_paper(paper).await {
            Ok(result) => {
                info!(paper_id = %paper.id, chunks = result.chunk_count, "Processed");
                processed.push(paper.clone());
            }
            Err(e) => error!(paper_id = %paper.id, error = %e, "Failed to process paper"),
        }
    }
    processed
}

async fn build_report(
    assistant: &ResearchAssistant,
    processed: &[Paper],
    options: &ReportOptions,
) -> Result<String> {
    let ids: Vec<String> = processed.iter().map(|p| p.id.clone()).collect();
    let mut report = String::from("# Research Report\n\n## Papers\n");
    for paper in processed {
        writeln!(report, "- {} ({})", paper.title, paper.id)?;
    }

    if let Some(question) = options.question.as_deref() {
        let answer = assistant.ask(question, &ids).await?;
        write!(report, "\n## Question\n\n{}\n\n{}\n", question, answer.answer)?;
    }

    for paper in processed {
        let summary = assistant.summarize_paper(&paper.id, options.section_wise).await?;
        write!(report, "\n## Summary: {}\n\n{}\n", paper.title, summary)?;

        if options.highlights {
            let highlights = assistant.paper_highlights(&paper.id).await?;
            write!(report, "\n## Highlights: {}\n\n{}\n", paper.title, highlights)?;
        }
    }

    if options.compare && ids.len() >= 2 {
        let comparison = assistant.compare_papers(&ids).await?;
        write!(report, "\n## Comparison\n\n{}\n", comparison)?;
    }

    Ok(report)
}
