//! Case Q&A command line
//!
//! Run with: cargo run -p case-rag --bin case-rag -- chat path/to/case.pdf

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use case_rag::{
    config::RagConfig, ingestion::UploadStore, CaseEngine, Error, IndexHandle, IngestReport,
};
use clap::{Parser, Subcommand};
use console::style;
use dotenv::dotenv;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser, Debug)]
#[command(
    name = "case-rag",
    version,
    about = "Ask questions about a business case PDF"
)]
struct Cli {
    /// TOML configuration file (defaults to $CASE_RAG_CONFIG, then built-in defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Copy a PDF into the upload directory and build its index
    Index {
        /// Case PDF
        pdf: PathBuf,
    },
    /// Index a PDF and answer one question about it
    Ask {
        /// Case PDF
        pdf: PathBuf,
        /// Question to answer
        question: String,
    },
    /// Index a PDF and answer questions read from stdin
    Chat {
        /// Case PDF
        pdf: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "case_rag=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = RagConfig::load(cli.config.as_deref())?;
    let api_key = config.generation.resolve_api_key()?;
    let engine = CaseEngine::from_config(&config, api_key)?;
    let uploads = UploadStore::new(config.upload.upload_dir.clone())?;

    match cli.command {
        Command::Index { pdf } => {
            let report = index(&engine, &uploads, &pdf).await?;
            println!(
                "{} {} ({} pages, {} chunks) -> collection {}",
                style("Indexed").green().bold(),
                report.document.filename,
                report.pages,
                report.index.chunk_count,
                style(&report.index.collection).cyan()
            );
        }
        Command::Ask { pdf, question } => {
            if question.trim().is_empty() {
                println!("{}", style(Error::EmptyQuestion).yellow());
                return Ok(());
            }
            let report = index(&engine, &uploads, &pdf).await?;
            ask(&engine, &report.index, &question).await?;
        }
        Command::Chat { pdf } => {
            let report = index(&engine, &uploads, &pdf).await?;
            chat(&engine, &report.index).await?;
        }
    }

    Ok(())
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message);
    pb
}

async fn index(engine: &CaseEngine, uploads: &UploadStore, pdf: &Path) -> Result<IngestReport> {
    let data = tokio::fs::read(pdf)
        .await
        .with_context(|| format!("Cannot read {}", pdf.display()))?;
    let name = pdf
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let pb = spinner(format!("Loading {} and building vector store...", pdf.display()));
    let result = engine.ingest(uploads, &name, data).await;
    pb.finish_and_clear();

    Ok(result?)
}

async fn ask(engine: &CaseEngine, index: &IndexHandle, question: &str) -> Result<()> {
    let pb = spinner("Analyzing case...".to_string());
    let result = engine.answer(index, question).await;
    pb.finish_and_clear();

    match result {
        Ok(answer) => {
            println!("{}", answer.text);
            Ok(())
        }
        Err(Error::EmptyQuestion) => {
            println!("{}", style(Error::EmptyQuestion).yellow());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn chat(engine: &CaseEngine, index: &IndexHandle) -> Result<()> {
    println!(
        "{} {} ({} chunks). Type {} to quit.",
        style("Ready:").green().bold(),
        index.filename,
        index.chunk_count,
        style("exit").bold()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", style("?").cyan().bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().eq_ignore_ascii_case("exit") {
            break;
        }

        // Provider failures end this question, not the session
        if let Err(e) = ask(engine, index, &line).await {
            eprintln!("{} {}", style("error:").red().bold(), e);
        }
    }

    Ok(())
}
