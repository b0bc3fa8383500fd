use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use qa_core::{EngineConfig, IndexBuild, Metrics, QueryAnswerPair, QueryOutcome};
use qa_ingest::corpus::load_corpus;
use qa_ingest::questions::load_questions;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "qa-eval")]
#[command(about = "Index an article dump in memory, then answer or evaluate clues", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct IndexArgs {
    /// Article dump file, or a directory of dump files
    #[arg(long)]
    corpus: PathBuf,
    /// JSON engine configuration; omitted fields keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,
    /// Analyze documents on all cores while building the index
    #[arg(long, default_value_t = false)]
    parallel: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every question in a question file and report MRR and P@1
    Eval {
        #[command(flatten)]
        index: IndexArgs,
        /// Question file (category, clue, answer blocks)
        #[arg(long)]
        questions: PathBuf,
        /// Ranked list length; overrides the config's top_k
        #[arg(long)]
        k: Option<usize>,
        /// Prefix each clue with its category
        #[arg(long, default_value_t = false)]
        with_category: bool,
        /// Print the report as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
        /// Include every query's predictions
        #[arg(long, default_value_t = false)]
        per_query: bool,
    },
    /// Answer a single query
    Query {
        #[command(flatten)]
        index: IndexArgs,
        /// Query text; prefix a word with `+` to require it
        #[arg(long)]
        q: String,
        #[arg(long)]
        k: Option<usize>,
    },
}

#[derive(Serialize)]
struct RunReport<'a> {
    generated_at: String,
    corpus: String,
    questions: String,
    documents: u32,
    rejected_documents: usize,
    skipped_articles: usize,
    skipped_questions: usize,
    k: usize,
    with_category: bool,
    metrics: Metrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcomes: Option<&'a [QueryOutcome]>,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Eval { index, questions, k, with_category, json, per_query } => {
            run_eval(&index, &questions, k, with_category, json, per_query)
        }
        Commands::Query { index, q, k } => run_query(&index, &q, k),
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let text = fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
    EngineConfig::from_json(&text).with_context(|| format!("parsing config {}", path.display()))
}

struct Built {
    build: IndexBuild,
    skipped_articles: usize,
}

fn build(args: &IndexArgs, config: &EngineConfig) -> Result<Built> {
    let corpus = load_corpus(&args.corpus)?;
    let docs = corpus.documents();
    let build = if args.parallel {
        qa_core::build_index_parallel(config, &docs)
    } else {
        qa_core::build_index(config, docs)
    };
    tracing::info!(
        documents = build.index.document_count(),
        terms = build.index.term_count(),
        rejected = build.rejected.len(),
        "index built"
    );
    Ok(Built { build, skipped_articles: corpus.skipped.len() })
}

fn run_eval(
    args: &IndexArgs,
    questions_path: &Path,
    k: Option<usize>,
    with_category: bool,
    json: bool,
    per_query: bool,
) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(k) = k {
        config.top_k = k;
    }
    let built = build(args, &config)?;
    let questions = load_questions(questions_path)?;
    let pairs: Vec<QueryAnswerPair> = questions
        .questions
        .iter()
        .map(|q| QueryAnswerPair::new(q.query_text(with_category), q.answer.clone()))
        .collect();

    let report = qa_core::evaluate(&built.build.index, &config, &pairs, args.parallel)?;

    if json {
        let generated_at = time::OffsetDateTime::now_utc().format(&time::format_description::well_known::Rfc3339)?;
        let out = RunReport {
            generated_at,
            corpus: args.corpus.display().to_string(),
            questions: questions_path.display().to_string(),
            documents: built.build.index.document_count(),
            rejected_documents: built.build.rejected.len(),
            skipped_articles: built.skipped_articles,
            skipped_questions: questions.skipped.len(),
            k: config.top_k,
            with_category,
            metrics: report.metrics,
            outcomes: per_query.then_some(report.outcomes.as_slice()),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if per_query {
        for o in &report.outcomes {
            println!("Query: {}\nAnswer: {}\nPredictions: {:?}", o.query, o.expected, o.predictions);
            match (&o.rank, &o.error) {
                (_, Some(err)) => println!("Error: {err}\n"),
                (Some(rank), None) => println!("Rank: {rank}\n"),
                (None, None) => println!("Rank: -\n"),
            }
        }
    }
    for rejected in &built.build.rejected {
        println!("rejected document #{} {:?}: {}", rejected.position, rejected.title, rejected.error);
    }
    for skipped in &questions.skipped {
        println!("skipped question {skipped}");
    }
    let m = report.metrics;
    println!("MRR = {:.4}", m.mrr);
    println!("P@1 = {:.4}", m.p_at_1);
    println!("Answer was somewhere in predictions = {} / {}", m.answer_present, m.total);
    println!("Failed queries = {}", m.failed);
    Ok(())
}

fn run_query(args: &IndexArgs, text: &str, k: Option<usize>) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let built = build(args, &config)?;
    let titles = qa_core::query(&built.build.index, &config, text, k.unwrap_or(config.top_k))?;
    if titles.is_empty() {
        println!("no results");
    }
    for (rank, title) in titles.iter().enumerate() {
        println!("{:>3}. {}", rank + 1, title);
    }
    Ok(())
}
