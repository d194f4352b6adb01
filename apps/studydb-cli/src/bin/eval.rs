use std::fs;
use std::path::PathBuf;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use studydb_cli::{build_retriever, init_tracing};
use studydb_core::config::Config;
use studydb_hybrid::eval::{evaluate, judge, EvalCase};

#[derive(Debug, Parser)]
#[command(name = "studydb-eval", about = "Score the retriever on labeled queries")]
struct Args {
    /// JSON array of {"query", "expected_program", "expected_info"?}.
    cases: PathBuf,
    #[arg(long, short, default_value_t = 5)]
    k: usize,
    /// Write the full report (per-query judgements included) here.
    #[arg(long, short)]
    output: Option<PathBuf>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, short)]
    verbose: bool,
}

async fn run(args: Args) -> anyhow::Result<()> {
    let cases: Vec<EvalCase> = serde_json::from_str(&fs::read_to_string(&args.cases)?)?;
    let config = Config::load_from(args.config.as_deref())?;
    let retriever = build_retriever(&config).await?;

    let pb = ProgressBar::new(cases.len() as u64);
    pb.set_style(ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")?);
    let mut judgements = Vec::with_capacity(cases.len());
    for case in &cases {
        pb.set_message(case.query.clone());
        let outcome = retriever.search(&case.query).await?;
        judgements.push(judge(case, &outcome.results, args.k));
        pb.inc(1);
    }
    pb.finish_and_clear();

    let report = evaluate(judgements, args.k);
    println!("📊 {} queries", report.queries);
    println!("  precision@{}: {:.4}", report.k, report.precision_at_k);
    println!("  recall@{}:    {:.4}", report.k, report.recall_at_k);
    println!("  MRR:          {:.4}", report.mrr);
    println!("  nDCG@{}:      {:.4}", report.k, report.ndcg_at_k);
    if let Some(path) = &args.output {
        fs::write(path, serde_json::to_string_pretty(&report)?)?;
        println!("Report saved to {}", path.display());
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);
    if let Err(e) = run(args).await {
        eprintln!("❌ {e:#}");
        std::process::exit(1);
    }
}
