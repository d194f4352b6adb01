use std::fs;
use std::path::PathBuf;

use clap::Parser;
use serde_json::json;

use studydb_cli::{build_retriever, init_tracing};
use studydb_core::config::Config;
use studydb_core::types::{Category, Degree};
use studydb_hybrid::{QueryOptions, SearchOutcome};

const PREVIEW_CHARS: usize = 320;

#[derive(Debug, Parser)]
#[command(name = "studydb-search", about = "Ask a question about degree programs")]
struct Args {
    #[arg(long, short)]
    query: String,
    /// Program name or slug; overrides the one read from the query.
    #[arg(long)]
    program: Option<String>,
    /// msc, bsc, phd, ma or ba.
    #[arg(long)]
    degree: Option<Degree>,
    /// info, apply, keydata or desc.
    #[arg(long)]
    category: Option<Category>,
    #[arg(long, short = 'n')]
    limit: Option<usize>,
    /// Print the whole outcome as JSON.
    #[arg(long)]
    json: bool,
    /// Print the results without formatting.
    #[arg(long)]
    raw: bool,
    /// Also write a JSON report to this file.
    #[arg(long, short)]
    output: Option<PathBuf>,
    /// Ignore program, degree and category constraints.
    #[arg(long)]
    no_filter: bool,
    /// Only keep results from the requested program.
    #[arg(long)]
    exact_match: bool,
    #[arg(long, short)]
    verbose: bool,
    #[arg(long)]
    config: Option<PathBuf>,
}

fn print_results(outcome: &SearchOutcome) {
    let intent = &outcome.intent;
    let show = |v: Option<String>| v.unwrap_or_else(|| "None".to_string());
    println!("\nQuery: {}", outcome.query);
    println!(
        "Extracted: Program: {} | Degree: {} | Category: {}",
        show(intent.program_slug.clone()),
        show(intent.degree.map(|d| d.to_string())),
        show(intent.category.map(|c| c.to_string())),
    );
    println!("{}", "=".repeat(80));

    let program = intent.program_name();
    for (rank, r) in outcome.results.iter().enumerate() {
        let m = &r.chunk.metadata;
        let program_mark = match &program {
            Some(p) if m.program.to_lowercase().contains(p.as_str()) => "✓",
            _ => "×",
        };
        let category_mark = match intent.category {
            Some(c) if m.category.eq_ignore_ascii_case(c.as_str()) || m.section.to_lowercase().contains(c.as_str()) => "✓",
            _ => "×",
        };
        println!("\n#{}  Score: {:.3}  Base: {:.3}", rank + 1, r.score, r.boosted);
        println!("Program: {program_mark} {} | Category: {category_mark} {} | Section: {}", m.program, m.category, m.section);
        let mut content = r.chunk.text.split_whitespace().collect::<Vec<_>>().join(" ");
        if let Some((cut, _)) = content.char_indices().nth(PREVIEW_CHARS) {
            content.truncate(cut);
            content.push('…');
        }
        println!("{content}");
        println!("{}", "-".repeat(80));
    }
}

fn print_no_results() {
    println!("\n⚠️  No results found for this query with the current filters.");
    println!("Try relaxing filters:");
    println!("  - Use more general terms in your query");
    println!("  - Use the --no-filter flag to disable filtering");
    println!("  - Check if the program name is correct");
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = Config::load_from(args.config.as_deref())?;
    let retriever = build_retriever(&config).await?;
    let opts = QueryOptions {
        program: args.program.clone(),
        degree: args.degree,
        category: args.category,
        no_filter: args.no_filter,
        exact_match: args.exact_match,
        top_k: args.limit.filter(|n| *n > 0),
    };
    let outcome = retriever.search_with(&args.query, &opts).await?;

    if let Some(path) = &args.output {
        let report = json!({
            "query": outcome.query,
            "intent": outcome.intent,
            "strategy": outcome.strategy,
            "results": outcome.results.iter().map(|r| json!({
                "score": r.score,
                "base_score": r.boosted,
                "metadata": r.chunk.metadata,
                "content": r.chunk.text,
            })).collect::<Vec<_>>(),
        });
        fs::write(path, serde_json::to_string_pretty(&report)?)?;
        tracing::info!(path = %path.display(), "results saved");
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else if outcome.results.is_empty() {
        print_no_results();
    } else if args.raw {
        println!("{}", serde_json::to_string_pretty(&outcome.results)?);
    } else {
        print_results(&outcome);
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let verbose = args.verbose;
    init_tracing(verbose);
    if let Err(e) = run(args).await {
        if verbose {
            eprintln!("❌ {e:?}");
        } else {
            eprintln!("❌ {e:#}");
        }
        std::process::exit(1);
    }
}
