//! Search command - query the precedent corpus directly
//!
//! Usage:
//! ```bash
//! moot search "parrot defamation"
//! moot search "trespass by drone" --top-k 5 --filter outcome=dismissed
//! ```

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};

use super::CorpusArgs;
use moot_core::CaseRecord;
use moot_debate::{format_precedent, RagConfig, RagPipeline};
use moot_llm::LlmConfig;

#[derive(Args)]
pub struct SearchArgs {
    /// Free-text query
    query: String,

    /// Number of cases to show
    #[arg(long, default_value_t = 3)]
    top_k: usize,

    /// Print the full formatted precedent for the best match
    #[arg(long)]
    full: bool,

    #[command(flatten)]
    corpus: CorpusArgs,
}

pub async fn run(args: SearchArgs) -> Result<()> {
    let llm_config = LlmConfig::from_env();
    llm_config.validate().context("Invalid LLM configuration")?;
    let providers = llm_config.build_providers();

    let records = args.corpus.load().await;
    if records.is_empty() {
        crate::print_warning("Corpus is empty, nothing to search");
        return Ok(());
    }

    let config = RagConfig {
        top_k: args.top_k.max(1),
        ..RagConfig::from_env()
    };
    let mut pipeline = RagPipeline::build(records, providers.embeddings.clone(), config)
        .await
        .context("Failed to index the corpus")?;
    if !providers.is_mock {
        pipeline = pipeline.with_llm(providers.chat.clone());
    }

    let hits = pipeline
        .search(&args.query, &args.corpus.filters())
        .await
        .context("Search failed")?;

    if hits.is_empty() {
        crate::print_info("No precedent found");
        return Ok(());
    }

    println!("{}", hit_table(&hits));

    if args.full {
        println!();
        println!("{}", format_precedent(hits[0].1).dimmed());
    }

    Ok(())
}

fn hit_table(hits: &[(f32, &CaseRecord)]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Score").fg(Color::Cyan),
            Cell::new("Case").fg(Color::Cyan),
            Cell::new("Type").fg(Color::Cyan),
            Cell::new("Jurisdiction").fg(Color::Cyan),
            Cell::new("Outcome").fg(Color::Cyan),
        ]);

    for (score, record) in hits {
        table.add_row(vec![
            Cell::new(format!("{:.3}", score)),
            Cell::new(&record.case_name).fg(Color::Green),
            Cell::new(&record.metadata.case_type),
            Cell::new(&record.metadata.jurisdiction),
            Cell::new(&record.metadata.outcome),
        ]);
    }

    table
}
