//! Play command - judge a debate interactively
//!
//! Usage:
//! ```bash
//! moot play
//! moot play --case "A drone trespass case over mango orchards." --filter case_type=tort
//! moot play --transcript debate.json
//! ```

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::CorpusArgs;
use moot_core::{ChaosArgument, PrecedentArgument, StructuredArgument, Winner};
use moot_debate::{
    ContinuationSignal, DebateService, EngineConfig, RagConfig, TurnOutcome, VerdictClassifier,
};
use moot_llm::LlmConfig;

#[derive(Args)]
pub struct PlayArgs {
    /// Case to argue; a random one is drawn when omitted
    #[arg(long)]
    case: Option<String>,

    /// Print the retrieved precedent each turn
    #[arg(long)]
    show_precedent: bool,

    /// Write the finished session as JSON to this file
    #[arg(long, value_name = "PATH")]
    transcript: Option<PathBuf>,

    #[command(flatten)]
    corpus: CorpusArgs,
}

pub async fn run(args: PlayArgs) -> Result<()> {
    let llm_config = LlmConfig::from_env();
    llm_config.validate().context("Invalid LLM configuration")?;
    let providers = llm_config.build_providers();
    if providers.is_mock {
        crate::print_warning("No API key set, the lawyers are running on the offline mock");
    }

    let records = args.corpus.load().await;
    let service = DebateService::from_providers(
        &providers,
        records,
        RagConfig::from_env(),
        EngineConfig::from_env(),
    )
    .await;
    let filters = args.corpus.filters();

    let started = service
        .start(args.case.as_deref())
        .await
        .context("Failed to open the session")?;

    println!("{}", "MOOT COURT IS NOW IN SESSION".bold().cyan());
    println!("{}", "═".repeat(50).cyan());
    println!("  {} {}", "Case:".dimmed(), started.case.bold());
    println!(
        "  {} {}",
        "Precedent lawyer for:".dimmed(),
        started.persona_a_role.green()
    );
    println!(
        "  {} {}",
        "Chaos lawyer for:".dimmed(),
        started.persona_b_role.magenta()
    );
    println!();
    crate::print_info(&ruling_hint(service.engine().classifier()));
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", "judge>".bold().yellow());
        std::io::stdout().flush()?;

        // End of input adjourns the court
        let input = lines.next_line().await?.unwrap_or_else(|| "quit".to_string());

        let outcome = service
            .run_turn(started.session_id, &input, &filters)
            .await
            .context("Turn failed")?;

        if args.show_precedent && !outcome.is_finished {
            println!("{}", outcome.retrieved_context.dimmed());
            println!();
        }
        render_turn(&outcome);

        if let Some(winner) = outcome.winner {
            announce(winner);
            break;
        }
    }

    if let Some(path) = &args.transcript {
        let transcript = service
            .transcript(started.session_id)
            .await
            .context("Failed to export the transcript")?;
        tokio::fs::write(path, transcript)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        crate::print_success(&format!("Transcript written to {}", path.display()));
    }

    Ok(())
}

/// One line naming a ruling for each verdict
fn ruling_hint(classifier: &VerdictClassifier) -> String {
    let first = |signal| {
        classifier
            .terms(signal)
            .first()
            .map(|t| format!("\"{}\"", t))
            .unwrap_or_default()
    };
    format!(
        "Rule with {}, {} or {}; anything else continues.",
        first(ContinuationSignal::PersonaAWins),
        first(ContinuationSignal::PersonaBWins),
        first(ContinuationSignal::Quit)
    )
}

fn render_turn(outcome: &TurnOutcome) {
    for argument in outcome.arguments() {
        match argument {
            StructuredArgument::Precedent(a) => print_precedent(&a),
            StructuredArgument::Chaos(b) => print_chaos(&b),
        }
    }
    if outcome.persona_a_fallback || outcome.persona_b_fallback {
        crate::print_warning("A lawyer lost their train of thought; a stock argument was used.");
    }
}

fn print_precedent(output: &PrecedentArgument) {
    println!("{}", "Precedent lawyer:".bold().green());
    println!("  {}", output.argument);
    println!("  {} {}", "Citation:".dimmed(), output.citation.italic());
    println!();
}

fn print_chaos(output: &ChaosArgument) {
    println!("{}", "Chaos lawyer:".bold().magenta());
    println!("  {}", output.argument);
    println!("  {} {}", "Rhetoric:".dimmed(), output.rhetoric.italic());
    println!();
}

fn announce(winner: Winner) {
    match winner {
        Winner::PersonaAWins => crate::print_success("Judgment for the precedent lawyer."),
        Winner::PersonaBWins => crate::print_success("Judgment for the chaos lawyer."),
        Winner::Quit | Winner::None => crate::print_info("Court adjourned without a verdict."),
    }
}
