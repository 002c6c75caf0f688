//! Info command - show version and configuration

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use moot_debate::{ContinuationSignal, EngineConfig, RagConfig, VerdictClassifier, SEED_CASES};
use moot_llm::LlmConfig;

#[derive(Args)]
pub struct InfoArgs;

pub fn run(_args: InfoArgs) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    let llm = LlmConfig::from_env();
    let engine = EngineConfig::from_env();
    let rag = RagConfig::from_env();

    println!("{}", "Moot - AI courtroom debate".bold().cyan());
    println!("{}", "═".repeat(50).cyan());
    println!();

    println!("{}", "Version:".bold());
    println!("  {} {}", "CLI Version:".dimmed(), version.green());
    println!();

    println!("{}", "Configuration:".bold());
    println!("  {} {}", "LLM provider:".dimmed(), llm.provider_name().green());
    println!("  {} {}s", "LLM timeout:".dimmed(), llm.timeout_secs);
    println!("  {} {}", "Precedents per query:".dimmed(), rag.top_k);
    println!(
        "  {} {}s / {}s",
        "Retrieval / generation timeout:".dimmed(),
        engine.retrieval_timeout.as_secs(),
        engine.generation_timeout.as_secs()
    );
    println!("  {} {:?}", "Chaos failure policy:".dimmed(), engine.chaos_failure);
    println!("  {} {:?}", "Quit narration:".dimmed(), engine.quit_narration);
    if let Err(e) = llm.validate() {
        crate::print_warning(&e.to_string());
    }
    println!();

    println!("{}", "Verdict terms:".bold());
    match VerdictClassifier::from_env() {
        Ok(classifier) => {
            for (label, signal) in [
                ("Precedent lawyer wins:", ContinuationSignal::PersonaAWins),
                ("Chaos lawyer wins:", ContinuationSignal::PersonaBWins),
                ("Adjourn:", ContinuationSignal::Quit),
            ] {
                println!("  {} {}", label.dimmed(), classifier.terms(signal).join(", "));
            }
        }
        Err(e) => crate::print_warning(&format!("{}, the default terms apply", e)),
    }
    println!();

    println!("{}", "Seed cases:".bold());
    for case in SEED_CASES {
        println!("  {} {}", "•".cyan(), case);
    }
    println!();

    println!("{}", "Environment:".bold());
    for var in [
        "OPENAI_API_KEY",
        "GOOGLE_API_KEY",
        "MOOT_LLM_MODEL",
        "MOOT_CASES_PATH",
        "MOOT_TOP_K",
        "MOOT_CHAOS_FAILURE",
        "MOOT_QUIT_NARRATION",
        "MOOT_PERSONA_A_TERMS",
        "MOOT_PERSONA_B_TERMS",
        "MOOT_QUIT_TERMS",
    ] {
        let state = if std::env::var(var).is_ok() {
            "set".green()
        } else {
            "unset".dimmed()
        };
        println!("  {} {}", format!("{}:", var).dimmed(), state);
    }
    println!();

    Ok(())
}
