//! Moot server: the debate API as a runnable binary

use anyhow::{Context, Result};
use std::sync::Arc;

use moot_api::{MootServer, ServerConfig};
use moot_debate::{DebateService, EngineConfig, RagConfig};
use moot_llm::LlmConfig;

const DEFAULT_CASES_PATH: &str = "enriched_cases.json";

#[tokio::main]
async fn main() -> Result<()> {
    moot_api::init_tracing();

    let llm_config = LlmConfig::from_env();
    llm_config
        .validate()
        .context("Invalid LLM configuration")?;
    let providers = llm_config.build_providers();

    let cases_path =
        std::env::var("MOOT_CASES_PATH").unwrap_or_else(|_| DEFAULT_CASES_PATH.to_string());
    let records = match moot_persist::load_cases(&cases_path).await {
        Ok(records) => {
            tracing::info!(path = %cases_path, cases = records.len(), "Precedent corpus loaded");
            records
        }
        Err(e) => {
            tracing::warn!(path = %cases_path, error = %e, "No precedent corpus, debating without precedent");
            Vec::new()
        }
    };

    let service = DebateService::from_providers(
        &providers,
        records,
        RagConfig::from_env(),
        EngineConfig::from_env(),
    )
    .await;

    let config = ServerConfig::from_env();
    tracing::info!(
        provider = llm_config.provider_name(),
        addr = %config.addr,
        "Starting Moot server"
    );

    MootServer::new(config, Arc::new(service))
        .run()
        .await
        .context("Server error")?;

    Ok(())
}
