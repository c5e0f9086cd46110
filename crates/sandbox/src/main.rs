//! Skill system sandbox.
//!
//! Loads content, equips the bundled skills against in-memory collaborators
//! and plays a scripted session of casts, interrupts and level-ups. Useful
//! for eyeballing balance changes in the content files through the logs.
//!
//! ```bash
//! RUST_LOG=skill=debug cargo run -p skill-sandbox
//! SKILL_CONTENT_DIR=crates/skill/content/data SKILL_RNG_SEED=3 cargo run -p skill-sandbox
//! ```
mod config;
mod logging;
mod session;

use anyhow::{Context, Result};

use config::SandboxConfig;
use skill_content::ContentBundle;
use skill_runtime::RuntimeConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = SandboxConfig::from_env();
    let _guard = logging::setup_logging(config.log_dir.as_deref())?;

    let content = match &config.content_dir {
        Some(dir) => ContentBundle::from_dir(dir)
            .with_context(|| format!("Failed to load content from {}", dir.display()))?,
        None => ContentBundle::embedded().context("Failed to load embedded content")?,
    };
    let runtime_config = RuntimeConfig::new(content.config.clone()).with_env_overrides();

    tracing::info!("Starting skill sandbox");
    tracing::info!("Skills: {}", content.skills.len());
    tracing::info!("Slots: {}", runtime_config.skills.effective_slot_count());
    tracing::info!("RNG seed: {:?}", runtime_config.rng_seed);

    session::Session::new(content, runtime_config)?
        .run(config.rounds)
        .await
}
