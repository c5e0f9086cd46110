//! Sandbox configuration loaded from the environment.
use std::env;
use std::path::PathBuf;

/// Environment variables:
/// - `SKILL_CONTENT_DIR` - content directory laid out like the embedded data
///   (default: embedded content)
/// - `SKILL_LOG_DIR` - directory for `sandbox.log` (default: stderr only)
/// - `SANDBOX_ROUNDS` - cast rounds after levelling up (default: 2)
///
/// Runtime tunables (`SKILL_*`) are read by `RuntimeConfig::with_env_overrides`.
#[derive(Clone, Debug)]
pub struct SandboxConfig {
    pub content_dir: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    pub rounds: u32,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            content_dir: None,
            log_dir: None,
            rounds: 2,
        }
    }
}

impl SandboxConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(dir) = env::var_os("SKILL_CONTENT_DIR") {
            config.content_dir = Some(PathBuf::from(dir));
        }
        if let Some(dir) = env::var_os("SKILL_LOG_DIR") {
            config.log_dir = Some(PathBuf::from(dir));
        }
        if let Some(rounds) = read_env::<u32>("SANDBOX_ROUNDS") {
            config.rounds = rounds.min(100);
        }

        config
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
