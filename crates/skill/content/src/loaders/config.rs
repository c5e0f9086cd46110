//! Skill system configuration loader.

use std::path::Path;

use skill_core::SkillConfig;

use crate::loaders::{LoadResult, read_file};

const EMBEDDED_CONFIG: &str = include_str!("../../data/config.toml");

/// Loader for [`SkillConfig`] from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> LoadResult<SkillConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("{} ({})", e, path.display()))
    }

    pub fn parse(content: &str) -> LoadResult<SkillConfig> {
        let config: SkillConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;
        Ok(config)
    }

    /// The default configuration shipped with the crate.
    pub fn embedded() -> LoadResult<SkillConfig> {
        Self::parse(EMBEDDED_CONFIG)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_config_matches_defaults() {
        let config = ConfigLoader::embedded().expect("embedded config parses");
        assert_eq!(config, SkillConfig::default());
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config = ConfigLoader::parse("[evolution]\noption_count = 5\n").unwrap();
        assert_eq!(config.evolution.option_count, 5);
        assert_eq!(config.evolution.decay_factor, 0.5);
        assert_eq!(config.slot_count, SkillConfig::DEFAULT_SLOT_COUNT);
    }

    #[test]
    fn malformed_config_is_an_error() {
        assert!(ConfigLoader::parse("slot_count = \"four\"").is_err());
    }
}
