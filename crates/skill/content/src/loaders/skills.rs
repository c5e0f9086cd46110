//! Skill definition loader.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use skill_core::SkillDefinition;

use crate::loaders::{LoadResult, read_file};

const EMBEDDED_SKILLS: &str = include_str!("../../data/skills.ron");

/// Skill catalog structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillCatalog {
    pub skills: Vec<SkillDefinition>,
}

/// Loader for skill definitions from RON files.
pub struct SkillLoader;

impl SkillLoader {
    /// Load skill definitions from a RON file containing a [`SkillCatalog`].
    pub fn load(path: &Path) -> LoadResult<Vec<SkillDefinition>> {
        let content = read_file(path)?;
        Self::parse(&content).map_err(|e| anyhow::anyhow!("{} ({})", e, path.display()))
    }

    /// Parse a skill catalog and reject duplicate ids.
    pub fn parse(content: &str) -> LoadResult<Vec<SkillDefinition>> {
        let catalog: SkillCatalog = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse skill catalog RON: {}", e))?;

        let mut seen = HashSet::new();
        for skill in &catalog.skills {
            if !seen.insert(skill.id.clone()) {
                anyhow::bail!("Duplicate skill id in catalog: {}", skill.id);
            }
        }
        Ok(catalog.skills)
    }

    /// The skill definitions shipped with the crate.
    pub fn embedded() -> LoadResult<Vec<SkillDefinition>> {
        Self::parse(EMBEDDED_SKILLS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skill_core::EffectKind;

    #[test]
    fn test_load_embedded_skills() {
        let skills = SkillLoader::embedded().expect("Failed to load skills");
        assert!(skills.len() >= 4, "Should ship at least 4 skills");

        let fireball = skills
            .iter()
            .find(|s| s.id.as_str() == "fireball")
            .expect("fireball is defined");
        assert_eq!(fireball.base_cost(), 100);
        assert!(fireball.tags.contains("fire"));
        assert_eq!(fireball.targeting.strategy.as_deref(), Some("aim_sphere"));
        assert_eq!(fireball.effects.len(), 2);
        assert!(matches!(fireball.effects[1].kind, EffectKind::Burn { .. }));

        let nova = skills
            .iter()
            .find(|s| s.id.as_str() == "frost_nova")
            .expect("frost_nova is defined");
        assert!(nova.detection_delay_secs > 0.0);

        let bash = skills
            .iter()
            .find(|s| s.id.as_str() == "shield_bash")
            .expect("shield_bash is defined");
        assert!(!bash.requires_charge());
        assert_eq!(bash.base_cost(), 0);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let ron = r#"(skills: [(id: "a", name: "A"), (id: "a", name: "Again")])"#;
        let err = SkillLoader::parse(ron).unwrap_err();
        assert!(err.to_string().contains("Duplicate skill id"));
    }
}
