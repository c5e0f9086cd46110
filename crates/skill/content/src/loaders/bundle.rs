//! Complete content set for one runtime.

use std::collections::HashSet;
use std::path::Path;

use skill_core::{
    EvolutionEffectEntry, EvolutionEffectPool, EvolutionTree, SkillConfig, SkillDefinition,
    SkillId,
};

use super::{ConfigLoader, EvolutionLoader, LoadResult, SkillLoader};

/// Skills, evolution data and configuration loaded together and
/// cross-checked.
#[derive(Debug, Clone)]
pub struct ContentBundle {
    pub skills: Vec<SkillDefinition>,
    pub trees: Vec<EvolutionTree>,
    pub catalog: Vec<EvolutionEffectEntry>,
    pub config: SkillConfig,
}

impl ContentBundle {
    /// Content compiled into the crate.
    pub fn embedded() -> LoadResult<Self> {
        let bundle = Self {
            skills: SkillLoader::embedded()?,
            trees: EvolutionLoader::embedded_trees()?,
            catalog: EvolutionLoader::embedded_catalog()?,
            config: ConfigLoader::embedded()?,
        };
        bundle.validate()?;
        Ok(bundle)
    }

    /// Loads a content directory laid out like the crate's `data/`:
    /// `skills.ron`, `evolution/trees.ron`, `evolution/catalog.ron` and an
    /// optional `config.toml`.
    pub fn from_dir(dir: &Path) -> LoadResult<Self> {
        let config_path = dir.join("config.toml");
        let config = if config_path.exists() {
            ConfigLoader::load(&config_path)?
        } else {
            SkillConfig::default()
        };

        let bundle = Self {
            skills: SkillLoader::load(&dir.join("skills.ron"))?,
            trees: EvolutionLoader::load_trees(&dir.join("evolution").join("trees.ron"))?,
            catalog: EvolutionLoader::load_catalog(&dir.join("evolution").join("catalog.ron"))?,
            config,
        };
        bundle.validate()?;
        Ok(bundle)
    }

    /// Checks that every tree belongs to a known skill, that no skill has two
    /// trees, and that modifier ids cannot collide on one skill.
    ///
    /// A skill's state holds its tree's branch modifiers next to any catalog
    /// modifier, and modifiers are keyed by id, so a tree's modifier ids must
    /// be unique within the tree and disjoint from the catalog's.
    pub fn validate(&self) -> LoadResult<()> {
        let mut effect_ids = HashSet::new();
        let mut catalog_modifiers = HashSet::new();
        for entry in &self.catalog {
            if !effect_ids.insert(&entry.id) {
                anyhow::bail!("Evolution effect {} is defined more than once", entry.id);
            }
            if !catalog_modifiers.insert(&entry.modifier.id) {
                anyhow::bail!(
                    "Modifier {} is used by more than one evolution effect",
                    entry.modifier.id
                );
            }
        }

        for (index, tree) in self.trees.iter().enumerate() {
            if self.skill(&tree.skill).is_none() {
                anyhow::bail!("Evolution tree references unknown skill {}", tree.skill);
            }
            if self.trees[..index].iter().any(|other| other.skill == tree.skill) {
                anyhow::bail!("Skill {} has more than one evolution tree", tree.skill);
            }

            let mut tree_modifiers = HashSet::new();
            let modifiers = tree
                .nodes
                .iter()
                .flat_map(|node| [&node.branch_a, &node.branch_b])
                .flat_map(|branch| &branch.modifiers);
            for modifier in modifiers {
                if catalog_modifiers.contains(&modifier.id) {
                    anyhow::bail!(
                        "Modifier {} of the {} tree is also an evolution effect modifier",
                        modifier.id,
                        tree.skill
                    );
                }
                if !tree_modifiers.insert(&modifier.id) {
                    anyhow::bail!(
                        "Modifier {} appears more than once in the {} tree",
                        modifier.id,
                        tree.skill
                    );
                }
            }
        }
        Ok(())
    }

    pub fn skill(&self, id: &SkillId) -> Option<&SkillDefinition> {
        self.skills.iter().find(|skill| &skill.id == id)
    }

    pub fn tree_for(&self, id: &SkillId) -> Option<&EvolutionTree> {
        self.trees.iter().find(|tree| &tree.skill == id)
    }

    /// Evolution pool over the catalog using the bundle's configuration.
    pub fn evolution_pool(&self) -> EvolutionEffectPool {
        EvolutionEffectPool::new(self.catalog.clone(), self.config.evolution.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_bundle_is_consistent() {
        let bundle = ContentBundle::embedded().expect("Failed to load embedded content");
        let fireball = SkillId::new("fireball");

        assert!(bundle.skill(&fireball).is_some());
        assert!(bundle.tree_for(&fireball).is_some());
        assert!(bundle.tree_for(&SkillId::new("shield_bash")).is_none());
        assert_eq!(bundle.evolution_pool().len(), bundle.catalog.len());
    }

    #[test]
    fn test_from_dir_reads_layout() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("evolution")).unwrap();
        std::fs::write(
            dir.path().join("skills.ron"),
            r#"(skills: [(id: "spark", name: "Spark", charge: Some((threshold: 10)))])"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("evolution").join("trees.ron"),
            r#"(trees: [(skill: "spark", nodes: [])])"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("evolution").join("catalog.ron"),
            r#"(effects: [])"#,
        )
        .unwrap();

        let bundle = ContentBundle::from_dir(dir.path()).unwrap();
        assert_eq!(bundle.skills.len(), 1);
        assert_eq!(bundle.skills[0].base_cost(), 10);
        assert_eq!(bundle.config, SkillConfig::default());
        assert!(bundle.evolution_pool().is_empty());
    }

    #[test]
    fn test_tree_for_unknown_skill_rejected() {
        let mut bundle = ContentBundle::embedded().unwrap();
        bundle.trees.push(EvolutionTree::new("missing", Vec::new()));
        assert!(bundle.validate().is_err());
    }

    #[test]
    fn test_duplicate_catalog_modifier_rejected() {
        let mut bundle = ContentBundle::embedded().unwrap();
        let mut copy = bundle.catalog[0].clone();
        copy.id = "sharpened_again".into();
        bundle.catalog.push(copy);

        let err = bundle.validate().unwrap_err();
        assert!(err.to_string().contains("more than one evolution effect"));
    }

    #[test]
    fn test_tree_modifier_shadowing_catalog_rejected() {
        let mut bundle = ContentBundle::embedded().unwrap();
        let catalog_modifier = bundle.catalog[0].modifier.clone();
        let fireball = bundle
            .trees
            .iter_mut()
            .find(|tree| tree.skill.as_str() == "fireball")
            .expect("fireball tree");
        fireball.nodes[0].branch_a.modifiers.push(catalog_modifier);

        assert!(bundle.validate().is_err());
    }
}
