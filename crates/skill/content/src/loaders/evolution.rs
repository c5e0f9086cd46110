//! Evolution tree and effect catalog loaders.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use skill_core::{EvolutionEffectEntry, EvolutionTree};

use crate::loaders::{LoadResult, read_file};

const EMBEDDED_TREES: &str = include_str!("../../data/evolution/trees.ron");
const EMBEDDED_CATALOG: &str = include_str!("../../data/evolution/catalog.ron");

/// Evolution trees structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionTreeCatalog {
    pub trees: Vec<EvolutionTree>,
}

/// Evolution effect catalog structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionCatalog {
    pub effects: Vec<EvolutionEffectEntry>,
}

/// Loader for evolution data from RON files.
pub struct EvolutionLoader;

impl EvolutionLoader {
    pub fn load_trees(path: &Path) -> LoadResult<Vec<EvolutionTree>> {
        let content = read_file(path)?;
        Self::parse_trees(&content).map_err(|e| anyhow::anyhow!("{} ({})", e, path.display()))
    }

    pub fn load_catalog(path: &Path) -> LoadResult<Vec<EvolutionEffectEntry>> {
        let content = read_file(path)?;
        Self::parse_catalog(&content).map_err(|e| anyhow::anyhow!("{} ({})", e, path.display()))
    }

    /// Parse evolution trees.
    ///
    /// Every node must unlock level 2 or above and a tree may hold only one
    /// node per level; branch ids must be unique within a tree.
    pub fn parse_trees(content: &str) -> LoadResult<Vec<EvolutionTree>> {
        let catalog: EvolutionTreeCatalog = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse evolution trees RON: {}", e))?;

        for tree in &catalog.trees {
            let mut levels = HashSet::new();
            let mut branches = HashSet::new();
            for node in &tree.nodes {
                if node.level < 2 {
                    anyhow::bail!(
                        "Evolution node {} of {} unlocks level {}, expected 2 or above",
                        node.id,
                        tree.skill,
                        node.level
                    );
                }
                if !levels.insert(node.level) {
                    anyhow::bail!("Evolution tree {} has two nodes for level {}", tree.skill, node.level);
                }
                for branch in [&node.branch_a, &node.branch_b] {
                    if !branches.insert(branch.id.clone()) {
                        anyhow::bail!("Duplicate branch id {} in tree {}", branch.id, tree.skill);
                    }
                }
            }
        }
        Ok(catalog.trees)
    }

    /// Parse the effect catalog and reject duplicate or non-positive entries.
    pub fn parse_catalog(content: &str) -> LoadResult<Vec<EvolutionEffectEntry>> {
        let catalog: EvolutionCatalog = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse evolution catalog RON: {}", e))?;

        let mut seen = HashSet::new();
        for entry in &catalog.effects {
            if !seen.insert(entry.id.clone()) {
                anyhow::bail!("Duplicate evolution effect id: {}", entry.id);
            }
            if !entry.base_weight.is_finite() || entry.base_weight < 0.0 {
                anyhow::bail!("Evolution effect {} has invalid weight {}", entry.id, entry.base_weight);
            }
            if entry.max_level != 0 && entry.max_level < entry.min_level {
                anyhow::bail!("Evolution effect {} has max_level below min_level", entry.id);
            }
        }
        Ok(catalog.effects)
    }

    pub fn embedded_trees() -> LoadResult<Vec<EvolutionTree>> {
        Self::parse_trees(EMBEDDED_TREES)
    }

    pub fn embedded_catalog() -> LoadResult<Vec<EvolutionEffectEntry>> {
        Self::parse_catalog(EMBEDDED_CATALOG)
    }
}
