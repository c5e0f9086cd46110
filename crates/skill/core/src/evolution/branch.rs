//! Branching evolution trees.

use crate::modifier::ModifierSpec;
use crate::types::{BranchId, NodeId, SkillId, TagSet};

/// Which side of an evolution node was picked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BranchChoice {
    A,
    B,
}

/// One side of an evolution node: tags it grants and modifiers it adds.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvolutionBranch {
    pub id: BranchId,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub tags: TagSet,
    #[cfg_attr(feature = "serde", serde(default))]
    pub modifiers: Vec<ModifierSpec>,
}

impl EvolutionBranch {
    pub fn new(id: impl Into<BranchId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            tags: TagSet::new(),
            modifiers: Vec::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_modifier(mut self, modifier: ModifierSpec) -> Self {
        self.modifiers.push(modifier);
        self
    }
}

/// A two-way choice unlocked at `level`.
///
/// `level == 0` marks a node that may be taken at any level.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvolutionNode {
    pub id: NodeId,
    pub level: u32,
    pub branch_a: EvolutionBranch,
    pub branch_b: EvolutionBranch,
}

impl EvolutionNode {
    pub fn new(
        id: impl Into<NodeId>,
        level: u32,
        branch_a: EvolutionBranch,
        branch_b: EvolutionBranch,
    ) -> Self {
        Self {
            id: id.into(),
            level,
            branch_a,
            branch_b,
        }
    }

    pub fn branch(&self, choice: BranchChoice) -> &EvolutionBranch {
        match choice {
            BranchChoice::A => &self.branch_a,
            BranchChoice::B => &self.branch_b,
        }
    }

    /// Which side of this node carries `branch`, if either.
    pub fn choice_for(&self, branch: &BranchId) -> Option<BranchChoice> {
        if &self.branch_a.id == branch {
            Some(BranchChoice::A)
        } else if &self.branch_b.id == branch {
            Some(BranchChoice::B)
        } else {
            None
        }
    }
}

/// A branch taken at level-up, as kept in the runtime state's history.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BranchRecord {
    pub node: NodeId,
    pub branch: BranchId,
}

/// Evolution nodes of one skill.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvolutionTree {
    pub skill: SkillId,
    #[cfg_attr(feature = "serde", serde(default))]
    pub nodes: Vec<EvolutionNode>,
}

impl EvolutionTree {
    pub fn new(skill: impl Into<SkillId>, nodes: Vec<EvolutionNode>) -> Self {
        Self {
            skill: skill.into(),
            nodes,
        }
    }

    pub fn node_for_level(&self, level: u32) -> Option<&EvolutionNode> {
        self.nodes.iter().find(|node| node.level == level)
    }

    /// Node to offer when a skill at `current_level` levels up.
    pub fn next_node(&self, current_level: u32) -> Option<&EvolutionNode> {
        self.node_for_level(current_level + 1)
    }

    pub fn find_branch(&self, branch: &BranchId) -> Option<(&EvolutionNode, BranchChoice)> {
        self.nodes
            .iter()
            .find_map(|node| node.choice_for(branch).map(|choice| (node, choice)))
    }

    /// Highest level any node unlocks.
    pub fn max_level(&self) -> u32 {
        self.nodes.iter().map(|node| node.level).max().unwrap_or(1)
    }
}
