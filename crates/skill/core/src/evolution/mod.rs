//! Skill evolution: branching trees chosen at level-up and the weighted
//! catalog of stackable evolution effects.

mod branch;
mod catalog;
mod pool;

pub use branch::{BranchChoice, BranchRecord, EvolutionBranch, EvolutionNode, EvolutionTree};
pub use catalog::{EvolutionEffectEntry, Rarity};
pub use pool::{EvolutionEffectPool, PoolStatistics};
