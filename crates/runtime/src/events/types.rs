//! Event types for different topics.

use serde::{Deserialize, Serialize};
use skill_core::{
    BranchId, CancelReason, CastOccurred, EntityId, EvolutionEffectId, ModifierId, SkillId,
    SlotIndex,
};

/// Lifecycle of a single cast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CastEvent {
    /// Preconditions passed and a token was issued.
    Started {
        slot: SlotIndex,
        skill: SkillId,
        caster: EntityId,
    },

    /// The resource stage committed the cost. Published through the
    /// notification collaborator.
    Occurred(CastOccurred),

    /// Every stage returned `Continue`.
    Completed {
        slot: SlotIndex,
        skill: SkillId,
        targets: usize,
        damage: f32,
    },

    /// A stage returned `Fail`. Spent charge is not refunded.
    Failed {
        slot: SlotIndex,
        skill: SkillId,
        spent: i32,
    },

    /// The token was cancelled before or during the pipeline.
    Cancelled {
        slot: SlotIndex,
        skill: SkillId,
        reason: CancelReason,
        refunded: i32,
    },
}

/// Level-up decisions applied to equipped skills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProgressionEvent {
    LevelUp {
        slot: SlotIndex,
        skill: SkillId,
        level: u32,
        branch: BranchId,
    },

    EffectChosen {
        slot: SlotIndex,
        skill: SkillId,
        effect: EvolutionEffectId,
        modifier: ModifierId,
    },
}
