//! Skill execution pipeline, modifier system and evolution selection.
//!
//! `skill-core` defines the canonical rules for resolving an active ability
//! cast: the ordered [`pipeline::SkillPipeline`] that turns a cast request
//! into world effects, the capability-based [`modifier`] system that rewrites
//! stage behavior per skill instance, the per-instance
//! [`state::SkillRuntimeState`] that accumulates those modifiers, and the
//! weighted [`evolution::EvolutionEffectPool`] that offers new modifiers at
//! level-up.
//!
//! Everything outside the core (inventory, spatial queries, effect playback,
//! notification delivery) is reached through the collaborator traits in
//! [`env`], injected when a pipeline is built.
pub mod cast;
pub mod config;
pub mod definition;
pub mod env;
pub mod error;
pub mod evolution;
pub mod modifier;
pub mod pipeline;
pub mod state;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use cast::{
    CancelReason, CastContext, CastRequest, CooldownConfig, DamageResult, ExecutionToken,
    ResourceCostConfig, StageOutcome, TargetingConfig, refund_spent,
};
pub use config::{EvolutionPoolConfig, SkillConfig};
pub use definition::{
    ChargeSpec, EffectDefinition, EffectKind, SkillCues, SkillDefinition, TargetingSpec,
};
pub use env::{
    CastOccurred, CuePlayback, EffectFactory, EffectInstance, FilterGroup, GameClock, HookError,
    NotificationBus, ResourceInventory, SkillEnv, StandardEffectFactory, StatusEffectSink,
    TargetAcquisition, TargetFilter,
};
pub use error::{CastError, ErrorSeverity, EvolutionError, SkillError};
pub use evolution::{
    BranchChoice, BranchRecord, EvolutionBranch, EvolutionEffectEntry, EvolutionEffectPool,
    EvolutionNode, EvolutionTree, PoolStatistics, Rarity,
};
pub use modifier::{
    Capabilities, CooldownAdjust, CooldownModifier, CostAdjust, CostModifier, CrossStageModifier,
    CrossStageRule, DamageAdjust, DamageModifier, EffectGeneratorModifier, Modifier, ModifierSpec,
    TargetingAdjust, TargetingModifier,
};
pub use pipeline::{SkillPipeline, SkillStage, TargetingBinding};
pub use state::{SkillProgress, SkillRuntimeState};
pub use types::{
    BranchId, CueRef, EffectId, EntityId, EvolutionEffectId, InstanceId, ModifierId, NodeId,
    SkillId, SlotIndex, TagSet, TeamId,
};
