//! Capability-based modifiers.
//!
//! A modifier is an immutable configuration object that rewrites the behavior
//! of one or more pipeline stages. Each stage capability is its own trait; a
//! modifier implements any subset of them and exposes the ones it has through
//! the `as_*` accessors on [`Modifier`]. Stages ask the runtime state for "all
//! modifiers with capability X" and never probe concrete types.
//!
//! # Ordering
//!
//! Within a capability group modifiers run in descending [`Modifier::priority`].
//! The relative order of equal priorities is unspecified.
//!
//! # Failure
//!
//! Every hook returns `Result<_, HookError>`. A failing hook is logged by the
//! caller and treated as having no effect; the rest of the stage continues.

mod spec;

use std::fmt;

use bitflags::bitflags;

use crate::cast::{CastContext, CooldownConfig, DamageResult, ResourceCostConfig, TargetingConfig};
use crate::definition::EffectDefinition;
use crate::env::HookError;
use crate::types::ModifierId;

pub use spec::{
    CooldownAdjust, CostAdjust, CrossStageRule, DamageAdjust, ModifierSpec, TargetingAdjust,
};

bitflags! {
    /// Set of stage capabilities a modifier implements.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u8 {
        const COST             = 1 << 0;
        const TARGETING        = 1 << 1;
        const DAMAGE           = 1 << 2;
        const CROSS_STAGE      = 1 << 3;
        const EFFECT_GENERATOR = 1 << 4;
        const COOLDOWN         = 1 << 5;
    }
}

/// Adjusts the resource cost of a cast.
pub trait CostModifier {
    fn modify_cost(&self, cost: &mut ResourceCostConfig) -> Result<(), HookError>;
}

/// Adjusts range, radius and target count.
pub trait TargetingModifier {
    fn modify_targeting(&self, targeting: &mut TargetingConfig) -> Result<(), HookError>;
}

/// Adjusts the damage result after targeting.
pub trait DamageModifier {
    fn modify_damage(&self, damage: &mut DamageResult) -> Result<(), HookError>;
}

/// Rule with full read/write access to the cast context.
///
/// Cross-stage rules run once after the impact cue and again at the start of
/// damage calculation, after the damage result has been rebuilt from the
/// definition. Rules must therefore only derive their writes from the context
/// they are given.
pub trait CrossStageModifier {
    fn apply_cross_stage(&self, ctx: &mut CastContext<'_>) -> Result<(), HookError>;
}

/// Contributes extra status effects to every cast of the skill.
pub trait EffectGeneratorModifier {
    fn generate_effects(&self) -> Result<Vec<EffectDefinition>, HookError>;
}

/// Adjusts the skill's cooldown.
pub trait CooldownModifier {
    fn modify_cooldown(&self, cooldown: &mut CooldownConfig) -> Result<(), HookError>;
}

/// A modifier held by a [`crate::SkillRuntimeState`].
///
/// Identity is the [`id`](Self::id): a runtime state never holds two
/// modifiers with the same id.
pub trait Modifier: Send + Sync + fmt::Debug {
    fn id(&self) -> &ModifierId;

    /// Higher runs first within a capability group.
    fn priority(&self) -> i32 {
        0
    }

    fn as_cost(&self) -> Option<&dyn CostModifier> {
        None
    }

    fn as_targeting(&self) -> Option<&dyn TargetingModifier> {
        None
    }

    fn as_damage(&self) -> Option<&dyn DamageModifier> {
        None
    }

    fn as_cross_stage(&self) -> Option<&dyn CrossStageModifier> {
        None
    }

    fn as_effect_generator(&self) -> Option<&dyn EffectGeneratorModifier> {
        None
    }

    fn as_cooldown(&self) -> Option<&dyn CooldownModifier> {
        None
    }

    fn capabilities(&self) -> Capabilities {
        let mut caps = Capabilities::empty();
        caps.set(Capabilities::COST, self.as_cost().is_some());
        caps.set(Capabilities::TARGETING, self.as_targeting().is_some());
        caps.set(Capabilities::DAMAGE, self.as_damage().is_some());
        caps.set(Capabilities::CROSS_STAGE, self.as_cross_stage().is_some());
        caps.set(
            Capabilities::EFFECT_GENERATOR,
            self.as_effect_generator().is_some(),
        );
        caps.set(Capabilities::COOLDOWN, self.as_cooldown().is_some());
        caps
    }
}
