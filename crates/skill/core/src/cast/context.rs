//! Value bag threaded through every pipeline stage.

use std::time::Duration;

use glam::Vec3;

use crate::definition::{SkillDefinition, TargetingSpec, secs_to_duration};
use crate::state::SkillRuntimeState;
use crate::types::{EntityId, SlotIndex, TeamId};

/// Resource cost adjustments accumulated from cost modifiers.
///
/// Derived fresh for every cast.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResourceCostConfig {
    pub multiplier: f32,
    pub flat: i32,
}

impl ResourceCostConfig {
    /// `max(0, round(base * multiplier) + flat)`
    pub fn final_cost(&self, base_cost: i32) -> i32 {
        let scaled = (base_cost as f32 * self.multiplier).round() as i32;
        scaled.saturating_add(self.flat).max(0)
    }
}

impl Default for ResourceCostConfig {
    fn default() -> Self {
        Self {
            multiplier: 1.0,
            flat: 0,
        }
    }
}

/// Targeting parameters after targeting modifiers were applied.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TargetingConfig {
    pub range: f32,
    /// `0` or less means unlimited.
    pub max_count: i32,
    pub radius: f32,
}

impl From<&TargetingSpec> for TargetingConfig {
    fn from(spec: &TargetingSpec) -> Self {
        Self {
            range: spec.range,
            max_count: spec.max_count,
            radius: spec.radius,
        }
    }
}

/// Cooldown adjustments accumulated from cooldown modifiers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CooldownConfig {
    pub multiplier: f32,
    pub flat_secs: f32,
}

impl CooldownConfig {
    /// `max(0, base * multiplier + flat)` as a duration.
    pub fn final_cooldown(&self, base_secs: f32) -> Duration {
        secs_to_duration(base_secs * self.multiplier + self.flat_secs)
    }
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            multiplier: 1.0,
            flat_secs: 0.0,
        }
    }
}

/// Damage accumulated by damage modifiers.
///
/// The true-damage flag is sticky: once marked it stays set until the result
/// is rebuilt from the definition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DamageResult {
    pub final_damage: f32,
    pub source: EntityId,
    is_true_damage: bool,
}

impl DamageResult {
    pub fn new(final_damage: f32, source: EntityId) -> Self {
        Self {
            final_damage,
            source,
            is_true_damage: false,
        }
    }

    /// Starting damage of a cast of `definition` by `source`.
    pub fn base(definition: &SkillDefinition, source: EntityId) -> Self {
        let mut result = Self::new(definition.base_damage, source);
        if definition.true_damage {
            result.mark_true_damage();
        }
        result
    }

    pub fn is_true_damage(&self) -> bool {
        self.is_true_damage
    }

    pub fn mark_true_damage(&mut self) {
        self.is_true_damage = true;
    }
}

/// Everything the host knows about a cast when it is issued.
///
/// The request is owned data so it can cross the pre-pipeline delay; the
/// borrowed [`CastContext`] is only built when the pipeline runs.
#[derive(Clone, Debug, PartialEq)]
pub struct CastRequest {
    pub caster: EntityId,
    pub team: TeamId,
    pub position: Vec3,
    pub aim_point: Vec3,
    pub slot: SlotIndex,
    /// Host clock reading when the cast was issued.
    pub issued_at: Duration,
}

impl CastRequest {
    pub fn new(caster: EntityId, team: TeamId, position: Vec3, aim_point: Vec3) -> Self {
        Self {
            caster,
            team,
            position,
            aim_point,
            slot: SlotIndex::default(),
            issued_at: Duration::ZERO,
        }
    }

    pub fn in_slot(mut self, slot: SlotIndex) -> Self {
        self.slot = slot;
        self
    }

    pub fn at(mut self, issued_at: Duration) -> Self {
        self.issued_at = issued_at;
        self
    }
}

/// Mutable state of one cast attempt, passed by exclusive reference through
/// the pipeline.
pub struct CastContext<'a> {
    pub caster: EntityId,
    pub team: TeamId,
    pub position: Vec3,
    pub aim_point: Vec3,
    /// Unit vector from the caster towards the aim point (zero if they coincide).
    pub aim_direction: Vec3,
    pub slot: SlotIndex,
    /// Host clock reading when the pipeline started.
    pub now: Duration,
    pub cost: ResourceCostConfig,
    pub targeting: TargetingConfig,
    pub damage: DamageResult,
    /// Resolved targets, populated by the targeting stage.
    pub targets: Vec<EntityId>,
    pub state: &'a mut SkillRuntimeState,
}

impl<'a> CastContext<'a> {
    /// Creates a context seeded from the request and the skill's definition.
    pub fn new(request: &CastRequest, now: Duration, state: &'a mut SkillRuntimeState) -> Self {
        let definition = state.definition();
        let targeting = TargetingConfig::from(&definition.targeting);
        let damage = DamageResult::base(definition, request.caster);

        Self {
            caster: request.caster,
            team: request.team,
            position: request.position,
            aim_point: request.aim_point,
            aim_direction: (request.aim_point - request.position).normalize_or_zero(),
            slot: request.slot,
            now,
            cost: ResourceCostConfig::default(),
            targeting,
            damage,
            targets: Vec::new(),
            state,
        }
    }
}
