//! Data-driven modifier loaded from content files.
//!
//! [`ModifierSpec`] is one struct with an optional part per capability, so a
//! single catalog entry or branch can, say, cut cost and add a burn effect at
//! the same time. It implements exactly the capabilities whose part is
//! present.

use std::sync::Arc;

use crate::cast::{CastContext, CooldownConfig, DamageResult, ResourceCostConfig, TargetingConfig};
use crate::definition::EffectDefinition;
use crate::env::HookError;
use crate::types::ModifierId;

use super::{
    CooldownModifier, CostModifier, CrossStageModifier, DamageModifier, EffectGeneratorModifier,
    Modifier, TargetingModifier,
};

/// Cost part: `multiplier` scales, `flat` adds.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CostAdjust {
    pub multiplier: f32,
    pub flat: i32,
}

impl Default for CostAdjust {
    fn default() -> Self {
        Self {
            multiplier: 1.0,
            flat: 0,
        }
    }
}

/// Targeting part. Extra targets only apply to skills with a target cap.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TargetingAdjust {
    pub range_multiplier: f32,
    pub range_flat: f32,
    pub radius_multiplier: f32,
    pub radius_flat: f32,
    pub extra_targets: i32,
}

impl Default for TargetingAdjust {
    fn default() -> Self {
        Self {
            range_multiplier: 1.0,
            range_flat: 0.0,
            radius_multiplier: 1.0,
            radius_flat: 0.0,
            extra_targets: 0,
        }
    }
}

/// One step of a damage part; steps run in listed order.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DamageAdjust {
    Flat(f32),
    Scale(f32),
    TrueDamage,
}

/// Rules that look at the whole cast context.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CrossStageRule {
    /// Adds damage when at least `min_targets` were hit.
    CrowdBonus { min_targets: u32, bonus_damage: f32 },
    /// Turns the cast into true damage when at least `min_targets` were hit.
    CrowdTrueDamage { min_targets: u32 },
    /// Keeps only the first `max` targets.
    TargetCap { max: u32 },
}

/// Cooldown part.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CooldownAdjust {
    pub multiplier: f32,
    pub flat_secs: f32,
}

impl Default for CooldownAdjust {
    fn default() -> Self {
        Self {
            multiplier: 1.0,
            flat_secs: 0.0,
        }
    }
}

/// Modifier whose capabilities are the parts present in its data.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModifierSpec {
    pub id: ModifierId,
    #[cfg_attr(feature = "serde", serde(default))]
    pub priority: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub cost: Option<CostAdjust>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub targeting: Option<TargetingAdjust>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub damage: Vec<DamageAdjust>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub cross_stage: Vec<CrossStageRule>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub effects: Vec<EffectDefinition>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub cooldown: Option<CooldownAdjust>,
}

impl ModifierSpec {
    pub fn new(id: impl Into<ModifierId>) -> Self {
        Self {
            id: id.into(),
            priority: 0,
            cost: None,
            targeting: None,
            damage: Vec::new(),
            cross_stage: Vec::new(),
            effects: Vec::new(),
            cooldown: None,
        }
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn cost(mut self, multiplier: f32, flat: i32) -> Self {
        self.cost = Some(CostAdjust { multiplier, flat });
        self
    }

    pub fn targeting(mut self, adjust: TargetingAdjust) -> Self {
        self.targeting = Some(adjust);
        self
    }

    pub fn damage(mut self, step: DamageAdjust) -> Self {
        self.damage.push(step);
        self
    }

    pub fn cross_stage(mut self, rule: CrossStageRule) -> Self {
        self.cross_stage.push(rule);
        self
    }

    pub fn effect(mut self, effect: EffectDefinition) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn cooldown(mut self, multiplier: f32, flat_secs: f32) -> Self {
        self.cooldown = Some(CooldownAdjust {
            multiplier,
            flat_secs,
        });
        self
    }

    /// Copy of this modifier under the identity of its `stack`-th pick.
    ///
    /// The first stack keeps the plain id; later ones become `id#n`.
    pub fn stacked(&self, stack: u32) -> Self {
        let mut copy = self.clone();
        if stack > 1 {
            copy.id = ModifierId::new(format!("{}#{}", self.id, stack));
        }
        copy
    }

    pub fn into_shared(self) -> Arc<dyn Modifier> {
        Arc::new(self)
    }

    fn invalid(&self, message: &str) -> HookError {
        HookError::new(self.id.as_str(), message)
    }
}

impl Modifier for ModifierSpec {
    fn id(&self) -> &ModifierId {
        &self.id
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn as_cost(&self) -> Option<&dyn CostModifier> {
        self.cost.is_some().then_some(self as &dyn CostModifier)
    }

    fn as_targeting(&self) -> Option<&dyn TargetingModifier> {
        self.targeting
            .is_some()
            .then_some(self as &dyn TargetingModifier)
    }

    fn as_damage(&self) -> Option<&dyn DamageModifier> {
        (!self.damage.is_empty()).then_some(self as &dyn DamageModifier)
    }

    fn as_cross_stage(&self) -> Option<&dyn CrossStageModifier> {
        (!self.cross_stage.is_empty()).then_some(self as &dyn CrossStageModifier)
    }

    fn as_effect_generator(&self) -> Option<&dyn EffectGeneratorModifier> {
        (!self.effects.is_empty()).then_some(self as &dyn EffectGeneratorModifier)
    }

    fn as_cooldown(&self) -> Option<&dyn CooldownModifier> {
        self.cooldown.is_some().then_some(self as &dyn CooldownModifier)
    }
}

impl CostModifier for ModifierSpec {
    fn modify_cost(&self, cost: &mut ResourceCostConfig) -> Result<(), HookError> {
        let Some(adjust) = self.cost else {
            return Ok(());
        };
        if !adjust.multiplier.is_finite() || adjust.multiplier < 0.0 {
            return Err(self.invalid("cost multiplier must be finite and non-negative"));
        }
        cost.multiplier *= adjust.multiplier;
        cost.flat = cost.flat.saturating_add(adjust.flat);
        Ok(())
    }
}

impl TargetingModifier for ModifierSpec {
    fn modify_targeting(&self, targeting: &mut TargetingConfig) -> Result<(), HookError> {
        let Some(adjust) = self.targeting else {
            return Ok(());
        };
        if !adjust.range_multiplier.is_finite() || !adjust.radius_multiplier.is_finite() {
            return Err(self.invalid("targeting multipliers must be finite"));
        }
        targeting.range = (targeting.range * adjust.range_multiplier + adjust.range_flat).max(0.0);
        targeting.radius =
            (targeting.radius * adjust.radius_multiplier + adjust.radius_flat).max(0.0);
        if targeting.max_count > 0 {
            targeting.max_count = (targeting.max_count + adjust.extra_targets).max(1);
        }
        Ok(())
    }
}

impl DamageModifier for ModifierSpec {
    fn modify_damage(&self, damage: &mut DamageResult) -> Result<(), HookError> {
        for step in &self.damage {
            match *step {
                DamageAdjust::Flat(amount) => damage.final_damage += amount,
                DamageAdjust::Scale(factor) => {
                    if !factor.is_finite() {
                        return Err(self.invalid("damage scale must be finite"));
                    }
                    damage.final_damage *= factor;
                }
                DamageAdjust::TrueDamage => damage.mark_true_damage(),
            }
        }
        Ok(())
    }
}

impl CrossStageModifier for ModifierSpec {
    fn apply_cross_stage(&self, ctx: &mut CastContext<'_>) -> Result<(), HookError> {
        for rule in &self.cross_stage {
            match *rule {
                CrossStageRule::CrowdBonus {
                    min_targets,
                    bonus_damage,
                } => {
                    if ctx.targets.len() >= min_targets as usize {
                        ctx.damage.final_damage += bonus_damage;
                    }
                }
                CrossStageRule::CrowdTrueDamage { min_targets } => {
                    if ctx.targets.len() >= min_targets as usize {
                        ctx.damage.mark_true_damage();
                    }
                }
                CrossStageRule::TargetCap { max } => ctx.targets.truncate(max as usize),
            }
        }
        Ok(())
    }
}

impl EffectGeneratorModifier for ModifierSpec {
    fn generate_effects(&self) -> Result<Vec<EffectDefinition>, HookError> {
        Ok(self.effects.clone())
    }
}

impl CooldownModifier for ModifierSpec {
    fn modify_cooldown(&self, cooldown: &mut CooldownConfig) -> Result<(), HookError> {
        let Some(adjust) = self.cooldown else {
            return Ok(());
        };
        if !adjust.multiplier.is_finite() || adjust.multiplier < 0.0 {
            return Err(self.invalid("cooldown multiplier must be finite and non-negative"));
        }
        if !adjust.flat_secs.is_finite() {
            return Err(self.invalid("cooldown flat seconds must be finite"));
        }
        cooldown.multiplier *= adjust.multiplier;
        cooldown.flat_secs += adjust.flat_secs;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::EffectKind;
    use crate::modifier::Capabilities;
    use crate::types::EntityId;

    #[test]
    fn capabilities_follow_present_parts() {
        let spec = ModifierSpec::new("ember")
            .cost(0.9, 0)
            .effect(EffectDefinition::new("burn", EffectKind::Burn {
                damage_per_second: 4.0,
            }));

        assert_eq!(
            spec.capabilities(),
            Capabilities::COST | Capabilities::EFFECT_GENERATOR
        );
        assert!(spec.as_damage().is_none());
        assert!(spec.as_cross_stage().is_none());
    }

    #[test]
    fn damage_steps_run_in_listed_order() {
        let scale_then_add = ModifierSpec::new("a")
            .damage(DamageAdjust::Scale(2.0))
            .damage(DamageAdjust::Flat(10.0));
        let add_then_scale = ModifierSpec::new("b")
            .damage(DamageAdjust::Flat(10.0))
            .damage(DamageAdjust::Scale(2.0));

        let mut first = DamageResult::new(5.0, EntityId(1));
        scale_then_add.modify_damage(&mut first).unwrap();
        let mut second = DamageResult::new(5.0, EntityId(1));
        add_then_scale.modify_damage(&mut second).unwrap();

        assert_eq!(first.final_damage, 20.0);
        assert_eq!(second.final_damage, 30.0);
    }

    #[test]
    fn rejects_non_finite_cost_multiplier() {
        let spec = ModifierSpec::new("broken").cost(f32::NAN, 0);
        let mut cost = ResourceCostConfig::default();

        let err = spec.modify_cost(&mut cost).unwrap_err();
        assert_eq!(err.source_name, "broken");
        assert_eq!(cost, ResourceCostConfig::default());
    }

    #[test]
    fn rejects_non_finite_cooldown_adjustments() {
        let mut cooldown = CooldownConfig::default();

        let infinite = ModifierSpec::new("frozen").cooldown(f32::INFINITY, 0.0);
        assert!(infinite.modify_cooldown(&mut cooldown).is_err());
        let negative = ModifierSpec::new("rewind").cooldown(-1.0, 0.0);
        assert!(negative.modify_cooldown(&mut cooldown).is_err());
        let flat = ModifierSpec::new("stall").cooldown(1.0, f32::NAN);
        assert!(flat.modify_cooldown(&mut cooldown).is_err());

        assert_eq!(cooldown, CooldownConfig::default());
    }

    #[test]
    fn extra_targets_leave_unlimited_targeting_alone() {
        let spec = ModifierSpec::new("fork").targeting(TargetingAdjust {
            extra_targets: 2,
            ..TargetingAdjust::default()
        });

        let mut capped = TargetingConfig {
            range: 10.0,
            max_count: 1,
            radius: 2.0,
        };
        spec.modify_targeting(&mut capped).unwrap();
        assert_eq!(capped.max_count, 3);

        let mut unlimited = TargetingConfig {
            max_count: 0,
            ..capped
        };
        spec.modify_targeting(&mut unlimited).unwrap();
        assert_eq!(unlimited.max_count, 0);
    }

    #[test]
    fn stacked_copies_get_distinct_ids() {
        let spec = ModifierSpec::new("sharpen");
        assert_eq!(spec.stacked(1).id.as_str(), "sharpen");
        assert_eq!(spec.stacked(2).id.as_str(), "sharpen#2");
        assert_eq!(spec.stacked(3).id.as_str(), "sharpen#3");
    }
}
