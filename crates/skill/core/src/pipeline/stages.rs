use std::sync::Arc;

use tracing::{debug, warn};

use super::{SkillStage, TargetingBinding};
use crate::cast::{CastContext, DamageResult, ResourceCostConfig, StageOutcome};
use crate::env::{
    CastOccurred, CuePlayback, EffectFactory, NotificationBus, ResourceInventory,
    StatusEffectSink,
};
use crate::state::SkillRuntimeState;

/// Derives the final cost, debits it and announces the cast.
pub struct ResourceStage {
    inventory: Arc<dyn ResourceInventory>,
    notifications: Arc<dyn NotificationBus>,
}

impl ResourceStage {
    pub fn new(
        inventory: Arc<dyn ResourceInventory>,
        notifications: Arc<dyn NotificationBus>,
    ) -> Self {
        Self {
            inventory,
            notifications,
        }
    }
}

impl SkillStage for ResourceStage {
    fn name(&self) -> &'static str {
        "resource"
    }

    fn run(&self, ctx: &mut CastContext<'_>) -> StageOutcome {
        let mut cost = ResourceCostConfig::default();
        ctx.state.apply_cost_modifiers(&mut cost);
        ctx.cost = cost;

        let definition = Arc::clone(ctx.state.definition());
        let instance = ctx.state.instance_id();
        let final_cost = cost.final_cost(definition.base_cost());

        if definition.requires_charge() {
            let current = self.inventory.current_amount(instance);
            if current < final_cost {
                debug!(
                    target: "skill::pipeline",
                    skill = %definition.id,
                    current,
                    required = final_cost,
                    "insufficient charge"
                );
                return StageOutcome::Fail;
            }
        }

        if final_cost > 0 && !self.inventory.debit(instance, final_cost) {
            debug!(
                target: "skill::pipeline",
                skill = %definition.id,
                required = final_cost,
                "inventory refused debit"
            );
            return StageOutcome::Fail;
        }

        ctx.state.record_spend(final_cost);
        ctx.state.mark_used(ctx.now);
        self.notifications.publish(CastOccurred {
            player_id: ctx.caster,
            slot: ctx.slot,
            skill: definition.id.clone(),
        });
        StageOutcome::Continue
    }
}

/// Resolves and filters targets.
pub struct TargetingStage {
    cues: Arc<dyn CuePlayback>,
    binding: TargetingBinding,
}

impl TargetingStage {
    pub fn new(cues: Arc<dyn CuePlayback>, binding: TargetingBinding) -> Self {
        Self { cues, binding }
    }
}

impl SkillStage for TargetingStage {
    fn name(&self) -> &'static str {
        "targeting"
    }

    fn run(&self, ctx: &mut CastContext<'_>) -> StageOutcome {
        ctx.state.apply_targeting_modifiers(&mut ctx.targeting);

        let definition = Arc::clone(ctx.state.definition());
        if let Some(cue) = &definition.cues.targeting {
            self.cues.play_cue(cue, ctx.aim_point, Some(ctx.caster));
        }

        let mut targets = match &self.binding.strategy {
            Some(strategy) => match strategy.acquire(ctx) {
                Ok(found) => found,
                Err(err) => {
                    warn!(
                        target: "skill::pipeline",
                        skill = %definition.id,
                        strategy = strategy.name(),
                        error = %err,
                        "target acquisition failed, treating as no targets"
                    );
                    Vec::new()
                }
            },
            None => {
                warn!(
                    target: "skill::pipeline",
                    skill = %definition.id,
                    "skill has no targeting strategy bound"
                );
                Vec::new()
            }
        };

        let filters = &self.binding.filters;
        let view: &CastContext<'_> = ctx;
        targets.retain(|entity| filters.is_valid(view, *entity));
        if let Ok(limit) = usize::try_from(ctx.targeting.max_count) {
            if limit > 0 {
                targets.truncate(limit);
            }
        }
        ctx.targets = targets;

        if ctx.targets.is_empty() {
            debug!(target: "skill::pipeline", skill = %definition.id, "no valid targets");
            return StageOutcome::Fail;
        }
        StageOutcome::Continue
    }
}

/// Plays the impact cue at the caster.
pub struct ImpactCueStage {
    cues: Arc<dyn CuePlayback>,
}

impl ImpactCueStage {
    pub fn new(cues: Arc<dyn CuePlayback>) -> Self {
        Self { cues }
    }
}

impl SkillStage for ImpactCueStage {
    fn name(&self) -> &'static str {
        "impact_cue"
    }

    fn run(&self, ctx: &mut CastContext<'_>) -> StageOutcome {
        if let Some(cue) = &ctx.state.definition().cues.impact {
            self.cues.play_cue(cue, ctx.position, Some(ctx.caster));
        }
        StageOutcome::Continue
    }
}

pub struct CrossStageStage;

impl SkillStage for CrossStageStage {
    fn name(&self) -> &'static str {
        "cross_stage"
    }

    fn run(&self, ctx: &mut CastContext<'_>) -> StageOutcome {
        SkillRuntimeState::apply_cross_stage_modifiers(ctx);
        StageOutcome::Continue
    }
}

/// Rebuilds the damage result from the definition and applies cross-stage
/// rules and damage modifiers on top of it.
pub struct DamageStage;

impl SkillStage for DamageStage {
    fn name(&self) -> &'static str {
        "damage"
    }

    fn run(&self, ctx: &mut CastContext<'_>) -> StageOutcome {
        ctx.damage = DamageResult::base(ctx.state.definition(), ctx.caster);
        SkillRuntimeState::apply_cross_stage_modifiers(ctx);
        ctx.state.apply_damage_modifiers(&mut ctx.damage);
        StageOutcome::Continue
    }
}

/// Attaches every effect of the skill to every target.
pub struct EffectStage {
    factory: Arc<dyn EffectFactory>,
    sink: Arc<dyn StatusEffectSink>,
}

impl EffectStage {
    pub fn new(factory: Arc<dyn EffectFactory>, sink: Arc<dyn StatusEffectSink>) -> Self {
        Self { factory, sink }
    }
}

impl SkillStage for EffectStage {
    fn name(&self) -> &'static str {
        "effects"
    }

    fn run(&self, ctx: &mut CastContext<'_>) -> StageOutcome {
        let effects = ctx.state.all_effects();
        let damage = ctx.damage;

        for &target in &ctx.targets {
            for definition in effects.iter() {
                match self.factory.create_instance(definition, ctx.caster) {
                    Ok(mut instance) => {
                        instance.damage = damage.final_damage;
                        instance.is_true_damage = damage.is_true_damage();
                        self.sink.attach(target, instance);
                    }
                    Err(err) => warn!(
                        target: "skill::pipeline",
                        skill = %ctx.state.skill_id(),
                        effect = %definition.id,
                        error = %err,
                        "effect factory failed, skipping effect"
                    ),
                }
            }
        }
        StageOutcome::Continue
    }
}
