//! Ordered stage machine resolving one cast.
//!
//! The standard pipeline runs six stages in a fixed order:
//!
//! 1. [`ResourceStage`]: cost modifiers, charge check, debit, cast notification
//! 2. [`TargetingStage`]: targeting modifiers, acquisition, filtering
//! 3. [`ImpactCueStage`]: impact cue at the caster
//! 4. [`CrossStageStage`]: cross-stage rules over the whole context
//! 5. [`DamageStage`]: damage rebuilt from the definition, then modified
//! 6. [`EffectStage`]: one effect instance per target per effect
//!
//! Stages keep no state between casts; everything a cast works on lives in
//! the [`CastContext`], so one pipeline serves every cast of a skill. The
//! pipeline never suspends: once [`SkillPipeline::execute`] starts it runs
//! to a terminal [`StageOutcome`].

mod stages;

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::cast::{CastContext, ExecutionToken, StageOutcome};
use crate::env::{FilterGroup, SkillEnv, TargetAcquisition, TargetFilter};

pub use stages::{
    CrossStageStage, DamageStage, EffectStage, ImpactCueStage, ResourceStage, TargetingStage,
};

/// One step of the pipeline.
pub trait SkillStage: Send + Sync {
    fn name(&self) -> &'static str;

    fn run(&self, ctx: &mut CastContext<'_>) -> StageOutcome;
}

/// Target acquisition strategy and filters bound to one skill.
#[derive(Clone, Default)]
pub struct TargetingBinding {
    pub strategy: Option<Arc<dyn TargetAcquisition>>,
    pub filters: FilterGroup,
}

impl TargetingBinding {
    pub fn new(strategy: Arc<dyn TargetAcquisition>) -> Self {
        Self {
            strategy: Some(strategy),
            filters: FilterGroup::default(),
        }
    }

    /// Binding without a strategy; every cast finds no targets.
    pub fn unbound() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: Arc<dyn TargetFilter>) -> Self {
        self.filters.push(filter);
        self
    }
}

impl fmt::Debug for TargetingBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetingBinding")
            .field("strategy", &self.strategy.as_ref().map(|s| s.name().to_owned()))
            .field("filters", &self.filters)
            .finish()
    }
}

/// Immutable ordered list of stages, built once per equipped skill.
pub struct SkillPipeline {
    stages: Vec<Box<dyn SkillStage>>,
}

impl SkillPipeline {
    pub fn new(stages: Vec<Box<dyn SkillStage>>) -> Self {
        Self { stages }
    }

    /// The six-stage pipeline wired to `env`.
    pub fn standard(env: &SkillEnv, binding: TargetingBinding) -> Self {
        Self::new(vec![
            Box::new(ResourceStage::new(
                Arc::clone(&env.inventory),
                Arc::clone(&env.notifications),
            )),
            Box::new(TargetingStage::new(Arc::clone(&env.cues), binding)),
            Box::new(ImpactCueStage::new(Arc::clone(&env.cues))),
            Box::new(CrossStageStage),
            Box::new(DamageStage),
            Box::new(EffectStage::new(
                Arc::clone(&env.effects),
                Arc::clone(&env.status),
            )),
        ])
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Runs every stage in order.
    ///
    /// The token is checked before and after each stage; a stage never starts
    /// once the token is cancelled. `Fail` and `Cancel` stop the pipeline.
    pub fn execute(&self, ctx: &mut CastContext<'_>, token: &ExecutionToken) -> StageOutcome {
        for stage in &self.stages {
            if token.is_cancelled() {
                debug!(
                    target: "skill::pipeline",
                    skill = %ctx.state.skill_id(),
                    stage = stage.name(),
                    reason = ?token.reason(),
                    "cast cancelled before stage"
                );
                return StageOutcome::Cancel;
            }

            let outcome = stage.run(ctx);
            debug!(
                target: "skill::pipeline",
                skill = %ctx.state.skill_id(),
                stage = stage.name(),
                %outcome,
                "stage finished"
            );
            if outcome != StageOutcome::Continue {
                return outcome;
            }

            if token.is_cancelled() {
                debug!(
                    target: "skill::pipeline",
                    skill = %ctx.state.skill_id(),
                    stage = stage.name(),
                    reason = ?token.reason(),
                    "cast cancelled after stage"
                );
                return StageOutcome::Cancel;
            }
        }
        StageOutcome::Continue
    }
}

impl fmt::Debug for SkillPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.stage_names()).finish()
    }
}
