//! High-level skill runtime.
//!
//! Wires loaded content, host collaborators, the cast orchestrator and the
//! progression service together behind a builder-based API.

use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::Vec3;
use tokio::sync::broadcast;
use tracing::info;

use skill_content::ContentBundle;
use skill_core::{
    CancelReason, CuePlayback, EffectFactory, EvolutionEffectPool, GameClock, InstanceId,
    ResourceInventory, SkillConfig, SkillDefinition, SkillEnv, SkillId, SkillProgress,
    SkillRuntimeState, SlotIndex, StatusEffectSink,
};

use crate::api::{CastDispatch, CasterInfo, InterruptTarget, Result, RuntimeError};
use crate::events::{Event, EventBus, ProgressionEvent, Topic};
use crate::memory::{TokioClock, TracingCues};
use crate::orchestrator::CastOrchestrator;
use crate::progression::{LevelUpChoice, LevelUpOffer, LevelUpOutcome, Progression};
use crate::targeting::TargetingRegistry;

/// Runtime configuration: content-level settings plus host-side tunables.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    pub skills: SkillConfig,
    pub event_buffer_size: usize,
    /// Seed for evolution option draws; `None` seeds from the thread RNG.
    pub rng_seed: Option<u64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new(SkillConfig::default())
    }
}

impl RuntimeConfig {
    pub const DEFAULT_EVENT_BUFFER: usize = 100;

    pub fn new(skills: SkillConfig) -> Self {
        Self {
            skills,
            event_buffer_size: Self::DEFAULT_EVENT_BUFFER,
            rng_seed: None,
        }
    }

    /// Defaults overridden by process environment variables.
    ///
    /// - `SKILL_SLOT_COUNT`
    /// - `SKILL_EVENT_BUFFER`
    /// - `SKILL_OPTION_COUNT`
    /// - `SKILL_DECAY_FACTOR`
    /// - `SKILL_DYNAMIC_WEIGHTING`
    /// - `SKILL_RNG_SEED`
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| env::var(key).ok())
    }

    /// Applies overrides read through `lookup`. Values that fail to parse are
    /// ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(count) = read::<usize>(&lookup, "SKILL_SLOT_COUNT") {
            self.skills.slot_count = count.clamp(1, SkillConfig::MAX_SLOTS);
        }

        if let Some(capacity) = read::<usize>(&lookup, "SKILL_EVENT_BUFFER") {
            self.event_buffer_size = capacity.max(1);
        }

        let evolution = &mut self.skills.evolution;
        if let Some(count) = read::<usize>(&lookup, "SKILL_OPTION_COUNT") {
            evolution.option_count = count;
        }
        if let Some(decay) = read::<f32>(&lookup, "SKILL_DECAY_FACTOR") {
            if decay.is_finite() && decay >= 0.0 {
                evolution.decay_factor = decay;
            }
        }
        if let Some(enabled) = read::<bool>(&lookup, "SKILL_DYNAMIC_WEIGHTING") {
            evolution.dynamic_weighting = enabled;
        }

        if let Some(seed) = read::<u64>(&lookup, "SKILL_RNG_SEED") {
            self.rng_seed = Some(seed);
        }

        self
    }
}

fn read<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: FromStr,
{
    lookup(key)?.trim().parse().ok()
}

/// Skill system of one caster.
///
/// Design: the runtime owns content and progression; the
/// [`CastOrchestrator`] it hands out is a cloneable façade over the slots.
pub struct SkillRuntime {
    config: RuntimeConfig,
    definitions: HashMap<SkillId, Arc<SkillDefinition>>,
    targeting: TargetingRegistry,
    orchestrator: CastOrchestrator,
    progression: Progression,
    events: EventBus,
    next_instance: AtomicU64,
}

impl SkillRuntime {
    pub fn builder() -> SkillRuntimeBuilder {
        SkillRuntimeBuilder::new()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.events.subscribe(topic)
    }

    pub fn orchestrator(&self) -> &CastOrchestrator {
        &self.orchestrator
    }

    pub fn progression(&self) -> &Progression {
        &self.progression
    }

    pub fn targeting(&self) -> &TargetingRegistry {
        &self.targeting
    }

    pub fn definition(&self, skill: &SkillId) -> Option<&Arc<SkillDefinition>> {
        self.definitions.get(skill)
    }

    fn require_definition(&self, skill: &SkillId) -> Result<Arc<SkillDefinition>> {
        self.definition(skill)
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownSkill(skill.clone()))
    }

    /// Equips a fresh level-1 instance of `skill`.
    pub fn equip(&self, slot: SlotIndex, skill: &SkillId) -> Result<InstanceId> {
        let definition = self.require_definition(skill)?;
        let instance = InstanceId(self.next_instance.fetch_add(1, Ordering::Relaxed));
        self.bind(slot, SkillRuntimeState::new(definition, instance))?;
        Ok(instance)
    }

    /// Equips a skill rebuilt from saved progress.
    pub fn equip_restored(&self, slot: SlotIndex, progress: &SkillProgress) -> Result<InstanceId> {
        let definition = self.require_definition(&progress.skill)?;
        let state = SkillRuntimeState::restore(
            definition,
            progress,
            self.progression.tree(&progress.skill),
            self.progression.pool(),
        )?;
        self.next_instance
            .fetch_max(progress.instance.0.saturating_add(1), Ordering::Relaxed);
        self.bind(slot, state)?;
        Ok(progress.instance)
    }

    fn bind(&self, slot: SlotIndex, state: SkillRuntimeState) -> Result<()> {
        let binding = self.targeting.bind(&state.definition().targeting);
        self.orchestrator.equip(slot, state, binding)?;
        Ok(())
    }

    pub fn unequip(&self, slot: SlotIndex) -> Result<Option<InstanceId>> {
        Ok(self.orchestrator.unequip(slot)?)
    }

    pub fn can_execute(&self, slot: SlotIndex) -> bool {
        self.orchestrator.can_execute(slot)
    }

    pub fn cast(&self, slot: SlotIndex, caster: CasterInfo, aim_point: Vec3) -> Result<CastDispatch> {
        self.orchestrator.execute(slot, caster, aim_point)
    }

    pub fn interrupt(&self, target: InterruptTarget, refund_intent: bool) -> usize {
        self.orchestrator.interrupt(target, refund_intent)
    }

    pub fn interrupt_with(&self, target: InterruptTarget, reason: CancelReason) -> usize {
        self.orchestrator.interrupt_with(target, reason)
    }

    /// Level-up options for the skill in `slot`.
    pub fn offer_level_up(&self, slot: SlotIndex) -> Result<LevelUpOffer> {
        let skill = self.orchestrator.skill(slot)?;
        let state = skill.state.lock();
        Ok(self.progression.offer(&state))
    }

    /// Commits a level-up choice and announces it on the progression topic.
    pub fn choose_level_up(
        &self,
        slot: SlotIndex,
        offer: &LevelUpOffer,
        choice: &LevelUpChoice,
    ) -> Result<LevelUpOutcome> {
        let skill = self.orchestrator.skill(slot)?;
        let outcome = {
            let mut state = skill.state.lock();
            self.progression.commit(&mut state, offer, choice)?
        };

        let skill_id = skill.definition.id.clone();
        self.events
            .publish(Event::Progression(ProgressionEvent::LevelUp {
                slot,
                skill: skill_id.clone(),
                level: outcome.level,
                branch: outcome.branch.clone(),
            }));
        if let (Some(effect), Some(modifier)) = (&choice.effect, &outcome.modifier) {
            self.events
                .publish(Event::Progression(ProgressionEvent::EffectChosen {
                    slot,
                    skill: skill_id,
                    effect: effect.clone(),
                    modifier: modifier.clone(),
                }));
        }
        Ok(outcome)
    }

    pub fn save_progress(&self, slot: SlotIndex) -> Result<SkillProgress> {
        let skill = self.orchestrator.skill(slot)?;
        let progress = skill.state.lock().progress();
        Ok(progress)
    }

    /// Bincode encoding of [`Self::save_progress`].
    pub fn progress_bytes(&self, slot: SlotIndex) -> Result<Vec<u8>> {
        self.save_progress(slot)?
            .to_bytes()
            .map_err(|source| RuntimeError::ProgressEncoding { slot, source })
    }

    /// Equips the skill encoded by [`Self::progress_bytes`].
    pub fn equip_from_bytes(&self, slot: SlotIndex, bytes: &[u8]) -> Result<InstanceId> {
        let progress = SkillProgress::from_bytes(bytes)
            .map_err(|source| RuntimeError::ProgressEncoding { slot, source })?;
        self.equip_restored(slot, &progress)
    }
}

impl std::fmt::Debug for SkillRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkillRuntime")
            .field("config", &self.config)
            .field("skills", &self.definitions.len())
            .field("orchestrator", &self.orchestrator)
            .finish_non_exhaustive()
    }
}

/// Builder for [`SkillRuntime`].
///
/// The inventory and the status-effect sink belong to the host and are
/// required. Everything else has a default: embedded content, tracing cues,
/// the tokio clock and the standard effect factory.
#[derive(Default)]
pub struct SkillRuntimeBuilder {
    config: Option<RuntimeConfig>,
    content: Option<ContentBundle>,
    inventory: Option<Arc<dyn ResourceInventory>>,
    status: Option<Arc<dyn StatusEffectSink>>,
    cues: Option<Arc<dyn CuePlayback>>,
    clock: Option<Arc<dyn GameClock>>,
    effects: Option<Arc<dyn EffectFactory>>,
    targeting: Option<TargetingRegistry>,
}

impl SkillRuntimeBuilder {
    fn new() -> Self {
        Self::default()
    }

    /// Override runtime configuration. Without it, the content's
    /// configuration is used.
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn content(mut self, content: ContentBundle) -> Self {
        self.content = Some(content);
        self
    }

    pub fn inventory(mut self, inventory: Arc<dyn ResourceInventory>) -> Self {
        self.inventory = Some(inventory);
        self
    }

    pub fn status_sink(mut self, status: Arc<dyn StatusEffectSink>) -> Self {
        self.status = Some(status);
        self
    }

    pub fn cues(mut self, cues: Arc<dyn CuePlayback>) -> Self {
        self.cues = Some(cues);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn GameClock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn effect_factory(mut self, effects: Arc<dyn EffectFactory>) -> Self {
        self.effects = Some(effects);
        self
    }

    pub fn targeting(mut self, targeting: TargetingRegistry) -> Self {
        self.targeting = Some(targeting);
        self
    }

    pub fn build(self) -> Result<SkillRuntime> {
        let content = match self.content {
            Some(content) => content,
            None => ContentBundle::embedded()
                .map_err(|err| RuntimeError::Content(format!("{err:#}")))?,
        };
        let config = self
            .config
            .unwrap_or_else(|| RuntimeConfig::new(content.config.clone()));

        let inventory = self
            .inventory
            .ok_or(RuntimeError::MissingCollaborator("inventory"))?;
        let status = self
            .status
            .ok_or(RuntimeError::MissingCollaborator("status sink"))?;
        let cues = self
            .cues
            .unwrap_or_else(|| Arc::new(TracingCues::new()) as Arc<dyn CuePlayback>);
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(TokioClock::new()) as Arc<dyn GameClock>);

        let events = EventBus::with_capacity(config.event_buffer_size);
        let mut env = SkillEnv::new(inventory, status, Arc::new(events.clone()), cues, clock);
        if let Some(effects) = self.effects {
            env = env.with_effect_factory(effects);
        }

        let orchestrator =
            CastOrchestrator::new(env, events.clone(), config.skills.effective_slot_count());
        let pool = EvolutionEffectPool::new(content.catalog, config.skills.evolution.clone());
        let progression = Progression::new(pool, content.trees, config.rng_seed);
        let definitions: HashMap<_, _> = content
            .skills
            .into_iter()
            .map(|skill| (skill.id.clone(), Arc::new(skill)))
            .collect();

        info!(
            target: "skill::runtime",
            skills = definitions.len(),
            slots = orchestrator.slot_count(),
            evolution_effects = progression.pool().len(),
            "skill runtime ready"
        );

        Ok(SkillRuntime {
            config,
            definitions,
            targeting: self.targeting.unwrap_or_default(),
            orchestrator,
            progression,
            events,
            next_instance: AtomicU64::new(1),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| {
            pairs
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value).to_owned())
        }
    }

    #[test]
    fn overrides_replace_defaults() {
        let config = RuntimeConfig::default().with_overrides(lookup(&[
            ("SKILL_SLOT_COUNT", "6"),
            ("SKILL_EVENT_BUFFER", "16"),
            ("SKILL_OPTION_COUNT", "4"),
            ("SKILL_DECAY_FACTOR", "0.25"),
            ("SKILL_DYNAMIC_WEIGHTING", "false"),
            ("SKILL_RNG_SEED", "99"),
        ]));

        assert_eq!(config.skills.slot_count, 6);
        assert_eq!(config.event_buffer_size, 16);
        assert_eq!(config.skills.evolution.option_count, 4);
        assert_eq!(config.skills.evolution.decay_factor, 0.25);
        assert!(!config.skills.evolution.dynamic_weighting);
        assert_eq!(config.rng_seed, Some(99));
    }

    #[test]
    fn invalid_values_are_ignored_or_clamped() {
        let config = RuntimeConfig::default().with_overrides(lookup(&[
            ("SKILL_SLOT_COUNT", "500"),
            ("SKILL_EVENT_BUFFER", "0"),
            ("SKILL_DECAY_FACTOR", "-1"),
            ("SKILL_RNG_SEED", "not-a-number"),
        ]));

        assert_eq!(config.skills.slot_count, SkillConfig::MAX_SLOTS);
        assert_eq!(config.event_buffer_size, 1);
        assert_eq!(config.skills.evolution.decay_factor, 0.5);
        assert_eq!(config.rng_seed, None);
    }

    #[test]
    fn builder_requires_host_collaborators() {
        let err = SkillRuntime::builder().build().unwrap_err();
        assert!(matches!(err, RuntimeError::MissingCollaborator("inventory")));
    }
}
