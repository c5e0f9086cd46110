//! Per-instance runtime state of an equipped skill.
//!
//! A [`SkillRuntimeState`] lives as long as the skill stays equipped. It owns
//! the modifier list, the evolution history that determines the skill's
//! level, the cached effect list and the scratch fields used to reconcile
//! resource refunds across the pre-pipeline delay.
//!
//! # Invariants
//!
//! - `level() == 1 + branch_history().len()`
//! - no two modifiers share an id
//! - the effect cache is dropped whenever an effect-generating modifier is
//!   added or removed, so [`SkillRuntimeState::all_effects`] is never stale
//! - the scratch fields are `(false, 0)` outside of a cast

use std::cmp::Reverse;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cast::{CastContext, CooldownConfig, DamageResult, ResourceCostConfig, TargetingConfig};
use crate::definition::{EffectDefinition, SkillDefinition};
use crate::env::HookError;
use crate::error::EvolutionError;
use crate::evolution::{
    BranchChoice, BranchRecord, EvolutionEffectEntry, EvolutionEffectPool, EvolutionNode,
    EvolutionTree,
};
use crate::modifier::{Capabilities, Modifier};
use crate::types::{
    BranchId, EvolutionEffectId, InstanceId, ModifierId, SkillId, TagSet,
};

/// Persisted shape of a skill's progression.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkillProgress {
    pub skill: SkillId,
    pub instance: InstanceId,
    pub level: u32,
    pub branch_history: Vec<BranchId>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub effect_history: Vec<EvolutionEffectId>,
}

#[cfg(feature = "serde")]
impl SkillProgress {
    /// Encodes the record with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}

/// Modifiers, progression and per-cast scratch data of one skill instance.
#[derive(Debug)]
pub struct SkillRuntimeState {
    definition: Arc<SkillDefinition>,
    instance: InstanceId,
    modifiers: Vec<Arc<dyn Modifier>>,
    branch_history: Vec<BranchRecord>,
    branch_tags: TagSet,
    effect_history: Vec<EvolutionEffectId>,
    effects_cache: Option<Arc<[EffectDefinition]>>,
    last_used_at: Option<Duration>,
    resource_spent: bool,
    actual_resource_spent: i32,
}

impl SkillRuntimeState {
    pub fn new(definition: Arc<SkillDefinition>, instance: InstanceId) -> Self {
        Self {
            definition,
            instance,
            modifiers: Vec::new(),
            branch_history: Vec::new(),
            branch_tags: TagSet::new(),
            effect_history: Vec::new(),
            effects_cache: None,
            last_used_at: None,
            resource_spent: false,
            actual_resource_spent: 0,
        }
    }

    /// Rebuilds a state from persisted progress.
    ///
    /// Branch choices are replayed through `tree` in order and chosen effects
    /// through `pool`, so the resulting modifier list is identical to the one
    /// the skill had when the progress was saved.
    pub fn restore(
        definition: Arc<SkillDefinition>,
        progress: &SkillProgress,
        tree: Option<&EvolutionTree>,
        pool: &EvolutionEffectPool,
    ) -> Result<Self, EvolutionError> {
        if progress.skill != definition.id {
            return Err(EvolutionError::InconsistentProgress(
                "skill id does not match the definition",
            ));
        }
        if progress.level as usize != 1 + progress.branch_history.len() {
            return Err(EvolutionError::InconsistentProgress(
                "level does not match the branch history",
            ));
        }

        let mut state = Self::new(definition, progress.instance);
        for branch in &progress.branch_history {
            let (node, choice) = tree
                .and_then(|tree| tree.find_branch(branch))
                .ok_or_else(|| EvolutionError::UnknownBranch(branch.clone()))?;
            state.set_evolution_node(node, choice)?;
        }
        for effect in &progress.effect_history {
            let entry = pool
                .get_effect_by_id(effect)
                .ok_or_else(|| EvolutionError::UnknownEffect(effect.clone()))?;
            state.apply_evolution_effect(entry)?;
        }
        Ok(state)
    }

    /// Snapshot of what must be persisted to restore this state.
    pub fn progress(&self) -> SkillProgress {
        SkillProgress {
            skill: self.definition.id.clone(),
            instance: self.instance,
            level: self.level(),
            branch_history: self
                .branch_history
                .iter()
                .map(|record| record.branch.clone())
                .collect(),
            effect_history: self.effect_history.clone(),
        }
    }

    // ===== identity =====

    pub fn definition(&self) -> &Arc<SkillDefinition> {
        &self.definition
    }

    pub fn skill_id(&self) -> &SkillId {
        &self.definition.id
    }

    pub fn instance_id(&self) -> InstanceId {
        self.instance
    }

    // ===== progression =====

    pub fn level(&self) -> u32 {
        1 + self.branch_history.len() as u32
    }

    pub fn branch_history(&self) -> &[BranchRecord] {
        &self.branch_history
    }

    /// Ids of evolution catalog entries chosen so far, in order.
    pub fn effect_history(&self) -> &[EvolutionEffectId] {
        &self.effect_history
    }

    /// Definition tags plus the tags of every chosen branch.
    pub fn tags(&self) -> TagSet {
        self.definition
            .tags
            .iter()
            .chain(self.branch_tags.iter())
            .cloned()
            .collect()
    }

    /// Records a level-up choice and grants the branch's modifiers.
    pub fn set_evolution_node(
        &mut self,
        node: &EvolutionNode,
        choice: BranchChoice,
    ) -> Result<BranchId, EvolutionError> {
        let reaching = self.level() + 1;
        if node.level != 0 && node.level != reaching {
            return Err(EvolutionError::LevelMismatch {
                node: node.id.clone(),
                node_level: node.level,
                reaching,
            });
        }

        let branch = node.branch(choice);
        self.branch_history.push(BranchRecord {
            node: node.id.clone(),
            branch: branch.id.clone(),
        });
        self.branch_tags.extend(branch.tags.iter().cloned());
        for modifier in &branch.modifiers {
            self.add_modifier(modifier.clone().into_shared());
        }
        self.invalidate_effects();

        debug!(
            target: "skill::evolution",
            skill = %self.definition.id,
            node = %node.id,
            branch = %branch.id,
            level = self.level(),
            "evolution branch chosen"
        );
        Ok(branch.id.clone())
    }

    /// Grants a catalog entry's modifier, honoring its stack limit.
    ///
    /// Returns the identity the modifier was added under.
    pub fn apply_evolution_effect(
        &mut self,
        entry: &EvolutionEffectEntry,
    ) -> Result<ModifierId, EvolutionError> {
        let times = self.times_chosen(&entry.id);
        if entry.max_stacks != 0 && times >= entry.max_stacks {
            return Err(EvolutionError::StackLimitReached {
                effect: entry.id.clone(),
                max_stacks: entry.max_stacks,
            });
        }

        let modifier = entry.modifier.stacked(times + 1);
        let id = modifier.id.clone();
        self.add_modifier(modifier.into_shared());
        self.effect_history.push(entry.id.clone());

        debug!(
            target: "skill::evolution",
            skill = %self.definition.id,
            effect = %entry.id,
            modifier = %id,
            "evolution effect applied"
        );
        Ok(id)
    }

    /// How many times the catalog entry was chosen for this skill.
    pub fn times_chosen(&self, effect: &EvolutionEffectId) -> u32 {
        self.effect_history.iter().filter(|id| *id == effect).count() as u32
    }

    // ===== modifiers =====

    pub fn modifiers(&self) -> &[Arc<dyn Modifier>] {
        &self.modifiers
    }

    pub fn has_modifier(&self, id: &ModifierId) -> bool {
        self.modifiers.iter().any(|modifier| modifier.id() == id)
    }

    /// Adds a modifier. Returns false if one with the same id is present.
    pub fn add_modifier(&mut self, modifier: Arc<dyn Modifier>) -> bool {
        if self.has_modifier(modifier.id()) {
            return false;
        }
        if modifier.capabilities().contains(Capabilities::EFFECT_GENERATOR) {
            self.invalidate_effects();
        }
        self.modifiers.push(modifier);
        true
    }

    /// Removes the modifier with this id, if present.
    pub fn remove_modifier(&mut self, id: &ModifierId) -> Option<Arc<dyn Modifier>> {
        let index = self
            .modifiers
            .iter()
            .position(|modifier| modifier.id() == id)?;
        let removed = self.modifiers.remove(index);
        if removed.capabilities().contains(Capabilities::EFFECT_GENERATOR) {
            self.invalidate_effects();
        }
        Some(removed)
    }

    /// Modifiers implementing `capability`, highest priority first.
    pub fn modifiers_with(&self, capability: Capabilities) -> Vec<Arc<dyn Modifier>> {
        let mut selected: Vec<_> = self
            .modifiers
            .iter()
            .filter(|modifier| modifier.capabilities().contains(capability))
            .cloned()
            .collect();
        selected.sort_by_key(|modifier| Reverse(modifier.priority()));
        selected
    }

    pub fn apply_cost_modifiers(&self, cost: &mut ResourceCostConfig) {
        for modifier in self.modifiers_with(Capabilities::COST) {
            if let Some(hook) = modifier.as_cost() {
                if let Err(err) = hook.modify_cost(cost) {
                    self.log_hook_failure("cost", modifier.as_ref(), &err);
                }
            }
        }
    }

    pub fn apply_targeting_modifiers(&self, targeting: &mut TargetingConfig) {
        for modifier in self.modifiers_with(Capabilities::TARGETING) {
            if let Some(hook) = modifier.as_targeting() {
                if let Err(err) = hook.modify_targeting(targeting) {
                    self.log_hook_failure("targeting", modifier.as_ref(), &err);
                }
            }
        }
    }

    pub fn apply_damage_modifiers(&self, damage: &mut DamageResult) {
        for modifier in self.modifiers_with(Capabilities::DAMAGE) {
            if let Some(hook) = modifier.as_damage() {
                if let Err(err) = hook.modify_damage(damage) {
                    self.log_hook_failure("damage", modifier.as_ref(), &err);
                }
            }
        }
    }

    pub fn apply_cooldown_modifiers(&self, cooldown: &mut CooldownConfig) {
        for modifier in self.modifiers_with(Capabilities::COOLDOWN) {
            if let Some(hook) = modifier.as_cooldown() {
                if let Err(err) = hook.modify_cooldown(cooldown) {
                    self.log_hook_failure("cooldown", modifier.as_ref(), &err);
                }
            }
        }
    }

    /// Runs every cross-stage modifier of the context's skill against the
    /// context itself.
    pub fn apply_cross_stage_modifiers(ctx: &mut CastContext<'_>) {
        let modifiers = ctx.state.modifiers_with(Capabilities::CROSS_STAGE);
        for modifier in modifiers {
            if let Some(hook) = modifier.as_cross_stage() {
                if let Err(err) = hook.apply_cross_stage(ctx) {
                    ctx.state
                        .log_hook_failure("cross_stage", modifier.as_ref(), &err);
                }
            }
        }
    }

    // ===== effects =====

    /// Base effects followed by every generator's output, highest priority
    /// first. Cached until an effect-generating modifier changes.
    pub fn all_effects(&mut self) -> Arc<[EffectDefinition]> {
        if let Some(cached) = &self.effects_cache {
            return Arc::clone(cached);
        }

        let mut effects = self.definition.effects.clone();
        for modifier in self.modifiers_with(Capabilities::EFFECT_GENERATOR) {
            if let Some(hook) = modifier.as_effect_generator() {
                match hook.generate_effects() {
                    Ok(generated) => effects.extend(generated),
                    Err(err) => self.log_hook_failure("effect_generator", modifier.as_ref(), &err),
                }
            }
        }

        let effects: Arc<[EffectDefinition]> = effects.into();
        self.effects_cache = Some(Arc::clone(&effects));
        effects
    }

    fn invalidate_effects(&mut self) {
        self.effects_cache = None;
    }

    // ===== cooldown =====

    pub fn effective_cooldown(&self) -> Duration {
        let mut cooldown = CooldownConfig::default();
        self.apply_cooldown_modifiers(&mut cooldown);
        cooldown.final_cooldown(self.definition.cooldown_secs)
    }

    pub fn last_used_at(&self) -> Option<Duration> {
        self.last_used_at
    }

    pub fn mark_used(&mut self, now: Duration) {
        self.last_used_at = Some(now);
    }

    pub fn is_on_cooldown(&self, now: Duration) -> bool {
        self.last_used_at
            .is_some_and(|used| now.saturating_sub(used) < self.effective_cooldown())
    }

    // ===== per-cast scratch =====

    pub fn resource_spent(&self) -> bool {
        self.resource_spent
    }

    pub fn actual_resource_spent(&self) -> i32 {
        self.actual_resource_spent
    }

    /// Records the amount the current cast debited.
    pub fn record_spend(&mut self, amount: i32) {
        self.resource_spent = true;
        self.actual_resource_spent = amount.max(0);
    }

    /// Clears the scratch fields, returning what the current cast spent.
    pub fn take_spent(&mut self) -> Option<i32> {
        let spent = self.resource_spent.then_some(self.actual_resource_spent);
        self.resource_spent = false;
        self.actual_resource_spent = 0;
        spent
    }

    fn log_hook_failure(&self, capability: &'static str, modifier: &dyn Modifier, err: &HookError) {
        warn!(
            target: "skill::runtime",
            skill = %self.definition.id,
            modifier = %modifier.id(),
            capability,
            error = %err,
            "modifier hook failed, skipping"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{EffectDefinition, EffectKind};
    use crate::evolution::{EvolutionBranch, Rarity};
    use crate::modifier::{DamageAdjust, ModifierSpec};
    use crate::types::EntityId;

    fn fireball() -> Arc<SkillDefinition> {
        Arc::new(
            SkillDefinition::new("fireball", "Fireball")
                .with_tags(["fire", "projectile"])
                .with_charge(100, 10)
                .with_damage(50.0)
                .with_effect(EffectDefinition::new("scorch", EffectKind::Damage {
                    amount: 50.0,
                })),
        )
    }

    fn burn_generator(id: &str) -> ModifierSpec {
        ModifierSpec::new(id).effect(
            EffectDefinition::new("burn", EffectKind::Burn {
                damage_per_second: 5.0,
            })
            .with_duration(3.0),
        )
    }

    fn node(level: u32) -> EvolutionNode {
        EvolutionNode::new(
            format!("node-{level}"),
            level,
            EvolutionBranch::new(format!("inferno-{level}"), "Inferno")
                .with_tags(["burn"])
                .with_modifier(burn_generator(&format!("inferno-burn-{level}"))),
            EvolutionBranch::new(format!("focus-{level}"), "Focus")
                .with_modifier(ModifierSpec::new(format!("focus-{level}")).cost(0.8, 0)),
        )
    }

    #[test]
    fn adding_the_same_modifier_twice_is_a_no_op() {
        let mut state = SkillRuntimeState::new(fireball(), InstanceId(1));
        let modifier = burn_generator("burn").into_shared();

        assert!(state.add_modifier(Arc::clone(&modifier)));
        assert!(!state.add_modifier(modifier));

        assert_eq!(state.modifiers().len(), 1);
        assert_eq!(state.all_effects().len(), 2);
    }

    #[test]
    fn effect_cache_follows_generator_changes() {
        let mut state = SkillRuntimeState::new(fireball(), InstanceId(1));
        assert_eq!(state.all_effects().len(), 1);

        state.add_modifier(burn_generator("burn").into_shared());
        assert_eq!(state.all_effects().len(), 2);

        state.remove_modifier(&ModifierId::new("burn"));
        assert_eq!(state.all_effects().len(), 1);
        assert!(state.remove_modifier(&ModifierId::new("burn")).is_none());
    }

    #[test]
    fn cached_effects_are_reused_until_invalidated() {
        let mut state = SkillRuntimeState::new(fireball(), InstanceId(1));
        let first = state.all_effects();
        let second = state.all_effects();
        assert!(Arc::ptr_eq(&first, &second));

        // Non-generators leave the cache alone.
        state.add_modifier(ModifierSpec::new("cheap").cost(0.5, 0).into_shared());
        assert!(Arc::ptr_eq(&first, &state.all_effects()));
    }

    #[test]
    fn damage_modifiers_run_by_descending_priority() {
        let mut state = SkillRuntimeState::new(fireball(), InstanceId(1));
        state.add_modifier(
            ModifierSpec::new("add")
                .priority(10)
                .damage(DamageAdjust::Flat(10.0))
                .into_shared(),
        );
        state.add_modifier(
            ModifierSpec::new("double")
                .priority(50)
                .damage(DamageAdjust::Scale(2.0))
                .into_shared(),
        );
        state.add_modifier(
            ModifierSpec::new("triple")
                .priority(-5)
                .damage(DamageAdjust::Scale(3.0))
                .into_shared(),
        );

        let mut damage = DamageResult::new(5.0, EntityId(1));
        state.apply_damage_modifiers(&mut damage);

        // double (50) -> add (10) -> triple (-5): ((5 * 2) + 10) * 3
        let manual = ((5.0 * 2.0) + 10.0) * 3.0;
        assert_eq!(damage.final_damage, manual);
        assert_ne!(damage.final_damage, (5.0 + 10.0) * 2.0 * 3.0);
    }

    #[test]
    fn failing_modifier_is_skipped() {
        let mut state = SkillRuntimeState::new(fireball(), InstanceId(1));
        state.add_modifier(ModifierSpec::new("broken").priority(5).cost(f32::NAN, 0).into_shared());
        state.add_modifier(ModifierSpec::new("discount").cost(0.5, -10).into_shared());

        let mut cost = ResourceCostConfig::default();
        state.apply_cost_modifiers(&mut cost);

        assert_eq!(cost.final_cost(100), 40);
    }

    #[test]
    fn level_tracks_branch_history() {
        let mut state = SkillRuntimeState::new(fireball(), InstanceId(1));
        assert_eq!(state.level(), 1);

        for (level, choice) in [(2, BranchChoice::A), (3, BranchChoice::B), (4, BranchChoice::A)] {
            state.set_evolution_node(&node(level), choice).unwrap();
            assert_eq!(state.level(), 1 + state.branch_history().len() as u32);
            assert_eq!(state.level(), level);
        }

        assert!(state.tags().contains("burn"));
        assert!(state.tags().contains("fire"));
        // Base effect plus two inferno burns.
        assert_eq!(state.all_effects().len(), 3);
    }

    #[test]
    fn node_for_another_level_is_rejected() {
        let mut state = SkillRuntimeState::new(fireball(), InstanceId(1));
        let err = state
            .set_evolution_node(&node(3), BranchChoice::A)
            .unwrap_err();

        assert!(matches!(err, EvolutionError::LevelMismatch { reaching: 2, .. }));
        assert_eq!(state.level(), 1);
    }

    #[test]
    fn evolution_effects_stack_up_to_their_limit() {
        let mut state = SkillRuntimeState::new(fireball(), InstanceId(1));
        let entry = EvolutionEffectEntry::new(
            "sharpen",
            Rarity::Common,
            ModifierSpec::new("sharpen").damage(DamageAdjust::Flat(5.0)),
        )
        .with_max_stacks(2);

        assert_eq!(state.apply_evolution_effect(&entry).unwrap().as_str(), "sharpen");
        assert_eq!(
            state.apply_evolution_effect(&entry).unwrap().as_str(),
            "sharpen#2"
        );
        let err = state.apply_evolution_effect(&entry).unwrap_err();

        assert!(matches!(err, EvolutionError::StackLimitReached { max_stacks: 2, .. }));
        assert_eq!(state.modifiers().len(), 2);
        assert_eq!(state.times_chosen(&entry.id), 2);
    }

    #[test]
    fn scratch_fields_reset_once_taken() {
        let mut state = SkillRuntimeState::new(fireball(), InstanceId(1));
        assert_eq!(state.take_spent(), None);

        state.record_spend(80);
        assert!(state.resource_spent());
        assert_eq!(state.actual_resource_spent(), 80);

        assert_eq!(state.take_spent(), Some(80));
        assert!(!state.resource_spent());
        assert_eq!(state.actual_resource_spent(), 0);
        assert_eq!(state.take_spent(), None);
    }

    #[test]
    fn cooldown_uses_modified_duration() {
        let definition = Arc::new(SkillDefinition::new("nova", "Nova").with_cooldown(4.0));
        let mut state = SkillRuntimeState::new(definition, InstanceId(2));
        state.add_modifier(ModifierSpec::new("haste").cooldown(0.5, 0.0).into_shared());
        assert_eq!(state.effective_cooldown(), Duration::from_secs(2));

        state.mark_used(Duration::from_secs(10));
        assert!(state.is_on_cooldown(Duration::from_millis(11_500)));
        assert!(!state.is_on_cooldown(Duration::from_secs(12)));
    }

    #[test]
    fn invalid_cooldown_modifier_is_ignored() {
        let definition = Arc::new(SkillDefinition::new("nova", "Nova").with_cooldown(4.0));
        let mut state = SkillRuntimeState::new(definition, InstanceId(2));
        state.add_modifier(ModifierSpec::new("frozen").cooldown(f32::INFINITY, 0.0).into_shared());
        state.mark_used(Duration::from_secs(10));

        assert_eq!(state.effective_cooldown(), Duration::from_secs(4));
        assert!(state.is_on_cooldown(Duration::from_secs(13)));
        assert!(!state.is_on_cooldown(Duration::from_secs(14)));
    }

    #[test]
    fn oversized_cooldown_saturates() {
        let definition = Arc::new(SkillDefinition::new("nova", "Nova").with_cooldown(1e30));
        let mut state = SkillRuntimeState::new(definition, InstanceId(2));
        state.add_modifier(ModifierSpec::new("slow").cooldown(1e30, 0.0).into_shared());
        state.mark_used(Duration::ZERO);

        assert_eq!(state.effective_cooldown(), Duration::MAX);
        assert!(state.is_on_cooldown(Duration::from_secs(1_000_000)));
    }

    #[test]
    fn restore_replays_progress() {
        let tree = EvolutionTree::new("fireball", vec![node(2), node(3)]);
        let entry = EvolutionEffectEntry::new(
            "sharpen",
            Rarity::Common,
            ModifierSpec::new("sharpen").damage(DamageAdjust::Flat(5.0)),
        );
        let pool = EvolutionEffectPool::new(vec![entry.clone()], Default::default());

        let mut original = SkillRuntimeState::new(fireball(), InstanceId(9));
        original.set_evolution_node(&node(2), BranchChoice::B).unwrap();
        original.set_evolution_node(&node(3), BranchChoice::A).unwrap();
        original.apply_evolution_effect(&entry).unwrap();
        original.apply_evolution_effect(&entry).unwrap();

        let progress = original.progress();
        assert_eq!(progress.level, 3);

        let mut restored =
            SkillRuntimeState::restore(fireball(), &progress, Some(&tree), &pool).unwrap();
        assert_eq!(restored.progress(), progress);
        assert_eq!(restored.modifiers().len(), original.modifiers().len());
        assert_eq!(restored.all_effects(), original.all_effects());
    }

    #[test]
    fn restore_rejects_inconsistent_level() {
        let pool = EvolutionEffectPool::new(Vec::new(), Default::default());
        let progress = SkillProgress {
            skill: SkillId::new("fireball"),
            instance: InstanceId(1),
            level: 4,
            branch_history: vec![BranchId::new("inferno-2")],
            effect_history: Vec::new(),
        };

        let err = SkillRuntimeState::restore(fireball(), &progress, None, &pool).unwrap_err();
        assert!(matches!(err, EvolutionError::InconsistentProgress(_)));
    }
}
