//! In-memory collaborators for hosts without their own world.
//!
//! Used by the sandbox and by tests. A real game supplies its own inventory,
//! spatial queries and effect sink; these keep everything in process memory
//! behind `parking_lot` locks.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use glam::Vec3;
use parking_lot::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, trace};

use skill_core::{
    CastContext, CueRef, CuePlayback, EffectInstance, EntityId, GameClock, HookError, InstanceId,
    ResourceInventory, SlotIndex, StatusEffectSink, TargetAcquisition, TargetFilter, TeamId,
};

use crate::targeting::TargetingRegistry;

/// Charge resource per skill instance.
#[derive(Debug, Default)]
pub struct InMemoryInventory {
    amounts: Mutex<HashMap<InstanceId, i32>>,
}

impl InMemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, instance: InstanceId, amount: i32) {
        self.amounts.lock().insert(instance, amount);
    }

    /// Adds energy, e.g. on a kill.
    pub fn grant(&self, instance: InstanceId, amount: i32) -> i32 {
        let mut amounts = self.amounts.lock();
        let current = amounts.entry(instance).or_insert(0);
        *current = current.saturating_add(amount);
        *current
    }
}

impl ResourceInventory for InMemoryInventory {
    fn debit(&self, instance: InstanceId, amount: i32) -> bool {
        let mut amounts = self.amounts.lock();
        let current = amounts.entry(instance).or_insert(0);
        if *current < amount {
            return false;
        }
        *current -= amount;
        true
    }

    fn credit(&self, instance: InstanceId, amount: i32) {
        let mut amounts = self.amounts.lock();
        let current = amounts.entry(instance).or_insert(0);
        *current = current.saturating_add(amount);
    }

    fn current_amount(&self, instance: InstanceId) -> i32 {
        self.amounts.lock().get(&instance).copied().unwrap_or(0)
    }

    fn on_equip(&self, instance: InstanceId, slot: SlotIndex) {
        self.amounts.lock().entry(instance).or_insert(0);
        trace!(target: "skill::runtime", %instance, %slot, "instance equipped");
    }
}

/// Keeps every attached effect instance.
#[derive(Debug, Default)]
pub struct RecordingStatusSink {
    attached: Mutex<Vec<(EntityId, EffectInstance)>>,
}

impl RecordingStatusSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attached(&self) -> Vec<(EntityId, EffectInstance)> {
        self.attached.lock().clone()
    }

    pub fn count_for(&self, entity: EntityId) -> usize {
        self.attached
            .lock()
            .iter()
            .filter(|(target, _)| *target == entity)
            .count()
    }

    pub fn len(&self) -> usize {
        self.attached.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.attached.lock().is_empty()
    }
}

impl StatusEffectSink for RecordingStatusSink {
    fn attach(&self, entity: EntityId, instance: EffectInstance) {
        debug!(
            target: "skill::runtime",
            %entity,
            effect = %instance.effect,
            damage = instance.damage,
            true_damage = instance.is_true_damage,
            "effect attached"
        );
        self.attached.lock().push((entity, instance));
    }
}

/// Logs cues and remembers their order.
#[derive(Debug, Default)]
pub struct TracingCues {
    played: Mutex<Vec<CueRef>>,
}

impl TracingCues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn played(&self) -> Vec<CueRef> {
        self.played.lock().clone()
    }
}

impl CuePlayback for TracingCues {
    fn play_cue(&self, cue: &CueRef, position: Vec3, parent: Option<EntityId>) {
        debug!(target: "skill::runtime", %cue, ?position, ?parent, "cue");
        self.played.lock().push(cue.clone());
    }
}

/// Game time measured on the tokio clock, so paused test runtimes control it.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    start: Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl GameClock for TokioClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldEntity {
    pub position: Vec3,
    pub team: TeamId,
    pub alive: bool,
}

/// Entity positions and teams for the bundled targeting strategies.
#[derive(Debug, Default)]
pub struct InMemoryWorld {
    entities: RwLock<BTreeMap<EntityId, WorldEntity>>,
}

impl InMemoryWorld {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn spawn(&self, entity: EntityId, position: Vec3, team: TeamId) {
        self.entities.write().insert(
            entity,
            WorldEntity {
                position,
                team,
                alive: true,
            },
        );
    }

    pub fn kill(&self, entity: EntityId) {
        if let Some(found) = self.entities.write().get_mut(&entity) {
            found.alive = false;
        }
    }

    pub fn move_to(&self, entity: EntityId, position: Vec3) {
        if let Some(found) = self.entities.write().get_mut(&entity) {
            found.position = position;
        }
    }

    pub fn entity(&self, entity: EntityId) -> Option<WorldEntity> {
        self.entities.read().get(&entity).copied()
    }

    /// Entities within `radius` of `center`, nearest first.
    pub fn within(&self, center: Vec3, radius: f32) -> Vec<EntityId> {
        let entities = self.entities.read();
        let mut found: Vec<(f32, EntityId)> = entities
            .iter()
            .map(|(id, entity)| (entity.position.distance(center), *id))
            .filter(|(distance, _)| *distance <= radius)
            .collect();
        found.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        found.into_iter().map(|(_, id)| id).collect()
    }

    /// Registers `aim_sphere`, `self_sphere`, `enemy` and `alive`.
    pub fn register(self: &Arc<Self>, registry: &mut TargetingRegistry) {
        registry
            .register_strategy(Arc::new(AimSphere(Arc::clone(self))))
            .register_strategy(Arc::new(SelfSphere(Arc::clone(self))))
            .register_filter(Arc::new(EnemyFilter(Arc::clone(self))))
            .register_filter(Arc::new(AliveFilter(Arc::clone(self))));
    }
}

/// Sphere around the aim point, pulled back to the skill's range.
pub struct AimSphere(pub Arc<InMemoryWorld>);

impl TargetAcquisition for AimSphere {
    fn name(&self) -> &str {
        "aim_sphere"
    }

    fn acquire(&self, ctx: &CastContext<'_>) -> Result<Vec<EntityId>, HookError> {
        let mut offset = ctx.aim_point - ctx.position;
        if ctx.targeting.range > 0.0 {
            offset = offset.clamp_length_max(ctx.targeting.range);
        }
        let center = ctx.position + offset;
        let mut found = self.0.within(center, ctx.targeting.radius);
        found.retain(|entity| *entity != ctx.caster);
        Ok(found)
    }
}

/// Sphere around the caster.
pub struct SelfSphere(pub Arc<InMemoryWorld>);

impl TargetAcquisition for SelfSphere {
    fn name(&self) -> &str {
        "self_sphere"
    }

    fn acquire(&self, ctx: &CastContext<'_>) -> Result<Vec<EntityId>, HookError> {
        let mut found = self.0.within(ctx.position, ctx.targeting.radius);
        found.retain(|entity| *entity != ctx.caster);
        Ok(found)
    }
}

/// Accepts entities on another team than the caster.
pub struct EnemyFilter(pub Arc<InMemoryWorld>);

impl TargetFilter for EnemyFilter {
    fn name(&self) -> &str {
        "enemy"
    }

    fn is_valid(&self, ctx: &CastContext<'_>, entity: EntityId) -> bool {
        self.0
            .entity(entity)
            .is_some_and(|found| found.team != ctx.team)
    }
}

pub struct AliveFilter(pub Arc<InMemoryWorld>);

impl TargetFilter for AliveFilter {
    fn name(&self) -> &str {
        "alive"
    }

    fn is_valid(&self, _ctx: &CastContext<'_>, entity: EntityId) -> bool {
        self.0.entity(entity).is_some_and(|found| found.alive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inventory_never_debits_partially() {
        let inventory = InMemoryInventory::new();
        let instance = InstanceId(3);
        inventory.set(instance, 30);

        assert!(!inventory.debit(instance, 40));
        assert_eq!(inventory.current_amount(instance), 30);
        assert!(inventory.debit(instance, 30));
        assert_eq!(inventory.current_amount(instance), 0);

        inventory.credit(instance, 12);
        assert_eq!(inventory.grant(instance, 8), 20);
    }

    #[test]
    fn within_orders_by_distance() {
        let world = InMemoryWorld::new();
        world.spawn(EntityId(1), Vec3::new(3.0, 0.0, 0.0), TeamId(1));
        world.spawn(EntityId(2), Vec3::new(1.0, 0.0, 0.0), TeamId(1));
        world.spawn(EntityId(3), Vec3::new(9.0, 0.0, 0.0), TeamId(1));

        assert_eq!(world.within(Vec3::ZERO, 5.0), vec![EntityId(2), EntityId(1)]);
    }

    #[test]
    fn kill_keeps_entity_but_marks_it_dead() {
        let world = InMemoryWorld::new();
        world.spawn(EntityId(4), Vec3::ZERO, TeamId(2));
        world.kill(EntityId(4));
        assert_eq!(world.entity(EntityId(4)).map(|e| e.alive), Some(false));
    }
}
