//! Recording collaborator doubles shared by unit tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use glam::Vec3;
use parking_lot::Mutex;

use crate::cast::CastContext;
use crate::env::{
    CastOccurred, CuePlayback, EffectInstance, GameClock, HookError, NotificationBus,
    ResourceInventory, SkillEnv, StatusEffectSink, TargetAcquisition, TargetFilter,
};
use crate::types::{CueRef, EntityId, InstanceId};

#[derive(Default)]
pub struct RecordingInventory {
    amounts: Mutex<HashMap<InstanceId, i32>>,
    pub debits: Mutex<Vec<(InstanceId, i32)>>,
    pub credits: Mutex<Vec<(InstanceId, i32)>>,
}

impl RecordingInventory {
    pub fn set(&self, instance: InstanceId, amount: i32) {
        self.amounts.lock().insert(instance, amount);
    }
}

impl ResourceInventory for RecordingInventory {
    fn debit(&self, instance: InstanceId, amount: i32) -> bool {
        let mut amounts = self.amounts.lock();
        let current = amounts.entry(instance).or_insert(0);
        if *current < amount {
            return false;
        }
        *current -= amount;
        self.debits.lock().push((instance, amount));
        true
    }

    fn credit(&self, instance: InstanceId, amount: i32) {
        *self.amounts.lock().entry(instance).or_insert(0) += amount;
        self.credits.lock().push((instance, amount));
    }

    fn current_amount(&self, instance: InstanceId) -> i32 {
        self.amounts.lock().get(&instance).copied().unwrap_or(0)
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub attached: Mutex<Vec<(EntityId, EffectInstance)>>,
}

impl StatusEffectSink for RecordingSink {
    fn attach(&self, entity: EntityId, instance: EffectInstance) {
        self.attached.lock().push((entity, instance));
    }
}

#[derive(Default)]
pub struct RecordingBus {
    pub events: Mutex<Vec<CastOccurred>>,
}

impl NotificationBus for RecordingBus {
    fn publish(&self, event: CastOccurred) {
        self.events.lock().push(event);
    }
}

#[derive(Default)]
pub struct RecordingCues {
    pub played: Mutex<Vec<CueRef>>,
}

impl CuePlayback for RecordingCues {
    fn play_cue(&self, cue: &CueRef, _position: Vec3, _parent: Option<EntityId>) {
        self.played.lock().push(cue.clone());
    }
}

#[derive(Default)]
pub struct ManualClock {
    now: Mutex<Duration>,
}

impl GameClock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock()
    }
}

/// Strategy returning a fixed list and counting calls.
pub struct FixedTargets {
    targets: Vec<EntityId>,
    pub calls: AtomicUsize,
}

impl FixedTargets {
    pub fn new(targets: Vec<EntityId>) -> Self {
        Self {
            targets,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TargetAcquisition for FixedTargets {
    fn name(&self) -> &str {
        "fixed"
    }

    fn acquire(&self, _ctx: &CastContext<'_>) -> Result<Vec<EntityId>, HookError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.targets.clone())
    }
}

pub struct FailingTargets;

impl TargetAcquisition for FailingTargets {
    fn name(&self) -> &str {
        "failing"
    }

    fn acquire(&self, _ctx: &CastContext<'_>) -> Result<Vec<EntityId>, HookError> {
        Err(HookError::new("failing", "spatial query unavailable"))
    }
}

/// Rejects the listed entities.
pub struct Exclude(pub Vec<EntityId>);

impl TargetFilter for Exclude {
    fn name(&self) -> &str {
        "exclude"
    }

    fn is_valid(&self, _ctx: &CastContext<'_>, entity: EntityId) -> bool {
        !self.0.contains(&entity)
    }
}

/// Every double wired into one [`SkillEnv`].
pub struct Harness {
    pub inventory: Arc<RecordingInventory>,
    pub sink: Arc<RecordingSink>,
    pub bus: Arc<RecordingBus>,
    pub cues: Arc<RecordingCues>,
    pub env: SkillEnv,
}

impl Harness {
    pub fn new() -> Self {
        let inventory = Arc::new(RecordingInventory::default());
        let sink = Arc::new(RecordingSink::default());
        let bus = Arc::new(RecordingBus::default());
        let cues = Arc::new(RecordingCues::default());
        let env = SkillEnv::new(
            inventory.clone(),
            sink.clone(),
            bus.clone(),
            cues.clone(),
            Arc::new(ManualClock::default()),
        );
        Self {
            inventory,
            sink,
            bus,
            cues,
            env,
        }
    }
}
