#![allow(dead_code)]

use std::sync::Arc;

use glam::Vec3;
use tokio::sync::broadcast;

use skill_core::{EntityId, InstanceId, SkillId, SlotIndex, TeamId};
use skill_runtime::{
    CasterInfo, Event, InMemoryInventory, InMemoryWorld, RecordingStatusSink, RuntimeConfig,
    SkillRuntime, TargetingRegistry, TracingCues,
};

pub const PLAYER: EntityId = EntityId(1);
pub const PLAYER_TEAM: TeamId = TeamId(0);
pub const ENEMY_TEAM: TeamId = TeamId(1);

pub struct Fixture {
    pub runtime: SkillRuntime,
    pub inventory: Arc<InMemoryInventory>,
    pub sink: Arc<RecordingStatusSink>,
    pub cues: Arc<TracingCues>,
    pub world: Arc<InMemoryWorld>,
}

impl Fixture {
    /// Runtime over the embedded content with the player at the origin.
    pub fn new() -> Self {
        Self::with_targeting(|world, targeting| world.register(targeting))
    }

    /// Like [`Fixture::new`] but `register` decides which targeting
    /// collaborators exist.
    pub fn with_targeting(
        register: impl FnOnce(&Arc<InMemoryWorld>, &mut TargetingRegistry),
    ) -> Self {
        let world = InMemoryWorld::new();
        world.spawn(PLAYER, Vec3::ZERO, PLAYER_TEAM);
        let mut targeting = TargetingRegistry::new();
        register(&world, &mut targeting);

        let inventory = Arc::new(InMemoryInventory::new());
        let sink = Arc::new(RecordingStatusSink::new());
        let cues = Arc::new(TracingCues::new());
        let config = RuntimeConfig {
            rng_seed: Some(7),
            ..RuntimeConfig::default()
        };

        let runtime = SkillRuntime::builder()
            .config(config)
            .inventory(inventory.clone())
            .status_sink(sink.clone())
            .cues(cues.clone())
            .targeting(targeting)
            .build()
            .expect("runtime should build");

        Self {
            runtime,
            inventory,
            sink,
            cues,
            world,
        }
    }

    /// Equips `skill` into `slot` and fills its charge pool with `charge`.
    pub fn equip(&self, slot: u8, skill: &str, charge: i32) -> InstanceId {
        let instance = self
            .runtime
            .equip(SlotIndex(slot), &SkillId::new(skill))
            .expect("equip should succeed");
        self.inventory.set(instance, charge);
        instance
    }

    pub fn enemy(&self, id: u32, position: Vec3) -> EntityId {
        let entity = EntityId(id);
        self.world.spawn(entity, position, ENEMY_TEAM);
        entity
    }
}

pub fn caster() -> CasterInfo {
    CasterInfo::new(PLAYER, PLAYER_TEAM, Vec3::ZERO)
}

pub fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
