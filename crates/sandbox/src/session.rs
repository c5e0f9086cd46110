//! Scripted sandbox session.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use glam::Vec3;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

use skill_content::ContentBundle;
use skill_core::{BranchChoice, EntityId, InstanceId, SkillId, SlotIndex, TeamId};
use skill_runtime::{
    CastDispatch, CasterInfo, Event, InMemoryInventory, InMemoryWorld, InterruptTarget,
    LevelUpChoice, RecordingStatusSink, RuntimeConfig, SkillRuntime, TargetingRegistry, Topic,
};

const PLAYER: EntityId = EntityId(1);
const PLAYER_TEAM: TeamId = TeamId(0);
const ENEMY_TEAM: TeamId = TeamId(1);

/// Slot layout of the session.
const LOADOUT: [(u8, &str); 4] = [
    (0, "fireball"),
    (1, "frost_nova"),
    (2, "chain_lightning"),
    (3, "shield_bash"),
];

pub struct Session {
    runtime: SkillRuntime,
    world: Arc<InMemoryWorld>,
    inventory: Arc<InMemoryInventory>,
    sink: Arc<RecordingStatusSink>,
    instances: Vec<(SlotIndex, InstanceId)>,
    events: broadcast::Receiver<Event>,
    progression: broadcast::Receiver<Event>,
}

impl Session {
    pub fn new(content: ContentBundle, config: RuntimeConfig) -> Result<Self> {
        let world = InMemoryWorld::new();
        world.spawn(PLAYER, Vec3::ZERO, PLAYER_TEAM);
        let mut targeting = TargetingRegistry::new();
        world.register(&mut targeting);

        let inventory = Arc::new(InMemoryInventory::new());
        let sink = Arc::new(RecordingStatusSink::new());
        let runtime = SkillRuntime::builder()
            .config(config)
            .content(content)
            .inventory(inventory.clone())
            .status_sink(sink.clone())
            .targeting(targeting)
            .build()?;

        let events = runtime.subscribe(Topic::Cast);
        let progression = runtime.subscribe(Topic::Progression);

        let mut instances = Vec::new();
        for (slot, skill) in LOADOUT {
            let slot = SlotIndex(slot);
            if usize::from(slot.0) >= runtime.orchestrator().slot_count() {
                tracing::warn!("Skipping {skill}: {slot} is not configured");
                continue;
            }
            let skill = SkillId::new(skill);
            if runtime.definition(&skill).is_none() {
                tracing::warn!("Skipping {skill}: not defined in content");
                continue;
            }
            let instance = runtime
                .equip(slot, &skill)
                .with_context(|| format!("Failed to equip {skill}"))?;
            instances.push((slot, instance));
        }

        Ok(Self {
            runtime,
            world,
            inventory,
            sink,
            instances,
            events,
            progression,
        })
    }

    fn caster() -> CasterInfo {
        CasterInfo::new(PLAYER, PLAYER_TEAM, Vec3::ZERO)
    }

    fn spawn_wave(&self, first_id: u32) {
        let positions = [
            Vec3::new(0.0, 0.0, 8.0),
            Vec3::new(1.5, 0.0, 8.5),
            Vec3::new(-1.0, 0.0, 7.0),
            Vec3::new(0.0, 0.0, 1.5),
        ];
        for (offset, position) in positions.into_iter().enumerate() {
            self.world
                .spawn(EntityId(first_id + offset as u32), position, ENEMY_TEAM);
        }
    }

    /// Fills every equipped instance up to `amount`.
    fn recharge(&self, amount: i32) {
        for (_, instance) in &self.instances {
            self.inventory.set(*instance, amount);
        }
    }

    async fn cast(&self, slot: SlotIndex, aim: Vec3) -> Result<()> {
        let dispatch = self.runtime.cast(slot, Self::caster(), aim)?;
        if let CastDispatch::Rejected(err) = &dispatch {
            tracing::info!("{slot}: rejected ({err})");
        }
        if let Some(report) = dispatch.finish().await? {
            tracing::info!(
                "{slot}: {} -> {} (targets {}, spent {}, refunded {})",
                report.skill,
                report.outcome,
                report.targets.len(),
                report.spent,
                report.refunded
            );
        }
        Ok(())
    }

    pub async fn run(self, rounds: u32) -> Result<()> {
        let aim = Vec3::new(0.0, 0.0, 8.0);
        self.spawn_wave(100);
        self.recharge(100);

        tracing::info!("== Opening volley ==");
        for (slot, _) in self.instances.clone() {
            self.cast(slot, aim).await?;
        }
        // Everything just fired; the second fireball is rejected.
        self.cast(SlotIndex(0), aim).await?;

        tracing::info!("== Interrupted telegraph ==");
        self.recharge(100);
        let nova = SlotIndex(1);
        let dispatch = self.runtime.cast(nova, Self::caster(), aim)?;
        let interrupted = self
            .runtime
            .interrupt(InterruptTarget::Slot(nova), true);
        tracing::info!("Interrupted {interrupted} cast(s)");
        if let Some(report) = dispatch.finish().await? {
            tracing::info!(
                "{nova}: {} (pipeline ran: {}, refunded {})",
                report.outcome,
                report.pipeline_ran,
                report.refunded
            );
        }

        tracing::info!("== Level-ups ==");
        self.level_up(SlotIndex(0))?;
        self.level_up(SlotIndex(0))?;
        self.level_up(SlotIndex(2))?;

        for round in 1..=rounds {
            tracing::info!("== Round {round} ==");
            // Longest bundled cooldown is four seconds.
            tokio::time::sleep(Duration::from_secs(4)).await;
            self.spawn_wave(100 + round * 10);
            self.recharge(100);
            for (slot, _) in self.instances.clone() {
                self.cast(slot, aim).await?;
            }
        }

        self.report()
    }

    fn level_up(&self, slot: SlotIndex) -> Result<()> {
        let offer = self.runtime.offer_level_up(slot)?;
        if offer.is_max_level() {
            tracing::info!("{slot}: {} is at max level", offer.skill);
            return Ok(());
        }

        let options: Vec<_> = offer.effects.iter().map(|entry| entry.id.as_str()).collect();
        tracing::info!("{slot}: {} -> level {}, options {options:?}", offer.skill, offer.reaching);

        // The sandbox always takes branch A and the first drawn effect.
        let mut choice = LevelUpChoice::branch(BranchChoice::A);
        choice.effect = offer.effects.first().map(|entry| entry.id.clone());
        let outcome = self.runtime.choose_level_up(slot, &offer, &choice)?;
        tracing::info!(
            "{slot}: level {} via {} ({:?})",
            outcome.level,
            outcome.branch,
            outcome.modifier
        );
        Ok(())
    }

    fn report(mut self) -> Result<()> {
        let mut casts = 0u64;
        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    casts += 1;
                    tracing::debug!("{}", serde_json::to_string(&event)?);
                }
                Err(TryRecvError::Lagged(skipped)) => casts += skipped,
                Err(_) => break,
            }
        }
        while let Ok(event) = self.progression.try_recv() {
            tracing::info!("{}", serde_json::to_string(&event)?);
        }
        tracing::info!("Cast events: {casts}");
        tracing::info!("Effects attached: {}", self.sink.len());

        for (slot, _) in &self.instances {
            let progress = self.runtime.save_progress(*slot)?;
            let bytes = self.runtime.progress_bytes(*slot)?;
            tracing::info!(
                "{slot}: {} ({} bytes)",
                serde_json::to_string(&progress)?,
                bytes.len()
            );
        }
        Ok(())
    }
}
