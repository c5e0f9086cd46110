//! Host-side runtime for the skill system.
//!
//! This crate wires `skill-core` pipelines to loaded content and host
//! collaborators. Consumers build a [`SkillRuntime`], equip skills into
//! slots, cast them through the [`CastOrchestrator`], and subscribe to cast
//! and progression events on the [`EventBus`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the runtime, its builder and configuration
//! - [`orchestrator`] runs casts in two phases around the detection delay
//! - [`progression`] offers and commits level-ups
//! - [`api`] exposes the request and report types hosts interact with
//! - [`events`] provides the topic-based event bus
//! - [`targeting`] resolves targeting collaborators by name
//! - [`memory`] provides in-memory collaborators for sandboxes and tests
pub mod api;
pub mod events;
pub mod memory;
pub mod orchestrator;
pub mod progression;
pub mod runtime;
pub mod slots;
pub mod targeting;

pub use api::{CastDispatch, CastReport, CasterInfo, InterruptTarget, Result, RuntimeError};
pub use events::{CastEvent, Event, EventBus, ProgressionEvent, Topic};
pub use memory::{
    InMemoryInventory, InMemoryWorld, RecordingStatusSink, TokioClock, TracingCues, WorldEntity,
};
pub use orchestrator::{CastOrchestrator, PendingCast};
pub use progression::{LevelUpChoice, LevelUpOffer, LevelUpOutcome, Progression};
pub use runtime::{RuntimeConfig, SkillRuntime, SkillRuntimeBuilder};
pub use slots::{EquippedSkill, SkillSlots};
pub use targeting::TargetingRegistry;
