//! Collaborator interfaces the core calls into.
//!
//! The host owns the world: resource pools, spatial queries, effect playback
//! and notification delivery. The core only sees the narrow traits below,
//! injected as shared handles when a pipeline is built. The [`SkillEnv`]
//! aggregate bundles them so equip code can wire a pipeline in one call.
//!
//! Pipeline calls run under the skill's state lock in the runtime. No
//! collaborator may call back into the runtime for the same slot from inside
//! a hook.
mod cues;
mod effects;
mod inventory;
mod notify;
mod targeting;

use std::sync::Arc;

pub use cues::{CuePlayback, GameClock};
pub use effects::{EffectFactory, EffectInstance, StandardEffectFactory, StatusEffectSink};
pub use inventory::ResourceInventory;
pub use notify::{CastOccurred, NotificationBus};
pub use targeting::{FilterGroup, TargetAcquisition, TargetFilter};

/// Failure reported by a modifier hook or a collaborator call.
///
/// These never abort a cast: the caller logs the error and treats the hook
/// as having had no effect.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{source_name} failed: {message}")]
pub struct HookError {
    pub source_name: String,
    pub message: String,
}

impl HookError {
    pub fn new(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}

/// Shared handles to every collaborator a pipeline needs.
#[derive(Clone)]
pub struct SkillEnv {
    pub inventory: Arc<dyn ResourceInventory>,
    pub effects: Arc<dyn EffectFactory>,
    pub status: Arc<dyn StatusEffectSink>,
    pub notifications: Arc<dyn NotificationBus>,
    pub cues: Arc<dyn CuePlayback>,
    pub clock: Arc<dyn GameClock>,
}

impl SkillEnv {
    pub fn new(
        inventory: Arc<dyn ResourceInventory>,
        status: Arc<dyn StatusEffectSink>,
        notifications: Arc<dyn NotificationBus>,
        cues: Arc<dyn CuePlayback>,
        clock: Arc<dyn GameClock>,
    ) -> Self {
        Self {
            inventory,
            effects: Arc::new(StandardEffectFactory),
            status,
            notifications,
            cues,
            clock,
        }
    }

    /// Replaces the default [`StandardEffectFactory`].
    pub fn with_effect_factory(mut self, effects: Arc<dyn EffectFactory>) -> Self {
        self.effects = effects;
        self
    }
}

impl std::fmt::Debug for SkillEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkillEnv").finish_non_exhaustive()
    }
}
