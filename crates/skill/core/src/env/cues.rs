use std::time::Duration;

use glam::Vec3;

use crate::types::{CueRef, EntityId};

/// Animation/VFX playback. Side effect only.
///
/// Cues inside the pipeline play while the host holds the casting skill's
/// state. Implementations must not re-enter the host's cast or level-up entry
/// points from `play_cue`.
pub trait CuePlayback: Send + Sync {
    fn play_cue(&self, cue: &CueRef, position: Vec3, parent: Option<EntityId>);
}

/// Monotonic host clock used for cooldowns and last-use stamps.
pub trait GameClock: Send + Sync {
    fn now(&self) -> Duration;
}
