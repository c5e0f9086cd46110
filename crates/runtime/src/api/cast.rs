//! Cast requests and results as seen by the host.

use glam::Vec3;
use tokio::task::JoinHandle;

use skill_core::{
    CancelReason, CastError, DamageResult, EntityId, SkillId, SlotIndex, StageOutcome, TeamId,
};

use super::errors::{Result, RuntimeError};

/// The caster side of a cast request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CasterInfo {
    pub entity: EntityId,
    pub team: TeamId,
    pub position: Vec3,
}

impl CasterInfo {
    pub fn new(entity: EntityId, team: TeamId, position: Vec3) -> Self {
        Self {
            entity,
            team,
            position,
        }
    }
}

/// Which in-flight casts an interrupt applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InterruptTarget {
    Slot(SlotIndex),
    All,
}

impl InterruptTarget {
    pub fn matches(self, slot: SlotIndex) -> bool {
        match self {
            Self::Slot(target) => target == slot,
            Self::All => true,
        }
    }
}

/// Terminal record of one cast.
#[derive(Clone, Debug, PartialEq)]
pub struct CastReport {
    pub slot: SlotIndex,
    pub skill: SkillId,
    pub outcome: StageOutcome,
    /// Set when the outcome is `Cancel`.
    pub cancel_reason: Option<CancelReason>,
    /// False when the cast was cancelled during the delay.
    pub pipeline_ran: bool,
    /// Charge the cast kept spent.
    pub spent: i32,
    /// Charge credited back after cancellation.
    pub refunded: i32,
    pub targets: Vec<EntityId>,
    /// Damage after every modifier, when the pipeline reached the damage stage.
    pub damage: Option<DamageResult>,
}

impl CastReport {
    pub fn succeeded(&self) -> bool {
        self.outcome.is_success()
    }
}

/// What [`crate::CastOrchestrator::execute`] did with a request.
#[derive(Debug)]
pub enum CastDispatch {
    /// Preconditions failed; nothing happened.
    Rejected(CastError),
    /// No delay: the pipeline already ran.
    Resolved(CastReport),
    /// The pipeline runs once the skill's detection delay elapses.
    Scheduled(JoinHandle<CastReport>),
}

impl CastDispatch {
    /// Waits for the cast to finish. Rejected casts yield `None`.
    pub async fn finish(self) -> Result<Option<CastReport>> {
        match self {
            Self::Rejected(_) => Ok(None),
            Self::Resolved(report) => Ok(Some(report)),
            Self::Scheduled(handle) => handle.await.map(Some).map_err(RuntimeError::TaskJoin),
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}
