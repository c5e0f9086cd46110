//! Per-cast data: the cancellation token, the context threaded through the
//! pipeline, and the outcome stages report.

mod context;
mod token;

pub use context::{
    CastContext, CastRequest, CooldownConfig, DamageResult, ResourceCostConfig, TargetingConfig,
};
pub use token::{CancelReason, ExecutionToken};

use tracing::info;

use crate::env::ResourceInventory;
use crate::state::SkillRuntimeState;

/// Result of a single stage or of the whole pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum StageOutcome {
    /// Advance to the next stage; as a pipeline result, the cast succeeded.
    Continue,
    /// Expected failure (insufficient resource, no targets). Never refunds.
    Fail,
    /// Interrupted through the execution token. Refunds what was spent.
    Cancel,
}

impl StageOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, Self::Continue)
    }
}

/// Refunds whatever the current cast debited and clears the scratch fields.
///
/// Returns the amount credited back. Call exactly once per cancelled cast;
/// completed or failed casts clear the scratch fields through
/// [`SkillRuntimeState::take_spent`] without crediting.
pub fn refund_spent(state: &mut SkillRuntimeState, inventory: &dyn ResourceInventory) -> i32 {
    match state.take_spent() {
        Some(amount) if amount > 0 => {
            inventory.credit(state.instance_id(), amount);
            info!(
                target: "skill::cast",
                skill = %state.skill_id(),
                instance = %state.instance_id(),
                amount,
                "refunded cancelled cast"
            );
            amount
        }
        _ => 0,
    }
}
