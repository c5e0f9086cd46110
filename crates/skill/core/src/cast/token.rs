//! Cooperative cancellation handle for one in-flight cast.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

/// Why a cast was cancelled.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr, strum::FromRepr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum CancelReason {
    Unknown = 1,
    Silence = 2,
    Stun = 3,
    /// Superseded by a newer cast on the same slot.
    NewSkill = 4,
    ManualInterrupt = 5,
}

const ACTIVE: u8 = 0;

/// Cancellation flag with a reason code.
///
/// Clones share the same flag: the orchestrator keeps one clone in its token
/// registry and hands another to the resuming cast. Only the first
/// [`cancel`](Self::cancel) is recorded; later calls keep the original reason.
#[derive(Clone, Debug, Default)]
pub struct ExecutionToken {
    state: Arc<AtomicU8>,
}

impl ExecutionToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the token cancelled. Returns false if it already was.
    pub fn cancel(&self, reason: CancelReason) -> bool {
        self.state
            .compare_exchange(ACTIVE, reason as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.load(Ordering::Acquire) != ACTIVE
    }

    /// The recorded reason, or `None` while the token is active.
    pub fn reason(&self) -> Option<CancelReason> {
        CancelReason::from_repr(self.state.load(Ordering::Acquire))
    }

    /// True if both handles refer to the same cast.
    pub fn same_as(&self, other: &ExecutionToken) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}
