//! Common error infrastructure for skill-core.
//!
//! Expected cast outcomes (`Fail`, `Cancel`) are [`crate::StageOutcome`]
//! values, not errors. The enums here cover precondition violations the
//! orchestrator rejects up front and progression requests that do not fit the
//! current state of a skill.

use crate::types::{BranchId, EvolutionEffectId, NodeId, SkillId, SlotIndex};

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: Temporary conditions that may succeed later (cooldown, energy)
/// - **Validation**: Invalid input that should be rejected without retry
/// - **Internal**: Unexpected state inconsistencies that require investigation
/// - **Fatal**: Unrecoverable errors indicating corrupted progress data
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    Recoverable,
    Validation,
    Internal,
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an internal bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all skill-core errors.
///
/// - All error enums should implement this trait
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait SkillError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

/// Reasons a cast request is rejected before any token is issued.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CastError {
    /// No slot exists at this index.
    #[error("slot {0} does not exist")]
    UnknownSlot(SlotIndex),

    /// The slot exists but has no skill bound.
    #[error("slot {0} is empty")]
    EmptySlot(SlotIndex),

    /// The bound instance holds less charge than the skill's threshold.
    #[error("insufficient resource: have {current}, need {required}")]
    InsufficientResource { current: i32, required: i32 },

    /// The skill was used too recently.
    #[error("skill {skill} is on cooldown")]
    OnCooldown { skill: SkillId },
}

impl SkillError for CastError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownSlot(_) | Self::EmptySlot(_) => ErrorSeverity::Validation,
            Self::InsufficientResource { .. } | Self::OnCooldown { .. } => {
                ErrorSeverity::Recoverable
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownSlot(_) => "CAST_UNKNOWN_SLOT",
            Self::EmptySlot(_) => "CAST_EMPTY_SLOT",
            Self::InsufficientResource { .. } => "CAST_INSUFFICIENT_RESOURCE",
            Self::OnCooldown { .. } => "CAST_ON_COOLDOWN",
        }
    }
}

/// Errors raised while applying or restoring evolution choices.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EvolutionError {
    /// The node unlocks a different level than the one being reached.
    #[error("node {node} unlocks level {node_level}, skill is reaching level {reaching}")]
    LevelMismatch {
        node: NodeId,
        node_level: u32,
        reaching: u32,
    },

    /// No evolution node is defined for the level being reached.
    #[error("skill {skill} has no evolution node for level {level}")]
    NoNodeForLevel { skill: SkillId, level: u32 },

    /// A persisted branch id is not part of the skill's tree.
    #[error("branch {0} is not part of this evolution tree")]
    UnknownBranch(BranchId),

    /// The requested catalog entry does not exist.
    #[error("evolution effect {0} is not in the catalog")]
    UnknownEffect(EvolutionEffectId),

    /// The catalog entry is not eligible for this skill at this level.
    #[error("evolution effect {effect} is not eligible at level {level}")]
    Ineligible {
        effect: EvolutionEffectId,
        level: u32,
    },

    /// The entry already reached its per-skill stack limit.
    #[error("evolution effect {effect} reached its stack limit of {max_stacks}")]
    StackLimitReached {
        effect: EvolutionEffectId,
        max_stacks: u32,
    },

    /// Persisted progress contradicts itself or the skill it is restored onto.
    #[error("progress record is inconsistent: {0}")]
    InconsistentProgress(&'static str),
}

impl SkillError for EvolutionError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::LevelMismatch { .. } | Self::NoNodeForLevel { .. } => ErrorSeverity::Validation,
            Self::UnknownBranch(_) | Self::UnknownEffect(_) => ErrorSeverity::Validation,
            Self::Ineligible { .. } | Self::StackLimitReached { .. } => ErrorSeverity::Recoverable,
            Self::InconsistentProgress(_) => ErrorSeverity::Fatal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::LevelMismatch { .. } => "EVOLUTION_LEVEL_MISMATCH",
            Self::NoNodeForLevel { .. } => "EVOLUTION_NO_NODE_FOR_LEVEL",
            Self::UnknownBranch(_) => "EVOLUTION_UNKNOWN_BRANCH",
            Self::UnknownEffect(_) => "EVOLUTION_UNKNOWN_EFFECT",
            Self::Ineligible { .. } => "EVOLUTION_INELIGIBLE",
            Self::StackLimitReached { .. } => "EVOLUTION_STACK_LIMIT_REACHED",
            Self::InconsistentProgress(_) => "EVOLUTION_INCONSISTENT_PROGRESS",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cast_errors_classify_resource_shortage_as_recoverable() {
        let err = CastError::InsufficientResource {
            current: 40,
            required: 100,
        };
        assert!(err.severity().is_recoverable());
        assert_eq!(err.error_code(), "CAST_INSUFFICIENT_RESOURCE");
        assert_eq!(err.to_string(), "insufficient resource: have 40, need 100");
    }

    #[test]
    fn inconsistent_progress_is_fatal() {
        let err = EvolutionError::InconsistentProgress("level does not match history");
        assert!(err.severity().is_internal());
    }
}
