//! Unified error types surfaced by the runtime API.
//!
//! Wraps cast preconditions, evolution failures and task coordination
//! problems so hosts can bubble them up with consistent context.
use thiserror::Error;

use skill_core::{CastError, ErrorSeverity, EvolutionError, SkillError, SkillId, SlotIndex};

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Cast(#[from] CastError),

    #[error(transparent)]
    Evolution(#[from] EvolutionError),

    #[error("skill {0} is not defined in the loaded content")]
    UnknownSkill(SkillId),

    #[error("content failed to load: {0}")]
    Content(String),

    #[error("runtime is missing its {0} collaborator")]
    MissingCollaborator(&'static str),

    #[error("delayed casts need a tokio runtime")]
    NoAsyncRuntime,

    #[error("cast task join failed")]
    TaskJoin(#[source] tokio::task::JoinError),

    #[error("progress record of {slot} could not be serialized or deserialized")]
    ProgressEncoding {
        slot: SlotIndex,
        #[source]
        source: bincode::Error,
    },
}

impl SkillError for RuntimeError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Cast(err) => err.severity(),
            Self::Evolution(err) => err.severity(),
            Self::UnknownSkill(_) => ErrorSeverity::Validation,
            Self::Content(_) | Self::MissingCollaborator(_) | Self::NoAsyncRuntime => {
                ErrorSeverity::Fatal
            }
            Self::TaskJoin(_) | Self::ProgressEncoding { .. } => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Cast(err) => err.error_code(),
            Self::Evolution(err) => err.error_code(),
            Self::UnknownSkill(_) => "RUNTIME_UNKNOWN_SKILL",
            Self::Content(_) => "RUNTIME_CONTENT",
            Self::MissingCollaborator(_) => "RUNTIME_MISSING_COLLABORATOR",
            Self::NoAsyncRuntime => "RUNTIME_NO_ASYNC_RUNTIME",
            Self::TaskJoin(_) => "RUNTIME_TASK_JOIN",
            Self::ProgressEncoding { .. } => "RUNTIME_PROGRESS_ENCODING",
        }
    }
}
