use thiserror::Error;

use crate::platform::{AttachmentError, PlatformError};
use crate::schedule::ScheduleError;
use crate::storage::StorageError;

/// Every way a scheduling operation can end without a notification.
///
/// None of these are fatal. The engine logs them and carries on; the host
/// never receives them from a scheduling call.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Notification permission not granted")]
    PermissionDenied,

    #[error("Content pool is empty")]
    EmptyPool,

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(#[from] ScheduleError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] StorageError),

    #[error("Platform refused trigger for {identifier}: {source}")]
    Arm {
        identifier: String,
        #[source]
        source: PlatformError,
    },

    #[error("Attachment error: {0}")]
    Attachment(#[from] AttachmentError),

    #[error("Notification engine is not running")]
    EngineStopped,
}

impl EngineError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::PermissionDenied => "PERMISSION_DENIED",
            EngineError::EmptyPool => "EMPTY_POOL",
            EngineError::InvalidSchedule(_) => "INVALID_SCHEDULE",
            EngineError::Persistence(_) => "PERSISTENCE_FAILURE",
            EngineError::Arm { .. } => "OS_ARM_FAILURE",
            EngineError::Attachment(_) => "ATTACHMENT_FETCH_FAILURE",
            EngineError::EngineStopped => "ENGINE_STOPPED",
        }
    }

    /// Label used for the skipped-operations metric
    pub fn skip_reason(&self) -> &'static str {
        match self {
            EngineError::PermissionDenied => "permission_denied",
            EngineError::EmptyPool => "empty_pool",
            EngineError::InvalidSchedule(_) => "invalid_schedule",
            EngineError::Persistence(_) => "persistence",
            EngineError::Arm { .. } => "arm_failure",
            EngineError::Attachment(_) => "attachment",
            EngineError::EngineStopped => "engine_stopped",
        }
    }

    /// Outcomes the engine expects during normal operation, as opposed to
    /// failures of a collaborator.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            EngineError::PermissionDenied | EngineError::EmptyPool | EngineError::InvalidSchedule(_)
        )
    }

    /// Log the error for a failed operation at a level matching its kind.
    pub fn log(&self, operation: &str, identifier: &str) {
        let code = self.code();
        match self {
            EngineError::PermissionDenied => tracing::info!(
                code = %code,
                operation = %operation,
                identifier = %identifier,
                "No notification permission, operation skipped"
            ),
            EngineError::EmptyPool | EngineError::InvalidSchedule(_) => tracing::warn!(
                code = %code,
                operation = %operation,
                identifier = %identifier,
                message = %self,
                "Operation skipped"
            ),
            EngineError::Attachment(_) => tracing::warn!(
                code = %code,
                operation = %operation,
                identifier = %identifier,
                message = %self,
                "Attachment unavailable, scheduling without it"
            ),
            EngineError::Persistence(_) => tracing::error!(
                code = %code,
                operation = %operation,
                identifier = %identifier,
                message = %self,
                "Persistence failed, keeping in-memory state"
            ),
            _ => tracing::error!(
                code = %code,
                operation = %operation,
                identifier = %identifier,
                message = %self,
                "Operation failed"
            ),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
