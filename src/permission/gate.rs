use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Answer from the platform authorization service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// What the engine currently knows about authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionState {
    #[default]
    Unknown,
    Granted,
    Denied,
}

impl From<PermissionStatus> for PermissionState {
    fn from(status: PermissionStatus) -> Self {
        match status {
            PermissionStatus::Granted => PermissionState::Granted,
            PermissionStatus::Denied => PermissionState::Denied,
        }
    }
}

/// Presentation capabilities requested from the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationOptions {
    pub alert: bool,
    pub badge: bool,
    pub sound: bool,
}

impl Default for AuthorizationOptions {
    fn default() -> Self {
        Self {
            alert: true,
            badge: true,
            sound: true,
        }
    }
}

/// Platform authorization service.
///
/// Implementations map their own failures to `Denied`.
#[async_trait]
pub trait PermissionService: Send + Sync {
    /// Current authorization without prompting
    async fn current_status(&self) -> PermissionStatus;

    /// Prompt the user for authorization
    async fn request(&self, options: AuthorizationOptions) -> PermissionStatus;
}

/// Gate every scheduling call on a resolved authorization.
///
/// The state moves out of `Unknown` once per process and is not re-checked
/// afterwards.
pub struct PermissionGate {
    service: Arc<dyn PermissionService>,
    options: AuthorizationOptions,
    state: PermissionState,
}

impl PermissionGate {
    pub fn new(service: Arc<dyn PermissionService>, options: AuthorizationOptions) -> Self {
        Self {
            service,
            options,
            state: PermissionState::Unknown,
        }
    }

    pub fn state(&self) -> PermissionState {
        self.state
    }

    pub fn is_granted(&self) -> bool {
        self.state == PermissionState::Granted
    }

    /// Resolve authorization: already-authorized completes immediately,
    /// otherwise the user is prompted exactly once.
    pub async fn ensure(&mut self) -> PermissionStatus {
        match self.state {
            PermissionState::Granted => return PermissionStatus::Granted,
            PermissionState::Denied => return PermissionStatus::Denied,
            PermissionState::Unknown => {}
        }

        let status = match self.service.current_status().await {
            PermissionStatus::Granted => {
                tracing::info!("Notification permission already granted");
                PermissionStatus::Granted
            }
            PermissionStatus::Denied => {
                tracing::info!(options = ?self.options, "Requesting notification permission");
                let answer = self.service.request(self.options).await;
                match answer {
                    PermissionStatus::Granted => tracing::info!("Notification permission granted"),
                    PermissionStatus::Denied => tracing::warn!("Notification permission denied"),
                }
                answer
            }
        };

        self.state = status.into();
        status
    }

    /// Fail with `PermissionDenied` unless authorization was granted.
    pub fn check(&self) -> Result<(), EngineError> {
        if self.is_granted() {
            Ok(())
        } else {
            Err(EngineError::PermissionDenied)
        }
    }
}
