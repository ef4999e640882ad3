//! Boundary to the remote Autonomous Database management API
//!
//! The HTTP transport and authentication live behind [`AutonomousDatabaseClient`];
//! this crate only submits operations and polls them through it.

use async_trait::async_trait;
use oradb_core::provider::{ErrorKind, ProviderError};
use thiserror::Error;

use crate::identity::AutonomousDatabaseId;
use crate::remote::{AutonomousDatabase, AutonomousDatabaseUpdate};

/// Errors returned by the remote client
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The API answered with a non-success status
    #[error("unexpected status {status} ({code}): {message}")]
    Status {
        status: u16,
        code: String,
        message: String,
    },

    /// The request never produced a response
    #[error("transport error: {0}")]
    Transport(String),

    /// The response could not be decoded
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl RemoteError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::Status {
            status: 404,
            code: "ResourceNotFound".to_string(),
            message: message.into(),
        }
    }

    /// Whether the response means the object does not exist
    pub fn is_not_found(&self) -> bool {
        match self {
            RemoteError::Status { status, code, .. } => {
                *status == 404 || code == "ResourceNotFound" || code == "NotFound"
            }
            _ => false,
        }
    }

    /// Wrap into a provider error, prefixed with what was being attempted
    pub fn context(self, context: impl std::fmt::Display) -> ProviderError {
        ProviderError::new(ErrorKind::Remote, format!("{}: {}", context, self)).with_cause(self)
    }
}

/// Whether a provider error was caused by a not-found response
pub fn caused_by_not_found(err: &ProviderError) -> bool {
    err.cause
        .as_ref()
        .and_then(|cause| cause.downcast_ref::<RemoteError>())
        .is_some_and(RemoteError::is_not_found)
}

/// Opaque token for a submitted long-running operation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationHandle(pub String);

impl std::fmt::Display for OperationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Status of a long-running operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    InProgress,
    Succeeded,
    Failed { reason: String },
    Canceled,
}

impl OperationStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OperationStatus::InProgress)
    }
}

/// Remote asynchronous API for autonomous databases
///
/// Mutations return a handle immediately; [`crate::poller`] drives them to a
/// terminal state.
#[async_trait]
pub trait AutonomousDatabaseClient: Send + Sync {
    async fn get(&self, id: &AutonomousDatabaseId) -> Result<AutonomousDatabase, RemoteError>;

    async fn begin_create_or_update(
        &self,
        id: &AutonomousDatabaseId,
        body: AutonomousDatabase,
    ) -> Result<OperationHandle, RemoteError>;

    async fn begin_update(
        &self,
        id: &AutonomousDatabaseId,
        body: AutonomousDatabaseUpdate,
    ) -> Result<OperationHandle, RemoteError>;

    async fn begin_delete(&self, id: &AutonomousDatabaseId)
    -> Result<OperationHandle, RemoteError>;

    async fn operation_status(
        &self,
        handle: &OperationHandle,
    ) -> Result<OperationStatus, RemoteError>;
}
