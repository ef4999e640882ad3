//! Submit-then-poll driver for long-running operations
//!
//! Every mutation goes through [`Poller::submit_then_poll`]: submit, then poll the
//! returned handle until it is terminal or the caller's deadline passes. Nothing
//! here retries; a terminal failure is returned as is. A timeout does not cancel
//! the remote operation.

use std::future::Future;
use std::time::Duration;

use log::{debug, info};
use oradb_core::provider::{ErrorKind, Operation, ProviderError, ProviderResult};
use tokio::time::{Instant, sleep_until, timeout_at};

use crate::client::{AutonomousDatabaseClient, OperationHandle, OperationStatus, RemoteError};
use crate::identity::AutonomousDatabaseId;

/// Default delay between two status checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

fn timed_out(what: impl std::fmt::Display) -> ProviderError {
    ProviderError::new(
        ErrorKind::Timeout,
        format!(
            "timed out waiting for {}; the remote operation may still complete",
            what
        ),
    )
}

/// Run a single remote call bounded by `deadline`
pub async fn within<T>(
    deadline: Instant,
    what: impl std::fmt::Display,
    call: impl Future<Output = ProviderResult<T>>,
) -> ProviderResult<T> {
    timeout_at(deadline, call)
        .await
        .unwrap_or_else(|_| Err(timed_out(what)))
}

pub struct Poller<'a> {
    client: &'a dyn AutonomousDatabaseClient,
    settings: PollSettings,
}

impl<'a> Poller<'a> {
    pub fn new(client: &'a dyn AutonomousDatabaseClient, settings: PollSettings) -> Self {
        Self { client, settings }
    }

    /// Submit a request and block until the operation it starts is terminal
    pub async fn submit_then_poll<Req, F, Fut>(
        &self,
        operation: Operation,
        id: &AutonomousDatabaseId,
        deadline: Instant,
        request: Req,
        submit: F,
    ) -> ProviderResult<()>
    where
        F: FnOnce(Req) -> Fut,
        Fut: Future<Output = Result<OperationHandle, RemoteError>>,
    {
        let handle = match timeout_at(deadline, submit(request)).await {
            Ok(Ok(handle)) => handle,
            Ok(Err(e)) => {
                return Err(e
                    .context("submitting request")
                    .with_identifier(id)
                    .during(operation));
            }
            Err(_) => {
                return Err(timed_out("the request to be accepted")
                    .with_identifier(id)
                    .during(operation));
            }
        };

        info!("{} {}: waiting for operation {}", operation, id, handle);

        self.wait_for_operation(&handle, deadline)
            .await
            .map_err(|e| e.with_identifier(id).during(operation))
    }

    /// Poll an operation until it reaches a terminal state
    pub async fn wait_for_operation(
        &self,
        handle: &OperationHandle,
        deadline: Instant,
    ) -> ProviderResult<()> {
        loop {
            if Instant::now() >= deadline {
                return Err(timed_out(format!("operation {}", handle)));
            }

            let status = match timeout_at(deadline, self.client.operation_status(handle)).await {
                Ok(result) => {
                    result.map_err(|e| e.context(format!("polling operation {}", handle)))?
                }
                Err(_) => return Err(timed_out(format!("operation {}", handle))),
            };

            debug!("operation {} status: {:?}", handle, status);

            match status {
                OperationStatus::Succeeded => return Ok(()),
                OperationStatus::Failed { reason } => {
                    return Err(ProviderError::new(
                        ErrorKind::OperationFailed,
                        format!("operation {} failed: {}", handle, reason),
                    ));
                }
                OperationStatus::Canceled => {
                    return Err(ProviderError::new(
                        ErrorKind::OperationFailed,
                        format!("operation {} was cancelled", handle),
                    ));
                }
                OperationStatus::InProgress => {
                    // Never sleep past the deadline
                    let next = Instant::now()
                        .checked_add(self.settings.interval)
                        .map_or(deadline, |next| next.min(deadline));
                    sleep_until(next).await;
                }
            }
        }
    }
}
