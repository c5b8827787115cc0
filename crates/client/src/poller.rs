//! Asynchronous task polling.
//!
//! A submitted job is identified by its [`CorrelationId`]. The poller
//! queries the status endpoint on a fixed interval until the job
//! reports `DONE` (payload returned) or `ERROR` (failure outcome), the
//! poll deadline passes, or the [`CancellationToken`] is triggered.
//!
//! Transient status-query failures are retried with exponential
//! backoff; fatal ones (auth, malformed responses) end the poll
//! immediately.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bioinfer_core::poll::{next_delay, PollConfig};
use bioinfer_core::task::{TaskOutcome, TaskRecord, TaskStatus};
use bioinfer_core::types::CorrelationId;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::api::InferenceApi;
use crate::error::ClientError;

/// Anything that can report the status of a remote job.
#[async_trait]
pub trait TaskStatusSource: Send + Sync {
    async fn task_status(&self, id: &CorrelationId) -> Result<TaskRecord, ClientError>;
}

#[async_trait]
impl TaskStatusSource for InferenceApi {
    async fn task_status(&self, id: &CorrelationId) -> Result<TaskRecord, ClientError> {
        InferenceApi::task_status(self, id).await
    }
}

#[async_trait]
impl<T: TaskStatusSource + ?Sized> TaskStatusSource for Arc<T> {
    async fn task_status(&self, id: &CorrelationId) -> Result<TaskRecord, ClientError> {
        (**self).task_status(id).await
    }
}

/// Result of polling one job in a batch.
pub type BatchResult = (CorrelationId, Result<TaskOutcome, ClientError>);

/// Polls a [`TaskStatusSource`] until jobs reach a terminal state.
pub struct TaskPoller<S> {
    source: S,
    config: PollConfig,
    cancel: CancellationToken,
}

impl<S: TaskStatusSource> TaskPoller<S> {
    pub fn new(source: S, config: PollConfig) -> Self {
        Self {
            source,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned cancellation token (e.g. a child of an
    /// application-wide shutdown token).
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that stops every in-flight poll of this poller.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Wait for a single job to finish.
    ///
    /// Accepts a raw id or a submission response; both poll identically.
    /// Returns [`TaskOutcome::Completed`] with the payload on `DONE` and
    /// [`TaskOutcome::Failed`] on `ERROR`. Transport and decode failures,
    /// the deadline, and cancellation are reported as errors.
    pub async fn wait(&self, id: impl Into<CorrelationId>) -> Result<TaskOutcome, ClientError> {
        let id = id.into();
        let started = Instant::now();
        let deadline = self.config.timeout.map(|timeout| started + timeout);
        let mut last_status: Option<TaskStatus> = None;
        let mut polls = 0u32;

        tracing::info!(correlation_id = %id, "Polling task");

        loop {
            let record = self.query(&id, deadline, started).await?;
            polls += 1;

            if last_status.as_ref() != Some(&record.status) {
                tracing::info!(
                    correlation_id = %id,
                    status = %record.status,
                    polls,
                    "Task status changed",
                );
            } else {
                tracing::debug!(
                    correlation_id = %id,
                    status = %record.status,
                    polls,
                    "Task still pending",
                );
            }

            if let Some(outcome) = resolve(&id, &record)? {
                tracing::info!(
                    correlation_id = %id,
                    completed = outcome.is_completed(),
                    polls,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Task finished",
                );
                return Ok(outcome);
            }

            last_status = Some(record.status);
            self.pause(self.config.interval, &id, deadline, started).await?;
        }
    }

    /// Wait for several jobs in one loop.
    ///
    /// Each round queries every pending job once, drops those that
    /// reached a terminal state, then sleeps for the poll interval if
    /// any remain. A fatal error resolves only the job it belongs to;
    /// the deadline or cancellation resolves every job still pending.
    /// Results are returned in input order.
    pub async fn wait_all<I, T>(&self, ids: I) -> Vec<BatchResult>
    where
        I: IntoIterator<Item = T>,
        T: Into<CorrelationId>,
    {
        let ids: Vec<CorrelationId> = ids.into_iter().map(Into::into).collect();
        let mut results: Vec<Option<Result<TaskOutcome, ClientError>>> =
            ids.iter().map(|_| None).collect();
        let mut pending: Vec<usize> = (0..ids.len()).collect();
        let started = Instant::now();
        let deadline = self.config.timeout.map(|timeout| started + timeout);

        tracing::info!(count = ids.len(), "Polling task batch");

        'rounds: while !pending.is_empty() {
            let mut still_pending = Vec::with_capacity(pending.len());
            let mut queue = pending.into_iter();

            while let Some(index) = queue.next() {
                let id = &ids[index];
                let resolved = match self.query(id, deadline, started).await {
                    Ok(record) => resolve(id, &record),
                    Err(err) => Err(err),
                };

                match resolved {
                    Ok(Some(outcome)) => results[index] = Some(Ok(outcome)),
                    Ok(None) => still_pending.push(index),
                    Err(err) if err.is_interruption() => {
                        let unresolved = still_pending.into_iter().chain([index]).chain(queue);
                        for rest in unresolved {
                            results[rest] = Some(Err(reissue(&err, &ids[rest])));
                        }
                        break 'rounds;
                    }
                    Err(err) => {
                        tracing::warn!(correlation_id = %id, error = %err, "Task polling failed");
                        results[index] = Some(Err(err));
                    }
                }
            }

            pending = still_pending;
            if pending.is_empty() {
                break;
            }

            tracing::debug!(pending = pending.len(), "Tasks still pending");
            if let Err(err) = self
                .pause(self.config.interval, &ids[pending[0]], deadline, started)
                .await
            {
                for rest in pending {
                    results[rest] = Some(Err(reissue(&err, &ids[rest])));
                }
                break;
            }
        }

        ids.into_iter()
            .zip(results)
            .map(|(id, result)| {
                let result = result.unwrap_or_else(|| {
                    Err(ClientError::Cancelled {
                        correlation_id: id.clone(),
                    })
                });
                (id, result)
            })
            .collect()
    }

    /// One status query, retrying retryable failures with backoff.
    async fn query(
        &self,
        id: &CorrelationId,
        deadline: Option<Instant>,
        started: Instant,
    ) -> Result<TaskRecord, ClientError> {
        let retry = &self.config.retry;
        let mut delay = retry.initial_delay;
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    return Err(ClientError::Cancelled { correlation_id: id.clone() });
                }
                _ = deadline_reached(deadline) => {
                    return Err(ClientError::Timeout {
                        correlation_id: id.clone(),
                        elapsed: started.elapsed(),
                    });
                }
                result = self.source.task_status(id) => result,
            };

            match result {
                Ok(record) => return Ok(record),
                Err(err) if err.is_retryable() && attempt <= retry.max_retries => {
                    tracing::warn!(
                        correlation_id = %id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Status query failed, retrying",
                    );
                    self.pause(delay, id, deadline, started).await?;
                    delay = next_delay(delay, retry);
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Sleep for `delay`, waking early on cancellation or the deadline.
    async fn pause(
        &self,
        delay: Duration,
        id: &CorrelationId,
        deadline: Option<Instant>,
        started: Instant,
    ) -> Result<(), ClientError> {
        let wake = Instant::now() + delay;

        match deadline {
            Some(deadline) if deadline <= wake => {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => {
                        Err(ClientError::Cancelled { correlation_id: id.clone() })
                    }
                    _ = tokio::time::sleep_until(deadline) => Err(ClientError::Timeout {
                        correlation_id: id.clone(),
                        elapsed: started.elapsed(),
                    }),
                }
            }
            _ => {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => {
                        Err(ClientError::Cancelled { correlation_id: id.clone() })
                    }
                    _ = tokio::time::sleep_until(wake) => Ok(()),
                }
            }
        }
    }
}

/// Map a status record to an outcome, or `None` while the job is pending.
fn resolve(id: &CorrelationId, record: &TaskRecord) -> Result<Option<TaskOutcome>, ClientError> {
    match record.status {
        TaskStatus::Done => {
            let payload = record.payload().ok_or_else(|| ClientError::MissingPayload {
                correlation_id: id.clone(),
            })?;
            Ok(Some(TaskOutcome::Completed(payload)))
        }
        TaskStatus::Error => {
            tracing::warn!(
                correlation_id = %id,
                detail = record.error_message.as_deref().unwrap_or(""),
                "Task reported an error",
            );
            Ok(Some(TaskOutcome::Failed {
                correlation_id: id.clone(),
                message: record.error_message.clone(),
            }))
        }
        _ => Ok(None),
    }
}

async fn deadline_reached(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// The same interruption, attributed to another job of the batch.
fn reissue(err: &ClientError, id: &CorrelationId) -> ClientError {
    match err {
        ClientError::Timeout { elapsed, .. } => ClientError::Timeout {
            correlation_id: id.clone(),
            elapsed: *elapsed,
        },
        _ => ClientError::Cancelled {
            correlation_id: id.clone(),
        },
    }
}
