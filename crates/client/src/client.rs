//! Submit-and-wait operations built on [`InferenceApi`] and
//! [`TaskPoller`].
//!
//! Unlike the poller, these operations treat a remote `ERROR` as a
//! [`ClientError::TaskFailed`], since a caller asking for a typed result
//! has nothing to return otherwise.

use std::sync::Arc;

use bioinfer_core::models::{
    DockingRequest, DockingResult, FoldingModel, FoldingResult, MoleculeGenerationModel,
    MoleculeGenerationRequest, MoleculeGenerationResult, ProteinGenerationModel,
    ProteinGenerationRequest, ProteinGenerationResult,
};
use bioinfer_core::poll::PollConfig;
use bioinfer_core::task::{TaskOutcome, TaskResponse};
use bioinfer_core::types::CorrelationId;
use tokio_util::sync::CancellationToken;

use crate::api::InferenceApi;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::poller::TaskPoller;

pub struct InferenceClient {
    api: Arc<InferenceApi>,
    poller: TaskPoller<Arc<InferenceApi>>,
    batch_poller: TaskPoller<Arc<InferenceApi>>,
}

impl InferenceClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let api = InferenceApi::new(config)?;
        Ok(Self::from_api(api, config.poll.clone()))
    }

    /// Build a client around an existing API handle.
    ///
    /// Batch waits use the batch interval; the deadline and retry policy
    /// are shared with single-job waits.
    pub fn from_api(api: InferenceApi, poll: PollConfig) -> Self {
        let api = Arc::new(api);
        let batch = PollConfig::batch()
            .with_timeout(poll.timeout)
            .with_retry(poll.retry.clone());
        let cancel = CancellationToken::new();

        let poller = TaskPoller::new(Arc::clone(&api), poll).with_cancellation(cancel.clone());
        let batch_poller = TaskPoller::new(Arc::clone(&api), batch).with_cancellation(cancel);
        Self {
            api,
            poller,
            batch_poller,
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.poller = self.poller.with_cancellation(cancel.clone());
        self.batch_poller = self.batch_poller.with_cancellation(cancel);
        self
    }

    pub fn api(&self) -> &InferenceApi {
        &self.api
    }

    /// Poller for single jobs.
    pub fn poller(&self) -> &TaskPoller<Arc<InferenceApi>> {
        &self.poller
    }

    /// Poller for [`wait_all`](TaskPoller::wait_all) over many jobs.
    pub fn batch_poller(&self) -> &TaskPoller<Arc<InferenceApi>> {
        &self.batch_poller
    }

    pub async fn fold_and_wait(
        &self,
        model: FoldingModel,
        sequence: &str,
    ) -> Result<FoldingResult, ClientError> {
        let submitted = self.api.fold(model, sequence).await?;
        let response = self.completed(submitted).await?;
        Ok(FoldingResult::from_response(&response)?)
    }

    pub async fn generate_proteins_and_wait(
        &self,
        model: ProteinGenerationModel,
        request: &ProteinGenerationRequest,
    ) -> Result<ProteinGenerationResult, ClientError> {
        let submitted = self.api.generate_proteins(model, request).await?;
        let response = self.completed(submitted).await?;
        Ok(response.json()?)
    }

    pub async fn generate_molecules_and_wait(
        &self,
        model: MoleculeGenerationModel,
        request: &MoleculeGenerationRequest,
    ) -> Result<MoleculeGenerationResult, ClientError> {
        let submitted = self.api.generate_molecules(model, request).await?;
        let response = self.completed(submitted).await?;
        Ok(response.json()?)
    }

    pub async fn dock_and_wait(
        &self,
        request: &DockingRequest,
    ) -> Result<DockingResult, ClientError> {
        let submitted = self.api.dock(request).await?;
        let response = self.completed(submitted).await?;
        Ok(response.json()?)
    }

    /// Wait for a job and return its payload, turning a failed outcome
    /// into [`ClientError::TaskFailed`].
    pub async fn completed(
        &self,
        id: impl Into<CorrelationId>,
    ) -> Result<TaskResponse, ClientError> {
        match self.poller.wait(id).await? {
            TaskOutcome::Completed(response) => Ok(response),
            TaskOutcome::Failed {
                correlation_id,
                message,
            } => Err(ClientError::TaskFailed {
                correlation_id,
                message,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bioinfer_core::poll::{RetryConfig, BATCH_POLL_INTERVAL, DEFAULT_POLL_INTERVAL};

    use super::*;

    #[test]
    fn batch_poller_uses_batch_interval_with_shared_limits() {
        let retry = RetryConfig {
            max_retries: 2,
            ..Default::default()
        };
        let config = ClientConfig::new("http://localhost:9999", "key").with_poll(
            PollConfig::default()
                .with_timeout(Some(Duration::from_secs(90)))
                .with_retry(retry.clone()),
        );
        let client = InferenceClient::new(&config).unwrap();

        assert_eq!(client.poller().config().interval, DEFAULT_POLL_INTERVAL);
        let batch = client.batch_poller().config();
        assert_eq!(batch.interval, BATCH_POLL_INTERVAL);
        assert_eq!(batch.timeout, Some(Duration::from_secs(90)));
        assert_eq!(batch.retry, retry);
    }

    #[test]
    fn cancellation_reaches_both_pollers() {
        let config = ClientConfig::new("http://localhost:9999", "key");
        let cancel = CancellationToken::new();
        let client = InferenceClient::new(&config)
            .unwrap()
            .with_cancellation(cancel.clone());

        cancel.cancel();

        assert!(client.poller().cancellation_token().is_cancelled());
        assert!(client.batch_poller().cancellation_token().is_cancelled());
    }
}
