//! REST API client for the hosted inference endpoints.
//!
//! Wraps model listing, UniProt lookup, job submission (protein
//! generation, structure prediction, molecule generation, docking) and
//! task status retrieval using [`reqwest`]. Every request carries the
//! configured bearer token.

use bioinfer_core::error::CoreError;
use bioinfer_core::formats::pdb;
use bioinfer_core::models::{
    DockingRequest, FoldingModel, FoldingRequest, MoleculeGenerationModel,
    MoleculeGenerationRequest, ProteinGenerationModel, ProteinGenerationRequest,
};
use bioinfer_core::task::TaskRecord;
use bioinfer_core::types::{CorrelationId, SubmitResponse};
use bioinfer_core::validation;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use secrecy::ExposeSecret;
use serde::Deserialize;

use crate::config::ClientConfig;
use crate::error::ClientError;

/// Docking backend served at `/molecular-docking/{DOCKING_MODEL}/generate`.
pub const DOCKING_MODEL: &str = "diffdock";

/// HTTP client for a single inference service deployment.
#[derive(Debug, Clone)]
pub struct InferenceApi {
    client: reqwest::Client,
    api_url: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ModelList {
    Wrapped { models: Vec<ModelEntry> },
    Bare(Vec<ModelEntry>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ModelEntry {
    Name(String),
    Described { name: String },
}

impl ModelEntry {
    fn into_name(self) -> String {
        match self {
            Self::Name(name) | Self::Described { name } => name,
        }
    }
}

#[derive(Deserialize)]
struct SequenceBody {
    sequence: String,
}

impl InferenceApi {
    /// Create a client from explicit configuration.
    ///
    /// The bearer token is installed as a sensitive default header, so
    /// it is attached to every request and masked in debug output.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key.expose_secret()))
            .map_err(|_| ClientError::Config("API key contains invalid header characters".into()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_host.clone(),
        })
    }

    /// Create an API client reusing an existing [`reqwest::Client`]. The
    /// caller is responsible for authentication headers.
    pub fn with_client(client: reqwest::Client, api_url: String) -> Self {
        Self { client, api_url }
    }

    /// Base URL, e.g. `https://host/v1`.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// List the model names the deployment serves (`GET /models`).
    pub async fn list_models(&self) -> Result<Vec<String>, ClientError> {
        let response = self
            .client
            .get(format!("{}/models", self.api_url))
            .send()
            .await?;

        let list: ModelList = Self::parse_response(response).await?;
        let (ModelList::Wrapped { models } | ModelList::Bare(models)) = list;
        Ok(models.into_iter().map(ModelEntry::into_name).collect())
    }

    /// Look up the amino-acid sequence for a UniProt accession
    /// (`GET /uniprot/{accession}`).
    ///
    /// The service answers with a JSON string, a `{"sequence": ...}`
    /// object or plain text depending on the deployment; all three are
    /// accepted. The sequence is returned normalised.
    pub async fn uniprot_sequence(&self, accession: &str) -> Result<String, ClientError> {
        validation::validate_uniprot_accession(accession)?;

        let response = self
            .client
            .get(format!("{}/uniprot/{}", self.api_url, accession))
            .send()
            .await?;
        let body = Self::ensure_success(response).await?.text().await?;

        let sequence = decode_sequence(&body);
        tracing::debug!(accession, length = sequence.len(), "Fetched UniProt sequence");
        Ok(validation::normalize_protein_sequence(&sequence)?)
    }

    /// Submit a protein sequence generation job
    /// (`POST /protein-sequence/{model}/generate`).
    pub async fn generate_proteins(
        &self,
        model: ProteinGenerationModel,
        request: &ProteinGenerationRequest,
    ) -> Result<SubmitResponse, ClientError> {
        validation::validate_sample_count(request.num_return_sequences)?;

        let response = self
            .client
            .post(format!("{}/protein-sequence/{}/generate", self.api_url, model))
            .json(request)
            .send()
            .await?;

        let submitted: SubmitResponse = Self::parse_response(response).await?;
        log_submitted("protein-generation", model.as_str(), &submitted.correlation_id);
        Ok(submitted)
    }

    /// Submit a structure prediction job
    /// (`POST /protein-structure/{model}/predict`).
    pub async fn fold(
        &self,
        model: FoldingModel,
        sequence: &str,
    ) -> Result<SubmitResponse, ClientError> {
        let request = FoldingRequest {
            sequence: validation::normalize_protein_sequence(sequence)?,
        };

        let response = self
            .client
            .post(format!("{}/protein-structure/{}/predict", self.api_url, model))
            .json(&request)
            .send()
            .await?;

        let submitted: SubmitResponse = Self::parse_response(response).await?;
        log_submitted("folding", model.as_str(), &submitted.correlation_id);
        Ok(submitted)
    }

    /// Submit a molecule generation job (`POST /molecule/{model}/generate`).
    pub async fn generate_molecules(
        &self,
        model: MoleculeGenerationModel,
        request: &MoleculeGenerationRequest,
    ) -> Result<SubmitResponse, ClientError> {
        if request.smis.is_empty() {
            return Err(CoreError::Validation(
                "At least one seed SMILES is required".to_string(),
            )
            .into());
        }
        for smiles in &request.smis {
            validation::validate_smiles(smiles)?;
        }
        validation::validate_sample_count(request.num_samples)?;

        let response = self
            .client
            .post(format!("{}/molecule/{}/generate", self.api_url, model))
            .json(request)
            .send()
            .await?;

        let submitted: SubmitResponse = Self::parse_response(response).await?;
        log_submitted("molecule-generation", model.as_str(), &submitted.correlation_id);
        Ok(submitted)
    }

    /// Submit a docking job (`POST /molecular-docking/diffdock/generate`).
    ///
    /// The receptor and ligand are uploaded as multipart file parts.
    pub async fn dock(&self, request: &DockingRequest) -> Result<SubmitResponse, ClientError> {
        pdb::summarize(&request.protein_pdb)?;
        validation::validate_sample_count(request.poses_to_generate)?;
        if request.ligand.trim().is_empty() {
            return Err(CoreError::Validation(
                "Ligand must not be empty".to_string(),
            )
            .into());
        }

        let form = Form::new()
            .part(
                "protein_file",
                Part::text(request.protein_pdb.clone()).file_name("protein.pdb"),
            )
            .part(
                "ligand_file",
                Part::text(request.ligand.clone()).file_name(request.ligand_file_name()),
            )
            .text("poses_to_generate", request.poses_to_generate.to_string())
            .text(
                "diffusion_time_divisions",
                request.diffusion_time_divisions.to_string(),
            )
            .text("diffusion_steps", request.diffusion_steps.to_string())
            .text(
                "save_diffusion_trajectory",
                request.save_diffusion_trajectory.to_string(),
            );

        let response = self
            .client
            .post(format!(
                "{}/molecular-docking/{}/generate",
                self.api_url, DOCKING_MODEL
            ))
            .multipart(form)
            .send()
            .await?;

        let submitted: SubmitResponse = Self::parse_response(response).await?;
        log_submitted("docking", DOCKING_MODEL, &submitted.correlation_id);
        Ok(submitted)
    }

    /// Retrieve the current status record of a job (`GET /task/{id}`).
    pub async fn task_status(&self, id: &CorrelationId) -> Result<TaskRecord, ClientError> {
        let response = self
            .client
            .get(format!("{}/task/{}", self.api_url, id))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`ClientError::Api`]
    /// containing the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ClientError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    ///
    /// The body is read as text first so that shape mismatches surface
    /// as [`ClientError::Decode`] rather than as transport errors.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let response = Self::ensure_success(response).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

fn log_submitted(kind: &str, model: &str, id: &CorrelationId) {
    tracing::info!(kind, model, correlation_id = %id, "Job submitted");
}

fn decode_sequence(body: &str) -> String {
    if let Ok(sequence) = serde_json::from_str::<String>(body) {
        return sequence;
    }
    if let Ok(SequenceBody { sequence }) = serde_json::from_str::<SequenceBody>(body) {
        return sequence;
    }
    body.trim().to_string()
}
