//! Model backends, request bodies and decoded results for the hosted
//! inference endpoints.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::formats::{pdb, sdf};
use crate::task::TaskResponse;

// ---------------------------------------------------------------------------
// Model backends
// ---------------------------------------------------------------------------

/// Interchangeable protein structure prediction backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldingModel {
    OpenFold,
    AlphaFold2,
    EsmFold,
}

impl FoldingModel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenFold => "openfold",
            Self::AlphaFold2 => "alphafold2",
            Self::EsmFold => "esmfold",
        }
    }
}

impl FromStr for FoldingModel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openfold" => Ok(Self::OpenFold),
            "alphafold2" | "alphafold" => Ok(Self::AlphaFold2),
            "esmfold" => Ok(Self::EsmFold),
            other => Err(CoreError::Validation(format!(
                "Unknown folding model '{other}' (expected openfold, alphafold2 or esmfold)"
            ))),
        }
    }
}

impl fmt::Display for FoldingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Protein sequence generation backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProteinGenerationModel {
    ProtGpt2,
}

impl ProteinGenerationModel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProtGpt2 => "protgpt2",
        }
    }
}

impl FromStr for ProteinGenerationModel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "protgpt2" => Ok(Self::ProtGpt2),
            other => Err(CoreError::Validation(format!(
                "Unknown protein generation model '{other}' (expected protgpt2)"
            ))),
        }
    }
}

impl fmt::Display for ProteinGenerationModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Small-molecule generation backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoleculeGenerationModel {
    MoFlow,
    MegaMolBart,
}

impl MoleculeGenerationModel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MoFlow => "moflow",
            Self::MegaMolBart => "megamolbart",
        }
    }
}

impl FromStr for MoleculeGenerationModel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "moflow" => Ok(Self::MoFlow),
            "megamolbart" => Ok(Self::MegaMolBart),
            other => Err(CoreError::Validation(format!(
                "Unknown molecule generation model '{other}' (expected moflow or megamolbart)"
            ))),
        }
    }
}

impl fmt::Display for MoleculeGenerationModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Body of a structure prediction request.
#[derive(Debug, Clone, Serialize)]
pub struct FoldingRequest {
    pub sequence: String,
}

/// Body of a protein sequence generation request.
#[derive(Debug, Clone, Serialize)]
pub struct ProteinGenerationRequest {
    pub max_length: u32,
    pub top_k: u32,
    pub repetition_penalty: f64,
    pub num_return_sequences: u32,
    /// Share of generated sequences (lowest perplexity first) to keep.
    pub percent_to_keep: u32,
}

impl Default for ProteinGenerationRequest {
    fn default() -> Self {
        Self {
            max_length: 150,
            top_k: 950,
            repetition_penalty: 1.2,
            num_return_sequences: 10,
            percent_to_keep: 100,
        }
    }
}

/// Body of a molecule generation request seeded from one or more SMILES.
#[derive(Debug, Clone, Serialize)]
pub struct MoleculeGenerationRequest {
    pub smis: Vec<String>,
    pub num_samples: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scaled_radius: Option<f64>,
}

impl MoleculeGenerationRequest {
    pub fn new(smiles: impl Into<String>, num_samples: u32) -> Self {
        Self {
            smis: vec![smiles.into()],
            num_samples,
            temperature: None,
            scaled_radius: None,
        }
    }
}

/// Inputs of a docking request. Sent as a multipart form: the structures
/// as file parts, the rest as text fields.
#[derive(Debug, Clone)]
pub struct DockingRequest {
    /// Receptor structure in PDB format.
    pub protein_pdb: String,
    /// Ligand structure in SDF format (or a SMILES string).
    pub ligand: String,
    pub poses_to_generate: u32,
    pub diffusion_time_divisions: u32,
    pub diffusion_steps: u32,
    pub save_diffusion_trajectory: bool,
}

impl DockingRequest {
    pub fn new(protein_pdb: impl Into<String>, ligand: impl Into<String>) -> Self {
        Self {
            protein_pdb: protein_pdb.into(),
            ligand: ligand.into(),
            poses_to_generate: 20,
            diffusion_time_divisions: 20,
            diffusion_steps: 18,
            save_diffusion_trajectory: false,
        }
    }

    /// Name of the ligand part; the service infers the format from it.
    pub fn ligand_file_name(&self) -> &'static str {
        if self.ligand.contains("$$$$") || self.ligand.contains("M  END") {
            "ligand.sdf"
        } else {
            "ligand.smi"
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Structures returned by a folding job.
#[derive(Debug, Clone, PartialEq)]
pub struct FoldingResult {
    pub pdbs: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FoldingPayload {
    Many { pdbs: Vec<String> },
    One { pdb: String },
}

impl FoldingResult {
    /// Decode a folding payload. Accepts `{"pdbs": [...]}`, `{"pdb": "..."}`
    /// or bare PDB text.
    pub fn from_response(response: &TaskResponse) -> Result<Self, CoreError> {
        if let Ok(payload) = response.json::<FoldingPayload>() {
            let pdbs = match payload {
                FoldingPayload::Many { pdbs } => pdbs,
                FoldingPayload::One { pdb } => vec![pdb],
            };
            return Ok(Self { pdbs });
        }

        let raw = response.as_str();
        if raw.lines().any(pdb::is_coordinate_record) {
            return Ok(Self {
                pdbs: vec![raw.to_string()],
            });
        }

        Err(CoreError::Format {
            format: "folding response",
            message: "expected `pdbs`, `pdb` or PDB text".to_string(),
        })
    }
}

/// Sequences returned by a protein generation job.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProteinGenerationResult {
    pub generated_sequences: Vec<String>,
    #[serde(default)]
    pub perplexities: Vec<f64>,
}

/// One molecule returned by a generation job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedMolecule {
    #[serde(alias = "sample")]
    pub smiles: String,
    #[serde(default)]
    pub score: Option<f64>,
}

/// Molecules returned by a molecule generation job.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MoleculeGenerationResult {
    #[serde(alias = "generated")]
    pub generated_molecules: Vec<GeneratedMolecule>,
}

impl MoleculeGenerationResult {
    /// Molecules ordered by descending score; unscored ones last.
    pub fn ranked(&self) -> Vec<GeneratedMolecule> {
        let mut molecules = self.generated_molecules.clone();
        molecules.sort_by(|a, b| {
            b.score
                .unwrap_or(f64::NEG_INFINITY)
                .total_cmp(&a.score.unwrap_or(f64::NEG_INFINITY))
        });
        molecules
    }
}

/// Poses returned by a docking job.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DockingResult {
    /// One SDF block per generated pose.
    pub ligand_positions: Vec<String>,
    #[serde(default)]
    pub position_confidence: Vec<f64>,
}

impl DockingResult {
    /// All poses as one multi-record SDF, each tagged with its
    /// `confidence` data field when one was reported.
    pub fn to_sdf(&self) -> String {
        let records: Vec<String> = self
            .ligand_positions
            .iter()
            .enumerate()
            .map(|(i, pose)| match self.position_confidence.get(i) {
                Some(confidence) => {
                    sdf::with_property(pose, "confidence", &format!("{confidence:.4}"))
                }
                None => pose.clone(),
            })
            .collect();
        sdf::join_records(&records)
    }

    /// Index of the pose with the highest confidence.
    pub fn best_pose(&self) -> Option<usize> {
        self.position_confidence
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
    }
}
