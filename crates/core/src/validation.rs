//! Input validation applied before a job is submitted.
//!
//! The remote service rejects bad inputs too, but only after a round
//! trip and sometimes only once the job has been queued.

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Standard amino acids plus the ambiguity / non-standard codes
/// (`X`, `U`, `O`, `B`, `Z`) the folding backends accept.
const AMINO_ACIDS: &str = "ACDEFGHIKLMNPQRSTVWYXUOBZ";

/// Longest sequence accepted for structure prediction.
pub const MAX_SEQUENCE_LEN: usize = 2_000;

/// Bounds on samples requested from a generation endpoint.
pub const MIN_SAMPLES: u32 = 1;
pub const MAX_SAMPLES: u32 = 100;

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate and normalise a protein sequence.
///
/// Whitespace is removed and letters are upper-cased. Rules:
/// - Must not be empty.
/// - Must not exceed `MAX_SEQUENCE_LEN` residues.
/// - Only one-letter amino-acid codes are allowed.
pub fn normalize_protein_sequence(sequence: &str) -> Result<String, CoreError> {
    let normalized: String = sequence
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if normalized.is_empty() {
        return Err(CoreError::Validation(
            "Protein sequence must not be empty".to_string(),
        ));
    }
    if normalized.len() > MAX_SEQUENCE_LEN {
        return Err(CoreError::Validation(format!(
            "Protein sequence must not exceed {MAX_SEQUENCE_LEN} residues"
        )));
    }
    if let Some((i, c)) = normalized
        .char_indices()
        .find(|(_, c)| !AMINO_ACIDS.contains(*c))
    {
        return Err(CoreError::Validation(format!(
            "Invalid residue '{c}' at position {}",
            i + 1
        )));
    }
    Ok(normalized)
}

/// Validate a SMILES string: non-empty, no embedded whitespace.
pub fn validate_smiles(smiles: &str) -> Result<(), CoreError> {
    if smiles.is_empty() {
        return Err(CoreError::Validation("SMILES must not be empty".to_string()));
    }
    if smiles.chars().any(char::is_whitespace) {
        return Err(CoreError::Validation(
            "SMILES must not contain whitespace".to_string(),
        ));
    }
    Ok(())
}

/// Validate a UniProt accession: 6 or 10 alphanumeric characters.
pub fn validate_uniprot_accession(accession: &str) -> Result<(), CoreError> {
    let len_ok = accession.len() == 6 || accession.len() == 10;
    if !len_ok || !accession.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(CoreError::Validation(format!(
            "'{accession}' is not a UniProt accession (6 or 10 alphanumeric characters)"
        )));
    }
    Ok(())
}

/// Validate a requested sample / pose count.
pub fn validate_sample_count(count: u32) -> Result<(), CoreError> {
    if !(MIN_SAMPLES..=MAX_SAMPLES).contains(&count) {
        return Err(CoreError::Validation(format!(
            "Sample count must be between {MIN_SAMPLES} and {MAX_SAMPLES}, got {count}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn sequence_is_normalised() {
        let seq = normalize_protein_sequence("mvls pad\nktn").unwrap();
        assert_eq!(seq, "MVLSPADKTN");
    }

    #[test]
    fn empty_sequence_rejected() {
        assert_matches!(
            normalize_protein_sequence("  \n"),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn invalid_residue_reports_position() {
        let err = normalize_protein_sequence("MKJ").unwrap_err();
        assert!(err.to_string().contains("'J' at position 3"));
    }

    #[test]
    fn overlong_sequence_rejected() {
        let seq = "A".repeat(MAX_SEQUENCE_LEN + 1);
        assert_matches!(normalize_protein_sequence(&seq), Err(CoreError::Validation(_)));
    }

    #[test]
    fn smiles_rules() {
        assert!(validate_smiles("CC(=O)OC1=CC=CC=C1C(=O)O").is_ok());
        assert!(validate_smiles("").is_err());
        assert!(validate_smiles("CC O").is_err());
    }

    #[test]
    fn uniprot_accession_rules() {
        assert!(validate_uniprot_accession("P69905").is_ok());
        assert!(validate_uniprot_accession("A0A023GPI8").is_ok());
        assert!(validate_uniprot_accession("P6990").is_err());
        assert!(validate_uniprot_accession("P6990-").is_err());
    }

    #[test]
    fn sample_count_bounds() {
        assert!(validate_sample_count(1).is_ok());
        assert!(validate_sample_count(100).is_ok());
        assert!(validate_sample_count(0).is_err());
        assert!(validate_sample_count(101).is_err());
    }
}
