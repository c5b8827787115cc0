//! Minimal PDB inspection, enough to sanity-check structures returned
//! by folding jobs or supplied as docking receptors.

use crate::error::CoreError;

/// Column (0-based) of the chain identifier in ATOM/HETATM records.
const CHAIN_COLUMN: usize = 21;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdbSummary {
    pub atom_count: usize,
    pub hetatm_count: usize,
    /// Distinct chain identifiers in first-seen order.
    pub chains: Vec<char>,
    /// Number of MODEL records; `1` when the file has none.
    pub models: usize,
}

/// Whether `line` is an `ATOM` or `HETATM` coordinate record.
pub fn is_coordinate_record(line: &str) -> bool {
    is_atom_record(line) || is_hetatm_record(line)
}

fn is_atom_record(line: &str) -> bool {
    line.starts_with("ATOM ")
}

fn is_hetatm_record(line: &str) -> bool {
    line.starts_with("HETATM")
}

/// Summarise PDB text. Fails if it contains no coordinate records.
pub fn summarize(text: &str) -> Result<PdbSummary, CoreError> {
    let mut atom_count = 0;
    let mut hetatm_count = 0;
    let mut chains = Vec::new();
    let mut models = 0;

    for line in text.lines() {
        let is_atom = is_atom_record(line);
        let is_hetatm = is_hetatm_record(line);
        if line.starts_with("MODEL ") {
            models += 1;
        }
        if !(is_atom || is_hetatm) {
            continue;
        }

        if is_atom {
            atom_count += 1;
        } else {
            hetatm_count += 1;
        }

        if let Some(chain) = line.chars().nth(CHAIN_COLUMN) {
            if !chain.is_whitespace() && !chains.contains(&chain) {
                chains.push(chain);
            }
        }
    }

    if atom_count + hetatm_count == 0 {
        return Err(CoreError::Format {
            format: "PDB",
            message: "no ATOM or HETATM records".to_string(),
        });
    }

    Ok(PdbSummary {
        atom_count,
        hetatm_count,
        chains,
        models: models.max(1),
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const CRAMBIN_FRAGMENT: &str = "\
HEADER    PLANT PROTEIN                           30-APR-81   1CRN
ATOM      1  N   THR A   1      17.047  14.099   3.625  1.00 13.79           N
ATOM      2  CA  THR A   1      16.967  12.784   4.338  1.00 10.80           C
ATOM      3  N   THR B   2      15.685  12.755   5.133  1.00  9.19           N
HETATM    4  O   HOH C   3      14.000  12.000   5.000  1.00  9.00           O
END
";

    #[test]
    fn counts_records_and_chains() {
        let summary = summarize(CRAMBIN_FRAGMENT).unwrap();
        assert_eq!(summary.atom_count, 3);
        assert_eq!(summary.hetatm_count, 1);
        assert_eq!(summary.chains, vec!['A', 'B', 'C']);
        assert_eq!(summary.models, 1);
    }

    #[test]
    fn counts_models() {
        let text = format!("MODEL        1\n{CRAMBIN_FRAGMENT}ENDMDL\nMODEL        2\n{CRAMBIN_FRAGMENT}ENDMDL\n");
        assert_eq!(summarize(&text).unwrap().models, 2);
    }

    #[test]
    fn rejects_text_without_atoms() {
        assert_matches!(
            summarize("HEADER nothing here\nEND\n"),
            Err(CoreError::Format { format: "PDB", .. })
        );
    }

    #[test]
    fn coordinate_records_need_full_record_name() {
        assert!(is_coordinate_record("ATOM      1  N   THR A   1"));
        assert!(is_coordinate_record("HETATM    4  O   HOH C   3"));
        assert!(!is_coordinate_record("ATOMIC COORDINATES FOLLOW"));
        assert!(!is_coordinate_record("REMARK ATOM"));
    }
}
