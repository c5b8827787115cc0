use std::path::PathBuf;

use bioinfer_core::models::{FoldingModel, MoleculeGenerationModel, ProteinGenerationModel};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "bioinfer", author, version, about = "Hosted biomolecular inference client", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the models served by the deployment.
    Models,

    /// Fetch the sequence of a UniProt entry.
    Uniprot {
        accession: String,
        /// Write the sequence as FASTA instead of printing it.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Predict the structure of a protein sequence.
    Fold {
        #[arg(long, default_value = "openfold")]
        model: FoldingModel,
        #[arg(long, required_unless_present = "uniprot", conflicts_with = "uniprot")]
        sequence: Option<String>,
        /// Fold the sequence of this UniProt entry.
        #[arg(long)]
        uniprot: Option<String>,
        #[arg(long)]
        out: PathBuf,
    },

    /// Generate novel protein sequences.
    GenerateProteins {
        #[arg(long, default_value = "protgpt2")]
        model: ProteinGenerationModel,
        #[arg(long, default_value_t = 10)]
        num_samples: u32,
        #[arg(long, default_value_t = 150)]
        max_length: u32,
        #[arg(long)]
        out: PathBuf,
    },

    /// Generate molecules around a seed SMILES.
    GenerateMolecules {
        #[arg(long, default_value = "moflow")]
        model: MoleculeGenerationModel,
        #[arg(long)]
        smiles: String,
        #[arg(long, default_value_t = 10)]
        num_samples: u32,
        #[arg(long)]
        out: PathBuf,
    },

    /// Dock a ligand into a receptor structure.
    Dock {
        /// Receptor in PDB format.
        #[arg(long)]
        protein: PathBuf,
        /// Ligand in SDF format, or a file holding a SMILES string.
        #[arg(long)]
        ligand: PathBuf,
        #[arg(long, default_value_t = 20)]
        num_poses: u32,
        #[arg(long)]
        out: PathBuf,
    },

    /// Show the current status of a submitted job.
    Status { id: String },

    /// Wait for one or more submitted jobs to finish.
    Wait {
        #[arg(required = true)]
        ids: Vec<String>,
        /// Write each payload to `<DIR>/<id>.json`.
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_accepts_sequence_or_uniprot() {
        let cli = Cli::try_parse_from([
            "bioinfer", "fold", "--model", "esmfold", "--sequence", "MKT", "--out", "out.pdb",
        ])
        .unwrap();
        match cli.command {
            Command::Fold { model, sequence, uniprot, out } => {
                assert_eq!(model, FoldingModel::EsmFold);
                assert_eq!(sequence.as_deref(), Some("MKT"));
                assert!(uniprot.is_none());
                assert_eq!(out, PathBuf::from("out.pdb"));
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::try_parse_from(["bioinfer", "fold", "--uniprot", "P69905", "--out", "x.pdb"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Command::Fold { model: FoldingModel::OpenFold, sequence: None, uniprot: Some(_), .. }
        ));
    }

    #[test]
    fn fold_requires_exactly_one_input() {
        assert!(Cli::try_parse_from(["bioinfer", "fold", "--out", "x.pdb"]).is_err());
        assert!(Cli::try_parse_from([
            "bioinfer", "fold", "--sequence", "MKT", "--uniprot", "P69905", "--out", "x.pdb",
        ])
        .is_err());
    }

    #[test]
    fn unknown_model_is_rejected() {
        assert!(Cli::try_parse_from([
            "bioinfer", "generate-molecules", "--model", "nope", "--smiles", "CCO", "--out", "m.csv",
        ])
        .is_err());
    }

    #[test]
    fn wait_takes_several_ids() {
        let cli = Cli::try_parse_from(["bioinfer", "wait", "a", "b", "--out-dir", "results"]).unwrap();
        match cli.command {
            Command::Wait { ids, out_dir } => {
                assert_eq!(ids, vec!["a", "b"]);
                assert_eq!(out_dir, Some(PathBuf::from("results")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(Cli::try_parse_from(["bioinfer", "wait"]).is_err());
    }

    #[test]
    fn generation_defaults() {
        let cli = Cli::try_parse_from(["bioinfer", "generate-proteins", "--out", "p.fasta"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::GenerateProteins {
                model: ProteinGenerationModel::ProtGpt2,
                num_samples: 10,
                max_length: 150,
                ..
            }
        ));
    }
}
