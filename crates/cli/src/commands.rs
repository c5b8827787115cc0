use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use bioinfer_client::InferenceClient;
use bioinfer_core::formats::{csv, fasta, pdb, sdf};
use bioinfer_core::models::{DockingRequest, MoleculeGenerationRequest, ProteinGenerationRequest};
use bioinfer_core::task::{TaskOutcome, TaskResponse};
use bioinfer_core::types::CorrelationId;

use crate::cli::Command;

pub async fn run(command: Command, client: &InferenceClient) -> anyhow::Result<()> {
    match command {
        Command::Models => {
            for name in client.api().list_models().await? {
                println!("{name}");
            }
        }

        Command::Uniprot { accession, out } => {
            let sequence = client.api().uniprot_sequence(&accession).await?;
            let records = [fasta::FastaRecord::new(&accession, sequence)];
            match out {
                Some(path) => {
                    let file = create_output(&path)?;
                    fasta::write(&records, file)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    tracing::info!(path = %path.display(), "Wrote sequence");
                }
                None => print!("{}", fasta::to_string(&records)),
            }
        }

        Command::Fold { model, sequence, uniprot, out } => {
            let sequence = match (sequence, uniprot) {
                (Some(sequence), _) => sequence,
                (None, Some(accession)) => client.api().uniprot_sequence(&accession).await?,
                (None, None) => bail!("Either --sequence or --uniprot is required"),
            };

            let result = client.fold_and_wait(model, &sequence).await?;
            for (path, structure) in structure_paths(&out, result.pdbs.len())
                .into_iter()
                .zip(&result.pdbs)
            {
                write_text(&path, structure)?;
                match pdb::summarize(structure) {
                    Ok(summary) => tracing::info!(
                        path = %path.display(),
                        atoms = summary.atom_count,
                        chains = summary.chains.len(),
                        "Wrote structure",
                    ),
                    Err(err) => tracing::warn!(
                        path = %path.display(),
                        error = %err,
                        "Wrote unparseable structure",
                    ),
                }
            }
        }

        Command::GenerateProteins { model, num_samples, max_length, out } => {
            let request = ProteinGenerationRequest {
                num_return_sequences: num_samples,
                max_length,
                ..Default::default()
            };
            let result = client.generate_proteins_and_wait(model, &request).await?;
            let records = sequence_records(&result.generated_sequences, &result.perplexities);

            let file = create_output(&out)?;
            fasta::write(&records, file)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            tracing::info!(path = %out.display(), count = records.len(), "Wrote sequences");
        }

        Command::GenerateMolecules { model, smiles, num_samples, out } => {
            let request = MoleculeGenerationRequest::new(smiles, num_samples);
            let result = client.generate_molecules_and_wait(model, &request).await?;
            let molecules = result.ranked();

            let file = create_output(&out)?;
            csv::write_molecules(&molecules, file)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            tracing::info!(path = %out.display(), count = molecules.len(), "Wrote molecules");
        }

        Command::Dock { protein, ligand, num_poses, out } => {
            let protein_pdb = read_text(&protein)?;
            let ligand = read_text(&ligand)?;
            let mut request = DockingRequest::new(protein_pdb, ligand);
            request.poses_to_generate = num_poses;

            let result = client.dock_and_wait(&request).await?;
            let poses = result.to_sdf();
            write_text(&out, &poses)?;
            tracing::info!(
                path = %out.display(),
                poses = sdf::split_records(&poses).len(),
                best_pose = ?result.best_pose(),
                "Wrote docked poses",
            );
        }

        Command::Status { id } => {
            let record = client.api().task_status(&CorrelationId::new(id)).await?;
            println!("{}", record.status);
            if let Some(message) = &record.error_message {
                println!("{message}");
            }
            if let Some(payload) = record.payload() {
                println!("{}", pretty_payload(&payload));
            }
        }

        Command::Wait { ids, out_dir } => {
            let total = ids.len();
            let results = client.batch_poller().wait_all(ids).await;
            let mut unfinished = 0;

            for (id, result) in results {
                match result {
                    Ok(TaskOutcome::Completed(payload)) => match &out_dir {
                        Some(dir) => {
                            let path = payload_path(dir, &id)?;
                            write_text(&path, &pretty_payload(&payload))?;
                            tracing::info!(correlation_id = %id, path = %path.display(), "Task completed");
                        }
                        None => println!("{id}\t{}", payload.as_str()),
                    },
                    Ok(TaskOutcome::Failed { message, .. }) => {
                        unfinished += 1;
                        tracing::error!(
                            correlation_id = %id,
                            detail = message.as_deref().unwrap_or("no details"),
                            "Task failed",
                        );
                    }
                    Err(err) => {
                        unfinished += 1;
                        tracing::error!(correlation_id = %id, error = %err, "Task did not complete");
                    }
                }
            }

            if unfinished > 0 {
                bail!("{unfinished} of {total} tasks did not complete");
            }
        }
    }

    Ok(())
}

/// FASTA records for generated sequences, numbered from 1, tagged with
/// their perplexity when the service reported one.
fn sequence_records(sequences: &[String], perplexities: &[f64]) -> Vec<fasta::FastaRecord> {
    sequences
        .iter()
        .enumerate()
        .map(|(i, sequence)| {
            let record = fasta::FastaRecord::new(format!("generated_{}", i + 1), sequence);
            match perplexities.get(i) {
                Some(perplexity) => record.with_description(format!("perplexity={perplexity:.4}")),
                None => record,
            }
        })
        .collect()
}

/// Output paths for `count` structures: `out` itself for the first, then
/// `<stem>_<n>.<ext>` for the rest.
fn structure_paths(out: &Path, count: usize) -> Vec<PathBuf> {
    let stem = out
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "structure".to_string());
    let extension = out
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "pdb".to_string());

    (0..count)
        .map(|i| match i {
            0 => out.to_path_buf(),
            n => out.with_file_name(format!("{stem}_{}.{extension}", n + 1)),
        })
        .collect()
}

/// `<dir>/<id>.json`, refusing ids that would leave `dir`.
fn payload_path(dir: &Path, id: &CorrelationId) -> anyhow::Result<PathBuf> {
    let id = id.as_str();
    let unsafe_id = id.is_empty()
        || id.starts_with('.')
        || id.chars().any(|c| matches!(c, '/' | '\\' | ':') || c.is_control());
    if unsafe_id {
        bail!("Task id '{id}' cannot be used as a file name");
    }
    Ok(dir.join(format!("{id}.json")))
}

/// JSON payloads pretty-printed; anything else unchanged.
fn pretty_payload(payload: &TaskResponse) -> String {
    serde_json::from_str::<serde_json::Value>(payload.as_str())
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| payload.as_str().to_string())
}

fn read_text(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn create_output(path: &Path) -> anyhow::Result<fs::File> {
    ensure_parent(path)?;
    fs::File::create(path).with_context(|| format!("Failed to create {}", path.display()))
}

fn write_text(path: &Path, contents: &str) -> anyhow::Result<()> {
    ensure_parent(path)?;
    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extra_structures_get_numbered_paths() {
        let paths = structure_paths(Path::new("out/model.pdb"), 3);
        assert_eq!(
            paths,
            vec![
                PathBuf::from("out/model.pdb"),
                PathBuf::from("out/model_2.pdb"),
                PathBuf::from("out/model_3.pdb"),
            ]
        );
        assert!(structure_paths(Path::new("x.pdb"), 0).is_empty());
    }

    #[test]
    fn sequence_records_carry_perplexity() {
        let sequences = vec!["MKT".to_string(), "ACD".to_string()];
        let records = sequence_records(&sequences, &[1.5]);
        assert_eq!(records[0].id, "generated_1");
        assert_eq!(records[0].description.as_deref(), Some("perplexity=1.5000"));
        assert_eq!(records[1].id, "generated_2");
        assert!(records[1].description.is_none());
    }

    #[test]
    fn payload_files_stay_inside_output_dir() {
        let dir = Path::new("results");
        assert_eq!(
            payload_path(dir, &CorrelationId::new("abc123")).unwrap(),
            PathBuf::from("results/abc123.json")
        );
        for id in ["../escape", "a/b", "..", "", ".hidden", "c:\\x", "a\\b"] {
            assert!(
                payload_path(dir, &CorrelationId::new(id)).is_err(),
                "{id:?} should be rejected"
            );
        }
    }

    #[test]
    fn json_payloads_are_pretty_printed() {
        let json = pretty_payload(&TaskResponse::new(r#"{"result":42}"#));
        assert_eq!(json, "{\n  \"result\": 42\n}");
        assert_eq!(pretty_payload(&TaskResponse::new("not json")), "not json");
    }

    #[test]
    fn outputs_create_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/poses.sdf");

        write_text(&path, "pose\n$$$$\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "pose\n$$$$\n");
    }

    #[test]
    fn molecule_csv_is_written_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("molecules.csv");
        let molecules = vec![bioinfer_core::models::GeneratedMolecule {
            smiles: "CCO".into(),
            score: Some(0.25),
        }];

        let file = create_output(&path).unwrap();
        csv::write_molecules(&molecules, file).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "smiles,score\nCCO,0.25\n");
    }
}
