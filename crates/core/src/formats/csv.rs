//! CSV output for generated molecules.

use std::io::Write;

use crate::models::GeneratedMolecule;

/// Write molecules as `smiles,score` rows with a header. Missing scores
/// are written as empty fields.
pub fn write_molecules<W: Write>(
    molecules: &[GeneratedMolecule],
    out: W,
) -> Result<(), ::csv::Error> {
    let mut writer = ::csv::Writer::from_writer(out);
    for molecule in molecules {
        writer.serialize(molecule)?;
    }
    writer.flush()?;
    Ok(())
}
