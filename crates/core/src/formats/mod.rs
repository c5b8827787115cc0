//! Readers and writers for the file formats the inference services
//! consume and produce.

pub mod csv;
pub mod fasta;
pub mod pdb;
pub mod sdf;
