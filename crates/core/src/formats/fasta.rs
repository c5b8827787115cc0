//! FASTA sequence records.

use std::io::{self, Write};

use crate::error::CoreError;

/// Residues per line when writing.
pub const LINE_WIDTH: usize = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    pub id: String,
    pub description: Option<String>,
    pub sequence: String,
}

impl FastaRecord {
    pub fn new(id: impl Into<String>, sequence: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: None,
            sequence: sequence.into(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Parse multi-record FASTA text.
///
/// Blank lines are ignored. Sequence lines are concatenated with
/// surrounding whitespace removed.
pub fn parse(text: &str) -> Result<Vec<FastaRecord>, CoreError> {
    let mut records: Vec<FastaRecord> = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(header) = line.strip_prefix('>') {
            let mut parts = header.trim().splitn(2, char::is_whitespace);
            let id = parts.next().unwrap_or_default();
            if id.is_empty() {
                return Err(CoreError::Format {
                    format: "FASTA",
                    message: format!("empty record identifier on line {}", line_no + 1),
                });
            }
            let description = parts
                .next()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string);
            records.push(FastaRecord {
                id: id.to_string(),
                description,
                sequence: String::new(),
            });
            continue;
        }

        match records.last_mut() {
            Some(record) => record.sequence.push_str(line),
            None => {
                return Err(CoreError::Format {
                    format: "FASTA",
                    message: format!("sequence data before first header on line {}", line_no + 1),
                })
            }
        }
    }

    Ok(records)
}

/// Write records, wrapping sequences at [`LINE_WIDTH`] residues.
pub fn write<W: Write>(records: &[FastaRecord], mut out: W) -> io::Result<()> {
    out.write_all(to_string(records).as_bytes())
}

pub fn to_string(records: &[FastaRecord]) -> String {
    let mut out = String::new();
    for record in records {
        out.push('>');
        out.push_str(&record.id);
        if let Some(description) = &record.description {
            out.push(' ');
            out.push_str(description);
        }
        out.push('\n');

        let mut residues = record.sequence.chars().peekable();
        while residues.peek().is_some() {
            out.extend(residues.by_ref().take(LINE_WIDTH));
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parses_multiple_records() {
        let text = ">sp|P69905|HBA_HUMAN Hemoglobin subunit alpha\nMVLSPADKTN\nVKAAWGKVGA\n\n>seq2\nACDE\n";
        let records = parse(text).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "sp|P69905|HBA_HUMAN");
        assert_eq!(
            records[0].description.as_deref(),
            Some("Hemoglobin subunit alpha")
        );
        assert_eq!(records[0].sequence, "MVLSPADKTNVKAAWGKVGA");
        assert_eq!(records[1].description, None);
        assert_eq!(records[1].sequence, "ACDE");
    }

    #[test]
    fn rejects_sequence_before_header() {
        assert_matches!(parse("ACDE\n>x\nAC\n"), Err(CoreError::Format { .. }));
    }

    #[test]
    fn rejects_empty_identifier() {
        assert_matches!(parse(">\nACDE\n"), Err(CoreError::Format { .. }));
    }

    #[test]
    fn wraps_long_sequences() {
        let record = FastaRecord::new("long", "A".repeat(130)).with_description("test");
        let text = to_string(&[record]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], ">long test");
        assert_eq!(lines[1].len(), 60);
        assert_eq!(lines[2].len(), 60);
        assert_eq!(lines[3].len(), 10);
    }

    #[test]
    fn written_text_parses_back() {
        let records = vec![FastaRecord::new("a", "MKT"), FastaRecord::new("b", "GGH")];
        assert_eq!(parse(&to_string(&records)).unwrap(), records);
    }

    #[test]
    fn writer_output_matches_string_output() {
        let records = vec![FastaRecord::new("exact", "C".repeat(120))];
        let mut buf = Vec::new();
        write(&records, &mut buf).unwrap();

        let text = to_string(&records);
        assert_eq!(String::from_utf8(buf).unwrap(), text);
        // A sequence filling whole lines gets no trailing blank line.
        assert_eq!(text.lines().count(), 3);
        assert!(!text.ends_with("\n\n"));
    }
}
