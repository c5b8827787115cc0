//! Structure-data files: molfile blocks terminated by `$$$$`, each
//! optionally followed by `> <name>` data fields.

const RECORD_TERMINATOR: &str = "$$$$";

/// Split a multi-molecule SDF into records, without their terminators.
/// Whitespace-only records are dropped.
pub fn split_records(text: &str) -> Vec<String> {
    let mut records = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        if line.trim_end() == RECORD_TERMINATOR {
            if !current.trim().is_empty() {
                records.push(std::mem::take(&mut current));
            }
            current.clear();
            continue;
        }
        current.push_str(line);
        current.push('\n');
    }

    if !current.trim().is_empty() {
        records.push(current);
    }
    records
}

/// Join records into one SDF, terminating each with `$$$$`.
pub fn join_records<S: AsRef<str>>(records: &[S]) -> String {
    let mut out = String::new();
    for record in records {
        let body = strip_terminator(record.as_ref()).trim_end_matches(['\n', '\r']);
        out.push_str(body);
        out.push('\n');
        out.push_str(RECORD_TERMINATOR);
        out.push('\n');
    }
    out
}

/// Append a `> <name>` data field to a single record.
pub fn with_property(record: &str, name: &str, value: &str) -> String {
    let mut out = strip_terminator(record).trim_end_matches(['\n', '\r']).to_string();
    out.push('\n');
    out.push_str(&format!("> <{name}>\n{value}\n\n"));
    out
}

/// Data fields of a single record, in file order.
pub fn properties(record: &str) -> Vec<(String, String)> {
    let mut fields = Vec::new();
    let mut lines = record.lines().peekable();

    while let Some(line) = lines.next() {
        if !line.starts_with('>') {
            continue;
        }
        let Some(name) = field_name(line) else {
            continue;
        };

        let mut value_lines = Vec::new();
        while let Some(next) = lines.peek() {
            if next.trim().is_empty() || next.starts_with('>') {
                break;
            }
            value_lines.push(next.trim_end().to_string());
            lines.next();
        }
        fields.push((name.to_string(), value_lines.join("\n")));
    }
    fields
}

/// Value of the named data field, if present.
pub fn property(record: &str, name: &str) -> Option<String> {
    properties(record)
        .into_iter()
        .find(|(field, _)| field == name)
        .map(|(_, value)| value)
}

fn field_name(header: &str) -> Option<&str> {
    let start = header.find('<')? + 1;
    let end = start + header[start..].find('>')?;
    Some(&header[start..end])
}

fn strip_terminator(record: &str) -> &str {
    let trimmed = record.trim_end();
    trimmed.strip_suffix(RECORD_TERMINATOR).unwrap_or(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_POSES: &str = "pose-a\n  RDKit 3D\n\nM  END\n> <score>\n-7.2\n\n$$$$\npose-b\nM  END\n$$$$\n";

    #[test]
    fn splits_on_terminator() {
        let records = split_records(TWO_POSES);
        assert_eq!(records.len(), 2);
        assert!(records[0].starts_with("pose-a"));
        assert!(!records[0].contains("$$$$"));
        assert_eq!(records[1], "pose-b\nM  END\n");
    }

    #[test]
    fn split_ignores_trailing_whitespace_record() {
        let records = split_records("a\nM  END\n$$$$\n\n  \n");
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn split_keeps_unterminated_last_record() {
        let records = split_records("a\nM  END\n$$$$\nb\nM  END\n");
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn join_terminates_every_record() {
        let joined = join_records(&["a\nM  END\n", "b\nM  END\n$$$$\n"]);
        assert_eq!(joined, "a\nM  END\n$$$$\nb\nM  END\n$$$$\n");
    }

    #[test]
    fn reads_data_fields() {
        let records = split_records(TWO_POSES);
        assert_eq!(property(&records[0], "score").as_deref(), Some("-7.2"));
        assert!(properties(&records[1]).is_empty());
    }

    #[test]
    fn appended_property_is_readable() {
        let record = with_property("mol\nM  END\n", "confidence", "0.91");
        assert_eq!(property(&record, "confidence").as_deref(), Some("0.91"));
    }
}
