//! Minimal RFC 4180 reader for the training table.
//!
//! Quoted fields may contain delimiters, doubled quotes and line breaks, which the
//! free-text metadata columns (overviews, cast lists) rely on.

use std::path::Path;

use super::DatasetError;

/// Header plus string cells; every row has the header's width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    /// Position of a named column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

/// Read and parse a CSV file.
pub fn read_csv(path: &Path) -> Result<CsvTable, DatasetError> {
    let text = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_csv(&text)
}

/// Parse CSV text whose first record is the header.
pub fn parse_csv(text: &str) -> Result<CsvTable, DatasetError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut records = parse_records(text)?.into_iter();
    let Some((_, headers)) = records.next() else {
        return Err(DatasetError::Csv {
            line: 1,
            message: "missing header row".to_string(),
        });
    };
    let mut rows = Vec::new();
    for (line, record) in records {
        if record.len() != headers.len() {
            return Err(DatasetError::RaggedRow {
                line,
                found: record.len(),
                expected: headers.len(),
            });
        }
        rows.push(record);
    }
    Ok(CsvTable { headers, rows })
}

/// Split text into records, each tagged with the line it starts on.
fn parse_records(text: &str) -> Result<Vec<(usize, Vec<String>)>, DatasetError> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut field_started = false;
    let mut line = 1usize;
    let mut record_line = 1usize;
    let mut quote_line = 1usize;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' if !field_started => {
                in_quotes = true;
                field_started = true;
                quote_line = line;
            }
            ',' => {
                record.push(std::mem::take(&mut field));
                field_started = false;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                record.push(std::mem::take(&mut field));
                field_started = false;
                if !(record.len() == 1 && record[0].is_empty()) {
                    records.push((record_line, std::mem::take(&mut record)));
                } else {
                    record.clear();
                }
                line += 1;
                record_line = line;
            }
            _ => {
                field.push(c);
                field_started = true;
            }
        }
    }
    if in_quotes {
        return Err(DatasetError::Csv {
            line: quote_line,
            message: "unterminated quoted field".to_string(),
        });
    }
    if field_started || !record.is_empty() {
        record.push(field);
        records.push((record_line, record));
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quotes_and_embedded_newlines() {
        let text = "Title,Overview,budget\r\n\"Heat\",\"Cops, robbers\nand \"\"heat\"\"\",60000000\nAlien,Space,11000000\n";
        let table = parse_csv(text).unwrap();
        assert_eq!(table.headers, vec!["Title", "Overview", "budget"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][1], "Cops, robbers\nand \"heat\"");
        assert_eq!(table.rows[1], vec!["Alien", "Space", "11000000"]);
        assert_eq!(table.column_index("budget"), Some(2));
    }

    #[test]
    fn keeps_empty_cells_and_skips_blank_lines() {
        let table = parse_csv("\u{feff}a,b\n1,\n\n,2").unwrap();
        assert_eq!(table.headers, vec!["a", "b"]);
        assert_eq!(table.rows, vec![vec!["1", ""], vec!["", "2"]]);
    }

    #[test]
    fn ragged_rows_report_their_line() {
        let err = parse_csv("a,b\n1,2\n3\n").unwrap_err();
        assert!(matches!(
            err,
            DatasetError::RaggedRow {
                line: 3,
                found: 1,
                expected: 2
            }
        ));
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        let err = parse_csv("a\n\"open").unwrap_err();
        assert!(matches!(err, DatasetError::Csv { line: 2, .. }));
    }
}
