//! The block-record text grammar shared by every configuration file.
//!
//! Files are plain text with one `key = value` pair per line. Keys are
//! trimmed and lowercased; values are trimmed and split from the key at the
//! first `=`. A record is the run of lines that starts at a `version` line
//! and stops just before the next `end` line:
//!
//! ```text
//! version = 'Hereld_2015-07-27'
//! name    = 'Substation 12'
//! latlong = 30.0 -85.0
//! end
//! ```
//!
//! Lines outside a record are ignored. A `version` line inside an open
//! record restarts it. An `end` with no open record, or a record still open
//! at end of file, is a [`BlockError`].

use tracing::warn;

/// Format errors in block-structured text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlockError {
    /// An `end` line appeared with no preceding `version` line.
    #[error("line {line}: 'end' without a preceding 'version' (invalid config file format)")]
    MissingVersion {
        /// 1-based line number of the `end` line.
        line: usize,
    },

    /// A record was opened but never closed.
    #[error("record starting at line {start} has no 'end' line")]
    Unterminated {
        /// 1-based line number of the opening `version` line.
        start: usize,
    },

    /// The text contains no record at all.
    #[error("no 'version' ... 'end' record found")]
    Empty,
}

/// One `key = value` line inside a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// 1-based line number in the source text.
    pub line: usize,
    /// Lowercased, trimmed key.
    pub key: String,
    /// Trimmed value; empty when the line has no `=`.
    pub value: String,
}

/// A `version` .. `end` record, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    /// 1-based line number of the `version` line.
    pub start_line: usize,
    /// Entries from the `version` line up to, not including, `end`.
    pub entries: Vec<Entry>,
}

impl Record {
    /// Iterate entries in file order.
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }
}

/// Split one line into its lowercased key and trimmed value.
pub fn split_line(line: &str) -> (String, String) {
    match line.split_once('=') {
        Some((key, value)) => (key.trim().to_lowercase(), value.trim().to_owned()),
        None => (line.trim().to_lowercase(), String::new()),
    }
}

/// Strip one layer of surrounding single or double quotes.
pub fn unquote(value: &str) -> &str {
    let trimmed = value.trim();
    for quote in ['\'', '"'] {
        if let Some(inner) = trimmed
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner.trim();
        }
    }
    trimmed.trim_matches(|c| c == '\'' || c == '"')
}

/// Parse every record in `text`.
pub fn parse_records(text: &str) -> Result<Vec<Record>, BlockError> {
    let mut records = Vec::new();
    let mut open: Option<Record> = None;

    for (index, raw) in text.lines().enumerate() {
        let line = index.saturating_add(1);
        let (key, value) = split_line(raw);
        match key.as_str() {
            "version" => {
                if let Some(abandoned) = open.take() {
                    warn!(
                        start = abandoned.start_line,
                        restart = line,
                        "record restarted by a new 'version' line before 'end'"
                    );
                }
                open = Some(Record {
                    start_line: line,
                    entries: vec![Entry { line, key, value }],
                });
            }
            "end" => {
                let record = open.take().ok_or(BlockError::MissingVersion { line })?;
                records.push(record);
            }
            _ => {
                if let Some(record) = open.as_mut() {
                    record.entries.push(Entry { line, key, value });
                }
            }
        }
    }

    if let Some(record) = open {
        return Err(BlockError::Unterminated {
            start: record.start_line,
        });
    }
    Ok(records)
}

/// Parse the first record in `text`, ignoring anything after its `end`.
///
/// Scenario files hold exactly one top-level record.
pub fn parse_first_record(text: &str) -> Result<Record, BlockError> {
    let mut open: Option<Record> = None;

    for (index, raw) in text.lines().enumerate() {
        let line = index.saturating_add(1);
        let (key, value) = split_line(raw);
        match key.as_str() {
            "version" => {
                open = Some(Record {
                    start_line: line,
                    entries: vec![Entry { line, key, value }],
                });
            }
            "end" => return open.ok_or(BlockError::MissingVersion { line }),
            _ => {
                if let Some(record) = open.as_mut() {
                    record.entries.push(Entry { line, key, value });
                }
            }
        }
    }

    match open {
        Some(record) => Err(BlockError::Unterminated {
            start: record.start_line,
        }),
        None => Err(BlockError::Empty),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Value of the last entry with `key`.
    fn last<'a>(record: &'a Record, key: &str) -> Option<&'a str> {
        record
            .entries
            .iter()
            .rev()
            .find(|e| e.key == key)
            .map(|e| e.value.as_str())
    }

    #[test]
    fn split_line_lowercases_key_and_trims_value() {
        let (k, v) = split_line("  Asset Class =  substation  ");
        assert_eq!(k, "asset class");
        assert_eq!(v, "substation");
    }

    #[test]
    fn split_line_keeps_equals_in_value() {
        let (k, v) = split_line("description = a = b");
        assert_eq!(k, "description");
        assert_eq!(v, "a = b");
    }

    #[test]
    fn split_line_without_equals_has_empty_value() {
        let (k, v) = split_line("END");
        assert_eq!(k, "end");
        assert!(v.is_empty());
    }

    #[test]
    fn unquote_strips_one_layer() {
        assert_eq!(unquote("'data/assets.txt'"), "data/assets.txt");
        assert_eq!(unquote("\"x\""), "x");
        assert_eq!(unquote("plain"), "plain");
    }

    #[test]
    fn records_exclude_end_and_include_version() {
        let text = "junk\nversion = 1\nname = a\nend\nversion = 2\nname = b\nend\n";
        let records = parse_records(text).unwrap_or_default();
        assert_eq!(records.len(), 2);
        let first = records.first().cloned().unwrap_or_default();
        assert_eq!(first.start_line, 2);
        assert_eq!(first.entries.len(), 2);
        assert_eq!(last(&first, "name"), Some("a"));
        assert!(first.iter().all(|e| e.key != "end"));
    }

    #[test]
    fn repeated_key_last_occurrence_wins() {
        let text = "version = 1\nname = first\nname = second\nend\n";
        let record = parse_first_record(text).unwrap_or_default();
        assert_eq!(last(&record, "name"), Some("second"));
    }

    #[test]
    fn end_without_version_is_a_format_error() {
        let err = parse_records("name = a\nend\n");
        assert_eq!(err, Err(BlockError::MissingVersion { line: 2 }));
        let err = parse_first_record("end\n");
        assert_eq!(err, Err(BlockError::MissingVersion { line: 1 }));
    }

    #[test]
    fn unterminated_record_is_a_format_error() {
        let err = parse_records("version = 1\nname = a\n");
        assert_eq!(err, Err(BlockError::Unterminated { start: 1 }));
    }

    #[test]
    fn empty_text_has_no_first_record() {
        assert_eq!(parse_first_record(""), Err(BlockError::Empty));
        assert_eq!(parse_records(""), Ok(Vec::new()));
    }

    #[test]
    fn second_version_restarts_record() {
        let text = "version = 1\nname = lost\nversion = 2\nname = kept\nend\n";
        let records = parse_records(text).unwrap_or_default();
        assert_eq!(records.len(), 1);
        let record = records.first().cloned().unwrap_or_default();
        assert_eq!(record.start_line, 3);
        assert_eq!(last(&record, "name"), Some("kept"));
    }

    #[test]
    fn first_record_ignores_trailing_text() {
        let text = "version = 1\nname = s\nend\nversion = 2\n";
        let record = parse_first_record(text).unwrap_or_default();
        assert_eq!(last(&record, "version"), Some("1"));
    }
}
