//! Text form of a store dump.
//!
//! One line per key-value pair: the key, a single tab, then the stored value
//! exactly as persisted. Whitespace around a line is ignored, as are blank
//! lines; any other line without a tab separating a non-empty key from a
//! non-empty value is malformed.

use std::io::{BufRead, Write};

use crate::db::KeyValue;
use crate::error::{NoteError, Result};

/// A parsed dump line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpEntry {
    pub key: String,
    pub value: String,
    /// 1-based line number in the source.
    pub line: usize,
}

/// Writes `pairs` in dump format and returns how many lines were written.
///
/// Non-UTF-8 bytes are replaced, since the format is text.
pub fn write_dump<W: Write>(pairs: &[KeyValue], mut writer: W) -> Result<usize> {
    for (key, value) in pairs {
        writeln!(
            writer,
            "{}\t{}",
            String::from_utf8_lossy(key),
            String::from_utf8_lossy(value)
        )?;
    }
    writer.flush()?;
    Ok(pairs.len())
}

/// Streams [`DumpEntry`] values out of a dump.
///
/// # Examples
///
/// ```
/// use cnote::backup::DumpReader;
///
/// let text = "config\t{}\n\nnote_a\t{\"x\":1}\n";
/// let entries: Vec<_> = DumpReader::new(text.as_bytes())
///     .collect::<cnote::Result<_>>()
///     .unwrap();
/// assert_eq!(entries.len(), 2);
/// assert_eq!(entries[1].key, "note_a");
/// assert_eq!(entries[1].line, 3);
/// ```
pub struct DumpReader<R> {
    reader: R,
    line: usize,
    buf: String,
}

impl<R: BufRead> DumpReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buf: String::new(),
        }
    }
}

impl<R: BufRead> Iterator for DumpReader<R> {
    type Item = Result<DumpEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(e.into())),
            }
            self.line += 1;

            let text = self.buf.trim_start();
            if text.is_empty() {
                continue;
            }
            return Some(parse_line(text, self.line));
        }
    }
}

/// Reads a whole dump, failing on the first malformed line.
pub fn parse_dump<R: BufRead>(reader: R) -> Result<Vec<DumpEntry>> {
    DumpReader::new(reader).collect()
}

fn parse_line(text: &str, line: usize) -> Result<DumpEntry> {
    let (key, value) = text.split_once('\t').ok_or(NoteError::MalformedDump {
        line,
        reason: "missing tab between key and value",
    })?;
    let value = value.trim_end();
    if key.is_empty() {
        return Err(NoteError::MalformedDump {
            line,
            reason: "empty key",
        });
    }
    if value.is_empty() {
        return Err(NoteError::MalformedDump {
            line,
            reason: "empty value",
        });
    }
    Ok(DumpEntry {
        key: key.to_string(),
        value: value.to_string(),
        line,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_dump_emits_tab_separated_lines() {
        let pairs = vec![
            (b"config".to_vec(), b"{}".to_vec()),
            (b"note_a".to_vec(), b"{\"sum\":0}".to_vec()),
        ];
        let mut out = Vec::new();
        let written = write_dump(&pairs, &mut out).unwrap();

        assert_eq!(written, 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "config\t{}\nnote_a\t{\"sum\":0}\n"
        );
    }

    #[test]
    fn parse_dump_accepts_crlf_and_final_line_without_newline() {
        let entries = parse_dump("a\t1\r\nb\t2".as_bytes()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].value, "1");
        assert_eq!(entries[1].key, "b");
        assert_eq!(entries[1].value, "2");
    }

    #[test]
    fn parse_dump_reports_line_of_missing_tab() {
        let err = parse_dump("a\t1\nbroken line\nc\t3\n".as_bytes()).unwrap_err();
        assert!(matches!(err, NoteError::MalformedDump { line: 2, .. }));
    }

    #[test]
    fn parse_dump_rejects_empty_value() {
        let err = parse_dump("a\t\n".as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            NoteError::MalformedDump {
                line: 1,
                reason: "empty value"
            }
        ));
    }

    #[test]
    fn parse_dump_trims_whitespace_around_lines() {
        let entries = parse_dump("  a\t{\"x\":1}  \t\n   \nb\t2 \r\n".as_bytes()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].key, "a");
        assert_eq!(entries[0].value, "{\"x\":1}");
        assert_eq!(entries[1].value, "2");
        assert_eq!(entries[1].line, 3);

        let err = parse_dump("a\t   \n".as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            NoteError::MalformedDump {
                line: 1,
                reason: "empty value"
            }
        ));
    }

    #[test]
    fn value_keeps_everything_after_first_tab() {
        let entries = parse_dump("k\tv\twith tab\n".as_bytes()).unwrap();
        assert_eq!(entries[0].value, "v\twith tab");
    }
}
