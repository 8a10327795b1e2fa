use log::debug;
use std::collections::BTreeMap;
use std::io::{self, Read, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CsvError {
    #[error("I/O operation failed: {0}")]
    Io(#[from] io::Error),
    #[error("unterminated quoted field starting on line {0}")]
    UnterminatedQuote(usize),
    #[error("unexpected character '{character}' after closing quote on line {line}")]
    TextAfterQuote { character: char, line: usize },
    #[error("the table has no header row")]
    NoHeader,
}

/// one data row, header -> field
pub type Record = BTreeMap<String, String>;

/// Splits CSV text into rows of fields. Fields may be quoted with `"`; inside quotes
/// `""` is a literal quote and separators and line breaks are kept. Both LF and CRLF end
/// a row. Rows that are completely empty are dropped.
pub fn parse_csv(text: &str) -> Result<Vec<Vec<String>>, CsvError> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut after_quote = false;
    let mut line = 1;
    let mut quote_line = 1;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => {
                    in_quotes = false;
                    after_quote = true;
                }
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }
        match c {
            ',' => {
                row.push(std::mem::take(&mut field));
                after_quote = false;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                row.push(std::mem::take(&mut field));
                if !(row.len() == 1 && row[0].is_empty()) {
                    rows.push(std::mem::take(&mut row));
                } else {
                    row.clear();
                }
                after_quote = false;
                line += 1;
            }
            '"' if field.is_empty() && !after_quote => {
                in_quotes = true;
                quote_line = line;
            }
            _ if after_quote => {
                return Err(CsvError::TextAfterQuote { character: c, line });
            }
            _ => field.push(c),
        }
    }
    if in_quotes {
        return Err(CsvError::UnterminatedQuote(quote_line));
    }
    if !field.is_empty() || !row.is_empty() || after_quote {
        row.push(field);
        rows.push(row);
    }
    Ok(rows)
}

/// Reads a table whose first row holds the headers. Extra fields beyond the header are
/// dropped; short rows simply lack the trailing keys.
pub fn read_records<R: Read>(mut reader: R) -> Result<Vec<Record>, CsvError> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    let mut rows = parse_csv(&text)?.into_iter();
    let headers: Vec<String> = rows
        .next()
        .ok_or(CsvError::NoHeader)?
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect();
    let mut records = Vec::new();
    for (i, row) in rows.enumerate() {
        if row.len() > headers.len() {
            debug!(
                "row {} has {} fields, {} headers; extra fields ignored",
                i + 1,
                row.len(),
                headers.len()
            );
        }
        let record: Record = headers.iter().cloned().zip(row).collect();
        records.push(record);
    }
    Ok(records)
}

/// quotes a field when it contains a separator, a quote or a line break
pub fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

pub fn write_row<W: Write, S: AsRef<str>>(writer: &mut W, fields: &[S]) -> io::Result<()> {
    let line: Vec<String> = fields.iter().map(|f| escape_field(f.as_ref())).collect();
    writeln!(writer, "{}", line.join(","))
}
