//! CSV and ARFF rendering of export tables.
use crate::Descriptors::descriptor::arff_quote;
use crate::Export::table::{ExportError, ExportTable};
use crate::Utils::csv_io::write_row;
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Header row, then one line per row. Missing values are empty fields; fields holding a
/// separator, a quote or a line break are quoted with inner quotes doubled.
pub fn write_csv<W: Write>(table: &ExportTable, writer: &mut W) -> Result<(), ExportError> {
    write_row(writer, &table.headers())?;
    for row in &table.rows {
        let fields: Vec<&str> = table
            .columns
            .iter()
            .map(|c| row.get(&c.header).map(String::as_str).unwrap_or(""))
            .collect();
        write_row(writer, &fields)?;
    }
    Ok(())
}

/// One ARFF data field: `?` for a missing or empty value, otherwise quoted by the same rule
/// as nominal values in the attribute headers.
pub fn arff_value(value: Option<&str>, always_quote: bool) -> String {
    match value {
        None | Some("") => "?".to_string(),
        Some(v) => arff_quote(v, always_quote),
    }
}

/// `@relation`, the attribute declarations in column order, then `@data` and the rows.
pub fn write_arff<W: Write>(
    table: &ExportTable,
    relation: &str,
    writer: &mut W,
) -> Result<(), ExportError> {
    writeln!(writer, "@relation {}", arff_value(Some(relation), false))?;
    writeln!(writer)?;
    for column in &table.columns {
        writeln!(writer, "{}", column.arff_attribute())?;
    }
    writeln!(writer)?;
    writeln!(writer, "@data")?;
    for row in &table.rows {
        let fields: Vec<String> = table
            .columns
            .iter()
            .map(|c| arff_value(row.get(&c.header).map(String::as_str), c.always_quote))
            .collect();
        writeln!(writer, "{}", fields.join(","))?;
    }
    Ok(())
}

pub fn save_csv(table: &ExportTable, path: &Path) -> Result<(), ExportError> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_csv(table, &mut writer)?;
    writer.flush()?;
    info!("{} rows written to {}", table.len(), path.display());
    Ok(())
}

pub fn save_arff(table: &ExportTable, relation: &str, path: &Path) -> Result<(), ExportError> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_arff(table, relation, &mut writer)?;
    writer.flush()?;
    info!("{} rows written to {}", table.len(), path.display());
    Ok(())
}
