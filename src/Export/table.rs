//! # Export tables
//!
//! Compounds and reactions are flattened into an `ExportTable` before they are written:
//! an ordered list of columns (each knowing its ARFF attribute type) and one row per
//! record mapping a column header to the raw text of the value. A header missing from a
//! row is a missing value. CSV and ARFF writers share the same table, so both formats always
//! agree on the columns and their order.
//!
//! Compound columns: `abbrev, name, CSID, INCHI, smiles, formula, custom`, then
//! `chemicalClass_1..m` where `m` is the largest class count of any compound in the guide.
//! Reaction columns: `reference, labGroup, valid`, then `compound_i, compound_i_role,
//! compound_i_amount` for every reactant slot. Expanded tables append one column per
//! descriptor with a value on the exported records.
use crate::Compounds::compound::Compound;
use crate::Compounds::compound_guide::CompoundGuide;
use crate::Compounds::reaction::{PerformedReaction, ReactionLog};
use crate::Descriptors::descriptor::{Descriptor, DescriptorError, DescriptorKind, arff_quote};
use crate::Descriptors::values::MolDescriptorValue;
use log::debug;
use std::collections::BTreeMap;
use std::io;
use std::sync::Arc;
use thiserror::Error;

pub const BOOL_ARFF: &str = "{True, False}";
pub const STRING_ARFF: &str = "string";
pub const NUMERIC_ARFF: &str = "numeric";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O operation failed: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
    #[error("no column {0} in the table")]
    UnknownColumn(String),
    #[error("no {0} descriptors selected")]
    EmptySelection(&'static str),
    #[error("descriptor {0} is selected both as predictor and as response")]
    OverlappingSelection(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub header: String,
    /// type part of the ARFF attribute line
    pub arff: String,
    /// ARFF values of the column are quoted even when they hold no separator
    pub always_quote: bool,
}

impl Column {
    pub fn new(header: &str, arff: &str) -> Self {
        Self {
            header: header.to_string(),
            arff: arff.to_string(),
            always_quote: false,
        }
    }

    pub fn quoted(header: &str, arff: &str) -> Self {
        Self {
            always_quote: true,
            ..Self::new(header, arff)
        }
    }

    /// a descriptor's column; fails for descriptors without an ARFF type (unbounded ordinals)
    pub fn from_descriptor(descriptor: &Descriptor) -> Result<Self, DescriptorError> {
        Ok(Self::new(&descriptor.csv_header(), &descriptor.arff_type()?))
    }

    pub fn arff_attribute(&self) -> String {
        format!("@attribute {} {}", self.header, self.arff)
    }
}

/// header -> raw value text
pub type Row = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExportTable {
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

impl ExportTable {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.header.as_str()).collect()
    }

    pub fn column(&self, header: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.header == header)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// value of a row under a header, `None` when missing
    pub fn value(&self, row: usize, header: &str) -> Option<&str> {
        self.rows.get(row)?.get(header).map(String::as_str)
    }

    /// copy of the table with the rows at `indices`, in that order; unknown indices are skipped
    pub fn select_rows(&self, indices: &[usize]) -> ExportTable {
        ExportTable {
            columns: self.columns.clone(),
            rows: indices
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
        }
    }

    /// Copy of the table with only the named columns, in the given order. Every header
    /// must exist.
    pub fn restrict(&self, headers: &[&str]) -> Result<ExportTable, ExportError> {
        let mut columns = Vec::with_capacity(headers.len());
        for header in headers {
            let column = self
                .column(header)
                .ok_or_else(|| ExportError::UnknownColumn(header.to_string()))?;
            columns.push(column.clone());
        }
        let rows = self
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .filter(|(k, _)| headers.contains(&k.as_str()))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .collect();
        Ok(ExportTable { columns, rows })
    }
}

fn bool_text(value: bool) -> String {
    let text = if value { "True" } else { "False" };
    text.to_string()
}

fn descriptor_columns(descriptors: &[Arc<Descriptor>]) -> Result<Vec<Column>, ExportError> {
    let mut columns = Vec::with_capacity(descriptors.len());
    for descriptor in descriptors {
        columns.push(Column::from_descriptor(descriptor)?);
    }
    Ok(columns)
}

fn insert_values(row: &mut Row, values: &[MolDescriptorValue]) {
    for value in values {
        row.insert(value.descriptor().csv_header(), value.value().to_string());
    }
}

/// name of the i-th (1-based) chemical class column
pub fn class_header(i: usize) -> String {
    format!("chemicalClass_{}", i)
}

/// Columns of the compound export. The class columns are sized on the whole guide and
/// their ARFF type lists every known class, quoted.
pub fn compound_columns(guide: &CompoundGuide) -> Vec<Column> {
    let mut columns = vec![
        Column::new("abbrev", STRING_ARFF),
        Column::new("name", STRING_ARFF),
        Column::new("CSID", NUMERIC_ARFF),
        Column::new("INCHI", STRING_ARFF),
        Column::new("smiles", STRING_ARFF),
        Column::new("formula", STRING_ARFF),
        Column::new("custom", BOOL_ARFF),
    ];
    let labels: Vec<String> = guide
        .classes()
        .iter()
        .map(|c| arff_quote(&c.label, true))
        .collect();
    let class_type = format!("{{{}}}", labels.join(","));
    for i in 1..=guide.max_chemical_class_count() {
        columns.push(Column::quoted(&class_header(i), &class_type));
    }
    columns
}

fn compound_row(compound: &Compound, with_values: bool) -> Row {
    let mut row = Row::new();
    row.insert("abbrev".to_string(), compound.abbrev.clone());
    row.insert("name".to_string(), compound.name.clone());
    if let Some(csid) = compound.csid {
        row.insert("CSID".to_string(), csid.to_string());
    }
    row.insert("INCHI".to_string(), compound.inchi.clone());
    row.insert("smiles".to_string(), compound.smiles.clone());
    row.insert("formula".to_string(), compound.formula.clone());
    row.insert("custom".to_string(), bool_text(compound.custom));
    for (i, class) in compound.chemical_classes.iter().enumerate() {
        row.insert(class_header(i + 1), class.label.clone());
    }
    if with_values {
        insert_values(&mut row, compound.descriptor_values());
    }
    row
}

/// Table of the selected compounds. `expanded` adds a column for every descriptor with a
/// value on any of them.
pub fn compound_table<'a, I>(
    guide: &CompoundGuide,
    selection: I,
    expanded: bool,
) -> Result<ExportTable, ExportError>
where
    I: IntoIterator<Item = &'a Compound>,
{
    let selection: Vec<&Compound> = selection.into_iter().collect();
    let mut columns = compound_columns(guide);
    if expanded {
        let descriptors = CompoundGuide::descriptors(selection.iter().copied());
        columns.extend(descriptor_columns(&descriptors)?);
    }
    let mut table = ExportTable::new(columns);
    for compound in selection {
        table.push(compound_row(compound, expanded));
    }
    debug!(
        "compound table with {} columns and {} rows",
        table.columns.len(),
        table.len()
    );
    Ok(table)
}

/// Columns of the reaction export with `slots` reactant slots.
pub fn reaction_columns(slots: usize) -> Vec<Column> {
    let mut columns = vec![
        Column::new("reference", STRING_ARFF),
        Column::new("labGroup", STRING_ARFF),
        Column::new("valid", BOOL_ARFF),
    ];
    for i in 1..=slots {
        columns.push(Column::new(&format!("compound_{}", i), STRING_ARFF));
        columns.push(Column::new(&format!("compound_{}_role", i), STRING_ARFF));
        columns.push(Column::new(&format!("compound_{}_amount", i), NUMERIC_ARFF));
    }
    columns
}

fn reaction_row(reaction: &PerformedReaction, with_values: bool) -> Row {
    let mut row = Row::new();
    row.insert("reference".to_string(), reaction.reference.clone());
    row.insert("labGroup".to_string(), reaction.lab_group.clone());
    row.insert("valid".to_string(), bool_text(reaction.valid));
    for (i, quantity) in reaction.compounds.iter().enumerate() {
        let slot = i + 1;
        row.insert(format!("compound_{}", slot), quantity.abbrev.clone());
        row.insert(format!("compound_{}_role", slot), quantity.role.clone());
        if let Some(amount) = quantity.amount {
            row.insert(format!("compound_{}_amount", slot), amount.to_string());
        }
    }
    if with_values {
        insert_values(&mut row, reaction.descriptor_values());
    }
    row
}

/// Table of the selected reactions; the reactant slots are sized on the whole log.
pub fn reaction_table<'a, I>(
    log: &ReactionLog,
    selection: I,
    expanded: bool,
) -> Result<ExportTable, ExportError>
where
    I: IntoIterator<Item = &'a PerformedReaction>,
{
    let selection: Vec<&PerformedReaction> = selection.into_iter().collect();
    let mut columns = reaction_columns(log.max_compound_count());
    if expanded {
        let descriptors = ReactionLog::descriptors(selection.iter().copied());
        columns.extend(descriptor_columns(&descriptors)?);
    }
    let mut table = ExportTable::new(columns);
    for reaction in selection {
        table.push(reaction_row(reaction, expanded));
    }
    Ok(table)
}
