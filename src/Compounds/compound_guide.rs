//! # Compound guide
//!
//! The set of compounds the lab groups work with, plus the chemical classes they are
//! filed under. The guide enforces the uniqueness rules of the compound records:
//! an abbreviation is unique within a lab group, and so is a ChemSpider ID.
//!
//! Compounds can be bulk-loaded from an uploaded CSV table (`from_csv`). The table's
//! headers name the compound fields; `chemicalClasses` holds a comma separated list of
//! class labels, and a `CAS` number may stand in for a missing `CSID`, in which case the
//! compound authority is asked to resolve it.
use crate::Compounds::authority::CompoundAuthority;
use crate::Compounds::compound::{ChemicalClass, Compound};
use crate::Compounds::formula::{Elements, composition_matrix};
use crate::Descriptors::descriptor::Descriptor;
use crate::Descriptors::values::distinct_descriptors;
use crate::Utils::csv_io::{CsvError, Record, read_records};
use crate::validation::{ValidationError, ValidationErrors};
use log::{info, warn};
use nalgebra::DMatrix;
use std::io::Read;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct CompoundGuide {
    compounds: Vec<Compound>,
    classes: Vec<ChemicalClass>,
}

impl CompoundGuide {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.compounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compounds.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Compound> {
        self.compounds.iter()
    }

    pub fn compounds(&self) -> &[Compound] {
        &self.compounds
    }

    pub fn classes(&self) -> &[ChemicalClass] {
        &self.classes
    }

    pub fn for_lab_group<'a>(&'a self, lab_group: &'a str) -> impl Iterator<Item = &'a Compound> {
        self.compounds.iter().filter(move |c| c.lab_group == lab_group)
    }

    pub fn get(&self, lab_group: &str, abbrev: &str) -> Option<&Compound> {
        self.position(lab_group, abbrev).map(|i| &self.compounds[i])
    }

    pub(crate) fn get_mut(&mut self, lab_group: &str, abbrev: &str) -> Option<&mut Compound> {
        let i = self.position(lab_group, abbrev)?;
        Some(&mut self.compounds[i])
    }

    fn position(&self, lab_group: &str, abbrev: &str) -> Option<usize> {
        self.compounds
            .iter()
            .position(|c| c.lab_group == lab_group && c.abbrev == abbrev)
    }

    /// the class with this label, created if it is not known yet
    pub fn get_or_create_class(&mut self, label: &str) -> ChemicalClass {
        if let Some(class) = self.classes.iter().find(|c| c.label == label) {
            return class.clone();
        }
        let class = ChemicalClass::new(label);
        self.classes.push(class.clone());
        class
    }

    /// uniqueness of `compound` against every stored compound except the one at `skip`
    fn check_unique(&self, compound: &Compound, skip: Option<usize>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        for (i, other) in self.compounds.iter().enumerate() {
            if Some(i) != skip {
                errors.extend(clashes(compound, other));
            }
        }
        errors
    }

    /// Uniqueness of a batch of new compounds, against the guide and against each other.
    /// Nothing is stored.
    pub fn check_batch(&self, compounds: &[Compound]) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        for (i, compound) in compounds.iter().enumerate() {
            errors.extend(self.check_unique(compound, None));
            for earlier in &compounds[..i] {
                errors.extend(clashes(compound, earlier));
            }
        }
        errors
    }

    fn register_classes(&mut self, compound: &Compound) {
        for class in &compound.chemical_classes {
            if !self.classes.iter().any(|c| c.label == class.label) {
                self.classes.push(class.clone());
            }
        }
    }

    /// stores a new compound after field and uniqueness checks
    pub fn add(&mut self, compound: Compound) -> Result<(), ValidationErrors> {
        let mut errors = compound.clean().err().unwrap_or_default();
        errors.extend(self.check_unique(&compound, None));
        errors.into_result()?;
        info!("added {} to the compound guide of {}", compound, compound.lab_group);
        self.register_classes(&compound);
        self.compounds.push(compound);
        Ok(())
    }

    /// Stores `compound` in place of the record currently filed under
    /// `(lab_group, original_abbrev)`, or adds it when there is none. The abbreviation may
    /// change as long as it stays unique.
    pub fn save(
        &mut self,
        original_abbrev: &str,
        compound: Compound,
    ) -> Result<(), ValidationErrors> {
        let Some(i) = self.position(&compound.lab_group, original_abbrev) else {
            return self.add(compound);
        };
        let mut errors = compound.clean().err().unwrap_or_default();
        errors.extend(self.check_unique(&compound, Some(i)));
        errors.into_result()?;
        self.register_classes(&compound);
        self.compounds[i] = compound;
        Ok(())
    }

    pub fn remove(&mut self, lab_group: &str, abbrev: &str) -> Option<Compound> {
        self.position(lab_group, abbrev)
            .map(|i| self.compounds.remove(i))
    }

    /// largest number of chemical classes any stored compound belongs to
    pub fn max_chemical_class_count(&self) -> usize {
        self.compounds
            .iter()
            .map(|c| c.chemical_classes.len())
            .max()
            .unwrap_or(0)
    }

    /// Descriptors with a value on at least one of `selection`, grouped boolean, numeric,
    /// ordinal, categorical and ordered by CSV header inside each group.
    pub fn descriptors<'a, I>(selection: I) -> Vec<Arc<Descriptor>>
    where
        I: IntoIterator<Item = &'a Compound>,
    {
        distinct_descriptors(selection.into_iter().flat_map(|c| c.descriptor_values()))
    }

    /// element composition matrix of the compounds with a parseable, non-empty formula
    pub fn element_composition_matrix<'a, I>(
        selection: I,
    ) -> (DMatrix<f64>, Vec<String>, Vec<String>)
    where
        I: IntoIterator<Item = &'a Compound>,
    {
        let mut abbrevs = Vec::new();
        let mut compositions: Vec<Elements> = Vec::new();
        for compound in selection {
            if compound.formula.is_empty() {
                continue;
            }
            match compound.elements() {
                Ok(elements) => {
                    abbrevs.push(compound.abbrev.clone());
                    compositions.push(elements);
                }
                Err(e) => warn!("{} skipped: {}", compound, e),
            }
        }
        let (matrix, symbols) = composition_matrix(&compositions);
        (matrix, symbols, abbrevs)
    }

    /// Builds unsaved compounds from an uploaded table.
    ///
    /// Problems are collected over all rows, each message naming its row (data rows count
    /// from 1); if there is any, nothing is returned. Chemical classes named in the table
    /// are created in the guide as a side effect.
    pub fn from_csv<R: Read>(
        &mut self,
        reader: R,
        lab_group: &str,
        authority: &dyn CompoundAuthority,
    ) -> Result<Vec<Compound>, CsvImportError> {
        let records = read_records(reader)?;
        let mut compounds = Vec::new();
        let mut errors = ValidationErrors::new();
        for (i, record) in records.iter().enumerate() {
            let row = i + 1;
            match self.compound_from_record(record, row, lab_group, authority) {
                Ok(compound) => compounds.push(compound),
                Err(row_errors) => errors.extend(row_errors),
            }
        }
        if !errors.is_empty() {
            warn!("CSV upload rejected with {} problems", errors.len());
            return Err(CsvImportError::Invalid(errors));
        }
        info!("{} compounds read from CSV for {}", compounds.len(), lab_group);
        Ok(compounds)
    }

    fn compound_from_record(
        &mut self,
        record: &Record,
        row: usize,
        lab_group: &str,
        authority: &dyn CompoundAuthority,
    ) -> Result<Compound, ValidationErrors> {
        let field = |key: &str| {
            record
                .get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
        };
        let row_error = |message: String| ValidationError::new("csv_row", message);
        let mut errors = ValidationErrors::new();

        let mut classes = Vec::new();
        if let Some(labels) = field("chemicalClasses") {
            for label in labels.split(',').map(str::trim).filter(|l| !l.is_empty()) {
                classes.push(self.get_or_create_class(label));
            }
        }

        let mut csid: Option<u64> = None;
        match (field("CAS"), field("CSID")) {
            (Some(cas), None) => match authority.simple_search(cas) {
                Ok(results) if results.is_empty() => errors.push(row_error(format!(
                    "CAS Number returned no results from ChemSpider on row {} of uploaded csv.",
                    row
                ))),
                Ok(results) if results.len() == 1 => csid = Some(results[0].csid),
                Ok(_) => errors.push(row_error(format!(
                    "CAS number returns more than one ChemSpider ID on row {} of uploaded csv.",
                    row
                ))),
                Err(e) => errors.push(row_error(format!(
                    "{} on row {} of uploaded csv",
                    e, row
                ))),
            },
            (_, Some(text)) => match text.parse::<u64>() {
                Ok(id) => csid = Some(id),
                Err(_) => errors.push(row_error(format!(
                    "Invalid CSID {} on row {} of uploaded csv.",
                    text, row
                ))),
            },
            (None, None) => errors.push(row_error(format!(
                "No CSID provided on row {} of uploaded csv.",
                row
            ))),
        }

        let mut compound = Compound::new(
            field("abbrev").unwrap_or_default(),
            field("name").unwrap_or_default(),
            lab_group,
        );
        compound.csid = csid;
        compound.smiles = field("smiles").unwrap_or_default().to_string();
        compound.inchi = field("INCHI").unwrap_or_default().to_string();
        compound.formula = field("formula").unwrap_or_default().to_string();
        for class in classes {
            compound.add_chemical_class(class);
        }
        if let Err(field_errors) = compound.clean() {
            for e in field_errors {
                errors.push(ValidationError::new(
                    e.code,
                    format!("{} on row {} of uploaded csv", e.message, row),
                ));
            }
        }
        errors.into_result()?;
        Ok(compound)
    }
}


/// abbreviation and ChemSpider ID clashes between two compounds of the same lab group
fn clashes(compound: &Compound, other: &Compound) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    if other.lab_group != compound.lab_group {
        return errors;
    }
    if other.abbrev == compound.abbrev {
        errors.push(ValidationError::new(
            "duplicate_abbrev",
            format!(
                "Compound with this Abbreviation and Lab Group already exists: {}",
                compound.abbrev
            ),
        ));
    }
    if compound.csid.is_some() && other.csid == compound.csid {
        errors.push(ValidationError::new(
            "duplicate_csid",
            format!(
                "Compound with this Chemspider ID and Lab Group already exists: {}",
                other.abbrev
            ),
        ));
    }
    errors
}

#[derive(Debug, thiserror::Error)]
pub enum CsvImportError {
    #[error("could not read the uploaded table: {0}")]
    Csv(#[from] CsvError),
    #[error("{0}")]
    Invalid(ValidationErrors),
}
