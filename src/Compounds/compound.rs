//! The compound record of a lab group's compound guide.
//!
//! All compounds are assumed to be single species. A compound carries identity fields
//! (abbreviation, name, ChemSpider ID, InChI, SMILES), a formula in subscript-brace
//! notation, the chemical classes it belongs to and the descriptor values calculated for it.
use crate::Compounds::formula::{Elements, FormulaError, parse_elements, validate_formula};
use crate::Descriptors::descriptor::DescriptorKind;
use crate::Descriptors::values::{DescriptorValue, MolDescriptorValue};
use crate::validation::{ValidationError, ValidationErrors};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const ABBREV_MAX_LENGTH: usize = 100;
pub const NAME_MAX_LENGTH: usize = 300;
pub const FORMULA_MAX_LENGTH: usize = 500;

/// a class of compounds, e.g. "Inorganic Salt"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChemicalClass {
    pub label: String,
    pub description: String,
}

impl ChemicalClass {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            description: String::new(),
        }
    }
}

impl fmt::Display for ChemicalClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Compound {
    /// a local, often nonstandard abbreviation
    pub abbrev: String,
    /// normally the IUPAC name
    pub name: String,
    pub chemical_classes: Vec<ChemicalClass>,
    /// ChemSpider ID
    pub csid: Option<u64>,
    /// added irrespective of the consistency check
    pub custom: bool,
    pub inchi: String,
    pub smiles: String,
    /// the lab group whose compound guide this compound appears in
    pub lab_group: String,
    pub formula: String,
    descriptor_values: Vec<MolDescriptorValue>,
}

impl Compound {
    pub fn new(abbrev: &str, name: &str, lab_group: &str) -> Self {
        Self {
            abbrev: abbrev.to_string(),
            name: name.to_string(),
            lab_group: lab_group.to_string(),
            ..Default::default()
        }
    }

    pub fn with_csid(mut self, csid: u64) -> Self {
        self.csid = Some(csid);
        self
    }

    pub fn with_formula(mut self, formula: &str) -> Self {
        self.formula = formula.to_string();
        self
    }

    /// element symbols and stoichiometries of the formula
    pub fn elements(&self) -> Result<Elements, FormulaError> {
        parse_elements(&self.formula)
    }

    pub fn add_chemical_class(&mut self, class: ChemicalClass) {
        if !self.chemical_classes.contains(&class) {
            self.chemical_classes.push(class);
        }
    }

    pub fn descriptor_values(&self) -> &[MolDescriptorValue] {
        &self.descriptor_values
    }

    /// records a value, replacing any earlier value of the same descriptor
    pub fn set_descriptor_value(&mut self, value: MolDescriptorValue) {
        match self
            .descriptor_values
            .iter()
            .position(|v| v.same_descriptor(value.descriptor()))
        {
            Some(i) => self.descriptor_values[i] = value,
            None => self.descriptor_values.push(value),
        }
    }

    /// value recorded for the descriptor exported under `csv_header`
    pub fn descriptor_value(&self, csv_header: &str) -> Option<&DescriptorValue> {
        self.descriptor_values
            .iter()
            .find(|v| v.descriptor().csv_header() == csv_header)
            .map(|v| v.value())
    }

    pub fn clear_descriptor_values(&mut self) {
        self.descriptor_values.clear();
    }

    /// field level checks; every problem is reported
    pub fn clean(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.abbrev.trim().is_empty() {
            errors.push(ValidationError::new("required", "An abbreviation is required."));
        }
        if self.abbrev.chars().count() > ABBREV_MAX_LENGTH {
            errors.push(ValidationError::new(
                "max_length",
                format!("The abbreviation is longer than {} characters.", ABBREV_MAX_LENGTH),
            ));
        }
        if self.name.chars().count() > NAME_MAX_LENGTH {
            errors.push(ValidationError::new(
                "max_length",
                format!("The name is longer than {} characters.", NAME_MAX_LENGTH),
            ));
        }
        if self.formula.chars().count() > FORMULA_MAX_LENGTH {
            errors.push(ValidationError::new(
                "max_length",
                format!("The formula is longer than {} characters.", FORMULA_MAX_LENGTH),
            ));
        }
        if let Err(e) = validate_formula(&self.formula) {
            errors.push(e);
        }
        errors.into_result()
    }
}

impl fmt::Display for Compound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.abbrev)
    }
}
