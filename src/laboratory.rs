//! # Laboratory
//!
//! The compound guide, the reaction log, the descriptor registry and the configured
//! descriptor plugins, kept together so that saving a compound has its full effect:
//! the record is checked and stored, every reaction that used it is flagged for
//! recalculation, and the plugins fill in the compound's descriptor values.
use crate::Compounds::authority::CompoundAuthority;
use crate::Compounds::compound::Compound;
use crate::Compounds::compound_guide::{CompoundGuide, CsvImportError};
use crate::Compounds::reaction::{PerformedReaction, ReactionLog};
use crate::Descriptors::descriptor::DescriptorError;
use crate::Descriptors::plugins::{MolDescriptorPlugin, plugins_from_names};
use crate::Descriptors::registry::DescriptorRegistry;
use crate::Descriptors::values::{DescriptorValue, MolDescriptorValue};
use crate::Utils::csv_io::{CsvError, read_records};
use crate::settings::DrpConfig;
use crate::validation::{ValidationError, ValidationErrors};
use log::{info, warn};
use std::io::Read;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LabError {
    #[error("{0}")]
    Invalid(#[from] ValidationErrors),
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
    #[error(transparent)]
    Import(#[from] CsvImportError),
    #[error(transparent)]
    Csv(#[from] CsvError),
}

pub struct Laboratory {
    pub guide: CompoundGuide,
    pub reactions: ReactionLog,
    pub registry: DescriptorRegistry,
    plugins: Vec<Box<dyn MolDescriptorPlugin>>,
}

impl Laboratory {
    /// an empty laboratory without descriptor plugins
    pub fn new() -> Self {
        Self::with_plugins(Vec::new())
    }

    pub fn with_plugins(plugins: Vec<Box<dyn MolDescriptorPlugin>>) -> Self {
        Self {
            guide: CompoundGuide::new(),
            reactions: ReactionLog::new(),
            registry: DescriptorRegistry::new(),
            plugins,
        }
    }

    /// an empty laboratory running the plugins named in `config`
    pub fn from_config(config: &DrpConfig) -> Result<Self, LabError> {
        Ok(Self::with_plugins(plugins_from_names(
            &config.mol_descriptor_plugins,
        )?))
    }

    pub fn plugin_names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    /// Saves `compound` over the record filed under `original_abbrev` (or as a new record),
    /// flags the reactions that used it and, with `calc_descriptors`, runs every plugin on
    /// the stored compound. Returns the number of reactions flagged.
    pub fn save_compound(
        &mut self,
        original_abbrev: Option<&str>,
        compound: Compound,
        calc_descriptors: bool,
    ) -> Result<usize, LabError> {
        let lab_group = compound.lab_group.clone();
        let abbrev = compound.abbrev.clone();
        match original_abbrev {
            Some(original) => self.guide.save(original, compound)?,
            None => self.guide.add(compound)?,
        }

        let mut flagged = self.reactions.invalidate_for_compound(&lab_group, &abbrev);
        if let Some(original) = original_abbrev.filter(|o| *o != abbrev) {
            flagged += self.reactions.invalidate_for_compound(&lab_group, original);
        }

        if calc_descriptors {
            self.calculate_descriptors(&lab_group, &abbrev)?;
        }
        Ok(flagged)
    }

    /// runs every plugin on a stored compound
    pub fn calculate_descriptors(&mut self, lab_group: &str, abbrev: &str) -> Result<(), LabError> {
        let Some(compound) = self.guide.get_mut(lab_group, abbrev) else {
            warn!("no compound {} in {}, nothing to calculate", abbrev, lab_group);
            return Ok(());
        };
        for plugin in self.plugins.iter_mut() {
            plugin.calculate(compound, &mut self.registry)?;
        }
        Ok(())
    }

    /// Reads compounds from an uploaded table and saves each of them. Nothing is saved
    /// when the table has a problem on any row, when its compounds clash with the guide or
    /// with each other, or when a plugin fails on one of them.
    pub fn import_compounds<R: Read>(
        &mut self,
        reader: R,
        lab_group: &str,
        authority: &dyn CompoundAuthority,
        calc_descriptors: bool,
    ) -> Result<usize, LabError> {
        let guide = self.guide.clone();
        let reactions = self.reactions.clone();
        let registry = self.registry.clone();
        let result = self.import_all(reader, lab_group, authority, calc_descriptors);
        if let Err(e) = &result {
            warn!("import for {} rolled back: {}", lab_group, e);
            self.guide = guide;
            self.reactions = reactions;
            self.registry = registry;
        }
        result
    }

    fn import_all<R: Read>(
        &mut self,
        reader: R,
        lab_group: &str,
        authority: &dyn CompoundAuthority,
        calc_descriptors: bool,
    ) -> Result<usize, LabError> {
        let compounds = self.guide.from_csv(reader, lab_group, authority)?;
        self.guide.check_batch(&compounds).into_result()?;
        let count = compounds.len();
        for compound in compounds {
            self.save_compound(None, compound, calc_descriptors)?;
        }
        info!("{} compounds imported for {}", count, lab_group);
        Ok(count)
    }

    /// Records descriptor values for stored compounds from an uploaded table: an `abbrev`
    /// column and one column per registered descriptor, headed by its CSV header. Empty
    /// fields are skipped. Problems are collected over all rows and nothing is recorded if
    /// there is any. Reactions using an updated compound are flagged. Returns the number of
    /// values recorded.
    pub fn import_descriptor_values<R: Read>(
        &mut self,
        reader: R,
        lab_group: &str,
    ) -> Result<usize, LabError> {
        let records = read_records(reader)?;
        let mut errors = ValidationErrors::new();
        let mut updates: Vec<(String, Vec<MolDescriptorValue>)> = Vec::new();
        for (i, record) in records.iter().enumerate() {
            let row = i + 1;
            let abbrev = record.get("abbrev").map(|a| a.trim()).unwrap_or_default();
            if self.guide.get(lab_group, abbrev).is_none() {
                errors.push(ValidationError::new(
                    "unknown_compound",
                    format!(
                        "No compound {} in {} on row {} of uploaded csv.",
                        abbrev, lab_group, row
                    ),
                ));
                continue;
            }
            let mut values = Vec::new();
            for (header, text) in record
                .iter()
                .filter(|(header, text)| header.as_str() != "abbrev" && !text.trim().is_empty())
            {
                let Some(descriptor) = self.registry.by_csv_header(header) else {
                    errors.push(ValidationError::new(
                        "unknown_descriptor",
                        format!("Unknown descriptor {} on row {} of uploaded csv.", header, row),
                    ));
                    continue;
                };
                match DescriptorValue::parse_for(&descriptor, text)
                    .and_then(|value| MolDescriptorValue::new(descriptor, value))
                {
                    Ok(value) => values.push(value),
                    Err(e) => errors.push(ValidationError::new(
                        e.code,
                        format!("{} on row {} of uploaded csv", e.message, row),
                    )),
                }
            }
            updates.push((abbrev.to_string(), values));
        }
        errors.into_result()?;

        let mut count = 0;
        for (abbrev, values) in updates {
            if let Some(compound) = self.guide.get_mut(lab_group, &abbrev) {
                count += values.len();
                for value in values {
                    compound.set_descriptor_value(value);
                }
            }
            self.reactions.invalidate_for_compound(lab_group, &abbrev);
        }
        info!("{} descriptor values recorded for {}", count, lab_group);
        Ok(count)
    }

    pub fn add_reaction(&mut self, reaction: PerformedReaction) -> Result<(), LabError> {
        self.reactions.add(reaction)?;
        Ok(())
    }
}

impl Default for Laboratory {
    fn default() -> Self {
        Self::new()
    }
}
