//! # Molecular descriptor plugins
//!
//! A plugin calculates descriptor values for a compound and records them on it. Each
//! plugin declares the descriptors it produces once, as a `LazyDescriptorSet`, so they
//! are registered the first time the plugin actually runs. The plugins a laboratory uses
//! are listed by name in the configuration and built with `plugins_from_names`.
use crate::Compounds::compound::Compound;
use crate::Compounds::formula::{atom_count, molar_mass};
use crate::Descriptors::descriptor::DescriptorError;
use crate::Descriptors::registry::{DescriptorRegistry, DescriptorSpec, LazyDescriptorSet};
use crate::Descriptors::values::{DescriptorValue, MolDescriptorValue};
use log::{debug, info};
use std::collections::BTreeMap;

pub const FORMULA_PLUGIN: &str = "formula";

/// names accepted by `plugins_from_names`
pub const AVAILABLE_PLUGINS: &[&str] = &[FORMULA_PLUGIN];

pub trait MolDescriptorPlugin {
    fn name(&self) -> &str;

    /// calculates the plugin's descriptors for `compound` and records them on it
    fn calculate(
        &mut self,
        compound: &mut Compound,
        registry: &mut DescriptorRegistry,
    ) -> Result<(), DescriptorError>;
}

/// Descriptors that follow from the molecular formula alone:
/// - `mw`: molar mass, g/mol
/// - `atom_count`: total number of atoms
/// - `element_count`: number of distinct elements
/// - `is_organic`: carbon and hydrogen both present
pub struct FormulaDescriptorPlugin {
    descriptors: LazyDescriptorSet,
}

impl FormulaDescriptorPlugin {
    pub fn new() -> Self {
        let software = env!("CARGO_PKG_NAME").to_string();
        let version = env!("CARGO_PKG_VERSION").to_string();
        let mut specs = BTreeMap::new();
        specs.insert(
            "mw".to_string(),
            DescriptorSpec::Num {
                name: "Molecular weight".to_string(),
                calculator_software: software.clone(),
                calculator_software_version: version.clone(),
                minimum: Some(0.0),
                maximum: None,
            },
        );
        specs.insert(
            "atom_count".to_string(),
            DescriptorSpec::Num {
                name: "Number of atoms".to_string(),
                calculator_software: software.clone(),
                calculator_software_version: version.clone(),
                minimum: Some(0.0),
                maximum: None,
            },
        );
        specs.insert(
            "element_count".to_string(),
            DescriptorSpec::Ord {
                name: "Number of distinct elements".to_string(),
                calculator_software: software.clone(),
                calculator_software_version: version.clone(),
                minimum: Some(0),
                maximum: Some(118),
            },
        );
        specs.insert(
            "is_organic".to_string(),
            DescriptorSpec::Bool {
                name: "Contains carbon and hydrogen".to_string(),
                calculator_software: software,
                calculator_software_version: version,
            },
        );
        Self {
            descriptors: LazyDescriptorSet::new(specs),
        }
    }

    fn record(
        &mut self,
        compound: &mut Compound,
        registry: &mut DescriptorRegistry,
        heading: &str,
        value: DescriptorValue,
    ) -> Result<(), DescriptorError> {
        let descriptor = self
            .descriptors
            .get(registry, heading)?
            .ok_or_else(|| DescriptorError::Calculation(format!("{} is not declared", heading)))?;
        let value = MolDescriptorValue::new(descriptor, value)
            .map_err(|e| DescriptorError::Calculation(format!("{}: {}", compound, e)))?;
        compound.set_descriptor_value(value);
        Ok(())
    }
}

impl Default for FormulaDescriptorPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl MolDescriptorPlugin for FormulaDescriptorPlugin {
    fn name(&self) -> &str {
        FORMULA_PLUGIN
    }

    fn calculate(
        &mut self,
        compound: &mut Compound,
        registry: &mut DescriptorRegistry,
    ) -> Result<(), DescriptorError> {
        if compound.formula.is_empty() {
            debug!("{} has no formula, nothing to calculate", compound);
            return Ok(());
        }
        let elements = compound
            .elements()
            .map_err(|e| DescriptorError::Calculation(format!("{}: {}", compound, e)))?;
        let mw = molar_mass(&elements)
            .map_err(|e| DescriptorError::Calculation(format!("{}: {}", compound, e)))?;
        let organic = elements.contains_key("C") && elements.contains_key("H");

        self.record(compound, registry, "mw", DescriptorValue::Num(mw))?;
        self.record(
            compound,
            registry,
            "atom_count",
            DescriptorValue::Num(atom_count(&elements)),
        )?;
        self.record(
            compound,
            registry,
            "element_count",
            DescriptorValue::Ord(elements.len() as i64),
        )?;
        self.record(compound, registry, "is_organic", DescriptorValue::Bool(organic))?;
        info!("formula descriptors calculated for {}", compound);
        Ok(())
    }
}

/// builds the plugins named in the configuration, in the given order
pub fn plugins_from_names(
    names: &[String],
) -> Result<Vec<Box<dyn MolDescriptorPlugin>>, DescriptorError> {
    let mut plugins: Vec<Box<dyn MolDescriptorPlugin>> = Vec::new();
    for name in names {
        match name.as_str() {
            FORMULA_PLUGIN => plugins.push(Box::new(FormulaDescriptorPlugin::new())),
            other => return Err(DescriptorError::UnknownPlugin(other.to_string())),
        }
    }
    Ok(plugins)
}
