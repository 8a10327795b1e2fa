//! Performed reactions and the log that keeps them.
//!
//! A reaction lists the compounds it used (by abbreviation within the same lab group),
//! their roles and amounts, and the reaction-level descriptor values such as the
//! crystallisation outcome. When a compound is edited, every reaction that used it is
//! flagged so its descriptors are recalculated and models built on it are rebuilt.
use crate::Descriptors::descriptor::{Descriptor, DescriptorKind};
use crate::Descriptors::values::{DescriptorValue, MolDescriptorValue, distinct_descriptors};
use crate::validation::{ValidationError, ValidationErrors};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundQuantity {
    pub abbrev: String,
    /// e.g. "reactant", "solvent", "template"
    pub role: String,
    /// grams
    pub amount: Option<f64>,
}

impl CompoundQuantity {
    pub fn new(abbrev: &str, role: &str, amount: Option<f64>) -> Self {
        Self {
            abbrev: abbrev.to_string(),
            role: role.to_string(),
            amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerformedReaction {
    pub reference: String,
    pub lab_group: String,
    pub compounds: Vec<CompoundQuantity>,
    /// invalid reactions are kept but never used for model building
    pub valid: bool,
    /// set when a compound used by the reaction changed after its descriptors were calculated
    pub descriptors_stale: bool,
    descriptor_values: Vec<MolDescriptorValue>,
}

impl PerformedReaction {
    pub fn new(reference: &str, lab_group: &str) -> Self {
        Self {
            reference: reference.to_string(),
            lab_group: lab_group.to_string(),
            compounds: Vec::new(),
            valid: true,
            descriptors_stale: false,
            descriptor_values: Vec::new(),
        }
    }

    pub fn add_compound(&mut self, quantity: CompoundQuantity) {
        self.compounds.push(quantity);
    }

    pub fn uses_compound(&self, abbrev: &str) -> bool {
        self.compounds.iter().any(|q| q.abbrev == abbrev)
    }

    pub fn descriptor_values(&self) -> &[MolDescriptorValue] {
        &self.descriptor_values
    }

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

    pub fn descriptor_value(&self, csv_header: &str) -> Option<&DescriptorValue> {
        self.descriptor_values
            .iter()
            .find(|v| v.descriptor().csv_header() == csv_header)
            .map(|v| v.value())
    }

    pub fn clean(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.reference.trim().is_empty() {
            errors.push(ValidationError::new("required", "A reference is required."));
        }
        for quantity in &self.compounds {
            if quantity.amount.is_some_and(|a| a.is_nan() || a < 0.0) {
                errors.push(ValidationError::new(
                    "out_of_range",
                    format!("Amount of {} must not be negative", quantity.abbrev),
                ));
            }
        }
        errors.into_result()
    }
}

impl fmt::Display for PerformedReaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.reference, self.lab_group)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReactionLog {
    reactions: Vec<PerformedReaction>,
}

impl ReactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.reactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reactions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PerformedReaction> {
        self.reactions.iter()
    }

    pub fn reactions(&self) -> &[PerformedReaction] {
        &self.reactions
    }

    pub fn get(&self, lab_group: &str, reference: &str) -> Option<&PerformedReaction> {
        self.reactions
            .iter()
            .find(|r| r.lab_group == lab_group && r.reference == reference)
    }

    pub fn add(&mut self, reaction: PerformedReaction) -> Result<(), ValidationErrors> {
        reaction.clean()?;
        if self.get(&reaction.lab_group, &reaction.reference).is_some() {
            return Err(ValidationError::new(
                "duplicate_reference",
                format!(
                    "Reaction with this Reference and Lab Group already exists: {}",
                    reaction.reference
                ),
            )
            .into());
        }
        debug!("logged reaction {}", reaction);
        self.reactions.push(reaction);
        Ok(())
    }

    /// excludes a reaction from model building without deleting it
    pub fn invalidate(&mut self, lab_group: &str, reference: &str) -> bool {
        match self
            .reactions
            .iter_mut()
            .find(|r| r.lab_group == lab_group && r.reference == reference)
        {
            Some(reaction) => {
                reaction.valid = false;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, lab_group: &str, reference: &str) -> Option<PerformedReaction> {
        let i = self
            .reactions
            .iter()
            .position(|r| r.lab_group == lab_group && r.reference == reference)?;
        Some(self.reactions.remove(i))
    }

    /// flags every reaction of the lab group that used the compound; returns how many
    pub fn invalidate_for_compound(&mut self, lab_group: &str, abbrev: &str) -> usize {
        let mut touched = 0;
        for reaction in self
            .reactions
            .iter_mut()
            .filter(|r| r.lab_group == lab_group && r.uses_compound(abbrev))
        {
            reaction.descriptors_stale = true;
            touched += 1;
        }
        if touched > 0 {
            info!("{} reactions depend on {} and were flagged for recalculation", touched, abbrev);
        }
        touched
    }

    /// descriptors with a value on at least one reaction of `selection`, in export order
    pub fn descriptors<'a, I>(selection: I) -> Vec<Arc<Descriptor>>
    where
        I: IntoIterator<Item = &'a PerformedReaction>,
    {
        distinct_descriptors(selection.into_iter().flat_map(|r| r.descriptor_values()))
    }

    pub fn max_compound_count(&self) -> usize {
        self.reactions
            .iter()
            .map(|r| r.compounds.len())
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Descriptors::descriptor::{CatDescriptor, DescriptorMeta};

    fn reaction(reference: &str, compounds: &[&str]) -> PerformedReaction {
        let mut r = PerformedReaction::new(reference, "Norquist");
        for abbrev in compounds {
            r.add_compound(CompoundQuantity::new(abbrev, "reactant", Some(0.1)));
        }
        r
    }

    #[test]
    fn test_unique_reference_per_lab_group() {
        let mut log = ReactionLog::new();
        log.add(reaction("JMS-1", &["H2O"])).unwrap();
        let errors = log.add(reaction("JMS-1", &["EtOH"])).unwrap_err();
        assert!(errors.has_code("duplicate_reference"));
        let mut other_lab = reaction("JMS-1", &["EtOH"]);
        other_lab.lab_group = "Schrier".to_string();
        log.add(other_lab).unwrap();
        assert_eq!(log.len(), 2);
        assert!(log.add(reaction(" ", &[])).unwrap_err().has_code("required"));
    }

    #[test]
    fn test_negative_amount_is_rejected() {
        let mut r = reaction("JMS-2", &[]);
        r.add_compound(CompoundQuantity::new("H2O", "solvent", Some(-1.0)));
        assert!(r.clean().unwrap_err().has_code("out_of_range"));
    }

    #[test]
    fn test_invalidate_for_compound() {
        let mut log = ReactionLog::new();
        log.add(reaction("JMS-1", &["H2O", "EtOH"])).unwrap();
        log.add(reaction("JMS-2", &["EtOH"])).unwrap();
        log.add(reaction("JMS-3", &["H2O"])).unwrap();
        assert_eq!(log.invalidate_for_compound("Norquist", "EtOH"), 2);
        assert_eq!(log.invalidate_for_compound("Schrier", "H2O"), 0);
        let stale: Vec<&str> = log
            .iter()
            .filter(|r| r.descriptors_stale)
            .map(|r| r.reference.as_str())
            .collect();
        assert_eq!(stale, vec!["JMS-1", "JMS-2"]);
        assert_eq!(log.max_compound_count(), 2);
    }

    #[test]
    fn test_invalidate_and_remove() {
        let mut log = ReactionLog::new();
        log.add(reaction("JMS-1", &["H2O"])).unwrap();
        assert!(log.invalidate("Norquist", "JMS-1"));
        assert!(!log.invalidate("Norquist", "JMS-9"));
        assert!(!log.get("Norquist", "JMS-1").unwrap().valid);
        assert!(log.remove("Norquist", "JMS-1").is_some());
        assert!(log.is_empty());
    }

    #[test]
    fn test_reaction_descriptor_values() {
        let outcome: Arc<Descriptor> = Arc::new(
            CatDescriptor::new(
                DescriptorMeta::new("outcome", "Outcome", "manual", "0"),
                vec!["1".to_string(), "2".to_string(), "3".to_string(), "4".to_string()],
            )
            .into(),
        );
        let mut r = reaction("JMS-1", &["H2O"]);
        r.set_descriptor_value(
            MolDescriptorValue::new(outcome.clone(), DescriptorValue::Cat("4".to_string())).unwrap(),
        );
        r.set_descriptor_value(
            MolDescriptorValue::new(outcome, DescriptorValue::Cat("2".to_string())).unwrap(),
        );
        assert_eq!(r.descriptor_values().len(), 1);
        assert_eq!(
            r.descriptor_value("outcome_manual_0"),
            Some(&DescriptorValue::Cat("2".to_string()))
        );
        assert_eq!(r.to_string(), "JMS-1 (Norquist)");
    }
}
