//! # Model input
//!
//! Model builders are fed a table of reactions restricted to a chosen set of predictor
//! descriptors plus the response descriptors to be learned, typically the crystallisation
//! outcome. Predictors are usually picked by heading from a descriptor header file, one
//! heading per line.
//!
//! Only valid reactions whose descriptors are up to date are used. Reactions are split into
//! folds for cross validation with `ModelDataset::folds`, one train and one test table per
//! fold, following the consecutive split of `k_fold_splits`.
use crate::Compounds::reaction::{PerformedReaction, ReactionLog};
use crate::Descriptors::descriptor::{Descriptor, DescriptorKind};
use crate::Descriptors::registry::{DescriptorRegistry, load_header_file};
use crate::Export::table::{Column, ExportError, ExportTable, Row, STRING_ARFF};
use crate::Export::writers::{save_arff, write_arff, write_csv};
use log::{info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DEFAULT_RESPONSE: &str = "boolean_crystallisation_outcome";

#[derive(Debug, Clone)]
pub struct ModelDataset {
    predictors: Vec<Arc<Descriptor>>,
    responses: Vec<Arc<Descriptor>>,
}

impl ModelDataset {
    pub fn new(
        predictors: Vec<Arc<Descriptor>>,
        responses: Vec<Arc<Descriptor>>,
    ) -> Result<Self, ExportError> {
        if predictors.is_empty() {
            return Err(ExportError::EmptySelection("predictor"));
        }
        if responses.is_empty() {
            return Err(ExportError::EmptySelection("response"));
        }
        if let Some(both) = predictors
            .iter()
            .find(|p| responses.iter().any(|r| r.meta().key() == p.meta().key()))
        {
            return Err(ExportError::OverlappingSelection(both.csv_header()));
        }
        Ok(Self {
            predictors,
            responses,
        })
    }

    /// selects the registered descriptors by heading
    pub fn from_headings(
        registry: &DescriptorRegistry,
        predictor_headings: &[String],
        response_headings: &[String],
    ) -> Result<Self, ExportError> {
        Self::new(
            registry.by_headings(predictor_headings),
            registry.by_headings(response_headings),
        )
    }

    /// predictors listed in a header file, responses by heading
    pub fn from_header_file(
        registry: &DescriptorRegistry,
        predictor_file: &Path,
        response_headings: &[String],
    ) -> Result<Self, ExportError> {
        let headings = load_header_file(predictor_file)?;
        info!(
            "{} predictor headings read from {}",
            headings.len(),
            predictor_file.display()
        );
        Self::from_headings(registry, &headings, response_headings)
    }

    pub fn predictors(&self) -> &[Arc<Descriptor>] {
        &self.predictors
    }

    pub fn responses(&self) -> &[Arc<Descriptor>] {
        &self.responses
    }

    /// reactions of the log that may be used for model building
    pub fn usable_reactions<'a>(&self, log: &'a ReactionLog) -> Vec<&'a PerformedReaction> {
        let usable: Vec<&PerformedReaction> = log
            .iter()
            .filter(|r| r.valid && !r.descriptors_stale)
            .collect();
        let skipped = log.len() - usable.len();
        if skipped > 0 {
            warn!("{} invalid or stale reactions left out of the model input", skipped);
        }
        usable
    }

    /// `reference`, the predictors, then the responses; one row per usable reaction
    pub fn table(&self, log: &ReactionLog) -> Result<ExportTable, ExportError> {
        let mut columns = vec![Column::new("reference", STRING_ARFF)];
        for descriptor in self.predictors.iter().chain(&self.responses) {
            columns.push(Column::from_descriptor(descriptor)?);
        }
        let mut table = ExportTable::new(columns);
        for reaction in self.usable_reactions(log) {
            let mut row = Row::new();
            row.insert("reference".to_string(), reaction.reference.clone());
            for descriptor in self.predictors.iter().chain(&self.responses) {
                let header = descriptor.csv_header();
                if let Some(value) = reaction.descriptor_value(&header) {
                    row.insert(header, value.to_string());
                }
            }
            table.push(row);
        }
        Ok(table)
    }

    pub fn write_arff<W: Write>(
        &self,
        log: &ReactionLog,
        relation: &str,
        writer: &mut W,
    ) -> Result<(), ExportError> {
        write_arff(&self.table(log)?, relation, writer)
    }

    pub fn write_csv<W: Write>(&self, log: &ReactionLog, writer: &mut W) -> Result<(), ExportError> {
        write_csv(&self.table(log)?, writer)
    }

    /// `(train, test)` tables for `k`-fold cross validation over the usable reactions
    pub fn folds(
        &self,
        log: &ReactionLog,
        k: usize,
    ) -> Result<Vec<(ExportTable, ExportTable)>, ExportError> {
        let table = self.table(log)?;
        Ok(k_fold_splits(table.len(), k)
            .iter()
            .map(|(train, test)| (table.select_rows(train), table.select_rows(test)))
            .collect())
    }

    /// Writes every fold as `{relation}_fold{i}_train.arff` and `{relation}_fold{i}_test.arff`
    /// into `dir`, folds numbered from 1. Returns the files written.
    pub fn save_folds(
        &self,
        log: &ReactionLog,
        k: usize,
        relation: &str,
        dir: &Path,
    ) -> Result<Vec<PathBuf>, ExportError> {
        let mut written = Vec::new();
        for (i, (train, test)) in self.folds(log, k)?.iter().enumerate() {
            for (part, table) in [("train", train), ("test", test)] {
                let path = dir.join(format!("{}_fold{}_{}.arff", relation, i + 1, part));
                save_arff(table, relation, &path)?;
                written.push(path);
            }
        }
        info!("{} fold files written to {}", written.len(), dir.display());
        Ok(written)
    }
}

/// Splits `n` rows into `k` folds of consecutive indices, the first `n % k` folds one row
/// longer. Returns `(train, test)` index lists per fold; `k` is clamped to `1..=n`.
pub fn k_fold_splits(n: usize, k: usize) -> Vec<(Vec<usize>, Vec<usize>)> {
    if n == 0 {
        return Vec::new();
    }
    let k = k.clamp(1, n);
    let base = n / k;
    let extra = n % k;
    let mut splits = Vec::with_capacity(k);
    let mut start = 0;
    for fold in 0..k {
        let size = base + usize::from(fold < extra);
        let test: Vec<usize> = (start..start + size).collect();
        let train: Vec<usize> = (0..start).chain(start + size..n).collect();
        splits.push((train, test));
        start += size;
    }
    splits
}
