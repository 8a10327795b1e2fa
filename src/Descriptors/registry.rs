//! # Descriptor registry
//!
//! Holds every descriptor known to the laboratory, one per identity
//! `(heading, calculator_software, calculator_software_version)`. Descriptor plugins
//! declare their descriptors as a JSON-like map of `DescriptorSpec`s keyed by heading:
//!
//! ```json
//! {
//!   "mw": {"type": "num", "name": "Molecular weight", "calculatorSoftware": "drp",
//!          "calculatorSoftwareVersion": "1", "minimum": 0},
//!   "colour": {"type": "cat", "name": "Colour", "calculatorSoftware": "drp",
//!              "calculatorSoftwareVersion": "1", "permittedValues": ["red", "blue"]}
//! }
//! ```
//!
//! `LazyDescriptorSet` keeps such a map and resolves it into the registry on first use.
//! The registry also answers model-building queries: which descriptors belong to a list
//! of headings read from a header file.
use crate::Descriptors::descriptor::{
    BoolDescriptor, CatDescriptor, Descriptor, DescriptorError, DescriptorKind, DescriptorMeta,
    NumDescriptor, OrdDescriptor,
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// declarative description of one descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DescriptorSpec {
    #[serde(rename = "bool")]
    Bool {
        name: String,
        #[serde(rename = "calculatorSoftware")]
        calculator_software: String,
        #[serde(rename = "calculatorSoftwareVersion")]
        calculator_software_version: String,
    },
    #[serde(rename = "num")]
    Num {
        name: String,
        #[serde(rename = "calculatorSoftware")]
        calculator_software: String,
        #[serde(rename = "calculatorSoftwareVersion")]
        calculator_software_version: String,
        #[serde(default)]
        minimum: Option<f64>,
        #[serde(default)]
        maximum: Option<f64>,
    },
    #[serde(rename = "ord")]
    Ord {
        name: String,
        #[serde(rename = "calculatorSoftware")]
        calculator_software: String,
        #[serde(rename = "calculatorSoftwareVersion")]
        calculator_software_version: String,
        #[serde(default)]
        minimum: Option<i64>,
        #[serde(default)]
        maximum: Option<i64>,
    },
    #[serde(rename = "cat")]
    Cat {
        name: String,
        #[serde(rename = "calculatorSoftware")]
        calculator_software: String,
        #[serde(rename = "calculatorSoftwareVersion")]
        calculator_software_version: String,
        #[serde(default, rename = "permittedValues")]
        permitted_values: Vec<String>,
    },
}

impl DescriptorSpec {
    /// builds the descriptor this spec describes under the given heading
    pub fn build(&self, heading: &str) -> Descriptor {
        match self {
            DescriptorSpec::Bool {
                name,
                calculator_software,
                calculator_software_version,
            } => BoolDescriptor::new(DescriptorMeta::new(
                heading,
                name,
                calculator_software,
                calculator_software_version,
            ))
            .into(),
            DescriptorSpec::Num {
                name,
                calculator_software,
                calculator_software_version,
                minimum,
                maximum,
            } => NumDescriptor::new(
                DescriptorMeta::new(heading, name, calculator_software, calculator_software_version),
                *minimum,
                *maximum,
            )
            .into(),
            DescriptorSpec::Ord {
                name,
                calculator_software,
                calculator_software_version,
                minimum,
                maximum,
            } => OrdDescriptor::new(
                DescriptorMeta::new(heading, name, calculator_software, calculator_software_version),
                *minimum,
                *maximum,
            )
            .into(),
            DescriptorSpec::Cat {
                name,
                calculator_software,
                calculator_software_version,
                permitted_values,
            } => CatDescriptor::new(
                DescriptorMeta::new(heading, name, calculator_software, calculator_software_version),
                permitted_values.clone(),
            )
            .into(),
        }
    }
}

/// parses a heading -> spec map from JSON text
pub fn specs_from_json(text: &str) -> Result<BTreeMap<String, DescriptorSpec>, DescriptorError> {
    serde_json::from_str(text).map_err(|e| DescriptorError::Spec(e.to_string()))
}

#[derive(Debug, Clone, Default)]
pub struct DescriptorRegistry {
    descriptors: Vec<Arc<Descriptor>>,
}

impl DescriptorRegistry {
    pub fn new() -> Self {
        Self {
            descriptors: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Descriptor>> {
        self.descriptors.iter()
    }

    /// looks a descriptor up by its identity
    pub fn get(&self, heading: &str, software: &str, version: &str) -> Option<Arc<Descriptor>> {
        self.descriptors
            .iter()
            .find(|d| {
                let meta = d.meta();
                meta.heading == heading
                    && meta.calculator_software == software
                    && meta.calculator_software_version == version
            })
            .cloned()
    }

    /// looks a descriptor up by the header it exports under
    pub fn by_csv_header(&self, header: &str) -> Option<Arc<Descriptor>> {
        self.descriptors
            .iter()
            .find(|d| d.csv_header() == header)
            .cloned()
    }

    /// Returns the registered descriptor with the same identity, registering `descriptor`
    /// first if there is none. Categorical descriptors gain any new permitted values. A
    /// descriptor of another kind under the same identity is a conflict.
    pub fn get_or_create(
        &mut self,
        descriptor: Descriptor,
    ) -> Result<Arc<Descriptor>, DescriptorError> {
        descriptor
            .clean()
            .map_err(|errors| DescriptorError::Invalid {
                heading: descriptor.heading().to_string(),
                errors,
            })?;
        let key = descriptor.meta().key();
        let Some(position) = self
            .descriptors
            .iter()
            .position(|d| d.meta().key() == key)
        else {
            debug!("registering {} descriptor {}", descriptor.kind_name(), descriptor.csv_header());
            let descriptor = Arc::new(descriptor);
            self.descriptors.push(descriptor.clone());
            return Ok(descriptor);
        };

        let existing = &self.descriptors[position];
        if existing.kind_name() != descriptor.kind_name() {
            return Err(DescriptorError::KindConflict {
                heading: descriptor.heading().to_string(),
                existing: existing.kind_name(),
                requested: descriptor.kind_name(),
            });
        }
        if let (Descriptor::Categorical(old), Descriptor::Categorical(new)) =
            (existing.as_ref(), &descriptor)
        {
            let missing: Vec<&String> = new
                .permitted_values
                .iter()
                .filter(|v| !old.permitted_values.contains(v))
                .collect();
            if !missing.is_empty() {
                let mut merged = old.clone();
                for value in missing {
                    merged.permit(value);
                }
                info!(
                    "descriptor {} now permits {:?}",
                    merged.meta.heading, merged.permitted_values
                );
                self.descriptors[position] = Arc::new(Descriptor::Categorical(merged));
            }
        }
        Ok(self.descriptors[position].clone())
    }

    /// registers every spec of the map, keyed by heading
    pub fn register_specs(
        &mut self,
        specs: &BTreeMap<String, DescriptorSpec>,
    ) -> Result<BTreeMap<String, Arc<Descriptor>>, DescriptorError> {
        let mut resolved = BTreeMap::new();
        for (heading, spec) in specs {
            let descriptor = self.get_or_create(spec.build(heading))?;
            resolved.insert(heading.clone(), descriptor);
        }
        Ok(resolved)
    }

    /// descriptors whose heading is one of `headings`, in registry order
    pub fn by_headings(&self, headings: &[String]) -> Vec<Arc<Descriptor>> {
        let found: Vec<Arc<Descriptor>> = self
            .descriptors
            .iter()
            .filter(|d| headings.iter().any(|h| h == d.heading()))
            .cloned()
            .collect();
        for heading in headings {
            if !found.iter().any(|d| d.heading() == heading) {
                warn!("no descriptor with heading {}", heading);
            }
        }
        found
    }
}

/// Reads a descriptor header file: one heading per line, surrounding whitespace removed,
/// blank lines skipped.
pub fn load_header_file(path: &Path) -> std::io::Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// A map of descriptor specs that is registered the first time it is read.
#[derive(Debug, Clone)]
pub struct LazyDescriptorSet {
    specs: BTreeMap<String, DescriptorSpec>,
    resolved: Option<BTreeMap<String, Arc<Descriptor>>>,
}

impl LazyDescriptorSet {
    pub fn new(specs: BTreeMap<String, DescriptorSpec>) -> Self {
        Self {
            specs,
            resolved: None,
        }
    }

    pub fn from_json(text: &str) -> Result<Self, DescriptorError> {
        Ok(Self::new(specs_from_json(text)?))
    }

    pub fn is_initialised(&self) -> bool {
        self.resolved.is_some()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// declared headings, available without touching the registry
    pub fn contains(&self, heading: &str) -> bool {
        self.specs.contains_key(heading)
    }

    fn initialise(
        &mut self,
        registry: &mut DescriptorRegistry,
    ) -> Result<&BTreeMap<String, Arc<Descriptor>>, DescriptorError> {
        if self.resolved.is_none() {
            self.resolved = Some(registry.register_specs(&self.specs)?);
        }
        Ok(self.resolved.get_or_insert_with(BTreeMap::new))
    }

    /// The descriptor declared under `heading`, as the registry currently holds it: a
    /// categorical descriptor may have gained values since the set was resolved, and a
    /// registry that lost the descriptor gets it back.
    pub fn get(
        &mut self,
        registry: &mut DescriptorRegistry,
        heading: &str,
    ) -> Result<Option<Arc<Descriptor>>, DescriptorError> {
        let Some(resolved) = self.initialise(registry)?.get(heading).cloned() else {
            return Ok(None);
        };
        current(registry, &resolved).map(Some)
    }

    /// all descriptors of the set, registering them if needed
    pub fn descriptors(
        &mut self,
        registry: &mut DescriptorRegistry,
    ) -> Result<Vec<Arc<Descriptor>>, DescriptorError> {
        let resolved: Vec<Arc<Descriptor>> = self.initialise(registry)?.values().cloned().collect();
        resolved.iter().map(|d| current(registry, d)).collect()
    }
}

fn current(
    registry: &mut DescriptorRegistry,
    descriptor: &Arc<Descriptor>,
) -> Result<Arc<Descriptor>, DescriptorError> {
    let meta = descriptor.meta();
    match registry.get(
        &meta.heading,
        &meta.calculator_software,
        &meta.calculator_software_version,
    ) {
        Some(registered) => Ok(registered),
        None => registry.get_or_create(descriptor.as_ref().clone()),
    }
}
