//! Values recorded against descriptors.
use crate::Descriptors::descriptor::{Descriptor, DescriptorKind};
use crate::validation::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DescriptorValue {
    Bool(bool),
    Num(f64),
    Ord(i64),
    Cat(String),
}

impl DescriptorValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            DescriptorValue::Bool(_) => "boolean",
            DescriptorValue::Num(_) => "numeric",
            DescriptorValue::Ord(_) => "ordinal",
            DescriptorValue::Cat(_) => "categorical",
        }
    }

    /// Reads a value of the kind `descriptor` expects from text, as found in uploaded
    /// tables. Booleans accept True/False/1/0 in any case.
    pub fn parse_for(descriptor: &Descriptor, text: &str) -> Result<Self, ValidationError> {
        let text = text.trim();
        let bad = || {
            ValidationError::new(
                "wrong_type",
                format!(
                    "'{}' is not a valid {} value for descriptor {}",
                    text,
                    descriptor.kind_name(),
                    descriptor.heading()
                ),
            )
        };
        let value = match descriptor {
            Descriptor::Boolean(_) => match text.to_lowercase().as_str() {
                "true" | "1" => DescriptorValue::Bool(true),
                "false" | "0" => DescriptorValue::Bool(false),
                _ => return Err(bad()),
            },
            Descriptor::Numeric(_) => DescriptorValue::Num(text.parse().map_err(|_| bad())?),
            Descriptor::Ordinal(_) => DescriptorValue::Ord(text.parse().map_err(|_| bad())?),
            Descriptor::Categorical(_) => DescriptorValue::Cat(text.to_string()),
        };
        descriptor.check_value(&value)?;
        Ok(value)
    }
}

impl fmt::Display for DescriptorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DescriptorValue::Bool(true) => write!(f, "True"),
            DescriptorValue::Bool(false) => write!(f, "False"),
            DescriptorValue::Num(x) => write!(f, "{}", x),
            DescriptorValue::Ord(x) => write!(f, "{}", x),
            DescriptorValue::Cat(x) => write!(f, "{}", x),
        }
    }
}

/// a checked value together with the descriptor it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct MolDescriptorValue {
    descriptor: Arc<Descriptor>,
    value: DescriptorValue,
}

impl MolDescriptorValue {
    pub fn new(
        descriptor: Arc<Descriptor>,
        value: DescriptorValue,
    ) -> Result<Self, ValidationError> {
        descriptor.check_value(&value)?;
        Ok(Self { descriptor, value })
    }

    pub fn descriptor(&self) -> &Arc<Descriptor> {
        &self.descriptor
    }

    pub fn value(&self) -> &DescriptorValue {
        &self.value
    }

    /// true if both values are recorded against the same descriptor identity
    pub fn same_descriptor(&self, other: &Descriptor) -> bool {
        self.descriptor.meta().key() == other.meta().key()
    }
}

/// Descriptors behind `values`, each once, grouped boolean, numeric, ordinal, categorical
/// and ordered by CSV header inside each group.
///
/// Values recorded before a categorical descriptor gained new permitted values still hold
/// the older version, so the permitted values of every version met are united.
pub fn distinct_descriptors<'a, I>(values: I) -> Vec<Arc<Descriptor>>
where
    I: IntoIterator<Item = &'a MolDescriptorValue>,
{
    let mut found: Vec<Arc<Descriptor>> = Vec::new();
    for value in values {
        let descriptor = value.descriptor();
        let Some(i) = found
            .iter()
            .position(|d| d.meta().key() == descriptor.meta().key())
        else {
            found.push(descriptor.clone());
            continue;
        };
        if let (Descriptor::Categorical(seen), Descriptor::Categorical(other)) =
            (found[i].as_ref(), descriptor.as_ref())
        {
            if other
                .permitted_values
                .iter()
                .any(|v| !seen.permitted_values.contains(v))
            {
                let mut merged = seen.clone();
                for v in &other.permitted_values {
                    merged.permit(v);
                }
                found[i] = Arc::new(Descriptor::Categorical(merged));
            }
        }
    }
    found.sort_by_key(|d| (d.kind_rank(), d.csv_header()));
    found
}
