//! # Descriptor taxonomy
//!
//! A descriptor is a named quantity that describes a system such as a compound or a
//! reaction. Every descriptor shares the same identity (`DescriptorMeta`): a short
//! heading, a full name and the software (and its version) that calculates it. The
//! identity `(heading, calculator_software, calculator_software_version)` is unique.
//!
//! Four kinds exist, each with its own bounds and header rendering:
//!
//! | kind | extra data | ARFF attribute type |
//! |------|------------|---------------------|
//! | boolean | none | `{True, False}` |
//! | numeric | optional min/max (`f64`) | `numeric` |
//! | ordinal | min/max (`i64`) | `{min,...,max}` |
//! | categorical | permitted values | `{v1,v2,...}` |
//!
//! The kinds are held in the `Descriptor` enum; the common behaviour lives in the
//! `DescriptorKind` trait and is dispatched with `enum_dispatch`.
use crate::Descriptors::values::DescriptorValue;
use crate::validation::{ValidationError, ValidationErrors};
use enum_dispatch::enum_dispatch;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

/// largest number of levels an ordinal descriptor may span, `maximum - minimum + 1`
pub const MAX_ORDINAL_LEVELS: i128 = 10_000;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DescriptorError {
    #[error("ordinal descriptor {0} needs both a minimum and a maximum to build an ARFF header")]
    UnboundedOrdinal(String),
    #[error("ordinal descriptor {heading} spans {levels} levels, too many for an ARFF header")]
    TooManyLevels { heading: String, levels: i128 },
    #[error("descriptor {heading} already exists as a {existing} descriptor, not {requested}")]
    KindConflict {
        heading: String,
        existing: &'static str,
        requested: &'static str,
    },
    #[error("invalid descriptor {heading}: {errors}")]
    Invalid {
        heading: String,
        errors: ValidationErrors,
    },
    #[error("invalid descriptor specification: {0}")]
    Spec(String),
    #[error("unknown descriptor plugin: {0}")]
    UnknownPlugin(String),
    #[error("descriptor calculation failed: {0}")]
    Calculation(String),
}

fn heading_regex() -> &'static Regex {
    static HEADING: OnceLock<Regex> = OnceLock::new();
    HEADING.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]+$").expect("heading pattern is valid"))
}

fn slug_strip_regex() -> &'static Regex {
    static STRIP: OnceLock<Regex> = OnceLock::new();
    STRIP.get_or_init(|| Regex::new(r"[^\w\s-]").expect("slug pattern is valid"))
}

fn slug_dash_regex() -> &'static Regex {
    static DASH: OnceLock<Regex> = OnceLock::new();
    DASH.get_or_init(|| Regex::new(r"[-\s]+").expect("slug pattern is valid"))
}

/// Turns free text into a header-safe token: accented letters lose their accents (NFKD),
/// other non-ASCII characters and punctuation are dropped, the rest is trimmed and
/// lowercased, and runs of spaces or hyphens become a single `_`.
/// `"Chem Axon-Calculator"` -> `"chem_axon_calculator"`, `"Café"` -> `"cafe"`.
pub fn slugify(text: &str) -> String {
    let ascii: String = text.nfkd().filter(char::is_ascii).collect();
    let stripped = slug_strip_regex().replace_all(&ascii, "");
    let lowered = stripped.trim().to_lowercase();
    slug_dash_regex()
        .replace_all(&lowered, "-")
        .replace('-', "_")
}

fn needs_arff_quotes(value: &str) -> bool {
    value.is_empty() || value.contains([',', ' ', '\t', '\'', '"', '%', '\n', '\r'])
}

/// An ARFF token: double quoted with `\` escapes when it holds a separator, whitespace,
/// a quote, `%` or a line break, or when `always` is set. Used for data values and for
/// nominal values in attribute headers alike.
pub fn arff_quote(value: &str, always: bool) -> String {
    if !always && !needs_arff_quotes(value) {
        return value.to_string();
    }
    let escaped = value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r");
    format!("\"{}\"", escaped)
}

/// identity shared by all descriptor kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptorMeta {
    pub heading: String,
    pub name: String,
    pub calculator_software: String,
    pub calculator_software_version: String,
}

impl DescriptorMeta {
    pub fn new(heading: &str, name: &str, software: &str, version: &str) -> Self {
        Self {
            heading: heading.to_string(),
            name: name.to_string(),
            calculator_software: software.to_string(),
            calculator_software_version: version.to_string(),
        }
    }

    pub fn csv_header(&self) -> String {
        format!(
            "{}_{}_{}",
            self.heading,
            slugify(&self.calculator_software),
            self.calculator_software_version
        )
    }

    pub fn key(&self) -> (String, String, String) {
        (
            self.heading.clone(),
            self.calculator_software.clone(),
            self.calculator_software_version.clone(),
        )
    }

    pub fn clean(&self) -> Result<(), ValidationError> {
        if heading_regex().is_match(&self.heading) {
            Ok(())
        } else {
            Err(ValidationError::new(
                "invalid_heading",
                "Please include only values which are limited to alphanumeric characters and underscores, and must start with an alphabetic character.",
            ))
        }
    }
}

fn max_min_mix() -> ValidationError {
    ValidationError::new(
        "max_min_mix",
        "The maximum value cannot be lower than the minimum value",
    )
}

fn wrong_type(meta: &DescriptorMeta, expected: &str, value: &DescriptorValue) -> ValidationError {
    ValidationError::new(
        "wrong_type",
        format!(
            "Descriptor {} takes {} values, got {}",
            meta.heading,
            expected,
            value.kind_name()
        ),
    )
}

fn out_of_range(meta: &DescriptorMeta, value: &dyn fmt::Display) -> ValidationError {
    ValidationError::new(
        "out_of_range",
        format!("Value {} is outside the range of descriptor {}", value, meta.heading),
    )
}

/// behaviour common to every descriptor kind
#[enum_dispatch]
pub trait DescriptorKind {
    fn meta(&self) -> &DescriptorMeta;

    /// `"boolean"`, `"numeric"`, `"ordinal"` or `"categorical"`
    fn kind_name(&self) -> &'static str;

    /// type part of the ARFF attribute line
    fn arff_type(&self) -> Result<String, DescriptorError>;

    /// kind specific consistency of the descriptor itself
    fn clean_bounds(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    /// checks that a value can be recorded against this descriptor
    fn check_value(&self, value: &DescriptorValue) -> Result<(), ValidationError>;

    fn heading(&self) -> &str {
        &self.meta().heading
    }

    fn csv_header(&self) -> String {
        self.meta().csv_header()
    }

    fn arff_header(&self) -> Result<String, DescriptorError> {
        Ok(format!("@attribute {} {}", self.csv_header(), self.arff_type()?))
    }

    /// heading format and bounds, every problem reported
    fn clean(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(e) = self.meta().clean() {
            errors.push(e);
        }
        if let Err(e) = self.clean_bounds() {
            errors.push(e);
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoolDescriptor {
    pub meta: DescriptorMeta,
}

impl BoolDescriptor {
    pub fn new(meta: DescriptorMeta) -> Self {
        Self { meta }
    }
}

impl DescriptorKind for BoolDescriptor {
    fn meta(&self) -> &DescriptorMeta {
        &self.meta
    }
    fn kind_name(&self) -> &'static str {
        "boolean"
    }
    fn arff_type(&self) -> Result<String, DescriptorError> {
        Ok("{True, False}".to_string())
    }
    fn check_value(&self, value: &DescriptorValue) -> Result<(), ValidationError> {
        match value {
            DescriptorValue::Bool(_) => Ok(()),
            other => Err(wrong_type(&self.meta, "boolean", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumDescriptor {
    pub meta: DescriptorMeta,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
}

impl NumDescriptor {
    pub fn new(meta: DescriptorMeta, minimum: Option<f64>, maximum: Option<f64>) -> Self {
        Self {
            meta,
            minimum,
            maximum,
        }
    }
}

impl DescriptorKind for NumDescriptor {
    fn meta(&self) -> &DescriptorMeta {
        &self.meta
    }
    fn kind_name(&self) -> &'static str {
        "numeric"
    }
    fn arff_type(&self) -> Result<String, DescriptorError> {
        Ok("numeric".to_string())
    }
    fn clean_bounds(&self) -> Result<(), ValidationError> {
        match (self.minimum, self.maximum) {
            (Some(min), Some(max)) if max < min => Err(max_min_mix()),
            _ => Ok(()),
        }
    }
    fn check_value(&self, value: &DescriptorValue) -> Result<(), ValidationError> {
        let DescriptorValue::Num(x) = value else {
            return Err(wrong_type(&self.meta, "numeric", value));
        };
        if x.is_nan() {
            return Err(out_of_range(&self.meta, x));
        }
        let below = self.minimum.is_some_and(|min| *x < min);
        let above = self.maximum.is_some_and(|max| *x > max);
        if below || above {
            return Err(out_of_range(&self.meta, x));
        }
        Ok(())
    }
}

fn level_count(min: i64, max: i64) -> i128 {
    i128::from(max) - i128::from(min) + 1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrdDescriptor {
    pub meta: DescriptorMeta,
    pub minimum: Option<i64>,
    pub maximum: Option<i64>,
}

impl OrdDescriptor {
    pub fn new(meta: DescriptorMeta, minimum: Option<i64>, maximum: Option<i64>) -> Self {
        Self {
            meta,
            minimum,
            maximum,
        }
    }
}

impl DescriptorKind for OrdDescriptor {
    fn meta(&self) -> &DescriptorMeta {
        &self.meta
    }
    fn kind_name(&self) -> &'static str {
        "ordinal"
    }
    fn arff_type(&self) -> Result<String, DescriptorError> {
        let (Some(min), Some(max)) = (self.minimum, self.maximum) else {
            return Err(DescriptorError::UnboundedOrdinal(self.meta.heading.clone()));
        };
        let levels = level_count(min, max);
        if levels > MAX_ORDINAL_LEVELS {
            return Err(DescriptorError::TooManyLevels {
                heading: self.meta.heading.clone(),
                levels,
            });
        }
        let levels: Vec<String> = (min..=max).map(|i| i.to_string()).collect();
        Ok(format!("{{{}}}", levels.join(",")))
    }
    fn clean_bounds(&self) -> Result<(), ValidationError> {
        match (self.minimum, self.maximum) {
            (Some(min), Some(max)) if max < min => Err(max_min_mix()),
            (Some(min), Some(max)) if level_count(min, max) > MAX_ORDINAL_LEVELS => {
                Err(ValidationError::new(
                    "too_many_levels",
                    format!(
                        "An ordinal descriptor may span at most {} values",
                        MAX_ORDINAL_LEVELS
                    ),
                ))
            }
            _ => Ok(()),
        }
    }
    fn check_value(&self, value: &DescriptorValue) -> Result<(), ValidationError> {
        let DescriptorValue::Ord(x) = value else {
            return Err(wrong_type(&self.meta, "ordinal", value));
        };
        let below = self.minimum.is_some_and(|min| *x < min);
        let above = self.maximum.is_some_and(|max| *x > max);
        if below || above {
            return Err(out_of_range(&self.meta, x));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatDescriptor {
    pub meta: DescriptorMeta,
    pub permitted_values: Vec<String>,
}

impl CatDescriptor {
    pub fn new(meta: DescriptorMeta, permitted_values: Vec<String>) -> Self {
        let mut descriptor = Self {
            meta,
            permitted_values: Vec::new(),
        };
        for value in permitted_values {
            descriptor.permit(&value);
        }
        descriptor
    }

    /// adds a permitted value; a value already present is ignored
    pub fn permit(&mut self, value: &str) -> bool {
        if self.permitted_values.iter().any(|v| v == value) {
            false
        } else {
            self.permitted_values.push(value.to_string());
            true
        }
    }
}

impl DescriptorKind for CatDescriptor {
    fn meta(&self) -> &DescriptorMeta {
        &self.meta
    }
    fn kind_name(&self) -> &'static str {
        "categorical"
    }
    fn arff_type(&self) -> Result<String, DescriptorError> {
        let values: Vec<String> = self
            .permitted_values
            .iter()
            .map(|v| arff_quote(v, false))
            .collect();
        Ok(format!("{{{}}}", values.join(",")))
    }
    fn check_value(&self, value: &DescriptorValue) -> Result<(), ValidationError> {
        let DescriptorValue::Cat(x) = value else {
            return Err(wrong_type(&self.meta, "categorical", value));
        };
        if self.permitted_values.iter().any(|v| v == x) {
            Ok(())
        } else {
            Err(ValidationError::new(
                "not_permitted",
                format!("{} is not a permitted value of descriptor {}", x, self.meta.heading),
            ))
        }
    }
}

/// any descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[enum_dispatch(DescriptorKind)]
pub enum Descriptor {
    Boolean(BoolDescriptor),
    Numeric(NumDescriptor),
    Ordinal(OrdDescriptor),
    Categorical(CatDescriptor),
}

impl Descriptor {
    /// position of the kind in export order: boolean, numeric, ordinal, categorical
    pub fn kind_rank(&self) -> usize {
        match self {
            Descriptor::Boolean(_) => 0,
            Descriptor::Numeric(_) => 1,
            Descriptor::Ordinal(_) => 2,
            Descriptor::Categorical(_) => 3,
        }
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.meta().name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(heading: &str) -> DescriptorMeta {
        DescriptorMeta::new(heading, "Full name", "ChemAxon Calculator", "5.0")
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("ChemAxon"), "chemaxon");
        assert_eq!(slugify("Chem Axon-Calculator"), "chem_axon_calculator");
        assert_eq!(slugify("  RDKit (python)  "), "rdkit_python");
        assert_eq!(slugify("a -- b"), "a_b");
        assert_eq!(slugify("Café"), "cafe");
        assert_eq!(slugify("Müller Tools"), "muller_tools");
        assert_eq!(slugify("ﬁne Ångström"), "fine_angstrom");
    }

    #[test]
    fn test_csv_header() {
        let d = meta("mw");
        assert_eq!(d.csv_header(), "mw_chemaxon_calculator_5.0");
    }

    #[test]
    fn test_heading_validation() {
        assert!(meta("mw").clean().is_ok());
        assert!(meta("polar_surface_area2").clean().is_ok());
        for bad in ["m", "2mw", "_mw", "mw-x", "mw x", ""] {
            let err = meta(bad).clean().unwrap_err();
            assert_eq!(err.code, "invalid_heading", "heading {:?}", bad);
        }
    }

    #[test]
    fn test_arff_headers() {
        let b: Descriptor = BoolDescriptor::new(meta("aromatic")).into();
        assert_eq!(
            b.arff_header().unwrap(),
            "@attribute aromatic_chemaxon_calculator_5.0 {True, False}"
        );
        let n: Descriptor = NumDescriptor::new(meta("mw"), Some(0.0), None).into();
        assert_eq!(
            n.arff_header().unwrap(),
            "@attribute mw_chemaxon_calculator_5.0 numeric"
        );
        let o: Descriptor = OrdDescriptor::new(meta("donors"), Some(1), Some(4)).into();
        assert_eq!(
            o.arff_header().unwrap(),
            "@attribute donors_chemaxon_calculator_5.0 {1,2,3,4}"
        );
        let c: Descriptor = CatDescriptor::new(
            meta("colour"),
            vec!["red".to_string(), "blue".to_string(), "red".to_string()],
        )
        .into();
        assert_eq!(
            c.arff_header().unwrap(),
            "@attribute colour_chemaxon_calculator_5.0 {red,blue}"
        );
    }

    #[test]
    fn test_nominal_values_are_quoted_in_headers() {
        let c: Descriptor = CatDescriptor::new(
            meta("shade"),
            vec!["dark red".to_string(), "a,b".to_string(), "say \"hi\"".to_string(), "blue".to_string()],
        )
        .into();
        assert_eq!(
            c.arff_type().unwrap(),
            "{\"dark red\",\"a,b\",\"say \\\"hi\\\"\",blue}"
        );
        assert_eq!(arff_quote("blue", true), "\"blue\"");
        assert_eq!(arff_quote("", false), "\"\"");
    }

    #[test]
    fn test_wide_ordinal_is_rejected() {
        let wide: Descriptor = OrdDescriptor::new(meta("count"), Some(0), Some(i64::MAX)).into();
        assert!(wide.clean().unwrap_err().has_code("too_many_levels"));
        assert!(matches!(
            wide.arff_type(),
            Err(DescriptorError::TooManyLevels { .. })
        ));
        let full: Descriptor = OrdDescriptor::new(meta("count"), Some(i64::MIN), Some(i64::MAX)).into();
        assert!(full.clean().unwrap_err().has_code("too_many_levels"));

        let widest: Descriptor = OrdDescriptor::new(meta("count"), Some(1), Some(10_000)).into();
        assert!(widest.clean().is_ok());
        assert!(widest.arff_type().unwrap().ends_with(",10000}"));
    }

    #[test]
    fn test_unbounded_ordinal_has_no_arff_header() {
        let o: Descriptor = OrdDescriptor::new(meta("donors"), Some(1), None).into();
        assert_eq!(
            o.arff_header(),
            Err(DescriptorError::UnboundedOrdinal("donors".to_string()))
        );
    }

    #[test]
    fn test_max_min_mix() {
        let n: Descriptor = NumDescriptor::new(meta("mw"), Some(10.0), Some(1.0)).into();
        let errors = n.clean().unwrap_err();
        assert!(errors.has_code("max_min_mix"));
        let o: Descriptor = OrdDescriptor::new(meta("donors"), Some(3), Some(2)).into();
        assert!(o.clean().unwrap_err().has_code("max_min_mix"));
        let o: Descriptor = OrdDescriptor::new(meta("donors"), Some(2), Some(2)).into();
        assert!(o.clean().is_ok());
        // both problems reported together
        let bad: Descriptor = NumDescriptor::new(meta("9"), Some(1.0), Some(0.0)).into();
        assert_eq!(bad.clean().unwrap_err().len(), 2);
    }

    #[test]
    fn test_check_value() {
        let n: Descriptor = NumDescriptor::new(meta("mw"), Some(0.0), Some(500.0)).into();
        assert!(n.check_value(&DescriptorValue::Num(18.0)).is_ok());
        assert_eq!(
            n.check_value(&DescriptorValue::Num(-1.0)).unwrap_err().code,
            "out_of_range"
        );
        assert_eq!(
            n.check_value(&DescriptorValue::Num(f64::NAN)).unwrap_err().code,
            "out_of_range"
        );
        assert_eq!(
            n.check_value(&DescriptorValue::Bool(true)).unwrap_err().code,
            "wrong_type"
        );

        let o: Descriptor = OrdDescriptor::new(meta("donors"), Some(0), Some(3)).into();
        assert!(o.check_value(&DescriptorValue::Ord(3)).is_ok());
        assert_eq!(
            o.check_value(&DescriptorValue::Ord(4)).unwrap_err().code,
            "out_of_range"
        );

        let c: Descriptor =
            CatDescriptor::new(meta("colour"), vec!["red".to_string()]).into();
        assert!(c.check_value(&DescriptorValue::Cat("red".to_string())).is_ok());
        assert_eq!(
            c.check_value(&DescriptorValue::Cat("green".to_string()))
                .unwrap_err()
                .code,
            "not_permitted"
        );

        let b: Descriptor = BoolDescriptor::new(meta("aromatic")).into();
        assert!(b.check_value(&DescriptorValue::Bool(false)).is_ok());
        assert_eq!(
            b.check_value(&DescriptorValue::Ord(1)).unwrap_err().code,
            "wrong_type"
        );
    }

    #[test]
    fn test_kind_rank_and_display() {
        let c: Descriptor = CatDescriptor::new(meta("colour"), vec![]).into();
        let b: Descriptor = BoolDescriptor::new(meta("aromatic")).into();
        assert!(b.kind_rank() < c.kind_rank());
        assert_eq!(c.to_string(), "Full name");
        assert_eq!(c.kind_name(), "categorical");
        assert_eq!(c.heading(), "colour");
    }
}
