/// descriptor kinds (boolean, numeric, ordinal, categorical), their identity, validation and
/// CSV/ARFF header rendering
pub mod descriptor;
/// values recorded against descriptors
pub mod values;
/// the set of known descriptors, declarative descriptor specifications and lazily
/// registered descriptor sets
/// # Examples
/// ```
/// use drp_data::Descriptors::registry::{DescriptorRegistry, LazyDescriptorSet};
/// use drp_data::Descriptors::descriptor::DescriptorKind;
/// let mut registry = DescriptorRegistry::new();
/// let mut set = LazyDescriptorSet::from_json(
///     r#"{"mw": {"type": "num", "name": "Molecular weight", "calculatorSoftware": "ChemAxon",
///                "calculatorSoftwareVersion": "5.0", "minimum": 0}}"#,
/// ).unwrap();
/// let mw = set.get(&mut registry, "mw").unwrap().unwrap();
/// assert_eq!(mw.csv_header(), "mw_chemaxon_5.0");
/// assert_eq!(mw.arff_header().unwrap(), "@attribute mw_chemaxon_5.0 numeric");
/// ```
pub mod registry;
/// calculators that fill in descriptor values for compounds
pub mod plugins;
