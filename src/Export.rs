/// flattening of compounds and reactions into ordered columns and rows shared by both
/// output formats
pub mod table;
/// CSV and ARFF writers
/// # Examples
/// ```
/// use drp_data::Compounds::compound::Compound;
/// use drp_data::Compounds::compound_guide::CompoundGuide;
/// use drp_data::Export::table::compound_table;
/// use drp_data::Export::writers::write_csv;
/// let mut guide = CompoundGuide::new();
/// guide.add(Compound::new("NaCl", "sodium chloride", "Norquist").with_formula("NaCl")).unwrap();
/// let table = compound_table(&guide, guide.compounds(), false).unwrap();
/// let mut out = Vec::new();
/// write_csv(&table, &mut out).unwrap();
/// assert_eq!(
///     String::from_utf8(out).unwrap(),
///     "abbrev,name,CSID,INCHI,smiles,formula,custom\nNaCl,sodium chloride,,,,NaCl,False\n"
/// );
/// ```
pub mod writers;
/// reaction datasets restricted to predictor and response descriptors, for model builders
pub mod model_input;
#[cfg(test)]
mod export_tests;
