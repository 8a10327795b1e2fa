/// Module to parse molecular formulae written in subscript-brace notation and to calculate
/// the atomic composition and molar mass of a compound.
///
/// A formula is a sequence of element symbols, each optionally followed by `_{N}`:
/// `C_{4}H_{8}O` is {"C": 4, "H": 8, "O": 1}. The underscore is cosmetic and is skipped
/// wherever it appears outside braces; repeated symbols accumulate.
use crate::Compounds::periodic_table::find_element;
use crate::validation::ValidationError;
use log::debug;
use nalgebra::DMatrix;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// element symbol -> stoichiometry
pub type Elements = BTreeMap<String, f64>;

pub const MALFORMED_MESSAGE: &str = "Invalid molecular formula format.";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    #[error("unexpected character '{character}' at position {position}")]
    UnexpectedCharacter { character: char, position: usize },
    #[error("lowercase letter '{character}' at position {position} does not follow an element symbol")]
    DanglingLowercase { character: char, position: usize },
    #[error("stoichiometry at position {position} does not follow an element symbol")]
    OrphanStoichiometry { position: usize },
    #[error("empty stoichiometry for element {element}")]
    EmptyStoichiometry { element: String },
    #[error("invalid stoichiometry '{value}' for element {element}")]
    InvalidStoichiometry { element: String, value: String },
    #[error("unterminated stoichiometry for element {element}")]
    UnterminatedStoichiometry { element: String },
    #[error("unknown element(s): {0}")]
    UnknownElement(String),
}

enum State {
    Outside,
    InBraces,
}

fn add_count(elements: &mut Elements, symbol: &str, count: f64) {
    *elements.entry(symbol.to_string()).or_insert(0.0) += count;
}

/// Parses a formula into a map of element symbols and their stoichiometries.
///
/// Single pass over the characters. An uppercase letter closes the previous symbol (counted
/// once) and opens a new one, lowercase letters extend the open symbol, `{...}` assigns the
/// open symbol an explicit stoichiometry and closes it. Anything else is an error, so a
/// formula either parses completely or not at all. An empty formula gives an empty map.
pub fn parse_elements(formula: &str) -> Result<Elements, FormulaError> {
    let mut elements = Elements::new();
    let mut state = State::Outside;
    let mut current = String::new();
    let mut stoichiometry = String::new();

    for (position, c) in formula.chars().enumerate() {
        match state {
            State::InBraces => {
                if c.is_ascii_digit() || c == '.' {
                    stoichiometry.push(c);
                } else if c == '}' {
                    if stoichiometry.is_empty() {
                        return Err(FormulaError::EmptyStoichiometry { element: current });
                    }
                    let count: f64 =
                        stoichiometry
                            .parse()
                            .map_err(|_| FormulaError::InvalidStoichiometry {
                                element: current.clone(),
                                value: stoichiometry.clone(),
                            })?;
                    add_count(&mut elements, &current, count);
                    current.clear();
                    stoichiometry.clear();
                    state = State::Outside;
                } else {
                    return Err(FormulaError::UnexpectedCharacter {
                        character: c,
                        position,
                    });
                }
            }
            State::Outside => {
                if c.is_ascii_uppercase() {
                    if !current.is_empty() {
                        add_count(&mut elements, &current, 1.0);
                    }
                    current.clear();
                    current.push(c);
                } else if c.is_ascii_lowercase() {
                    if current.is_empty() {
                        return Err(FormulaError::DanglingLowercase {
                            character: c,
                            position,
                        });
                    }
                    current.push(c);
                } else if c == '{' {
                    if current.is_empty() {
                        return Err(FormulaError::OrphanStoichiometry { position });
                    }
                    state = State::InBraces;
                } else if c == '_' {
                    continue;
                } else {
                    return Err(FormulaError::UnexpectedCharacter {
                        character: c,
                        position,
                    });
                }
            }
        }
    }

    if let State::InBraces = state {
        return Err(FormulaError::UnterminatedStoichiometry { element: current });
    }
    if !current.is_empty() {
        add_count(&mut elements, &current, 1.0);
    }
    debug!("parsed formula {} into {:?}", formula, elements);
    Ok(elements)
}

/// validator form of `parse_elements`: every parse failure is reported as `mol_malform`
pub fn validate_formula(formula: &str) -> Result<(), ValidationError> {
    parse_elements(formula)
        .map(|_| ())
        .map_err(|e| {
            debug!("formula {} rejected: {}", formula, e);
            ValidationError::new("mol_malform", MALFORMED_MESSAGE)
        })
}

pub fn is_known_element(symbol: &str) -> bool {
    find_element(symbol).is_some()
}

/// symbols in the map that are not in the periodic table
pub fn unknown_elements(elements: &Elements) -> Vec<String> {
    elements
        .keys()
        .filter(|symbol| !is_known_element(symbol))
        .cloned()
        .collect()
}

// Function to calculate the molar mass of a substance given its element composition
pub fn molar_mass(elements: &Elements) -> Result<f64, FormulaError> {
    let unknown = unknown_elements(elements);
    if !unknown.is_empty() {
        return Err(FormulaError::UnknownElement(unknown.join(", ")));
    }
    Ok(elements
        .iter()
        .filter_map(|(symbol, count)| find_element(symbol).map(|e| e.atomic_mass * count))
        .sum())
}

/// parses the formula and returns its molar mass together with the composition
pub fn calculate_molar_mass(formula: &str) -> Result<(f64, Elements), FormulaError> {
    let elements = parse_elements(formula)?;
    let mass = molar_mass(&elements)?;
    Ok((mass, elements))
}

/// total number of atoms, fractional stoichiometries included
pub fn atom_count(elements: &Elements) -> f64 {
    elements.values().sum()
}

/// Element composition matrix: one row per composition, one column per element symbol.
/// Columns are the sorted union of all symbols, returned alongside the matrix.
pub fn composition_matrix(compositions: &[Elements]) -> (DMatrix<f64>, Vec<String>) {
    let symbols: Vec<String> = compositions
        .iter()
        .flat_map(|elements| elements.keys().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let mut matrix = DMatrix::zeros(compositions.len(), symbols.len());
    for (row, elements) in compositions.iter().enumerate() {
        for (col, symbol) in symbols.iter().enumerate() {
            if let Some(count) = elements.get(symbol) {
                matrix[(row, col)] = *count;
            }
        }
    }
    (matrix, symbols)
}

/// Writes a composition back in subscript-brace notation, symbols in Hill order
/// (C, H, then alphabetical; alphabetical only when there is no carbon).
pub fn format_formula(elements: &Elements) -> String {
    let mut order: Vec<&String> = Vec::with_capacity(elements.len());
    let has_carbon = elements.contains_key("C");
    if has_carbon {
        for first in ["C", "H"] {
            if let Some((symbol, _)) = elements.get_key_value(first) {
                order.push(symbol);
            }
        }
    }
    for symbol in elements.keys() {
        if has_carbon && (symbol == "C" || symbol == "H") {
            continue;
        }
        order.push(symbol);
    }
    let mut out = String::new();
    for symbol in order {
        let count = elements[symbol];
        out.push_str(symbol);
        if count != 1.0 {
            out.push_str(&format!("_{{{}}}", count));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn counts(pairs: &[(&str, f64)]) -> Elements {
        pairs.iter().map(|(s, c)| (s.to_string(), *c)).collect()
    }

    #[test]
    fn test_parse_formula() {
        assert_eq!(
            parse_elements("C_{6}H_{8}O_{6}").unwrap(),
            counts(&[("C", 6.0), ("H", 8.0), ("O", 6.0)])
        );
        assert_eq!(
            parse_elements("H_{2}O").unwrap(),
            counts(&[("H", 2.0), ("O", 1.0)])
        );
        // brace without underscore is accepted as well
        assert_eq!(
            parse_elements("Na{2}S{1}O{4}").unwrap(),
            counts(&[("Na", 2.0), ("S", 1.0), ("O", 4.0)])
        );
        assert_eq!(parse_elements("NaCl").unwrap(), counts(&[("Na", 1.0), ("Cl", 1.0)]));
        assert!(parse_elements("").unwrap().is_empty());
    }

    #[test]
    fn test_repeated_symbols_accumulate() {
        assert_eq!(
            parse_elements("CH_{3}CH_{2}OH").unwrap(),
            counts(&[("C", 2.0), ("H", 6.0), ("O", 1.0)])
        );
        // the trailing symbol adds to the earlier occurrences instead of replacing them
        assert_eq!(
            parse_elements("C_{5}H_{6}OOH").unwrap(),
            counts(&[("C", 5.0), ("H", 7.0), ("O", 2.0)])
        );
    }

    #[test]
    fn test_fractional_stoichiometry() {
        let elements = parse_elements("Fe_{0.95}O").unwrap();
        assert_relative_eq!(elements["Fe"], 0.95);
        assert_relative_eq!(elements["O"], 1.0);
    }

    #[test]
    fn test_malformed_formulae() {
        assert!(matches!(
            parse_elements("H2O"),
            Err(FormulaError::UnexpectedCharacter { character: '2', position: 1 })
        ));
        assert!(matches!(
            parse_elements("Ca(NO_{3})_{2}"),
            Err(FormulaError::UnexpectedCharacter { character: '(', .. })
        ));
        assert!(matches!(
            parse_elements("C H"),
            Err(FormulaError::UnexpectedCharacter { character: ' ', .. })
        ));
        assert!(matches!(
            parse_elements("h_{2}"),
            Err(FormulaError::DanglingLowercase { .. })
        ));
        assert!(matches!(
            parse_elements("_{2}"),
            Err(FormulaError::OrphanStoichiometry { position: 1 })
        ));
        assert!(matches!(
            parse_elements("C_{4}_{2}"),
            Err(FormulaError::OrphanStoichiometry { .. })
        ));
        assert!(matches!(
            parse_elements("C_{}"),
            Err(FormulaError::EmptyStoichiometry { .. })
        ));
        assert!(matches!(
            parse_elements("C_{1.2.3}"),
            Err(FormulaError::InvalidStoichiometry { .. })
        ));
        assert!(matches!(
            parse_elements("C_{4"),
            Err(FormulaError::UnterminatedStoichiometry { .. })
        ));
        assert!(matches!(
            parse_elements("C_{4a}"),
            Err(FormulaError::UnexpectedCharacter { character: 'a', .. })
        ));
    }

    #[test]
    fn test_validate_formula() {
        assert!(validate_formula("C_{4}H_{8}").is_ok());
        assert!(validate_formula("").is_ok());
        let err = validate_formula("C4H8").unwrap_err();
        assert_eq!(err.code, "mol_malform");
        assert_eq!(err.message, MALFORMED_MESSAGE);
    }

    #[test]
    fn test_calculate_molar_mass() {
        let (mass, _) = calculate_molar_mass("H_{2}O").unwrap();
        assert_relative_eq!(mass, 18.015, epsilon = 1e-2);

        let (mass, _) = calculate_molar_mass("NaCl").unwrap();
        assert_relative_eq!(mass, 58.44, epsilon = 1e-2);

        let (mass, _) = calculate_molar_mass("C_{6}H_{8}O_{6}").unwrap();
        assert_relative_eq!(mass, 176.12, epsilon = 1e-2);

        let (mass, _) = calculate_molar_mass("CaN_{2}O_{6}").unwrap();
        assert_relative_eq!(mass, 164.09, epsilon = 1e-2);

        assert_eq!(
            calculate_molar_mass("Xy_{2}"),
            Err(FormulaError::UnknownElement("Xy".to_string()))
        );
    }

    #[test]
    fn test_unknown_elements_and_atom_count() {
        let elements = parse_elements("C_{2}Xq_{3}Zz").unwrap();
        assert_eq!(unknown_elements(&elements), vec!["Xq".to_string(), "Zz".to_string()]);
        assert_relative_eq!(atom_count(&elements), 6.0);
        // every unknown symbol is named, not just the first
        assert_eq!(
            molar_mass(&elements),
            Err(FormulaError::UnknownElement("Xq, Zz".to_string()))
        );
        assert!(is_known_element("Cl"));
        assert!(!is_known_element("CL"));
    }

    #[test]
    fn test_element_matrix() {
        let compositions: Vec<Elements> = ["H_{2}O", "NaCl", "C_{3}H_{8}", "CH_{4}"]
            .iter()
            .map(|f| parse_elements(f).unwrap())
            .collect();
        let (matrix, symbols) = composition_matrix(&compositions);
        assert_eq!(matrix.nrows(), 4);
        assert_eq!(matrix.ncols(), 5);
        assert_eq!(symbols, vec!["C", "Cl", "H", "Na", "O"]);
        // propane row
        assert_relative_eq!(matrix[(2, 0)], 3.0);
        assert_relative_eq!(matrix[(2, 2)], 8.0);
        assert_relative_eq!(matrix[(0, 4)], 1.0);
        assert_relative_eq!(matrix[(1, 0)], 0.0);
    }

    #[test]
    fn test_format_formula() {
        let elements = parse_elements("OC_{2}H_{6}").unwrap();
        assert_eq!(format_formula(&elements), "C_{2}H_{6}O");
        let elements = parse_elements("ClNa").unwrap();
        assert_eq!(format_formula(&elements), "ClNa");
        let elements = parse_elements("H_{2}SO_{4}").unwrap();
        assert_eq!(format_formula(&elements), "H_{2}O_{4}S");
        assert_eq!(
            parse_elements(&format_formula(&parse_elements("Fe_{0.5}O").unwrap())).unwrap(),
            parse_elements("Fe_{0.5}O").unwrap()
        );
    }
}
