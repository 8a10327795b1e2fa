/// standard atomic weights of the elements, looked up by symbol
pub mod periodic_table;
/// molecular formulas in subscript-brace notation, e.g. `C_{4}H_{8}O`
/// 1) parsing into an element -> stoichiometry map (`parse_elements`), with every malformed
/// input reported as an error rather than a panic
/// 2) the form validator used by compound records (`validate_formula`, code `mol_malform`)
/// 3) molar mass, atom count and the element composition matrix of a set of formulas
/// # Examples
/// ```
/// use drp_data::Compounds::formula::{calculate_molar_mass, parse_elements};
/// let elements = parse_elements("CH_{3}CH_{2}OH").unwrap();
/// assert_eq!(elements["C"], 2.0);
/// assert_eq!(elements["H"], 6.0);
/// let (mw, _) = calculate_molar_mass("H_{2}O").unwrap();
/// assert!((mw - 18.015).abs() < 1e-2);
/// ```
pub mod formula;
/// the compound record: identity fields, formula, chemical classes and descriptor values
pub mod compound;
/// the external compound database behind a trait, and the consistency check of a compound
/// against it
pub mod authority;
/// collection of the compounds of all lab groups with its uniqueness rules; bulk import from
/// uploaded CSV tables
/// # Examples
/// ```
/// use drp_data::Compounds::authority::OfflineAuthority;
/// use drp_data::Compounds::compound_guide::CompoundGuide;
/// let table = "abbrev,name,CSID,formula,chemicalClasses\nNaCl,sodium chloride,5044,NaCl,\"Inorganic, Salt\"\n";
/// let mut guide = CompoundGuide::new();
/// let compounds = guide.from_csv(table.as_bytes(), "Norquist", &OfflineAuthority).unwrap();
/// assert_eq!(compounds[0].chemical_classes.len(), 2);
/// for compound in compounds {
///     guide.add(compound).unwrap();
/// }
/// assert_eq!(guide.len(), 1);
/// ```
pub mod compound_guide;
/// performed reactions, the compounds they used and the log that keeps them
pub mod reaction;
