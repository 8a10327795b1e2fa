/// interactive terminal menu: formula check, compound import, guide listing, CSV/ARFF export
/// and the current settings
pub mod cli_main;
