//! # Compound authority
//!
//! ## Aim
//! Compounds entered by hand are checked against an external chemistry database (the
//! "authority", ChemSpider in practice) before they are accepted. The authority is reached
//! through the `CompoundAuthority` trait so the checking logic never depends on how records
//! are fetched.
//!
//! ## Main Data Structures and Logic
//! - `AuthorityRecord`: what the authority knows about one compound
//! - `CompoundAuthority`: lookup by ID and free text search
//! - `InMemoryAuthority`: a fixed set of records, searched by registered identifiers
//!   (names, synonyms, CAS numbers); used offline and in tests
//! - `OfflineAuthority`: refuses every lookup
//! - `consistency_check()`: fills empty identity fields of a compound from the record and
//!   reports every field that disagrees with it
use crate::Compounds::compound::Compound;
use crate::validation::{ValidationError, ValidationErrors};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorityError {
    #[error("compound lookup service unavailable: {0}")]
    Unavailable(String),
    #[error("no compound with ID {0}")]
    NotFound(u64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityRecord {
    pub csid: u64,
    pub common_name: String,
    pub stdinchi: String,
    pub smiles: String,
    pub molecular_formula: String,
}

/// lookup interface of the external compound database
pub trait CompoundAuthority {
    fn get_compound(&self, csid: u64) -> Result<AuthorityRecord, AuthorityError>;
    fn simple_search(&self, query: &str) -> Result<Vec<AuthorityRecord>, AuthorityError>;
}

/// authority backed by a fixed list of records
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuthority {
    records: Vec<AuthorityRecord>,
    /// lowercased identifier -> csid
    identifiers: Vec<(String, u64)>,
}

impl InMemoryAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    /// adds a record; its common name is searchable right away
    pub fn add_record(&mut self, record: AuthorityRecord) {
        let csid = record.csid;
        let name = record.common_name.clone();
        self.records.retain(|r| r.csid != csid);
        self.records.push(record);
        self.add_identifier(&name, csid);
    }

    /// makes `csid` findable by another name, synonym or CAS number
    pub fn add_identifier(&mut self, identifier: &str, csid: u64) {
        let identifier = identifier.trim().to_lowercase();
        if !self
            .identifiers
            .iter()
            .any(|(i, c)| *i == identifier && *c == csid)
        {
            self.identifiers.push((identifier, csid));
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl CompoundAuthority for InMemoryAuthority {
    fn get_compound(&self, csid: u64) -> Result<AuthorityRecord, AuthorityError> {
        self.records
            .iter()
            .find(|r| r.csid == csid)
            .cloned()
            .ok_or(AuthorityError::NotFound(csid))
    }

    fn simple_search(&self, query: &str) -> Result<Vec<AuthorityRecord>, AuthorityError> {
        let query = query.trim().to_lowercase();
        let mut found: Vec<AuthorityRecord> = Vec::new();
        for (identifier, csid) in &self.identifiers {
            if *identifier == query && !found.iter().any(|r| r.csid == *csid) {
                found.push(self.get_compound(*csid)?);
            }
        }
        Ok(found)
    }
}

/// authority used when no lookup service is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineAuthority;

impl CompoundAuthority for OfflineAuthority {
    fn get_compound(&self, _csid: u64) -> Result<AuthorityRecord, AuthorityError> {
        Err(AuthorityError::Unavailable("no compound authority configured".to_string()))
    }

    fn simple_search(&self, _query: &str) -> Result<Vec<AuthorityRecord>, AuthorityError> {
        Err(AuthorityError::Unavailable("no compound authority configured".to_string()))
    }
}

fn authority_failure(e: AuthorityError) -> ValidationErrors {
    let code = match e {
        AuthorityError::NotFound(_) => "invalid_csid",
        AuthorityError::Unavailable(_) => "authority_unavailable",
    };
    ValidationError::new(code, e.to_string()).into()
}

/// Checks a compound against the authority record for its CSID.
///
/// Custom compounds are accepted as they are. Otherwise the CSID is required, the
/// authority's record must come up when searching for the compound's name, and InChI,
/// SMILES and formula must agree with the record. Empty fields are filled in from the
/// record instead of being compared. All disagreements are returned together.
pub fn consistency_check(
    compound: &mut Compound,
    authority: &dyn CompoundAuthority,
) -> Result<(), ValidationErrors> {
    if compound.custom {
        info!("{} is custom, consistency check skipped", compound);
        return Ok(());
    }
    let Some(csid) = compound.csid else {
        return Err(ValidationError::new("no_csid", "No CSID set").into());
    };
    let record = authority.get_compound(csid).map_err(authority_failure)?;
    let name_results = authority.simple_search(&compound.name).map_err(authority_failure)?;

    let mut errors = ValidationErrors::new();
    if !name_results.iter().any(|r| r.csid == record.csid) {
        errors.push(ValidationError::new(
            "invalid_name",
            "A compound was consistency checked and was found to have an invalid name",
        ));
    }
    if compound.inchi.is_empty() {
        compound.inchi = record.stdinchi.clone();
    } else if compound.inchi != record.stdinchi {
        errors.push(ValidationError::new(
            "invalid_inchi",
            "A compound was consistency checked and was found to have an invalid InChi",
        ));
    }
    if compound.smiles.is_empty() {
        compound.smiles = record.smiles.clone();
    } else if compound.smiles != record.smiles {
        errors.push(ValidationError::new(
            "invalid_smiles",
            "A compound was consistency checked and was found to have an invalid smiles string",
        ));
    }
    if compound.formula.is_empty() {
        compound.formula = record.molecular_formula.clone();
    } else if compound.formula != record.molecular_formula {
        errors.push(ValidationError::new(
            "invalid_formula",
            "A compound was consistency checked and was found to have an invalid formula",
        ));
    }
    if !errors.is_empty() {
        warn!("{} failed the consistency check: {}", compound, errors);
    }
    errors.into_result()
}
