//! Language reference data.
//!
//! This module holds:
//! - the named language sets used to restrict annotation sessions ([LANGUAGE_SETS]),
//! - the [LanguageRegistry], built from ISO 639-3 reference files,
//! - the [LanguageFilter] derived from command line options.
//!
use std::{
    collections::{BTreeMap, HashMap, HashSet},
    fs::File,
    io::BufReader,
    path::Path,
};

use itertools::Itertools;
use lazy_static::lazy_static;
use log::debug;
use serde::Deserialize;

use crate::error::Error;

/// Macrolanguages that are accepted as sample labels unless configured otherwise.
///
/// Quechua has many dialects and it is hard to find samples for one in particular.
pub const DEFAULT_ALLOWED_MACROLANGUAGES: [&str; 3] = ["nor", "sqi", "que"];

lazy_static! {

    /// Named subsets of ISO 639-3 codes.
    pub static ref LANGUAGE_SETS: BTreeMap<&'static str, HashSet<&'static str>> = {
        let mut m = BTreeMap::new();
        m.insert(
            "global-top-20",
            [
                "cmn", "spa", "eng", "hin", "arb", "por", "ben", "rus", "jpn", "jav",
                "deu", "wuu", "kor", "fra", "tel", "mar", "tur", "tam", "vie", "urd",
            ]
            .into_iter()
            .collect(),
        );
        m.insert(
            "global-top-40",
            [
                "cmn", "spa", "eng", "hin", "arb", "por", "ben", "rus", "jpn", "jav",
                "deu", "wuu", "kor", "fra", "tel", "mar", "tur", "tam", "vie", "urd",
                "ita", "pnb", "yue", "arz", "pes", "guj", "nan", "cjy", "bho", "pol",
                "kan", "ukr", "hsn", "sun", "mai", "mal", "ory", "hak", "pan", "arq",
            ]
            .into_iter()
            .collect(),
        );
        m.insert(
            "region-top-5",
            [
                "arz", "arq", "hau", "amh", "ary", "hat", "hrx", "gug", "lou", "jam",
                "cmn", "hin", "arb", "ben", "jpn", "spa", "eng", "por", "rus", "deu",
                "smo", "fij", "ton", "mri", "med",
            ]
            .into_iter()
            .collect(),
        );
        m.insert(
            "issue-31",
            [
                "pol", "fin", "swe", "tha", "lao", "ces", "hrv", "heb", "prs", "ell",
                "fil", "mya", "slo", "amh",
            ]
            .into_iter()
            .collect(),
        );
        m
    };
}

/// Entry of the name index (`ext/name_index_*.json`). Other fields are ignored.
#[derive(Debug, Deserialize)]
struct NameEntry {
    id: String,
    print_name: String,
}

/// Row of the SIL `iso-639-3.tab` table. Only the code and its scope are needed.
#[derive(Debug, Deserialize)]
struct IsoEntry {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Scope")]
    scope: String,
}

/// Scope value of macrolanguages in the SIL table.
const MACROLANGUAGE_SCOPE: &str = "M";

/// Immutable language reference data for one run.
///
/// Built once and passed explicitly to whatever needs it.
#[derive(Debug, Clone, Default)]
pub struct LanguageRegistry {
    names: HashMap<String, String>,
    macrolanguages: HashSet<String>,
    allowed_macrolanguages: HashSet<String>,
}

impl LanguageRegistry {
    pub fn new(
        names: HashMap<String, String>,
        macrolanguages: HashSet<String>,
        allowed_macrolanguages: HashSet<String>,
    ) -> Self {
        Self {
            names,
            macrolanguages,
            allowed_macrolanguages,
        }
    }

    /// Load the registry from the name index (json) and the ISO 639-3 table (tab separated).
    ///
    /// Missing or malformed reference files are configuration errors.
    pub fn from_files<I>(name_index: &Path, iso_table: &Path, allowed: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = String>,
    {
        let config_err =
            |path: &Path, e: &dyn std::fmt::Display| Error::Config(format!("{:?}: {}", path, e));

        let f = File::open(name_index).map_err(|e| config_err(name_index, &e))?;
        let entries: Vec<NameEntry> =
            serde_json::from_reader(BufReader::new(f)).map_err(|e| config_err(name_index, &e))?;
        let names: HashMap<String, String> = entries
            .into_iter()
            .map(|entry| (entry.id, entry.print_name))
            .collect();

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .quoting(false)
            .flexible(true)
            .from_path(iso_table)
            .map_err(|e| config_err(iso_table, &e))?;
        let mut macrolanguages = HashSet::new();
        for row in reader.deserialize() {
            let row: IsoEntry = row.map_err(|e| config_err(iso_table, &e))?;
            if row.scope == MACROLANGUAGE_SCOPE {
                macrolanguages.insert(row.id);
            }
        }

        debug!(
            "loaded {} language names, {} macrolanguages",
            names.len(),
            macrolanguages.len()
        );
        Ok(Self::new(names, macrolanguages, allowed.into_iter().collect()))
    }

    /// Is the code a known language?
    pub fn is_valid(&self, code: &str) -> bool {
        self.names.contains_key(code)
    }

    pub fn is_macrolanguage(&self, code: &str) -> bool {
        self.macrolanguages.contains(code)
    }

    /// Can the code be used as a sample label?
    /// Macrolanguages are rejected unless allow-listed.
    pub fn is_allowed(&self, code: &str) -> bool {
        !self.is_macrolanguage(code) || self.allowed_macrolanguages.contains(code)
    }

    /// Print name of a language.
    pub fn name(&self, code: &str) -> Option<&str> {
        self.names.get(code).map(String::as_str)
    }
}

/// Restricts which languages are loaded and scheduled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageFilter {
    All,
    Codes(HashSet<String>),
}

impl LanguageFilter {
    /// Parse a language set: either a name from [LANGUAGE_SETS] or `@code,code,...`.
    pub fn parse(language_set: &str) -> Result<Self, Error> {
        if let Some(codes) = language_set.strip_prefix('@') {
            return Ok(Self::Codes(
                codes
                    .split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(String::from)
                    .collect(),
            ));
        }

        match LANGUAGE_SETS.get(language_set) {
            Some(set) => Ok(Self::Codes(set.iter().map(|c| c.to_string()).collect())),
            None => Err(Error::Config(format!(
                "language set \"{}\" not one of: {}",
                language_set,
                LANGUAGE_SETS.keys().join(", ")
            ))),
        }
    }

    /// Restrict to a single language.
    pub fn only(code: &str) -> Self {
        Self::Codes([code.to_string()].into_iter().collect())
    }

    /// Build the filter from the `--language-set` and `--only` options.
    /// `--only` wins if both are given.
    pub fn from_options(language_set: Option<&str>, only: Option<&str>) -> Result<Self, Error> {
        match (only, language_set) {
            (Some(code), _) => Ok(Self::only(code)),
            (None, Some(set)) => Self::parse(set),
            (None, None) => Ok(Self::All),
        }
    }

    pub fn includes(&self, code: &str) -> bool {
        match self {
            Self::All => true,
            Self::Codes(codes) => codes.contains(code),
        }
    }
}
