//! Dataset layout and annotator settings.
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::io::Store;

/// Version of the annotation guidelines. Annotators who saw an older one are reminded to read them.
pub const GUIDELINE_VERSION: u32 = 3;

/// Where everything lives, relative to the dataset root unless overridden.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub index_dir: PathBuf,
    pub samples_dir: PathBuf,
    pub name_index: PathBuf,
    pub iso_table: PathBuf,
    pub schema: PathBuf,
}

impl Layout {
    pub fn from_root(root: &Path) -> Self {
        let index_dir = root.join("index");
        Self {
            schema: index_dir.join("sample.schema.json"),
            index_dir,
            samples_dir: root.join("samples"),
            name_index: root.join("ext").join("name_index_20140320.json"),
            iso_table: root.join("ext").join("iso-639-3.tab"),
        }
    }

    pub fn store(&self) -> Store {
        Store::new(&self.index_dir, &self.samples_dir)
    }
}

/// The person annotating, as stored in `~/.widelanguageindex`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub email: String,
    /// last guideline version the user has seen
    #[serde(default)]
    pub seen_guidelines: Option<u32>,
}

impl User {
    pub fn new(name: &str, email: &str) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
            seen_guidelines: None,
        }
    }

    /// `$HOME/.widelanguageindex`
    pub fn settings_path() -> Result<PathBuf, Error> {
        let home = std::env::var_os("HOME")
            .ok_or_else(|| Error::Config("HOME is not set".to_string()))?;
        Ok(PathBuf::from(home).join(".widelanguageindex"))
    }

    /// Load settings from `path`. A missing file is not an error.
    pub fn load(path: &Path) -> Result<Option<Self>, Error> {
        if !path.exists() {
            debug!("no settings at {:?}", path);
            return Ok(None);
        }

        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| Error::Config(format!("invalid settings file {:?}: {}", path, e)))
    }

    pub fn load_default() -> Result<Option<Self>, Error> {
        Self::load(&Self::settings_path()?)
    }

    pub fn save(&self, path: &Path) -> Result<(), Error> {
        fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }

    /// Has the user seen the current guidelines?
    pub fn is_up_to_date(&self) -> bool {
        self.seen_guidelines == Some(GUIDELINE_VERSION)
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}
