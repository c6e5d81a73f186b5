//! Sample records and the annotations attached to them.
//!
//! A [SampleRecord] is what lives in `index/<lang>/<lang>-<checksum>.json`.
//! Its fields are declared up front: anything the typed decoding rejects
//! (unknown fields, wrong enum values) never reaches the scheduler or the recorder.
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{SampleRef, Segment};

/// Maximum number of speakers an annotator can report.
pub const MAX_SPEAKERS: u8 = 10;

/// One structural or semantic problem found on a record, attributed to a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: String,
    pub reason: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Good,
    Bad,
}

#[derive(
    Debug, Serialize, Deserialize, JsonSchema, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[serde(rename_all = "snake_case")]
pub enum Problem {
    Noise,
    WrongLanguage,
    MultipleLanguages,
    ExcessLoanWords,
    LanguageOrPlaceReference,
    Pauses,
    Volume,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Genders {
    Male,
    Female,
    Mixed,
    Unclear,
}

/// parses a snake_case enum tag the same way serde would.
fn parse_tag<T: serde::de::DeserializeOwned>(s: &str, kind: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(s.replace(' ', "_")))
        .map_err(|_| format!("unknown {}: {}", kind, s))
}

impl FromStr for Label {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_tag(s, "label")
    }
}

impl FromStr for Problem {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_tag(s, "problem")
    }
}

impl FromStr for Genders {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_tag(s, "genders")
    }
}

/// One human judgement about one window of a sample.
#[derive(Debug, Serialize, Deserialize, JsonSchema, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Annotation {
    /// start second within the sample
    pub offset: u32,
    /// length of the window, in seconds
    #[schemars(range(min = 1))]
    pub duration: u32,
    pub label: Label,
    #[serde(default)]
    pub problems: Vec<Problem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(range(max = 10))]
    pub speakers: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genders: Option<Genders>,
    pub date: NaiveDate,
    pub annotator: String,
}

impl Annotation {
    /// A `good` annotation for `segment`.
    ///
    /// With no speakers there is nobody to assign a gender to, so genders become [Genders::Unclear].
    pub fn good(
        segment: &Segment,
        speakers: u8,
        genders: Genders,
        annotator: String,
        date: NaiveDate,
    ) -> Self {
        let genders = if speakers == 0 {
            Genders::Unclear
        } else {
            genders
        };

        Self {
            offset: segment.offset(),
            duration: segment.duration(),
            label: Label::Good,
            problems: Vec::new(),
            speakers: Some(speakers),
            genders: Some(genders),
            date,
            annotator,
        }
    }

    /// A `bad` annotation for `segment`. `problems` may be empty.
    pub fn bad(segment: &Segment, problems: Vec<Problem>, annotator: String, date: NaiveDate) -> Self {
        Self {
            offset: segment.offset(),
            duration: segment.duration(),
            label: Label::Bad,
            problems,
            speakers: None,
            genders: None,
            date,
            annotator,
        }
    }

    pub fn is_good(&self) -> bool {
        self.label == Label::Good
    }

    /// Does this annotation cover the given window?
    pub fn covers(&self, offset: u32, duration: u32) -> bool {
        self.offset == offset && self.duration == duration
    }

    /// Semantic rules that a schema cannot express.
    ///
    /// `field` is the prefix used to name offending fields (eg. `annotations[2]`).
    pub fn check(&self, field: &str) -> Vec<Violation> {
        let mut violations = Vec::new();

        if self.duration == 0 {
            violations.push(Violation::new(
                format!("{}.duration", field),
                "duration must be positive",
            ));
        }

        if self.is_good() && !self.problems.is_empty() {
            violations.push(Violation::new(
                format!("{}.problems", field),
                "a good annotation cannot list problems",
            ));
        }

        let mut seen = HashSet::new();
        for problem in &self.problems {
            if !seen.insert(problem) {
                violations.push(Violation::new(
                    format!("{}.problems", field),
                    format!("duplicate problem {:?}", problem),
                ));
            }
        }

        if let Some(speakers) = self.speakers {
            if speakers > MAX_SPEAKERS {
                violations.push(Violation::new(
                    format!("{}.speakers", field),
                    format!("{} speakers is more than {}", speakers, MAX_SPEAKERS),
                ));
            }
        }

        violations
    }
}

/// A sample: one audio file, its provenance and its accumulated annotations.
#[derive(Debug, Serialize, Deserialize, JsonSchema, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SampleRecord {
    /// ISO 639-3 code, also the name of the directory holding the record.
    #[schemars(length(min = 3, max = 3))]
    pub language: String,
    /// md5 hex digest of the audio file.
    #[schemars(length(min = 1))]
    pub checksum: String,
    pub media_urls: Vec<String>,
    pub source_name: String,
    pub source_url: String,
    #[serde(default)]
    pub title: String,
    pub date: String,
    /// checksum of the file before it was transcoded to mp3
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_checksum: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

impl SampleRecord {
    /// Stub record for a freshly ingested sample: no provenance yet, no annotations.
    pub fn new(language: &str, checksum: &str, media_url: &str) -> Self {
        Self {
            language: language.to_string(),
            checksum: checksum.to_string(),
            media_urls: vec![media_url.to_string()],
            source_name: String::new(),
            source_url: String::new(),
            title: String::new(),
            date: String::new(),
            origin_checksum: None,
            annotations: Vec::new(),
        }
    }

    pub fn sample_ref(&self) -> SampleRef {
        SampleRef::new(&self.language, &self.checksum)
    }

    /// Number of `good` annotations.
    pub fn good_count(&self) -> usize {
        self.annotations.iter().filter(|a| a.is_good()).count()
    }

    /// Number of annotations, whatever their label.
    pub fn annotation_count(&self) -> usize {
        self.annotations.len()
    }

    /// Offsets already annotated with windows of exactly `duration` seconds.
    pub fn annotated_offsets(&self, duration: u32) -> HashSet<u32> {
        self.annotations
            .iter()
            .filter(|a| a.duration == duration)
            .map(|a| a.offset)
            .collect()
    }

    /// Semantic rules on a decoded record.
    pub fn check(&self) -> Vec<Violation> {
        let mut violations = Vec::new();

        let mut seen = HashSet::new();
        for url in &self.media_urls {
            if !seen.insert(url) {
                violations.push(Violation::new(
                    "media_urls",
                    format!("duplicate url {}", url),
                ));
            }
        }

        for (i, annotation) in self.annotations.iter().enumerate() {
            violations.extend(annotation.check(&format!("annotations[{}]", i)));
        }

        violations
    }
}
