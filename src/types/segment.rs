use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies a sample across the whole index: `(language, checksum)`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SampleRef {
    pub language: String,
    pub checksum: String,
}

impl SampleRef {
    pub fn new(language: &str, checksum: &str) -> Self {
        Self {
            language: language.to_string(),
            checksum: checksum.to_string(),
        }
    }

    /// `<lang>-<checksum>`, the stem shared by the record and the audio file.
    pub fn stem(&self) -> String {
        format!("{}-{}", self.language, self.checksum)
    }
}

impl fmt::Display for SampleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.stem())
    }
}

/// A window of a sample offered for annotation. Never persisted.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
pub struct Segment {
    sample: SampleRef,
    offset: u32,
    duration: u32,
}

impl Segment {
    pub fn new(sample: SampleRef, offset: u32, duration: u32) -> Self {
        Self {
            sample,
            offset,
            duration,
        }
    }

    /// Get a reference to the segment's sample.
    pub fn sample(&self) -> &SampleRef {
        &self.sample
    }

    pub fn language(&self) -> &str {
        &self.sample.language
    }

    /// Get the segment's offset (seconds).
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Get the segment's duration (seconds).
    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn end(&self) -> u32 {
        self.offset + self.duration
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} -> {})", self.sample, self.offset, self.end())
    }
}
