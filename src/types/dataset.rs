//! In-memory view of the index, grouped by language partition.
use std::collections::BTreeMap;

use super::{SampleRecord, SampleRef};

/// All loaded records, `language -> checksum -> record`.
///
/// Coverage counts are always computed from here, never stored.
#[derive(Debug, Default, Clone)]
pub struct Dataset {
    languages: BTreeMap<String, BTreeMap<String, SampleRecord>>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, returning the previous one with the same identity if any.
    pub fn insert(&mut self, record: SampleRecord) -> Option<SampleRecord> {
        self.languages
            .entry(record.language.clone())
            .or_default()
            .insert(record.checksum.clone(), record)
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.languages.keys().map(String::as_str)
    }

    pub fn samples<'a>(&'a self, language: &str) -> impl Iterator<Item = &'a SampleRecord> {
        self.languages
            .get(language)
            .into_iter()
            .flat_map(|samples| samples.values())
    }

    pub fn get(&self, sample: &SampleRef) -> Option<&SampleRecord> {
        self.languages
            .get(&sample.language)
            .and_then(|samples| samples.get(&sample.checksum))
    }

    pub fn get_mut(&mut self, sample: &SampleRef) -> Option<&mut SampleRecord> {
        self.languages
            .get_mut(&sample.language)
            .and_then(|samples| samples.get_mut(&sample.checksum))
    }

    /// Number of samples in a language.
    pub fn sample_count(&self, language: &str) -> usize {
        self.languages.get(language).map_or(0, BTreeMap::len)
    }

    /// Number of `good` annotations summed over a language.
    pub fn language_coverage(&self, language: &str) -> usize {
        self.samples(language).map(SampleRecord::good_count).sum()
    }

    /// Total number of samples.
    pub fn len(&self) -> usize {
        self.languages.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<SampleRecord> for Dataset {
    fn from_iter<T: IntoIterator<Item = SampleRecord>>(iter: T) -> Self {
        let mut dataset = Dataset::new();
        for record in iter {
            dataset.insert(record);
        }
        dataset
    }
}
