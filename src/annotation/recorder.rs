//! Persisting annotations.
use std::fmt;

use log::{debug, warn};
use serde_json::Value;

use crate::error::Error;
use crate::io::Store;
use crate::types::{Annotation, Dataset, Segment};

/// Coverage of a language before and after an annotation was recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageUpdate {
    pub language: String,
    pub before: usize,
    pub after: usize,
}

impl fmt::Display for CoverageUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.language, self.before, self.after)
    }
}

/// Appends annotations to records and rewrites them on disk.
///
/// Only the `annotations` array of the file changes: other fields are kept as they were read.
///
/// There is no rollback: if writing fails, the in-memory dataset is left untouched
/// and the error is returned.
pub struct Recorder<'a> {
    store: &'a Store,
}

impl<'a> Recorder<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Record `annotation` for `segment`.
    ///
    /// The annotation has to cover exactly the segment's window and to pass [Annotation::check].
    pub fn record(
        &self,
        dataset: &mut Dataset,
        segment: &Segment,
        annotation: Annotation,
    ) -> Result<CoverageUpdate, Error> {
        let sample = segment.sample();
        let path = self.store.record_path(sample);

        if !annotation.covers(segment.offset(), segment.duration()) {
            return Err(Error::Custom(format!(
                "annotation ({} +{}s) does not match segment {}",
                annotation.offset, annotation.duration, segment
            )));
        }
        if let Some(violation) = annotation.check("annotation").into_iter().next() {
            return Err(Error::InvalidRecord {
                path,
                reason: violation.to_string(),
            });
        }

        let mut record = dataset
            .get(sample)
            .cloned()
            .ok_or_else(|| Error::ResourceRead {
                path: path.clone(),
                reason: format!("sample {} is not loaded", sample),
            })?;

        if record
            .annotations
            .iter()
            .any(|a| a.covers(segment.offset(), segment.duration()))
        {
            warn!("{} was already annotated", segment);
        }

        let before = dataset.language_coverage(segment.language());

        // the file is updated as plain json, so that defaulted fields are not written back
        let mut raw = self.store.read_raw(&path)?;
        let object = raw.as_object_mut().ok_or_else(|| Error::InvalidRecord {
            path: path.clone(),
            reason: "a record must be a json object".to_string(),
        })?;
        let annotations = object
            .entry("annotations")
            .or_insert_with(|| Value::Array(Vec::new()));
        match annotations {
            Value::Array(annotations) => annotations.push(serde_json::to_value(&annotation)?),
            _ => {
                return Err(Error::InvalidRecord {
                    path,
                    reason: "annotations must be an array".to_string(),
                })
            }
        }
        self.store.write_raw(&path, &raw)?;

        record.annotations.push(annotation);
        debug!("recorded annotation for {} in {:?}", segment, path);
        dataset.insert(record);

        let update = CoverageUpdate {
            language: segment.language().to_string(),
            before,
            after: dataset.language_coverage(segment.language()),
        };
        println!("{}", update);
        Ok(update)
    }
}
