/*! Dataset store

The index is a plain directory tree, one JSON file per sample:

```text
index/<lang>/<lang>-<checksum>.json
samples/<lang>/<lang>-<checksum>.mp3
samples/_annotated/<lang>/<lang>-<checksum>-<start>-<end>.mp3
```

There is no locking: a single process is expected to write at a time.
!*/
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::Serialize;
use serde_json::Value;

use crate::error::Error;
use crate::lang::LanguageFilter;
use crate::processing::Schema;
use crate::types::{Dataset, SampleRecord, SampleRef, Segment};

use super::canonical::to_canonical_string;

/// Directory (under the samples directory) where annotated clips are stored.
pub const CLIPS_DIR: &str = "_annotated";

#[derive(Debug, Clone)]
pub struct Store {
    index_dir: PathBuf,
    samples_dir: PathBuf,
}

impl Store {
    pub fn new(index_dir: &Path, samples_dir: &Path) -> Self {
        Self {
            index_dir: index_dir.to_path_buf(),
            samples_dir: samples_dir.to_path_buf(),
        }
    }

    /// Get a reference to the store's index dir.
    pub fn index_dir(&self) -> &Path {
        &self.index_dir
    }

    /// Get a reference to the store's samples dir.
    pub fn samples_dir(&self) -> &Path {
        &self.samples_dir
    }

    /// glob `<dir>/*/*.<extension>`, sorted.
    fn glob_partitioned(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, Error> {
        let stub = dir
            .to_str()
            .ok_or_else(|| Error::Custom(format!("invalid directory: {:?}", dir)))?;
        let pattern = format!("{}/*/*.{}", glob::Pattern::escape(stub), extension);
        debug!("globbing {}", pattern);

        let mut paths = glob::glob(&pattern)?.collect::<Result<Vec<_>, _>>()?;
        paths.sort();
        Ok(paths)
    }

    /// Paths of every record, grouped by language partition (sorted).
    pub fn record_paths(&self) -> Result<Vec<PathBuf>, Error> {
        Self::glob_partitioned(&self.index_dir, "json")
    }

    /// Paths of every audio file (sorted). Clips are not included.
    pub fn audio_paths(&self) -> Result<Vec<PathBuf>, Error> {
        Self::glob_partitioned(&self.samples_dir, "mp3")
    }

    pub fn record_path(&self, sample: &SampleRef) -> PathBuf {
        let mut path = self.index_dir.join(&sample.language);
        path.push(format!("{}.json", sample.stem()));
        path
    }

    pub fn audio_path(&self, sample: &SampleRef) -> PathBuf {
        let mut path = self.samples_dir.join(&sample.language);
        path.push(format!("{}.mp3", sample.stem()));
        path
    }

    /// Where the clip for an annotated segment lives.
    pub fn clip_path(&self, segment: &Segment) -> PathBuf {
        let mut path = self.samples_dir.join(CLIPS_DIR);
        path.push(segment.language());
        path.push(format!(
            "{}-{}-{}.mp3",
            segment.sample().stem(),
            segment.offset(),
            segment.end()
        ));
        path
    }

    /// Read a record as plain JSON, without any check.
    pub fn read_raw(&self, path: &Path) -> Result<Value, Error> {
        let blob = fs::read_to_string(path).map_err(|e| Error::ResourceRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        serde_json::from_str(&blob).map_err(|e| Error::InvalidRecord {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Read and decode a record.
    ///
    /// When a schema is given the raw content is checked against it before being decoded,
    /// and the decoded record has to pass [SampleRecord::check].
    pub fn read(&self, path: &Path, schema: Option<&Schema>) -> Result<SampleRecord, Error> {
        let value = self.read_raw(path)?;

        let invalid = |reason: String| Error::InvalidRecord {
            path: path.to_path_buf(),
            reason,
        };

        if let Some(schema) = schema {
            if let Some(violation) = schema.validate(&value).into_iter().next() {
                return Err(invalid(violation.to_string()));
            }
        }

        let record: SampleRecord =
            serde_json::from_value(value).map_err(|e| invalid(e.to_string()))?;
        if let Some(violation) = record.check().into_iter().next() {
            return Err(invalid(violation.to_string()));
        }

        Ok(record)
    }

    /// Overwrite (or create) the record file with its canonical form.
    ///
    /// The whole file is rewritten, there is no partial update.
    pub fn write(&self, record: &SampleRecord) -> Result<PathBuf, Error> {
        let path = self.record_path(&record.sample_ref());
        self.write_raw(&path, record)?;
        Ok(path)
    }

    /// Overwrite (or create) `path` with the canonical form of `value`.
    ///
    /// Used to update records without decoding them, so that fields the file
    /// does not have are not added.
    pub fn write_raw<T: Serialize>(&self, path: &Path, value: &T) -> Result<(), Error> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = to_canonical_string(value)?;
        fs::write(path, content)?;
        debug!("wrote {:?}", path);
        Ok(())
    }

    /// Load every record whose language passes `filter`.
    ///
    /// Partitions of excluded languages are not read at all.
    /// Any other record failing to decode aborts the load: scheduling on a partially read index
    /// would skew coverage counts. Run an audit to get the complete list of problems.
    pub fn load(&self, schema: &Schema, filter: &LanguageFilter) -> Result<Dataset, Error> {
        let mut dataset = Dataset::new();
        for path in self.record_paths()? {
            let partition = path
                .parent()
                .and_then(Path::file_name)
                .and_then(|name| name.to_str());
            if let Some(partition) = partition {
                if !filter.includes(partition) {
                    continue;
                }
            }

            let record = self.read(&path, Some(schema))?;
            if filter.includes(&record.language) {
                if let Some(previous) = dataset.insert(record) {
                    return Err(Error::InvalidRecord {
                        path,
                        reason: format!("duplicate sample {}", previous.sample_ref()),
                    });
                }
            }
        }

        info!(
            "loaded {} samples in {} languages",
            dataset.len(),
            dataset.languages().count()
        );
        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    fn store(root: &Path) -> Store {
        Store::new(&root.join("index"), &root.join("samples"))
    }

    #[test]
    fn paths() {
        let s = Store::new(Path::new("index"), Path::new("samples"));
        let sample = SampleRef::new("fra", "abc");
        assert_eq!(s.record_path(&sample), Path::new("index/fra/fra-abc.json"));
        assert_eq!(s.audio_path(&sample), Path::new("samples/fra/fra-abc.mp3"));
        assert_eq!(
            s.clip_path(&Segment::new(sample, 20, 20)),
            Path::new("samples/_annotated/fra/fra-abc-20-40.mp3")
        );
    }

    #[test]
    fn write_then_read() {
        let dir = tempdir().unwrap();
        let s = store(dir.path());
        let record = SampleRecord::new("fra", "abc", "http://example.com/a.mp3");

        let path = s.write(&record).unwrap();
        assert_eq!(path, dir.path().join("index/fra/fra-abc.json"));
        assert_eq!(s.read(&path, None).unwrap(), record);

        let content = fs::read_to_string(&path).unwrap();
        assert!(crate::io::is_canonical(&content));
    }

    #[test]
    fn record_paths_are_sorted_and_partitioned() {
        let dir = tempdir().unwrap();
        let s = store(dir.path());
        for (lang, checksum) in [("jpn", "b"), ("fra", "c"), ("fra", "a")] {
            s.write(&SampleRecord::new(lang, checksum, "http://x"))
                .unwrap();
        }
        // not in a partition, ignored
        fs::write(dir.path().join("index/sample.schema.json"), "{}").unwrap();

        let names: Vec<String> = s
            .record_paths()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["fra-a.json", "fra-c.json", "jpn-b.json"]);
    }

    #[test]
    fn load_filters_languages() {
        let dir = tempdir().unwrap();
        let s = store(dir.path());
        s.write(&SampleRecord::new("fra", "a", "http://a")).unwrap();
        s.write(&SampleRecord::new("jpn", "b", "http://b")).unwrap();

        let schema = Schema::generated();
        let filter = LanguageFilter::parse("@jpn").unwrap();
        let dataset = s.load(&schema, &filter).unwrap();
        assert_eq!(dataset.languages().collect::<Vec<_>>(), vec!["jpn"]);
    }

    #[test]
    fn load_does_not_read_excluded_partitions() {
        let dir = tempdir().unwrap();
        let s = store(dir.path());
        s.write(&SampleRecord::new("fra", "a", "http://a")).unwrap();
        fs::create_dir_all(dir.path().join("index/jpn")).unwrap();
        fs::write(dir.path().join("index/jpn/jpn-b.json"), "{ not json").unwrap();

        let schema = Schema::generated();
        let dataset = s.load(&schema, &LanguageFilter::only("fra")).unwrap();
        assert_eq!(dataset.len(), 1);

        assert!(matches!(
            s.load(&schema, &LanguageFilter::All),
            Err(Error::InvalidRecord { .. })
        ));
    }

    #[test]
    fn raw_write_keeps_fields_as_they_are() {
        let dir = tempdir().unwrap();
        let s = store(dir.path());
        let path = dir.path().join("index/fra/fra-a.json");
        let value = serde_json::json!({"language": "fra", "checksum": "a", "media_urls": []});

        s.write_raw(&path, &value).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(crate::io::is_canonical(&content));
        assert_eq!(s.read_raw(&path).unwrap(), value);
        assert!(matches!(
            s.read(&path, None),
            Err(Error::InvalidRecord { .. })
        ));
    }

    #[test]
    fn load_fails_on_invalid_record() {
        let dir = tempdir().unwrap();
        let s = store(dir.path());
        s.write(&SampleRecord::new("fra", "a", "http://a")).unwrap();
        fs::write(
            dir.path().join("index/fra/fra-b.json"),
            r#"{"language": "fra"}"#,
        )
        .unwrap();

        let schema = Schema::generated();
        let result = s.load(&schema, &LanguageFilter::All);
        assert!(matches!(result, Err(Error::InvalidRecord { .. })));
    }
}
