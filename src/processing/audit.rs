/*! Dataset audit

Checks every record of the index, and optionally every audio file, and reports
*all* the problems found rather than stopping at the first one.

Record checks are independent from each other:
a record with a misplaced file is still checked for its schema, its language and its formatting.
Only content that is not JSON at all stops the checks on that record,
since there is nothing left to look at.
!*/
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use md5::{Digest, Md5};
use serde_json::Value;

use crate::error::Error;
use crate::io::{is_canonical, Store};
use crate::lang::LanguageRegistry;
use crate::types::{SampleRecord, SampleRef, Violation};

use super::Schema;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FindingKind {
    /// The file could not be read at all.
    Unreadable(String),
    /// The file is not JSON.
    InvalidJson(String),
    SchemaViolation(Violation),
    UnknownLanguage(String),
    MacrolanguageNotAllowed(String),
    /// The record is not stored under its language directory.
    MisplacedRecord { directory: String, language: String },
    /// The file name does not match `<language>-<checksum>.json`.
    MisnamedRecord { expected: String },
    /// Another record has the same language and checksum.
    DuplicateRecord { first: PathBuf },
    NonCanonicalFormat,
    /// The audio file's md5 does not appear in its path.
    ChecksumMismatch { checksum: String },
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FindingKind::Unreadable(reason) => write!(f, "unreadable: {}", reason),
            FindingKind::InvalidJson(reason) => write!(f, "invalid json: {}", reason),
            FindingKind::SchemaViolation(v) => write!(f, "schema violation: {}", v),
            FindingKind::UnknownLanguage(code) => write!(f, "unknown language {}", code),
            FindingKind::MacrolanguageNotAllowed(code) => {
                write!(f, "{} is a macrolanguage, use a more specific code", code)
            }
            FindingKind::MisplacedRecord {
                directory,
                language,
            } => write!(
                f,
                "language {} stored under directory {}",
                language, directory
            ),
            FindingKind::MisnamedRecord { expected } => {
                write!(f, "file should be named {}", expected)
            }
            FindingKind::DuplicateRecord { first } => {
                write!(f, "duplicate of {}", first.display())
            }
            FindingKind::NonCanonicalFormat => write!(f, "not in canonical format"),
            FindingKind::ChecksumMismatch { checksum } => {
                write!(f, "md5 {} does not match the file name", checksum)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub path: PathBuf,
    pub kind: FindingKind,
}

impl Finding {
    pub fn new(path: &Path, kind: FindingKind) -> Self {
        Self {
            path: path.to_path_buf(),
            kind,
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.kind)
    }
}

/// Result of a full audit.
#[derive(Debug, Default)]
pub struct AuditReport {
    pub records: usize,
    pub samples: usize,
    findings: Vec<Finding>,
}

impl AuditReport {
    /// The audit passes iff nothing was found.
    pub fn is_ok(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }
}

impl fmt::Display for AuditReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} records, {} samples checked: {} finding(s)",
            self.records,
            self.samples,
            self.findings.len()
        )
    }
}

/// Record checker. Holds the reference data shared by every check.
pub struct Auditor<'a> {
    registry: &'a LanguageRegistry,
    schema: &'a Schema,
}

impl<'a> Auditor<'a> {
    pub fn new(registry: &'a LanguageRegistry, schema: &'a Schema) -> Self {
        Self { registry, schema }
    }

    /// Check the content of a record stored at `path`.
    ///
    /// Also returns the decoded record when it decodes, so that callers can look for duplicates.
    pub fn audit_blob(&self, path: &Path, blob: &str) -> (Vec<Finding>, Option<SampleRecord>) {
        let mut findings = Vec::new();

        let value: Value = match serde_json::from_str(blob) {
            Ok(v) => v,
            Err(e) => {
                findings.push(Finding::new(path, FindingKind::InvalidJson(e.to_string())));
                return (findings, None);
            }
        };

        findings.extend(
            self.schema
                .validate(&value)
                .into_iter()
                .map(|v| Finding::new(path, FindingKind::SchemaViolation(v))),
        );

        // semantic rules only run on records the schema accepts
        let record = if findings.is_empty() {
            match serde_json::from_value::<SampleRecord>(value.clone()) {
                Ok(record) => {
                    findings.extend(
                        record
                            .check()
                            .into_iter()
                            .map(|v| Finding::new(path, FindingKind::SchemaViolation(v))),
                    );
                    Some(record)
                }
                Err(e) => {
                    findings.push(Finding::new(
                        path,
                        FindingKind::SchemaViolation(Violation::new("(record)", e.to_string())),
                    ));
                    None
                }
            }
        } else {
            None
        };

        // language checks work on the raw value, so that they run on schema-invalid records too.
        if let Some(language) = value.get("language").and_then(Value::as_str) {
            self.check_language(path, language, &mut findings);
            self.check_location(path, language, value.get("checksum"), &mut findings);
        }

        if !is_canonical(blob) {
            findings.push(Finding::new(path, FindingKind::NonCanonicalFormat));
        }

        (findings, record)
    }

    fn check_language(&self, path: &Path, language: &str, findings: &mut Vec<Finding>) {
        if !self.registry.is_valid(language) {
            findings.push(Finding::new(
                path,
                FindingKind::UnknownLanguage(language.to_string()),
            ));
        }

        if !self.registry.is_allowed(language) {
            findings.push(Finding::new(
                path,
                FindingKind::MacrolanguageNotAllowed(language.to_string()),
            ));
        }
    }

    fn check_location(
        &self,
        path: &Path,
        language: &str,
        checksum: Option<&Value>,
        findings: &mut Vec<Finding>,
    ) {
        let directory = path
            .parent()
            .and_then(Path::file_name)
            .map(|d| d.to_string_lossy().into_owned())
            .unwrap_or_default();
        if directory != language {
            findings.push(Finding::new(
                path,
                FindingKind::MisplacedRecord {
                    directory,
                    language: language.to_string(),
                },
            ));
        }

        if let Some(checksum) = checksum.and_then(Value::as_str) {
            let expected = format!("{}.json", SampleRef::new(language, checksum).stem());
            let actual = path.file_name().map(|f| f.to_string_lossy());
            if actual.as_deref() != Some(expected.as_str()) {
                findings.push(Finding::new(path, FindingKind::MisnamedRecord { expected }));
            }
        }
    }

    /// Read and check a single record file.
    pub fn audit_record(&self, path: &Path) -> (Vec<Finding>, Option<SampleRecord>) {
        match std::fs::read_to_string(path) {
            Ok(blob) => self.audit_blob(path, &blob),
            Err(e) => (
                vec![Finding::new(path, FindingKind::Unreadable(e.to_string()))],
                None,
            ),
        }
    }

    /// Check every record of the store.
    pub fn audit_index(&self, store: &Store) -> Result<AuditReport, Error> {
        let mut report = AuditReport::default();
        let mut seen: HashMap<SampleRef, PathBuf> = HashMap::new();

        for path in store.record_paths()? {
            debug!("auditing {:?}", path);
            report.records += 1;
            let (findings, record) = self.audit_record(&path);
            report.findings.extend(findings);

            if let Some(record) = record {
                match seen.get(&record.sample_ref()) {
                    Some(first) => report.findings.push(Finding::new(
                        &path,
                        FindingKind::DuplicateRecord {
                            first: first.clone(),
                        },
                    )),
                    None => {
                        seen.insert(record.sample_ref(), path);
                    }
                }
            }
        }

        Ok(report)
    }
}

/// compute the md5 of the file by using [io::copy] between a file handler and the hasher.
/// a fresh hasher per file: a failed read must not leak into the next digest.
fn md5_hex(path: &Path) -> Result<String, Error> {
    let mut hasher = Md5::new();
    let mut f = File::open(path)?;
    io::copy(&mut f, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Check that every audio file carries its own md5 in its path.
///
/// Returns the number of files checked along with the findings.
pub fn audit_samples(store: &Store) -> Result<(usize, Vec<Finding>), Error> {
    let mut findings = Vec::new();
    let paths = store.audio_paths()?;

    for path in &paths {
        match md5_hex(path) {
            Ok(checksum) => {
                if !path.to_string_lossy().contains(&checksum) {
                    findings.push(Finding::new(path, FindingKind::ChecksumMismatch { checksum }));
                }
            }
            Err(e) => findings.push(Finding::new(path, FindingKind::Unreadable(e.to_string()))),
        }
    }

    Ok((paths.len(), findings))
}

/// Run the whole audit.
///
/// Only failing to enumerate the store is an error: everything else ends up in the report.
pub fn audit(
    store: &Store,
    registry: &LanguageRegistry,
    schema: &Schema,
    check_audio: bool,
) -> Result<AuditReport, Error> {
    let auditor = Auditor::new(registry, schema);
    let mut report = auditor.audit_index(store)?;

    if check_audio {
        let (samples, findings) = audit_samples(store)?;
        report.samples = samples;
        report.findings.extend(findings);
    } else {
        warn!("skipping audio checksums");
    }

    info!("{}", report);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::fs;

    use tempfile::tempdir;

    use super::*;
    use crate::io::to_canonical_string;

    fn registry() -> LanguageRegistry {
        let names: HashMap<String, String> = [("fra", "French"), ("deu", "German"), ("zho", "Chinese"), ("que", "Quechua")]
            .iter()
            .map(|(c, n)| (c.to_string(), n.to_string()))
            .collect();
        let macrolanguages: HashSet<String> = ["zho", "que"].iter().map(|c| c.to_string()).collect();
        let allowed: HashSet<String> = ["que"].iter().map(|c| c.to_string()).collect();
        LanguageRegistry::new(names, macrolanguages, allowed)
    }

    fn kinds(findings: &[Finding]) -> Vec<&FindingKind> {
        findings.iter().map(|f| &f.kind).collect()
    }

    #[test]
    fn clean_record_has_no_findings() {
        let (registry, schema) = (registry(), Schema::generated());
        let auditor = Auditor::new(&registry, &schema);
        let record = SampleRecord::new("fra", "abc", "http://a");
        let blob = to_canonical_string(&record).unwrap();

        let (findings, decoded) = auditor.audit_blob(Path::new("index/fra/fra-abc.json"), &blob);
        assert!(findings.is_empty());
        assert_eq!(decoded, Some(record));
    }

    #[test]
    fn key_order_only_is_non_canonical() {
        let (registry, schema) = (registry(), Schema::generated());
        let auditor = Auditor::new(&registry, &schema);
        let blob = r#"{
  "source_url": "",
  "source_name": "",
  "media_urls": [
    "http://a"
  ],
  "language": "fra",
  "date": "",
  "checksum": "abc",
  "title": ""
}"#;

        let (findings, _) = auditor.audit_blob(Path::new("index/fra/fra-abc.json"), blob);
        assert_eq!(kinds(&findings), vec![&FindingKind::NonCanonicalFormat]);
    }

    #[test]
    fn misplaced_and_non_canonical_are_both_reported() {
        let (registry, schema) = (registry(), Schema::generated());
        let auditor = Auditor::new(&registry, &schema);
        let blob = serde_json::to_string(&SampleRecord::new("fra", "abc", "http://a")).unwrap();

        let (findings, _) = auditor.audit_blob(Path::new("index/deu/fra-abc.json"), &blob);
        assert_eq!(
            kinds(&findings),
            vec![
                &FindingKind::MisplacedRecord {
                    directory: "deu".to_string(),
                    language: "fra".to_string()
                },
                &FindingKind::NonCanonicalFormat
            ]
        );
    }

    #[test]
    fn macrolanguage_gate() {
        let (registry, schema) = (registry(), Schema::generated());
        let auditor = Auditor::new(&registry, &schema);

        let zho = to_canonical_string(&SampleRecord::new("zho", "abc", "http://a")).unwrap();
        let (findings, _) = auditor.audit_blob(Path::new("index/zho/zho-abc.json"), &zho);
        assert_eq!(
            kinds(&findings),
            vec![&FindingKind::MacrolanguageNotAllowed("zho".to_string())]
        );

        let que = to_canonical_string(&SampleRecord::new("que", "abc", "http://a")).unwrap();
        let (findings, _) = auditor.audit_blob(Path::new("index/que/que-abc.json"), &que);
        assert!(findings.is_empty());
    }

    #[test]
    fn unknown_language_and_misnamed_file() {
        let (registry, schema) = (registry(), Schema::generated());
        let auditor = Auditor::new(&registry, &schema);
        let blob = to_canonical_string(&SampleRecord::new("xxx", "abc", "http://a")).unwrap();

        let (findings, _) = auditor.audit_blob(Path::new("index/xxx/xxx-abd.json"), &blob);
        assert_eq!(
            kinds(&findings),
            vec![
                &FindingKind::UnknownLanguage("xxx".to_string()),
                &FindingKind::MisnamedRecord {
                    expected: "xxx-abc.json".to_string()
                }
            ]
        );
    }

    #[test]
    fn schema_violations_do_not_stop_other_checks() {
        let (registry, schema) = (registry(), Schema::generated());
        let auditor = Auditor::new(&registry, &schema);
        let blob = r#"{"language": "zho", "checksum": "abc"}"#;

        let (findings, decoded) = auditor.audit_blob(Path::new("index/fra/zho-abc.json"), blob);
        assert!(decoded.is_none());

        let violations = findings
            .iter()
            .filter(|f| matches!(f.kind, FindingKind::SchemaViolation(_)))
            .count();
        // media_urls, source_name, source_url, date
        assert_eq!(violations, 4);
        assert!(findings.contains(&Finding::new(
            Path::new("index/fra/zho-abc.json"),
            FindingKind::MacrolanguageNotAllowed("zho".to_string())
        )));
        assert!(findings
            .iter()
            .any(|f| matches!(f.kind, FindingKind::MisplacedRecord { .. })));
        assert!(findings
            .iter()
            .any(|f| f.kind == FindingKind::NonCanonicalFormat));
    }

    #[test]
    fn invalid_json_stops_record_checks() {
        let (registry, schema) = (registry(), Schema::generated());
        let auditor = Auditor::new(&registry, &schema);
        let (findings, _) = auditor.audit_blob(Path::new("index/fra/fra-abc.json"), "{\"language\": ");
        assert_eq!(findings.len(), 1);
        assert!(matches!(findings[0].kind, FindingKind::InvalidJson(_)));
    }

    #[test]
    fn index_audit_finds_duplicates() {
        let dir = tempdir().unwrap();
        let store = Store::new(&dir.path().join("index"), &dir.path().join("samples"));
        let record = SampleRecord::new("fra", "abc", "http://a");
        let original = store.write(&record).unwrap();

        let copy = dir.path().join("index/fra/fra-abc-copy.json");
        fs::copy(&original, &copy).unwrap();

        let (registry, schema) = (registry(), Schema::generated());
        let report = Auditor::new(&registry, &schema).audit_index(&store).unwrap();

        assert_eq!(report.records, 2);
        // fra-abc-copy.json sorts first
        assert_eq!(
            kinds(report.findings()),
            vec![
                &FindingKind::MisnamedRecord {
                    expected: "fra-abc.json".to_string()
                },
                &FindingKind::DuplicateRecord { first: copy }
            ]
        );
    }

    #[test]
    fn sample_checksums() {
        let dir = tempdir().unwrap();
        let store = Store::new(&dir.path().join("index"), &dir.path().join("samples"));
        fs::create_dir_all(dir.path().join("samples/fra")).unwrap();

        // md5("hello")
        let good = dir
            .path()
            .join("samples/fra/fra-5d41402abc4b2a76b9719d911017c592.mp3");
        let bad = dir.path().join("samples/fra/fra-0000.mp3");
        fs::write(&good, "hello").unwrap();
        fs::write(&bad, "hello").unwrap();

        let (count, findings) = audit_samples(&store).unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            findings,
            vec![Finding::new(
                &bad,
                FindingKind::ChecksumMismatch {
                    checksum: "5d41402abc4b2a76b9719d911017c592".to_string()
                }
            )]
        );
    }

    #[test]
    fn unreadable_sample_does_not_affect_the_next_one() {
        let dir = tempdir().unwrap();
        let store = Store::new(&dir.path().join("index"), &dir.path().join("samples"));

        // sorted before the valid file, and cannot be read
        let unreadable = dir.path().join("samples/fra/fra-0dir.mp3");
        fs::create_dir_all(&unreadable).unwrap();
        fs::write(unreadable.join("inner"), "partial content").unwrap();
        fs::write(
            dir.path()
                .join("samples/fra/fra-5d41402abc4b2a76b9719d911017c592.mp3"),
            "hello",
        )
        .unwrap();

        let (count, findings) = audit_samples(&store).unwrap();
        assert_eq!(count, 2);
        assert_eq!(findings.len(), 1, "{:?}", findings);
        assert_eq!(findings[0].path, unreadable);
        assert!(matches!(findings[0].kind, FindingKind::Unreadable(_)));
    }

    #[test]
    fn audit_fails_iff_findings() {
        let dir = tempdir().unwrap();
        let store = Store::new(&dir.path().join("index"), &dir.path().join("samples"));
        store
            .write(&SampleRecord::new("fra", "abc", "http://a"))
            .unwrap();

        let (registry, schema) = (registry(), Schema::generated());
        let report = audit(&store, &registry, &schema, true).unwrap();
        assert!(report.is_ok());

        fs::write(dir.path().join("index/fra/fra-abd.json"), "[]").unwrap();
        let report = audit(&store, &registry, &schema, false).unwrap();
        assert!(!report.is_ok());
        assert_eq!(report.records, 2);
    }
}
