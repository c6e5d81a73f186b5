use std::fs;
use std::path::Path;

use md5::{Digest, Md5};
use tempfile::tempdir;
use wide_language_index::config::Layout;
use wide_language_index::io::to_canonical_string;
use wide_language_index::lang::{LanguageRegistry, DEFAULT_ALLOWED_MACROLANGUAGES};
use wide_language_index::processing::{audit, FindingKind, Schema};
use wide_language_index::types::SampleRecord;

const NAME_INDEX: &str = r#"[
  {"id": "fra", "print_name": "French"},
  {"id": "jpn", "print_name": "Japanese"},
  {"id": "zho", "print_name": "Chinese"},
  {"id": "nor", "print_name": "Norwegian"}
]"#;

const ISO_TABLE: &str = "Id\tPart2B\tPart2T\tPart1\tScope\tLanguage_Type\tRef_Name\tComment
fra\tfre\tfra\tfr\tI\tL\tFrench\t
jpn\tjpn\tjpn\tja\tI\tL\tJapanese\t
zho\tchi\tzho\tzh\tM\tL\tChinese\t
nor\tnor\tnor\tno\tM\tL\tNorwegian\t
";

/// writes reference data and the schema, returns the layout.
fn dataset_root(root: &Path) -> Layout {
    let layout = Layout::from_root(root);
    fs::create_dir_all(root.join("ext")).unwrap();
    fs::create_dir_all(&layout.index_dir).unwrap();
    fs::write(&layout.name_index, NAME_INDEX).unwrap();
    fs::write(&layout.iso_table, ISO_TABLE).unwrap();
    fs::write(
        &layout.schema,
        Schema::generated().to_pretty_string().unwrap(),
    )
    .unwrap();
    layout
}

/// writes an audio file named after its md5, and its record.
fn add_sample(layout: &Layout, language: &str, content: &str) -> SampleRecord {
    let checksum = format!("{:x}", Md5::digest(content.as_bytes()));
    let record = SampleRecord::new(language, &checksum, "http://example.com/a.mp3");
    let store = layout.store();
    store.write(&record).unwrap();

    let audio = store.audio_path(&record.sample_ref());
    fs::create_dir_all(audio.parent().unwrap()).unwrap();
    fs::write(audio, content).unwrap();
    record
}

fn registry(layout: &Layout) -> LanguageRegistry {
    LanguageRegistry::from_files(
        &layout.name_index,
        &layout.iso_table,
        DEFAULT_ALLOWED_MACROLANGUAGES.iter().map(|c| c.to_string()),
    )
    .unwrap()
}

#[test_log::test]
fn clean_dataset_passes() {
    let dir = tempdir().unwrap();
    let layout = dataset_root(dir.path());
    add_sample(&layout, "fra", "bonjour");
    add_sample(&layout, "jpn", "konnichiwa");
    add_sample(&layout, "nor", "hei");

    let schema = Schema::load(&layout.schema).unwrap();
    let report = audit(&layout.store(), &registry(&layout), &schema, true).unwrap();
    assert!(report.is_ok(), "{:?}", report.findings());
    assert_eq!(report.records, 3);
    assert_eq!(report.samples, 3);
}

#[test]
fn every_problem_is_reported() {
    let dir = tempdir().unwrap();
    let layout = dataset_root(dir.path());
    let fra = add_sample(&layout, "fra", "bonjour");
    add_sample(&layout, "jpn", "konnichiwa");

    // fra record stored under jpn, not canonical
    let misplaced = layout.index_dir.join("jpn").join(format!("fra-{}.json", fra.checksum));
    fs::write(&misplaced, serde_json::to_string(&fra).unwrap()).unwrap();

    // macrolanguage that is not allow-listed
    let zho = SampleRecord::new("zho", "abc", "http://example.com/b.mp3");
    let zho_path = layout.index_dir.join("zho/zho-abc.json");
    fs::create_dir_all(zho_path.parent().unwrap()).unwrap();
    fs::write(&zho_path, to_canonical_string(&zho).unwrap()).unwrap();

    // audio that does not match its name
    fs::write(layout.samples_dir.join("jpn/jpn-0000.mp3"), "sayonara").unwrap();

    let schema = Schema::load(&layout.schema).unwrap();
    let report = audit(&layout.store(), &registry(&layout), &schema, true).unwrap();
    assert!(!report.is_ok());

    let kinds: Vec<&FindingKind> = report.findings().iter().map(|f| &f.kind).collect();
    assert!(kinds.contains(&&FindingKind::MisplacedRecord {
        directory: "jpn".to_string(),
        language: "fra".to_string()
    }));
    assert!(kinds.contains(&&FindingKind::NonCanonicalFormat));
    assert!(kinds.contains(&&FindingKind::DuplicateRecord {
        first: layout
            .index_dir
            .join("fra")
            .join(format!("fra-{}.json", fra.checksum))
    }));
    assert!(kinds.contains(&&FindingKind::MacrolanguageNotAllowed("zho".to_string())));
    assert!(kinds
        .iter()
        .any(|k| matches!(k, FindingKind::ChecksumMismatch { .. })));
    assert_eq!(report.findings().len(), 5);
}

#[test]
fn skipping_audio() {
    let dir = tempdir().unwrap();
    let layout = dataset_root(dir.path());
    add_sample(&layout, "fra", "bonjour");
    fs::write(layout.samples_dir.join("fra/fra-0000.mp3"), "au revoir").unwrap();

    let schema = Schema::load(&layout.schema).unwrap();
    let report = audit(&layout.store(), &registry(&layout), &schema, false).unwrap();
    assert!(report.is_ok());
    assert_eq!(report.samples, 0);
}

#[test]
fn missing_schema_is_config_error() {
    let dir = tempdir().unwrap();
    let layout = Layout::from_root(dir.path());
    assert!(matches!(
        Schema::load(&layout.schema),
        Err(wide_language_index::error::Error::Config(_))
    ));
}
