//! Command line arguments and parameters management/parsing.
use std::path::PathBuf;

use structopt::StructOpt;

use wide_language_index::annotation::{SchedulerConfig, Strategy};
use wide_language_index::config::Layout;
use wide_language_index::error::Error;
use wide_language_index::lang::{LanguageFilter, DEFAULT_ALLOWED_MACROLANGUAGES};
use wide_language_index::types::{Genders, Label, Problem};

#[derive(Debug, StructOpt)]
#[structopt(
    name = "wide-language-index",
    about = "audit and annotate the Wide Language Index."
)]
/// Holds every command that is callable by the `wide-language-index` command.
pub enum WideLanguageIndex {
    #[structopt(about = "Check every record (and audio file) of the dataset")]
    Audit(Audit),
    #[structopt(about = "Print or write the record schema")]
    Schema(Schema),
    #[structopt(about = "Print the next segments to annotate, as json lines")]
    Next(Next),
    #[structopt(about = "Record an annotation")]
    Record(Record),
    #[structopt(about = "Crop annotated segments into samples/_annotated")]
    Clips(Clips),
    #[structopt(about = "Rewrite records in canonical form")]
    Normalize(Normalize),
}

/// Where the dataset lives.
#[derive(Debug, StructOpt)]
pub struct DatasetOpts {
    #[structopt(
        long = "root",
        parse(from_os_str),
        default_value = ".",
        help = "dataset root (contains index/, samples/ and ext/)"
    )]
    pub root: PathBuf,
    #[structopt(long = "index-dir", parse(from_os_str), help = "override index/")]
    pub index_dir: Option<PathBuf>,
    #[structopt(long = "samples-dir", parse(from_os_str), help = "override samples/")]
    pub samples_dir: Option<PathBuf>,
    #[structopt(
        long = "schema",
        parse(from_os_str),
        help = "override index/sample.schema.json"
    )]
    pub schema: Option<PathBuf>,
    #[structopt(
        long = "name-index",
        parse(from_os_str),
        help = "override ext/name_index_20140320.json"
    )]
    pub name_index: Option<PathBuf>,
    #[structopt(long = "iso-table", parse(from_os_str), help = "override ext/iso-639-3.tab")]
    pub iso_table: Option<PathBuf>,
}

impl DatasetOpts {
    pub fn layout(&self) -> Layout {
        let mut layout = Layout::from_root(&self.root);
        if let Some(index_dir) = &self.index_dir {
            layout.schema = index_dir.join("sample.schema.json");
            layout.index_dir = index_dir.clone();
        }
        let overrides = [
            (&self.samples_dir, &mut layout.samples_dir),
            (&self.schema, &mut layout.schema),
            (&self.name_index, &mut layout.name_index),
            (&self.iso_table, &mut layout.iso_table),
        ];
        for (value, path) in overrides {
            if let Some(value) = value {
                *path = value.clone();
            }
        }
        layout
    }
}

/// Which languages to schedule, and how.
#[derive(Debug, StructOpt)]
pub struct ScheduleOpts {
    #[structopt(
        long = "language-set",
        help = "only schedule a named language set, or @code,code,..."
    )]
    pub language_set: Option<String>,
    #[structopt(long = "only", help = "only schedule a single language")]
    pub only: Option<String>,
    #[structopt(
        long = "strategy",
        default_value = "worst",
        help = "how to pick the next language (worst, greedy)"
    )]
    pub strategy: Strategy,
    #[structopt(
        long = "max-per-sample",
        help = "do not offer samples with this many good annotations"
    )]
    pub max_per_sample: Option<usize>,
    #[structopt(long = "duration", short = "d", default_value = "20", help = "segment length (seconds)")]
    pub duration: u32,
}

impl ScheduleOpts {
    pub fn filter(&self) -> Result<LanguageFilter, Error> {
        LanguageFilter::from_options(self.language_set.as_deref(), self.only.as_deref())
    }

    pub fn config(&self) -> Result<SchedulerConfig, Error> {
        if self.duration == 0 {
            return Err(Error::Config("duration must be positive".to_string()));
        }
        Ok(SchedulerConfig {
            duration: self.duration,
            strategy: self.strategy,
            max_per_sample: self.max_per_sample,
        })
    }
}

#[derive(Debug, StructOpt)]
pub struct Audit {
    #[structopt(flatten)]
    pub dataset: DatasetOpts,
    #[structopt(long = "skip-audio", help = "do not check audio checksums")]
    pub skip_audio: bool,
    #[structopt(
        long = "allow-macrolanguage",
        help = "macrolanguage accepted as a sample language (repeatable, replaces the default list)"
    )]
    pub allow_macrolanguages: Vec<String>,
}

impl Audit {
    pub fn allowed_macrolanguages(&self) -> Vec<String> {
        if self.allow_macrolanguages.is_empty() {
            DEFAULT_ALLOWED_MACROLANGUAGES
                .iter()
                .map(|c| c.to_string())
                .collect()
        } else {
            self.allow_macrolanguages.clone()
        }
    }
}

#[derive(Debug, StructOpt)]
pub struct Schema {
    #[structopt(parse(from_os_str), help = "write to this file instead of stdout")]
    pub dst: Option<PathBuf>,
}

#[derive(Debug, StructOpt)]
pub struct Next {
    #[structopt(flatten)]
    pub dataset: DatasetOpts,
    #[structopt(flatten)]
    pub schedule: ScheduleOpts,
    #[structopt(short = "n", default_value = "1", help = "number of segments")]
    pub count: usize,
}

#[derive(Debug, StructOpt)]
pub struct Record {
    #[structopt(flatten)]
    pub dataset: DatasetOpts,
    #[structopt(help = "language of the sample")]
    pub language: String,
    #[structopt(help = "checksum of the sample")]
    pub checksum: String,
    #[structopt(help = "segment start (seconds)")]
    pub offset: u32,
    #[structopt(long = "duration", short = "d", default_value = "20", help = "segment length (seconds)")]
    pub duration: u32,
    #[structopt(long = "label", help = "good or bad")]
    pub label: Label,
    #[structopt(long = "problem", help = "problem with a bad segment (repeatable)")]
    pub problems: Vec<Problem>,
    #[structopt(long = "speakers", help = "number of speakers (good segments)")]
    pub speakers: Option<u8>,
    #[structopt(long = "genders", help = "male, female, mixed or unclear (good segments)")]
    pub genders: Option<Genders>,
    #[structopt(
        long = "annotator",
        help = "\"Name <email>\", defaults to the user in ~/.widelanguageindex"
    )]
    pub annotator: Option<String>,
}

#[derive(Debug, StructOpt)]
pub struct Clips {
    #[structopt(flatten)]
    pub dataset: DatasetOpts,
    #[structopt(long = "ffmpeg", default_value = "ffmpeg", help = "ffmpeg binary")]
    pub ffmpeg: String,
}

#[derive(Debug, StructOpt)]
pub struct Normalize {
    #[structopt(flatten)]
    pub dataset: DatasetOpts,
}
