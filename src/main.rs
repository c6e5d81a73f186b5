//! # Wide Language Index
//!
//! Tooling for the Wide Language Index, a crowd-sourced dataset of short spoken-language audio samples.
//!
//! ## Getting started
//!
//! ```sh
//! wide-language-index 0.4.0
//! audit and annotate the Wide Language Index.
//!
//! USAGE:
//!     wide-language-index <SUBCOMMAND>
//!
//! SUBCOMMANDS:
//!     audit     Check every record (and audio file) of the dataset
//!     clips     Crop annotated segments into samples/_annotated
//!     help      Prints this message or the help of the given subcommand(s)
//!     next      Print the next segments to annotate, as json lines
//!     normalize Rewrite records in canonical form
//!     record    Record an annotation
//!     schema    Print or write the record schema
//! ```
//!
//! Logging is controlled with `RUST_LOG` (eg. `RUST_LOG=info`).
use std::fs;

use structopt::StructOpt;

use wide_language_index::annotation::{Recorder, Session};
use wide_language_index::audio::{Ffmpeg, Ffprobe};
use wide_language_index::config::User;
use wide_language_index::error::Error;
use wide_language_index::lang::{LanguageFilter, LanguageRegistry};
use wide_language_index::processing::{self, Schema};
use wide_language_index::types::{Annotation, Genders, Label, SampleRef, Segment};

#[macro_use]
extern crate log;

mod cli;

fn annotation(r: &cli::Record, segment: &Segment, annotator: String) -> Result<Annotation, Error> {
    let date = chrono::Local::now().date_naive();
    match r.label {
        Label::Good => {
            if !r.problems.is_empty() {
                return Err(Error::Config(
                    "a good segment cannot have problems".to_string(),
                ));
            }
            let speakers = r.speakers.ok_or_else(|| {
                Error::Config("--speakers is required for good segments".to_string())
            })?;
            Ok(Annotation::good(
                segment,
                speakers,
                r.genders.unwrap_or(Genders::Unclear),
                annotator,
                date,
            ))
        }
        Label::Bad => Ok(Annotation::bad(segment, r.problems.clone(), annotator, date)),
    }
}

fn main() -> Result<(), Error> {
    env_logger::init();

    let opt = cli::WideLanguageIndex::from_args();
    debug!("cli args\n{:#?}", opt);

    match opt {
        cli::WideLanguageIndex::Audit(a) => {
            let layout = a.dataset.layout();
            let schema = Schema::load(&layout.schema)?;
            let registry = LanguageRegistry::from_files(
                &layout.name_index,
                &layout.iso_table,
                a.allowed_macrolanguages(),
            )?;

            let report =
                processing::audit(&layout.store(), &registry, &schema, !a.skip_audio)?;
            for finding in report.findings() {
                println!("{}", finding);
            }
            println!("{}", report);

            if !report.is_ok() {
                return Err(Error::AuditFailed(report.findings().len()));
            }
        }

        cli::WideLanguageIndex::Schema(s) => {
            let content = Schema::generated().to_pretty_string()?;
            match s.dst {
                Some(dst) => {
                    fs::write(&dst, content)?;
                    info!("schema written to {:?}", dst);
                }
                None => println!("{}", content),
            }
        }

        cli::WideLanguageIndex::Next(n) => {
            let layout = n.dataset.layout();
            let schema = Schema::load(&layout.schema)?;
            let filter = n.schedule.filter()?;
            let config = n.schedule.config()?;
            let dataset = layout.store().load(&schema, &filter)?;

            let session = Session::new(layout.store(), dataset, config, Ffprobe::default());
            for segment in session.take(n.count) {
                println!("{}", serde_json::to_string(&segment?)?);
            }
        }

        cli::WideLanguageIndex::Record(r) => {
            let layout = r.dataset.layout();
            let schema = Schema::load(&layout.schema)?;
            let annotator = match &r.annotator {
                Some(a) => a.clone(),
                None => User::load_default()?
                    .map(|user| user.to_string())
                    .ok_or_else(|| {
                        Error::Config(
                            "no annotator: use --annotator or create ~/.widelanguageindex"
                                .to_string(),
                        )
                    })?,
            };

            let store = layout.store();
            let mut dataset = store.load(&schema, &LanguageFilter::only(&r.language))?;
            let segment = Segment::new(SampleRef::new(&r.language, &r.checksum), r.offset, r.duration);
            let annotation = annotation(&r, &segment, annotator)?;
            Recorder::new(&store).record(&mut dataset, &segment, annotation)?;
        }

        cli::WideLanguageIndex::Clips(c) => {
            let layout = c.dataset.layout();
            let schema = Schema::load(&layout.schema)?;
            let store = layout.store();
            let dataset = store.load(&schema, &LanguageFilter::All)?;
            let written = processing::make_clips(&store, &dataset, &Ffmpeg::new(&c.ffmpeg))?;
            println!("{} clips written", written);
        }

        cli::WideLanguageIndex::Normalize(n) => {
            let changed = processing::normalize(&n.dataset.layout().store())?;
            println!("{} records changed", changed);
        }
    };
    Ok(())
}
