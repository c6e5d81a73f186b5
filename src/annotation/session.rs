/*! Annotation session

Ties the scheduler and the recorder to one loaded dataset.
A front end pulls segments with [Session::next_segment] (or iterates the session),
and answers each one with either [Session::record] or [Session::skip_segment].

```no_run
use std::path::Path;

use wide_language_index::annotation::{SchedulerConfig, Session};
use wide_language_index::error::Error;
use wide_language_index::io::Store;
use wide_language_index::lang::LanguageFilter;
use wide_language_index::processing::Schema;

let store = Store::new(Path::new("index"), Path::new("samples"));
let dataset = store.load(&Schema::generated(), &LanguageFilter::All)?;
let duration = |_: &Path| Ok::<f64, Error>(60.0);
let mut session = Session::new(store, dataset, SchedulerConfig::default(), duration);

while let Some(segment) = session.next_segment()? {
    session.skip_segment(&segment);
}
println!("{}", session.stats());
# Ok::<(), Error>(())
```
!*/
use std::fmt;

use log::debug;

use crate::audio::DurationProbe;
use crate::error::Error;
use crate::io::Store;
use crate::types::{Annotation, Dataset, Segment};

use super::recorder::{CoverageUpdate, Recorder};
use super::scheduler::{Scheduler, SchedulerConfig};

/// Counters for a session.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionStats {
    pub annotated: usize,
    pub skipped: usize,
}

impl SessionStats {
    pub fn listened(&self) -> usize {
        self.annotated + self.skipped
    }
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "listened: {}", self.listened())?;
        writeln!(f, "annotated: {}", self.annotated)?;
        write!(f, "skipped: {}", self.skipped)
    }
}

pub struct Session<P: DurationProbe> {
    store: Store,
    dataset: Dataset,
    scheduler: Scheduler,
    probe: P,
    stats: SessionStats,
}

impl<P: DurationProbe> Session<P> {
    pub fn new(store: Store, dataset: Dataset, config: SchedulerConfig, probe: P) -> Self {
        let scheduler = Scheduler::new(&dataset, config);
        Self::with_scheduler(store, dataset, scheduler, probe)
    }

    /// Build a session around an existing scheduler (eg. one with a seeded rng).
    pub fn with_scheduler(store: Store, dataset: Dataset, scheduler: Scheduler, probe: P) -> Self {
        Self {
            store,
            dataset,
            scheduler,
            probe,
            stats: SessionStats::default(),
        }
    }

    /// Next segment to annotate, `None` when there is nothing left.
    pub fn next_segment(&mut self) -> Result<Option<Segment>, Error> {
        self.scheduler
            .next_segment(&self.dataset, &self.store, &self.probe)
    }

    /// Record an annotation for a segment that was offered.
    pub fn record(
        &mut self,
        segment: &Segment,
        annotation: Annotation,
    ) -> Result<CoverageUpdate, Error> {
        let update = Recorder::new(&self.store).record(&mut self.dataset, segment, annotation)?;
        self.stats.annotated += 1;
        Ok(update)
    }

    /// The annotator passed on a segment. It will not be offered again in this session.
    pub fn skip_segment(&mut self, segment: &Segment) {
        debug!("skipped {}", segment);
        self.stats.skipped += 1;
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn language_coverage(&self, language: &str) -> usize {
        self.dataset.language_coverage(language)
    }
}

impl<P: DurationProbe> Iterator for Session<P> {
    type Item = Result<Segment, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_segment().transpose()
    }
}
