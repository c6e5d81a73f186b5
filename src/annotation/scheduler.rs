/*! Coverage-weighted scheduler

Decides which segment is offered next to an annotator.

Languages sit in a min-heap keyed on their coverage (number of `good` annotations),
with a random component to break ties that is drawn anew each time a language is pushed.
Within a language, samples with fewer annotations come first,
and within a sample the window is picked at random among the ones nobody annotated yet.

The scheduler is a pull-based generator: each call to [Scheduler::next_segment]
does just enough work to produce one segment.
The language that produced the last segment is only pushed back on the following call,
so that an annotation recorded in between is reflected in its key.
!*/
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::audio::DurationProbe;
use crate::error::Error;
use crate::io::Store;
use crate::types::{Dataset, SampleRecord, SampleRef, Segment};

/// Default window length, in seconds.
pub const DEFAULT_DURATION_S: u32 = 20;

/// Number of good annotations a language needs before the greedy strategy stops favouring it.
pub const GREEDY_RELEASE_THRESHOLD: usize = 10;

/// Longest sample duration accepted (one day, in seconds).
pub const MAX_SAMPLE_LENGTH_S: f64 = 86_400.0;

/// How languages are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Least covered languages first.
    Worst,
    /// Languages closest to release first: the most covered ones below the release threshold,
    /// then the ones without annotations, then the ones that have enough.
    Greedy,
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::Worst
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "worst" => Ok(Strategy::Worst),
            "greedy" => Ok(Strategy::Greedy),
            other => Err(format!("unknown strategy {} (worst, greedy)", other)),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Worst => write!(f, "worst"),
            Strategy::Greedy => write!(f, "greedy"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// window length, in seconds.
    pub duration: u32,
    pub strategy: Strategy,
    /// Samples with at least this many good annotations are not offered anymore.
    pub max_per_sample: Option<usize>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            duration: DEFAULT_DURATION_S,
            strategy: Strategy::default(),
            max_per_sample: None,
        }
    }
}

/// Heap key of a language. Lower keys are served first.
///
/// Field order matters: the derived ordering compares `rank`, then `samples`,
/// then the random `tiebreak`, and finally the code itself.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct LanguageKey {
    rank: i64,
    samples: i64,
    tiebreak: u64,
    language: String,
}

impl LanguageKey {
    pub fn language(&self) -> &str {
        &self.language
    }
}

pub struct Scheduler {
    config: SchedulerConfig,
    queue: BinaryHeap<Reverse<LanguageKey>>,
    /// language of the last segment offered, pushed back on the next request
    pending: Option<String>,
    /// every segment offered so far, never offered twice
    offered: HashSet<Segment>,
    durations: HashMap<SampleRef, f64>,
    rng: StdRng,
}

impl Scheduler {
    /// Build the queue with every language of the dataset.
    pub fn new(dataset: &Dataset, config: SchedulerConfig) -> Self {
        Self::with_rng(dataset, config, StdRng::from_entropy())
    }

    /// Same as [Scheduler::new], with a provided random source.
    pub fn with_rng(dataset: &Dataset, config: SchedulerConfig, rng: StdRng) -> Self {
        let mut scheduler = Self {
            config,
            queue: BinaryHeap::new(),
            pending: None,
            offered: HashSet::new(),
            durations: HashMap::new(),
            rng,
        };

        let languages: Vec<String> = dataset.languages().map(String::from).collect();
        for language in languages {
            scheduler.push(dataset, language);
        }
        debug!("scheduling {} languages", scheduler.queue.len());
        scheduler
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Number of languages that can still be scheduled.
    pub fn languages_left(&self) -> usize {
        self.queue.len() + usize::from(self.pending.is_some())
    }

    /// Compute the heap key of a language from the current state of the dataset.
    pub fn language_key(&mut self, dataset: &Dataset, language: &str) -> LanguageKey {
        let good = dataset.language_coverage(language);
        let (rank, samples) = match self.config.strategy {
            Strategy::Worst => (good as i64, 0),
            Strategy::Greedy => {
                let rank = if good < GREEDY_RELEASE_THRESHOLD {
                    -(good as i64)
                } else {
                    good as i64
                };
                (rank, -(dataset.sample_count(language) as i64))
            }
        };

        LanguageKey {
            rank,
            samples,
            tiebreak: self.rng.gen(),
            language: language.to_string(),
        }
    }

    fn push(&mut self, dataset: &Dataset, language: String) {
        let key = self.language_key(dataset, &language);
        self.queue.push(Reverse(key));
    }

    /// Samples of a language in the order they should be tried:
    /// fewer good annotations first, then fewer annotations overall, then at random.
    fn rank_samples<'d>(&mut self, dataset: &'d Dataset, language: &str) -> Vec<&'d SampleRecord> {
        let max_per_sample = self.config.max_per_sample;
        let mut ranked: Vec<(usize, usize, u64, &SampleRecord)> = dataset
            .samples(language)
            .filter(|s| max_per_sample.map_or(true, |max| s.good_count() < max))
            .map(|s| (s.good_count(), s.annotation_count(), self.rng.gen(), s))
            .collect();
        ranked.sort_by(|a, b| (a.0, a.1, a.2).cmp(&(b.0, b.1, b.2)));
        ranked.into_iter().map(|(_, _, _, s)| s).collect()
    }

    fn sample_duration<P>(&mut self, store: &Store, probe: &P, sample: &SampleRef) -> Result<f64, Error>
    where
        P: DurationProbe + ?Sized,
    {
        if let Some(duration) = self.durations.get(sample) {
            return Ok(*duration);
        }

        let path = store.audio_path(sample);
        let duration = probe.duration(&path)?;
        if !(0.0..=MAX_SAMPLE_LENGTH_S).contains(&duration) {
            return Err(Error::ResourceRead {
                path,
                reason: format!("unusable duration {}s", duration),
            });
        }
        self.durations.insert(sample.clone(), duration);
        Ok(duration)
    }

    /// First window of `record` that is neither annotated nor already offered.
    fn pick_window<P>(
        &mut self,
        store: &Store,
        probe: &P,
        record: &SampleRecord,
    ) -> Result<Option<Segment>, Error>
    where
        P: DurationProbe + ?Sized,
    {
        let duration = self.config.duration;
        if duration == 0 {
            return Ok(None);
        }
        let sample = record.sample_ref();
        let length = self.sample_duration(store, probe, &sample)?;

        let windows = (length / f64::from(duration)).floor() as u32;
        let mut offsets: Vec<u32> = (0..windows)
            .map_while(|i| i.checked_mul(duration))
            .collect();
        offsets.shuffle(&mut self.rng);

        let annotated = record.annotated_offsets(duration);
        Ok(offsets
            .into_iter()
            .filter(|offset| !annotated.contains(offset))
            .map(|offset| Segment::new(sample.clone(), offset, duration))
            .find(|segment| !self.offered.contains(segment)))
    }

    fn find_segment<P>(
        &mut self,
        dataset: &Dataset,
        store: &Store,
        probe: &P,
        language: &str,
    ) -> Result<Option<Segment>, Error>
    where
        P: DurationProbe + ?Sized,
    {
        for record in self.rank_samples(dataset, language) {
            if let Some(segment) = self.pick_window(store, probe, record)? {
                return Ok(Some(segment));
            }
        }
        Ok(None)
    }

    /// Next segment to annotate.
    ///
    /// Returns `Ok(None)` once no language has anything left to offer.
    /// Failing to read a sample's duration is an error for this request only:
    /// the language stays scheduled.
    pub fn next_segment<P>(
        &mut self,
        dataset: &Dataset,
        store: &Store,
        probe: &P,
    ) -> Result<Option<Segment>, Error>
    where
        P: DurationProbe + ?Sized,
    {
        if let Some(language) = self.pending.take() {
            self.push(dataset, language);
        }

        while let Some(Reverse(key)) = self.queue.pop() {
            match self.find_segment(dataset, store, probe, &key.language) {
                Ok(Some(segment)) => {
                    debug!("offering {} ({:?})", segment, key);
                    self.offered.insert(segment.clone());
                    self.pending = Some(key.language);
                    return Ok(Some(segment));
                }
                Ok(None) => warn!("skipping {}: need more samples", key.language),
                Err(e) => {
                    self.pending = Some(key.language);
                    return Err(e);
                }
            }
        }

        info!("no segment left to annotate");
        Ok(None)
    }
}
