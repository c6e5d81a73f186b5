/*! Index types.

- [SampleRecord] and [Annotation]: what is stored on disk,
- [Segment]: a window of a sample, offered to annotators,
- [Dataset]: every loaded record, by language.
!*/
mod dataset;
mod record;
mod segment;

pub use dataset::Dataset;
pub use record::{Annotation, Genders, Label, Problem, SampleRecord, Violation, MAX_SPEAKERS};
pub use segment::{SampleRef, Segment};
