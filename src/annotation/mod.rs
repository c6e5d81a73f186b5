/*! Annotation

Choosing what to listen to next ([scheduler]), and keeping what the annotator said ([recorder]).
[Session] glues both to a loaded dataset.
!*/
pub mod recorder;
pub mod scheduler;
mod session;

pub use recorder::{CoverageUpdate, Recorder};
pub use scheduler::{Scheduler, SchedulerConfig, Strategy, DEFAULT_DURATION_S};
pub use session::{Session, SessionStats};
