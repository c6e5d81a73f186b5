/*! Dataset processing

Whole-dataset operations:
- validating records against the schema ([Schema]),
- auditing the index and audio files ([audit]),
- cutting annotated clips ([clips]),
- rewriting records in canonical form ([normalize]).
!*/
pub mod audit;
pub mod clips;
pub mod normalize;
mod schema;

pub use audit::{audit, AuditReport, Auditor, Finding, FindingKind};
pub use clips::make_clips;
pub use normalize::normalize;
pub use schema::Schema;
