/*!
# IO utilities

Reading and writing the on-disk index.

Records are only ever written whole and in canonical form (see [canonical]).
!*/
pub mod canonical;
mod store;

pub use canonical::{is_canonical, to_canonical_string};
pub use store::{Store, CLIPS_DIR};
