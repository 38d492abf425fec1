//! Persistence under the application state directory:
//!  - Tasks go through [journal::TaskJournalImpl]: month-segmented JSON-lines
//!    files, one record per line, tolerant of a write that got cut off.
//!  - The weekly board is a plain snapshot file, [snapshot::BoardFile].

pub mod journal;
pub mod snapshot;
