//! The weekly board: recurring activity cards placed on a 7-day, half-hour
//! grid. The model is fully in-memory and synchronous:
//!  - [cards] and [slots] hold the entities and the time/geometry arithmetic.
//!  - [store] is the single place state changes happen, with overlap
//!    rejection enforced on every mutation.
//!  - [gesture] turns pointer motion into store actions for
//!    direct-manipulation editing.

pub mod cards;
pub mod gesture;
pub mod slots;
pub mod store;
