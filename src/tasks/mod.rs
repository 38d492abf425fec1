//! The to-do side of the planner. One-off tasks live in the inbox until they
//! get done; recurring tasks form the daily/weekly/monthly routine and flip
//! back to active once their recurrence window elapses (see [recurrence]).

pub mod entities;
pub mod recurrence;
pub mod resetter;
pub mod service;
pub mod stats;
