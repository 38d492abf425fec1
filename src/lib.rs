//! Weekly timetable and task planner for your terminal. Activity cards go
//! onto a 7-day half-hour grid with overlap prevention enforced on every
//! mutation; one-off and recurring to-dos live next to it, with routines
//! resetting themselves on their daily/weekly/monthly rhythm.
//!

pub mod board;
pub mod cli;
pub mod storage;
pub mod tasks;
pub mod utils;
