//! The day log is organized around [store::DayLogStore].
//!  - A day log shows one calendar date at a time, the selected date.
//!  - Activities of that date are kept in memory and split into 24 hour buckets on read.
//!  - Changes are applied to memory first and reconciled with the remote store afterwards.

pub mod entities;
pub mod export;
pub mod mapping;
pub mod store;
