//! Simple to use cli for logging what you did in every hour of the day.
//! The day log keeps the selected day in memory and applies every change right away, while the
//! activity store catches up in the background.
//!

pub mod cli;
pub mod day_log;
pub mod remote;
pub mod utils;
