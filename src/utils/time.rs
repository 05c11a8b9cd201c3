use std::fmt::Display;

use chrono::{Datelike, NaiveDate};
use clap::ValueEnum;

/// This is the standard way of converting a date to a string in daylog. Remote records carry
/// their day in this format.
pub fn date_to_record_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Order of day and month, both when parsing user input and when printing short dates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum DateStyle {
    #[default]
    Uk,
    Us,
}

impl DateStyle {
    /// Short numeric date without zero padding, e.g. `14/10/2026` or `10/14/2026`.
    pub fn short_date(&self, date: NaiveDate) -> String {
        match self {
            DateStyle::Uk => format!("{}/{}/{}", date.day(), date.month(), date.year()),
            DateStyle::Us => format!("{}/{}/{}", date.month(), date.day(), date.year()),
        }
    }
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}
