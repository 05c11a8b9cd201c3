use std::{fmt::Display, str::FromStr, sync::Arc};

use anyhow::{anyhow, bail, Result};
use clap::ValueEnum;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minutes in a whole day. Logged time is shown against this budget.
pub const DAY_BUDGET_MINUTES: u32 = 24 * 60;

/// An hour holding more than this many minutes is shown with a warning. It's never rejected.
pub const HOUR_LIMIT_MINUTES: u32 = 60;

const TEMPORARY_PREFIX: &str = "tmp-";

/// Opaque identifier of an activity. Ids are assigned by the remote store, except for the short
/// window between an optimistic insert and its confirmation, where a temporary id is used.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(Arc<str>);

impl ActivityId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// Client side id for a record the remote store hasn't confirmed yet.
    pub fn temporary() -> Self {
        Self(format!("{TEMPORARY_PREFIX}{}", Uuid::new_v4()).into())
    }

    pub fn is_temporary(&self) -> bool {
        self.0.starts_with(TEMPORARY_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ActivityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActivityId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ActivityId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Hour of a day, 0 to 23.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Hour(u8);

impl Hour {
    pub const COUNT: usize = 24;

    pub fn new_opt(value: u8) -> Option<Hour> {
        if (value as usize) < Self::COUNT {
            Some(Hour(value))
        } else {
            None
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// All hours of a day in order.
    pub fn all() -> impl Iterator<Item = Hour> {
        (0..Self::COUNT as u8).map(Hour)
    }
}

impl TryFrom<u8> for Hour {
    type Error = anyhow::Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Hour::new_opt(value).ok_or_else(|| anyhow!("Hour must be between 0 and 23, got {value}"))
    }
}

impl From<Hour> for u8 {
    fn from(value: Hour) -> Self {
        value.0
    }
}

impl FromStr for Hour {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept both "9" and "9:00"
        let s = s.trim().trim_end_matches(":00");
        s.parse::<u8>()?.try_into()
    }
}

impl Display for Hour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:00", self.0)
    }
}

/// Palette tag of an activity. Only used for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorTheme {
    Green,
    Blue,
    Purple,
    Orange,
    Pink,
    Indigo,
    Yellow,
    Red,
    Teal,
    Cyan,
}

impl ColorTheme {
    pub const ALL: [ColorTheme; 10] = [
        ColorTheme::Green,
        ColorTheme::Blue,
        ColorTheme::Purple,
        ColorTheme::Orange,
        ColorTheme::Pink,
        ColorTheme::Indigo,
        ColorTheme::Yellow,
        ColorTheme::Red,
        ColorTheme::Teal,
        ColorTheme::Cyan,
    ];

    /// Picks a palette entry uniformly at random.
    pub fn random() -> Self {
        *Self::ALL
            .choose(&mut rand::thread_rng())
            .unwrap_or(&ColorTheme::Blue)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColorTheme::Green => "green",
            ColorTheme::Blue => "blue",
            ColorTheme::Purple => "purple",
            ColorTheme::Orange => "orange",
            ColorTheme::Pink => "pink",
            ColorTheme::Indigo => "indigo",
            ColorTheme::Yellow => "yellow",
            ColorTheme::Red => "red",
            ColorTheme::Teal => "teal",
            ColorTheme::Cyan => "cyan",
        }
    }

    /// Display color of the tag as RGB.
    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            ColorTheme::Green => (0x22, 0xc5, 0x5e),
            ColorTheme::Blue => (0x3b, 0x82, 0xf6),
            ColorTheme::Purple => (0xa8, 0x55, 0xf7),
            ColorTheme::Orange => (0xf9, 0x73, 0x16),
            ColorTheme::Pink => (0xec, 0x48, 0x99),
            ColorTheme::Indigo => (0x63, 0x66, 0xf1),
            ColorTheme::Yellow => (0xea, 0xb3, 0x08),
            ColorTheme::Red => (0xef, 0x44, 0x44),
            ColorTheme::Teal => (0x14, 0xb8, 0xa6),
            ColorTheme::Cyan => (0x06, 0xb6, 0xd4),
        }
    }
}

impl Display for ColorTheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorTheme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|theme| theme.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| anyhow!("Unknown color theme {s}"))
    }
}

/// One logged entry. Serialized with camelCase keys, which is the shape consumers of the day log
/// see. Remote records use their own naming, see [super::mapping].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: ActivityId,
    pub name: String,
    pub duration: u32,
    pub color_theme: ColorTheme,
    pub hour: Hour,
}

impl Activity {
    /// Merges present fields of an update. Hour is not part of an update, activities stay in the
    /// hour they were created in.
    pub fn apply(&mut self, update: &ActivityUpdate) {
        if let Some(name) = &update.name {
            self.name = name.trim().to_string();
        }
        if let Some(duration) = update.duration {
            self.duration = duration;
        }
        if let Some(color_theme) = update.color_theme {
            self.color_theme = color_theme;
        }
    }
}

/// Fields of a new activity. Construction validates them, so anything that reaches the store is
/// already well-formed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityData {
    name: String,
    duration: u32,
    color_theme: ColorTheme,
}

impl ActivityData {
    /// A missing color is picked at random.
    pub fn new(
        name: impl Into<String>,
        duration: u32,
        color_theme: Option<ColorTheme>,
    ) -> Result<Self> {
        Ok(Self {
            name: validate_name(&name.into())?,
            duration: validate_duration(duration)?,
            color_theme: color_theme.unwrap_or_else(ColorTheme::random),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn color_theme(&self) -> ColorTheme {
        self.color_theme
    }
}

/// Partial set of activity fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityUpdate {
    pub name: Option<String>,
    pub duration: Option<u32>,
    pub color_theme: Option<ColorTheme>,
}

impl ActivityUpdate {
    pub fn with_name(self, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..self
        }
    }

    pub fn with_duration(self, duration: u32) -> Self {
        Self {
            duration: Some(duration),
            ..self
        }
    }

    pub fn with_color_theme(self, color_theme: ColorTheme) -> Self {
        Self {
            color_theme: Some(color_theme),
            ..self
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.duration.is_none() && self.color_theme.is_none()
    }

    /// Same rules as [ActivityData::new], applied to present fields only.
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(duration) = self.duration {
            validate_duration(duration)?;
        }
        Ok(())
    }
}

pub(crate) fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        bail!("Activity name can't be empty");
    }
    Ok(name.to_string())
}

pub(crate) fn validate_duration(duration: u32) -> Result<u32> {
    if duration == 0 {
        bail!("Activity duration must be at least one minute");
    }
    Ok(duration)
}

/// Activities of one hour, in the order they were fetched. Derived from the flat activity list
/// and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourLog {
    pub hour: Hour,
    pub activities: Vec<Activity>,
}

impl HourLog {
    pub fn total_minutes(&self) -> u32 {
        self.activities.iter().map(|a| a.duration).sum()
    }

    pub fn is_over_limit(&self) -> bool {
        self.total_minutes() > HOUR_LIMIT_MINUTES
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }
}

/// Buckets activities into exactly 24 hour logs.
pub fn build_hour_logs(activities: &[Activity]) -> Vec<HourLog> {
    Hour::all()
        .map(|hour| HourLog {
            hour,
            activities: activities
                .iter()
                .filter(|a| a.hour == hour)
                .cloned()
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(id: &str, hour: u8, duration: u32) -> Activity {
        Activity {
            id: id.into(),
            name: format!("activity {id}"),
            duration,
            color_theme: ColorTheme::Teal,
            hour: Hour::new_opt(hour).unwrap(),
        }
    }

    #[test]
    fn hour_bounds() {
        assert!(Hour::new_opt(0).is_some());
        assert!(Hour::new_opt(23).is_some());
        assert!(Hour::new_opt(24).is_none());
        assert_eq!(Hour::all().count(), 24);
        assert_eq!("9:00".parse::<Hour>().unwrap(), Hour::new_opt(9).unwrap());
        assert!("24".parse::<Hour>().is_err());
    }

    #[test]
    fn hour_rejects_out_of_range_json() {
        assert!(serde_json::from_str::<Hour>("7").is_ok());
        assert!(serde_json::from_str::<Hour>("30").is_err());
    }

    #[test]
    fn temporary_ids_are_distinct() {
        let a = ActivityId::temporary();
        let b = ActivityId::temporary();
        assert_ne!(a, b);
        assert!(a.is_temporary());
        assert!(!ActivityId::from("3f1c").is_temporary());
    }

    #[test]
    fn activity_data_is_validated() {
        assert!(ActivityData::new("", 10, None).is_err());
        assert!(ActivityData::new("   ", 10, None).is_err());
        assert!(ActivityData::new("Read", 0, None).is_err());

        let data = ActivityData::new("  Read ", 15, Some(ColorTheme::Pink)).unwrap();
        assert_eq!(data.name(), "Read");
        assert_eq!(data.color_theme(), ColorTheme::Pink);
    }

    #[test]
    fn missing_color_comes_from_palette() {
        let data = ActivityData::new("Read", 15, None).unwrap();
        assert!(ColorTheme::ALL.contains(&data.color_theme()));
    }

    #[test]
    fn update_merges_only_present_fields() {
        let mut a = activity("a", 9, 30);
        a.apply(&ActivityUpdate::default().with_duration(45));
        assert_eq!(a.duration, 45);
        assert_eq!(a.name, "activity a");
        assert_eq!(a.hour.value(), 9);

        a.apply(&ActivityUpdate::default().with_color_theme(ColorTheme::Teal));
        assert_eq!(a.color_theme, ColorTheme::Teal);
        assert_eq!(a.duration, 45);

        assert!(ActivityUpdate::default().with_name(" ").validate().is_err());
        assert!(ActivityUpdate::default().with_duration(0).validate().is_err());
        assert!(ActivityUpdate::default().is_empty());
    }

    #[test]
    fn color_theme_parsing() {
        assert_eq!("Blue".parse::<ColorTheme>().unwrap(), ColorTheme::Blue);
        assert!("magenta".parse::<ColorTheme>().is_err());
        assert_eq!(
            serde_json::to_string(&ColorTheme::Indigo).unwrap(),
            "\"indigo\""
        );
    }

    #[test]
    fn logs_always_have_24_buckets() {
        assert_eq!(build_hour_logs(&[]).len(), 24);

        let activities = vec![
            activity("late", 23, 10),
            activity("a", 9, 40),
            activity("b", 9, 30),
            activity("early", 0, 5),
        ];
        let logs = build_hour_logs(&activities);
        assert_eq!(logs.len(), 24);
        for (index, log) in logs.iter().enumerate() {
            assert_eq!(log.hour.value() as usize, index);
            assert!(log.activities.iter().all(|a| a.hour == log.hour));
        }

        let nine = &logs[9];
        assert_eq!(
            nine.activities.iter().map(|a| a.id.as_str()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
        assert_eq!(nine.total_minutes(), 70);
        assert!(nine.is_over_limit());
        assert!(!logs[0].is_over_limit());
        assert!(logs[1].is_empty());
    }

    #[test]
    fn activity_serializes_camel_case() {
        let json = serde_json::to_value(activity("a", 9, 30)).unwrap();
        assert_eq!(json["colorTheme"], "teal");
        assert_eq!(json["hour"], 9);
    }
}
