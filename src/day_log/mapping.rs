//! Translation between day log entities and remote records. This is the only place that knows how
//! the two sides name and encode fields.

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use tracing::warn;

use crate::remote::{ActivityRecord, NewActivityRecord, RecordPatch};

use super::entities::{
    validate_duration, validate_name, Activity, ActivityData, ActivityId, ActivityUpdate, ColorTheme,
    Hour,
};

/// Unknown palette tags fall back to this one.
const FALLBACK_THEME: ColorTheme = ColorTheme::Blue;

fn parse_theme(tag: &str) -> ColorTheme {
    tag.parse().unwrap_or_else(|_| {
        warn!("Unknown color theme {tag:?}, using {FALLBACK_THEME}");
        FALLBACK_THEME
    })
}

/// Converts a fetched record. Fails for records that can't be placed in the day log.
pub fn to_activity(record: ActivityRecord) -> Result<Activity> {
    let hour = Hour::new_opt(record.hour)
        .ok_or_else(|| anyhow!("Record {} has invalid hour {}", record.id, record.hour))?;
    Ok(Activity {
        name: validate_name(&record.name)?,
        duration: validate_duration(record.duration)?,
        color_theme: parse_theme(&record.color_theme),
        hour,
        id: record.id,
    })
}

pub fn to_new_record(date: NaiveDate, hour: Hour, data: &ActivityData) -> NewActivityRecord {
    NewActivityRecord {
        date,
        hour: hour.value(),
        name: data.name().to_string(),
        duration: data.duration(),
        color_theme: data.color_theme().to_string(),
    }
}

pub fn to_patch(update: &ActivityUpdate) -> RecordPatch {
    RecordPatch {
        name: update.name.as_ref().map(|v| v.trim().to_string()),
        duration: update.duration,
        color_theme: update.color_theme.map(|v| v.to_string()),
    }
}

/// Optimistic copy of an activity before the store has seen it.
pub fn to_optimistic(hour: Hour, data: &ActivityData) -> Activity {
    Activity {
        id: ActivityId::temporary(),
        name: data.name().to_string(),
        duration: data.duration(),
        color_theme: data.color_theme(),
        hour,
    }
}

/// Takes the id and the normalized fields of a confirmed insert. Fields the store returned in an
/// unusable shape keep their local values. The hour never changes.
pub fn reconcile(local: &Activity, record: ActivityRecord) -> Activity {
    if record.hour != local.hour.value() {
        warn!(
            "Store placed {} at hour {} instead of {}, keeping local hour",
            record.id, record.hour, local.hour
        );
    }
    Activity {
        name: validate_name(&record.name).unwrap_or_else(|_| local.name.clone()),
        duration: validate_duration(record.duration).unwrap_or(local.duration),
        color_theme: record
            .color_theme
            .parse()
            .unwrap_or(local.color_theme),
        hour: local.hour,
        id: record.id,
    }
}

/// Fields changed locally after `sent` was handed to the store.
pub fn changes_since(sent: &ActivityData, local: &Activity) -> ActivityUpdate {
    ActivityUpdate {
        name: (local.name != sent.name()).then(|| local.name.clone()),
        duration: (local.duration != sent.duration()).then_some(local.duration),
        color_theme: (local.color_theme != sent.color_theme()).then_some(local.color_theme),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::{
        day_log::entities::{ActivityData, ActivityUpdate, ColorTheme, Hour},
        remote::ActivityRecord,
    };

    use super::*;

    fn record(hour: u8, name: &str, duration: u32, color_theme: &str) -> ActivityRecord {
        ActivityRecord {
            id: "row-1".into(),
            date: NaiveDate::from_ymd_opt(2026, 10, 14).unwrap(),
            hour,
            name: name.into(),
            duration,
            color_theme: color_theme.into(),
        }
    }

    #[test]
    fn record_maps_to_activity() {
        let activity = to_activity(record(9, "Write report", 90, "blue")).unwrap();
        assert_eq!(activity.id.as_str(), "row-1");
        assert_eq!(activity.hour.value(), 9);
        assert_eq!(activity.color_theme, ColorTheme::Blue);
    }

    #[test]
    fn invalid_records_are_rejected() {
        assert!(to_activity(record(24, "Late", 10, "red")).is_err());
        assert!(to_activity(record(3, "", 10, "red")).is_err());
        assert!(to_activity(record(3, "Nap", 0, "red")).is_err());
    }

    #[test]
    fn unknown_theme_falls_back() {
        let activity = to_activity(record(9, "Gym", 30, "magenta")).unwrap();
        assert_eq!(activity.color_theme, ColorTheme::Blue);
    }

    #[test]
    fn new_record_uses_snake_case_columns() {
        let data = ActivityData::new("Gym", 30, Some(ColorTheme::Teal)).unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 10, 14).unwrap();
        let json =
            serde_json::to_value(to_new_record(date, Hour::new_opt(7).unwrap(), &data)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "date": "2026-10-14",
                "hour": 7,
                "name": "Gym",
                "duration": 30,
                "color_theme": "teal",
            })
        );
    }

    #[test]
    fn patch_carries_only_present_fields() {
        let patch = to_patch(&ActivityUpdate::default().with_duration(45));
        assert_eq!(
            serde_json::to_value(patch).unwrap(),
            serde_json::json!({ "duration": 45 })
        );

        let patch = to_patch(
            &ActivityUpdate::default()
                .with_name("Read")
                .with_color_theme(ColorTheme::Teal),
        );
        assert_eq!(
            serde_json::to_value(patch).unwrap(),
            serde_json::json!({ "name": "Read", "color_theme": "teal" })
        );
    }

    #[test]
    fn reconcile_prefers_store_values() {
        let data = ActivityData::new("gym", 30, Some(ColorTheme::Teal)).unwrap();
        let local = to_optimistic(Hour::new_opt(7).unwrap(), &data);
        let confirmed = reconcile(&local, record(8, "Gym", 30, "nonsense"));
        assert_eq!(confirmed.id.as_str(), "row-1");
        assert_eq!(confirmed.name, "Gym");
        assert_eq!(confirmed.hour.value(), 7);
        assert_eq!(confirmed.color_theme, ColorTheme::Teal);
    }

    #[test]
    fn changes_since_detects_local_edits() {
        let data = ActivityData::new("Gym", 30, Some(ColorTheme::Teal)).unwrap();
        let mut local = to_optimistic(Hour::new_opt(7).unwrap(), &data);
        assert!(changes_since(&data, &local).is_empty());

        local.apply(&ActivityUpdate::default().with_duration(50));
        assert_eq!(
            changes_since(&data, &local),
            ActivityUpdate::default().with_duration(50)
        );
    }
}
