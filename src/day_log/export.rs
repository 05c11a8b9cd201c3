use chrono::NaiveDate;

use crate::utils::time::{date_to_record_key, DateStyle};

use super::entities::HourLog;

pub const CSV_HEADER: [&str; 5] = ["Date", "Hour", "Activity", "Duration (min)", "Color"];

/// One row per activity in hour order. Values are written as they are, without quoting, and the
/// date column holds `exported_on` for every row.
pub fn to_csv(logs: &[HourLog], exported_on: NaiveDate, style: DateStyle) -> String {
    let date = style.short_date(exported_on);
    let rows = logs.iter().flat_map(|log| {
        log.activities.iter().map(|activity| {
            [
                date.clone(),
                log.hour.to_string(),
                activity.name.clone(),
                activity.duration.to_string(),
                activity.color_theme.to_string(),
            ]
            .join(",")
        })
    });

    let mut csv = CSV_HEADER.join(",");
    csv.push('\n');
    csv.push_str(&rows.collect::<Vec<_>>().join("\n"));
    csv
}

pub fn default_export_file_name(today: NaiveDate) -> String {
    format!("daily_log_{}.csv", date_to_record_key(today))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::{
        day_log::entities::{build_hour_logs, Activity, ColorTheme, Hour},
        utils::time::DateStyle,
    };

    use super::{default_export_file_name, to_csv};

    fn activity(id: &str, hour: u8, name: &str, duration: u32, color_theme: ColorTheme) -> Activity {
        Activity {
            id: id.into(),
            name: name.into(),
            duration,
            color_theme,
            hour: Hour::new_opt(hour).unwrap(),
        }
    }

    #[test]
    fn empty_day_has_only_header() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 14).unwrap();
        assert_eq!(
            to_csv(&build_hour_logs(&[]), date, DateStyle::Us),
            "Date,Hour,Activity,Duration (min),Color\n"
        );
    }

    #[test]
    fn rows_are_in_hour_order() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 14).unwrap();
        let logs = build_hour_logs(&[
            activity("b", 14, "Lunch", 45, ColorTheme::Orange),
            activity("a", 9, "Write report", 90, ColorTheme::Blue),
            activity("c", 9, "Standup", 15, ColorTheme::Green),
        ]);
        assert_eq!(
            to_csv(&logs, date, DateStyle::Uk),
            "Date,Hour,Activity,Duration (min),Color\n\
             14/10/2026,9:00,Write report,90,blue\n\
             14/10/2026,9:00,Standup,15,green\n\
             14/10/2026,14:00,Lunch,45,orange"
        );
    }

    #[test]
    fn file_name_uses_iso_date() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
        assert_eq!(default_export_file_name(date), "daily_log_2026-01-02.csv");
    }
}
