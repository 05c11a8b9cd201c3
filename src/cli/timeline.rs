use std::io::IsTerminal;

use ansi_term::{Colour, Style};
use anyhow::Result;
use chrono::{Datelike, NaiveDate};

use crate::day_log::{
    entities::{Activity, HourLog, HOUR_LIMIT_MINUTES},
    store::DaySnapshot,
};

use super::{open_day, CliStore, DayArgs};

#[derive(Debug, clap::Args)]
pub struct ShowCommand {
    #[command(flatten)]
    day: DayArgs,
    #[arg(long, help = "Print the day as json instead of a timeline")]
    json: bool,
    #[arg(long, short, help = "Also show hours without activities")]
    all: bool,
}

/// Command to process `show` command. Prints every hour of a day with its activities and the
/// totals of the day.
pub async fn process_show_command(store: &CliStore, command: ShowCommand) -> Result<()> {
    open_day(store, &command.day).await?;
    let snapshot = store.snapshot();

    if command.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let today = store.today();
    let painter = Painter::new(std::io::stdout().is_terminal());
    print!("{}", render_day(&snapshot, today, command.all, &painter));
    Ok(())
}

/// Applies colors only when printing to a terminal.
pub struct Painter {
    enabled: bool,
}

impl Painter {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    fn paint(&self, style: Style, text: &str) -> String {
        if self.enabled {
            style.paint(text).to_string()
        } else {
            text.to_string()
        }
    }
}

pub fn render_day(snapshot: &DaySnapshot, today: NaiveDate, all: bool, painter: &Painter) -> String {
    let mut out = String::new();
    out.push_str(&painter.paint(Style::new().bold(), &date_label(snapshot.date, today)));
    if snapshot.date != today && Some(snapshot.date) != today.pred_opt() {
        out.push_str(&format!("  {}", snapshot.date.format("%b %-d, %Y")));
    }
    out.push('\n');
    out.push_str(&format!(
        "{} logged, {}\n\n",
        format_minutes(snapshot.total_duration as i64),
        remaining_label(snapshot.remaining_minutes)
    ));

    for log in &snapshot.logs {
        if log.is_empty() && !all {
            continue;
        }
        out.push_str(&render_hour(log, painter));
        out.push('\n');
    }
    out
}

pub fn render_hour(log: &HourLog, painter: &Painter) -> String {
    let mut line = format!("{:>5}", hour_label(log.hour.value()));
    if log.is_empty() {
        line.push_str("  -");
        return line;
    }
    for activity in &log.activities {
        line.push_str("  ");
        line.push_str(&render_activity(activity, painter));
    }
    let total = format!("{} / {HOUR_LIMIT_MINUTES} min", log.total_minutes());
    if log.is_over_limit() {
        line.push_str(&format!("  {}", painter.paint(Colour::Red.bold(), &format!("! {total}"))));
    } else {
        line.push_str(&format!("  ({total})"));
    }
    line
}

fn render_activity(activity: &Activity, painter: &Painter) -> String {
    let (r, g, b) = activity.color_theme.rgb();
    format!(
        "{} {}m [{}]",
        painter.paint(Colour::RGB(r, g, b).bold(), &activity.name),
        activity.duration,
        activity.id
    )
}

/// 12 hour clock label, e.g. `12 AM`, `9 AM`, `3 PM`.
pub fn hour_label(hour: u8) -> String {
    let suffix = if hour < 12 { "AM" } else { "PM" };
    let hour = match hour % 12 {
        0 => 12,
        v => v,
    };
    format!("{hour} {suffix}")
}

pub fn date_label(date: NaiveDate, today: NaiveDate) -> String {
    if date == today {
        "Today".to_string()
    } else if Some(date) == today.pred_opt() {
        "Yesterday".to_string()
    } else {
        format!("{}{}", date.format("%A, %B %-d"), ordinal_suffix(date.day()))
    }
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

pub fn format_minutes(minutes: i64) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}

fn remaining_label(remaining: i64) -> String {
    if remaining >= 0 {
        format!("{} remaining", format_minutes(remaining))
    } else {
        format!("{} over", format_minutes(-remaining))
    }
}
