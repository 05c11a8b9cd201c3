use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::day_log::export::default_export_file_name;

use super::{open_day, CliStore, DayArgs};

#[derive(Debug, clap::Args)]
pub struct ExportCommand {
    #[command(flatten)]
    day: DayArgs,
    #[arg(
        long,
        short,
        help = "File to write. By default daily_log_<today>.csv in the current directory"
    )]
    output: Option<PathBuf>,
}

pub async fn process_export_command(store: &CliStore, command: ExportCommand) -> Result<()> {
    open_day(store, &command.day).await?;

    let csv = store.export_csv(command.day.date_style());
    let output = command
        .output
        .unwrap_or_else(|| PathBuf::from(default_export_file_name(store.today())));
    tokio::fs::write(&output, csv)
        .await
        .with_context(|| format!("Failed to write {output:?}"))?;
    println!("Exported {} to {}", store.current_date(), output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use crate::{
        cli::test_utils::{file_store, today_args, TODAY},
        day_log::entities::{ActivityData, ColorTheme, Hour},
        utils::time::DateStyle,
    };

    use super::*;

    #[tokio::test]
    async fn test_export_writes_csv_file() -> Result<()> {
        let dir = tempdir()?;
        let store = file_store(dir.path())?;
        store.set_date(TODAY).await;
        store
            .add_activity(
                Hour::new_opt(9).unwrap(),
                ActivityData::new("Write report", 90, Some(ColorTheme::Blue))?,
            )
            .await;

        let output = dir.path().join("day.csv");
        process_export_command(
            &store,
            ExportCommand {
                day: today_args(DateStyle::Us),
                output: Some(output.clone()),
            },
        )
        .await?;

        assert_eq!(
            tokio::fs::read_to_string(&output).await?,
            "Date,Hour,Activity,Duration (min),Color\n10/14/2026,9:00,Write report,90,blue"
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_export_of_missing_directory_fails() -> Result<()> {
        let dir = tempdir()?;
        let store = file_store(dir.path())?;

        let result = process_export_command(
            &store,
            ExportCommand {
                day: today_args(DateStyle::Uk),
                output: Some(dir.path().join("missing").join("day.csv")),
            },
        )
        .await;
        assert!(result.is_err());
        Ok(())
    }
}
