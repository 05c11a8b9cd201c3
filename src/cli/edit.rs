use anyhow::{bail, Result};

use crate::day_log::{
    entities::{ActivityData, ActivityId, ActivityUpdate, ColorTheme, Hour},
    store::MutationOutcome,
};

use super::{open_day, timeline::{render_hour, Painter}, CliStore, DayArgs};

#[derive(Debug, clap::Args)]
pub struct AddCommand {
    #[arg(long, help = "Hour of the day, 0 to 23")]
    hour: Hour,
    #[arg(long, short, help = "What was done")]
    name: String,
    #[arg(long = "duration", short = 'm', help = "Duration in minutes")]
    duration: u32,
    #[arg(long, short, help = "Color of the activity. Picked at random when missing")]
    color: Option<ColorTheme>,
    #[command(flatten)]
    day: DayArgs,
}

#[derive(Debug, clap::Args)]
pub struct EditCommand {
    #[arg(help = "Id of the activity, as printed by `show`")]
    id: String,
    #[arg(long, short)]
    name: Option<String>,
    #[arg(long = "duration", short = 'm', help = "Duration in minutes")]
    duration: Option<u32>,
    #[arg(long, short)]
    color: Option<ColorTheme>,
    #[command(flatten)]
    day: DayArgs,
}

pub async fn process_add_command(store: &CliStore, command: AddCommand) -> Result<()> {
    let data = ActivityData::new(command.name, command.duration, command.color)?;
    open_day(store, &command.day).await?;

    let outcome = store.add_activity(command.hour, data).await;
    report(outcome, "Activity wasn't saved")?;
    print_hour(store, command.hour);
    Ok(())
}

pub async fn process_edit_command(store: &CliStore, command: EditCommand) -> Result<()> {
    let update = ActivityUpdate {
        name: command.name,
        duration: command.duration,
        color_theme: command.color,
    };
    if update.is_empty() {
        bail!("Nothing to change, pass --name, --duration or --color");
    }
    update.validate()?;
    open_day(store, &command.day).await?;

    let id = ActivityId::from(command.id);
    let Some(activity) = store.find(&id) else {
        bail!("No activity {id} on {}", store.current_date());
    };

    let outcome = store.update_activity(&id, update).await?;
    report(outcome, "Activity wasn't changed")?;
    print_hour(store, activity.hour);
    Ok(())
}

pub async fn process_delete_command(store: &CliStore, id: String, day: DayArgs) -> Result<()> {
    open_day(store, &day).await?;

    let id = ActivityId::from(id);
    let Some(activity) = store.find(&id) else {
        bail!("No activity {id} on {}", store.current_date());
    };

    let outcome = store.delete_activity(&id).await;
    report(outcome, "Activity wasn't deleted")?;
    println!("Deleted {} ({}m) at {}", activity.name, activity.duration, activity.hour);
    Ok(())
}

fn report(outcome: MutationOutcome, failure: &str) -> Result<()> {
    match outcome {
        MutationOutcome::Confirmed | MutationOutcome::Deferred => Ok(()),
        MutationOutcome::RolledBack | MutationOutcome::Superseded => {
            bail!("{failure}, the activity store rejected it. See logs for details")
        }
    }
}

fn print_hour(store: &CliStore, hour: Hour) {
    let logs = store.logs();
    if let Some(log) = logs.get(hour.value() as usize) {
        println!("{}", render_hour(log, &Painter::new(false)));
    }
}
