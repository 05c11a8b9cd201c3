pub mod edit;
pub mod export;
pub mod timeline;

use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Result};
use chrono::{Local, NaiveDate};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Parser, Subcommand};
use edit::{process_add_command, process_delete_command, process_edit_command, AddCommand, EditCommand};
use export::{process_export_command, ExportCommand};
use timeline::{process_show_command, ShowCommand};
use tracing::{info, level_filters::LevelFilter};

use crate::{
    day_log::store::{DayLogStore, FetchOutcome},
    remote::{file_store::FileActivityStore, rest_store::RestActivityStore, RemoteActivityStore},
    utils::{
        clock::DefaultClock,
        dir::{create_application_default_path, ensure_dir},
        logging::enable_logging,
        time::DateStyle,
    },
};

#[derive(Parser, Debug)]
#[command(name = "Daylog", version, long_about = None)]
#[command(about = "Log what you did in every hour of the day", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, global = true, help = "Print logs to the console")]
    log: bool,
    #[arg(long = "log-filter", global = true, help = "Log level, e.g. debug or trace")]
    log_filter: Option<LevelFilter>,
    #[command(flatten)]
    backend: BackendArgs,
}

/// Where activities are stored.
#[derive(clap::Args, Debug)]
struct BackendArgs {
    #[arg(
        long,
        global = true,
        env = "DAYLOG_DIR",
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
    #[arg(
        long = "rest-url",
        global = true,
        env = "DAYLOG_REST_URL",
        help = "Base url of a PostgREST backend. Local files are used when missing"
    )]
    rest_url: Option<String>,
    #[arg(
        long = "rest-key",
        global = true,
        env = "DAYLOG_REST_KEY",
        hide_env_values = true,
        help = "Api key sent to the PostgREST backend"
    )]
    rest_key: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Display the hours of a day with their activities")]
    Show {
        #[command(flatten)]
        command: ShowCommand,
    },
    #[command(about = "Log an activity in an hour")]
    Add {
        #[command(flatten)]
        command: AddCommand,
    },
    #[command(about = "Change name, duration or color of an activity")]
    Edit {
        #[command(flatten)]
        command: EditCommand,
    },
    #[command(about = "Remove an activity")]
    Delete {
        #[arg(help = "Id of the activity, as printed by `show`")]
        id: String,
        #[command(flatten)]
        day: DayArgs,
    },
    #[command(about = "Write the activities of a day into a csv file")]
    Export {
        #[command(flatten)]
        command: ExportCommand,
    },
}

/// Selects the day a command works with.
#[derive(clap::Args, Debug, Clone)]
pub struct DayArgs {
    #[arg(
        long,
        short,
        help = "Day to use, today by default. Examples are \"yesterday\", \"3 days ago\", \"15/03/2025\""
    )]
    date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
}

impl DayArgs {
    pub fn date_style(&self) -> DateStyle {
        self.date_style
    }

    fn resolve(&self) -> Result<Option<NaiveDate>> {
        let Some(date) = &self.date else {
            return Ok(None);
        };
        match parse_date_string(date, Local::now(), self.date_style.into()) {
            Ok(v) => Ok(Some(v.with_timezone(&Local).date_naive())),
            Err(e) => Err(Args::command()
                .error(
                    clap::error::ErrorKind::ValueValidation,
                    format!("Failed to validate date {date}: {e}"),
                )
                .into()),
        }
    }
}

pub type CliStore = DayLogStore<Arc<dyn RemoteActivityStore>>;

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = args
        .backend
        .dir
        .clone()
        .map_or_else(create_application_default_path, ensure_dir)?;
    let logging_level = args.log_filter.or(args.log.then_some(LevelFilter::TRACE));
    enable_logging(&app_dir, logging_level, args.log)?;

    let store = DayLogStore::new(open_remote(&args.backend, app_dir)?, Box::new(DefaultClock));

    match args.commands {
        Commands::Show { command } => process_show_command(&store, command).await,
        Commands::Add { command } => process_add_command(&store, command).await,
        Commands::Edit { command } => process_edit_command(&store, command).await,
        Commands::Delete { id, day } => process_delete_command(&store, id, day).await,
        Commands::Export { command } => process_export_command(&store, command).await,
    }
}

fn open_remote(backend: &BackendArgs, app_dir: PathBuf) -> Result<Arc<dyn RemoteActivityStore>> {
    match &backend.rest_url {
        Some(url) => {
            info!("Using activities at {url}");
            Ok(Arc::new(RestActivityStore::new(url, backend.rest_key.clone())?))
        }
        None => {
            let storage = FileActivityStore::new(app_dir.join("records"))?;
            info!("Using activities in {:?}", storage.path());
            Ok(Arc::new(storage))
        }
    }
}

/// Loads the requested day. A day that can't be loaded is an error here, unlike in the store, since
/// commands would otherwise print or edit an empty day.
async fn open_day(store: &CliStore, day: &DayArgs) -> Result<()> {
    let outcome = match day.resolve()? {
        Some(date) => store.set_date(date).await,
        None => store.fetch_activities().await,
    };
    match outcome {
        FetchOutcome::Applied | FetchOutcome::Stale => Ok(()),
        FetchOutcome::Failed => bail!(
            "Couldn't load activities for {}, see logs for details",
            store.current_date()
        ),
    }
}
