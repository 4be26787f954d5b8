pub mod analysis;
pub mod tasks;
pub mod watch;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;

use crate::{
    storage::store::TaskStore,
    utils::{clock::DefaultClock, dir::create_application_default_path, logging::enable_logging},
};

use self::{
    analysis::{process_analysis_command, process_days_command},
    tasks::{
        process_add_command, process_delete_command, process_edit_command, process_list_command,
        process_stop_command, process_tags_command, process_toggle_command, EditCommand,
    },
    watch::process_watch_command,
};

#[derive(Parser, Debug)]
#[command(name = "Focusflow", version, long_about = None)]
#[command(about = "Command line time tracker for tasks, tags and daily analysis", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Enable logging")]
    log: bool,
    #[arg(
        long,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Create a task and immediately start timing it")]
    Add {
        title: String,
        #[arg(
            short,
            long,
            value_delimiter = ',',
            help = "Tags attached to the task, e.g. meeting,urgent"
        )]
        tags: Vec<String>,
    },
    #[command(about = "Start the task, or pause it when it is already running")]
    Toggle {
        #[arg(help = "Task id or an unambiguous prefix of one")]
        task: String,
    },
    #[command(about = "Stop the task. Stopping a stopped task changes nothing")]
    Stop {
        #[arg(help = "Task id or an unambiguous prefix of one")]
        task: String,
    },
    #[command(about = "Edit title, tags or manually logged time of a stopped task")]
    Edit {
        #[command(flatten)]
        command: EditCommand,
    },
    #[command(about = "Delete the task together with its recorded time")]
    Delete {
        #[arg(help = "Task id or an unambiguous prefix of one")]
        task: String,
    },
    #[command(about = "Show all tasks with their tracked time")]
    List {},
    #[command(about = "Show tracked time for a period, split by tag and task")]
    Analysis {
        #[arg(
            long,
            default_value = "today",
            help = "\"today\", \"all\" or a date. Examples are \"yesterday\", \"15/03/2025\""
        )]
        day: String,
    },
    #[command(about = "List the days that have recorded time")]
    Days {},
    #[command(about = "Suggest known tags matching a prefix")]
    Tags {
        partial: String,
        #[arg(
            long,
            default_value = "",
            help = "Tags already entered. Matching ones are not suggested again"
        )]
        entered: String,
    },
    #[command(about = "Live view of the running task, refreshed every second")]
    Watch {},
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let dir = match args.dir {
        Some(dir) => dir,
        None => create_application_default_path()?,
    };

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(&dir, logging_level, args.log)?;

    let store = TaskStore::new(dir.join("store"))?;
    let clock = DefaultClock;

    match args.commands {
        Commands::Add { title, tags } => process_add_command(&store, &clock, &title, tags).await,
        Commands::Toggle { task } => process_toggle_command(&store, &clock, &task).await,
        Commands::Stop { task } => process_stop_command(&store, &clock, &task).await,
        Commands::Edit { command } => process_edit_command(&store, &clock, command).await,
        Commands::Delete { task } => process_delete_command(&store, &task).await,
        Commands::List {} => process_list_command(&store, &clock).await,
        Commands::Analysis { day } => process_analysis_command(&store, &clock, &day).await,
        Commands::Days {} => process_days_command(&store).await,
        Commands::Tags { partial, entered } => {
            process_tags_command(&store, &partial, &entered).await
        }
        Commands::Watch {} => process_watch_command(&store, &clock).await,
    }
}
