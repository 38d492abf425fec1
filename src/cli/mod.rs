pub mod board;
pub mod output;
pub mod tasks;

use std::path::PathBuf;

use anyhow::Result;
use board::BoardCommand;
use clap::{Parser, Subcommand};
use tasks::TasksCommand;
use tracing::level_filters::LevelFilter;

use crate::utils::{
    dir::create_application_default_path,
    logging::{CLI_PREFIX, enable_logging},
};

#[derive(Parser, Debug)]
#[command(name = "Timeslate", version, long_about = None)]
#[command(about = "Weekly timetable and task planner for your terminal", long_about = None)]
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
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Inspect and edit the weekly board")]
    Board {
        #[command(subcommand)]
        command: BoardCommand,
    },
    #[command(about = "Manage to-do tasks and routines")]
    Tasks {
        #[command(subcommand)]
        command: TasksCommand,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = args
        .dir
        .map_or_else(create_application_default_path, Ok)?;

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(CLI_PREFIX, &app_dir, logging_level, args.log)?;

    match args.commands {
        Commands::Board { command } => board::process_board_command(command, &app_dir).await,
        Commands::Tasks { command } => tasks::process_tasks_command(command, &app_dir).await,
    }
}
