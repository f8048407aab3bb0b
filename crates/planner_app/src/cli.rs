use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};

use crate::app::{build_scheduler, execute, AppConfig, Command, PlanRequest};

#[derive(Debug, Parser)]
#[command(name = "day_planner", about = "Pack pending tasks into the free time of a day")]
pub struct Cli {
    /// Schedule snapshot file; overrides PLANNER_STORE_PATH.
    #[arg(long, global = true)]
    store: Option<PathBuf>,
    /// Pin "now" to an RFC 3339 instant instead of the system clock.
    #[arg(long, global = true)]
    now: Option<DateTime<Utc>>,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Replace the whole day's plan
    Plan(PlanArgs),
    /// Re-plan from now, keeping placements that already started
    Replan(PlanArgs),
    /// Remove today's placements
    Clear(UserArgs),
    /// Remove every placement for a user
    Purge(UserArgs),
    /// Show the task that follows a completed one
    Next(NextArgs),
    /// List a user's placements in start order
    List(UserArgs),
}

#[derive(Debug, Args, Clone)]
struct UserArgs {
    #[arg(long)]
    user: String,
}

#[derive(Debug, Args, Clone)]
struct PlanArgs {
    #[arg(long)]
    user: String,
    /// JSON file with `tasks` and `busy` arrays
    #[arg(long)]
    input: PathBuf,
}

#[derive(Debug, Args, Clone)]
struct NextArgs {
    #[arg(long)]
    user: String,
    #[arg(long)]
    completed: String,
}

impl Cli {
    pub fn run(self) -> Result<String> {
        let config = AppConfig::from_env()
            .with_store_path(self.store)
            .with_now(self.now);
        let command = self.command.into_command()?;
        let scheduler = build_scheduler(&config)?;
        let output = execute(&scheduler, command)?;
        Ok(serde_json::to_string_pretty(&output)?)
    }
}

impl CliCommand {
    fn into_command(self) -> Result<Command> {
        Ok(match self {
            CliCommand::Plan(args) => Command::Plan {
                request: PlanRequest::load(&args.input)?,
                user: args.user,
            },
            CliCommand::Replan(args) => Command::Replan {
                request: PlanRequest::load(&args.input)?,
                user: args.user,
            },
            CliCommand::Clear(args) => Command::Clear { user: args.user },
            CliCommand::Purge(args) => Command::Purge { user: args.user },
            CliCommand::Next(args) => Command::Next {
                user: args.user,
                completed: args.completed,
            },
            CliCommand::List(args) => Command::List { user: args.user },
        })
    }
}
