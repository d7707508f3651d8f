//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::date::{Period, WorldDate};

/// TaskJournal - task tracker driven by game events
#[derive(Parser)]
#[command(
    name = "tj",
    about = "Task journal: per-player task lists that track progress from game events",
    version = env!("GIT_DESCRIBE"),
    after_help = "Logs are written to: <data-dir>/logs/tj.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, help = "Log level (trace, debug, info, warn, error)")]
    pub log_level: Option<String>,

    /// Save to operate on; overrides the configured save
    #[arg(short, long, global = true)]
    pub save: Option<String>,

    /// Local player id; overrides the configured player
    #[arg(short, long, global = true)]
    pub player: Option<i64>,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// List the registered task kinds and their parameters
    Kinds,

    /// Show the local player's tasks
    List {
        /// Show every player's list
        #[arg(short, long)]
        all: bool,
    },

    /// Create a task through its kind's factory
    Add {
        /// Task kind (see `tj kinds`)
        kind: String,

        /// Display name
        name: String,

        /// Factory parameter as key=value; repeatable
        #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_assignment)]
        params: Vec<(String, String)>,

        /// Renewal period (never, weekly, monthly, annually)
        #[arg(long, requires = "renew_on")]
        renew: Option<Period>,

        /// Reference date for renewal, e.g. "spring 3, year 1"
        #[arg(long, requires = "renew")]
        renew_on: Option<WorldDate>,
    },

    /// Rebuild a task from its current values plus changes
    Edit {
        index: usize,

        /// Factory parameter as key=value; repeatable
        #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_assignment)]
        params: Vec<(String, String)>,

        /// New display name
        #[arg(long)]
        name: Option<String>,
    },

    /// Remove a task
    Remove { index: usize },

    /// Toggle a task's completion
    Complete { index: usize },

    /// Group tasks by state
    Sort,

    /// Print a task's stored record
    Show { index: usize },

    /// Raise a game event
    Event {
        /// Player causing the event; defaults to the local player
        #[arg(short, long, global = true)]
        actor: Option<i64>,

        #[command(subcommand)]
        event: EventCommand,
    },

    /// Run the end-of-day sweep for the given date
    EndDay {
        /// Today's date, e.g. "summer 12, year 2"
        date: WorldDate,
    },
}

/// Game events the host would raise
#[derive(Subcommand)]
pub enum EventCommand {
    /// Items were picked up
    Collected {
        item: String,
        #[arg(short = 'n', long, default_value = "1")]
        count: u32,
        /// Qualified id of the ingredient for preserves
        #[arg(long)]
        ingredient: Option<String>,
    },

    /// Items were crafted
    Crafted {
        item: String,
        #[arg(short = 'n', long, default_value = "1")]
        count: u32,
    },

    /// An item was given to an NPC
    Gifted { npc: String, item: String },

    /// Something was bought from a shop; `(T)<tool>` names a tool
    Purchased {
        item: String,
        #[arg(short = 'n', long, default_value = "1")]
        amount: u32,
    },

    /// Something was sold to a shop
    Sold {
        item: String,
        #[arg(short = 'n', long, default_value = "1")]
        amount: u32,
    },

    /// A building finished construction
    Built {
        building: String,
        /// Building this one was upgraded into
        #[arg(long)]
        upgrade: Option<String>,
        #[arg(long)]
        cabin: bool,
        #[arg(long, default_value = "Farm")]
        location: String,
    },

    /// A farm animal was bought
    AnimalBought { animal_type: String },

    /// A farm animal was sold
    AnimalSold { animal_type: String },

    /// Items were added to the inventory
    Received {
        #[arg(required = true)]
        items: Vec<String>,
        /// Tool still at the blacksmith
        #[arg(long)]
        upgrading: Option<String>,
    },
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::Season;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("item=(O)472,(O)474").unwrap(),
            ("item".to_string(), "(O)472,(O)474".to_string())
        );
        assert_eq!(parse_assignment("npc=").unwrap(), ("npc".to_string(), String::new()));
        assert!(parse_assignment("count").is_err());
        assert!(parse_assignment("=3").is_err());
    }

    #[test]
    fn test_add_with_renewal() {
        let cli = Cli::parse_from([
            "tj",
            "-p",
            "7",
            "add",
            "basic",
            "water crops",
            "--renew",
            "weekly",
            "--renew-on",
            "spring 3, year 1",
        ]);
        assert_eq!(cli.player, Some(7));
        match cli.command {
            Command::Add {
                kind,
                name,
                renew,
                renew_on,
                ..
            } => {
                assert_eq!(kind, "basic");
                assert_eq!(name, "water crops");
                assert_eq!(renew, Some(Period::Weekly));
                assert_eq!(renew_on, Some(WorldDate::new(1, Season::Spring, 3)));
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn test_renew_requires_date() {
        assert!(Cli::try_parse_from(["tj", "add", "basic", "x", "--renew", "weekly"]).is_err());
    }

    #[test]
    fn test_event_actor() {
        let cli = Cli::parse_from(["tj", "event", "--actor", "3", "collected", "(O)388", "-n", "5"]);
        match cli.command {
            Command::Event {
                actor,
                event: EventCommand::Collected { item, count, .. },
            } => {
                assert_eq!(actor, Some(3));
                assert_eq!(item, "(O)388");
                assert_eq!(count, 5);
            }
            _ => panic!("expected collected event"),
        }
    }
}
