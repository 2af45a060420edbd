// Argument definitions for the `dugout` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dugout_baseball::PriorityMode;

#[derive(Parser, Debug)]
#[command(name = "dugout")]
#[command(about = "Lineup, staff and roster moves for a baseball organisation", long_about = None)]
pub struct Cli {
    /// Database file (defaults to database.path in strategy.toml)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Import a player pool from CSV, creating the team if needed
    Import {
        #[arg(long)]
        team: String,

        /// Player CSV (defaults to data_paths.players)
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Print rosters and the current order
    Show {
        #[arg(long)]
        team: String,
    },

    /// Compute an assignment, seeded from the saved best order
    Auto {
        #[arg(long)]
        team: String,

        /// ability, condition or balanced (defaults to strategy.toml)
        #[arg(long, value_parser = parse_mode)]
        mode: Option<PriorityMode>,

        /// Save the assignment as the team's roster
        #[arg(long, default_value = "false")]
        apply: bool,
    },

    /// Store the current order as the best-order template
    SaveOrder {
        #[arg(long)]
        team: String,
    },

    /// Simulate days passing on the team's own calendar (cooldowns and
    /// injuries count down)
    Advance {
        #[arg(long)]
        team: String,

        #[arg(long, default_value_t = 1)]
        days: u32,
    },

    /// Release a player to free agency
    Release {
        #[arg(long)]
        team: String,

        /// Player name
        #[arg(long)]
        player: String,
    },

    /// Per-player and team rate stats
    Stats {
        #[arg(long)]
        team: String,
    },

    /// Start a new season: resets the team's calendar, and the next save
    /// waives demotion cooldowns
    NewSeason {
        #[arg(long)]
        team: String,
    },
}

fn parse_mode(s: &str) -> Result<PriorityMode, String> {
    PriorityMode::from_str_mode(s)
        .ok_or_else(|| format!("unknown priority mode '{s}' (expected ability, condition or balanced)"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_auto_with_mode() {
        let cli = Cli::try_parse_from(["dugout", "auto", "--team", "Mariners", "--mode", "condition", "--apply"])
            .unwrap();
        assert_eq!(
            cli.command,
            Command::Auto {
                team: "Mariners".into(),
                mode: Some(PriorityMode::Condition),
                apply: true,
            }
        );
    }

    #[test]
    fn rejects_unknown_mode() {
        let err = Cli::try_parse_from(["dugout", "auto", "--team", "Mariners", "--mode", "vibes"]);
        assert!(err.is_err());
    }

    #[test]
    fn kebab_case_subcommands_and_global_db() {
        let cli = Cli::try_parse_from(["dugout", "save-order", "--team", "Mariners", "--db", "x.db"])
            .unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("x.db")));
        assert_eq!(cli.command, Command::SaveOrder { team: "Mariners".into() });

        let cli = Cli::try_parse_from(["dugout", "advance", "--team", "Mariners"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Advance {
                team: "Mariners".into(),
                days: 1
            }
        );
    }
}
