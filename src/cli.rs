//! Command line interface.
//!
//! Subcommands map onto the crate's features: [`Command::Simulate`] runs the
//! fleet dispatch loop, [`Command::Track`] accumulates trip mileage,
//! [`Command::Triage`] scores an offer, [`Command::Plan`] orders and stacks
//! jobs, [`Command::Shift`] summarises a shift and [`Command::Verify`] checks a
//! proof-of-delivery photo.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

/// Delivery fleet dispatch simulator and driver earnings toolkit.
#[derive(Debug, Parser)]
#[command(name = "fleetline", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (defaults to ./fleetline.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Intelligence model for this run.
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Retries for failed intelligence requests.
    #[arg(long, global = true)]
    pub max_retries: Option<u32>,

    /// More log output (-v info, -vv debug, -vvv trace).
    #[arg(long, short, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Dispatch a fleet and run it until every assigned order is delivered.
    Simulate {
        /// JSON scenario with `drivers` and `orders`; generated when omitted.
        #[arg(long)]
        scenario: Option<PathBuf>,

        /// Use the intelligence service for the scenario and the dispatch plan.
        #[arg(long)]
        ai: bool,

        /// Stop after this many simulation ticks, delivered or not.
        #[arg(long, default_value_t = 2_000)]
        max_ticks: u64,

        /// Approve pending drivers and resolve disputes while the fleet runs.
        #[arg(long)]
        admin: bool,
    },

    /// Accumulate trip miles from `lat,lon` lines.
    Track {
        /// File of fixes; reads stdin when omitted.
        file: Option<PathBuf>,
    },

    /// Score a delivery offer.
    Triage {
        #[arg(long)]
        pay: Option<f64>,

        /// Trip length in miles.
        #[arg(long)]
        distance: Option<f64>,

        /// Estimated time in minutes.
        #[arg(long)]
        minutes: Option<f64>,

        /// Screenshot of the offer; fields read from it fill in missing flags.
        #[arg(long)]
        screenshot: Option<PathBuf>,

        /// Ask the intelligence service for a recommendation.
        #[arg(long)]
        ai: bool,
    },

    /// Order active jobs into a route and suggest a stack.
    Plan {
        /// JSON array of jobs.
        jobs: PathBuf,

        #[arg(long)]
        ai: bool,
    },

    /// Shift statistics, forecast and insights for a job history.
    Shift {
        /// JSON array of jobs.
        jobs: PathBuf,

        /// Hours on shift.
        #[arg(long, default_value_t = 0.0)]
        hours: f64,

        /// Miles driven, e.g. from `fleetline track`.
        #[arg(long, default_value_t = 0.0)]
        miles: f64,

        #[arg(long)]
        ai: bool,
    },

    /// Check a proof-of-delivery photo.
    Verify {
        photo: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_simulate_defaults() {
        let cli = Cli::parse_from(["fleetline", "simulate"]);
        match cli.command {
            Command::Simulate {
                scenario,
                ai,
                max_ticks,
                admin,
            } => {
                assert!(!admin);
                assert!(scenario.is_none());
                assert!(!ai);
                assert_eq!(max_ticks, 2_000);
            }
            _ => panic!("expected Simulate command"),
        }
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn cli_parses_global_flags() {
        let cli = Cli::parse_from([
            "fleetline",
            "track",
            "--model",
            "gemini-2.5-pro",
            "--max-retries",
            "5",
            "-vv",
            "--config",
            "other.toml",
        ]);
        assert_eq!(cli.model.as_deref(), Some("gemini-2.5-pro"));
        assert_eq!(cli.max_retries, Some(5));
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("other.toml")));
        assert!(matches!(cli.command, Command::Track { file: None }));
    }

    #[test]
    fn cli_parses_triage() {
        let cli = Cli::parse_from([
            "fleetline", "triage", "--pay", "12.5", "--distance", "4", "--minutes", "25",
        ]);
        match cli.command {
            Command::Triage {
                pay,
                distance,
                minutes,
                screenshot,
                ai,
            } => {
                assert_eq!(pay, Some(12.5));
                assert_eq!(distance, Some(4.0));
                assert_eq!(minutes, Some(25.0));
                assert!(screenshot.is_none());
                assert!(!ai);
            }
            _ => panic!("expected Triage command"),
        }
    }

    #[test]
    fn cli_requires_jobs_for_plan() {
        assert!(Cli::try_parse_from(["fleetline", "plan"]).is_err());
        let cli = Cli::parse_from(["fleetline", "plan", "jobs.json", "--ai"]);
        assert!(matches!(cli.command, Command::Plan { ai: true, .. }));
    }

    #[test]
    fn cli_verify() {
        Cli::command().debug_assert();
    }
}
