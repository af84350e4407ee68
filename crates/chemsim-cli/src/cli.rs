use chemsim::engine::scheduler::SchedulerKind;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "chemsim - exact stochastic simulation of chemical reaction networks.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Simulate a reaction network and print the final state.
    Run(RunArgs),
    /// Print the species, reactions and reaction dependencies of a network file.
    Inspect(InspectArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Path to the network description in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Override the scheduler ('direct' or 'next-reaction').
    #[arg(long, value_name = "NAME")]
    pub scheduler: Option<SchedulerKind>,

    /// Override the random seed. Without a seed the run is seeded from system entropy.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Fire at most this many reactions, overriding the config file.
    #[arg(short = 'n', long, value_name = "INT", conflicts_with = "until")]
    pub steps: Option<u64>,

    /// Simulate up to this time, overriding the config file.
    #[arg(short = 't', long, value_name = "TIME")]
    pub until: Option<f64>,

    /// Print every firing as it happens.
    #[arg(long)]
    pub print_events: bool,
}

/// Arguments for the `inspect` subcommand.
#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    /// Path to the network description in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,
}
