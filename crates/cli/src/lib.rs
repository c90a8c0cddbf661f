pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "skyhop",
    about = "SkyHop operator CLI",
    long_about = "Inspect configuration, check readiness, call the booking tools directly, and run the scripted demo.",
    after_help = "Examples:\n  skyhop doctor --json\n  skyhop search Mumbai 600\n  skyhop book FL421 \"John Smith\"\n  skyhop demo"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, planner readiness, and the flight catalog")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Search the mock catalog for flights under a maximum price")]
    Search {
        destination: String,
        #[arg(allow_negative_numbers = true)]
        max_price: f64,
    },
    #[command(about = "Book a flight against a fresh budget ledger")]
    Book { flight_id: String, passenger_name: String },
    #[command(about = "Add a booking to the calendar (date as YYYY-MM-DD)")]
    Calendar { date: String, details: String },
    #[command(about = "Run the example queries and a scripted agent booking")]
    Demo,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Search { destination, max_price } => {
            commands::tools::search(&destination, max_price)
        }
        Command::Book { flight_id, passenger_name } => {
            commands::tools::book(&flight_id, &passenger_name)
        }
        Command::Calendar { date, details } => commands::tools::calendar(&date, &details),
        Command::Demo => commands::demo::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
