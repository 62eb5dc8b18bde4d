use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "meetbook", version, about = "Find free time and book Teams meetings")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List free slots on a day
    Slots(commands::slots::SlotsArgs),
    /// Check whether a specific time is free
    Check(commands::check::CheckArgs),
    /// Book a meeting
    Book(commands::book::BookArgs),
    /// Show the next business days
    Days(commands::days::DaysArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Microsoft Graph credentials
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "meetbook=warn,meetbook_core=warn",
        1 => "meetbook=info,meetbook_core=info",
        _ => "meetbook=debug,meetbook_core=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Slots(args) => commands::slots::run(args),
        Commands::Check(args) => commands::check::run(args),
        Commands::Book(args) => commands::book::run(args),
        Commands::Days(args) => commands::days::run(args),
        Commands::Config { action } => commands::config::run(action),
        Commands::Auth { action } => commands::auth::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_book_command() {
        let cli = Cli::try_parse_from([
            "meetbook",
            "-v",
            "book",
            "--name",
            "Sarah",
            "--email",
            "sarah@example.com",
            "--title",
            "Intro",
            "2025-10-20",
            "10:00",
            "--duration",
            "45",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Book(args) => {
                assert_eq!(args.name, "Sarah");
                assert_eq!(args.time, "10:00");
                assert_eq!(args.duration, Some(45));
                assert!(!args.json);
            }
            _ => panic!("expected book"),
        }
    }

    #[test]
    fn step_requires_all() {
        assert!(Cli::try_parse_from(["meetbook", "slots", "2025-10-20", "--step", "15"]).is_err());
        assert!(
            Cli::try_parse_from(["meetbook", "slots", "2025-10-20", "--all", "--step", "15"]).is_ok()
        );
    }
}
