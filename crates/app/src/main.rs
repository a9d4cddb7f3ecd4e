mod backend;
mod commands;
mod telemetry;

use std::{io, path::PathBuf};

use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use reserve_core::{CustomerId, Directory, NewCustomer};
use reserve_util::{load_env_file, AppConfig};

use crate::backend::SqliteBackend;

#[derive(Parser)]
#[command(name = "reserve")]
#[command(author, version, about = "Salon customer register: visits, loyalty discounts and CSV export")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List customers grouped by reading
    List {
        /// Only show customers whose name or reading contains this text
        #[arg(short, long, default_value = "")]
        search: String,
    },
    /// Register a new customer
    Add {
        #[arg(short, long)]
        name: String,
        /// Reading in katakana, used for grouping and sorting
        #[arg(short, long, default_value = "")]
        kana: String,
        #[arg(short, long)]
        phone: Option<String>,
        #[arg(short, long)]
        email: Option<String>,
    },
    /// Show a customer's card and visit history
    Show { id: String },
    /// Record a visit
    Visit {
        id: String,
        /// Visit date as YYYY-MM-DD (defaults to today)
        #[arg(short, long)]
        date: Option<String>,
        /// What was done during the visit
        #[arg(short, long, default_value = "")]
        note: String,
    },
    /// Delete a customer and their history
    Remove {
        id: String,
        /// Confirm the deletion; it cannot be undone
        #[arg(long)]
        yes: bool,
    },
    /// Write CSV exports
    Export {
        #[command(subcommand)]
        target: ExportTarget,
    },
}

#[derive(Subcommand)]
enum ExportTarget {
    /// Export every customer
    All {
        /// Output directory (defaults to RESERVE_EXPORT_DIR)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Export one customer's visit history
    History {
        id: String,
        /// Output directory (defaults to RESERVE_EXPORT_DIR)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_env_file();
    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    telemetry::init_tracing(&config)?;
    info!(stage = "app", env = %config.environment.as_str(), "opening customer register");

    run(cli, &config).map_err(|err| {
        error!(stage = "app", error = %err, "command failed");
        err
    })
}

fn run(cli: Cli, config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut backend = SqliteBackend::open(&config.database_url)?;
    let mut directory = Directory::new();
    directory.load(&backend)?;

    let today = Local::now().date_naive();
    let mut out = io::stdout().lock();

    match cli.command {
        Commands::List { search } => commands::list(&directory, &search, &mut out)?,
        Commands::Add {
            name,
            kana,
            phone,
            email,
        } => {
            let candidate = NewCustomer {
                name,
                kana,
                phone,
                email,
            };
            commands::add(&mut directory, &mut backend, candidate, &mut out)?;
        }
        Commands::Show { id } => commands::show(&directory, &CustomerId::new(id), &mut out)?,
        Commands::Visit { id, date, note } => {
            commands::visit(
                &mut directory,
                &mut backend,
                &CustomerId::new(id),
                date.as_deref(),
                &note,
                today,
                &mut out,
            )?;
        }
        Commands::Remove { id, yes } => {
            commands::remove(
                &mut directory,
                &mut backend,
                &CustomerId::new(id),
                yes,
                &mut out,
            )?;
        }
        Commands::Export { target } => match target {
            ExportTarget::All { out: dir } => {
                let dir = dir.unwrap_or_else(|| config.export_dir.clone());
                commands::export_all(&directory, &dir, today, &mut out)?;
            }
            ExportTarget::History { id, out: dir } => {
                let dir = dir.unwrap_or_else(|| config.export_dir.clone());
                commands::export_history(&directory, &CustomerId::new(id), &dir, &mut out)?;
            }
        },
    }

    Ok(())
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
    fn parses_visit_with_defaults() {
        let cli = Cli::try_parse_from(["reserve", "visit", "abc"]).expect("parse visit");
        match cli.command {
            Commands::Visit { id, date, note } => {
                assert_eq!(id, "abc");
                assert!(date.is_none());
                assert!(note.is_empty());
            }
            _ => panic!("expected visit command"),
        }
    }

    #[test]
    fn remove_defaults_to_unconfirmed() {
        let cli = Cli::try_parse_from(["reserve", "remove", "abc"]).expect("parse remove");
        assert!(matches!(cli.command, Commands::Remove { yes: false, .. }));
    }

    #[test]
    fn export_history_accepts_output_dir() {
        let cli = Cli::try_parse_from(["reserve", "export", "history", "abc", "--out", "/tmp/x"])
            .expect("parse export");
        match cli.command {
            Commands::Export {
                target: ExportTarget::History { id, out },
            } => {
                assert_eq!(id, "abc");
                assert_eq!(out, Some(PathBuf::from("/tmp/x")));
            }
            _ => panic!("expected export history command"),
        }
    }
}
