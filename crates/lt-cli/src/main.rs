use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use lt_cli::commands::{add, delete, import, init, recent, timesheet, track};
use lt_cli::{Cli, Commands, Config, refdata};
use lt_core::Category;

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(lt_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = lt_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Some(Commands::Init { tracks }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            init::run(&mut out, &mut db, tracks)?;
        }
        Some(Commands::Add {
            track,
            time,
            speed,
            items,
        }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            add::run(&mut out, &mut db, track, time, Category::new(*speed, *items))?;
        }
        Some(Commands::Delete { id }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            delete::run(&mut out, &mut db, *id)?;
        }
        Some(Commands::Import {
            times,
            speed,
            items,
        }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            import::run(&mut out, &mut db, times, Category::new(*speed, *items))?;
        }
        Some(Commands::Timesheet {
            speed,
            items,
            json,
            sort,
            top,
            bottom,
        }) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            let book = refdata::load_reference_book(&config.reference_dir)?;
            timesheet::run(
                &mut out,
                &db,
                &book,
                Category::new(*speed, *items),
                *json,
                sort.as_deref(),
                *top,
                *bottom,
            )?;
        }
        Some(Commands::Recent { n }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            recent::run(&mut out, &db, *n)?;
        }
        Some(Commands::Track { name, speed, items }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            track::run(&mut out, &db, name, Category::new(*speed, *items))?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
