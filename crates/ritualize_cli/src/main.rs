//! Command-line front-end for the routine store.
//!
//! # Responsibility
//! - Resolve config, database path and logging from flags and environment.
//! - Expose listing and CSV import/export over the core service.
//! - Keep `ping`/`version` as linkage probes that never touch the database.

use clap::{Parser, Subcommand};
use log::info;
use ritualize_core::{
    init_logging, load_csv_from_file, open_db, save_csv_to_file, sectionize, CoreConfig,
    LogSettings, RoutineService, SqliteRoutineRepository,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

const DEFAULT_DB_FILE: &str = "ritualize.sqlite3";

#[derive(Parser)]
#[command(name = "ritualize")]
#[command(version)]
#[command(about = "Routines and their task checklists", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// JSON config file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// SQLite database file (overrides the config value)
    #[arg(long, global = true, env = "RITUALIZE_DB", value_name = "FILE")]
    db: Option<PathBuf>,

    /// Absolute directory for rolling log files
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Log level: trace, debug, info, warn or error
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check core linkage
    Ping,
    /// Print the core version
    Version,
    /// List routines with their sections and tasks
    List,
    /// Export every routine as CSV
    Export {
        /// Output file (stdout when omitted)
        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Import routines and tasks from a CSV file
    Import {
        /// CSV file to read
        file: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    match cli.command {
        Commands::Ping => {
            println!("ritualize_core ping={}", ritualize_core::ping());
            return Ok(());
        }
        Commands::Version => {
            println!("ritualize_core version={}", ritualize_core::core_version());
            return Ok(());
        }
        _ => {}
    }

    let config = match &cli.config {
        Some(path) => CoreConfig::load(path)?,
        None => CoreConfig::default(),
    };
    start_logging(&cli, &config)?;

    let db_path = cli
        .db
        .clone()
        .or_else(|| config.db_path.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE));
    let conn = open_db(&db_path)?;
    let repo = SqliteRoutineRepository::try_new(&conn)?;
    let service = RoutineService::with_defaults(repo, config.routine_defaults()?);

    match cli.command {
        Commands::List => list(&service),
        Commands::Export { out } => {
            let text = service.export_csv()?;
            match out {
                Some(path) => save_csv_to_file(&text, &path)?,
                None => print!("{text}"),
            }
            Ok(())
        }
        Commands::Import { file } => {
            let text = load_csv_from_file(&file)?;
            let summary = service.import_csv(&text)?;
            println!(
                "rows={} skipped={} routines_created={} routines_reused={} tasks_created={} tasks_replaced={}",
                summary.rows_read,
                summary.rows_skipped,
                summary.routines_created,
                summary.routines_reused,
                summary.tasks_created,
                summary.tasks_replaced
            );
            Ok(())
        }
        Commands::Ping | Commands::Version => Ok(()),
    }
}

fn start_logging(cli: &Cli, config: &CoreConfig) -> Result<(), Box<dyn Error>> {
    let settings = match &cli.log_dir {
        Some(dir) => {
            let level = cli
                .log_level
                .as_deref()
                .or(config.log_level.as_deref())
                .unwrap_or(ritualize_core::default_log_level());
            Some(LogSettings::new(level, dir)?)
        }
        None => config.log_settings()?,
    };
    if let Some(settings) = settings {
        init_logging(&settings)?;
        info!("event=cli_start module=cli status=ok");
    }
    Ok(())
}

fn list(service: &RoutineService<SqliteRoutineRepository<'_>>) -> Result<(), Box<dyn Error>> {
    for routine in service.list_routines()? {
        let sorted = routine.sorted_tasks();
        let actionable = sorted.iter().filter(|task| task.is_actionable()).count();
        let done = sorted
            .iter()
            .filter(|task| task.is_actionable() && task.is_completed)
            .count();
        let favorite = if routine.is_favorite { " *" } else { "" };
        println!(
            "{} [{}] {} ({}/{}){}",
            routine.name, routine.color, routine.id, done, actionable, favorite
        );
        for section in sectionize(sorted) {
            println!("  {}", section.name);
            for task in &section.tasks {
                let mark = if task.is_completed { 'x' } else { ' ' };
                println!("    [{mark}] {}", task.name);
            }
        }
    }
    Ok(())
}
