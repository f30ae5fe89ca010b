mod actions;
mod agenda;
mod cli;
mod clock;
mod codec;
mod editor;
mod error;
mod forms;
mod models;
mod observable;
mod router;
mod storage;
mod store;
mod ui;

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands};
use clock::{Clock, SystemClock};
use router::Router;
use storage::{MemoryStorage, SqliteStorage, Storage};
use store::RootStore;
use ui::run_tui;

/// Sends `log` records to a file; the TUI owns the terminal.
fn init_tracing(log_file: &Path) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_env("CSM_BUDDY_LOG")
        .unwrap_or_else(|_| "csm_buddy=info".into());

    if let Some(parent) = log_file.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("Failed to open log file {}", log_file.display()))?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false),
        )
        .try_init()
        .context("Failed to install logger")?;
    Ok(())
}

fn open_storage(cli: &Cli) -> Result<Box<dyn Storage>> {
    if cli.in_memory {
        return Ok(Box::new(MemoryStorage::new()));
    }
    let path = cli.db.clone().unwrap_or_else(storage::default_db_path);
    let storage = SqliteStorage::open(&path).with_context(|| format!("Failed to open database {}", path.display()))?;
    Ok(Box::new(storage))
}

fn log_path(cli: &Cli) -> PathBuf {
    match (&cli.log_file, &cli.db) {
        (Some(path), _) => path.clone(),
        (None, Some(db)) if !cli.in_memory => db.with_extension("log"),
        _ => storage::default_db_path().with_extension("log"),
    }
}

const RESET_PROMPT: &str = "Clear all data (tasks, issues, wins, notifications)?";

fn confirm_reset(yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    let answer = dialoguer::Confirm::new()
        .with_prompt(RESET_PROMPT)
        .default(false)
        .interact()
        .context("Failed to read confirmation")?;
    Ok(answer)
}

fn print_summary(store: &RootStore, clock: &dyn Clock) {
    let today = clock.today();
    let summary = agenda::summarize(store, today);

    println!("{}", today.format("%A, %B %-d %Y"));
    println!("Today's to-dos: {}", summary.today);
    for task in agenda::todays_tasks(store.tasks(), today) {
        println!("  • {} [{}]", task.title, task.priority);
    }
    println!("Overdue tasks: {}", summary.overdue);
    for task in agenda::overdue_tasks(store.tasks(), today) {
        println!("  • {} (due {})", task.title, task.due);
    }
    println!("Open tasks: {}", summary.open_tasks);
    println!("Open issues: {}", summary.open_issues);
    println!("Major wins: {}", summary.wins);
    println!("Unread notifications: {}", summary.unread);
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Completions { shell }) = &cli.command {
        use clap_complete::{generate, Shell};
        let shell = shell.to_lowercase();
        let shell_enum = match shell.as_str() {
            "bash" => Shell::Bash,
            "zsh" => Shell::Zsh,
            "fish" => Shell::Fish,
            "elvish" => Shell::Elvish,
            "powershell" => Shell::PowerShell,
            _ => bail!("Unsupported shell: {shell}"),
        };
        let mut cmd = Cli::command();
        generate(shell_enum, &mut cmd, "csm-buddy", &mut io::stdout());
        return Ok(());
    }

    init_tracing(&log_path(&cli))?;
    let clock = SystemClock;
    let mut store = RootStore::hydrate(open_storage(&cli)?);

    match cli.command {
        Some(Commands::Summary) => print_summary(&store, &clock),
        Some(Commands::Export { path }) => {
            let written = actions::export_backup(&mut store, &clock, &path).context("Export failed")?;
            println!("Data exported successfully ✅ {}", written.display());
        }
        Some(Commands::Import { file }) => match actions::import_backup_file(&mut store, &clock, &file) {
            Ok(()) => println!("Data import complete 🎉"),
            Err(err) if err.is_rejected_import() => bail!(actions::IMPORT_REJECTED),
            Err(err) => return Err(err).with_context(|| format!("Failed to import {}", file.display())),
        },
        Some(Commands::Reset { yes }) => {
            if confirm_reset(yes)? {
                actions::reset_all(&mut store);
                println!("All data cleared");
            }
        }
        Some(Commands::Tui) | None => {
            let backup_dir = std::env::current_dir().context("Failed to read the current directory")?;
            run_tui(&mut store, &clock, Router::new(cli.view.as_deref()), backup_dir)?;
        }
        Some(Commands::Completions { .. }) => {}
    }

    if let Some(err) = store.last_persist_error() {
        bail!("Could not save data: {err}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_with_yes_skips_the_prompt() {
        assert!(confirm_reset(true).unwrap());
    }

    #[test]
    fn log_file_follows_the_database() {
        let cli = Cli::parse_from(["csm-buddy", "--db", "/tmp/buddy.db", "summary"]);
        assert_eq!(log_path(&cli), PathBuf::from("/tmp/buddy.log"));

        let cli = Cli::parse_from(["csm-buddy", "--db", "/tmp/buddy.db", "--log-file", "/tmp/x.log"]);
        assert_eq!(log_path(&cli), PathBuf::from("/tmp/x.log"));
    }
}
