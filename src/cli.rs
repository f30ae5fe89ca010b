use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about = "OT CSM Buddy: tasks, issues, wins and notifications", long_about = None)]
pub struct Cli {
    /// SQLite database holding the saved store
    #[arg(long, env = "CSM_BUDDY_DB", value_name = "PATH", global = true)]
    pub db: Option<PathBuf>,

    /// Keep everything in memory; nothing is saved on exit
    #[arg(long, global = true)]
    pub in_memory: bool,

    /// View to open first (dashboard, tasks, issues, wins, notifications, backup)
    #[arg(long, value_name = "NAME")]
    pub view: Option<String>,

    /// Log file, defaults to the database path with a .log extension
    #[arg(long, value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch TUI interface
    Tui,
    /// Print today's agenda and open counts
    Summary,
    /// Write a backup file (a directory gets a timestamped file name)
    Export {
        #[arg(value_name = "PATH", default_value = ".")]
        path: PathBuf,
    },
    /// Replace all data with the contents of a backup file
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Clear all data (tasks, issues, wins, notifications)
    Reset {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_name = "SHELL")]
        shell: String,
    },
}
