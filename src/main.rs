use clap::Parser;
use std::{
    error::Error,
    fs::{self, File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    process,
    rc::Rc,
    sync::Mutex,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod app;
mod cli;
mod notify;
mod reminder;
mod store;
mod task;
mod tui;

use crate::{
    app::{AppConfig, TodoApp},
    notify::{DesktopNotifier, LogNotifier, Notifier},
    reminder::SystemClock,
};

const APP_NAME: &str = "wholesome-todo";
const TASK_FILE: &str = "tasks.json";
const LOG_FILE: &str = "wholesome-todo.log";
const LOCK_FILE: &str = "lockfile";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory for the task file, lock file and log [default: ~/.wholesome-todo]
    #[arg(long, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Task file to use instead of <config-dir>/tasks.json
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Log reminders instead of showing desktop notifications
    #[arg(long)]
    no_notify: bool,

    /// Do not re-arm reminders for tasks loaded at startup
    #[arg(long)]
    no_rearm: bool,

    #[command(subcommand)]
    command: Option<cli::Command>,
}

/// Held for the lifetime of the process; the file is removed on drop.
struct LockFile {
    path: PathBuf,
    _file: File,
}

impl LockFile {
    fn acquire(config_dir: &Path) -> Result<Self, Box<dyn Error>> {
        let path = config_dir.join(LOCK_FILE);

        if path.exists() {
            return Err(format!(
                "Another instance of {} appears to be running. Lock file exists at: {}",
                APP_NAME,
                path.display()
            )
            .into());
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)?;

        writeln!(file, "{}", process::id())?;
        file.flush()?;

        Ok(LockFile { path, _file: file })
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %err, "failed to remove lock file");
        }
    }
}

fn get_config_dir() -> Result<PathBuf, Box<dyn Error>> {
    let home_dir = dirs::home_dir().ok_or("Unable to find home directory")?;
    Ok(home_dir.join(".wholesome-todo"))
}

// The TUI owns the terminal, so logs go to a file. RUST_LOG overrides the filter.
fn init_logging(config_dir: &Path) -> Result<(), Box<dyn Error>> {
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(config_dir.join(LOG_FILE))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("wholesome_todo=info")),
        )
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let config_dir = match args.config_dir {
        Some(dir) => dir,
        None => get_config_dir()?,
    };
    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    init_logging(&config_dir)?;
    let _lock = LockFile::acquire(&config_dir)?;

    let notifier: Rc<dyn Notifier> = if args.no_notify {
        Rc::new(LogNotifier)
    } else {
        Rc::new(DesktopNotifier::new(APP_NAME))
    };
    let config = AppConfig {
        task_file: args.file.unwrap_or_else(|| config_dir.join(TASK_FILE)),
        rearm_on_startup: !args.no_rearm,
    };
    info!(task_file = %config.task_file.display(), "starting");

    let mut app = TodoApp::startup(config, notifier, Rc::new(SystemClock))?;
    match args.command {
        Some(command) => {
            cli::run_command(&mut app, command, &mut io::stdout().lock())?;
            app.shutdown()?;
        }
        None => tui::run_tui(app)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_file_is_exclusive_and_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();

        let lock = LockFile::acquire(dir.path()).unwrap();
        let pid = fs::read_to_string(dir.path().join(LOCK_FILE)).unwrap();
        assert_eq!(pid.trim(), process::id().to_string());
        assert!(LockFile::acquire(dir.path()).is_err());

        drop(lock);
        assert!(!dir.path().join(LOCK_FILE).exists());
        assert!(LockFile::acquire(dir.path()).is_ok());
    }

    #[test]
    fn test_args_parse_subcommands() {
        let args = Args::parse_from([
            "wholesome-todo",
            "--no-notify",
            "add",
            "Buy milk",
            "--time",
            "02:30 PM",
        ]);
        assert!(args.no_notify);
        match args.command {
            Some(cli::Command::Add { text, time, image }) => {
                assert_eq!(text, "Buy milk");
                assert_eq!(time, "02:30 PM");
                assert_eq!(image, "");
            }
            _ => panic!("expected add command"),
        }

        let args = Args::parse_from(["wholesome-todo"]);
        assert!(args.command.is_none());
        assert!(!args.no_rearm);
    }

    #[test]
    fn test_add_defaults_to_midnight() {
        let args = Args::parse_from(["wholesome-todo", "add", "Sleep"]);
        match args.command {
            Some(cli::Command::Add { time, .. }) => assert_eq!(time, task::DEFAULT_TIME),
            _ => panic!("expected add command"),
        }
    }
}
