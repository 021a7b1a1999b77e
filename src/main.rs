//! # staffdesk - staff and task administration console
//!
//! `sd` keeps tasks, a hierarchical project tree, departments and employees
//! in one local JSON file, and offers two ways to work on it:
//!
//! - an interactive terminal console (`sd` or `sd ui`) with pages for the
//!   task form, the task list, projects, employees, analytics and settings;
//! - a scriptable CLI (`sd task add`, `sd project list --tree`, ...).
//!
//! ## Quick Start
//!
//! ```bash
//! # Open the console on the demo dataset without touching any file
//! sd --demo
//!
//! # Create a task for two employees in the "SEO" project
//! sd task add "Audit meta tags" --project 8 --assignee 1,2 --date tomorrow --time 18:00
//!
//! # Statistics for the current month
//! sd analytics
//! ```
//!
//! ## Access
//!
//! The console is meant to be launched by a host application that passes the
//! signed-in user in `STAFFDESK_INIT_DATA`. Only users on the admin list in
//! `~/.staffdesk/config.toml` get in. With `dev_mode` on (the default) a
//! missing host or user is replaced by the first admin; `--user <id>` acts as
//! a specific host user.
//!
//! Data lives in `~/.staffdesk/staffdesk.json`; the console logs to
//! `~/.staffdesk/staffdesk.log`, the CLI to stderr. Set `RUST_LOG` to change
//! the level.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;

use chrono::Local;
use clap::Parser;

pub mod analytics;
pub mod api;
pub mod auth;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod db;
pub mod error;
pub mod fields;
pub mod filter;
pub mod host;
pub mod notify;
pub mod project;
pub mod seed;
pub mod selection;
pub mod staff;
pub mod task;
pub mod tree;
pub mod validate;
pub mod tui {
    pub mod analytics;
    pub mod app;
    pub mod colors;
    pub mod employees;
    pub mod enums;
    pub mod input;
    pub mod projects;
    pub mod run;
    pub mod settings;
    pub mod task_form;
    pub mod task_list;
    pub mod utils;
}

use cli::Cli;
use cmd::*;
use config::Config;
use db::Store;
use error::{AppError, Result};
use host::TerminalHost;

/// Log to stderr for the CLI. The console owns the screen, so it logs to a
/// file instead; if that cannot be opened the reason goes to stderr and
/// logging stays off for the session.
fn init_logging(for_console: bool) {
    let env = env_logger::Env::default().default_filter_or("warn");
    let mut builder = env_logger::Builder::from_env(env);
    if !for_console {
        builder.init();
        return;
    }
    let path = config::log_path();
    match open_log_file(&path) {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
            builder.init();
        }
        Err(e) => {
            builder.init();
            log::warn!("cannot open log file {}: {e}", path.display());
            log::set_max_level(log::LevelFilter::Off);
        }
    }
}

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

fn run(cli: Cli) -> Result<()> {
    let command = cli.command.unwrap_or(Commands::Ui);
    if let Commands::Completions { shell } = command {
        cmd_completions(shell);
        return Ok(());
    }

    let config_path = cli.config.unwrap_or_else(config::default_config_path);
    let config = Config::load(&config_path)?;

    let mut store = if cli.demo {
        log::info!("demo mode, nothing will be saved");
        Store::in_memory(seed::demo_database(Local::now().date_naive()))
    } else {
        let path = cli.db.unwrap_or_else(config::default_db_path);
        Store::open(&path, config.seed_on_first_run)?
    };

    let host = TerminalHost::new(cli.user, config.theme, config.bell_on_error);
    let session = auth::authenticate(&host, &config.admins, config.dev_mode);

    if matches!(command, Commands::Ui) {
        tui::run::run_tui(store, session, Box::new(host))?;
        return Ok(());
    }

    let session = session.map_err(AppError::AccessDenied)?;
    match command {
        Commands::Ui | Commands::Completions { .. } => Ok(()),
        Commands::Whoami => {
            cmd_whoami(&session);
            Ok(())
        }
        Commands::Task { action } => cmd_task(&mut store, &session, action),
        Commands::Project { action } => cmd_project(&mut store, action),
        Commands::Dept { action } => cmd_dept(&mut store, action),
        Commands::Employee { action } => cmd_employee(&mut store, action),
        Commands::Analytics { from, to } => cmd_analytics(&store.db, from, to),
        Commands::Settings { action } => cmd_settings(&mut store, action),
        Commands::Seed { force } => cmd_seed(&mut store, force),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(matches!(cli.command, None | Some(Commands::Ui)));

    if let Err(e) = run(cli) {
        if e.is_user_facing() {
            eprintln!("{e}");
        } else {
            log::error!("{e}");
            eprintln!("Error: {e}");
        }
        std::process::exit(1);
    }
}
