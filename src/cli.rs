use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Admin console for tasks, projects, departments and employees.
/// Data lives in ~/.staffdesk/staffdesk.json unless --db is given.
#[derive(Parser)]
#[command(name = "sd", version, about = "Staff and task administration console")]
pub struct Cli {
    /// Path to the JSON data file.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Path to the TOML config file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Act as this host user id instead of reading STAFFDESK_INIT_DATA.
    #[arg(long, global = true)]
    pub user: Option<i64>,

    /// Work on the demo dataset in memory; nothing is saved.
    #[arg(long, global = true)]
    pub demo: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::{ProjectAction, TaskAction};
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_task_add_parses_lists() {
        let cli = Cli::try_parse_from([
            "sd", "--demo", "task", "add", "Ship it", "--project", "4,5", "--assignee", "1", "--dept", "2",
            "--date", "today", "--time", "18:00",
        ])
        .unwrap();
        assert!(cli.demo);
        match cli.command {
            Some(Commands::Task { action: TaskAction::Add { project, assignee, dept, .. } }) => {
                assert_eq!(project, vec![4, 5]);
                assert_eq!(assignee, vec![1]);
                assert_eq!(dept, vec![2]);
            }
            _ => panic!("expected task add"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["sd", "project", "list", "--tree", "--user", "7"]).unwrap();
        assert_eq!(cli.user, Some(7));
        assert!(matches!(
            cli.command,
            Some(Commands::Project { action: ProjectAction::List { tree: true, .. } })
        ));
    }
}
