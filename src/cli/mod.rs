//! Command-line interface for the control center.
//!
//! Commands follow one shape: clap `Args` in, an output struct implementing
//! [`CommandOutput`](output::CommandOutput) out, rendered as text or JSON
//! depending on the global `--json` flag.

pub mod commands;
pub mod context;
pub mod id_resolver;
pub mod output;

use clap::{Parser, Subcommand};

use commands::{
    activity::ActivityArgs, agent::AgentArgs, init::InitArgs, task::TaskArgs,
};

#[derive(Parser, Debug)]
#[command(name = "claw")]
#[command(about = "Claw - task board and assignment control center for agent teams", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Log verbosity override (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize .claw configuration and database
    Init(InitArgs),

    /// Task board commands
    Task(TaskArgs),

    /// Agent registry commands
    Agent(AgentArgs),

    /// Show the activity feed, newest first
    Activity(ActivityArgs),
}

/// Print a command error (as JSON in `--json` mode) and exit non-zero.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let causes: Vec<String> = err.chain().skip(1).map(ToString::to_string).collect();
        let body = serde_json::json!({
            "success": false,
            "error": err.to_string(),
            "causes": causes,
        });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_json_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["claw", "task", "list", "--json"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Task(_)));
    }
}
