use claw_control::cli::commands::agent::AgentCommands;
use claw_control::cli::commands::task::TaskCommands;
use claw_control::cli::{Cli, Commands};
use claw_control::{AgentStatus, ArtifactKind, Lane, Priority};
use clap::Parser;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("claw").chain(args.iter().copied())).unwrap()
}

#[test]
fn test_parse_task_create() {
    let cli = parse(&[
        "task",
        "create",
        "Build login API",
        "--lane",
        "queued",
        "--priority",
        "p1",
        "--depends-on",
        "0b3c,7f2a",
        "-c",
        "returns 200",
        "-c",
        "rejects bad passwords",
    ]);

    match cli.command {
        Commands::Task(args) => match args.command {
            TaskCommands::Create {
                title,
                lane,
                priority,
                owner,
                depends_on,
                criteria,
                file,
                ..
            } => {
                assert_eq!(title.as_deref(), Some("Build login API"));
                assert_eq!(lane, Some(Lane::Queued));
                assert_eq!(priority, Some(Priority::P1));
                assert!(owner.is_none());
                assert_eq!(depends_on, vec!["0b3c", "7f2a"]);
                assert_eq!(criteria.len(), 2);
                assert!(file.is_none());
            }
            other => panic!("Wrong task command: {other:?}"),
        },
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_task_create_requires_title_or_file() {
    assert!(Cli::try_parse_from(["claw", "task", "create"]).is_err());
    assert!(Cli::try_parse_from(["claw", "task", "create", "--file", "tasks.json"]).is_ok());
    assert!(Cli::try_parse_from(["claw", "task", "create", "Title", "--file", "tasks.json"]).is_err());
}

#[test]
fn test_parse_task_update() {
    let cli = parse(&["task", "update", "0b3c", "--lane", "done", "--note", "shipped", "--unassign"]);

    match cli.command {
        Commands::Task(args) => match args.command {
            TaskCommands::Update {
                id,
                lane,
                note,
                unassign,
                owner,
                depends_on,
                ..
            } => {
                assert_eq!(id, "0b3c");
                assert_eq!(lane, Some(Lane::Done));
                assert_eq!(note.as_deref(), Some("shipped"));
                assert!(unassign);
                assert!(owner.is_none());
                assert!(depends_on.is_none());
            }
            other => panic!("Wrong task command: {other:?}"),
        },
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_rejects_bad_values() {
    assert!(Cli::try_parse_from(["claw", "task", "list", "--lane", "limbo"]).is_err());
    assert!(Cli::try_parse_from(["claw", "task", "create", "x", "--priority", "P7"]).is_err());
    assert!(Cli::try_parse_from(["claw", "agent", "heartbeat", "forge", "--status", "asleep"]).is_err());
    assert!(Cli::try_parse_from(["claw", "task", "update", "ab", "--owner", "x", "--unassign"]).is_err());
}

#[test]
fn test_parse_task_artifact() {
    let cli = parse(&["task", "artifact", "0b3c", "test-result", "unit", "--summary", "all green"]);

    match cli.command {
        Commands::Task(args) => match args.command {
            TaskCommands::Artifact {
                kind,
                reference,
                summary,
                agent,
                ..
            } => {
                assert_eq!(kind, ArtifactKind::TestResult);
                assert_eq!(reference, "unit");
                assert_eq!(summary.as_deref(), Some("all green"));
                assert!(agent.is_none());
            }
            other => panic!("Wrong task command: {other:?}"),
        },
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_agent_register_roles() {
    let cli = parse(&["agent", "register", "forge", "--role", "backend-dev,qa", "-r", "devops"]);

    match cli.command {
        Commands::Agent(args) => match args.command {
            AgentCommands::Register { id, name, roles } => {
                assert_eq!(id, "forge");
                assert_eq!(name, "");
                assert_eq!(roles, vec!["backend-dev", "qa", "devops"]);
            }
            other => panic!("Wrong agent command: {other:?}"),
        },
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_agent_heartbeat_and_best() {
    let cli = parse(&["agent", "heartbeat", "forge", "--status", "busy", "--working-on", "0b3c"]);
    match cli.command {
        Commands::Agent(args) => match args.command {
            AgentCommands::Heartbeat {
                status, working_on, idle, ..
            } => {
                assert_eq!(status, Some(AgentStatus::Busy));
                assert_eq!(working_on.as_deref(), Some("0b3c"));
                assert!(!idle);
            }
            other => panic!("Wrong agent command: {other:?}"),
        },
        _ => panic!("Wrong top-level command"),
    }

    assert!(Cli::try_parse_from(["claw", "agent", "best"]).is_err());
    assert!(Cli::try_parse_from(["claw", "agent", "best", "--title", "Fix api"]).is_ok());
    assert!(Cli::try_parse_from(["claw", "agent", "best", "--role", "qa"]).is_ok());
}

#[test]
fn test_parse_global_flags() {
    let cli = parse(&["activity", "--limit", "5", "--json", "--log-level", "debug"]);
    assert!(cli.json);
    assert_eq!(cli.log_level.as_deref(), Some("debug"));
    match cli.command {
        Commands::Activity(args) => assert_eq!(args.limit, 5),
        _ => panic!("Wrong top-level command"),
    }

    let cli = parse(&["init", "--force"]);
    assert!(!cli.json);
    assert!(matches!(cli.command, Commands::Init(ref args) if args.force));
}
