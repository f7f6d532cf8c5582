//! Implementation of the `claw init` command.

use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::adapters::sqlite::initialize_from_config;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, DatabaseConfig};
use crate::infrastructure::config::CONFIG_DIR;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Force reinitialization even if already initialized
    #[arg(long, short)]
    pub force: bool,

    /// Target directory (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

#[derive(Debug, serde::Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub message: String,
    pub initialized_path: PathBuf,
    pub directories_created: Vec<String>,
    pub config_written: bool,
    pub database_path: Option<PathBuf>,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![self.message.clone()];
        if !self.directories_created.is_empty() {
            lines.push("\nCreated directories:".to_string());
            for dir in &self.directories_created {
                lines.push(format!("  - {}", dir));
            }
        }
        if self.config_written {
            lines.push(format!("\nWrote default configuration to {CONFIG_DIR}/config.yaml"));
        }
        if let Some(db) = &self.database_path {
            lines.push(format!("\nDatabase initialized at {}", db.display()));
        }
        lines.join("\n")
    }
}

pub async fn execute(args: InitArgs, config: &Config, json_mode: bool) -> Result<()> {
    let target_path = if args.path.is_absolute() {
        args.path.clone()
    } else {
        std::env::current_dir().context("Failed to get current directory")?.join(&args.path)
    };

    let claw_dir = target_path.join(CONFIG_DIR);

    if claw_dir.exists() && !args.force {
        let output_data = InitOutput {
            success: false,
            message: "Project already initialized. Use --force to reinitialize.".to_string(),
            initialized_path: target_path,
            directories_created: vec![],
            config_written: false,
            database_path: None,
        };
        output(&output_data, json_mode);
        return Ok(());
    }

    if args.force && claw_dir.exists() {
        fs::remove_dir_all(&claw_dir)
            .await
            .with_context(|| format!("Failed to remove existing {CONFIG_DIR} directory"))?;
    }

    let mut directories_created = vec![];
    for dir in [claw_dir.clone(), claw_dir.join("logs")] {
        if !dir.exists() {
            fs::create_dir_all(&dir).await.with_context(|| format!("Failed to create {:?}", dir))?;
            let relative = dir.strip_prefix(&target_path).unwrap_or(&dir).to_string_lossy().to_string();
            directories_created.push(relative);
        }
    }

    let config_path = claw_dir.join("config.yaml");
    let yaml = default_config_yaml()?;
    fs::write(&config_path, yaml)
        .await
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    let database = DatabaseConfig {
        path: resolve_against(&target_path, &config.database.path).to_string_lossy().to_string(),
        ..config.database.clone()
    };
    initialize_from_config(&database)
        .await
        .context("Failed to initialize database")?;

    let output_data = InitOutput {
        success: true,
        message: if args.force {
            "Project reinitialized successfully.".to_string()
        } else {
            "Project initialized successfully.".to_string()
        },
        initialized_path: target_path,
        directories_created,
        config_written: true,
        database_path: Some(PathBuf::from(database.path)),
    };

    output(&output_data, json_mode);
    Ok(())
}

fn default_config_yaml() -> Result<String> {
    let body = serde_yaml::to_string(&Config::default()).context("Failed to serialize default config")?;
    Ok(format!(
        "# Claw control center configuration.\n\
         # Overrides go in {CONFIG_DIR}/local.yaml or CLAW_<SECTION>__<KEY> env vars.\n{body}"
    ))
}

/// Relative paths are taken relative to the project directory.
fn resolve_against(base: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
