//! CLI for the docsweep range fetcher.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use docsweep_core::config::{self, SweepConfig};
use docsweep_core::{RefRange, RunPlan};
use std::path::PathBuf;

use commands::{run_checksum, run_config, run_cookies, run_plan, run_sweep};

/// Top-level CLI for docsweep.
#[derive(Debug, Parser)]
#[command(name = "docsweep")]
#[command(about = "docsweep: sequential PDF fetcher over a numeric reference range", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Fetch every reference id in [START, END] after confirmation.
    Run {
        /// First reference id (inclusive).
        start: u64,
        /// Last reference id (inclusive).
        end: u64,
        /// Skip the confirmation prompt.
        #[arg(long, short = 'y')]
        yes: bool,
        #[command(flatten)]
        overrides: Overrides,
    },

    /// Print the run plan for [START, END] without sending any request.
    Plan {
        start: u64,
        end: u64,
        #[command(flatten)]
        overrides: Overrides,
    },

    /// Validate a cookie file and list the cookie names it carries.
    Cookies {
        /// Path to the cookie TOML file.
        path: PathBuf,
    },

    /// Compute SHA-256 of a file (e.g. a downloaded artifact).
    Checksum {
        /// Path to the file.
        path: PathBuf,
    },

    /// Show the config file path and the effective configuration.
    Config {
        /// Read this file instead of the default config location.
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
}

/// Per-run overrides applied on top of the config file.
#[derive(Debug, Clone, Default, Args)]
pub struct Overrides {
    /// Read this file instead of the default config location.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// Target URL with a single `{id}` placeholder.
    #[arg(long, value_name = "TEMPLATE")]
    pub url_template: Option<String>,
    /// Directory for downloaded `<id>.pdf` files.
    #[arg(long, value_name = "DIR")]
    pub download_dir: Option<PathBuf>,
    /// Directory for the CSV log and JSON summary.
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,
    /// Seconds to wait between consecutive requests.
    #[arg(long, value_name = "SECS")]
    pub delay: Option<f64>,
    /// Whole-request timeout in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
    /// Cookie file (TOML) with the session cookies to send.
    #[arg(long, value_name = "PATH")]
    pub cookies: Option<PathBuf>,
    /// Consecutive auth failures that halt the run.
    #[arg(long, value_name = "N")]
    pub auth_threshold: Option<u32>,
    /// Previous CSV log; ids it marks Downloaded or Not Found are skipped.
    #[arg(long, value_name = "CSV")]
    pub resume_from: Option<PathBuf>,
}

impl Overrides {
    /// Apply the flags that were given to `cfg`.
    pub fn apply(&self, mut cfg: SweepConfig) -> SweepConfig {
        if let Some(t) = &self.url_template {
            cfg.url_template = t.clone();
        }
        if let Some(d) = &self.download_dir {
            cfg.download_dir = d.clone();
        }
        if let Some(d) = &self.data_dir {
            cfg.data_dir = d.clone();
        }
        if let Some(d) = self.delay {
            cfg.delay_secs = d;
        }
        if let Some(t) = self.timeout {
            cfg.timeout_secs = t;
        }
        if let Some(c) = &self.cookies {
            cfg.cookie_file = Some(c.clone());
        }
        if let Some(n) = self.auth_threshold {
            cfg.auth_failure_threshold = n;
        }
        cfg
    }

    /// Load the config, apply overrides, and validate the whole plan.
    pub fn plan(&self, start: u64, end: u64) -> Result<RunPlan> {
        let range = RefRange::new(start, end)?;
        let cfg = self.apply(load_config(self.config.as_ref())?);
        tracing::debug!("effective config: {:?}", cfg);
        let mut plan = RunPlan::prepare(range, cfg)?;
        if let Some(log) = &self.resume_from {
            plan = plan.with_resume_log(log)?;
        }
        Ok(plan)
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<SweepConfig> {
    match path {
        Some(p) => config::load_from_path(p),
        None => config::load_or_init(),
    }
}

impl CliCommand {
    /// Parse argv, run the command, and return the process exit code.
    pub async fn run_from_args() -> Result<i32> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Run {
                start,
                end,
                yes,
                overrides,
            } => {
                let plan = overrides.plan(start, end)?;
                run_sweep(plan, yes).await
            }
            CliCommand::Plan {
                start,
                end,
                overrides,
            } => {
                run_plan(&overrides.plan(start, end)?);
                Ok(0)
            }
            CliCommand::Cookies { path } => {
                run_cookies(&path)?;
                Ok(0)
            }
            CliCommand::Checksum { path } => {
                run_checksum(&path)?;
                Ok(0)
            }
            CliCommand::Config { config } => {
                let cfg = load_config(config.as_ref())?;
                run_config(config.as_deref(), &cfg)?;
                Ok(0)
            }
        }
    }
}

#[cfg(test)]
mod tests;
