//! `docsweep config` – show where the config lives and what it resolves to.

use anyhow::Result;
use docsweep_core::config::{self, SweepConfig};
use std::path::Path;

pub fn run_config(explicit: Option<&Path>, cfg: &SweepConfig) -> Result<()> {
    match explicit {
        Some(p) => println!("# config: {}", p.display()),
        None => println!("# config: {}", config::config_path()?.display()),
    }
    print!("{}", toml::to_string_pretty(cfg)?);
    Ok(())
}
