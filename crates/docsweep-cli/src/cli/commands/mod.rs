//! CLI command handlers. Each command is in its own file.

mod checksum;
mod config;
mod cookies;
mod plan;
mod run;

pub use checksum::run_checksum;
pub use config::run_config;
pub use cookies::run_cookies;
pub use plan::run_plan;
pub use run::run_sweep;

#[cfg(test)]
pub(crate) use run::{exit_code, is_yes};
