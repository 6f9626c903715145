//! `docsweep cookies <path>` – validate a cookie file before a run.

use anyhow::Result;
use docsweep_core::cookies::CookieJar;
use std::path::Path;

/// Print the domain and cookie names; values are never echoed.
pub fn run_cookies(path: &Path) -> Result<()> {
    let jar = CookieJar::load(path)?;
    println!("Domain: {}", jar.domain());
    println!("Cookies ({}):", jar.len());
    for name in jar.names() {
        println!("  {}", name);
    }
    Ok(())
}
