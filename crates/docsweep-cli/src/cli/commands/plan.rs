//! `docsweep plan` – print what a run would do.

use docsweep_core::RunPlan;

/// Print the run plan; `run` shows the same block before asking for confirmation.
pub fn run_plan(plan: &RunPlan) {
    let cfg = plan.config();
    let range = plan.range();
    println!("Download plan:");
    println!(
        "  Range:        {} to {} ({} ids)",
        range.start(),
        range.end(),
        range.len()
    );
    if plan.skip_count() > 0 {
        println!("  Already done: {} (from resume log)", plan.skip_count());
    }
    println!("  URL template: {}", plan.template().as_str());
    println!("  Delay:        {}s between requests", cfg.delay_secs);
    println!(
        "  Minimum time: {:.1}s ({:.1} min)",
        plan.min_duration().as_secs_f64(),
        plan.min_duration().as_secs_f64() / 60.0
    );
    println!(
        "  Auth halt:    after {} consecutive auth failures",
        cfg.auth_failure_threshold
    );
    match &cfg.retry {
        Some(r) => println!("  Retries:      up to {} attempts per id", r.max_attempts),
        None => println!("  Retries:      none"),
    }
    println!("  Downloads:    {}", cfg.download_dir.display());
    println!("  Log/summary:  {}", cfg.data_dir.display());
    match plan.cookies() {
        Some(jar) => {
            let names: Vec<&str> = jar.names().collect();
            let scope = if jar.applies_to(plan.template().host()) {
                ""
            } else {
                " (domain mismatch, not sent)"
            };
            println!(
                "  Cookies:      {} for {}{}",
                names.join(", "),
                jar.domain(),
                scope
            );
        }
        None => println!("  Cookies:      none"),
    }
}
