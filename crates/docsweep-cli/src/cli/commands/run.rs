//! `docsweep run` – confirm, sweep the range, print the summary.

use anyhow::{Context, Result};
use docsweep_core::control::AbortToken;
use docsweep_core::progress::ProgressStats;
use docsweep_core::run::RunObserver;
use docsweep_core::{launch, FetchResult, Launch, RunPlan, SweepReport, Termination};
use std::io::{self, BufRead, Write};

use super::plan::run_plan;

/// Exit code for an operator interrupt (128 + SIGINT).
const EXIT_INTERRUPTED: i32 = 130;

/// Prints every result except "not found" (those only go to the log) and
/// periodic progress lines.
struct CliObserver;

impl RunObserver for CliObserver {
    fn on_result(&mut self, id: u64, result: &FetchResult) {
        match result {
            FetchResult::NotFound { .. } => {}
            FetchResult::Success { path, bytes, .. } => println!(
                "[{}] Downloaded: {} ({:.1} KB)",
                id,
                path.display(),
                *bytes as f64 / 1024.0
            ),
            other => println!("[{}] {}: {}", id, other.kind().label(), other.message()),
        }
    }

    fn on_progress(&mut self, stats: &ProgressStats) {
        let eta = stats
            .eta_secs()
            .map(|s| format!("{:.0}s", s))
            .unwrap_or_else(|| "?".to_string());
        println!(
            "Progress: {} checked, {} downloaded, {} left  {:.2} ids/s  ETA {}",
            stats.processed,
            stats.succeeded,
            stats.remaining,
            stats.ids_per_sec(),
            eta
        );
    }
}

pub(crate) fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn confirm() -> Result<bool> {
    print!("Start download? (y/n): ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(is_yes(&line))
}

pub(crate) fn exit_code(termination: &Termination) -> i32 {
    match termination {
        Termination::Completed | Termination::AuthExhausted { .. } => 0,
        Termination::Interrupted { .. } => EXIT_INTERRUPTED,
        Termination::PersistenceFailed { .. } => 1,
    }
}

fn print_report(out: &SweepReport) {
    let stats = &out.report.stats;
    println!();
    match &out.report.termination {
        Termination::Completed => println!("Sweep complete."),
        Termination::AuthExhausted { last_id } => println!(
            "Sweep halted at id {}: too many consecutive authentication failures. \
             Refresh the session cookies and resume with --resume-from {}",
            last_id,
            out.log_path.display()
        ),
        Termination::Interrupted { last_id } => match last_id {
            Some(id) => println!("Sweep interrupted after id {}.", id),
            None => println!("Sweep interrupted before the first request."),
        },
        Termination::PersistenceFailed { id, reason } => {
            println!("Sweep aborted at id {}: {}", id, reason)
        }
    }
    println!("  Checked:       {}", stats.total_checked);
    println!("  Downloaded:    {}", stats.successful);
    println!("  Not found:     {}", stats.not_found);
    println!("  Auth required: {}", stats.auth_required);
    println!("  Errors:        {}", stats.errors);
    if stats.skipped > 0 {
        println!("  Skipped:       {}", stats.skipped);
    }
    println!("  Elapsed:       {:.1}s", stats.elapsed.as_secs_f64());
    println!("  Log:           {}", out.log_path.display());
    match &out.summary_path {
        Some(path) => println!("  Summary:       {}", path.display()),
        None => println!("  Summary:       not written (see the docsweep log)"),
    }
}

/// Show the plan, ask for confirmation unless `yes`, then sweep on a blocking
/// thread while Ctrl-C requests a cooperative stop.
pub async fn run_sweep(plan: RunPlan, yes: bool) -> Result<i32> {
    run_plan(&plan);
    println!();
    let confirmed = yes || confirm()?;

    let abort = AbortToken::new();
    let signal_token = abort.clone();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupt received; stopping after the current request...");
            signal_token.request_abort();
        }
    });

    let outcome = tokio::task::spawn_blocking(move || {
        launch(&plan, confirmed, &mut CliObserver, &abort)
    })
    .await
    .context("sweep task failed")?;
    signal_task.abort();

    match outcome? {
        Launch::Declined => {
            println!("Download cancelled.");
            Ok(0)
        }
        Launch::Finished(out) => {
            print_report(&out);
            Ok(exit_code(&out.report.termination))
        }
    }
}
