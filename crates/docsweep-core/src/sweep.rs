//! Run planning and the confirmed entry point.
//!
//! `RunPlan::prepare` validates everything that can be checked without
//! touching the network or disk. `launch` takes an explicit `confirmed` flag
//! (the CLI asks the operator) and only then creates output locations and
//! sends requests.

use chrono::Local;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::audit::{settled_ids, AuditLog};
use crate::config::SweepConfig;
use crate::control::AbortToken;
use crate::cookies::CookieJar;
use crate::error::SweepError;
use crate::fetch::{ClientOptions, HttpFetcher};
use crate::range::RefRange;
use crate::retry::RetryPolicy;
use crate::run::{run_range, RunObserver, RunReport, RunSettings};
use crate::storage::ArtifactStore;
use crate::summary::RunSummary;
use crate::template::UrlTemplate;

/// Validated inputs for one sweep.
#[derive(Debug, Clone)]
pub struct RunPlan {
    range: RefRange,
    config: SweepConfig,
    template: UrlTemplate,
    cookies: Option<CookieJar>,
    skip: BTreeSet<u64>,
}

impl RunPlan {
    pub fn prepare(range: RefRange, config: SweepConfig) -> Result<Self, SweepError> {
        let template = config.validate()?;
        let cookies = config
            .cookie_file
            .as_deref()
            .map(CookieJar::load)
            .transpose()?;
        Ok(Self {
            range,
            config,
            template,
            cookies,
            skip: BTreeSet::new(),
        })
    }

    /// Skip ids a previous run's audit log already settled.
    pub fn with_resume_log(mut self, log: &Path) -> Result<Self, SweepError> {
        let range = self.range;
        self.skip = settled_ids(log)?
            .into_iter()
            .filter(|id| range.contains(*id))
            .collect();
        tracing::info!(path = %log.display(), skipped = self.skip.len(), "resume log loaded");
        Ok(self)
    }

    pub fn range(&self) -> RefRange {
        self.range
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    pub fn template(&self) -> &UrlTemplate {
        &self.template
    }

    pub fn cookies(&self) -> Option<&CookieJar> {
        self.cookies.as_ref()
    }

    pub fn skip_count(&self) -> u64 {
        self.skip.len() as u64
    }

    /// Ids that will actually be requested.
    pub fn to_attempt(&self) -> u64 {
        self.range.len() - self.skip_count()
    }

    /// Lower bound on wall time spent in politeness delays alone.
    pub fn min_duration(&self) -> Duration {
        Duration::from_secs_f64(self.config.delay_secs * self.to_attempt().saturating_sub(1) as f64)
    }
}

/// Paths and results of a finished sweep.
#[derive(Debug, Clone)]
pub struct SweepReport {
    pub report: RunReport,
    pub log_path: PathBuf,
    /// `None` if the summary document could not be written.
    pub summary_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub enum Launch {
    /// Operator did not confirm; nothing was created or sent.
    Declined,
    Finished(SweepReport),
}

impl From<&SweepConfig> for ClientOptions {
    fn from(cfg: &SweepConfig) -> Self {
        ClientOptions {
            timeout: Duration::from_secs(cfg.timeout_secs),
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            headers: cfg.headers.clone(),
        }
    }
}

/// Execute a prepared plan once the operator has confirmed it.
///
/// Setup failures (directories, log file, HTTP client) are returned as
/// errors before any request is sent. Once the loop starts, every exit path
/// returns the report; the summary document is written when possible.
pub fn launch(
    plan: &RunPlan,
    confirmed: bool,
    observer: &mut dyn RunObserver,
    abort: &AbortToken,
) -> Result<Launch, SweepError> {
    if !confirmed {
        tracing::info!("sweep not confirmed; nothing to do");
        return Ok(Launch::Declined);
    }
    let cfg = &plan.config;

    let store = ArtifactStore::new(
        &cfg.download_dir,
        RetryPolicy::for_persistence(cfg.persist_attempts),
    );
    store.ensure_dir()?;
    fs::create_dir_all(&cfg.data_dir).map_err(|e| SweepError::setup(&cfg.data_dir, e))?;

    let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let mut fetcher = HttpFetcher::new(
        plan.template.clone(),
        store,
        &ClientOptions::from(cfg),
        plan.cookies.as_ref(),
        abort.clone(),
    )?;
    let mut log = AuditLog::create(&cfg.data_dir, &stamp)?;
    let log_path = log.path().to_path_buf();

    let mut settings = RunSettings::from_config(cfg);
    settings.skip = plan.skip.clone();

    let report = run_range(plan.range, &settings, &mut fetcher, &mut log, observer, abort);
    tracing::info!(path = %log_path.display(), rows = log.rows(), "audit log closed");
    drop(log);

    let summary = RunSummary {
        timestamp: stamp.clone(),
        range: plan.range,
        statistics: report.stats.clone(),
        termination: report.termination.clone(),
        elapsed_seconds: report.stats.elapsed.as_secs_f64(),
        log_path: log_path.clone(),
        download_dir: cfg.download_dir.clone(),
        cookie_names: plan
            .cookies
            .as_ref()
            .map(|jar| jar.names().map(String::from).collect())
            .unwrap_or_default(),
        config: cfg.clone(),
    };
    // A summary write failure is logged; the report is still returned.
    let summary_path = match summary.write(&cfg.data_dir, &stamp) {
        Ok(path) => Some(path),
        Err(e) => {
            tracing::error!("{}", e);
            None
        }
    };

    Ok(Launch::Finished(SweepReport {
        report,
        log_path,
        summary_path,
    }))
}
