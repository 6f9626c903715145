pub mod config;
pub mod error;
pub mod logging;

pub mod audit;
pub mod checksum;
pub mod control;
pub mod cookies;
pub mod fetch;
pub mod progress;
pub mod range;
pub mod result;
pub mod retry;
pub mod run;
pub mod storage;
pub mod summary;
pub mod sweep;
pub mod template;

pub use error::SweepError;
pub use fetch::{Fetch, HttpFetcher};
pub use range::RefRange;
pub use result::{FetchResult, ResultKind, TransientCause};
pub use run::{run_range, RunReport, RunStatistics, Termination};
pub use sweep::{launch, Launch, RunPlan, SweepReport};
