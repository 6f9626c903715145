//! Append-only CSV audit log, one row per attempted id.
//!
//! Every row is flushed as soon as it is written so the log stays an accurate
//! record of the run even if the process is killed mid-way.

use std::collections::BTreeSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::SweepError;
use crate::result::{FetchResult, ResultKind};

pub const HEADER: [&str; 6] = [
    "Reference Number",
    "Status",
    "Filename/Message",
    "Size",
    "URL",
    "SHA-256",
];

/// One audit row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub id: u64,
    pub status: &'static str,
    /// Artifact path on success, reason otherwise.
    pub detail: String,
    /// Artifact size in bytes (success only).
    pub size: Option<u64>,
    pub url: String,
    pub sha256: Option<String>,
}

impl LogRecord {
    pub fn from_result(id: u64, result: &FetchResult) -> Self {
        let (size, sha256) = match result {
            FetchResult::Success { bytes, sha256, .. } => (Some(*bytes), Some(sha256.clone())),
            _ => (None, None),
        };
        Self {
            id,
            status: result.kind().label(),
            detail: result.message(),
            size,
            url: result.url().to_string(),
            sha256,
        }
    }

    fn cells(&self) -> [String; 6] {
        [
            self.id.to_string(),
            self.status.to_string(),
            self.detail.clone(),
            self.size.map(|s| s.to_string()).unwrap_or_default(),
            self.url.clone(),
            self.sha256.clone().unwrap_or_default(),
        ]
    }
}

/// Destination for audit rows. The run loop owns exactly one.
pub trait RecordSink {
    fn append(&mut self, record: &LogRecord) -> io::Result<()>;
}

impl RecordSink for Vec<LogRecord> {
    fn append(&mut self, record: &LogRecord) -> io::Result<()> {
        self.push(record.clone());
        Ok(())
    }
}

/// CSV file sink.
pub struct AuditLog {
    out: BufWriter<File>,
    path: PathBuf,
    rows: u64,
}

impl AuditLog {
    /// Create `<dir>/download_log_<stamp>.csv` and write the header row.
    pub fn create(dir: &Path, stamp: &str) -> Result<Self, SweepError> {
        let path = dir.join(format!("download_log_{}.csv", stamp));
        let file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&path)
            .map_err(|e| SweepError::setup(&path, e))?;
        let mut out = BufWriter::new(file);
        write_row(&mut out, &HEADER.map(String::from))
            .and_then(|_| out.flush())
            .map_err(|e| SweepError::setup(&path, e))?;
        Ok(Self { out, path, rows: 0 })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Data rows written so far (header excluded).
    pub fn rows(&self) -> u64 {
        self.rows
    }
}

impl RecordSink for AuditLog {
    fn append(&mut self, record: &LogRecord) -> io::Result<()> {
        write_row(&mut self.out, &record.cells())?;
        self.out.flush()?;
        self.rows += 1;
        Ok(())
    }
}

impl Drop for AuditLog {
    fn drop(&mut self) {
        if let Err(e) = self.out.flush() {
            tracing::error!(path = %self.path.display(), "audit log flush failed: {}", e);
        }
    }
}

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

fn write_row<W: Write>(w: &mut W, row: &[String]) -> io::Result<()> {
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            w.write_all(b",")?;
        }
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            w.write_all(cell.as_bytes())?;
        }
    }
    w.write_all(b"\n")
}

/// Split one CSV line into cells (quoted fields and doubled quotes honored).
fn parse_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => cells.push(std::mem::take(&mut field)),
            _ => field.push(ch),
        }
    }
    cells.push(field);
    cells
}

/// Ids a previous run already settled (downloaded or confirmed missing).
///
/// Auth and error rows are not settled and will be fetched again.
pub fn settled_ids(path: &Path) -> Result<BTreeSet<u64>, SweepError> {
    let data = fs::read_to_string(path).map_err(|e| SweepError::setup(path, e))?;
    let mut ids = BTreeSet::new();
    for line in data.lines().skip(1) {
        let cells = parse_line(line.trim_end_matches('\r'));
        let (Some(id), Some(status)) = (cells.first(), cells.get(1)) else {
            continue;
        };
        let Ok(id) = id.trim().parse::<u64>() else {
            continue;
        };
        if matches!(
            ResultKind::from_label(status),
            Some(ResultKind::Success | ResultKind::NotFound)
        ) {
            ids.insert(id);
        }
    }
    Ok(ids)
}
