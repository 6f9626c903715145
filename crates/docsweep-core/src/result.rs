//! Per-id fetch outcome.

use std::fmt;
use std::path::PathBuf;

/// Why a request ended without a usable answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransientCause {
    /// Request exceeded the configured timeout.
    Timeout,
    /// Transfer stopped because the run was interrupted.
    Aborted,
    /// Unexpected HTTP status (anything but 200/401/403/404).
    Status(u32),
    /// Connection, DNS, TLS or other transport failure. `retryable` is set
    /// for failures that may clear up on their own (refused, reset, DNS).
    Transport { message: String, retryable: bool },
}

impl fmt::Display for TransientCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransientCause::Timeout => write!(f, "Request timeout"),
            TransientCause::Aborted => write!(f, "Request aborted"),
            TransientCause::Status(code) => write!(f, "HTTP {}", code),
            TransientCause::Transport { message, .. } => write!(f, "{}", message),
        }
    }
}

/// Exactly one of these is produced for every attempted id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    Success {
        path: PathBuf,
        bytes: u64,
        url: String,
        sha256: String,
    },
    NotFound {
        reason: String,
        url: String,
    },
    AuthRequired {
        reason: String,
        url: String,
    },
    TransientError {
        cause: TransientCause,
        url: String,
    },
}

/// Result variant without payload; used for counters and labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultKind {
    Success,
    NotFound,
    AuthRequired,
    TransientError,
}

impl ResultKind {
    /// Status label written to the audit log.
    pub fn label(self) -> &'static str {
        match self {
            ResultKind::Success => "Downloaded",
            ResultKind::NotFound => "Not Found",
            ResultKind::AuthRequired => "Auth Required",
            ResultKind::TransientError => "Error",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Downloaded" => Some(ResultKind::Success),
            "Not Found" => Some(ResultKind::NotFound),
            "Auth Required" => Some(ResultKind::AuthRequired),
            "Error" => Some(ResultKind::TransientError),
            _ => None,
        }
    }
}

impl FetchResult {
    pub fn kind(&self) -> ResultKind {
        match self {
            FetchResult::Success { .. } => ResultKind::Success,
            FetchResult::NotFound { .. } => ResultKind::NotFound,
            FetchResult::AuthRequired { .. } => ResultKind::AuthRequired,
            FetchResult::TransientError { .. } => ResultKind::TransientError,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            FetchResult::Success { url, .. }
            | FetchResult::NotFound { url, .. }
            | FetchResult::AuthRequired { url, .. }
            | FetchResult::TransientError { url, .. } => url,
        }
    }

    /// File path for successes, reason text otherwise.
    pub fn message(&self) -> String {
        match self {
            FetchResult::Success { path, .. } => path.display().to_string(),
            FetchResult::NotFound { reason, .. } | FetchResult::AuthRequired { reason, .. } => {
                reason.clone()
            }
            FetchResult::TransientError { cause, .. } => cause.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip_through_kind() {
        for kind in [
            ResultKind::Success,
            ResultKind::NotFound,
            ResultKind::AuthRequired,
            ResultKind::TransientError,
        ] {
            assert_eq!(ResultKind::from_label(kind.label()), Some(kind));
        }
        assert_eq!(ResultKind::from_label("Skipped"), None);
    }

    #[test]
    fn transient_message_includes_status() {
        let r = FetchResult::TransientError {
            cause: TransientCause::Status(502),
            url: "https://example.com/1".into(),
        };
        assert_eq!(r.message(), "HTTP 502");
        assert_eq!(r.kind(), ResultKind::TransientError);
        assert_eq!(r.url(), "https://example.com/1");
    }
}
