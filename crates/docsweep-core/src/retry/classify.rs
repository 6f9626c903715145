//! Classify HTTP statuses, curl errors, transient causes and disk errors
//! into retry policy error kinds.

use std::io;

use crate::result::TransientCause;
use crate::retry::policy::ErrorKind;

/// Classify an HTTP status code for retry decisions.
pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        429 | 503 => ErrorKind::Throttled,
        500..=599 => ErrorKind::Http5xx(code as u16),
        _ => ErrorKind::Other,
    }
}

/// Classify a curl error for retry decisions.
pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
    {
        return ErrorKind::Connection;
    }
    ErrorKind::Other
}

/// Classify a recorded transient cause. Aborted transfers are never retried.
pub fn classify_transient(cause: &TransientCause) -> ErrorKind {
    match cause {
        TransientCause::Timeout => ErrorKind::Timeout,
        TransientCause::Aborted => ErrorKind::Other,
        TransientCause::Status(code) => classify_http_status(*code),
        TransientCause::Transport { retryable: true, .. } => ErrorKind::Connection,
        TransientCause::Transport { retryable: false, .. } => ErrorKind::Other,
    }
}

/// Classify a disk error from an artifact write.
pub fn classify_io(e: &io::Error) -> ErrorKind {
    match e.kind() {
        io::ErrorKind::PermissionDenied
        | io::ErrorKind::NotFound
        | io::ErrorKind::InvalidInput
        | io::ErrorKind::Unsupported => ErrorKind::Other,
        _ => ErrorKind::Storage,
    }
}
