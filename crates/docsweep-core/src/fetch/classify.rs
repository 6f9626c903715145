//! Map a completed HTTP exchange (or a curl failure) to a fetch verdict.

use crate::result::TransientCause;
use crate::retry::{classify_curl_error, ErrorKind};

/// Leading bytes of every PDF document.
pub const PDF_MAGIC: &[u8] = b"%PDF";

/// What came back from one GET after redirects were followed.
#[derive(Debug, Clone, Default)]
pub struct RawResponse {
    pub status: u32,
    /// Declared `Content-Type`, if any.
    pub content_type: Option<String>,
    /// Final URL after redirects.
    pub effective_url: String,
    pub body: Vec<u8>,
}

/// Classification before anything is written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Body is the artifact; persist it.
    Artifact,
    NotFound(String),
    AuthRequired(String),
    Transient(TransientCause),
}

pub fn classify_response(resp: &RawResponse) -> Verdict {
    match resp.status {
        200 => classify_ok(resp),
        404 => Verdict::NotFound("404 Not Found".to_string()),
        401 | 403 => Verdict::AuthRequired(format!("Authentication error: {}", resp.status)),
        code => Verdict::Transient(TransientCause::Status(code)),
    }
}

fn classify_ok(resp: &RawResponse) -> Verdict {
    let content_type = resp.content_type.as_deref().unwrap_or("");
    let ct = content_type.to_ascii_lowercase();

    if ct.contains("pdf") || resp.body.starts_with(PDF_MAGIC) {
        return Verdict::Artifact;
    }
    if ct.contains("html") {
        // An HTML page in place of the document: either a login redirect or
        // the application's "no such document" page.
        let final_url = resp.effective_url.to_ascii_lowercase();
        if final_url.contains("login") || final_url.contains("sign") {
            return Verdict::AuthRequired("Authentication required".to_string());
        }
        return Verdict::NotFound("Document not found".to_string());
    }
    Verdict::NotFound(format!("Unexpected content type: {}", content_type))
}

/// Map a curl failure to a transient cause.
///
/// Transport failures are marked retryable only when the retry classifier
/// sees a connection problem; TLS, redirect-limit and decoding failures are not.
pub fn transient_cause(e: &curl::Error) -> TransientCause {
    if e.is_aborted_by_callback() {
        return TransientCause::Aborted;
    }
    match classify_curl_error(e) {
        ErrorKind::Timeout => TransientCause::Timeout,
        kind => TransientCause::Transport {
            message: e.to_string(),
            retryable: kind == ErrorKind::Connection,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resp(status: u32, ct: Option<&str>, url: &str, body: &[u8]) -> RawResponse {
        RawResponse {
            status,
            content_type: ct.map(str::to_string),
            effective_url: url.to_string(),
            body: body.to_vec(),
        }
    }

    const URL: &str = "https://example.com/doc?id=1";

    #[test]
    fn pdf_content_type_is_artifact() {
        let r = resp(200, Some("Application/PDF"), URL, b"not really");
        assert_eq!(classify_response(&r), Verdict::Artifact);
    }

    #[test]
    fn magic_bytes_win_over_content_type() {
        for ct in [None, Some("text/html"), Some("application/octet-stream")] {
            let r = resp(200, ct, URL, b"%PDF-1.4\n...");
            assert_eq!(classify_response(&r), Verdict::Artifact, "ct={:?}", ct);
        }
    }

    #[test]
    fn html_on_login_url_is_auth_required() {
        let r = resp(200, Some("text/html; charset=utf-8"), "https://example.com/Login?next=/doc", b"<html>");
        assert!(matches!(classify_response(&r), Verdict::AuthRequired(_)));
        let r = resp(200, Some("text/html"), "https://example.com/accounts/signin", b"<html>");
        assert!(matches!(classify_response(&r), Verdict::AuthRequired(_)));
    }

    #[test]
    fn html_elsewhere_is_not_found() {
        let r = resp(200, Some("text/html"), URL, b"<html>no such invoice</html>");
        assert_eq!(
            classify_response(&r),
            Verdict::NotFound("Document not found".to_string())
        );
    }

    #[test]
    fn other_content_type_is_not_found_with_type() {
        let r = resp(200, Some("application/json"), URL, b"{}");
        match classify_response(&r) {
            Verdict::NotFound(reason) => assert!(reason.contains("application/json")),
            v => panic!("unexpected {:?}", v),
        }
    }

    #[test]
    fn status_404_is_not_found_regardless_of_body() {
        let r = resp(404, Some("application/pdf"), URL, b"%PDF-1.7");
        assert!(matches!(classify_response(&r), Verdict::NotFound(_)));
    }

    #[test]
    fn status_401_403_auth_required() {
        for code in [401, 403] {
            let r = resp(code, Some("text/html"), URL, b"");
            assert_eq!(
                classify_response(&r),
                Verdict::AuthRequired(format!("Authentication error: {}", code))
            );
        }
    }

    #[test]
    fn other_status_is_transient_with_code() {
        for code in [500, 502, 429, 302, 204] {
            let r = resp(code, None, URL, b"");
            assert_eq!(
                classify_response(&r),
                Verdict::Transient(TransientCause::Status(code))
            );
        }
    }

    // libcurl CURLcode values.
    const COULDNT_CONNECT: u32 = 7;
    const OPERATION_TIMEDOUT: u32 = 28;
    const ABORTED_BY_CALLBACK: u32 = 42;
    const TOO_MANY_REDIRECTS: u32 = 47;
    const PEER_FAILED_VERIFICATION: u32 = 60;

    #[test]
    fn curl_errors_map_to_causes() {
        assert_eq!(
            transient_cause(&curl::Error::new(OPERATION_TIMEDOUT as _)),
            TransientCause::Timeout
        );
        assert_eq!(
            transient_cause(&curl::Error::new(ABORTED_BY_CALLBACK as _)),
            TransientCause::Aborted
        );
        assert!(matches!(
            transient_cause(&curl::Error::new(COULDNT_CONNECT as _)),
            TransientCause::Transport { retryable: true, .. }
        ));
    }

    #[test]
    fn tls_and_redirect_limit_are_not_retryable() {
        for code in [TOO_MANY_REDIRECTS, PEER_FAILED_VERIFICATION] {
            match transient_cause(&curl::Error::new(code as _)) {
                TransientCause::Transport { message, retryable } => {
                    assert!(!retryable, "code {}", code);
                    assert!(!message.is_empty());
                }
                other => panic!("unexpected {:?} for code {}", other, code),
            }
        }
    }
}
