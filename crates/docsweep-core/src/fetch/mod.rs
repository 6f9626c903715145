//! One GET per reference id.
//!
//! Uses a single reusable libcurl Easy handle (via the `curl` crate) with
//! fixed headers, optional session cookies, redirect following and timeouts.
//! `fetch_one` never retries; retry policy belongs to the run loop.

mod classify;

pub use classify::{classify_response, transient_cause, RawResponse, Verdict, PDF_MAGIC};

use std::time::Duration;

use crate::checksum::sha256_bytes;
use crate::config::HeaderConfig;
use crate::control::AbortToken;
use crate::cookies::CookieJar;
use crate::error::SweepError;
use crate::result::FetchResult;
use crate::storage::ArtifactStore;
use crate::template::UrlTemplate;

const MAX_REDIRECTS: u32 = 10;

/// Anything that can turn a reference id into a classified result.
///
/// `Err` is reserved for persistence failures; every network outcome is a
/// `FetchResult`.
pub trait Fetch {
    fn fetch_one(&mut self, id: u64) -> Result<FetchResult, SweepError>;
}

impl<F> Fetch for F
where
    F: FnMut(u64) -> Result<FetchResult, SweepError>,
{
    fn fetch_one(&mut self, id: u64) -> Result<FetchResult, SweepError> {
        self(id)
    }
}

/// Request settings shared by every GET of a run.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub headers: HeaderConfig,
}

pub struct HttpFetcher {
    easy: curl::easy::Easy,
    template: UrlTemplate,
    store: ArtifactStore,
    abort: AbortToken,
}

impl HttpFetcher {
    pub fn new(
        template: UrlTemplate,
        store: ArtifactStore,
        opts: &ClientOptions,
        cookies: Option<&CookieJar>,
        abort: AbortToken,
    ) -> Result<Self, SweepError> {
        let mut easy = curl::easy::Easy::new();
        easy.follow_location(true)?;
        easy.max_redirections(MAX_REDIRECTS)?;
        easy.connect_timeout(opts.connect_timeout)?;
        easy.timeout(opts.timeout)?;
        easy.useragent(&opts.headers.user_agent)?;
        // Enables the progress callback used for abort checks.
        easy.progress(true)?;

        let mut list = curl::easy::List::new();
        list.append(&format!("Accept: {}", opts.headers.accept))?;
        list.append(&format!("Accept-Language: {}", opts.headers.accept_language))?;
        easy.http_headers(list)?;

        if let Some(jar) = cookies {
            if jar.applies_to(template.host()) {
                easy.cookie(&jar.header_value())?;
                tracing::info!(
                    domain = jar.domain(),
                    count = jar.len(),
                    "attaching session cookies"
                );
            } else {
                tracing::warn!(
                    domain = jar.domain(),
                    host = template.host(),
                    "cookie domain does not match target host; cookies not sent"
                );
            }
        }

        Ok(Self {
            easy,
            template,
            store,
            abort,
        })
    }

    fn get(&mut self, url: &str) -> Result<RawResponse, curl::Error> {
        let mut body = Vec::new();
        self.easy.url(url)?;
        {
            let abort = &self.abort;
            let mut transfer = self.easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.progress_function(|_, _, _, _| !abort.is_aborted())?;
            transfer.perform()?;
        }

        let status = self.easy.response_code()?;
        let content_type = self.easy.content_type()?.map(str::to_string);
        let effective_url = self.easy.effective_url()?.unwrap_or(url).to_string();
        Ok(RawResponse {
            status,
            content_type,
            effective_url,
            body,
        })
    }
}

impl Fetch for HttpFetcher {
    fn fetch_one(&mut self, id: u64) -> Result<FetchResult, SweepError> {
        let url = self.template.render(id);
        let resp = match self.get(&url) {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(id, %url, "transfer failed: {}", e);
                return Ok(FetchResult::TransientError {
                    cause: transient_cause(&e),
                    url,
                });
            }
        };
        tracing::debug!(
            id,
            status = resp.status,
            content_type = resp.content_type.as_deref().unwrap_or(""),
            bytes = resp.body.len(),
            "response"
        );

        let result = match classify_response(&resp) {
            Verdict::Artifact => {
                let path = self
                    .store
                    .persist(id, &resp.body)
                    .map_err(|e| e.with_url(&url))?;
                FetchResult::Success {
                    path,
                    bytes: resp.body.len() as u64,
                    url,
                    sha256: sha256_bytes(&resp.body),
                }
            }
            Verdict::NotFound(reason) => FetchResult::NotFound { reason, url },
            Verdict::AuthRequired(reason) => FetchResult::AuthRequired { reason, url },
            Verdict::Transient(cause) => FetchResult::TransientError { cause, url },
        };
        Ok(result)
    }
}
