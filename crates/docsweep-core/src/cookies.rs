//! Session cookies supplied by the operator.
//!
//! Cookies are copied out of a logged-in browser session into a small TOML
//! file; the fetcher never logs in itself.
//!
//! ```toml
//! domain = "www.example.com"
//!
//! [cookies]
//! sessionid = "abc123"
//! csrftoken = "xyz"
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::SweepError;

#[derive(Debug, Deserialize)]
struct CookieFile {
    domain: String,
    #[serde(default)]
    cookies: BTreeMap<String, String>,
}

/// Validated cookie set scoped to one domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieJar {
    domain: String,
    cookies: BTreeMap<String, String>,
}

impl CookieJar {
    pub fn new(domain: &str, cookies: BTreeMap<String, String>) -> Result<Self, String> {
        let domain = domain.trim().trim_start_matches('.').to_ascii_lowercase();
        if domain.is_empty() {
            return Err("domain must not be empty".to_string());
        }
        if cookies.is_empty() {
            return Err("no cookies defined".to_string());
        }
        for (name, value) in &cookies {
            if !is_token(name) {
                return Err(format!("invalid cookie name {:?}", name));
            }
            if !is_cookie_value(value) {
                return Err(format!("invalid value for cookie {:?}", name));
            }
        }
        Ok(Self { domain, cookies })
    }

    /// Load and validate a cookie file.
    pub fn load(path: &Path) -> Result<Self, SweepError> {
        let fail = |reason: String| SweepError::Cookies {
            path: path.to_path_buf(),
            reason,
        };
        let data = fs::read_to_string(path).map_err(|e| fail(e.to_string()))?;
        let file: CookieFile = toml::from_str(&data).map_err(|e| fail(e.to_string()))?;
        Self::new(&file.domain, file.cookies).map_err(fail)
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.cookies.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// True if `host` is the cookie domain or one of its subdomains.
    pub fn applies_to(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        host == self.domain
            || host
                .strip_suffix(self.domain.as_str())
                .is_some_and(|prefix| prefix.ends_with('.'))
    }

    /// `Cookie` header value: `a=1; b=2`, sorted by name.
    pub fn header_value(&self) -> String {
        self.cookies
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// RFC 6265 / RFC 7230 token.
fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| {
            b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
        })
}

fn is_cookie_value(s: &str) -> bool {
    s.bytes()
        .all(|b| (0x21..=0x7e).contains(&b) && !matches!(b, b'"' | b',' | b';' | b'\\'))
}
