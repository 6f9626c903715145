//! URL template with a single `{id}` placeholder.
//!
//! The template is validated once up front: exactly one placeholder, and the
//! rendered URL must parse as an absolute http(s) URL with a host.

use serde::{Deserialize, Serialize};

use crate::error::SweepError;

/// Placeholder substituted with the reference id.
pub const PLACEHOLDER: &str = "{id}";

/// Artifact file extension; files are named `<id>.pdf`.
const ARTIFACT_EXT: &str = "pdf";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UrlTemplate {
    raw: String,
    host: String,
}

impl UrlTemplate {
    pub fn parse(raw: &str) -> Result<Self, SweepError> {
        let invalid = |reason: &str| SweepError::Template {
            template: raw.to_string(),
            reason: reason.to_string(),
        };

        match raw.matches(PLACEHOLDER).count() {
            0 => return Err(invalid("missing {id} placeholder")),
            1 => {}
            _ => return Err(invalid("more than one {id} placeholder")),
        }

        let sample = raw.replace(PLACEHOLDER, "0");
        let parsed = url::Url::parse(&sample).map_err(|e| invalid(&e.to_string()))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(invalid("scheme must be http or https"));
        }
        let host = parsed
            .host_str()
            .ok_or_else(|| invalid("URL has no host"))?
            .to_ascii_lowercase();

        Ok(Self {
            raw: raw.to_string(),
            host,
        })
    }

    /// Target URL for `id`.
    pub fn render(&self, id: u64) -> String {
        self.raw.replace(PLACEHOLDER, &id.to_string())
    }

    /// Lowercased host every rendered URL points at.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl TryFrom<String> for UrlTemplate {
    type Error = SweepError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        UrlTemplate::parse(&raw)
    }
}

impl From<UrlTemplate> for String {
    fn from(t: UrlTemplate) -> Self {
        t.raw
    }
}

/// Deterministic artifact file name for a reference id.
pub fn artifact_filename(id: u64) -> String {
    format!("{}.{}", id, ARTIFACT_EXT)
}

#[cfg(test)]
mod tests {
    use super::*;

    const INVOICE: &str =
        "https://www.example.com/a/doc/?for_type=customer_invoice&for_id={id}";

    #[test]
    fn render_substitutes_id() {
        let t = UrlTemplate::parse(INVOICE).unwrap();
        assert_eq!(
            t.render(164847),
            "https://www.example.com/a/doc/?for_type=customer_invoice&for_id=164847"
        );
        assert_eq!(t.host(), "www.example.com");
    }

    #[test]
    fn placeholder_in_path() {
        let t = UrlTemplate::parse("http://127.0.0.1:8080/invoices/{id}.pdf").unwrap();
        assert_eq!(t.render(3), "http://127.0.0.1:8080/invoices/3.pdf");
        assert_eq!(t.host(), "127.0.0.1");
    }

    #[test]
    fn missing_placeholder_rejected() {
        let err = UrlTemplate::parse("https://example.com/doc").unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn duplicate_placeholder_rejected() {
        assert!(UrlTemplate::parse("https://example.com/{id}/{id}").is_err());
    }

    #[test]
    fn non_http_scheme_rejected() {
        assert!(UrlTemplate::parse("ftp://example.com/{id}").is_err());
        assert!(UrlTemplate::parse("not a url {id}").is_err());
    }

    #[test]
    fn artifact_name_is_id_dot_pdf() {
        assert_eq!(artifact_filename(42), "42.pdf");
    }
}
