//! Certificate rendering.
//!
//! [`HttpCertificateRenderer`] posts the certificate fields as JSON to an
//! external rendering service and returns the document it responds with.
//! [`PlaintextCertificateRenderer`] produces the degraded text certificate
//! used when no service is configured or the service fails.

use std::time::Duration;

use async_trait::async_trait;

use crate::job::CertificatePayload;

/// HTTP request timeout for a single render call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Content type assumed when the service does not send one.
const DEFAULT_CONTENT_TYPE: &str = "application/pdf";

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The rendering service returned a non-2xx status code.
    #[error("Renderer returned HTTP {0}")]
    HttpStatus(u16),

    #[error("Renderer returned an empty document")]
    Empty,
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A rendered certificate ready to attach to an email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait CertificateRenderer: Send + Sync {
    async fn render(&self, certificate: &CertificatePayload) -> Result<RenderedDocument, RenderError>;
}

/// Render with `renderer`, falling back to the plaintext certificate on
/// failure.
pub async fn render_or_fallback(
    renderer: &dyn CertificateRenderer,
    certificate: &CertificatePayload,
) -> RenderedDocument {
    match renderer.render(certificate).await {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!(
                to = %certificate.to_email,
                event_title = %certificate.event_title,
                error = %e,
                "Certificate render failed, using plaintext certificate"
            );
            PlaintextCertificateRenderer::document(certificate)
        }
    }
}

fn file_stem(title: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    let stem = stem.trim_matches('-');
    if stem.is_empty() {
        "certificate".to_string()
    } else {
        format!("certificate-{stem}")
    }
}

// ---------------------------------------------------------------------------
// HttpCertificateRenderer
// ---------------------------------------------------------------------------

pub struct HttpCertificateRenderer {
    client: reqwest::Client,
    url: String,
}

impl HttpCertificateRenderer {
    pub fn new(url: impl Into<String>) -> Result<Self, RenderError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl CertificateRenderer for HttpCertificateRenderer {
    async fn render(&self, certificate: &CertificatePayload) -> Result<RenderedDocument, RenderError> {
        let body = serde_json::json!({
            "fullName": certificate.full_name,
            "college": certificate.college,
            "collegeId": certificate.college_id,
            "eventTitle": certificate.event_title,
        });
        let response = self.client.post(&self.url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(RenderError::HttpStatus(response.status().as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        let bytes = response.bytes().await?.to_vec();
        if bytes.is_empty() {
            return Err(RenderError::Empty);
        }

        let extension = if content_type.starts_with("application/pdf") { "pdf" } else { "bin" };
        Ok(RenderedDocument {
            filename: format!("{}.{extension}", file_stem(&certificate.event_title)),
            content_type,
            bytes,
        })
    }
}

// ---------------------------------------------------------------------------
// PlaintextCertificateRenderer
// ---------------------------------------------------------------------------

/// Renders a text certificate locally. Never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaintextCertificateRenderer;

impl PlaintextCertificateRenderer {
    pub fn document(certificate: &CertificatePayload) -> RenderedDocument {
        let mut text = format!(
            "CERTIFICATE OF PARTICIPATION\n\n\
             This certifies that {} participated in \"{}\".\n",
            certificate.full_name, certificate.event_title
        );
        if !certificate.college.is_empty() {
            text.push_str(&format!("Institution: {}\n", certificate.college));
        }
        if !certificate.college_id.is_empty() {
            text.push_str(&format!("Institution ID: {}\n", certificate.college_id));
        }
        RenderedDocument {
            filename: format!("{}.txt", file_stem(&certificate.event_title)),
            content_type: "text/plain; charset=utf-8".to_string(),
            bytes: text.into_bytes(),
        }
    }
}

#[async_trait]
impl CertificateRenderer for PlaintextCertificateRenderer {
    async fn render(&self, certificate: &CertificatePayload) -> Result<RenderedDocument, RenderError> {
        Ok(Self::document(certificate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    #[async_trait]
    impl CertificateRenderer for Broken {
        async fn render(&self, _: &CertificatePayload) -> Result<RenderedDocument, RenderError> {
            Err(RenderError::HttpStatus(503))
        }
    }

    fn certificate() -> CertificatePayload {
        CertificatePayload {
            to_email: "p1@example.com".into(),
            full_name: "Priya One".into(),
            college: "Example College".into(),
            college_id: String::new(),
            event_title: "Robo Race 2025".into(),
        }
    }

    #[test]
    fn plaintext_certificate_names_participant_and_event() {
        let doc = PlaintextCertificateRenderer::document(&certificate());
        let text = String::from_utf8(doc.bytes).unwrap();
        assert!(text.contains("Priya One"));
        assert!(text.contains("\"Robo Race 2025\""));
        assert!(text.contains("Institution: Example College"));
        assert!(!text.contains("Institution ID"));
        assert_eq!(doc.filename, "certificate-robo-race-2025.txt");
    }

    #[test]
    fn file_stem_falls_back_for_symbol_only_titles() {
        assert_eq!(file_stem("!!!"), "certificate");
    }

    #[tokio::test]
    async fn failed_render_falls_back_to_plaintext() {
        let doc = render_or_fallback(&Broken, &certificate()).await;
        assert!(doc.content_type.starts_with("text/plain"));
        assert_eq!(doc, PlaintextCertificateRenderer::document(&certificate()));
    }

    #[test]
    fn render_error_display_http_status() {
        assert_eq!(RenderError::HttpStatus(502).to_string(), "Renderer returned HTTP 502");
    }
}
