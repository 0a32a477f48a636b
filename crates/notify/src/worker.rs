//! Certificate delivery worker.
//!
//! Leases one job at a time from the `certificate_emails` queue, renders the
//! certificate (plaintext fallback on render failure), mails it, and then
//! acks, releases for retry, or fails the job. Between jobs it blocks on
//! `LISTEN certificate_emails`, waking at least every poll interval so that
//! expired leases and retry delays are picked up without a notification.

use std::sync::Arc;
use std::time::Duration;

use eventhub_core::types::DbId;
use eventhub_db::models::email_job::EmailJobRow;
use eventhub_db::repositories::EmailJobRepo;
use sqlx::postgres::PgListener;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use crate::delivery::email::{Mailer, OutgoingEmail};
use crate::delivery::renderer::{render_or_fallback, CertificateRenderer, RenderedDocument};
use crate::job::{CertificatePayload, EmailJob, CERTIFICATE_QUEUE};

const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
const DEFAULT_LEASE_SECS: u64 = 120;
const DEFAULT_MAX_ATTEMPTS: i32 = 3;
const DEFAULT_RETRY_BASE_SECS: u64 = 30;

/// Upper bound on the delay between delivery attempts.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(3600);

/// Worker tuning, loaded from the environment.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum time to block waiting for a notification.
    pub poll_interval: Duration,
    /// How long a leased job stays hidden from other workers.
    pub lease: Duration,
    /// Delivery attempts before a job is failed for good.
    pub max_attempts: i32,
    /// Delay before the first retry; doubles per attempt.
    pub retry_base: Duration,
    /// External certificate renderer; `None` selects the plaintext renderer.
    pub renderer_url: Option<String>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            lease: Duration::from_secs(DEFAULT_LEASE_SECS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_base: Duration::from_secs(DEFAULT_RETRY_BASE_SECS),
            renderer_url: None,
        }
    }
}

impl WorkerConfig {
    /// | Variable                     | Default |
    /// |------------------------------|---------|
    /// | `WORKER_POLL_INTERVAL_SECS`  | `5`     |
    /// | `WORKER_LEASE_SECS`          | `120`   |
    /// | `WORKER_MAX_ATTEMPTS`        | `3`     |
    /// | `WORKER_RETRY_BASE_SECS`     | `30`    |
    /// | `CERTIFICATE_RENDERER_URL`   | unset   |
    pub fn from_env() -> Self {
        let secs = |name: &str, default: u64| {
            Duration::from_secs(
                std::env::var(name)
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(default),
            )
        };
        Self {
            poll_interval: secs("WORKER_POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS),
            lease: secs("WORKER_LEASE_SECS", DEFAULT_LEASE_SECS),
            max_attempts: std::env::var("WORKER_MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_ATTEMPTS)
                .max(1),
            retry_base: secs("WORKER_RETRY_BASE_SECS", DEFAULT_RETRY_BASE_SECS),
            renderer_url: std::env::var("CERTIFICATE_RENDERER_URL")
                .ok()
                .filter(|u| !u.trim().is_empty()),
        }
    }

    /// Delay before the next attempt after `attempts` failed ones.
    pub fn retry_delay(&self, attempts: i32) -> Duration {
        let exponent = attempts.saturating_sub(1).clamp(0, 16) as u32;
        self.retry_base
            .saturating_mul(2u32.saturating_pow(exponent))
            .min(MAX_RETRY_DELAY)
    }
}

/// What happened to one leased job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Delivered,
    /// Returned to the queue, available again after `retry_after`.
    Retrying { error: String, retry_after: Duration },
    /// Taken out of circulation (malformed, permanent error or attempts
    /// exhausted).
    Failed { error: String },
}

/// The email sent for one certificate.
pub fn certificate_email(certificate: &CertificatePayload, document: RenderedDocument) -> OutgoingEmail {
    OutgoingEmail {
        to: certificate.to_email.clone(),
        subject: format!("Your certificate for {}", certificate.event_title),
        body: format!(
            "Hi {},\n\nThank you for taking part in {}. Your certificate of participation is attached.\n",
            certificate.full_name, certificate.event_title
        ),
        attachment: Some(document),
    }
}

pub struct CertificateWorker {
    pool: PgPool,
    renderer: Arc<dyn CertificateRenderer>,
    mailer: Arc<dyn Mailer>,
    config: WorkerConfig,
}

impl CertificateWorker {
    pub fn new(
        pool: PgPool,
        renderer: Arc<dyn CertificateRenderer>,
        mailer: Arc<dyn Mailer>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            pool,
            renderer,
            mailer,
            config,
        }
    }

    /// Run the consumer loop until the cancellation token is triggered.
    ///
    /// A job already leased when cancellation arrives is finished first.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut listener = self.listen().await;
        tracing::info!(
            queue = CERTIFICATE_QUEUE,
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            lease_secs = self.config.lease.as_secs(),
            max_attempts = self.config.max_attempts,
            listening = listener.is_some(),
            "Certificate worker started",
        );

        loop {
            if cancel.is_cancelled() {
                break;
            }
            match self.process_next().await {
                // Keep draining while there is work.
                Ok(Some(_)) => continue,
                Ok(None) => {}
                Err(e) => tracing::error!(error = %e, "Certificate queue poll failed"),
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = self.wait_for_work(&mut listener) => {}
            }
        }
        tracing::info!("Certificate worker shutting down");
    }

    /// Lease and handle a single job. Returns `None` when the queue has
    /// nothing available.
    pub async fn process_next(&self) -> Result<Option<(DbId, JobOutcome)>, sqlx::Error> {
        let Some(row) =
            EmailJobRepo::lease_next(&self.pool, CERTIFICATE_QUEUE, self.config.lease).await?
        else {
            return Ok(None);
        };

        let outcome = self.handle(&row).await;
        let settled = match &outcome {
            JobOutcome::Delivered => EmailJobRepo::ack(&self.pool, row.id, row.attempts).await?,
            JobOutcome::Retrying { error, retry_after } => {
                EmailJobRepo::release(&self.pool, row.id, row.attempts, error, *retry_after).await?
            }
            JobOutcome::Failed { error } => {
                EmailJobRepo::fail(&self.pool, row.id, row.attempts, error).await?
            }
        };
        if !settled {
            tracing::warn!(
                job_id = row.id,
                attempts = row.attempts,
                "Lease lost before the job was settled, outcome discarded",
            );
            return Ok(Some((row.id, outcome)));
        }

        match &outcome {
            JobOutcome::Delivered => {
                tracing::info!(job_id = row.id, attempts = row.attempts, "Certificate job delivered");
            }
            JobOutcome::Retrying { error, retry_after } => {
                tracing::warn!(
                    job_id = row.id,
                    attempts = row.attempts,
                    retry_after_secs = retry_after.as_secs(),
                    error = %error,
                    "Certificate delivery failed, will retry",
                );
            }
            JobOutcome::Failed { error } => {
                tracing::error!(
                    job_id = row.id,
                    attempts = row.attempts,
                    error = %error,
                    "Certificate job failed permanently",
                );
            }
        }
        Ok(Some((row.id, outcome)))
    }

    async fn handle(&self, row: &EmailJobRow) -> JobOutcome {
        let job = match EmailJob::from_wire(&row.payload) {
            Ok(job) => job,
            Err(e) => {
                return JobOutcome::Failed {
                    error: format!("Malformed job: {e}"),
                }
            }
        };

        let certificate = job.payload();
        let document = render_or_fallback(self.renderer.as_ref(), certificate).await;
        let email = certificate_email(certificate, document);

        match self.mailer.send(&email).await {
            Ok(()) => JobOutcome::Delivered,
            Err(e) if e.is_retryable() && row.attempts < self.config.max_attempts => {
                JobOutcome::Retrying {
                    error: e.to_string(),
                    retry_after: self.config.retry_delay(row.attempts),
                }
            }
            Err(e) => JobOutcome::Failed {
                error: e.to_string(),
            },
        }
    }

    async fn listen(&self) -> Option<PgListener> {
        let mut listener = match PgListener::connect_with(&self.pool).await {
            Ok(l) => l,
            Err(e) => {
                tracing::warn!(error = %e, "LISTEN unavailable, falling back to polling");
                return None;
            }
        };
        if let Err(e) = listener.listen(CERTIFICATE_QUEUE).await {
            tracing::warn!(error = %e, "LISTEN unavailable, falling back to polling");
            return None;
        }
        Some(listener)
    }

    async fn wait_for_work(&self, listener: &mut Option<PgListener>) {
        let Some(l) = listener.as_mut() else {
            tokio::time::sleep(self.config.poll_interval).await;
            return;
        };
        match tokio::time::timeout(self.config.poll_interval, l.recv()).await {
            Ok(Ok(_)) | Err(_) => {}
            Ok(Err(e)) => {
                // recv reconnects on the next call; back off meanwhile.
                tracing::warn!(error = %e, "Queue notification stream failed");
                tokio::time::sleep(self.config.poll_interval).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_secs: u64) -> WorkerConfig {
        WorkerConfig {
            retry_base: Duration::from_secs(base_secs),
            ..WorkerConfig::default()
        }
    }

    #[test]
    fn retry_delay_doubles_per_attempt() {
        let c = config(30);
        assert_eq!(c.retry_delay(1), Duration::from_secs(30));
        assert_eq!(c.retry_delay(2), Duration::from_secs(60));
        assert_eq!(c.retry_delay(3), Duration::from_secs(120));
    }

    #[test]
    fn retry_delay_is_capped() {
        assert_eq!(config(30).retry_delay(40), MAX_RETRY_DELAY);
    }

    #[test]
    fn zero_base_retries_immediately() {
        assert_eq!(config(0).retry_delay(2), Duration::ZERO);
    }

    #[test]
    fn certificate_email_addresses_participant() {
        let certificate = CertificatePayload {
            to_email: "p1@example.com".into(),
            full_name: "Priya One".into(),
            college: String::new(),
            college_id: String::new(),
            event_title: "Quiz".into(),
        };
        let doc = crate::delivery::renderer::PlaintextCertificateRenderer::document(&certificate);
        let email = certificate_email(&certificate, doc);
        assert_eq!(email.to, "p1@example.com");
        assert_eq!(email.subject, "Your certificate for Quiz");
        assert!(email.body.starts_with("Hi Priya One"));
        assert!(email.attachment.is_some());
    }
}
