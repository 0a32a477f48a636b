use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use eventhub_db::models::email_job::NewEmailJob;
use eventhub_db::repositories::EmailJobRepo;
use eventhub_notify::delivery::email::{EmailConfig, EmailError, Mailer, OutgoingEmail, SmtpMailer};
use eventhub_notify::delivery::renderer::{
    CertificateRenderer, PlaintextCertificateRenderer, RenderError, RenderedDocument,
};
use eventhub_notify::{
    enqueue_certificates, CertificatePayload, CertificateWorker, EmailJob, JobOutcome, KeyedJob,
    WorkerConfig, CERTIFICATE_QUEUE,
};
use sqlx::{Connection, PgPool};

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl RecordingMailer {
    fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

struct PdfRenderer;

#[async_trait]
impl CertificateRenderer for PdfRenderer {
    async fn render(&self, c: &CertificatePayload) -> Result<RenderedDocument, RenderError> {
        Ok(RenderedDocument {
            filename: "certificate.pdf".into(),
            content_type: "application/pdf".into(),
            bytes: format!("%PDF {}", c.full_name).into_bytes(),
        })
    }
}

struct DownRenderer;

#[async_trait]
impl CertificateRenderer for DownRenderer {
    async fn render(&self, _: &CertificatePayload) -> Result<RenderedDocument, RenderError> {
        Err(RenderError::HttpStatus(503))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn certificate(email: &str, name: &str) -> CertificatePayload {
    CertificatePayload {
        to_email: email.into(),
        full_name: name.into(),
        college: "Example College".into(),
        college_id: "EX-1".into(),
        event_title: "Hackathon".into(),
    }
}

fn keyed(key: &str, email: &str, name: &str) -> KeyedJob {
    KeyedJob {
        idempotency_key: key.into(),
        job: EmailJob::certificate(certificate(email, name)),
    }
}

async fn seed(pool: &PgPool, jobs: &[KeyedJob]) {
    let mut conn = pool.acquire().await.unwrap();
    let added = enqueue_certificates(&mut conn, jobs).await;
    assert_eq!(added, jobs.len() as u64);
}

fn fast_config() -> WorkerConfig {
    WorkerConfig {
        poll_interval: Duration::from_millis(50),
        retry_base: Duration::ZERO,
        ..WorkerConfig::default()
    }
}

fn worker(
    pool: &PgPool,
    renderer: Arc<dyn CertificateRenderer>,
    mailer: Arc<dyn Mailer>,
    config: WorkerConfig,
) -> CertificateWorker {
    CertificateWorker::new(pool.clone(), renderer, mailer, config)
}

// ---------------------------------------------------------------------------
// Producer
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn enqueue_skips_duplicate_idempotency_keys(pool: PgPool) {
    seed(&pool, &[keyed("attendance:1:1:10", "a@x.io", "A")]).await;

    let mut conn = pool.acquire().await.unwrap();
    let added = enqueue_certificates(
        &mut conn,
        &[keyed("attendance:1:1:10", "a@x.io", "A"), keyed("attendance:1:1:11", "b@x.io", "B")],
    )
    .await;
    assert_eq!(added, 1);

    let rows = EmailJobRepo::list_queue(&pool, CERTIFICATE_QUEUE).await.unwrap();
    assert_eq!(rows.len(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn enqueue_rolls_back_with_the_surrounding_transaction(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let mut tx = conn.begin().await.unwrap();
    let added = enqueue_certificates(&mut tx, &[keyed("attendance:1:1:10", "a@x.io", "A")]).await;
    assert_eq!(added, 1);
    tx.rollback().await.unwrap();

    let rows = EmailJobRepo::list_queue(&pool, CERTIFICATE_QUEUE).await.unwrap();
    assert!(rows.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn stored_payload_is_the_wire_format(pool: PgPool) {
    seed(&pool, &[keyed("k1", "a@x.io", "Asha")]).await;

    let rows = EmailJobRepo::list_queue(&pool, CERTIFICATE_QUEUE).await.unwrap();
    let value: serde_json::Value = serde_json::from_str(&rows[0].payload).unwrap();
    assert_eq!(value["type"], "certificate");
    assert_eq!(value["payload"]["toEmail"], "a@x.io");
    assert_eq!(value["payload"]["fullName"], "Asha");
    assert!(value["enqueuedAt"].as_i64().unwrap() > 0);
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn delivered_job_is_acked(pool: PgPool) {
    seed(&pool, &[keyed("k1", "p1@example.com", "P1")]).await;
    let mailer = Arc::new(RecordingMailer::default());
    let w = worker(&pool, Arc::new(PdfRenderer), mailer.clone(), fast_config());

    let (id, outcome) = w.process_next().await.unwrap().expect("one job available");
    assert_eq!(outcome, JobOutcome::Delivered);

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "p1@example.com");
    assert_eq!(sent[0].attachment.as_ref().unwrap().content_type, "application/pdf");

    let row = EmailJobRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert!(row.delivered_at.is_some());
    assert!(row.leased_until.is_none());
    assert_eq!(row.attempts, 1);

    assert!(w.process_next().await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn jobs_are_consumed_in_fifo_order(pool: PgPool) {
    seed(
        &pool,
        &[keyed("k1", "first@x.io", "First"), keyed("k2", "second@x.io", "Second")],
    )
    .await;
    let mailer = Arc::new(RecordingMailer::default());
    let w = worker(&pool, Arc::new(PdfRenderer), mailer.clone(), fast_config());

    w.process_next().await.unwrap();
    w.process_next().await.unwrap();

    let to: Vec<String> = mailer.sent().into_iter().map(|e| e.to).collect();
    assert_eq!(to, vec!["first@x.io", "second@x.io"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn malformed_job_is_failed_without_retry(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    EmailJobRepo::enqueue(
        &mut conn,
        CERTIFICATE_QUEUE,
        &[NewEmailJob {
            payload: "{not json".into(),
            idempotency_key: "bad".into(),
        }],
    )
    .await
    .unwrap();

    let mailer = Arc::new(RecordingMailer::default());
    let w = worker(&pool, Arc::new(PdfRenderer), mailer.clone(), fast_config());

    let (id, outcome) = w.process_next().await.unwrap().unwrap();
    assert_matches!(outcome, JobOutcome::Failed { error } if error.starts_with("Malformed job"));
    assert!(mailer.sent().is_empty());

    let row = EmailJobRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert!(row.failed_at.is_some());
    assert!(w.process_next().await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn render_failure_sends_plaintext_certificate(pool: PgPool) {
    seed(&pool, &[keyed("k1", "p1@example.com", "P1")]).await;
    let mailer = Arc::new(RecordingMailer::default());
    let w = worker(&pool, Arc::new(DownRenderer), mailer.clone(), fast_config());

    let (_, outcome) = w.process_next().await.unwrap().unwrap();
    assert_eq!(outcome, JobOutcome::Delivered);

    let attachment = mailer.sent()[0].attachment.clone().unwrap();
    assert_eq!(
        attachment,
        PlaintextCertificateRenderer::document(&certificate("p1@example.com", "P1"))
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn send_failure_is_retried_then_failed(pool: PgPool) {
    seed(&pool, &[keyed("k1", "p1@example.com", "P1")]).await;

    // Nothing listens on port 1, so every send fails with a transient
    // connection error.
    let unreachable = SmtpMailer::new(&EmailConfig {
        smtp_host: "localhost".into(),
        smtp_port: 1,
        from_address: "certificates@eventhub.local".into(),
        smtp_user: None,
        smtp_password: None,
    })
    .unwrap();
    let config = WorkerConfig {
        max_attempts: 2,
        ..fast_config()
    };
    let w = worker(&pool, Arc::new(PdfRenderer), Arc::new(unreachable), config);

    let (id, first) = w.process_next().await.unwrap().unwrap();
    assert_matches!(first, JobOutcome::Retrying { .. });
    let row = EmailJobRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert!(row.failed_at.is_none());
    assert!(row.last_error.is_some());

    let (again, second) = w.process_next().await.unwrap().unwrap();
    assert_eq!(again, id);
    assert_matches!(second, JobOutcome::Failed { .. });

    let row = EmailJobRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(row.attempts, 2);
    assert!(row.failed_at.is_some());
    assert!(row.delivered_at.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn retry_delay_hides_released_job(pool: PgPool) {
    seed(&pool, &[keyed("k1", "p1@example.com", "P1")]).await;
    let leased = EmailJobRepo::lease_next(&pool, CERTIFICATE_QUEUE, Duration::from_secs(60))
        .await
        .unwrap()
        .unwrap();
    let settled = EmailJobRepo::release(
        &pool,
        leased.id,
        leased.attempts,
        "smtp down",
        Duration::from_secs(600),
    )
    .await
    .unwrap();
    assert!(settled);

    let next = EmailJobRepo::lease_next(&pool, CERTIFICATE_QUEUE, Duration::from_secs(60))
        .await
        .unwrap();
    assert!(next.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn leased_job_is_hidden_until_lease_expires(pool: PgPool) {
    seed(&pool, &[keyed("k1", "p1@example.com", "P1")]).await;

    // A consumer leases the job and crashes without acking.
    let crashed = EmailJobRepo::lease_next(&pool, CERTIFICATE_QUEUE, Duration::from_millis(200))
        .await
        .unwrap()
        .unwrap();
    let hidden = EmailJobRepo::lease_next(&pool, CERTIFICATE_QUEUE, Duration::from_secs(60))
        .await
        .unwrap();
    assert!(hidden.is_none());

    tokio::time::sleep(Duration::from_millis(400)).await;

    let mailer = Arc::new(RecordingMailer::default());
    let w = worker(&pool, Arc::new(PdfRenderer), mailer.clone(), fast_config());
    let (id, outcome) = w.process_next().await.unwrap().unwrap();
    assert_eq!(id, crashed.id);
    assert_eq!(outcome, JobOutcome::Delivered);

    let row = EmailJobRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(row.attempts, 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn stale_consumer_cannot_settle_a_redelivered_job(pool: PgPool) {
    seed(&pool, &[keyed("k1", "p1@example.com", "P1")]).await;

    let slow = EmailJobRepo::lease_next(&pool, CERTIFICATE_QUEUE, Duration::from_millis(200))
        .await
        .unwrap()
        .unwrap();
    tokio::time::sleep(Duration::from_millis(400)).await;
    let fast = EmailJobRepo::lease_next(&pool, CERTIFICATE_QUEUE, Duration::from_secs(60))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fast.id, slow.id);
    assert_eq!(fast.attempts, slow.attempts + 1);

    // The expired lease cannot touch the job while the new lease holds it.
    let released = EmailJobRepo::release(
        &pool,
        slow.id,
        slow.attempts,
        "smtp down",
        Duration::from_secs(600),
    )
    .await
    .unwrap();
    assert!(!released);
    let row = EmailJobRepo::find_by_id(&pool, fast.id).await.unwrap().unwrap();
    assert!(row.leased_until.is_some());
    assert!(row.last_error.is_none());

    assert!(EmailJobRepo::ack(&pool, fast.id, fast.attempts).await.unwrap());

    // Nor can it fail the job once it was delivered.
    let failed = EmailJobRepo::fail(&pool, slow.id, slow.attempts, "timeout").await.unwrap();
    assert!(!failed);
    assert!(!EmailJobRepo::ack(&pool, fast.id, fast.attempts).await.unwrap());
    let row = EmailJobRepo::find_by_id(&pool, fast.id).await.unwrap().unwrap();
    assert!(row.delivered_at.is_some());
    assert!(row.failed_at.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn run_delivers_notified_jobs_and_stops_on_cancel(pool: PgPool) {
    let mailer = Arc::new(RecordingMailer::default());
    let w = Arc::new(worker(&pool, Arc::new(PdfRenderer), mailer.clone(), fast_config()));
    let cancel = tokio_util::sync::CancellationToken::new();

    let handle = {
        let w = Arc::clone(&w);
        let cancel = cancel.clone();
        tokio::spawn(async move { w.run(cancel).await })
    };

    seed(&pool, &[keyed("k1", "p1@example.com", "P1")]).await;

    for _ in 0..50 {
        if !mailer.sent().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(mailer.sent().len(), 1);

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("worker stops after cancel")
        .unwrap();
}
