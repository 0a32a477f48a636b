//! Certificate notification pipeline.
//!
//! - [`job`] -- the [`EmailJob`] wire format stored on the durable queue.
//! - [`producer`] -- appends jobs to the queue inside the caller's
//!   transaction.
//! - [`delivery`] -- external collaborators: certificate rendering and
//!   SMTP mail.
//! - [`worker`] -- the long-running consumer that leases one job at a
//!   time, renders the certificate and mails it.

pub mod delivery;
pub mod job;
pub mod producer;
pub mod worker;

pub use delivery::email::{EmailConfig, EmailError, LogMailer, Mailer, OutgoingEmail, SmtpMailer};
pub use delivery::renderer::{
    CertificateRenderer, HttpCertificateRenderer, PlaintextCertificateRenderer, RenderError,
    RenderedDocument,
};
pub use job::{attendance_idempotency_key, CertificatePayload, EmailJob, CERTIFICATE_QUEUE};
pub use producer::{enqueue_certificates, KeyedJob};
pub use worker::{CertificateWorker, JobOutcome, WorkerConfig};
