use std::sync::Arc;
use std::time::Duration;

use eventhub_notify::{
    CertificateRenderer, CertificateWorker, EmailConfig, HttpCertificateRenderer, LogMailer,
    Mailer, PlaintextCertificateRenderer, SmtpMailer, WorkerConfig,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How long a job in flight may take to finish after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eventhub_worker=debug,eventhub_notify=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = eventhub_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    eventhub_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database connection pool created");

    let config = WorkerConfig::from_env();

    let renderer: Arc<dyn CertificateRenderer> = match &config.renderer_url {
        Some(url) => {
            tracing::info!(url = %url, "Rendering certificates over HTTP");
            Arc::new(HttpCertificateRenderer::new(url.clone()).expect("Invalid renderer client"))
        }
        None => {
            tracing::info!("CERTIFICATE_RENDERER_URL not set, sending plaintext certificates");
            Arc::new(PlaintextCertificateRenderer)
        }
    };

    let mailer: Arc<dyn Mailer> = match EmailConfig::from_env() {
        Some(email) => {
            tracing::info!(host = %email.smtp_host, port = email.smtp_port, "Sending mail over SMTP");
            Arc::new(SmtpMailer::new(&email).expect("Invalid SMTP configuration"))
        }
        None => {
            tracing::warn!("SMTP_HOST not set, certificate emails will only be logged");
            Arc::new(LogMailer)
        }
    };

    let worker = CertificateWorker::new(pool, renderer, mailer, config);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn({
        let cancel = cancel.clone();
        async move { worker.run(cancel).await }
    });

    shutdown_signal().await;
    cancel.cancel();
    if tokio::time::timeout(SHUTDOWN_GRACE, handle).await.is_err() {
        tracing::warn!("Certificate worker did not stop in time");
    }
    tracing::info!("Worker shutdown complete");
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT (Ctrl-C), shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
