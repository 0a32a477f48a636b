//! The certificate job wire format.
//!
//! Each job is stored on the queue as a single UTF-8 JSON string:
//!
//! ```text
//! {"type":"certificate",
//!  "payload":{"toEmail":..,"fullName":..,"college":..,"collegeId":..,"eventTitle":..},
//!  "enqueuedAt":1735689600000}
//! ```

use chrono::{DateTime, Utc};
use eventhub_core::types::DbId;
use serde::{Deserialize, Serialize};

/// Queue key (and `LISTEN` channel) for certificate emails.
pub const CERTIFICATE_QUEUE: &str = "certificate_emails";

/// Recipient and certificate details for one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificatePayload {
    pub to_email: String,
    pub full_name: String,
    #[serde(default)]
    pub college: String,
    #[serde(default)]
    pub college_id: String,
    pub event_title: String,
}

/// One serialized notification intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EmailJob {
    #[serde(rename = "certificate", rename_all = "camelCase")]
    Certificate {
        payload: CertificatePayload,
        /// Epoch milliseconds.
        enqueued_at: i64,
    },
}

impl EmailJob {
    /// A certificate job stamped with the current time.
    pub fn certificate(payload: CertificatePayload) -> Self {
        Self::certificate_at(payload, Utc::now())
    }

    pub fn certificate_at(payload: CertificatePayload, at: DateTime<Utc>) -> Self {
        Self::Certificate {
            payload,
            enqueued_at: at.timestamp_millis(),
        }
    }

    pub fn payload(&self) -> &CertificatePayload {
        match self {
            Self::Certificate { payload, .. } => payload,
        }
    }

    /// Serialize to the queue wire format.
    pub fn to_wire(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a queue item. Anything that does not match the wire format is
    /// an error and must be dropped by the consumer.
    pub fn from_wire(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// Dedupe key for the certificate of one participant in one revision of an
/// attendance sheet.
pub fn attendance_idempotency_key(document_id: DbId, revision: i32, user_id: DbId) -> String {
    format!("attendance:{document_id}:{revision}:{user_id}")
}
