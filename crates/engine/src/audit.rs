//! Audit trail collaborator.
//!
//! The engine emits one [`AuditEvent`] after every successful write. Sinks are
//! fire-and-forget: they cannot fail the operation that produced the event.

use std::fmt::Debug;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize)]
pub struct AuditEvent {
    pub event_type: &'static str,
    pub user_id: String,
    pub company_id: Uuid,
    pub entity_kind: &'static str,
    pub entity_id: Uuid,
    pub details: serde_json::Value,
    pub at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        event_type: &'static str,
        user_id: impl Into<String>,
        company_id: Uuid,
        entity_kind: &'static str,
        entity_id: Uuid,
    ) -> Self {
        Self {
            event_type,
            user_id: user_id.into(),
            company_id,
            entity_kind,
            entity_id,
            details: serde_json::Value::Null,
            at: Utc::now(),
        }
    }

    #[must_use]
    pub fn details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}

pub trait AuditSink: Send + Sync + Debug {
    fn emit(&self, event: AuditEvent);
}

/// Writes audit events to the `audit` tracing target.
#[derive(Debug, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn emit(&self, event: AuditEvent) {
        tracing::info!(
            target: "audit",
            event_type = event.event_type,
            user_id = %event.user_id,
            company_id = %event.company_id,
            entity_kind = event.entity_kind,
            entity_id = %event.entity_id,
            details = %event.details,
            "audit"
        );
    }
}
