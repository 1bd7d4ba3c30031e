use std::sync::Arc;

use metrics::counter;
use sea_orm::DatabaseConnection;

use crate::{AuditEvent, AuditSink, ResultEngine, Store, TracingAuditSink};

mod access;
mod accounts;
mod balances;
mod categories;
mod companies;
mod dashboard;
mod equipment;
mod equipment_events;
mod history;
mod maintenance;
mod service_orders;
mod transactions;

pub use balances::BalanceCorrection;
pub use dashboard::{Dashboard, DashboardWindow};
pub use history::ReconcileOutcome;
pub use transactions::{DeleteAck, TransactionListFilter};

#[derive(Debug)]
pub struct Engine {
    store: Store,
    audit: Arc<dyn AuditSink>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    fn emit(&self, event: AuditEvent) {
        self.audit.emit(event);
    }

    /// A ledger write was only partially applied. `recompute` repairs it.
    fn ledger_lag(&self, operation: &'static str, detail: &str) {
        tracing::error!(operation, detail, "ledger integrity lag");
        counter!("ledger.integrity_lag", 1);
    }

    /// An equipment write was only partially applied. `reconcile` repairs it.
    fn equipment_lag(&self, operation: &'static str, detail: &str) {
        tracing::error!(operation, detail, "equipment integrity lag");
        counter!("equipment.integrity_lag", 1);
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    audit: Option<Arc<dyn AuditSink>>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Replace the default tracing audit sink.
    pub fn audit(mut self, sink: Arc<dyn AuditSink>) -> EngineBuilder {
        self.audit = Some(sink);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            store: Store::new(self.database),
            audit: self
                .audit
                .unwrap_or_else(|| Arc::new(TracingAuditSink)),
        })
    }
}
