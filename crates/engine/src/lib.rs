//! Ledger and equipment-history engine.
//!
//! [`Engine`] is the only writer of bank-account balances and of equipment
//! status. Every operation takes the resolved [`Caller`] and is scoped to the
//! caller's companies.

pub use audit::{AuditEvent, AuditSink, TracingAuditSink};
pub use bank_accounts::{AccountKind, BankAccount};
pub use caller::{Caller, Role};
pub use categories::{Category, CategoryKind};
pub use commands::{
    CloseMaintenanceCmd, NewBankAccountCmd, NewEquipmentCmd, NewServiceOrderCmd,
    NewTransactionCmd, OpenMaintenanceCmd, RegisterEventCmd, TransactionPatch,
    TransferEquipmentCmd,
};
pub use companies::Company;
pub use cost_centers::CostCenter;
pub use equipment::{Equipment, EquipmentStatus, Location, LocationKind, Transition};
pub use equipment_events::{EquipmentEvent, EventKind, EventRefs};
pub use error::EngineError;
pub use maintenance::{MaintenanceRecord, MaintenanceStatus};
pub use money::Money;
pub use ops::{
    BalanceCorrection, Dashboard, DashboardWindow, DeleteAck, Engine, EngineBuilder,
    ReconcileOutcome, TransactionListFilter,
};
pub use service_orders::{ServiceOrder, ServiceOrderStatus};
pub use store::Store;
pub use timeline::{LifetimeHistory, TimelineEntry, TimelineItem};
pub use transactions::{
    AccountEffect, Transaction, TransactionKind, TransactionOrigin, TransactionState,
    signed_effects,
};

mod audit;
mod bank_accounts;
mod caller;
mod categories;
mod commands;
mod companies;
mod company_members;
mod cost_centers;
mod equipment;
mod equipment_events;
mod error;
mod maintenance;
mod money;
mod ops;
mod service_orders;
mod store;
mod timeline;
mod transactions;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
