//! Command structs for engine operations.
//!
//! These types group parameters for write operations (transactions, accounts,
//! equipment), keeping call sites readable and avoiding long argument lists.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    AccountKind, EquipmentStatus, EventKind, Location, Money, TransactionKind, TransactionOrigin,
};

/// Create a transaction.
#[derive(Clone, Debug)]
pub struct NewTransactionCmd {
    pub company_id: Uuid,
    pub kind: TransactionKind,
    pub gross_amount: Money,
    pub competence_date: NaiveDate,
    pub account_id: Uuid,
    pub target_account_id: Option<Uuid>,
    pub posting_date: Option<NaiveDate>,
    pub category_id: Option<Uuid>,
    pub cost_center_id: Option<Uuid>,
    pub supplier_or_payer: Option<String>,
    pub description: Option<String>,
    pub origin: TransactionOrigin,
}

impl NewTransactionCmd {
    #[must_use]
    pub fn new(
        company_id: Uuid,
        kind: TransactionKind,
        gross_amount: Money,
        competence_date: NaiveDate,
        account_id: Uuid,
    ) -> Self {
        Self {
            company_id,
            kind,
            gross_amount,
            competence_date,
            account_id,
            target_account_id: None,
            posting_date: None,
            category_id: None,
            cost_center_id: None,
            supplier_or_payer: None,
            description: None,
            origin: TransactionOrigin::Manual,
        }
    }

    /// Shorthand for a transfer from `from` to `to`.
    #[must_use]
    pub fn transfer(
        company_id: Uuid,
        gross_amount: Money,
        competence_date: NaiveDate,
        from: Uuid,
        to: Uuid,
    ) -> Self {
        Self::new(
            company_id,
            TransactionKind::Transfer,
            gross_amount,
            competence_date,
            from,
        )
        .target_account_id(to)
    }

    #[must_use]
    pub fn target_account_id(mut self, id: Uuid) -> Self {
        self.target_account_id = Some(id);
        self
    }

    #[must_use]
    pub fn posting_date(mut self, date: NaiveDate) -> Self {
        self.posting_date = Some(date);
        self
    }

    #[must_use]
    pub fn category_id(mut self, id: Uuid) -> Self {
        self.category_id = Some(id);
        self
    }

    #[must_use]
    pub fn cost_center_id(mut self, id: Uuid) -> Self {
        self.cost_center_id = Some(id);
        self
    }

    #[must_use]
    pub fn supplier_or_payer(mut self, value: impl Into<String>) -> Self {
        self.supplier_or_payer = Some(value.into());
        self
    }

    #[must_use]
    pub fn description(mut self, value: impl Into<String>) -> Self {
        self.description = Some(value.into());
        self
    }

    #[must_use]
    pub fn origin(mut self, origin: TransactionOrigin) -> Self {
        self.origin = origin;
        self
    }
}

/// Partial update of a transaction. Absent fields are left unchanged.
#[derive(Clone, Debug, Default)]
pub struct TransactionPatch {
    pub kind: Option<TransactionKind>,
    pub gross_amount: Option<Money>,
    pub competence_date: Option<NaiveDate>,
    pub posting_date: Option<NaiveDate>,
    pub account_id: Option<Uuid>,
    pub target_account_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub cost_center_id: Option<Uuid>,
    pub supplier_or_payer: Option<String>,
    pub description: Option<String>,
}

impl TransactionPatch {
    #[must_use]
    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn gross_amount(mut self, amount: Money) -> Self {
        self.gross_amount = Some(amount);
        self
    }

    #[must_use]
    pub fn competence_date(mut self, date: NaiveDate) -> Self {
        self.competence_date = Some(date);
        self
    }

    #[must_use]
    pub fn account_id(mut self, id: Uuid) -> Self {
        self.account_id = Some(id);
        self
    }

    #[must_use]
    pub fn target_account_id(mut self, id: Uuid) -> Self {
        self.target_account_id = Some(id);
        self
    }

    #[must_use]
    pub fn category_id(mut self, id: Uuid) -> Self {
        self.category_id = Some(id);
        self
    }

    #[must_use]
    pub fn cost_center_id(mut self, id: Uuid) -> Self {
        self.cost_center_id = Some(id);
        self
    }

    #[must_use]
    pub fn description(mut self, value: impl Into<String>) -> Self {
        self.description = Some(value.into());
        self
    }

    /// Whether the patch can change the transaction's signed effects.
    pub fn touches_balances(&self) -> bool {
        self.kind.is_some()
            || self.gross_amount.is_some()
            || self.account_id.is_some()
            || self.target_account_id.is_some()
    }
}

/// Create a bank account.
#[derive(Clone, Debug)]
pub struct NewBankAccountCmd {
    pub company_id: Uuid,
    pub name: String,
    pub kind: AccountKind,
    pub opening_balance: Money,
}

impl NewBankAccountCmd {
    #[must_use]
    pub fn new(company_id: Uuid, name: impl Into<String>, kind: AccountKind) -> Self {
        Self {
            company_id,
            name: name.into(),
            kind,
            opening_balance: Money::ZERO,
        }
    }

    #[must_use]
    pub fn opening_balance(mut self, amount: Money) -> Self {
        self.opening_balance = amount;
        self
    }
}

/// Register a serialized equipment unit.
#[derive(Clone, Debug)]
pub struct NewEquipmentCmd {
    pub company_id: Uuid,
    pub serial: String,
    pub equipment_type: String,
    pub brand: String,
    pub model: String,
    pub location: Location,
}

impl NewEquipmentCmd {
    #[must_use]
    pub fn new(
        company_id: Uuid,
        serial: impl Into<String>,
        equipment_type: impl Into<String>,
        location: Location,
    ) -> Self {
        Self {
            company_id,
            serial: serial.into(),
            equipment_type: equipment_type.into(),
            brand: String::new(),
            model: String::new(),
            location,
        }
    }

    #[must_use]
    pub fn brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = brand.into();
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[derive(Clone, Debug)]
pub struct OpenMaintenanceCmd {
    pub reported_fault: String,
    pub diagnosis: Option<String>,
    pub estimated_cost: Option<Money>,
    pub notes: Option<String>,
}

impl OpenMaintenanceCmd {
    #[must_use]
    pub fn new(reported_fault: impl Into<String>) -> Self {
        Self {
            reported_fault: reported_fault.into(),
            diagnosis: None,
            estimated_cost: None,
            notes: None,
        }
    }

    #[must_use]
    pub fn diagnosis(mut self, value: impl Into<String>) -> Self {
        self.diagnosis = Some(value.into());
        self
    }

    #[must_use]
    pub fn estimated_cost(mut self, amount: Money) -> Self {
        self.estimated_cost = Some(amount);
        self
    }

    #[must_use]
    pub fn notes(mut self, value: impl Into<String>) -> Self {
        self.notes = Some(value.into());
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct CloseMaintenanceCmd {
    pub service_performed: Option<String>,
    pub final_cost: Option<Money>,
    pub notes: Option<String>,
    /// Defaults to `available`.
    pub new_status: Option<EquipmentStatus>,
}

impl CloseMaintenanceCmd {
    #[must_use]
    pub fn service_performed(mut self, value: impl Into<String>) -> Self {
        self.service_performed = Some(value.into());
        self
    }

    #[must_use]
    pub fn final_cost(mut self, amount: Money) -> Self {
        self.final_cost = Some(amount);
        self
    }

    #[must_use]
    pub fn notes(mut self, value: impl Into<String>) -> Self {
        self.notes = Some(value.into());
        self
    }

    #[must_use]
    pub fn new_status(mut self, status: EquipmentStatus) -> Self {
        self.new_status = Some(status);
        self
    }
}

#[derive(Clone, Debug)]
pub struct RegisterEventCmd {
    pub kind: EventKind,
    pub description: String,
}

impl RegisterEventCmd {
    #[must_use]
    pub fn new(kind: EventKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct TransferEquipmentCmd {
    pub destination: Location,
    pub reason: Option<String>,
}

impl TransferEquipmentCmd {
    #[must_use]
    pub fn new(destination: Location) -> Self {
        Self {
            destination,
            reason: None,
        }
    }

    #[must_use]
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

#[derive(Clone, Debug)]
pub struct NewServiceOrderCmd {
    pub company_id: Uuid,
    pub equipment_id: Option<Uuid>,
    pub service_type: String,
    pub description: Option<String>,
}

impl NewServiceOrderCmd {
    #[must_use]
    pub fn new(company_id: Uuid, service_type: impl Into<String>) -> Self {
        Self {
            company_id,
            equipment_id: None,
            service_type: service_type.into(),
            description: None,
        }
    }

    #[must_use]
    pub fn equipment_id(mut self, id: Uuid) -> Self {
        self.equipment_id = Some(id);
        self
    }

    #[must_use]
    pub fn description(mut self, value: impl Into<String>) -> Self {
        self.description = Some(value.into());
        self
    }
}
