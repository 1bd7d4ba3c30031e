//! Wire types of the `/api` surface.
//!
//! Amounts travel as decimal strings with two fractional digits
//! (`"1250.00"`), dates as ISO-8601 and identifiers as UUID strings.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable code (`not_found`, `invalid_amount`, …).
    pub code: String,
    pub error: String,
}

macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $value),+
                }
            }
        }
    };
}

pub mod company {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CompanyNew {
        pub name: String,
        pub tax_id: Option<String>,
    }
}

pub mod account {
    use super::*;

    wire_enum!(AccountKind {
        Checking => "checking",
        Savings => "savings",
        Cash => "cash",
        Credit => "credit",
    });

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BankAccountNew {
        pub name: String,
        pub kind: AccountKind,
        /// Defaults to `"0.00"`.
        pub opening_balance: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BankAccountView {
        pub id: Uuid,
        pub company_id: Uuid,
        pub name: String,
        pub kind: AccountKind,
        pub opening_balance: String,
        pub current_balance: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BankAccountList {
        pub accounts: Vec<BankAccountView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceCorrectionView {
        pub account_id: Uuid,
        pub before: String,
        pub after: String,
    }

    /// Result of a balance recomputation; empty on a healthy company.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct RecomputeResponse {
        pub corrections: Vec<BalanceCorrectionView>,
    }
}

pub mod category {
    use super::*;

    wire_enum!(CategoryKind {
        Income => "income",
        Expense => "expense",
        Transfer => "transfer",
    });

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryNew {
        pub name: String,
        pub kind: CategoryKind,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CostCenterNew {
        pub name: String,
    }
}

pub mod transaction {
    use chrono::NaiveDate;

    use super::*;

    wire_enum!(TransactionKind {
        Income => "income",
        Expense => "expense",
        Transfer => "transfer",
    });

    wire_enum!(TransactionState {
        Pending => "pending",
        Posted => "posted",
        Void => "void",
    });

    wire_enum!(TransactionOrigin {
        Manual => "manual",
        Import => "import",
        Messaging => "messaging",
        Extraction => "extraction",
    });

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        pub kind: TransactionKind,
        pub gross_amount: String,
        pub competence_date: NaiveDate,
        pub posting_date: Option<NaiveDate>,
        pub account_id: Uuid,
        /// Required for transfers, rejected otherwise.
        pub target_account_id: Option<Uuid>,
        pub category_id: Option<Uuid>,
        pub cost_center_id: Option<Uuid>,
        pub supplier_or_payer: Option<String>,
        pub description: Option<String>,
        pub origin: Option<TransactionOrigin>,
    }

    /// Partial update; absent fields keep their value.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionUpdate {
        pub kind: Option<TransactionKind>,
        pub gross_amount: Option<String>,
        pub competence_date: Option<NaiveDate>,
        pub posting_date: Option<NaiveDate>,
        pub account_id: Option<Uuid>,
        pub target_account_id: Option<Uuid>,
        pub category_id: Option<Uuid>,
        pub cost_center_id: Option<Uuid>,
        pub supplier_or_payer: Option<String>,
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub company_id: Uuid,
        pub kind: TransactionKind,
        pub state: TransactionState,
        pub origin: TransactionOrigin,
        pub gross_amount: String,
        pub competence_date: NaiveDate,
        pub posting_date: Option<NaiveDate>,
        pub account_id: Uuid,
        pub target_account_id: Option<Uuid>,
        pub category_id: Option<Uuid>,
        pub cost_center_id: Option<Uuid>,
        pub supplier_or_payer: Option<String>,
        pub description: Option<String>,
        pub revision: i64,
    }

    /// Query string of the list endpoint. `from`/`to` are inclusive.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionListQuery {
        pub from: Option<NaiveDate>,
        pub to: Option<NaiveDate>,
        pub account_id: Option<Uuid>,
        pub category_id: Option<Uuid>,
        pub state: Option<TransactionState>,
        pub kind: Option<TransactionKind>,
        pub limit: Option<u64>,
        pub cursor: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub transactions: Vec<TransactionView>,
        pub next_cursor: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionDeleted {
        pub ok: bool,
        pub balance_reversed: bool,
    }
}

pub mod dashboard {
    use chrono::NaiveDate;

    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct DashboardQuery {
        pub from: Option<NaiveDate>,
        pub to: Option<NaiveDate>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DashboardView {
        #[serde(rename = "total_receitas")]
        pub total_income: String,
        #[serde(rename = "total_despesas")]
        pub total_expense: String,
        #[serde(rename = "saldo")]
        pub net: String,
        #[serde(rename = "saldo_contas")]
        pub sum_account_balances: String,
    }
}

pub mod equipment {
    use super::*;

    wire_enum!(EquipmentStatus {
        Available => "available",
        InUse => "in_use",
        InMaintenance => "in_maintenance",
        InTransit => "in_transit",
        Decommissioned => "decommissioned",
    });

    wire_enum!(LocationKind {
        Warehouse => "warehouse",
        Customer => "customer",
        Technician => "technician",
    });

    wire_enum!(
        /// Kinds a client may register by hand.
        ManualEventKind {
            Observation => "observation",
            Inspection => "inspection",
            Adjustment => "adjustment",
            PartSwap => "part_swap",
            Cleaning => "cleaning",
            Warranty => "warranty",
            Other => "other",
        }
    );

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LocationBody {
        pub kind: LocationKind,
        pub ref_id: Option<Uuid>,
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EquipmentNew {
        pub serial: String,
        pub equipment_type: String,
        #[serde(default)]
        pub brand: String,
        #[serde(default)]
        pub model: String,
        pub location: LocationBody,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct EquipmentListQuery {
        pub status: Option<EquipmentStatus>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MaintenanceOpen {
        pub reported_fault: String,
        pub diagnosis: Option<String>,
        pub estimated_cost: Option<String>,
        pub notes: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct MaintenanceClose {
        pub service_performed: Option<String>,
        pub final_cost: Option<String>,
        pub notes: Option<String>,
        /// Defaults to `available`.
        pub new_status: Option<EquipmentStatus>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EventNew {
        pub kind: ManualEventKind,
        pub description: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferRequest {
        pub destination_kind: LocationKind,
        pub destination_ref: Option<Uuid>,
        pub destination_name: String,
        pub reason: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ArrivalRequest {
        pub status: EquipmentStatus,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct DecommissionRequest {
        #[serde(default)]
        pub reason: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ServiceOrderNew {
        pub equipment_id: Option<Uuid>,
        pub service_type: String,
        pub description: Option<String>,
    }
}
