use api_types::ErrorBody;
use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::{EngineError, Money};

pub use identity::{DatabaseIdentity, Identity};
pub use server::{ServerState, router, run, run_with_listener, spawn_with_listener};

mod accounts;
mod categories;
mod dashboard;
mod equipment;
mod identity;
mod server;
mod transactions;

pub mod types {
    pub mod account {
        pub use api_types::account::{
            AccountKind, BalanceCorrectionView, BankAccountList, BankAccountNew, BankAccountView,
            RecomputeResponse,
        };
    }

    pub mod category {
        pub use api_types::category::{CategoryKind, CategoryNew, CostCenterNew};
        pub use engine::{Category, CostCenter};
    }

    pub mod transaction {
        pub use api_types::transaction::{
            TransactionDeleted, TransactionKind, TransactionListQuery, TransactionListResponse,
            TransactionNew, TransactionOrigin, TransactionState, TransactionUpdate,
            TransactionView,
        };
    }

    pub mod dashboard {
        pub use api_types::dashboard::{DashboardQuery, DashboardView};
    }

    pub mod equipment {
        pub use api_types::equipment::{
            ArrivalRequest, DecommissionRequest, EquipmentListQuery, EquipmentNew, EventNew,
            LocationBody, MaintenanceClose, MaintenanceOpen, ServiceOrderNew, TransferRequest,
        };
        pub use engine::{
            Equipment, EquipmentEvent, LifetimeHistory, MaintenanceRecord, ReconcileOutcome,
            ServiceOrder, TimelineEntry,
        };
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
    Unauthorized,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) | EngineError::StateConflict(_) => StatusCode::CONFLICT,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InvalidAmount(_)
        | EngineError::InvalidName(_)
        | EngineError::InvalidId(_)
        | EngineError::InvalidReference(_)
        | EngineError::InvalidCursor(_)
        | EngineError::InvalidTransition(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, error) = match self {
            ServerError::Engine(err) => (
                status_for_engine_error(&err),
                err.code().to_string(),
                message_for_engine_error(err),
            ),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, "bad_request".to_string(), err),
            ServerError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized".to_string(),
                "missing or unknown bearer token".to_string(),
            ),
        };

        (status, Json(ErrorBody { code, error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

/// Parses a wire amount (`"1250.00"`, `"10,5"`).
fn parse_money(value: &str) -> Result<Money, ServerError> {
    Ok(value.parse::<Money>()?)
}

fn parse_optional_money(value: Option<&str>) -> Result<Option<Money>, ServerError> {
    value.map(parse_money).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_forbidden_maps_to_403() {
        let res =
            ServerError::from(EngineError::Forbidden("forbidden".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::KeyNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_conflicts_map_to_409() {
        let res = ServerError::from(EngineError::ExistingKey("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
        let res = ServerError::from(EngineError::StateConflict("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn engine_validation_maps_to_422() {
        for err in [
            EngineError::InvalidAmount("x".to_string()),
            EngineError::InvalidReference("x".to_string()),
            EngineError::InvalidTransition("x".to_string()),
            EngineError::InvalidCursor("x".to_string()),
        ] {
            let res = ServerError::from(err).into_response();
            assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        }
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unauthorized_maps_to_401() {
        let res = ServerError::Unauthorized.into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn money_parse_errors_are_validation() {
        let Err(err) = parse_money("12.345") else {
            panic!("three decimals must be rejected");
        };
        assert_eq!(
            err.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
