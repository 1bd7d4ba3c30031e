use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use migration::MigratorTrait;
use sea_orm::Database;
use serde_json::{Value, json};
use server::{DatabaseIdentity, Identity, ServerState};
use tower::ServiceExt;
use uuid::Uuid;

use engine::{Caller, Engine, EngineError, Role};

const OWNER_TOKEN: &str = "owner-token";
const VIEWER_TOKEN: &str = "viewer-token";

struct TestApp {
    router: Router,
    company_id: Uuid,
}

async fn app() -> TestApp {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Arc::new(Engine::builder().database(db).build().await.unwrap());

    let company = engine.new_company("Echo Shop", None).await.unwrap();
    engine
        .new_user(
            "owner@echo.shop",
            "Owner",
            OWNER_TOKEN,
            Role::Owner,
            &[company.id],
        )
        .await
        .unwrap();
    engine
        .new_user(
            "viewer@echo.shop",
            "Viewer",
            VIEWER_TOKEN,
            Role::Viewer,
            &[company.id],
        )
        .await
        .unwrap();

    let state = ServerState {
        identity: Arc::new(DatabaseIdentity::new(engine.clone())),
        engine,
    };
    TestApp {
        router: server::router(state),
        company_id: company.id,
    }
}

async fn send(
    app: &TestApp,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_account(app: &TestApp, name: &str, opening: &str) -> Uuid {
    let (status, body) = send(
        app,
        Method::POST,
        &format!("/api/empresas/{}/contas", app.company_id),
        Some(OWNER_TOKEN),
        Some(json!({"name": name, "kind": "checking", "opening_balance": opening})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_str().unwrap().parse().unwrap()
}

async fn create_equipment(app: &TestApp, serial: &str) -> Uuid {
    let (status, body) = send(
        app,
        Method::POST,
        &format!("/api/empresas/{}/equipamentos-tecnicos", app.company_id),
        Some(OWNER_TOKEN),
        Some(json!({
            "serial": serial,
            "equipment_type": "printer",
            "brand": "Epson",
            "location": {"kind": "warehouse", "name": "Depósito"}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn missing_or_unknown_token_is_unauthorized() {
    let app = app().await;
    let uri = format!("/api/empresas/{}/contas", app.company_id);

    let (status, body) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");

    let (status, _) = send(&app, Method::GET, &uri, Some("nope"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

/// Identity backend whose store is down.
struct UnreachableIdentity;

#[async_trait::async_trait]
impl Identity for UnreachableIdentity {
    async fn resolve(&self, _token: &str) -> Result<Option<Caller>, EngineError> {
        Err(EngineError::Database(sea_orm::DbErr::Custom(
            "connection refused".to_string(),
        )))
    }
}

#[tokio::test]
async fn token_lookup_failure_is_a_server_error() {
    let mut app = app().await;
    let db = Database::connect("sqlite::memory:").await.unwrap();
    app.router = server::router(ServerState {
        engine: Arc::new(Engine::builder().database(db).build().await.unwrap()),
        identity: Arc::new(UnreachableIdentity),
    });
    let uri = format!("/api/empresas/{}/contas", app.company_id);

    let (status, body) = send(&app, Method::GET, &uri, Some(OWNER_TOKEN), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "upstream");
    assert_eq!(body["error"], "internal server error");

    // no token never reaches the backend
    let (status, _) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn income_moves_balance_and_dashboard() {
    let app = app().await;
    let account = create_account(&app, "Caixa", "100.00").await;

    let (status, tx) = send(
        &app,
        Method::POST,
        &format!("/api/empresas/{}/transacoes", app.company_id),
        Some(OWNER_TOKEN),
        Some(json!({
            "kind": "income",
            "gross_amount": "250.50",
            "competence_date": "2026-03-10",
            "account_id": account,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{tx}");
    assert_eq!(tx["state"], "posted");
    assert_eq!(tx["gross_amount"], "250.50");

    let (status, list) = send(
        &app,
        Method::GET,
        &format!("/api/empresas/{}/contas", app.company_id),
        Some(VIEWER_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["accounts"][0]["current_balance"], "350.50");

    let (status, dashboard) = send(
        &app,
        Method::GET,
        &format!(
            "/api/empresas/{}/dashboard?from=2026-03-01&to=2026-03-31",
            app.company_id
        ),
        Some(OWNER_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["total_receitas"], "250.50");
    assert_eq!(dashboard["total_despesas"], "0.00");
    assert_eq!(dashboard["saldo"], "250.50");
    assert_eq!(dashboard["saldo_contas"], "350.50");
}

#[tokio::test]
async fn delete_reports_reversal() {
    let app = app().await;
    let account = create_account(&app, "Banco", "0.00").await;
    let (_, tx) = send(
        &app,
        Method::POST,
        &format!("/api/empresas/{}/transacoes", app.company_id),
        Some(OWNER_TOKEN),
        Some(json!({
            "kind": "expense",
            "gross_amount": "40",
            "competence_date": "2026-03-02",
            "account_id": account,
        })),
    )
    .await;
    let id = tx["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/api/transacoes/{id}"),
        Some(OWNER_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true, "balance_reversed": true}));

    let (_, list) = send(
        &app,
        Method::GET,
        &format!("/api/empresas/{}/contas", app.company_id),
        Some(OWNER_TOKEN),
        None,
    )
    .await;
    assert_eq!(list["accounts"][0]["current_balance"], "0.00");

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/api/transacoes/{id}"),
        Some(OWNER_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "state_conflict");
}

#[tokio::test]
async fn update_and_list_round_trip_through_query_filters() {
    let app = app().await;
    let account = create_account(&app, "Banco", "0.00").await;
    let (_, tx) = send(
        &app,
        Method::POST,
        &format!("/api/empresas/{}/transacoes", app.company_id),
        Some(OWNER_TOKEN),
        Some(json!({
            "kind": "income",
            "gross_amount": "10.00",
            "competence_date": "2026-03-02",
            "account_id": account,
        })),
    )
    .await;
    let id = tx["id"].as_str().unwrap();

    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/api/transacoes/{id}"),
        Some(OWNER_TOKEN),
        Some(json!({"kind": "expense"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(updated["kind"], "expense");
    assert_eq!(updated["revision"], 1);

    let (status, page) = send(
        &app,
        Method::GET,
        &format!(
            "/api/empresas/{}/transacoes?kind=expense&limit=10",
            app.company_id
        ),
        Some(OWNER_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["transactions"].as_array().unwrap().len(), 1);
    assert!(page["next_cursor"].is_null());

    let (_, list) = send(
        &app,
        Method::GET,
        &format!("/api/empresas/{}/contas", app.company_id),
        Some(OWNER_TOKEN),
        None,
    )
    .await;
    assert_eq!(list["accounts"][0]["current_balance"], "-10.00");
}

#[tokio::test]
async fn validation_and_tenant_errors_map_to_statuses() {
    let app = app().await;
    let account = create_account(&app, "Banco", "0.00").await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/empresas/{}/transacoes", app.company_id),
        Some(OWNER_TOKEN),
        Some(json!({
            "kind": "income",
            "gross_amount": "12.345",
            "competence_date": "2026-03-02",
            "account_id": account,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "invalid_amount");

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/empresas/{}/transacoes", app.company_id),
        Some(OWNER_TOKEN),
        Some(json!({
            "kind": "income",
            "gross_amount": "50000000000000000.00",
            "competence_date": "2026-03-02",
            "account_id": account,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "invalid_amount");

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/empresas/{}/contas", Uuid::new_v4()),
        Some(OWNER_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/empresas/{}/contas", app.company_id),
        Some(VIEWER_TOKEN),
        Some(json!({"name": "Nova", "kind": "cash"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/empresas/{}/transacoes?cursor=garbage", app.company_id),
        Some(OWNER_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn maintenance_cycle_shows_in_history() {
    let app = app().await;
    let equipment = create_equipment(&app, "SN-1").await;

    let (status, record) = send(
        &app,
        Method::POST,
        &format!("/api/equipamentos/{equipment}/manutencao"),
        Some(OWNER_TOKEN),
        Some(json!({"reported_fault": "paper jam", "estimated_cost": "80.00"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{record}");
    let maintenance_id = record["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/equipamentos/{equipment}/transferir"),
        Some(OWNER_TOKEN),
        Some(json!({"destination_kind": "customer", "destination_name": "Loja"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    let (status, closed) = send(
        &app,
        Method::PATCH,
        &format!("/api/manutencoes/{maintenance_id}/concluir"),
        Some(OWNER_TOKEN),
        Some(json!({"service_performed": "roller replaced", "final_cost": "75.00"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{closed}");
    assert_eq!(closed["status"], "completed");

    let (status, event) = send(
        &app,
        Method::POST,
        &format!("/api/equipamentos/{equipment}/evento"),
        Some(OWNER_TOKEN),
        Some(json!({"kind": "inspection", "description": "all good"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{event}");

    let (status, history) = send(
        &app,
        Method::GET,
        &format!("/api/equipamentos/{equipment}/historico-completo"),
        Some(VIEWER_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history["equipment"]["status"], "available");
    assert_eq!(history["total_maintenances"], 1);
    assert_eq!(history["total_events"], 3);
    assert_eq!(history["total_service_orders"], 0);
    assert_eq!(history["timeline"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn transfer_arrival_and_service_orders() {
    let app = app().await;
    let equipment = create_equipment(&app, "SN-2").await;

    let (status, moved) = send(
        &app,
        Method::POST,
        &format!("/api/equipamentos/{equipment}/transferir"),
        Some(OWNER_TOKEN),
        Some(json!({"destination_kind": "customer", "destination_name": "Loja Centro"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{moved}");
    assert_eq!(moved["status"], "in_transit");

    let (status, arrived) = send(
        &app,
        Method::POST,
        &format!("/api/equipamentos/{equipment}/chegada"),
        Some(OWNER_TOKEN),
        Some(json!({"status": "in_use"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{arrived}");
    assert_eq!(arrived["status"], "in_use");
    assert_eq!(arrived["current_location"]["name"], "Loja Centro");

    let (status, order) = send(
        &app,
        Method::POST,
        &format!("/api/empresas/{}/ordens-servico", app.company_id),
        Some(OWNER_TOKEN),
        Some(json!({"equipment_id": equipment, "service_type": "installation"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{order}");
    assert_eq!(order["number"], 1);

    let (status, listed) = send(
        &app,
        Method::GET,
        &format!(
            "/api/empresas/{}/equipamentos-tecnicos?status=in_use",
            app.company_id
        ),
        Some(OWNER_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, outcome) = send(
        &app,
        Method::POST,
        &format!("/api/equipamentos/{equipment}/reconciliar"),
        Some(OWNER_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["changed"], false);

    let (status, retired) = send(
        &app,
        Method::POST,
        &format!("/api/equipamentos/{equipment}/baixa"),
        Some(OWNER_TOKEN),
        Some(json!({"reason": "end of life"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{retired}");
    assert_eq!(retired["status"], "decommissioned");

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/equipamentos/{equipment}/evento"),
        Some(OWNER_TOKEN),
        Some(json!({"kind": "observation", "description": "late note"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
}

#[tokio::test]
async fn recompute_on_healthy_company_is_empty() {
    let app = app().await;
    create_account(&app, "Banco", "10.00").await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/empresas/{}/recalcular-saldos", app.company_id),
        Some(OWNER_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"corrections": []}));
}
