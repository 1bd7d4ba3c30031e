use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, patch, post, put},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use std::sync::Arc;

use crate::{
    DatabaseIdentity, Identity, ServerError, accounts, categories, dashboard, equipment,
    transactions,
};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub identity: Arc<dyn Identity>,
}

async fn auth(
    auth_header: Option<TypedHeader<Authorization<Bearer>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let Some(TypedHeader(Authorization(bearer))) = auth_header else {
        return Err(ServerError::Unauthorized);
    };
    let token = bearer.token().trim();
    if token.is_empty() {
        return Err(ServerError::Unauthorized);
    }

    let Some(caller) = state.identity.resolve(token).await? else {
        tracing::debug!("rejected unknown bearer token");
        return Err(ServerError::Unauthorized);
    };

    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}

/// Every route lives under `/api` and requires a bearer token.
pub fn router(state: ServerState) -> Router {
    let api = Router::new()
        .route(
            "/empresas/{company_id}/transacoes",
            get(transactions::list).post(transactions::create),
        )
        .route(
            "/transacoes/{id}",
            put(transactions::update).delete(transactions::remove),
        )
        .route("/transacoes/{id}/anular", post(transactions::void_tx))
        .route(
            "/empresas/{company_id}/contas",
            get(accounts::list).post(accounts::create),
        )
        .route("/contas/{id}", delete(accounts::remove))
        .route(
            "/empresas/{company_id}/recalcular-saldos",
            post(accounts::recompute),
        )
        .route(
            "/empresas/{company_id}/categorias",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/categorias/{id}",
            delete(categories::remove_category),
        )
        .route(
            "/empresas/{company_id}/centros-custo",
            get(categories::list_cost_centers).post(categories::create_cost_center),
        )
        .route(
            "/centros-custo/{id}",
            delete(categories::remove_cost_center),
        )
        .route("/empresas/{company_id}/dashboard", get(dashboard::get))
        .route(
            "/empresas/{company_id}/equipamentos-tecnicos",
            get(equipment::list).post(equipment::create),
        )
        .route("/equipamentos/{id}", get(equipment::get))
        .route(
            "/equipamentos/{id}/manutencao",
            post(equipment::open_maintenance),
        )
        .route(
            "/manutencoes/{id}/concluir",
            patch(equipment::close_maintenance),
        )
        .route("/equipamentos/{id}/evento", post(equipment::register_event))
        .route("/equipamentos/{id}/transferir", post(equipment::transfer))
        .route("/equipamentos/{id}/chegada", post(equipment::arrive))
        .route("/equipamentos/{id}/baixa", post(equipment::decommission))
        .route("/equipamentos/{id}/reconciliar", post(equipment::reconcile))
        .route(
            "/equipamentos/{id}/historico-completo",
            get(equipment::history),
        )
        .route(
            "/empresas/{company_id}/ordens-servico",
            post(equipment::new_service_order),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state);

    Router::new().nest("/api", api)
}

pub async fn run(engine: Engine, addr: std::net::SocketAddr) {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {addr}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let engine = Arc::new(engine);
    let state = ServerState {
        identity: Arc::new(DatabaseIdentity::new(engine.clone())),
        engine,
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
