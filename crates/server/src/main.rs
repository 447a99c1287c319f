use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
    Router,
};
use server_api::{ensure_event, ApiContext};
use shared::{domain::EventId, protocol::API_PREFIX};
use storage::Storage;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod config;

use app_state::AppState;
use config::{load_settings, prepare_database_url, EventSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings()?;
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;
    let api = ApiContext::new(storage);
    seed_events(&api, &settings.events).await?;

    let state = AppState {
        api,
        max_body_bytes: settings.max_body_bytes,
    };
    let mut app = build_router(Arc::new(state));
    if settings.cors_permissive {
        app = app.layer(CorsLayer::permissive());
    }

    let addr: SocketAddr = settings.bind_addr.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn seed_events(api: &ApiContext, events: &[EventSettings]) -> anyhow::Result<()> {
    for event in events {
        let seeded = ensure_event(api, &EventId::new(event.id.as_str()), event.capacity)
            .await
            .with_context(|| format!("failed to seed event '{}'", event.id))?;
        info!(event_id = %seeded.id, capacity = seeded.capacity, "event ready");
    }
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    let max_body_bytes = state.max_body_bytes;
    Router::new()
        .route("/healthz", get(healthz))
        .route(
            &format!("{API_PREFIX}/events/:event_id/register"),
            post(api::http_register),
        )
        .route(
            &format!("{API_PREFIX}/events/:event_id/attendees"),
            get(api::http_list_attendees),
        )
        .route(
            &format!("{API_PREFIX}/events/:event_id/attendees/:registration_id"),
            delete(api::http_remove_attendee),
        )
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .with_state(state)
}

async fn healthz(State(state): State<Arc<AppState>>) -> (StatusCode, &'static str) {
    match state.api.store.health_check().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(error) => {
            error!(%error, "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    }
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        error!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
