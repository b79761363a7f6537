//! HTTP layer exposing the generated calendar and snapshot.

pub mod routes;
pub mod types;

use std::net::SocketAddr;

use anyhow::Result;
use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::config::Settings;

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
}

pub fn router(settings: Settings) -> Router {
    Router::new()
        .route("/calendar.ics", get(routes::calendar))
        .route("/snapshot", get(routes::snapshot))
        .route("/events", get(routes::list_events))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { settings })
}

pub async fn serve(settings: Settings, host: String, port: u16) -> Result<()> {
    let router = router(settings);
    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    info!(%addr, "serving readout calendar");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;
    Ok(())
}
