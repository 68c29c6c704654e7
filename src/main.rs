use axum::{
    routing::{get, post},
    Router,
};
use paper_backend::{
    config::{get_config, init_config},
    routes, AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let app_state = AppState::new();

    // The frontend talks to the JSON endpoint from the browser, so only the
    // /api router carries the CORS allowance.
    let api_routes = Router::new()
        .route("/api/generate-paper", post(routes::paper::generate_paper))
        .layer(CorsLayer::permissive());

    let document_routes = Router::new().route(
        "/generate-paper",
        post(routes::paper::generate_paper_pdf),
    );

    let app = Router::new()
        .route("/health", get(routes::health::health))
        .merge(api_routes)
        .merge(document_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
