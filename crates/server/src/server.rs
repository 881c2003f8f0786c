use axum::{
    Router,
    routing::{get, post},
};

use std::sync::Arc;

use crate::{rates, receipts, reconcile};
use engine::{Engine, ReceiptExtractor};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub extractor: Arc<dyn ReceiptExtractor>,
}

/// Build the application router. Exposed so tests can drive the routes
/// without a listener.
pub fn app(engine: Engine, extractor: Arc<dyn ReceiptExtractor>) -> Router {
    let state = ServerState {
        engine: Arc::new(engine),
        extractor,
    };
    router(state)
}

fn router(state: ServerState) -> Router {
    Router::new()
        .route("/receipts", get(receipts::list))
        .route("/receipts/process", post(receipts::process))
        .route("/reconcile", post(reconcile::run_batch))
        .route("/reconciliations", get(reconcile::history))
        .route("/rate", get(rates::quote))
        .route("/currencies", get(rates::currencies))
        .with_state(state)
}

pub async fn run(engine: Engine, extractor: Arc<dyn ReceiptExtractor>) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, extractor, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    extractor: Arc<dyn ReceiptExtractor>,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app(engine, extractor)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    extractor: Arc<dyn ReceiptExtractor>,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, extractor, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
