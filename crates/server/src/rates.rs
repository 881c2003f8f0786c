//! Rate lookup endpoints.

use api_types::rates::{CurrenciesResponse, RateQuery, RateQuoteView};
use axum::{
    Json,
    extract::{Query, State},
};

use crate::server::ServerState;

/// Direct historical-rate lookup. Always answers 200: lookup problems are
/// carried in the `status` field, same as the ledger notes.
pub async fn quote(
    State(state): State<ServerState>,
    Query(query): Query<RateQuery>,
) -> Json<RateQuoteView> {
    let quote = state
        .engine
        .historical_rate(&query.from, &query.to, &query.date)
        .await;

    Json(RateQuoteView {
        rate: quote.rate,
        status: quote.status,
    })
}

/// Currencies offered for base-currency selection. Never fails: when the
/// provider is unreachable a fixed fallback list is returned with
/// `success: false`.
pub async fn currencies(State(state): State<ServerState>) -> Json<CurrenciesResponse> {
    let set = state.engine.available_currencies().await;

    if !set.success {
        tracing::warn!("currency provider unreachable, serving fallback list");
    }

    Json(CurrenciesResponse {
        currencies: set.currencies,
        success: set.success,
    })
}
