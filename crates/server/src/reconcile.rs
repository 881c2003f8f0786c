//! Reconciliation endpoints.

use api_types::reconcile::{
    OutcomeView, ReconcileMode, ReconcileRequest, ReconcileResponse, ReconciliationView,
    ReconciliationsResponse,
};
use axum::{Json, extract::State};

use crate::{ServerError, server::ServerState};

/// Reconcile a batch of receipts into the requested base currency.
///
/// With explicit `receipt_ids` the batch is exactly those ids (missing ones
/// included; they come back as failed outcomes). Without ids the server
/// selects the batch: `pending` (default) picks receipts not yet converted
/// into this base currency, `all` re-reconciles every eligible receipt.
pub async fn run_batch(
    State(state): State<ServerState>,
    Json(payload): Json<ReconcileRequest>,
) -> Result<Json<ReconcileResponse>, ServerError> {
    let engine = &state.engine;

    let receipt_ids = match payload.receipt_ids {
        Some(ids) => ids,
        None => match payload.mode.unwrap_or_default() {
            ReconcileMode::Pending => engine.pending_receipt_ids(&payload.base_currency).await?,
            ReconcileMode::All => engine.eligible_receipt_ids().await?,
        },
    };

    let outcomes = engine
        .reconcile(&receipt_ids, &payload.base_currency)
        .await?;

    let converted = outcomes.iter().filter(|o| o.success).count();
    tracing::info!(
        batch = receipt_ids.len(),
        converted,
        base_currency = %payload.base_currency,
        "reconciliation batch finished"
    );

    Ok(Json(ReconcileResponse {
        success: true,
        results: outcomes
            .into_iter()
            .map(|outcome| OutcomeView {
                receipt_id: outcome.receipt_id,
                success: outcome.success,
                message: outcome.message,
            })
            .collect(),
    }))
}

/// Audit trail: every reconciliation attempt ever made, newest first.
pub async fn history(
    State(state): State<ServerState>,
) -> Result<Json<ReconciliationsResponse>, ServerError> {
    let entries = state.engine.reconciliation_history().await?;

    Ok(Json(ReconciliationsResponse {
        reconciliations: entries
            .into_iter()
            .map(|entry| ReconciliationView {
                id: entry.id,
                receipt_id: entry.receipt_id,
                reconciliation_time: entry.reconciliation_time,
                transaction_date: entry.transaction_date,
                original_currency: entry.original_currency,
                original_total: entry.original_total,
                base_currency: entry.base_currency,
                converted_total: entry.converted_total,
                exchange_rate: entry.exchange_rate,
                rate_source: entry.rate_source,
                status: entry.status,
                notes: entry.notes,
                file_name: entry.file_name,
                merchant_name: entry.merchant_name,
            })
            .collect(),
    }))
}
