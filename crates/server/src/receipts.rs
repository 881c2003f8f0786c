//! Receipt ingestion and listing endpoints.

use api_types::receipt::{ProcessReceipt, ReceiptView, ReceiptsResponse};
use axum::{Json, extract::State};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

use crate::{ServerError, server::ServerState};
use engine::NewReceipt;

fn view(receipt: engine::Receipt) -> ReceiptView {
    ReceiptView {
        id: receipt.id,
        file_name: receipt.file_name,
        upload_time: receipt.upload_time,
        merchant_name: receipt.merchant_name,
        transaction_date: receipt.transaction_date,
        original_currency: receipt.original_currency,
        original_total: receipt.original_total,
        base_currency: receipt.base_currency,
        converted_total: receipt.converted_total,
    }
}

/// Run the extraction collaborator over an uploaded image and store the
/// resulting receipt. Fields the extractor could not read stay empty; the
/// receipt is then simply ineligible for reconciliation until corrected.
pub async fn process(
    State(state): State<ServerState>,
    Json(payload): Json<ProcessReceipt>,
) -> Result<Json<ReceiptView>, ServerError> {
    let image = BASE64
        .decode(payload.image_base64.as_bytes())
        .map_err(|err| ServerError::Generic(format!("invalid image_base64: {err}")))?;

    let fields = state
        .extractor
        .extract(&image, &payload.file_name)
        .await?;

    tracing::debug!(
        file_name = %payload.file_name,
        merchant = fields.merchant_name.as_deref(),
        currency = fields.currency_code.as_deref(),
        "receipt extracted"
    );

    let receipt = state
        .engine
        .new_receipt(NewReceipt {
            file_name: payload.file_name,
            merchant_name: fields.merchant_name,
            transaction_date: fields.transaction_date,
            original_currency: fields.currency_code,
            original_total: fields.total_amount,
        })
        .await?;

    Ok(Json(view(receipt)))
}

pub async fn list(
    State(state): State<ServerState>,
) -> Result<Json<ReceiptsResponse>, ServerError> {
    let receipts = state.engine.receipts().await?;

    Ok(Json(ReceiptsResponse {
        receipts: receipts.into_iter().map(view).collect(),
    }))
}
