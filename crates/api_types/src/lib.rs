use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub mod receipt {
    use super::*;

    /// Request body for `POST /receipts/process`.
    ///
    /// The image travels base64-encoded; file storage itself is not this
    /// service's concern.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProcessReceipt {
        pub file_name: String,
        pub image_base64: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReceiptView {
        pub id: i32,
        pub file_name: String,
        pub upload_time: DateTime<Utc>,
        pub merchant_name: Option<String>,
        pub transaction_date: Option<NaiveDate>,
        pub original_currency: Option<String>,
        pub original_total: Option<f64>,
        pub base_currency: Option<String>,
        pub converted_total: Option<f64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReceiptsResponse {
        pub receipts: Vec<ReceiptView>,
    }
}

pub mod reconcile {
    use super::*;

    /// Which receipts a `POST /reconcile` without explicit ids operates on.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ReconcileMode {
        /// Receipts not yet converted into the requested base currency.
        #[default]
        Pending,
        /// Every reconcilable receipt, already-converted ones included.
        All,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReconcileRequest {
        /// Explicit batch; when omitted the server selects ids via `mode`.
        pub receipt_ids: Option<Vec<i32>>,
        pub base_currency: String,
        pub mode: Option<ReconcileMode>,
    }

    /// One receipt's result within a batch.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct OutcomeView {
        pub receipt_id: i32,
        pub success: bool,
        pub message: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReconcileResponse {
        pub success: bool,
        pub results: Vec<OutcomeView>,
    }

    /// One ledger row, as returned by `GET /reconciliations`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReconciliationView {
        pub id: i32,
        pub receipt_id: i32,
        pub reconciliation_time: DateTime<Utc>,
        pub transaction_date: Option<NaiveDate>,
        pub original_currency: Option<String>,
        pub original_total: Option<f64>,
        pub base_currency: Option<String>,
        pub converted_total: Option<f64>,
        pub exchange_rate: Option<f64>,
        pub rate_source: String,
        pub status: String,
        pub notes: String,
        pub file_name: Option<String>,
        pub merchant_name: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReconciliationsResponse {
        pub reconciliations: Vec<ReconciliationView>,
    }
}

pub mod rates {
    use super::*;

    /// Query string of `GET /rate`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct RateQuery {
        pub from: String,
        pub to: String,
        /// `YYYY-MM-DD`, kept as a string so a malformed date reaches the
        /// adapter and comes back as a descriptive status instead of a 422.
        pub date: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RateQuoteView {
        pub rate: Option<f64>,
        pub status: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CurrenciesResponse {
        pub currencies: Vec<String>,
        pub success: bool,
    }
}
