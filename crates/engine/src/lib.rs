//! Currency reconciliation engine.
//!
//! The engine owns the conversion state of uploaded receipts: given a batch
//! of receipt ids and a target base currency, it fetches a historical
//! exchange rate per receipt (keyed by the receipt's transaction date),
//! computes the converted total, updates the receipt and appends an
//! immutable [`ReconciliationEntry`] describing the attempt, successful or
//! not.
//!
//! Expected failures (missing rate, provider timeout, missing receipt data)
//! never abort a batch and never raise: each receipt gets exactly one
//! [`ReconcileOutcome`] explaining what happened, in input order.

use chrono::Utc;
use sea_orm::DatabaseConnection;

pub use error::EngineError;
pub use extract::{ExtractedFields, MockExtractor, ReceiptExtractor};
pub use ledger::ReconciliationEntry;
pub use rates::{CurrencySet, FRANKFURTER_BASE_URL, Frankfurter, RateQuote, RateSource};
pub use receipts::{NewReceipt, Receipt};

mod error;
mod extract;
mod ledger;
mod rates;
mod receipts;

type ResultEngine<T> = Result<T, EngineError>;

/// Per-receipt result of a [`Engine::reconcile`] batch.
#[derive(Clone, Debug, PartialEq)]
pub struct ReconcileOutcome {
    pub receipt_id: i32,
    pub success: bool,
    pub message: String,
}

impl ReconcileOutcome {
    fn success(receipt_id: i32, message: String) -> Self {
        Self {
            receipt_id,
            success: true,
            message,
        }
    }

    fn failure(receipt_id: i32, message: String) -> Self {
        Self {
            receipt_id,
            success: false,
            message,
        }
    }
}

pub struct Engine {
    database: DatabaseConnection,
    rates: Box<dyn RateSource>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("rate_source", &self.rates.label())
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Ingest a receipt. Conversion state starts empty and is only ever
    /// written by [`Engine::reconcile`].
    pub async fn new_receipt(&self, receipt: NewReceipt) -> ResultEngine<Receipt> {
        if receipt.file_name.trim().is_empty() {
            return Err(EngineError::InvalidInput(
                "file_name is required".to_string(),
            ));
        }

        let id = receipts::insert(&self.database, &receipt, Utc::now()).await?;
        receipts::by_id(&self.database, id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("receipt {id}")))
    }

    pub async fn receipt(&self, id: i32) -> ResultEngine<Receipt> {
        receipts::by_id(&self.database, id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("receipt {id}")))
    }

    /// All receipts, newest upload first.
    pub async fn receipts(&self) -> ResultEngine<Vec<Receipt>> {
        receipts::all(&self.database).await
    }

    /// Full reconciliation ledger, newest attempt first.
    pub async fn reconciliation_history(&self) -> ResultEngine<Vec<ReconciliationEntry>> {
        ledger::history(&self.database).await
    }

    /// Ids of receipts not yet reconciled for `base_currency` (and holding
    /// all three facts reconciliation needs).
    pub async fn pending_receipt_ids(&self, base_currency: &str) -> ResultEngine<Vec<i32>> {
        let base = normalize_currency(base_currency)?;
        receipts::eligible_ids(&self.database, Some(&base)).await
    }

    /// Ids of every reconcilable receipt, already-converted ones included.
    /// This is what "re-reconcile everything" operates on.
    pub async fn eligible_receipt_ids(&self) -> ResultEngine<Vec<i32>> {
        receipts::eligible_ids(&self.database, None).await
    }

    /// Rate adapter passthrough.
    pub async fn historical_rate(&self, from: &str, to: &str, date: &str) -> RateQuote {
        self.rates.historical_rate(from, to, date).await
    }

    /// Currencies offered for selection; falls back to a fixed list when the
    /// provider is unreachable.
    pub async fn available_currencies(&self) -> CurrencySet {
        self.rates.available_currencies().await
    }

    /// Reconcile a batch of receipts into `base_currency`.
    ///
    /// Returns exactly one outcome per input id, in input order. An `Err` is
    /// only possible for an invalid call (empty base currency); everything
    /// that goes wrong per receipt, store faults included, is folded into
    /// that receipt's outcome and the batch moves on.
    pub async fn reconcile(
        &self,
        receipt_ids: &[i32],
        base_currency: &str,
    ) -> ResultEngine<Vec<ReconcileOutcome>> {
        let base = normalize_currency(base_currency)?;

        let mut outcomes = Vec::with_capacity(receipt_ids.len());
        for &receipt_id in receipt_ids {
            let outcome = match self.reconcile_one(receipt_id, &base).await {
                Ok(outcome) => outcome,
                Err(err) => ReconcileOutcome::failure(
                    receipt_id,
                    format!("Error processing receipt ID {receipt_id}: {err}"),
                ),
            };
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }

    /// One receipt's read → rate → write sequence. `Err` means a store
    /// fault; expected failures come back as `Ok` outcomes.
    async fn reconcile_one(&self, receipt_id: i32, base: &str) -> ResultEngine<ReconcileOutcome> {
        let Some(receipt) = receipts::by_id(&self.database, receipt_id).await? else {
            // Nothing to audit: a nonexistent receipt leaves no ledger row.
            return Ok(ReconcileOutcome::failure(
                receipt_id,
                format!("Receipt ID {receipt_id} not found"),
            ));
        };

        let (Some(original_total), Some(original_currency), Some(transaction_date)) = (
            receipt.original_total,
            receipt.original_currency.clone(),
            receipt.transaction_date,
        ) else {
            // Precondition failure, distinct from a rate-lookup failure: no
            // attempt was made, so no ledger row either.
            return Ok(ReconcileOutcome::failure(
                receipt_id,
                format!(
                    "{}: Missing required data for reconciliation",
                    receipt.file_name
                ),
            ));
        };

        let date = transaction_date.format("%Y-%m-%d").to_string();
        let quote = self
            .rates
            .historical_rate(&original_currency, base, &date)
            .await;
        let reconciliation_time = Utc::now();

        if let Some(rate) = quote.rate.filter(|_| quote.is_success()) {
            // Full-precision product; rounding is presentation-only.
            let converted_total = original_total * rate;

            receipts::update_conversion(&self.database, receipt_id, converted_total, base).await?;
            ledger::append(
                &self.database,
                &ledger::NewEntry {
                    receipt_id,
                    reconciliation_time,
                    transaction_date: Some(transaction_date),
                    original_currency: Some(original_currency.clone()),
                    original_total: Some(original_total),
                    base_currency: Some(base.to_string()),
                    converted_total: Some(converted_total),
                    exchange_rate: Some(rate),
                    rate_source: self.rates.label().to_string(),
                    status: "Success".to_string(),
                    notes: quote.status,
                    file_name: Some(receipt.file_name.clone()),
                    merchant_name: receipt.merchant_name.clone(),
                },
            )
            .await?;

            Ok(ReconcileOutcome::success(
                receipt_id,
                format!(
                    "{}: Converted {} {} to {:.2} {} (Rate: {:.6})",
                    receipt.file_name, original_total, original_currency, converted_total, base,
                    rate
                ),
            ))
        } else {
            // A failed attempt is still an auditable event, but it must not
            // clear a previously successful conversion.
            ledger::append(
                &self.database,
                &ledger::NewEntry {
                    receipt_id,
                    reconciliation_time,
                    transaction_date: Some(transaction_date),
                    original_currency: Some(original_currency),
                    original_total: Some(original_total),
                    base_currency: Some(base.to_string()),
                    converted_total: None,
                    exchange_rate: None,
                    rate_source: self.rates.label().to_string(),
                    status: quote.status.clone(),
                    notes: quote.status.clone(),
                    file_name: Some(receipt.file_name.clone()),
                    merchant_name: receipt.merchant_name,
                },
            )
            .await?;

            Ok(ReconcileOutcome::failure(
                receipt_id,
                format!("{}: {}", receipt.file_name, quote.status),
            ))
        }
    }
}

fn normalize_currency(code: &str) -> ResultEngine<String> {
    let code = code.trim().to_uppercase();
    if code.is_empty() {
        return Err(EngineError::InvalidInput(
            "base currency is required".to_string(),
        ));
    }
    Ok(code)
}

#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    rates: Option<Box<dyn RateSource>>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Override the rate source (tests, alternative providers).
    pub fn rate_source(mut self, rates: Box<dyn RateSource>) -> EngineBuilder {
        self.rates = Some(rates);
        self
    }

    /// Construct `Engine`, defaulting the rate source to [`Frankfurter`].
    pub fn build(self) -> ResultEngine<Engine> {
        let rates = match self.rates {
            Some(rates) => rates,
            None => Box::new(Frankfurter::new()?),
        };

        Ok(Engine {
            database: self.database,
            rates,
        })
    }
}
