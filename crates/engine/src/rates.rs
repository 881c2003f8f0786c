//! Historical exchange-rate lookup.
//!
//! A [`RateSource`] answers one question: what was the `from -> to` rate on a
//! given calendar date? Lookups never fail with an error; every outcome is a
//! [`RateQuote`] whose `status` string doubles as the audit note written to
//! the reconciliation ledger.
//!
//! The shipped implementation is [`Frankfurter`], backed by the public
//! Frankfurter API. The adapter performs no retries; retry policy belongs to
//! the caller.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::EngineError;

/// Default endpoint of the public Frankfurter API.
pub const FRANKFURTER_BASE_URL: &str = "https://api.frankfurter.app";

/// Ceiling for a single historical-rate request.
const RATE_TIMEOUT: Duration = Duration::from_secs(10);

/// Ceiling for the supported-currencies request.
const CURRENCIES_TIMEOUT: Duration = Duration::from_secs(5);

/// Currencies always offered to users, even when the provider omits them.
const COMMON_CURRENCIES: [&str; 9] = [
    "INR", "USD", "EUR", "GBP", "JPY", "CAD", "AUD", "CHF", "CNY",
];

/// Returned when the provider cannot be reached at all.
const FALLBACK_CURRENCIES: [&str; 12] = [
    "INR", "USD", "EUR", "GBP", "JPY", "CAD", "AUD", "CHF", "CNY", "MYR", "SGD", "THB",
];

/// Outcome of a historical-rate lookup.
///
/// A quote is successful iff `rate` is present and `status` contains
/// `"Success"`. The substring match is deliberate: the same-currency shortcut
/// reports `"Success - Same Currency"` and downstream code must keep treating
/// it as a success.
#[derive(Clone, Debug, PartialEq)]
pub struct RateQuote {
    pub rate: Option<f64>,
    pub status: String,
}

impl RateQuote {
    pub(crate) fn success(rate: f64, status: impl Into<String>) -> Self {
        Self {
            rate: Some(rate),
            status: status.into(),
        }
    }

    pub(crate) fn failure(status: impl Into<String>) -> Self {
        Self {
            rate: None,
            status: status.into(),
        }
    }

    /// `true` when the quote carries a usable rate.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.rate.is_some() && self.status.contains("Success")
    }
}

/// Supported-currency listing, with a flag telling whether the provider was
/// actually reachable or the fixed fallback list was used.
#[derive(Clone, Debug, PartialEq)]
pub struct CurrencySet {
    pub currencies: Vec<String>,
    pub success: bool,
}

/// External provider of historical currency exchange rates.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Provider label recorded in ledger entries (e.g. `"Frankfurter API"`).
    fn label(&self) -> &str;

    /// Look up the `from -> to` rate on `date` (`YYYY-MM-DD`).
    async fn historical_rate(&self, from: &str, to: &str, date: &str) -> RateQuote;

    /// List the currencies the provider supports.
    async fn available_currencies(&self) -> CurrencySet;
}

#[derive(Debug, Deserialize)]
struct FrankfurterRates {
    #[serde(default)]
    rates: HashMap<String, f64>,
}

/// Rate source backed by the Frankfurter historical-rate API.
#[derive(Clone, Debug)]
pub struct Frankfurter {
    client: reqwest::Client,
    base_url: String,
}

impl Frankfurter {
    pub fn new() -> Result<Self, EngineError> {
        Self::with_base_url(FRANKFURTER_BASE_URL)
    }

    /// Build an adapter against a non-default endpoint (used by tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .user_agent("ExpenseFlow/1.0")
            .build()
            .map_err(|err| EngineError::RateSource(err.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    async fn fetch_currencies(&self) -> Result<Vec<String>, EngineError> {
        let url = format!("{}/currencies", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(CURRENCIES_TIMEOUT)
            .send()
            .await
            .map_err(|err| EngineError::RateSource(err.to_string()))?;

        if !response.status().is_success() {
            return Err(EngineError::RateSource(format!(
                "HTTP {}",
                response.status().as_u16()
            )));
        }

        // The endpoint answers `{ "EUR": "Euro", ... }`; only the codes matter.
        let body: HashMap<String, String> = response
            .json()
            .await
            .map_err(|err| EngineError::RateSource(err.to_string()))?;

        Ok(body.into_keys().collect())
    }
}

#[async_trait]
impl RateSource for Frankfurter {
    fn label(&self) -> &str {
        "Frankfurter API"
    }

    async fn historical_rate(&self, from: &str, to: &str, date: &str) -> RateQuote {
        if from.trim().is_empty() || to.trim().is_empty() || date.trim().is_empty() {
            return RateQuote::failure("Failed - Missing Input Data");
        }

        let from = from.trim().to_uppercase();
        let to = to.trim().to_uppercase();

        // Converting a currency to itself needs no provider at all.
        if from == to {
            return RateQuote::success(1.0, "Success - Same Currency");
        }

        if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
            return RateQuote::failure(format!("Failed - Invalid Date Format: {date}"));
        }

        let url = format!("{}/{date}?from={from}&to={to}", self.base_url);
        let response = match self.client.get(&url).timeout(RATE_TIMEOUT).send().await {
            Ok(response) => response,
            Err(err) if err.is_timeout() => {
                return RateQuote::failure("Failed - API Timeout");
            }
            Err(err) => {
                return RateQuote::failure(format!("Failed - API Error: {err}"));
            }
        };

        if !response.status().is_success() {
            return RateQuote::failure(format!(
                "Failed - API Error: {}",
                response.status().as_u16()
            ));
        }

        let body: FrankfurterRates = match response.json().await {
            Ok(body) => body,
            Err(err) => {
                return RateQuote::failure(format!("Failed - API Error: {err}"));
            }
        };

        match body.rates.get(&to) {
            Some(rate) => RateQuote::success(*rate, "Success"),
            None => RateQuote::failure(format!(
                "Failed - Rate not found for {from} to {to} on {date}"
            )),
        }
    }

    async fn available_currencies(&self) -> CurrencySet {
        match self.fetch_currencies().await {
            Ok(fetched) => {
                let mut currencies: Vec<String> = COMMON_CURRENCIES
                    .iter()
                    .map(|code| (*code).to_string())
                    .chain(fetched)
                    .collect();
                currencies.sort();
                currencies.dedup();

                CurrencySet {
                    currencies,
                    success: true,
                }
            }
            Err(_) => CurrencySet {
                currencies: FALLBACK_CURRENCIES
                    .iter()
                    .map(|code| (*code).to_string())
                    .collect(),
                success: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Adapter pointed at a port nothing listens on: any code path that
    /// reaches the network fails, so these tests also prove which paths
    /// never leave the process.
    fn unroutable() -> Frankfurter {
        match Frankfurter::with_base_url("http://127.0.0.1:9") {
            Ok(source) => source,
            Err(err) => panic!("client build failed: {err}"),
        }
    }

    #[tokio::test]
    async fn same_currency_short_circuits_without_network() {
        let source = unroutable();
        let quote = source.historical_rate("usd ", " USD", "2024-03-01").await;
        assert_eq!(quote.rate, Some(1.0));
        assert_eq!(quote.status, "Success - Same Currency");
        assert!(quote.is_success());
    }

    #[tokio::test]
    async fn same_currency_wins_over_date_validation() {
        // Mirrors the check order: shortcut first, date parsing second.
        let source = unroutable();
        let quote = source.historical_rate("EUR", "EUR", "not-a-date").await;
        assert_eq!(quote.rate, Some(1.0));
    }

    #[tokio::test]
    async fn missing_input_is_reported_not_thrown() {
        let source = unroutable();
        for (from, to, date) in [("", "USD", "2024-03-01"), ("EUR", " ", "2024-03-01"), ("EUR", "USD", "")] {
            let quote = source.historical_rate(from, to, date).await;
            assert_eq!(quote.rate, None);
            assert_eq!(quote.status, "Failed - Missing Input Data");
            assert!(!quote.is_success());
        }
    }

    #[tokio::test]
    async fn malformed_date_is_rejected_before_lookup() {
        let source = unroutable();
        let quote = source.historical_rate("EUR", "USD", "03/01/2024").await;
        assert_eq!(quote.rate, None);
        assert_eq!(quote.status, "Failed - Invalid Date Format: 03/01/2024");
    }

    #[tokio::test]
    async fn transport_fault_maps_to_api_error_status() {
        let source = unroutable();
        let quote = source.historical_rate("EUR", "USD", "2024-03-01").await;
        assert_eq!(quote.rate, None);
        assert!(quote.status.starts_with("Failed - API "), "{}", quote.status);
    }

    #[tokio::test]
    async fn unreachable_provider_falls_back_to_fixed_currency_list() {
        let source = unroutable();
        let set = source.available_currencies().await;
        assert!(!set.success);
        assert_eq!(set.currencies.len(), FALLBACK_CURRENCIES.len());
        assert!(set.currencies.iter().any(|c| c == "USD"));
    }

    #[test]
    fn success_match_is_substring_based() {
        let quote = RateQuote::success(1.0, "Success - Same Currency");
        assert!(quote.is_success());

        // A status mentioning success without a rate is still a failure.
        let quote = RateQuote::failure("Failed - Rate not found for EUR to USD on 2024-03-01");
        assert!(!quote.is_success());
    }
}
