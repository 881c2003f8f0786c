//! Receipt extraction collaborator.
//!
//! OCR/image understanding is an external service as far as the engine is
//! concerned: it takes image bytes and hands back whatever structured fields
//! it managed to read. Anything missing stays `None` and simply makes the
//! receipt ineligible for reconciliation until corrected.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use crate::{EngineError, ResultEngine};

/// Fields an extractor may recover from a receipt image.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExtractedFields {
    pub merchant_name: Option<String>,
    pub transaction_date: Option<NaiveDate>,
    pub currency_code: Option<String>,
    pub total_amount: Option<f64>,
}

/// Opaque OCR service boundary.
#[async_trait]
pub trait ReceiptExtractor: Send + Sync {
    async fn extract(&self, image: &[u8], file_name: &str) -> ResultEngine<ExtractedFields>;
}

/// Demo extractor returning fixed fields, in place of a real OCR backend.
#[derive(Clone, Copy, Debug, Default)]
pub struct MockExtractor;

#[async_trait]
impl ReceiptExtractor for MockExtractor {
    async fn extract(&self, image: &[u8], _file_name: &str) -> ResultEngine<ExtractedFields> {
        if image.is_empty() {
            return Err(EngineError::Extraction("empty image".to_string()));
        }

        Ok(ExtractedFields {
            merchant_name: Some("Demo Store".to_string()),
            transaction_date: Some(Utc::now().date_naive()),
            currency_code: Some("USD".to_string()),
            total_amount: Some(42.50),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_extractor_fills_all_reconciliation_fields() {
        let fields = match MockExtractor.extract(b"fake-image", "receipt.jpg").await {
            Ok(fields) => fields,
            Err(err) => panic!("extraction failed: {err}"),
        };
        assert!(fields.merchant_name.is_some());
        assert!(fields.transaction_date.is_some());
        assert!(fields.currency_code.is_some());
        assert!(fields.total_amount.is_some());
    }

    #[tokio::test]
    async fn empty_image_is_rejected() {
        let result = MockExtractor.extract(&[], "receipt.jpg").await;
        assert_eq!(
            result,
            Err(EngineError::Extraction("empty image".to_string()))
        );
    }
}
