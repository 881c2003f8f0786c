//! Reconciliation ledger.
//!
//! One [`ReconciliationEntry`] per reconciliation *attempt*, appended and
//! never mutated. A later attempt may supersede an earlier one's effect on
//! the receipt, but the full history stays readable. Success rows carry a
//! rate and a converted total; failure rows carry neither, only the reason
//! in `status`/`notes`.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, DatabaseConnection, QueryOrder, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::ResultEngine;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationEntry {
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
    /// Denormalized from the receipt for display.
    pub file_name: Option<String>,
    pub merchant_name: Option<String>,
}

/// An attempt about to be appended; the sequence id is assigned by the store.
#[derive(Clone, Debug)]
pub(crate) struct NewEntry {
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

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "reconciliations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub receipt_id: i32,
    pub reconciliation_time: DateTimeUtc,
    pub transaction_date: Option<Date>,
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

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::receipts::Entity",
        from = "Column::ReceiptId",
        to = "super::receipts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Receipts,
}

impl Related<super::receipts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Receipts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for ReconciliationEntry {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            receipt_id: model.receipt_id,
            reconciliation_time: model.reconciliation_time,
            transaction_date: model.transaction_date,
            original_currency: model.original_currency,
            original_total: model.original_total,
            base_currency: model.base_currency,
            converted_total: model.converted_total,
            exchange_rate: model.exchange_rate,
            rate_source: model.rate_source,
            status: model.status,
            notes: model.notes,
            file_name: model.file_name,
            merchant_name: model.merchant_name,
        }
    }
}

impl From<&NewEntry> for ActiveModel {
    fn from(entry: &NewEntry) -> Self {
        Self {
            id: ActiveValue::NotSet,
            receipt_id: ActiveValue::Set(entry.receipt_id),
            reconciliation_time: ActiveValue::Set(entry.reconciliation_time),
            transaction_date: ActiveValue::Set(entry.transaction_date),
            original_currency: ActiveValue::Set(entry.original_currency.clone()),
            original_total: ActiveValue::Set(entry.original_total),
            base_currency: ActiveValue::Set(entry.base_currency.clone()),
            converted_total: ActiveValue::Set(entry.converted_total),
            exchange_rate: ActiveValue::Set(entry.exchange_rate),
            rate_source: ActiveValue::Set(entry.rate_source.clone()),
            status: ActiveValue::Set(entry.status.clone()),
            notes: ActiveValue::Set(entry.notes.clone()),
            file_name: ActiveValue::Set(entry.file_name.clone()),
            merchant_name: ActiveValue::Set(entry.merchant_name.clone()),
        }
    }
}

pub(crate) async fn append(db: &DatabaseConnection, entry: &NewEntry) -> ResultEngine<()> {
    ActiveModel::from(entry).insert(db).await?;
    Ok(())
}

pub(crate) async fn history(db: &DatabaseConnection) -> ResultEngine<Vec<ReconciliationEntry>> {
    let models = Entity::find()
        .order_by_desc(Column::ReconciliationTime)
        .order_by_desc(Column::Id)
        .all(db)
        .await?;
    Ok(models.into_iter().map(ReconciliationEntry::from).collect())
}
