//! Receipt records.
//!
//! A [`Receipt`] is one uploaded receipt. Its extraction facts (amount,
//! currency, transaction date) are set at ingestion and never touched again;
//! the conversion state (`converted_total` + `base_currency`) is owned by the
//! engine and only ever written by a successful reconciliation. The two
//! conversion fields are set together or not at all.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveValue, Condition, DatabaseConnection, QueryFilter, QueryOrder, QuerySelect,
    entity::prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::ResultEngine;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
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

/// Ingestion payload: everything a receipt has before any reconciliation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewReceipt {
    pub file_name: String,
    pub merchant_name: Option<String>,
    pub transaction_date: Option<NaiveDate>,
    pub original_currency: Option<String>,
    pub original_total: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "receipts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub file_name: String,
    pub upload_time: DateTimeUtc,
    pub merchant_name: Option<String>,
    pub transaction_date: Option<Date>,
    pub original_currency: Option<String>,
    pub original_total: Option<f64>,
    pub base_currency: Option<String>,
    pub converted_total: Option<f64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ledger::Entity")]
    Reconciliations,
}

impl Related<super::ledger::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reconciliations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Receipt {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            file_name: model.file_name,
            upload_time: model.upload_time,
            merchant_name: model.merchant_name,
            transaction_date: model.transaction_date,
            original_currency: model.original_currency,
            original_total: model.original_total,
            base_currency: model.base_currency,
            converted_total: model.converted_total,
        }
    }
}

pub(crate) async fn insert(
    db: &DatabaseConnection,
    receipt: &NewReceipt,
    upload_time: DateTime<Utc>,
) -> ResultEngine<i32> {
    let model = ActiveModel {
        id: ActiveValue::NotSet,
        file_name: ActiveValue::Set(receipt.file_name.clone()),
        upload_time: ActiveValue::Set(upload_time),
        merchant_name: ActiveValue::Set(receipt.merchant_name.clone()),
        transaction_date: ActiveValue::Set(receipt.transaction_date),
        original_currency: ActiveValue::Set(receipt.original_currency.clone()),
        original_total: ActiveValue::Set(receipt.original_total),
        base_currency: ActiveValue::Set(None),
        converted_total: ActiveValue::Set(None),
    };
    let inserted = model.insert(db).await?;
    Ok(inserted.id)
}

pub(crate) async fn by_id(db: &DatabaseConnection, id: i32) -> ResultEngine<Option<Receipt>> {
    let model = Entity::find_by_id(id).one(db).await?;
    Ok(model.map(Receipt::from))
}

pub(crate) async fn all(db: &DatabaseConnection) -> ResultEngine<Vec<Receipt>> {
    let models = Entity::find()
        .order_by_desc(Column::UploadTime)
        .order_by_desc(Column::Id)
        .all(db)
        .await?;
    Ok(models.into_iter().map(Receipt::from).collect())
}

/// Overwrite the conversion state. Both fields move together so the
/// "converted iff base set" invariant cannot be broken halfway.
pub(crate) async fn update_conversion(
    db: &DatabaseConnection,
    id: i32,
    converted_total: f64,
    base_currency: &str,
) -> ResultEngine<()> {
    let model = ActiveModel {
        id: ActiveValue::Set(id),
        converted_total: ActiveValue::Set(Some(converted_total)),
        base_currency: ActiveValue::Set(Some(base_currency.to_string())),
        ..Default::default()
    };
    model.update(db).await?;
    Ok(())
}

/// Ids of receipts that can be reconciled at all: the three extraction facts
/// are present. With `pending_for` set, already-converted receipts whose base
/// currency matches are skipped (the "pending" mode of the callers).
pub(crate) async fn eligible_ids(
    db: &DatabaseConnection,
    pending_for: Option<&str>,
) -> ResultEngine<Vec<i32>> {
    let mut query = Entity::find()
        .select_only()
        .column(Column::Id)
        .filter(Column::OriginalTotal.is_not_null())
        .filter(Column::OriginalCurrency.is_not_null())
        .filter(Column::TransactionDate.is_not_null());

    if let Some(base_currency) = pending_for {
        query = query.filter(
            Condition::any()
                .add(Column::ConvertedTotal.is_null())
                .add(Column::BaseCurrency.ne(base_currency)),
        );
    }

    let ids = query
        .order_by_asc(Column::Id)
        .into_tuple::<i32>()
        .all(db)
        .await?;
    Ok(ids)
}
