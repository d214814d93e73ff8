use crate::{
    db::DbPool,
    entities::{
        stock_item,
        stock_transaction::{self, StockMovement},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionError,
    TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

/// Input for creating a stock item. Items start at quantity zero; stock
/// arrives through IN transactions, never through item creation.
#[derive(Debug, Clone, Validate)]
pub struct NewStockItem {
    #[validate(length(min = 1, max = 150, message = "Item name must be between 1 and 150 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 20, message = "Unit must be between 1 and 20 characters"))]
    pub unit: String,
    #[validate(range(min = 0, message = "Minimum stock cannot be negative"))]
    pub min_stock: i32,
}

/// Service owning consumable stock items and their append-only movement
/// ledger. The cached `quantity` column is written here and nowhere else.
#[derive(Clone)]
pub struct StockLedgerService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl StockLedgerService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, new_item), fields(name = %new_item.name))]
    pub async fn create_item(
        &self,
        new_item: NewStockItem,
    ) -> Result<stock_item::Model, ServiceError> {
        new_item.validate()?;

        let model = stock_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(new_item.name),
            unit: Set(new_item.unit),
            quantity: Set(0),
            min_stock: Set(new_item.min_stock),
            ..Default::default()
        };
        let saved = model.insert(self.db.as_ref()).await?;

        self.event_sender
            .send_or_log(Event::StockItemCreated(saved.id))
            .await;
        Ok(saved)
    }

    #[instrument(skip(self))]
    pub async fn get_item(&self, item_id: Uuid) -> Result<stock_item::Model, ServiceError> {
        stock_item::Entity::find_by_id(item_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Stock item {} not found", item_id)))
    }

    #[instrument(skip(self))]
    pub async fn list_items(&self) -> Result<Vec<stock_item::Model>, ServiceError> {
        let items = stock_item::Entity::find()
            .order_by_asc(stock_item::Column::Name)
            .all(self.db.as_ref())
            .await?;
        Ok(items)
    }

    /// Records a stock movement and updates the item's cached quantity.
    ///
    /// The re-read, the overdraw check, the ledger insert, and the cache
    /// update all run inside one transaction: both writes commit together
    /// or not at all, and concurrent movements on the same item cannot
    /// interleave between the read and the write.
    #[instrument(skip(self, notes), fields(item_id = %item_id, kind = movement.as_str(), qty = quantity))]
    pub async fn apply_transaction(
        &self,
        item_id: Uuid,
        movement: StockMovement,
        quantity: i32,
        notes: Option<String>,
        actor: Uuid,
    ) -> Result<(stock_transaction::Model, i32), ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::ValidationError(format!(
                "Transaction quantity must be positive, got {}",
                quantity
            )));
        }

        let result = self
            .db
            .transaction::<_, (stock_transaction::Model, i32), ServiceError>(move |txn| {
                Box::pin(async move {
                    let item = stock_item::Entity::find_by_id(item_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Stock item {} not found", item_id))
                        })?;

                    if movement == StockMovement::Out && quantity > item.quantity {
                        return Err(ServiceError::InsufficientStock(format!(
                            "Requested {} but only {} {} of '{}' on hand",
                            quantity, item.quantity, item.unit, item.name
                        )));
                    }

                    let new_quantity = item.quantity + movement.sign() * quantity;

                    let ledger_row = stock_transaction::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        stock_item_id: Set(item.id),
                        kind: Set(movement.as_str().to_string()),
                        quantity: Set(quantity),
                        notes: Set(notes),
                        created_by: Set(actor),
                        ..Default::default()
                    };
                    let saved_row = ledger_row.insert(txn).await?;

                    let mut active_item: stock_item::ActiveModel = item.into();
                    active_item.quantity = Set(new_quantity);
                    active_item.updated_at = Set(Some(Utc::now()));
                    active_item.update(txn).await?;

                    Ok((saved_row, new_quantity))
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::from(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        let (transaction, new_quantity) = &result;
        info!(
            transaction_id = %transaction.id,
            new_quantity,
            "stock transaction applied"
        );
        self.event_sender
            .send_or_log(Event::StockTransactionApplied {
                stock_item_id: transaction.stock_item_id,
                transaction_id: transaction.id,
                kind: transaction.kind.clone(),
                quantity: transaction.quantity,
                new_quantity: *new_quantity,
            })
            .await;

        Ok(result)
    }

    /// Full movement history for an item, oldest first.
    #[instrument(skip(self))]
    pub async fn history(
        &self,
        item_id: Uuid,
    ) -> Result<Vec<stock_transaction::Model>, ServiceError> {
        // Existence check keeps "no such item" distinct from "no movements".
        self.get_item(item_id).await?;

        let rows = stock_transaction::Entity::find()
            .filter(stock_transaction::Column::StockItemId.eq(item_id))
            .order_by_asc(stock_transaction::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;
        Ok(rows)
    }

    /// Items at or below their reorder threshold. Informational only.
    #[instrument(skip(self))]
    pub async fn below_min_stock(&self) -> Result<Vec<stock_item::Model>, ServiceError> {
        let items = stock_item::Entity::find()
            .filter(
                Expr::col(stock_item::Column::Quantity)
                    .lte(Expr::col(stock_item::Column::MinStock)),
            )
            .order_by_asc(stock_item::Column::Name)
            .all(self.db.as_ref())
            .await?;
        Ok(items)
    }

    /// Administrative bulk delete: removes the item and its whole ledger
    /// in one transaction. The only path that deletes ledger rows.
    #[instrument(skip(self))]
    pub async fn purge_item(&self, item_id: Uuid) -> Result<(), ServiceError> {
        self.db
            .transaction::<_, (), ServiceError>(move |txn| {
                Box::pin(async move {
                    stock_transaction::Entity::delete_many()
                        .filter(stock_transaction::Column::StockItemId.eq(item_id))
                        .exec(txn)
                        .await?;

                    let result = stock_item::Entity::delete_by_id(item_id).exec(txn).await?;
                    if result.rows_affected == 0 {
                        return Err(ServiceError::NotFound(format!(
                            "Stock item {} not found",
                            item_id
                        )));
                    }
                    Ok(())
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::from(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        self.event_sender
            .send_or_log(Event::StockItemPurged(item_id))
            .await;
        Ok(())
    }
}
