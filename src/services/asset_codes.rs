use crate::{
    db::DbPool,
    entities::asset,
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{Datelike, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
    TransactionError, TransactionTrait,
};
use std::sync::Arc;
use uuid::Uuid;
use tracing::{info, instrument, warn};
use validator::Validate;

/// Institution prefix carried by every asset code.
pub const CODE_PREFIX: &str = "SMK";

/// Sequence numbers are derived from a live count, so two concurrent
/// registrations can propose the same code. The unique index rejects the
/// loser, which re-counts and tries again up to this bound.
const MAX_ALLOCATION_ATTEMPTS: u32 = 5;

const CATEGORY_CODE_LEN: usize = 4;

/// Input for registering one asset.
#[derive(Debug, Clone, Validate)]
pub struct NewAsset {
    #[validate(length(min = 1, max = 150, message = "Asset name must be between 1 and 150 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 50, message = "Category must be between 1 and 50 characters"))]
    pub category: String,
    /// Defaults to the current year when the purchase date is unknown.
    pub purchase_year: Option<i32>,
    pub condition: Option<String>,
}

/// Renders `SMK/{CAT}/{YEAR}/{SEQ}`.
///
/// `CAT` is the category uppercased and truncated to its first four
/// characters; a shorter category is used as-is, never padded
/// (`SMK/LAB/2026/001` is a valid code).
pub fn format_asset_code(category: &str, year: i32, seq: u64) -> String {
    let cat: String = category
        .trim()
        .to_uppercase()
        .chars()
        .take(CATEGORY_CODE_LEN)
        .collect();
    format!("{}/{}/{}/{:03}", CODE_PREFIX, cat, year, seq)
}

/// Service minting unique human-readable asset codes and owning the asset
/// lifecycle around them.
#[derive(Clone)]
pub struct AssetCodeService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl AssetCodeService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Registers an asset under a freshly allocated code.
    ///
    /// Counts existing assets in the `(category, year)` bucket, proposes
    /// `count + 1`, and inserts. A unique-index rejection means a
    /// concurrent registration won the same sequence number; the loop
    /// re-counts and retries. Exhausting the bound surfaces
    /// `CodeSpaceContended` so the caller can prompt a retry instead of
    /// receiving a miscoded asset.
    #[instrument(skip(self, new_asset), fields(category = %new_asset.category))]
    pub async fn register_asset(&self, new_asset: NewAsset) -> Result<asset::Model, ServiceError> {
        new_asset.validate()?;
        let year = new_asset
            .purchase_year
            .unwrap_or_else(|| Utc::now().year());

        let db = self.db.as_ref();

        for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
            let code = self.propose_code(db, &new_asset.category, year).await?;

            let model = asset::ActiveModel {
                id: Set(Uuid::new_v4()),
                code: Set(code.clone()),
                name: Set(new_asset.name.clone()),
                category: Set(new_asset.category.clone()),
                purchase_year: Set(year),
                condition: Set(new_asset.condition.clone()),
                deleted_at: Set(None),
                ..Default::default()
            };

            match model.insert(db).await {
                Ok(saved) => {
                    info!(code = %saved.code, asset_id = %saved.id, "asset registered");
                    self.event_sender
                        .send_or_log(Event::AssetRegistered {
                            asset_id: saved.id,
                            code: saved.code.clone(),
                        })
                        .await;
                    return Ok(saved);
                }
                Err(e) => {
                    let err = ServiceError::from(e);
                    if err.is_unique_violation() {
                        warn!(attempt, code = %code, "asset code collision, retrying");
                        continue;
                    }
                    return Err(err);
                }
            }
        }

        Err(ServiceError::CodeSpaceContended(format!(
            "could not allocate a code for category '{}' year {} after {} attempts",
            new_asset.category, year, MAX_ALLOCATION_ATTEMPTS
        )))
    }

    /// Registers a batch of assets, all-or-nothing.
    ///
    /// Every count+insert cycle runs inside one transaction, so sibling
    /// counts observe the batch's own provisional inserts and sequence
    /// numbers within the batch cannot collide with each other. A
    /// collision with a concurrent writer rolls the whole batch back and
    /// retries it.
    #[instrument(skip(self, new_assets), fields(batch = new_assets.len()))]
    pub async fn register_assets_bulk(
        &self,
        new_assets: Vec<NewAsset>,
    ) -> Result<Vec<asset::Model>, ServiceError> {
        if new_assets.is_empty() {
            return Err(ServiceError::ValidationError(
                "bulk registration requires at least one asset".to_string(),
            ));
        }
        for new_asset in &new_assets {
            new_asset.validate()?;
        }

        for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
            let batch = new_assets.clone();
            let result = self
                .db
                .transaction::<_, Vec<asset::Model>, ServiceError>(move |txn| {
                    Box::pin(async move {
                        let mut saved = Vec::with_capacity(batch.len());
                        for new_asset in batch {
                            let year = new_asset
                                .purchase_year
                                .unwrap_or_else(|| Utc::now().year());
                            let count = asset::Entity::find()
                                .filter(asset::Column::Category.eq(new_asset.category.clone()))
                                .filter(asset::Column::PurchaseYear.eq(year))
                                .count(txn)
                                .await?;
                            let code = format_asset_code(&new_asset.category, year, count + 1);

                            let model = asset::ActiveModel {
                                id: Set(Uuid::new_v4()),
                                code: Set(code),
                                name: Set(new_asset.name),
                                category: Set(new_asset.category),
                                purchase_year: Set(year),
                                condition: Set(new_asset.condition),
                                deleted_at: Set(None),
                                ..Default::default()
                            };
                            saved.push(model.insert(txn).await?);
                        }
                        Ok(saved)
                    })
                })
                .await;

            match result {
                Ok(saved) => {
                    info!(count = saved.len(), "asset batch registered");
                    for asset in &saved {
                        self.event_sender
                            .send_or_log(Event::AssetRegistered {
                                asset_id: asset.id,
                                code: asset.code.clone(),
                            })
                            .await;
                    }
                    return Ok(saved);
                }
                Err(TransactionError::Connection(db_err)) => return Err(db_err.into()),
                Err(TransactionError::Transaction(err)) => {
                    if err.is_unique_violation() {
                        warn!(attempt, "bulk registration collided with concurrent writer, retrying");
                        continue;
                    }
                    return Err(err);
                }
            }
        }

        Err(ServiceError::CodeSpaceContended(format!(
            "bulk registration kept colliding after {} attempts",
            MAX_ALLOCATION_ATTEMPTS
        )))
    }

    /// Proposes the next code for a `(category, year)` bucket. The count
    /// includes soft-deleted rows: a retired asset keeps its code forever,
    /// so sequence numbers are never reissued.
    async fn propose_code<C>(
        &self,
        conn: &C,
        category: &str,
        year: i32,
    ) -> Result<String, ServiceError>
    where
        C: sea_orm::ConnectionTrait,
    {
        let count = asset::Entity::find()
            .filter(asset::Column::Category.eq(category))
            .filter(asset::Column::PurchaseYear.eq(year))
            .count(conn)
            .await?;
        Ok(format_asset_code(category, year, count + 1))
    }

    #[instrument(skip(self))]
    pub async fn get_asset(&self, asset_id: Uuid) -> Result<asset::Model, ServiceError> {
        asset::Entity::find_by_id(asset_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Asset {} not found", asset_id)))
    }

    /// Soft-deletes an asset. The code stays reserved.
    #[instrument(skip(self))]
    pub async fn archive_asset(&self, asset_id: Uuid) -> Result<asset::Model, ServiceError> {
        let existing = self.get_asset(asset_id).await?;

        let mut active: asset::ActiveModel = existing.into();
        active.deleted_at = Set(Some(Utc::now()));
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(self.db.as_ref()).await?;

        self.event_sender.send_or_log(Event::AssetArchived(asset_id)).await;
        Ok(updated)
    }

    /// Clears the soft-delete marker.
    #[instrument(skip(self))]
    pub async fn restore_asset(&self, asset_id: Uuid) -> Result<asset::Model, ServiceError> {
        let existing = self.get_asset(asset_id).await?;

        let mut active: asset::ActiveModel = existing.into();
        active.deleted_at = Set(None);
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(self.db.as_ref()).await?;

        self.event_sender.send_or_log(Event::AssetRestored(asset_id)).await;
        Ok(updated)
    }

    /// Hard delete. Only the explicit purge path removes asset rows.
    #[instrument(skip(self))]
    pub async fn purge_asset(&self, asset_id: Uuid) -> Result<(), ServiceError> {
        let result = asset::Entity::delete_by_id(asset_id)
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Asset {} not found",
                asset_id
            )));
        }
        self.event_sender.send_or_log(Event::AssetPurged(asset_id)).await;
        Ok(())
    }

    /// Lists assets that are not soft-deleted.
    #[instrument(skip(self))]
    pub async fn list_assets(&self) -> Result<Vec<asset::Model>, ServiceError> {
        let assets = asset::Entity::find()
            .filter(asset::Column::DeletedAt.is_null())
            .all(self.db.as_ref())
            .await?;
        Ok(assets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_category_is_truncated_to_four_chars() {
        assert_eq!(format_asset_code("ELEKTRONIK", 2026, 1), "SMK/ELEK/2026/001");
        assert_eq!(format_asset_code("elektronik", 2026, 2), "SMK/ELEK/2026/002");
    }

    #[test]
    fn short_category_is_used_unpadded() {
        assert_eq!(format_asset_code("LAB", 2026, 7), "SMK/LAB/2026/007");
        assert_eq!(format_asset_code("it", 2024, 12), "SMK/IT/2024/012");
    }

    #[test]
    fn sequence_grows_past_three_digits_without_truncation() {
        assert_eq!(format_asset_code("MEJA", 2025, 1000), "SMK/MEJA/2025/1000");
    }

    #[test]
    fn category_whitespace_is_trimmed() {
        assert_eq!(format_asset_code("  MEJA ", 2025, 3), "SMK/MEJA/2025/003");
    }

    #[test]
    fn new_asset_validation_rejects_empty_fields() {
        let blank_name = NewAsset {
            name: String::new(),
            category: "MEJA".to_string(),
            purchase_year: Some(2025),
            condition: None,
        };
        assert!(blank_name.validate().is_err());

        let blank_category = NewAsset {
            name: "Meja guru".to_string(),
            category: String::new(),
            purchase_year: None,
            condition: None,
        };
        assert!(blank_category.validate().is_err());
    }
}
