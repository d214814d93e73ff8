use crate::{
    db::DbPool,
    entities::{procurement, procurement_item},
    errors::ServiceError,
    events::{Event, EventSender},
    notifications::NotificationSender,
    services::procurement_flow::{next_status, ApprovalAction, ProcurementStatus, Role},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionError,
    TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// One requested line: what, how many, estimated unit price.
#[derive(Debug, Clone)]
pub struct NewProcurementLine {
    pub name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// Input for submitting a procurement request.
#[derive(Debug, Clone, Validate)]
pub struct NewProcurement {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,
    pub requested_by: Uuid,
    #[validate(email(message = "Requester email must be a valid address"))]
    pub requester_email: String,
    pub items: Vec<NewProcurementLine>,
}

/// Service driving procurement requests through the two-tier approval
/// chain. Status only ever changes here, through the transition table in
/// [`crate::services::procurement_flow`].
#[derive(Clone)]
pub struct ProcurementService {
    db: Arc<DbPool>,
    event_sender: EventSender,
    notifier: Arc<dyn NotificationSender>,
}

impl ProcurementService {
    pub fn new(
        db: Arc<DbPool>,
        event_sender: EventSender,
        notifier: Arc<dyn NotificationSender>,
    ) -> Self {
        Self {
            db,
            event_sender,
            notifier,
        }
    }

    /// Submits a new request. The total budget is derived from the line
    /// items here and never editable afterwards; header and lines insert
    /// in one transaction.
    #[instrument(skip(self, new_procurement), fields(title = %new_procurement.title))]
    pub async fn create(
        &self,
        new_procurement: NewProcurement,
    ) -> Result<procurement::Model, ServiceError> {
        new_procurement.validate()?;
        if new_procurement.items.is_empty() {
            return Err(ServiceError::ValidationError(
                "a procurement needs at least one line item".to_string(),
            ));
        }
        for line in &new_procurement.items {
            if line.name.trim().is_empty() {
                return Err(ServiceError::ValidationError(
                    "line item name cannot be empty".to_string(),
                ));
            }
            if line.quantity <= 0 {
                return Err(ServiceError::ValidationError(format!(
                    "line item '{}' must have a positive quantity",
                    line.name
                )));
            }
            if line.unit_price < Decimal::ZERO {
                return Err(ServiceError::ValidationError(format!(
                    "line item '{}' cannot have a negative unit price",
                    line.name
                )));
            }
        }

        let total_budget: Decimal = new_procurement
            .items
            .iter()
            .map(|line| Decimal::from(line.quantity) * line.unit_price)
            .sum();

        let saved = self
            .db
            .transaction::<_, procurement::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let header = procurement::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        title: Set(new_procurement.title),
                        total_budget: Set(total_budget),
                        status: Set(ProcurementStatus::Pending.to_string()),
                        rejection_reason: Set(None),
                        requested_by: Set(new_procurement.requested_by),
                        requester_email: Set(new_procurement.requester_email),
                        deleted_at: Set(None),
                        ..Default::default()
                    };
                    let header = header.insert(txn).await?;

                    for line in new_procurement.items {
                        let row = procurement_item::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            procurement_id: Set(header.id),
                            name: Set(line.name),
                            quantity: Set(line.quantity),
                            unit_price: Set(line.unit_price),
                            ..Default::default()
                        };
                        row.insert(txn).await?;
                    }

                    Ok(header)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::from(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(procurement_id = %saved.id, total = %saved.total_budget, "procurement submitted");
        self.event_sender
            .send_or_log(Event::ProcurementCreated(saved.id))
            .await;

        Ok(saved)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, procurement_id: Uuid) -> Result<procurement::Model, ServiceError> {
        procurement::Entity::find_by_id(procurement_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Procurement {} not found", procurement_id))
            })
    }

    /// Lines of a request, in submission order.
    #[instrument(skip(self))]
    pub async fn lines(
        &self,
        procurement_id: Uuid,
    ) -> Result<Vec<procurement_item::Model>, ServiceError> {
        self.get(procurement_id).await?;

        let rows = procurement_item::Entity::find()
            .filter(procurement_item::Column::ProcurementId.eq(procurement_id))
            .order_by_asc(procurement_item::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;
        Ok(rows)
    }

    /// Lists requests that are not soft-deleted, newest first.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<procurement::Model>, ServiceError> {
        let rows = procurement::Entity::find()
            .filter(procurement::Column::DeletedAt.is_null())
            .order_by_desc(procurement::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;
        Ok(rows)
    }

    /// Applies one approval-chain transition.
    ///
    /// The new status is written with a guard on the status the caller's
    /// decision was based on; if a concurrent actor moved the request
    /// first, zero rows match and the call fails with `Conflict` instead
    /// of double-applying. Never retried internally: a business decision
    /// against a stale state is the caller's to reconsider.
    #[instrument(skip(self, reason), fields(procurement_id = %procurement_id, role = %role, action = %action))]
    pub async fn advance(
        &self,
        procurement_id: Uuid,
        role: Role,
        action: ApprovalAction,
        reason: Option<String>,
    ) -> Result<ProcurementStatus, ServiceError> {
        let reason = match action {
            ApprovalAction::Reject => {
                let text = reason
                    .as_deref()
                    .map(str::trim)
                    .unwrap_or_default();
                if text.is_empty() {
                    return Err(ServiceError::ValidationError(
                        "rejection requires a non-empty reason".to_string(),
                    ));
                }
                Some(text.to_string())
            }
            ApprovalAction::Approve => None,
        };

        let existing = self.get(procurement_id).await?;
        let current: ProcurementStatus = existing.status.parse().map_err(|_| {
            ServiceError::InternalError(format!(
                "procurement {} carries unrecognized status '{}'",
                procurement_id, existing.status
            ))
        })?;

        let next = next_status(current, role, action).ok_or_else(|| {
            ServiceError::InvalidOperation(format!(
                "{} may not {} a procurement in state {}",
                role, action, current
            ))
        })?;

        let mut update = procurement::Entity::update_many()
            .col_expr(procurement::Column::Status, Expr::value(next.to_string()))
            .col_expr(
                procurement::Column::UpdatedAt,
                Expr::value(Some(Utc::now())),
            )
            .filter(procurement::Column::Id.eq(procurement_id))
            .filter(procurement::Column::Status.eq(current.to_string()));
        if next == ProcurementStatus::Rejected {
            update = update.col_expr(
                procurement::Column::RejectionReason,
                Expr::value(reason.clone()),
            );
        }

        let result = update.exec(self.db.as_ref()).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::Conflict(format!(
                "procurement {} is no longer in state {}",
                procurement_id, current
            )));
        }

        info!(
            old_status = %current,
            new_status = %next,
            "procurement transitioned"
        );
        self.event_sender
            .send_or_log(Event::ProcurementStatusChanged {
                procurement_id,
                old_status: current.to_string(),
                new_status: next.to_string(),
            })
            .await;

        self.dispatch_notification(&existing, next, reason);

        Ok(next)
    }

    /// Best-effort notification to the requester, off the caller's path.
    /// The transition has already committed; a delivery failure is logged
    /// and swallowed.
    fn dispatch_notification(
        &self,
        procurement: &procurement::Model,
        new_status: ProcurementStatus,
        reason: Option<String>,
    ) {
        let notifier = self.notifier.clone();
        let to = procurement.requester_email.clone();
        let subject = format!("Procurement update: {}", procurement.title);
        let status = new_status.to_string();
        let procurement_id = procurement.id;

        tokio::spawn(async move {
            if let Err(e) = notifier
                .send(&to, &subject, &status, reason.as_deref())
                .await
            {
                warn!(
                    procurement_id = %procurement_id,
                    error = %e,
                    "notification delivery failed"
                );
            }
        });
    }

    /// Soft delete; removed from default listings, `status` untouched.
    #[instrument(skip(self))]
    pub async fn archive(&self, procurement_id: Uuid) -> Result<procurement::Model, ServiceError> {
        let existing = self.get(procurement_id).await?;

        let mut active: procurement::ActiveModel = existing.into();
        active.deleted_at = Set(Some(Utc::now()));
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(self.db.as_ref()).await?;

        self.event_sender
            .send_or_log(Event::ProcurementArchived(procurement_id))
            .await;
        Ok(updated)
    }

    /// Clears the soft-delete marker.
    #[instrument(skip(self))]
    pub async fn restore(&self, procurement_id: Uuid) -> Result<procurement::Model, ServiceError> {
        let existing = self.get(procurement_id).await?;

        let mut active: procurement::ActiveModel = existing.into();
        active.deleted_at = Set(None);
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(self.db.as_ref()).await?;

        self.event_sender
            .send_or_log(Event::ProcurementRestored(procurement_id))
            .await;
        Ok(updated)
    }
}
