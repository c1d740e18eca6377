//! Payment rows.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use permitflow_core::payment::{CallbackOutcome, PaymentError, PaymentStatus};
use permitflow_core::workflow::WorkflowError;
use permitflow_shared::types::Money;

use crate::entities::payments;

use super::db_error;

pub(crate) async fn find_by_order<C: ConnectionTrait>(
    conn: &C,
    order_id: &str,
) -> Result<payments::Model, WorkflowError> {
    payments::Entity::find()
        .filter(payments::Column::OrderId.eq(order_id))
        .one(conn)
        .await
        .map_err(db_error)?
        .ok_or_else(|| PaymentError::OrderNotFound(order_id.to_string()).into())
}

/// Most recent payment attempt of an application.
pub(crate) async fn latest_for_application<C: ConnectionTrait>(
    conn: &C,
    application_id: Uuid,
) -> Result<Option<payments::Model>, WorkflowError> {
    payments::Entity::find()
        .filter(payments::Column::ApplicationId.eq(application_id))
        .order_by_desc(payments::Column::CreatedAt)
        .one(conn)
        .await
        .map_err(db_error)
}

/// The completed payment of an application, if any.
pub(crate) async fn completed_for_application<C: ConnectionTrait>(
    conn: &C,
    application_id: Uuid,
) -> Result<Option<payments::Model>, WorkflowError> {
    payments::Entity::find()
        .filter(payments::Column::ApplicationId.eq(application_id))
        .filter(payments::Column::Status.eq(PaymentStatus::Completed.as_str()))
        .order_by_desc(payments::Column::UpdatedAt)
        .one(conn)
        .await
        .map_err(db_error)
}

pub(crate) async fn create_pending<C: ConnectionTrait>(
    conn: &C,
    application_id: Uuid,
    order_id: String,
    amount: &Money,
) -> Result<payments::Model, WorkflowError> {
    let amount_paise = amount
        .to_minor_units()
        .ok_or_else(|| PaymentError::InvalidAmount(amount.to_string()))?;
    let now = Utc::now().into();
    payments::ActiveModel {
        id: Set(Uuid::new_v4()),
        application_id: Set(application_id),
        order_id: Set(order_id),
        transaction_id: Set(None),
        amount_paise: Set(amount_paise),
        currency: Set(amount.currency.to_string()),
        status: Set(PaymentStatus::Pending.as_str().to_string()),
        method: Set(None),
        gateway_response: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await
    .map_err(db_error)
}

/// Settles a pending payment. Returns false if it was no longer pending.
pub(crate) async fn settle<C: ConnectionTrait>(
    conn: &C,
    payment_id: Uuid,
    outcome: &CallbackOutcome,
    gateway_response: serde_json::Value,
) -> Result<bool, WorkflowError> {
    let result = payments::Entity::update_many()
        .col_expr(
            payments::Column::Status,
            Expr::value(outcome.payment_status().as_str()),
        )
        .col_expr(
            payments::Column::TransactionId,
            Expr::value(Some(outcome.transaction_id().to_string())),
        )
        .col_expr(payments::Column::GatewayResponse, Expr::value(gateway_response))
        .col_expr(
            payments::Column::UpdatedAt,
            Expr::value(Utc::now().fixed_offset()),
        )
        .filter(payments::Column::Id.eq(payment_id))
        .filter(payments::Column::Status.eq(PaymentStatus::Pending.as_str()))
        .exec(conn)
        .await
        .map_err(db_error)?;
    Ok(result.rows_affected == 1)
}

pub(crate) fn parse_status(model: &payments::Model) -> Result<PaymentStatus, WorkflowError> {
    PaymentStatus::parse(&model.status).ok_or_else(|| {
        WorkflowError::Database(format!(
            "payment {} has unknown status '{}'",
            model.id, model.status
        ))
    })
}
