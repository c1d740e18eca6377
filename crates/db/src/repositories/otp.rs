//! OTP persistence.
//!
//! Only SHA-256 digests are stored. Issuing deactivates every active OTP for
//! the same (identifier, purpose), so at most one is ever active. Purposes
//! carry the review cycle; rejection deactivates all of an application's OTPs.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use permitflow_core::signature::{OtpRecord, OtpService};
use permitflow_core::workflow::WorkflowError;

use crate::entities::otp_verifications;

use super::db_error;

/// Deactivates earlier OTPs and stores a new one.
pub(crate) async fn issue<C: ConnectionTrait>(
    conn: &C,
    identifier: &str,
    purpose: &str,
    code: &str,
    expires_at: DateTime<Utc>,
) -> Result<otp_verifications::Model, WorkflowError> {
    deactivate_all(conn, identifier, purpose).await?;

    otp_verifications::ActiveModel {
        id: Set(Uuid::new_v4()),
        identifier: Set(identifier.to_string()),
        purpose: Set(purpose.to_string()),
        code_hash: Set(OtpService::hash_code(code)),
        is_active: Set(true),
        expires_at: Set(expires_at.into()),
        verified_at: Set(None),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await
    .map_err(db_error)
}

/// The active OTP for (identifier, purpose), if any.
pub(crate) async fn find_active<C: ConnectionTrait>(
    conn: &C,
    identifier: &str,
    purpose: &str,
) -> Result<Option<otp_verifications::Model>, WorkflowError> {
    otp_verifications::Entity::find()
        .filter(otp_verifications::Column::Identifier.eq(identifier))
        .filter(otp_verifications::Column::Purpose.eq(purpose))
        .filter(otp_verifications::Column::IsActive.eq(true))
        .order_by_desc(otp_verifications::Column::CreatedAt)
        .one(conn)
        .await
        .map_err(db_error)
}

/// Marks the OTP used. Fails with `OtpNotFound` if another request got there first.
pub(crate) async fn consume<C: ConnectionTrait>(
    conn: &C,
    otp_id: Uuid,
    now: DateTime<Utc>,
) -> Result<(), WorkflowError> {
    let result = otp_verifications::Entity::update_many()
        .col_expr(otp_verifications::Column::IsActive, Expr::value(false))
        .col_expr(
            otp_verifications::Column::VerifiedAt,
            Expr::value(Some(now.fixed_offset())),
        )
        .filter(otp_verifications::Column::Id.eq(otp_id))
        .filter(otp_verifications::Column::IsActive.eq(true))
        .exec(conn)
        .await
        .map_err(db_error)?;
    if result.rows_affected == 0 {
        return Err(WorkflowError::OtpNotFound);
    }
    Ok(())
}

/// Deactivates one OTP without marking it verified.
pub(crate) async fn expire<C: ConnectionTrait>(
    conn: &C,
    otp_id: Uuid,
) -> Result<(), WorkflowError> {
    otp_verifications::Entity::update_many()
        .col_expr(otp_verifications::Column::IsActive, Expr::value(false))
        .filter(otp_verifications::Column::Id.eq(otp_id))
        .exec(conn)
        .await
        .map_err(db_error)?;
    Ok(())
}

/// Deactivates every signing OTP of an application, across officers and stages.
pub(crate) async fn deactivate_for_application<C: ConnectionTrait>(
    conn: &C,
    application_id: Uuid,
) -> Result<u64, WorkflowError> {
    let result = otp_verifications::Entity::update_many()
        .col_expr(otp_verifications::Column::IsActive, Expr::value(false))
        .filter(
            otp_verifications::Column::Purpose.starts_with(OtpService::purpose_prefix(application_id)),
        )
        .filter(otp_verifications::Column::IsActive.eq(true))
        .exec(conn)
        .await
        .map_err(db_error)?;
    Ok(result.rows_affected)
}

async fn deactivate_all<C: ConnectionTrait>(
    conn: &C,
    identifier: &str,
    purpose: &str,
) -> Result<u64, WorkflowError> {
    let result = otp_verifications::Entity::update_many()
        .col_expr(otp_verifications::Column::IsActive, Expr::value(false))
        .filter(otp_verifications::Column::Identifier.eq(identifier))
        .filter(otp_verifications::Column::Purpose.eq(purpose))
        .filter(otp_verifications::Column::IsActive.eq(true))
        .exec(conn)
        .await
        .map_err(db_error)?;
    Ok(result.rows_affected)
}

pub(crate) fn to_record(model: &otp_verifications::Model) -> OtpRecord {
    OtpRecord {
        code_hash: model.code_hash.clone(),
        is_active: model.is_active,
        expires_at: model.expires_at.with_timezone(&Utc),
    }
}
