//! Initial schema: officers, applications and everything hanging off them.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Officers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Officers::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Officers::Name).string_len(200).not_null())
                    .col(
                        ColumnDef::new(Officers::Email)
                            .string_len(320)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Officers::Mobile).string_len(20).null())
                    .col(ColumnDef::new(Officers::Role).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Officers::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Officers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_officers_role")
                    .table(Officers::Table)
                    .col(Officers::Role)
                    .col(Officers::IsActive)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Applications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Applications::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Applications::ApplicationNumber)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Applications::ApplicantId).uuid().not_null())
                    .col(
                        ColumnDef::new(Applications::ApplicantName)
                            .string_len(200)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Applications::ApplicantEmail)
                            .string_len(320)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Applications::ApplicantMobile)
                            .string_len(20)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Applications::PositionType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Applications::Status)
                            .string_len(32)
                            .not_null()
                            .default("draft"),
                    )
                    .col(
                        ColumnDef::new(Applications::Cycle)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Applications::Version)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Applications::CertificateNumber)
                            .string_len(32)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Applications::SubmittedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Applications::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Applications::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Applications::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_applications_applicant")
                    .table(Applications::Table)
                    .col(Applications::ApplicantId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ApplicationStatusHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ApplicationStatusHistory::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ApplicationStatusHistory::ApplicationId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ApplicationStatusHistory::FromStatus)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ApplicationStatusHistory::Status)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ApplicationStatusHistory::UpdatedBy)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ApplicationStatusHistory::Remarks).text().null())
                    .col(
                        ColumnDef::new(ApplicationStatusHistory::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_status_history_application")
                            .from(
                                ApplicationStatusHistory::Table,
                                ApplicationStatusHistory::ApplicationId,
                            )
                            .to(Applications::Table, Applications::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_status_history_application")
                    .table(ApplicationStatusHistory::Table)
                    .col(ApplicationStatusHistory::ApplicationId)
                    .col(ApplicationStatusHistory::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(StageReviews::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StageReviews::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(StageReviews::ApplicationId).uuid().not_null())
                    .col(ColumnDef::new(StageReviews::Stage).string_len(16).not_null())
                    .col(ColumnDef::new(StageReviews::Cycle).integer().not_null())
                    .col(ColumnDef::new(StageReviews::OfficerId).uuid().not_null())
                    .col(
                        ColumnDef::new(StageReviews::AssignedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StageReviews::Approved)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(StageReviews::ApprovedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(StageReviews::Rejected)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(StageReviews::RejectionComments).text().null())
                    .col(
                        ColumnDef::new(StageReviews::RejectedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(StageReviews::SignatureApplied)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(StageReviews::SignedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(StageReviews::SignedDocumentRef)
                            .string_len(512)
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_stage_reviews_application")
                            .from(StageReviews::Table, StageReviews::ApplicationId)
                            .to(Applications::Table, Applications::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_stage_reviews_officer")
                            .from(StageReviews::Table, StageReviews::OfficerId)
                            .to(Officers::Table, Officers::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_stage_reviews_application_stage_cycle")
                    .table(StageReviews::Table)
                    .col(StageReviews::ApplicationId)
                    .col(StageReviews::Stage)
                    .col(StageReviews::Cycle)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Officer queue and workload lookups
        manager
            .create_index(
                Index::create()
                    .name("idx_stage_reviews_officer_open")
                    .table(StageReviews::Table)
                    .col(StageReviews::OfficerId)
                    .col(StageReviews::Approved)
                    .col(StageReviews::Rejected)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ApplicationDocuments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ApplicationDocuments::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ApplicationDocuments::ApplicationId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ApplicationDocuments::DocumentType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ApplicationDocuments::FileName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ApplicationDocuments::FilePath)
                            .string_len(512)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ApplicationDocuments::Verified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(ApplicationDocuments::VerifiedBy).uuid().null())
                    .col(
                        ColumnDef::new(ApplicationDocuments::VerifiedStage)
                            .string_len(16)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ApplicationDocuments::VerifiedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(ApplicationDocuments::Remarks).text().null())
                    .col(
                        ColumnDef::new(ApplicationDocuments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ApplicationDocuments::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_application_documents_application")
                            .from(
                                ApplicationDocuments::Table,
                                ApplicationDocuments::ApplicationId,
                            )
                            .to(Applications::Table, Applications::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_application_documents_application")
                    .table(ApplicationDocuments::Table)
                    .col(ApplicationDocuments::ApplicationId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Payments::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Payments::ApplicationId).uuid().not_null())
                    .col(
                        ColumnDef::new(Payments::OrderId)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Payments::TransactionId).string_len(128).null())
                    .col(ColumnDef::new(Payments::AmountPaise).big_integer().not_null())
                    .col(ColumnDef::new(Payments::Currency).string_len(3).not_null())
                    .col(ColumnDef::new(Payments::Status).string_len(16).not_null())
                    .col(ColumnDef::new(Payments::Method).string_len(32).null())
                    .col(ColumnDef::new(Payments::GatewayResponse).json().null())
                    .col(
                        ColumnDef::new(Payments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Payments::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_application")
                            .from(Payments::Table, Payments::ApplicationId)
                            .to(Applications::Table, Applications::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OtpVerifications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OtpVerifications::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(OtpVerifications::Identifier)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OtpVerifications::Purpose)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OtpVerifications::CodeHash)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OtpVerifications::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(OtpVerifications::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OtpVerifications::VerifiedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(OtpVerifications::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_otp_verifications_lookup")
                    .table(OtpVerifications::Table)
                    .col(OtpVerifications::Identifier)
                    .col(OtpVerifications::Purpose)
                    .col(OtpVerifications::IsActive)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OtpVerifications::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ApplicationDocuments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(StageReviews::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ApplicationStatusHistory::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Applications::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Officers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Officers {
    Table,
    Id,
    Name,
    Email,
    Mobile,
    Role,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Applications {
    Table,
    Id,
    ApplicationNumber,
    ApplicantId,
    ApplicantName,
    ApplicantEmail,
    ApplicantMobile,
    PositionType,
    Status,
    Cycle,
    Version,
    CertificateNumber,
    SubmittedAt,
    CompletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ApplicationStatusHistory {
    Table,
    Id,
    ApplicationId,
    FromStatus,
    Status,
    UpdatedBy,
    Remarks,
    CreatedAt,
}

#[derive(DeriveIden)]
enum StageReviews {
    Table,
    Id,
    ApplicationId,
    Stage,
    Cycle,
    OfficerId,
    AssignedAt,
    Approved,
    ApprovedAt,
    Rejected,
    RejectionComments,
    RejectedAt,
    SignatureApplied,
    SignedAt,
    SignedDocumentRef,
}

#[derive(DeriveIden)]
enum ApplicationDocuments {
    Table,
    Id,
    ApplicationId,
    DocumentType,
    FileName,
    FilePath,
    Verified,
    VerifiedBy,
    VerifiedStage,
    VerifiedAt,
    Remarks,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Payments {
    Table,
    Id,
    ApplicationId,
    OrderId,
    TransactionId,
    AmountPaise,
    Currency,
    Status,
    Method,
    GatewayResponse,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum OtpVerifications {
    Table,
    Id,
    Identifier,
    Purpose,
    CodeHash,
    IsActive,
    ExpiresAt,
    VerifiedAt,
    CreatedAt,
}
