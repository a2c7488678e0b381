//! 访问日志表迁移
//!
//! 记录跳转请求的原始属性（IP、User-Agent、Referer），由跳转服务本地写入。

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(VisitLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VisitLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(VisitLogs::ShortCode).string_len(64).not_null())
                    .col(ColumnDef::new(VisitLogs::Ip).string_len(45).null())
                    .col(ColumnDef::new(VisitLogs::UserAgent).string_len(500).null())
                    .col(ColumnDef::new(VisitLogs::Referer).string_len(500).null())
                    .col(
                        ColumnDef::new(VisitLogs::VisitedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 单链接时间序列查询
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_visit_logs_code_time")
                    .table(VisitLogs::Table)
                    .col(VisitLogs::ShortCode)
                    .col(VisitLogs::VisitedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_visit_logs_code_time").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(VisitLogs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum VisitLogs {
    Table,
    Id,
    ShortCode,
    Ip,
    UserAgent,
    Referer,
    VisitedAt,
}
