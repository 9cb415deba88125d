use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CustomerSessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CustomerSessions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CustomerSessions::CustomerId).uuid().not_null())
                    .col(
                        ColumnDef::new(CustomerSessions::Token)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(CustomerSessions::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CustomerSessions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(CustomerSessions::Table, CustomerSessions::CustomerId)
                            .to(Customers::Table, Customers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(CustomerSessions::Table)
                    .col(CustomerSessions::CustomerId)
                    .name("idx_customer_sessions_customer_id")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CustomerSessions::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum CustomerSessions {
    Table,
    Id,
    CustomerId,
    Token,
    ExpiresAt,
    CreatedAt,
}

#[derive(Iden)]
enum Customers {
    Table,
    Id,
}
