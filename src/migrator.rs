use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_assets_table::Migration),
            Box::new(m20240101_000002_create_stock_tables::Migration),
            Box::new(m20240101_000003_create_procurement_tables::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_assets_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_assets_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Create assets table aligned with entities::asset Model
            manager
                .create_table(
                    Table::create()
                        .table(Assets::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Assets::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Assets::Code).string().not_null())
                        .col(ColumnDef::new(Assets::Name).string().not_null())
                        .col(ColumnDef::new(Assets::Category).string().not_null())
                        .col(ColumnDef::new(Assets::PurchaseYear).integer().not_null())
                        .col(ColumnDef::new(Assets::Condition).string().null())
                        .col(ColumnDef::new(Assets::DeletedAt).timestamp().null())
                        .col(ColumnDef::new(Assets::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Assets::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            // The unique index on code is what makes concurrent allocation
            // conflicts detectable.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_assets_code_unique")
                        .table(Assets::Table)
                        .col(Assets::Code)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_assets_category_year")
                        .table(Assets::Table)
                        .col(Assets::Category)
                        .col(Assets::PurchaseYear)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Assets::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Assets {
        Table,
        Id,
        Code,
        Name,
        Category,
        PurchaseYear,
        Condition,
        DeletedAt,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_stock_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_stock_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Create stock_items table
            manager
                .create_table(
                    Table::create()
                        .table(StockItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockItems::Name).string().not_null())
                        .col(ColumnDef::new(StockItems::Unit).string().not_null())
                        .col(
                            ColumnDef::new(StockItems::Quantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(StockItems::MinStock)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(StockItems::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(StockItems::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            // Create stock_transactions table
            manager
                .create_table(
                    Table::create()
                        .table(StockTransactions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockTransactions::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockTransactions::StockItemId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockTransactions::Kind).string().not_null())
                        .col(
                            ColumnDef::new(StockTransactions::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockTransactions::Notes).string().null())
                        .col(
                            ColumnDef::new(StockTransactions::CreatedBy)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockTransactions::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stock_transactions_stock_item_id")
                                .from(StockTransactions::Table, StockTransactions::StockItemId)
                                .to(StockItems::Table, StockItems::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_transactions_stock_item_id")
                        .table(StockTransactions::Table)
                        .col(StockTransactions::StockItemId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockTransactions::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(StockItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum StockItems {
        Table,
        Id,
        Name,
        Unit,
        Quantity,
        MinStock,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum StockTransactions {
        Table,
        Id,
        StockItemId,
        Kind,
        Quantity,
        Notes,
        CreatedBy,
        CreatedAt,
    }
}

mod m20240101_000003_create_procurement_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_procurement_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Create procurements table
            manager
                .create_table(
                    Table::create()
                        .table(Procurements::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Procurements::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Procurements::Title).string().not_null())
                        .col(
                            ColumnDef::new(Procurements::TotalBudget)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Procurements::Status)
                                .string()
                                .not_null()
                                .default("PENDING"),
                        )
                        .col(
                            ColumnDef::new(Procurements::RejectionReason)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(Procurements::RequestedBy).uuid().not_null())
                        .col(
                            ColumnDef::new(Procurements::RequesterEmail)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Procurements::DeletedAt).timestamp().null())
                        .col(
                            ColumnDef::new(Procurements::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Procurements::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_procurements_status")
                        .table(Procurements::Table)
                        .col(Procurements::Status)
                        .to_owned(),
                )
                .await?;

            // Create procurement_items table
            manager
                .create_table(
                    Table::create()
                        .table(ProcurementItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProcurementItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProcurementItems::ProcurementId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProcurementItems::Name).string().not_null())
                        .col(
                            ColumnDef::new(ProcurementItems::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProcurementItems::UnitPrice)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProcurementItems::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_procurement_items_procurement_id")
                                .from(ProcurementItems::Table, ProcurementItems::ProcurementId)
                                .to(Procurements::Table, Procurements::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_procurement_items_procurement_id")
                        .table(ProcurementItems::Table)
                        .col(ProcurementItems::ProcurementId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProcurementItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Procurements::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Procurements {
        Table,
        Id,
        Title,
        TotalBudget,
        Status,
        RejectionReason,
        RequestedBy,
        RequesterEmail,
        DeletedAt,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum ProcurementItems {
        Table,
        Id,
        ProcurementId,
        Name,
        Quantity,
        UnitPrice,
        CreatedAt,
    }
}
