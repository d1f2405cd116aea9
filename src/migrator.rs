use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_inventory_items_table::Migration),
            Box::new(m20240301_000002_create_stock_batches_table::Migration),
            Box::new(m20240301_000003_create_stock_allocations_table::Migration),
            Box::new(m20240301_000004_create_stock_movements_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240301_000001_create_inventory_items_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_inventory_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::OrganisationId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryItems::Name).string().not_null())
                        .col(ColumnDef::new(InventoryItems::Category).string().null())
                        .col(
                            ColumnDef::new(InventoryItems::UnitOfMeasure)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::ReorderThreshold)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(InventoryItems::Status).string().not_null())
                        .col(
                            ColumnDef::new(InventoryItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_items_organisation_id")
                        .table(InventoryItems::Table)
                        .col(InventoryItems::OrganisationId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_items_status")
                        .table(InventoryItems::Table)
                        .col(InventoryItems::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum InventoryItems {
        Table,
        Id,
        OrganisationId,
        Name,
        Category,
        UnitOfMeasure,
        ReorderThreshold,
        Status,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000002_create_stock_batches_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_stock_batches_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockBatches::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockBatches::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockBatches::ItemId).uuid().not_null())
                        .col(
                            ColumnDef::new(StockBatches::BatchNumber)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockBatches::ExpiryDate).date().null())
                        .col(
                            ColumnDef::new(StockBatches::QuantityReceived)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockBatches::QuantityRemaining)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockBatches::UnitCost)
                                .decimal_len(19, 4)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockBatches::ReceivedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockBatches::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockBatches::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_batches_item_id")
                        .table(StockBatches::Table)
                        .col(StockBatches::ItemId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_batches_expiry_date")
                        .table(StockBatches::Table)
                        .col(StockBatches::ExpiryDate)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockBatches::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum StockBatches {
        Table,
        Id,
        ItemId,
        BatchNumber,
        ExpiryDate,
        QuantityReceived,
        QuantityRemaining,
        UnitCost,
        ReceivedAt,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000003_create_stock_allocations_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_stock_allocations_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockAllocations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockAllocations::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockAllocations::ItemId).uuid().not_null())
                        .col(ColumnDef::new(StockAllocations::BatchId).uuid().not_null())
                        .col(
                            ColumnDef::new(StockAllocations::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockAllocations::ReservedFor)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockAllocations::Status)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockAllocations::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockAllocations::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_allocations_item_id_status")
                        .table(StockAllocations::Table)
                        .col(StockAllocations::ItemId)
                        .col(StockAllocations::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_allocations_batch_id")
                        .table(StockAllocations::Table)
                        .col(StockAllocations::BatchId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockAllocations::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum StockAllocations {
        Table,
        Id,
        ItemId,
        BatchId,
        Quantity,
        ReservedFor,
        Status,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000004_create_stock_movements_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000004_create_stock_movements_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockMovements::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockMovements::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::OrganisationId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockMovements::ItemId).uuid().not_null())
                        .col(ColumnDef::new(StockMovements::BatchId).uuid().not_null())
                        .col(
                            ColumnDef::new(StockMovements::MovementType)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockMovements::Delta).integer().not_null())
                        .col(
                            ColumnDef::new(StockMovements::ResultingRemaining)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockMovements::ActorId).uuid().not_null())
                        .col(ColumnDef::new(StockMovements::Reason).string().null())
                        .col(
                            ColumnDef::new(StockMovements::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_movements_item_id_created_at")
                        .table(StockMovements::Table)
                        .col(StockMovements::ItemId)
                        .col(StockMovements::CreatedAt)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_movements_organisation_id_created_at")
                        .table(StockMovements::Table)
                        .col(StockMovements::OrganisationId)
                        .col(StockMovements::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockMovements::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum StockMovements {
        Table,
        Id,
        OrganisationId,
        ItemId,
        BatchId,
        MovementType,
        Delta,
        ResultingRemaining,
        ActorId,
        Reason,
        CreatedAt,
    }
}
