//! Idempotent setup of the `geocache` table.
//!
//! Databases written by earlier releases may hold a `geocache` table without the
//! `service_type` column or the composite unique index. Each step below checks
//! first and only changes the schema when something is missing, so running the
//! whole sequence any number of times converges on the same layout.

use sea_orm::{ConnectionTrait, Statement, Value};
use sea_orm_migration::prelude::{ColumnDef, DbErr, DeriveIden, Expr, Index, SchemaManager, Table};
use tracing::{info, warn};

pub const TABLE_NAME: &str = "geocache";
pub const SERVICE_TYPE_COLUMN: &str = "service_type";
pub const UNIQUE_INDEX_NAME: &str = "idx_query_service";

/// Service tag given to rows that predate the `service_type` column.
pub const LEGACY_SERVICE_TYPE: &str = "geocode";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Created,
    AlreadyPresent,
    Failed(String),
}

impl StepOutcome {
    #[must_use]
    pub const fn is_satisfied(&self) -> bool {
        matches!(self, Self::Created | Self::AlreadyPresent)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaReport {
    pub table: StepOutcome,
    pub service_type_column: StepOutcome,
    pub unique_index: StepOutcome,
}

impl SchemaReport {
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.table.is_satisfied()
            && self.service_type_column.is_satisfied()
            && self.unique_index.is_satisfied()
    }
}

/// Runs every step, logging failures as warnings instead of aborting startup.
pub async fn ensure_schema(manager: &SchemaManager<'_>) -> SchemaReport {
    let table = settle("table", ensure_table(manager).await);
    let service_type_column = settle(
        "service_type column",
        ensure_service_type_column(manager).await,
    );
    let unique_index = settle("unique index", ensure_unique_index(manager).await);

    let report = SchemaReport {
        table,
        service_type_column,
        unique_index,
    };

    info!(
        table = ?report.table,
        service_type_column = ?report.service_type_column,
        unique_index = ?report.unique_index,
        "Cache schema checked"
    );

    report
}

fn settle(step: &str, result: Result<StepOutcome, DbErr>) -> StepOutcome {
    match result {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!("Schema step '{}' failed: {}", step, e);
            StepOutcome::Failed(e.to_string())
        }
    }
}

async fn ensure_table(manager: &SchemaManager<'_>) -> Result<StepOutcome, DbErr> {
    if table_exists(manager).await? {
        return Ok(StepOutcome::AlreadyPresent);
    }

    manager
        .create_table(
            Table::create()
                .table(Geocache::Table)
                .if_not_exists()
                .col(
                    ColumnDef::new(Geocache::Id)
                        .integer()
                        .not_null()
                        .auto_increment()
                        .primary_key(),
                )
                .col(ColumnDef::new(Geocache::Query).text().not_null())
                .col(ColumnDef::new(Geocache::ServiceType).text().not_null())
                .col(ColumnDef::new(Geocache::Response).text().not_null())
                .col(
                    ColumnDef::new(Geocache::CreatedAt)
                        .timestamp()
                        .default(Expr::current_timestamp()),
                )
                .to_owned(),
        )
        .await?;

    Ok(StepOutcome::Created)
}

async fn ensure_service_type_column(manager: &SchemaManager<'_>) -> Result<StepOutcome, DbErr> {
    if column_exists(manager, SERVICE_TYPE_COLUMN).await? {
        return Ok(StepOutcome::AlreadyPresent);
    }

    manager
        .alter_table(
            Table::alter()
                .table(Geocache::Table)
                .add_column(
                    ColumnDef::new(Geocache::ServiceType)
                        .text()
                        .not_null()
                        .default(LEGACY_SERVICE_TYPE),
                )
                .to_owned(),
        )
        .await?;

    Ok(StepOutcome::Created)
}

async fn ensure_unique_index(manager: &SchemaManager<'_>) -> Result<StepOutcome, DbErr> {
    if index_exists(manager).await? {
        return Ok(StepOutcome::AlreadyPresent);
    }

    manager
        .create_index(
            Index::create()
                .name(UNIQUE_INDEX_NAME)
                .table(Geocache::Table)
                .col(Geocache::Query)
                .col(Geocache::ServiceType)
                .unique()
                .if_not_exists()
                .to_owned(),
        )
        .await?;

    Ok(StepOutcome::Created)
}

async fn table_exists(manager: &SchemaManager<'_>) -> Result<bool, DbErr> {
    catalog_has_row(
        manager,
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
        [Value::from(TABLE_NAME)],
    )
    .await
}

async fn column_exists(manager: &SchemaManager<'_>, column: &str) -> Result<bool, DbErr> {
    catalog_has_row(
        manager,
        "SELECT name FROM pragma_table_info(?) WHERE name = ?",
        [Value::from(TABLE_NAME), Value::from(column)],
    )
    .await
}

async fn index_exists(manager: &SchemaManager<'_>) -> Result<bool, DbErr> {
    catalog_has_row(
        manager,
        "SELECT name FROM sqlite_master WHERE type = 'index' AND name = ?",
        [Value::from(UNIQUE_INDEX_NAME)],
    )
    .await
}

async fn catalog_has_row<const N: usize>(
    manager: &SchemaManager<'_>,
    sql: &str,
    values: [Value; N],
) -> Result<bool, DbErr> {
    let conn = manager.get_connection();
    let backend = conn.get_database_backend();
    let row = conn
        .query_one(Statement::from_sql_and_values(backend, sql, values))
        .await?;
    Ok(row.is_some())
}

#[derive(DeriveIden)]
enum Geocache {
    Table,
    Id,
    Query,
    ServiceType,
    Response,
    CreatedAt,
}
