use crate::entities::{geocache, prelude::*};
use crate::models::ServiceType;
use anyhow::Result;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect, Set};

/// Result of a cache write. A conflicting key is an expected outcome under
/// concurrent misses, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    Inserted,
    AlreadyExists,
}

pub struct CacheRepository {
    conn: DatabaseConnection,
}

impl CacheRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn lookup(
        &self,
        query: &str,
        service: ServiceType,
    ) -> Result<Option<serde_json::Value>> {
        let response: Option<String> = Geocache::find()
            .select_only()
            .column(geocache::Column::Response)
            .filter(geocache::Column::Query.eq(query))
            .filter(geocache::Column::ServiceType.eq(service.as_str()))
            .into_tuple()
            .one(&self.conn)
            .await?;

        match response {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Inserts unless (query, service) is already cached. Only the key
    /// conflict is absorbed; any other failure is returned.
    pub async fn store(
        &self,
        query: &str,
        service: ServiceType,
        payload: &serde_json::Value,
    ) -> Result<StoreOutcome> {
        let active_model = geocache::ActiveModel {
            query: Set(query.to_string()),
            service_type: Set(service.as_str().to_string()),
            response: Set(serde_json::to_string(payload)?),
            // created_at comes from the column default, matching older rows
            ..Default::default()
        };

        let rows = Geocache::insert(active_model)
            .on_conflict(
                OnConflict::columns([geocache::Column::Query, geocache::Column::ServiceType])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;

        if rows == 0 {
            Ok(StoreOutcome::AlreadyExists)
        } else {
            Ok(StoreOutcome::Inserted)
        }
    }
}
