use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{EventRepository, RepoError};
use crate::models::{Event, NewEvent};

const EVENT_COLUMNS: &str = "id, title, status, description, date_start, date_end, \
     image_url, image_id, created_at, updated_at";

/// PostgreSQL-backed event store.
#[derive(Clone)]
pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn find_all(&self) -> Result<Vec<Event>, RepoError> {
        sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::database("find_all", e))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>, RepoError> {
        sqlx::query_as::<_, Event>(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("find_by_id", e))
    }

    async fn insert(&self, event: NewEvent) -> Result<Event, RepoError> {
        let (fields, image) = event.into_parts();
        let (image_url, image_id) = match image {
            Some(asset) => (Some(asset.image_url), Some(asset.image_id)),
            None => (None, None),
        };

        sqlx::query_as::<_, Event>(&format!(
            "INSERT INTO events \
                 (id, title, status, description, date_start, date_end, image_url, image_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {EVENT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(fields.title)
        .bind(fields.status)
        .bind(fields.description)
        .bind(fields.date_start)
        .bind(fields.date_end)
        .bind(image_url)
        .bind(image_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepoError::database("insert", e))
    }

    async fn save(&self, event: &Event) -> Result<Event, RepoError> {
        sqlx::query_as::<_, Event>(&format!(
            "UPDATE events \
             SET title = $2, status = $3, description = $4, date_start = $5, date_end = $6, \
                 image_url = $7, image_id = $8, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {EVENT_COLUMNS}"
        ))
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.status)
        .bind(&event.description)
        .bind(event.date_start)
        .bind(event.date_end)
        .bind(event.image_url())
        .bind(event.image_id())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::database("save", e))?
        .ok_or_else(|| RepoError::database("save", format!("event {} vanished", event.id)))
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::database("delete_by_id", e))?;

        Ok(())
    }
}
