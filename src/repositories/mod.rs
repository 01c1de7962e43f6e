use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Event, NewEvent};

pub mod event_repository;

pub use event_repository::PgEventRepository;

/// Storage failure, tagged with the operation that hit it.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("Database error in {operation}: {message}")]
    Database {
        operation: &'static str,
        message: String,
    },
}

impl RepoError {
    pub fn database(operation: &'static str, message: impl ToString) -> Self {
        Self::Database {
            operation,
            message: message.to_string(),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Event>, RepoError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>, RepoError>;
    /// Persists a new event and returns it with its assigned id.
    async fn insert(&self, event: NewEvent) -> Result<Event, RepoError>;
    /// Overwrites the stored record that has `event.id`.
    async fn save(&self, event: &Event) -> Result<Event, RepoError>;
    async fn delete_by_id(&self, id: Uuid) -> Result<(), RepoError>;
}
