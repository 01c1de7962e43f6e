//! Event lifecycle: keeps each event record consistent with its image on the
//! media host.

use std::path::Path;
use std::sync::Arc;

use uuid::Uuid;

use crate::media::{MediaStore, EVENT_IMAGE_FOLDER};
use crate::models::{Event, EventChanges, ImageAsset, NewEvent};
use crate::repositories::EventRepository;
use crate::utils::error::AppError;

#[derive(Clone)]
pub struct EventService {
    repo: Arc<dyn EventRepository>,
    media: Arc<dyn MediaStore>,
}

impl EventService {
    pub fn new(repo: Arc<dyn EventRepository>, media: Arc<dyn MediaStore>) -> Self {
        Self { repo, media }
    }

    pub async fn list_all(&self) -> Result<Vec<Event>, AppError> {
        Ok(self.repo.find_all().await?)
    }

    /// Creates an event. When `image` is given it is uploaded before anything
    /// is persisted, so a failed upload leaves no record behind.
    pub async fn create(
        &self,
        mut event: NewEvent,
        image: Option<&Path>,
    ) -> Result<Event, AppError> {
        if let Some(file) = image {
            event.attach_image(self.upload(file).await?);
        }

        let created = self.repo.insert(event).await?;
        tracing::info!(
            event_id = %created.id,
            has_image = created.image().is_some(),
            "Event created"
        );

        Ok(created)
    }

    /// Applies `changes` to an existing event and optionally replaces its
    /// image.
    ///
    /// The old asset is deleted before the new one is uploaded. If that delete
    /// fails nothing else happens; if the upload after it fails, the stored
    /// record still points at the deleted asset.
    pub async fn update(
        &self,
        id: Uuid,
        changes: EventChanges,
        image: Option<&Path>,
    ) -> Result<Event, AppError> {
        let mut event = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(AppError::event_not_found)?;

        event.merge(changes);

        if let Some(file) = image {
            if let Some(old_image_id) = event.image_id() {
                self.media
                    .delete(old_image_id)
                    .await
                    .map_err(AppError::MediaDelete)?;
                tracing::info!(
                    event_id = %id,
                    image_id = %old_image_id,
                    "Previous image deleted"
                );
            }

            event.attach_image(self.upload(file).await?);
        }

        let updated = self.repo.save(&event).await?;
        tracing::info!(event_id = %updated.id, "Event updated");

        Ok(updated)
    }

    /// Removes the record only; its image stays on the media host.
    pub async fn delete(&self, id: Uuid) -> Result<Uuid, AppError> {
        let event = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(AppError::event_not_found)?;

        self.repo.delete_by_id(event.id).await?;
        tracing::info!(event_id = %event.id, "Event deleted");

        Ok(event.id)
    }

    async fn upload(&self, file: &Path) -> Result<ImageAsset, AppError> {
        self.media
            .upload(file, EVENT_IMAGE_FOLDER)
            .await
            .map_err(AppError::MediaUpload)
    }
}
