use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Reference to an image stored on the remote media host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAsset {
    pub image_url: String,
    pub image_id: String,
}

/// A persisted event.
///
/// `image_url` and `image_id` travel together: both are set or both are
/// `None`. They are only written through [`Event::attach_image`], which the
/// lifecycle service calls after a successful upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase", try_from = "EventRecord")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub status: Option<String>,
    pub description: Option<String>,
    pub date_start: Option<DateTime<Utc>>,
    pub date_end: Option<DateTime<Utc>>,
    image_url: Option<String>,
    image_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Wire shape of [`Event`] before the image pair is checked.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventRecord {
    id: Uuid,
    title: String,
    status: Option<String>,
    description: Option<String>,
    date_start: Option<DateTime<Utc>>,
    date_end: Option<DateTime<Utc>>,
    image_url: Option<String>,
    image_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<EventRecord> for Event {
    type Error = &'static str;

    fn try_from(record: EventRecord) -> Result<Self, Self::Error> {
        let image = match (record.image_url, record.image_id) {
            (Some(image_url), Some(image_id)) => Some(ImageAsset {
                image_url,
                image_id,
            }),
            (None, None) => None,
            _ => return Err("imageUrl and imageId must be set together"),
        };

        let fields = NewEvent {
            title: record.title,
            status: record.status,
            description: record.description,
            date_start: record.date_start,
            date_end: record.date_end,
            image: None,
        };

        Ok(Event::from_parts(
            record.id,
            fields,
            image,
            record.created_at,
            record.updated_at,
        ))
    }
}

impl Event {
    pub fn from_parts(
        id: Uuid,
        fields: NewEvent,
        image: Option<ImageAsset>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        let (image_url, image_id) = match image {
            Some(asset) => (Some(asset.image_url), Some(asset.image_id)),
            None => (None, None),
        };

        Self {
            id,
            title: fields.title,
            status: fields.status,
            description: fields.description,
            date_start: fields.date_start,
            date_end: fields.date_end,
            image_url,
            image_id,
            created_at,
            updated_at,
        }
    }

    pub fn image(&self) -> Option<ImageAsset> {
        match (&self.image_url, &self.image_id) {
            (Some(url), Some(id)) => Some(ImageAsset {
                image_url: url.clone(),
                image_id: id.clone(),
            }),
            _ => None,
        }
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn image_id(&self) -> Option<&str> {
        self.image_id.as_deref()
    }

    pub(crate) fn attach_image(&mut self, asset: ImageAsset) {
        self.image_url = Some(asset.image_url);
        self.image_id = Some(asset.image_id);
    }

    /// Overwrites every field `changes` supplies and keeps the rest.
    pub fn merge(&mut self, changes: EventChanges) {
        let EventChanges {
            title,
            status,
            description,
            date_start,
            date_end,
        } = changes;

        if let Some(title) = supplied(title) {
            self.title = title;
        }
        if let Some(status) = supplied(status) {
            self.status = Some(status);
        }
        if let Some(description) = supplied(description) {
            self.description = Some(description);
        }
        if let Some(date_start) = date_start {
            self.date_start = Some(date_start);
        }
        if let Some(date_end) = date_end {
            self.date_end = Some(date_end);
        }
    }
}

/// Blank text counts as not supplied; form posts send `""` for empty inputs.
fn supplied(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Fields of an event that does not exist yet. The asset is attached by the
/// lifecycle service, never by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub title: String,
    pub status: Option<String>,
    pub description: Option<String>,
    pub date_start: Option<DateTime<Utc>>,
    pub date_end: Option<DateTime<Utc>>,
    image: Option<ImageAsset>,
}

impl NewEvent {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            status: None,
            description: None,
            date_start: None,
            date_end: None,
            image: None,
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_dates(
        mut self,
        date_start: Option<DateTime<Utc>>,
        date_end: Option<DateTime<Utc>>,
    ) -> Self {
        self.date_start = date_start;
        self.date_end = date_end;
        self
    }

    pub fn image(&self) -> Option<&ImageAsset> {
        self.image.as_ref()
    }

    pub(crate) fn attach_image(&mut self, asset: ImageAsset) {
        self.image = Some(asset);
    }

    /// Splits the record fields from the attached asset.
    pub fn into_parts(mut self) -> (NewEvent, Option<ImageAsset>) {
        let image = self.image.take();
        (self, image)
    }
}

/// Partial update of an event. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventChanges {
    pub title: Option<String>,
    pub status: Option<String>,
    pub description: Option<String>,
    pub date_start: Option<DateTime<Utc>>,
    pub date_end: Option<DateTime<Utc>>,
}
