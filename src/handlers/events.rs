use std::path::Path;

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, Path as UrlPath, State};
use axum::http::StatusCode;
use axum::response::Response;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tempfile::NamedTempFile;
use uuid::Uuid;
use validator::Validate;

use crate::models::{EventChanges, NewEvent};
use crate::state::AppState;
use crate::utils::clock::RequestTime;
use crate::utils::error::{field_errors, AppError, FieldError};
use crate::utils::response::success;

const IMAGE_FIELD: &str = "image";

/// Text fields of the multipart event form, as received.
#[derive(Debug, Default, Validate)]
pub struct EventForm {
    #[validate(length(max = 200, message = "title must be at most 200 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 50, message = "status must be at most 50 characters"))]
    pub status: Option<String>,
    #[validate(length(max = 5000, message = "description must be at most 5000 characters"))]
    pub description: Option<String>,
    pub date_start: Option<String>,
    pub date_end: Option<String>,
}

struct ParsedDates {
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

impl EventForm {
    fn check(&self, errors: &mut Vec<FieldError>) -> ParsedDates {
        if let Err(e) = self.validate() {
            errors.extend(field_errors(&e));
        }

        ParsedDates {
            start: parse_date("dateStart", self.date_start.as_deref(), errors),
            end: parse_date("dateEnd", self.date_end.as_deref(), errors),
        }
    }

    pub fn into_new_event(self) -> Result<NewEvent, AppError> {
        let mut errors = Vec::new();
        let dates = self.check(&mut errors);

        let title = self.title.filter(|t| !t.trim().is_empty());
        if title.is_none() {
            errors.push(FieldError::new("title", "title is required"));
        }

        match title {
            Some(title) if errors.is_empty() => {
                let mut event = NewEvent::new(title).with_dates(dates.start, dates.end);
                event.status = self.status.filter(|s| !s.is_empty());
                event.description = self.description.filter(|d| !d.is_empty());
                Ok(event)
            }
            _ => Err(AppError::ValidationError(errors)),
        }
    }

    pub fn into_changes(self) -> Result<EventChanges, AppError> {
        let mut errors = Vec::new();
        let dates = self.check(&mut errors);

        if !errors.is_empty() {
            return Err(AppError::ValidationError(errors));
        }

        Ok(EventChanges {
            title: self.title,
            status: self.status,
            description: self.description,
            date_start: dates.start,
            date_end: dates.end,
        })
    }
}

/// Local date-time layouts posted by `datetime-local` inputs, read as UTC.
const LOCAL_DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Accepts RFC 3339, a bare `YYYY-MM-DD` (midnight UTC) or a zone-less
/// date-time (UTC). Blank input means the date was not supplied.
fn parse_date(
    field: &str,
    value: Option<&str>,
    errors: &mut Vec<FieldError>,
) -> Option<DateTime<Utc>> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;

    let parsed = DateTime::parse_from_rfc3339(value)
        .map(|date| date.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            LOCAL_DATE_TIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
                .map(|date| date.and_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|date| date.and_utc())
        });

    if parsed.is_none() {
        errors.push(FieldError::new(
            field,
            format!("{field} must be a date (YYYY-MM-DD) or an RFC 3339 timestamp"),
        ));
    }
    parsed
}

fn malformed_body(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::PayloadTooLarge(e.body_text());
    }
    AppError::ValidationError(vec![FieldError::new("body", e.body_text())])
}

/// Writes an uploaded image to a temporary file that is removed on drop.
async fn stage_upload(
    upload_dir: &Path,
    file_name: Option<&str>,
    bytes: &[u8],
) -> Result<NamedTempFile, AppError> {
    let suffix = file_name
        .and_then(|name| Path::new(name).extension())
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    let staged = tempfile::Builder::new()
        .prefix("event-image-")
        .suffix(&suffix)
        .tempfile_in(upload_dir)
        .map_err(|e| AppError::InternalServerError(format!("Failed to stage upload: {e}")))?;

    tokio::fs::write(staged.path(), bytes)
        .await
        .map_err(|e| AppError::InternalServerError(format!("Failed to stage upload: {e}")))?;

    Ok(staged)
}

async fn read_form(
    multipart: Result<Multipart, MultipartRejection>,
    upload_dir: &Path,
) -> Result<(EventForm, Option<NamedTempFile>), AppError> {
    let mut multipart = multipart.map_err(|rejection| {
        AppError::ValidationError(vec![FieldError::new("body", rejection.body_text())])
    })?;

    let mut form = EventForm::default();
    let mut image = None;

    while let Some(field) = multipart.next_field().await.map_err(malformed_body)? {
        let name = field.name().unwrap_or_default().to_string();

        if name == IMAGE_FIELD {
            let file_name = field.file_name().map(str::to_owned);
            let bytes = field.bytes().await.map_err(malformed_body)?;
            // Browsers post an empty part when no file was chosen.
            if !bytes.is_empty() {
                image = Some(stage_upload(upload_dir, file_name.as_deref(), &bytes).await?);
            }
            continue;
        }

        let slot = match name.as_str() {
            "title" => &mut form.title,
            "status" => &mut form.status,
            "description" => &mut form.description,
            "dateStart" => &mut form.date_start,
            "dateEnd" => &mut form.date_end,
            _ => {
                tracing::debug!(field = %name, "Ignoring unknown form field");
                continue;
            }
        };
        *slot = Some(field.text().await.map_err(malformed_body)?);
    }

    Ok((form, image))
}

/// An id that is not a UUID cannot name a stored event.
fn parse_event_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::event_not_found())
}

fn respond<T>(requested_at: &RequestTime, message: &str, result: Result<T, AppError>) -> Response
where
    T: Serialize,
{
    match result {
        Ok(data) => success(requested_at, message, data),
        Err(e) => e.into_envelope(requested_at),
    }
}

pub async fn list_events(State(state): State<AppState>, requested_at: RequestTime) -> Response {
    let result = state.events.list_all().await;

    respond(&requested_at, "Get event success", result)
}

pub async fn create_event(
    State(state): State<AppState>,
    requested_at: RequestTime,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let result = async {
        let (form, image) = read_form(multipart, &state.upload_dir).await?;
        let event = form.into_new_event()?;

        state
            .events
            .create(event, image.as_ref().map(NamedTempFile::path))
            .await
    }
    .await;

    respond(&requested_at, "Add event success", result)
}

pub async fn update_event(
    State(state): State<AppState>,
    requested_at: RequestTime,
    UrlPath(id): UrlPath<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let result = async {
        let (form, image) = read_form(multipart, &state.upload_dir).await?;
        let changes = form.into_changes()?;
        let id = parse_event_id(&id)?;

        state
            .events
            .update(id, changes, image.as_ref().map(NamedTempFile::path))
            .await
    }
    .await;

    respond(&requested_at, "Event updated", result)
}

pub async fn delete_event(
    State(state): State<AppState>,
    requested_at: RequestTime,
    UrlPath(id): UrlPath<String>,
) -> Response {
    let result = async {
        let id = parse_event_id(&id)?;
        let deleted = state.events.delete(id).await?;
        Ok::<_, AppError>(json!({ "eventId": deleted }))
    }
    .await;

    respond(&requested_at, "Delete event success", result)
}
