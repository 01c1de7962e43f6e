use std::path::PathBuf;

use axum::extract::FromRef;

use crate::services::EventService;
use crate::utils::clock::ResponseClock;

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub events: EventService,
    pub clock: ResponseClock,
    /// Where uploaded images are staged before they go to the media host.
    pub upload_dir: PathBuf,
}

impl FromRef<AppState> for ResponseClock {
    fn from_ref(state: &AppState) -> Self {
        state.clock
    }
}
