pub mod event;

pub use event::{Event, EventChanges, ImageAsset, NewEvent};
