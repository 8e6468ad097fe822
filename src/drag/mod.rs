pub mod tracker;
pub mod types;
pub mod zone;

pub use tracker::DragZoneTracker;
pub use types::{DragEvent, HoverSignal};
pub use zone::{DropOutcome, DropResult, DropZone};
