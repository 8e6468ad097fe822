use serde::{Deserialize, Serialize};

/// Hover styling transition to apply to the drop zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HoverSignal {
    HoverStart,
    HoverEnd,
}

/// Native events a host forwards from the drop zone element. Drops carry
/// files and go through `DropZone::on_drop` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DragEvent {
    Enter,
    Over,
    Leave,
    End,
    /// Pointer left the tracked element or the window
    PointerLeave,
    PointerOut,
}

impl DragEvent {
    pub fn is_recovery(&self) -> bool {
        matches!(self, DragEvent::PointerLeave | DragEvent::PointerOut)
    }
}
