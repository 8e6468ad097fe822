use crate::drag::types::HoverSignal;

/// Collapses nested enter/leave events on a composite drop target into one
/// hovering flag.
///
/// `depth` may go negative when the browser drops a leave/enter pair; anything
/// `<= 0` counts as not hovering. Drops and recovery events reset it to zero.
#[derive(Debug, Clone, Default)]
pub struct DragZoneTracker {
    depth: i32,
}

impl DragZoneTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> i32 {
        self.depth
    }

    pub fn is_hovering(&self) -> bool {
        self.depth > 0
    }

    pub fn on_drag_enter(&mut self) -> Option<HoverSignal> {
        let was_hovering = self.is_hovering();
        self.depth = self.depth.saturating_add(1);
        (!was_hovering && self.is_hovering()).then_some(HoverSignal::HoverStart)
    }

    pub fn on_drag_leave(&mut self) -> Option<HoverSignal> {
        let was_hovering = self.is_hovering();
        self.depth = self.depth.saturating_sub(1);
        (was_hovering && !self.is_hovering()).then_some(HoverSignal::HoverEnd)
    }

    /// Always ends hovering, whatever the balance was.
    pub fn on_drop(&mut self) -> HoverSignal {
        self.depth = 0;
        HoverSignal::HoverEnd
    }

    pub fn on_recovery_event(&mut self) -> Option<HoverSignal> {
        let was_hovering = self.is_hovering();
        self.depth = 0;
        was_hovering.then_some(HoverSignal::HoverEnd)
    }
}
