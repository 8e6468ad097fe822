use crate::drag::tracker::DragZoneTracker;
use crate::drag::types::{DragEvent, HoverSignal};
use crate::host::HostContext;
use crate::session::{BatchUploader, SessionHandle, SessionObserver};
use crate::transport::{UploadFile, UploadTransport};
use std::sync::Arc;
use tokio::runtime::Handle;

/// What happened to a committed file set.
pub enum DropOutcome {
    /// Nothing was uploaded: no destination context, or no runtime to run
    /// the session on.
    Inert,
    Started(SessionHandle),
}

impl DropOutcome {
    pub fn session(self) -> Option<SessionHandle> {
        match self {
            DropOutcome::Started(handle) => Some(handle),
            DropOutcome::Inert => None,
        }
    }

    pub fn is_inert(&self) -> bool {
        matches!(self, DropOutcome::Inert)
    }
}

pub struct DropResult {
    pub hover: Option<HoverSignal>,
    pub outcome: DropOutcome,
}

/// Drop zone wiring for one host page: hover tracking plus the batch-upload
/// entry point for drops and picker selections.
///
/// Without a destination in the host context the zone is inert: no hover
/// styling and no uploads.
pub struct DropZone<T: UploadTransport> {
    tracker: DragZoneTracker,
    context: HostContext,
    uploader: BatchUploader<T>,
}

impl<T: UploadTransport> DropZone<T> {
    pub fn new(context: HostContext, transport: Arc<T>) -> Self {
        let uploader = BatchUploader::new(transport, context.token.clone());
        Self {
            tracker: DragZoneTracker::new(),
            context,
            uploader,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.uploader = self.uploader.with_observer(observer);
        self
    }

    /// Sessions are spawned on the ambient tokio runtime unless one is given
    /// here; without either, drops are logged and dropped.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.uploader = self.uploader.with_runtime(runtime);
        self
    }

    pub fn is_active(&self) -> bool {
        self.context.has_destination()
    }

    pub fn is_hovering(&self) -> bool {
        self.tracker.is_hovering()
    }

    pub fn context(&self) -> &HostContext {
        &self.context
    }

    pub fn on_event(&mut self, event: DragEvent) -> Option<HoverSignal> {
        if !self.is_active() {
            return None;
        }

        if event.is_recovery() {
            return self.tracker.on_recovery_event();
        }

        match event {
            DragEvent::Enter => self.tracker.on_drag_enter(),
            DragEvent::Leave | DragEvent::End => self.tracker.on_drag_leave(),
            _ => None,
        }
    }

    pub fn on_drop(&mut self, files: Vec<UploadFile>) -> DropResult {
        let hover = self.is_active().then(|| self.tracker.on_drop());
        DropResult {
            hover,
            outcome: self.start_session(files),
        }
    }

    /// Files chosen through the picker instead of dropped.
    pub fn on_files_picked(&self, files: Vec<UploadFile>) -> DropOutcome {
        self.start_session(files)
    }

    fn start_session(&self, files: Vec<UploadFile>) -> DropOutcome {
        let Some(destination) = self.context.destination.clone() else {
            tracing::warn!(
                "Ignoring {} file(s): drop zone has no destination context",
                files.len()
            );
            return DropOutcome::Inert;
        };

        let count = files.len();
        match self
            .uploader
            .start(files, destination, self.context.endpoint.clone())
        {
            Ok(handle) => DropOutcome::Started(handle),
            Err(e) => {
                tracing::error!("Cannot upload {} file(s): {}", count, e);
                DropOutcome::Inert
            }
        }
    }
}
