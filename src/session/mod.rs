pub mod batch;
pub mod error;
pub mod progress;
pub mod state_machine;
pub mod types;

pub use batch::{BatchUploader, SessionHandle, SessionObserver};
pub use error::{SessionError, SessionResult};
pub use progress::ProgressDisplay;
pub use state_machine::SessionStateMachine;
pub use types::{
    FailedUpload, SessionReport, SessionSignal, SessionSnapshot, TaskEvent, TaskState, UploadTask,
};
