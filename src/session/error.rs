use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Unknown task index {0}")]
    UnknownTask(usize),

    #[error("Invalid task transition: {0}")]
    InvalidTransition(String),

    #[error("Session not started: {0}")]
    NotStarted(String),

    #[error("Session ended without reporting: {0}")]
    Aborted(String),

    #[error("No tokio runtime to run the session on")]
    NoRuntime,
}

pub type SessionResult<T> = Result<T, SessionError>;
