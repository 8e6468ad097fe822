use thiserror::Error;

#[derive(Error, Debug)]
pub enum WidgetError {
    #[error("No destination selected")]
    NoDestination,

    #[error("Transport error: {0}")]
    Transport(#[from] crate::transport::TransportError),

    #[error("Upload rejected by server")]
    Rejected,

    #[error("Malformed upload response: {0}")]
    MalformedResponse(String),
}

impl From<serde_json::Error> for WidgetError {
    fn from(err: serde_json::Error) -> Self {
        WidgetError::MalformedResponse(err.to_string())
    }
}

pub type WidgetResult<T> = Result<T, WidgetError>;
