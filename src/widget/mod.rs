pub mod error;
pub mod inline;
pub mod types;

pub use error::{WidgetError, WidgetResult};
pub use inline::InlineUploadWidget;
pub use types::{FormBinding, InlineUploadResponse};
