use crate::transport::Identifier;
use crate::widget::error::{WidgetError, WidgetResult};
use serde::{Deserialize, Serialize};

/// The form row anchors an inline widget writes to.
pub trait FormBinding: Send {
    fn set_file_input_enabled(&mut self, enabled: bool);

    /// Hidden field holding the identifier of the uploaded record.
    fn set_identifier(&mut self, id: &str);

    /// Reset the file input so the same file can be chosen again.
    fn clear_file_input(&mut self);

    /// Display label showing the uploaded record's name.
    fn set_label(&mut self, name: &str);
}

/// Structured response of the inline upload endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InlineUploadResponse {
    pub id: Identifier,
    pub name: String,
}

#[derive(Deserialize)]
struct RawInlineResponse {
    success: Option<bool>,
    #[serde(alias = "pk")]
    id: Option<Identifier>,
    name: Option<String>,
}

impl InlineUploadResponse {
    pub fn from_body(body: &[u8]) -> WidgetResult<Self> {
        let raw: RawInlineResponse = serde_json::from_slice(body)?;
        if raw.success == Some(false) {
            return Err(WidgetError::Rejected);
        }

        let id = raw
            .id
            .ok_or_else(|| WidgetError::MalformedResponse("missing identifier".into()))?;
        let name = raw
            .name
            .ok_or_else(|| WidgetError::MalformedResponse("missing name".into()))?;

        Ok(Self { id, name })
    }
}
