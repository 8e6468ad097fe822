use crate::host::HostContext;
use crate::metrics;
use crate::transport::{
    AntiForgeryToken, DestinationId, Identifier, ProgressReporter, UploadFile, UploadRequest,
    UploadTransport,
};
use crate::widget::error::{WidgetError, WidgetResult};
use crate::widget::types::{FormBinding, InlineUploadResponse};
use std::sync::Arc;
use url::Url;

/// Single-file upload embedded in a form row.
///
/// The file input is enabled only while a destination is selected. A
/// successful upload writes the returned identifier and name back into the
/// row; a failed one writes nothing.
pub struct InlineUploadWidget<T: UploadTransport, B: FormBinding> {
    transport: Arc<T>,
    binding: B,
    endpoint: Url,
    token: AntiForgeryToken,
    selected_destination: Option<DestinationId>,
}

impl<T: UploadTransport, B: FormBinding> InlineUploadWidget<T, B> {
    /// `context.destination` is the selector's current value, set when the
    /// form is prefilled.
    pub fn new(transport: Arc<T>, mut binding: B, context: HostContext) -> Self {
        binding.set_file_input_enabled(context.destination.is_some());

        Self {
            transport,
            binding,
            endpoint: context.endpoint,
            token: context.token,
            selected_destination: context.destination,
        }
    }

    pub fn binding(&self) -> &B {
        &self.binding
    }

    pub fn into_binding(self) -> B {
        self.binding
    }

    pub fn selected_destination(&self) -> Option<&DestinationId> {
        self.selected_destination.as_ref()
    }

    pub fn is_file_input_enabled(&self) -> bool {
        self.selected_destination.is_some()
    }

    pub fn on_destination_change(&mut self, value: &str) {
        self.selected_destination = Identifier::parse(value);
        self.binding
            .set_file_input_enabled(self.selected_destination.is_some());
    }

    /// Upload with the currently selected destination.
    pub async fn on_file_chosen(&mut self, file: UploadFile) -> WidgetResult<InlineUploadResponse> {
        let destination = self
            .selected_destination
            .clone()
            .ok_or(WidgetError::NoDestination)?;
        self.submit(file, &destination).await
    }

    pub async fn submit(
        &mut self,
        file: UploadFile,
        destination: &DestinationId,
    ) -> WidgetResult<InlineUploadResponse> {
        let file_name = file.name.clone();
        let request = UploadRequest {
            file,
            destination: destination.clone(),
            endpoint: self.endpoint.clone(),
            token: self.token.clone(),
        };

        let result = match self.transport.upload(request, ProgressReporter::noop()).await {
            Ok(receipt) => InlineUploadResponse::from_body(&receipt.body),
            Err(e) => Err(e.into()),
        };
        metrics::record_inline_upload(result.is_ok());

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Inline upload of {} failed: {}", file_name, e);
                return Err(e);
            }
        };

        self.binding.set_identifier(&response.id.to_string());
        self.binding.clear_file_input();
        self.binding.set_label(&response.name);

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::ScriptedTransport;

    #[derive(Debug, Default)]
    struct RecordingBinding {
        enabled: bool,
        identifier: Option<String>,
        label: Option<String>,
        file_selected: bool,
        writes: Vec<&'static str>,
    }

    impl FormBinding for RecordingBinding {
        fn set_file_input_enabled(&mut self, enabled: bool) {
            self.enabled = enabled;
        }

        fn set_identifier(&mut self, id: &str) {
            self.identifier = Some(id.to_string());
            self.writes.push("identifier");
        }

        fn clear_file_input(&mut self) {
            self.file_selected = false;
            self.writes.push("clear");
        }

        fn set_label(&mut self, name: &str) {
            self.label = Some(name.to_string());
            self.writes.push("label");
        }
    }

    fn context(destination: Option<u64>) -> HostContext {
        HostContext::new(
            destination.map(Identifier::Numeric),
            AntiForgeryToken::new("token"),
            Url::parse("http://localhost/admin/cabinet/file/upload/").unwrap(),
        )
    }

    fn binding() -> RecordingBinding {
        RecordingBinding {
            file_selected: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_disabled_until_destination_selected() {
        let transport = Arc::new(ScriptedTransport::new());
        let mut widget = InlineUploadWidget::new(transport, binding(), context(None));
        assert!(!widget.binding().enabled);
        assert!(!widget.is_file_input_enabled());

        widget.on_destination_change("3");
        assert!(widget.binding().enabled);
        assert_eq!(widget.selected_destination(), Some(&Identifier::Numeric(3)));

        widget.on_destination_change("");
        assert!(!widget.binding().enabled);
    }

    #[test]
    fn test_prefilled_destination_enables_input() {
        let transport = Arc::new(ScriptedTransport::new());
        let widget = InlineUploadWidget::new(transport, binding(), context(Some(8)));
        assert!(widget.binding().enabled);
    }

    #[tokio::test]
    async fn test_successful_upload_writes_back() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .respond("report.pdf", r#"{"success": true, "pk": 42, "name": "report.pdf"}"#),
        );
        let mut widget = InlineUploadWidget::new(transport.clone(), binding(), context(None));
        widget.on_destination_change("5");

        let response = widget
            .on_file_chosen(UploadFile::new("report.pdf", b"%PDF".to_vec()))
            .await
            .unwrap();
        assert_eq!(response.id, Identifier::Numeric(42));

        let binding = widget.into_binding();
        assert_eq!(binding.identifier.as_deref(), Some("42"));
        assert_eq!(binding.label.as_deref(), Some("report.pdf"));
        assert!(!binding.file_selected);
        assert_eq!(binding.writes, vec!["identifier", "clear", "label"]);

        assert_eq!(transport.requests()[0].destination, Identifier::Numeric(5));
    }

    #[tokio::test]
    async fn test_failed_upload_writes_nothing() {
        let transport = Arc::new(ScriptedTransport::new().fail("big.iso", 413));
        let mut widget = InlineUploadWidget::new(transport, binding(), context(Some(1)));

        let result = widget
            .on_file_chosen(UploadFile::new("big.iso", vec![0u8; 4]))
            .await;
        assert!(matches!(result, Err(WidgetError::Transport(_))));

        let binding = widget.into_binding();
        assert!(binding.writes.is_empty());
        assert!(binding.file_selected);
    }

    #[tokio::test]
    async fn test_rejected_response_writes_nothing() {
        let transport = Arc::new(ScriptedTransport::new().respond("x.txt", r#"{"success": false}"#));
        let mut widget = InlineUploadWidget::new(transport, binding(), context(Some(1)));

        let result = widget.on_file_chosen(UploadFile::new("x.txt", vec![1u8])).await;
        assert!(matches!(result, Err(WidgetError::Rejected)));
        assert!(widget.binding().writes.is_empty());
    }

    #[tokio::test]
    async fn test_no_destination_performs_no_call() {
        let transport = Arc::new(ScriptedTransport::new());
        let mut widget = InlineUploadWidget::new(transport.clone(), binding(), context(None));

        let result = widget.on_file_chosen(UploadFile::new("a.txt", vec![1u8])).await;
        assert!(matches!(result, Err(WidgetError::NoDestination)));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_widgets_are_independent() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .respond("one.txt", r#"{"pk": 1, "name": "one.txt"}"#)
                .respond("two.txt", r#"{"pk": 2, "name": "two.txt"}"#),
        );
        let mut first = InlineUploadWidget::new(transport.clone(), binding(), context(Some(1)));
        let mut second = InlineUploadWidget::new(transport, binding(), context(Some(2)));

        first
            .on_file_chosen(UploadFile::new("one.txt", vec![1u8]))
            .await
            .unwrap();

        assert_eq!(first.binding().identifier.as_deref(), Some("1"));
        assert!(second.binding().identifier.is_none());

        second
            .on_file_chosen(UploadFile::new("two.txt", vec![2u8]))
            .await
            .unwrap();
        assert_eq!(second.binding().label.as_deref(), Some("two.txt"));
        assert_eq!(first.binding().label.as_deref(), Some("one.txt"));
    }
}
