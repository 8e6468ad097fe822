//! Metrics and observability module
//!
//! Key metrics exposed:
//! - Sessions started / completed and their duration
//! - Files uploaded, failed and bytes sent
//! - Inline widget outcomes
//! - Files accepted and rejected by the upload endpoint

pub mod exporter;
pub mod recorder;

pub use exporter::{metrics_route, render_metrics, start_metrics_server, MetricsConfig, MetricsError};
pub use recorder::{
    init_metrics, record_file_received, record_inline_upload, record_session_completed,
    record_session_started, record_upload_failed, record_upload_rejected, record_upload_succeeded,
};
