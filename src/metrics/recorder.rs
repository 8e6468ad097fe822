//! Metrics recorder for upload sessions
//!
//! Records counts, volumes and durations of batch sessions and inline uploads.

use crate::session::SessionReport;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialize metric descriptions (call once at startup)
pub fn init_metrics() {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        return; // Already initialized
    }

    // Session counters
    describe_counter!(
        "dropzone_sessions_started_total",
        "Total number of batch upload sessions started"
    );
    describe_counter!(
        "dropzone_sessions_completed_total",
        "Total number of batch upload sessions that reached all-done"
    );

    // Upload counters
    describe_counter!(
        "dropzone_uploads_succeeded_total",
        "Total number of files uploaded successfully"
    );
    describe_counter!(
        "dropzone_uploads_failed_total",
        "Total number of file uploads that failed"
    );
    describe_counter!(
        "dropzone_bytes_uploaded_total",
        "Total bytes of successfully uploaded files"
    );
    describe_counter!(
        "dropzone_inline_uploads_total",
        "Total number of inline widget uploads by outcome"
    );

    // Server side
    describe_counter!(
        "dropzone_files_received_total",
        "Total number of files accepted by the upload endpoint"
    );
    describe_counter!(
        "dropzone_bytes_received_total",
        "Total bytes accepted by the upload endpoint"
    );
    describe_counter!(
        "dropzone_uploads_rejected_total",
        "Total number of uploads rejected by the upload endpoint"
    );

    // Gauges
    describe_gauge!(
        "dropzone_active_sessions",
        "Number of batch sessions with uploads still in flight"
    );

    // Histograms
    describe_histogram!(
        "dropzone_session_duration_seconds",
        "Time from session start to all-done"
    );
    describe_histogram!("dropzone_session_size_files", "Number of files per session");
}

// ============== Batch Sessions ==============

/// Record a batch session starting
pub fn record_session_started(total: usize) {
    counter!("dropzone_sessions_started_total").increment(1);
    gauge!("dropzone_active_sessions").increment(1.0);
    histogram!("dropzone_session_size_files").record(total as f64);
}

/// Record the all-done signal of a session
pub fn record_session_completed(report: &SessionReport, duration: Duration) {
    let outcome = if report.all_succeeded() {
        "complete"
    } else {
        "partial"
    };
    counter!("dropzone_sessions_completed_total", "outcome" => outcome).increment(1);
    gauge!("dropzone_active_sessions").decrement(1.0);
    histogram!("dropzone_session_duration_seconds").record(duration.as_secs_f64());
}

// ============== Uploads ==============

pub fn record_upload_succeeded(bytes: u64) {
    counter!("dropzone_uploads_succeeded_total").increment(1);
    counter!("dropzone_bytes_uploaded_total").increment(bytes);
}

pub fn record_upload_failed() {
    counter!("dropzone_uploads_failed_total").increment(1);
}

/// Record the outcome of one inline widget submit
pub fn record_inline_upload(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!("dropzone_inline_uploads_total", "outcome" => outcome).increment(1);
}

// ============== Upload Endpoint ==============

pub fn record_file_received(bytes: u64) {
    counter!("dropzone_files_received_total").increment(1);
    counter!("dropzone_bytes_received_total").increment(bytes);
}

pub fn record_upload_rejected(reason: &'static str) {
    counter!("dropzone_uploads_rejected_total", "reason" => reason).increment(1);
}
