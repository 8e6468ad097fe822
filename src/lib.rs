//! Batch file-upload orchestration for a file-manager admin page.
//!
//! - [`drag`]: drag-hover tracking and the drop zone that starts sessions
//! - [`session`]: concurrent per-file uploads with aggregate progress
//! - [`widget`]: single-file inline upload bound to a form row
//! - [`transport`]: multipart HTTP upload behind the [`transport::UploadTransport`] trait
//! - [`host`]: page context and upload configuration
//! - [`api`]: the receiving endpoint
//! - [`metrics`], [`logging`]: observability

pub mod api;
pub mod drag;
pub mod host;
pub mod logging;
pub mod metrics;
pub mod session;
pub mod transport;
pub mod widget;
