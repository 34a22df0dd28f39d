//! Content script host and trace replay for LinkPeek.
//!
//! - [`host`] mounts detection on a page from stored settings and routes
//!   detections to the [`preview`] surface.
//! - [`scenario`] and [`replay`] drive a host from a TOML trace, for the
//!   `linkpeek-replay` binary.

pub mod host;
pub mod preview;
pub mod replay;
pub mod scenario;

#[cfg(test)]
pub(crate) mod test_utils;

pub use host::{ContentHost, HostEvent};
pub use preview::{PreviewSurface, PreviewTarget, SANDBOX_POLICY};
pub use replay::ReplayLine;
pub use scenario::Scenario;
