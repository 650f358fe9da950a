//! Screen controllers. Each one owns its [`crate::session::ScreenContext`] and working
//! list, runs one backend write per action and resyncs the whole list
//! after every successful write.

use tracing::error;

use crate::error::ScreenError;

pub mod dashboard;
pub mod gallery;
pub mod notes;
pub mod reviews;
pub mod todo;

/// Rejects blank input before anything is sent. The value itself is kept
/// as typed.
pub(crate) fn require_text<'a>(value: &'a str, alert: &'static str) -> Result<&'a str, ScreenError> {
    if value.trim().is_empty() {
        Err(ScreenError::Validation(alert))
    } else {
        Ok(value)
    }
}

pub(crate) fn write_failed(
    alert: &'static str,
    table: &str,
    err: impl Into<anyhow::Error>,
) -> ScreenError {
    let err = err.into();
    error!(error = %err, table, alert, "backend write failed");
    ScreenError::write(alert, err)
}
