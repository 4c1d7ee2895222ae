//! Request-scoped error display setting.
//!
//! The storefront's debug subsystem decides whether error details reach the user.
//! Instead of a process-wide flag, each request owns a [`DebugDisplay`] handle
//! that is passed into the [`crate::Connection`]; clones share the same setting so
//! the presentation layer sees what the adapter switched.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::SqlError;

/// Text shown instead of error details when display is off.
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred while processing your request.";

#[derive(Debug, Clone, Default)]
pub struct DebugDisplay {
    display_errors: Arc<AtomicBool>,
}

impl DebugDisplay {
    #[must_use]
    pub fn new(display_errors: bool) -> Self {
        Self {
            display_errors: Arc::new(AtomicBool::new(display_errors)),
        }
    }

    #[must_use]
    pub fn display_errors(&self) -> bool {
        self.display_errors.load(Ordering::SeqCst)
    }

    /// Set the flag, returning the previous value.
    pub fn set_display_errors(&self, on: bool) -> bool {
        self.display_errors.swap(on, Ordering::SeqCst)
    }

    /// User-facing text for a failed statement.
    ///
    /// Details are shown only when display is on and the statement did not run
    /// in blind mode.
    #[must_use]
    pub fn render_error(&self, err: &SqlError) -> String {
        if self.display_errors() && err.is_blind() != Some(true) {
            err.to_string()
        } else {
            GENERIC_ERROR_MESSAGE.to_owned()
        }
    }
}
