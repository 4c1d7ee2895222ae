//! Vulnerability blindness state of one connection.

use crate::debug::DebugDisplay;
use crate::vuln::{SQL, VulnFields};

/// Three-valued flags plus the stack of saved display settings.
///
/// `None` means no evaluation is in progress. Each `start` must be paired with
/// exactly one `stop`; the connection enforces this with a drop guard.
#[derive(Debug, Default)]
pub(crate) struct Blindness {
    vulnerable: Option<bool>,
    blinded: Option<bool>,
    saved_display: Vec<bool>,
}

impl Blindness {
    pub(crate) fn start(&mut self, fields: &VulnFields, display: &DebugDisplay) {
        if fields.is_empty() || self.vulnerable == Some(true) {
            return;
        }

        self.vulnerable = Some(false);

        for field in fields {
            let Some(vulnerability) = field.vulnerability(SQL) else {
                continue;
            };
            self.vulnerable = Some(true);
            if vulnerability.is_blind() {
                self.saved_display.push(display.set_display_errors(false));
                self.blinded = Some(true);
                tracing::debug!(field = field.name(), "error display suppressed");
                return;
            }
        }

        self.blinded = Some(false);
    }

    pub(crate) fn stop(&mut self, display: &DebugDisplay) {
        if self.blinded == Some(true) {
            if let Some(previous) = self.saved_display.pop() {
                display.set_display_errors(previous);
            }
        }
        self.blinded = None;
        self.vulnerable = None;
    }

    pub(crate) fn vulnerable(&self) -> Option<bool> {
        self.vulnerable
    }

    pub(crate) fn blinded(&self) -> Option<bool> {
        self.blinded
    }

    #[cfg(test)]
    pub(crate) fn saved_depth(&self) -> usize {
        self.saved_display.len()
    }
}
