//! System clipboard access for the report text.

use arboard::Clipboard;
use tracing::{debug, warn};

/// Copy UTF-8 text to the clipboard.
///
/// Returns true if successful, false otherwise.
pub fn copy_to_clipboard(text: &str) -> bool {
    let mut clipboard = match Clipboard::new() {
        Ok(clipboard) => clipboard,
        Err(e) => {
            warn!(error = %e, "clipboard unavailable");
            return false;
        }
    };

    match clipboard.set_text(text) {
        Ok(()) => {
            debug!(chars = text.chars().count(), "copied report to clipboard");
            true
        }
        Err(e) => {
            warn!(error = %e, "failed to set clipboard text");
            false
        }
    }
}
