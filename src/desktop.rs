//! Desktop collaborators the launcher talks to besides yt-dlp.

use std::path::Path;

pub trait ClipboardSource {
    /// Current clipboard text, if any could be read.
    fn text(&self) -> Option<String>;
}

pub struct SystemClipboard;

impl ClipboardSource for SystemClipboard {
    fn text(&self) -> Option<String> {
        arboard::Clipboard::new()
            .and_then(|mut c| c.get_text())
            .inspect_err(|e| tracing::debug!("clipboard unavailable: {}", e))
            .ok()
    }
}

/// Out-of-band error reporting. The launcher is often started by a media
/// player with no console attached, where stderr goes nowhere.
pub trait Notifier {
    fn error(&self, title: &str, message: &str);
}

/// Logs, then shows a blocking message box.
pub struct DialogNotifier;

impl Notifier for DialogNotifier {
    fn error(&self, title: &str, message: &str) {
        tracing::error!("{}: {}", title, message);
        let _ = rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Error)
            .set_title(title)
            .set_description(message)
            .set_buttons(rfd::MessageButtons::Ok)
            .show();
    }
}

pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn error(&self, title: &str, message: &str) {
        tracing::error!("{}: {}", title, message);
    }
}

pub fn notifier(no_dialog: bool) -> Box<dyn Notifier> {
    if no_dialog {
        Box::new(LogNotifier)
    } else {
        Box::new(DialogNotifier)
    }
}

/// Show `dir` in the platform file browser.
pub fn open_folder(dir: &Path) {
    if let Err(e) = open::that(dir) {
        tracing::warn!("could not open {}: {}", dir.display(), e);
    }
}
