//! Terminal output for phase-end cues and notices.

use ironlog_core::notify::{Notice, Notifier};
use ironlog_core::storage::NotificationsConfig;

/// Rings the terminal bell and prints notices to stderr.
#[derive(Debug, Clone, Copy)]
pub struct TerminalNotifier {
    enabled: bool,
    sound: bool,
}

impl TerminalNotifier {
    pub fn from_config(config: &NotificationsConfig) -> Self {
        Self {
            enabled: config.enabled,
            // The bell has no volume control; zero means muted.
            sound: config.sound && config.volume > 0,
        }
    }
}

impl Notifier for TerminalNotifier {
    fn play_cue(&mut self) {
        if self.enabled && self.sound {
            eprint!("\x07");
        }
    }

    fn show(&mut self, notice: &Notice) {
        if self.enabled {
            eprintln!("\n{}: {}", notice.title, notice.body);
        }
    }
}
