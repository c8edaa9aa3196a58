//! Side effects fired when a timed phase ends.
//!
//! The core never plays audio itself. Hosts implement [`Notifier`] and feed
//! every event through [`dispatch`].

use crate::events::Event;

/// A user-facing alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub body: String,
}

/// Host-provided sound and notification output.
pub trait Notifier {
    /// Short audible cue at a phase boundary.
    fn play_cue(&mut self);

    /// System-style notification.
    fn show(&mut self, notice: &Notice);
}

/// Notifier that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Notifier for Silent {
    fn play_cue(&mut self) {}
    fn show(&mut self, _notice: &Notice) {}
}

/// Records calls, for hosts that batch output and for tests.
#[derive(Debug, Default, Clone)]
pub struct Recorder {
    pub cues: usize,
    pub notices: Vec<Notice>,
}

impl Notifier for Recorder {
    fn play_cue(&mut self) {
        self.cues += 1;
    }

    fn show(&mut self, notice: &Notice) {
        self.notices.push(notice.clone());
    }
}

/// The notice an event should raise, if any.
pub fn notice_for(event: &Event) -> Option<Notice> {
    match event {
        Event::RestCompleted { .. } => Some(Notice {
            title: "Rest complete".into(),
            body: "Time for your next set".into(),
        }),
        Event::DrillSequenceCompleted { drill_count, .. } => Some(Notice {
            title: "All drills complete".into(),
            body: format!("You finished all {drill_count} drills"),
        }),
        _ => None,
    }
}

/// Fire the side effects for one event. Returns true if anything fired.
pub fn dispatch<N: Notifier + ?Sized>(notifier: &mut N, event: &Event) -> bool {
    let mut fired = false;
    if event.is_phase_end() {
        notifier.play_cue();
        fired = true;
    }
    if let Some(notice) = notice_for(event) {
        notifier.show(&notice);
        fired = true;
    }
    fired
}
