//! Foreground poll loop shared by `rest watch` and `drill watch`.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEnd {
    Finished,
    Interrupted,
}

/// Call `poll` every `tick_interval_ms` until it returns true or Ctrl-C.
///
/// The interval is dropped with the loop, so nothing keeps polling after
/// the caller persists its state.
pub fn run<F>(tick_interval_ms: u64, mut poll: F) -> std::io::Result<WatchEnd>
where
    F: FnMut() -> bool,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let end = runtime.block_on(async {
        let mut interval = tokio::time::interval(Duration::from_millis(tick_interval_ms));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if poll() {
                        break WatchEnd::Finished;
                    }
                }
                _ = &mut ctrl_c => {
                    break WatchEnd::Interrupted;
                }
            }
        }
    });
    debug!(?end, "watch loop stopped");
    Ok(end)
}

/// `m:ss` for the status line.
pub fn format_clock(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}
