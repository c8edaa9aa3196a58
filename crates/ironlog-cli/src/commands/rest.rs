use clap::Subcommand;
use ironlog_core::storage::Database;
use ironlog_core::timer::validate_duration;
use ironlog_core::{Config, RestTimer, TimerState};

use super::{emit, load_rest_timer, print_json, CmdResult, REST_TIMER_KEY};
use crate::notifier::TerminalNotifier;
use crate::watch::{self, format_clock, WatchEnd};

#[derive(Subcommand)]
pub enum RestAction {
    /// Start resting (replaces any running rest)
    Start {
        /// Duration in seconds [default: rest.default_duration_secs]
        secs: Option<u64>,
        /// Exercise the rest belongs to
        #[arg(long)]
        exercise: Option<i64>,
        /// Set the rest follows
        #[arg(long)]
        set: Option<i64>,
    },
    /// Pause the countdown
    Pause,
    /// Resume a paused countdown
    Resume,
    /// Stop and clear the timer
    Stop,
    /// Restart from the full duration
    Reset,
    /// Add or remove seconds, e.g. `rest add 30` or `rest add -15`
    Add {
        #[arg(allow_hyphen_values = true)]
        delta: i64,
    },
    /// Print current timer state as JSON
    Status,
    /// Count down in the foreground until done or Ctrl-C
    Watch,
}

pub fn run(action: RestAction) -> CmdResult {
    let config = Config::load()?;
    let db = Database::open()?;
    let mut timer = load_rest_timer(&db)?;
    let mut notifier = TerminalNotifier::from_config(&config.notifications);

    // Catch up on anything that expired since the last invocation.
    let completed: Vec<_> = timer.tick().into_iter().collect();
    emit(&completed, &mut notifier)?;

    let event = match action {
        RestAction::Start { secs, exercise, set } => {
            let secs = validate_duration(secs.unwrap_or(config.rest.default_duration_secs))?;
            timer.start(secs, exercise, set)
        }
        RestAction::Pause => timer.pause(),
        RestAction::Resume => timer.resume(),
        RestAction::Stop => timer.stop(),
        RestAction::Reset => timer.reset(),
        RestAction::Add { delta } => timer.add_time(delta),
        RestAction::Status => Some(timer.snapshot()),
        RestAction::Watch => {
            db.save_json(REST_TIMER_KEY, &timer)?;
            if !matches!(timer.state(), TimerState::Running | TimerState::Paused) {
                return Err("no rest timer running; start one with `ironlog rest start`".into());
            }
            let last = watch_timer(&db, &mut notifier, config.timer.tick_interval_ms)?;
            print_json(&last.snapshot())?;
            // Every transition was saved as it happened.
            return Ok(());
        }
    };

    match event {
        Some(event) => print_json(&event)?,
        // Redundant command: report where things stand instead.
        None => print_json(&timer.snapshot())?,
    }

    db.save_json(REST_TIMER_KEY, &timer)?;
    Ok(())
}

/// Reload the stored timer and fire its completion, if due. Commands run
/// from another terminal while watching are picked up here.
fn poll_stored_timer(
    db: &Database,
    notifier: &mut TerminalNotifier,
) -> Result<RestTimer, Box<dyn std::error::Error>> {
    let mut timer = load_rest_timer(db)?;
    if let Some(event) = timer.tick() {
        db.save_json(REST_TIMER_KEY, &timer)?;
        emit(&[event], notifier)?;
    }
    Ok(timer)
}

/// Poll until the stored timer is no longer counting down. A timer stopped
/// elsewhere ends the loop without a completion cue.
fn watch_timer(
    db: &Database,
    notifier: &mut TerminalNotifier,
    tick_interval_ms: u64,
) -> Result<RestTimer, Box<dyn std::error::Error>> {
    let mut last = load_rest_timer(db)?;
    let mut shown = None;
    let mut failure = None;
    let end = watch::run(tick_interval_ms, || {
        let timer = match poll_stored_timer(db, &mut *notifier) {
            Ok(timer) => timer,
            Err(e) => {
                failure = Some(e);
                return true;
            }
        };
        let counting = matches!(timer.state(), TimerState::Running | TimerState::Paused);
        if counting {
            let line = format!(
                "{} {} ({:.0}%)",
                if timer.is_paused() { "paused" } else { "rest" },
                format_clock(timer.remaining_secs()),
                timer.progress() * 100.0,
            );
            if shown.as_ref() != Some(&line) {
                eprint!("\r{line}  ");
                shown = Some(line);
            }
        }
        last = timer;
        !counting
    })?;
    eprintln!();

    if let Some(e) = failure {
        return Err(e);
    }
    match end {
        WatchEnd::Interrupted => {
            tracing::info!(remaining_secs = last.remaining_secs(), "rest watch interrupted");
        }
        WatchEnd::Finished if last.state() == TimerState::Idle => {
            tracing::info!("rest timer stopped while watching");
        }
        WatchEnd::Finished => {}
    }
    Ok(last)
}
