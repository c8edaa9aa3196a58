use clap::Subcommand;
use ironlog_core::storage::Database;
use ironlog_core::{
    Config, Drill, DrillSequencer, Event, SequencePhase, ValidationError, WorkoutSession,
};
use serde::{Deserialize, Serialize};

use super::{
    emit, load_rest_timer, load_workout, print_json, CmdResult, ACTIVE_WORKOUT_KEY,
    DRILL_RUN_KEY, REST_TIMER_KEY,
};
use crate::notifier::TerminalNotifier;
use crate::watch::{self, format_clock, WatchEnd};

#[derive(Subcommand)]
pub enum DrillAction {
    /// Start a drill sequence with a 5 second lead-in
    Start {
        /// Drill as NAME:SECS (repeatable); a bare NAME uses drills.duration_secs
        #[arg(long = "drill", value_name = "NAME:SECS", required_unless_present = "from_workout")]
        drills: Vec<String>,
        /// Use the ball-handling exercises of the active workout
        #[arg(long, conflicts_with = "drills")]
        from_workout: bool,
    },
    /// Pause the current drill
    Pause,
    /// Resume the current drill
    Resume,
    /// End the current phase now
    Skip,
    /// Print current sequence state as JSON
    Status,
    /// Run the sequence in the foreground until done or Ctrl-C
    Watch,
    /// Acknowledge a completed sequence and mark workout drill sets done
    Ack,
    /// Abandon the sequence
    Exit {
        /// Confirm abandoning the sequence
        #[arg(long)]
        yes: bool,
    },
}

/// A sequence as persisted between invocations.
#[derive(Serialize, Deserialize)]
struct DrillRun {
    /// Drill ids are workout exercise ids.
    from_workout: bool,
    sequencer: DrillSequencer,
}

fn parse_drills(descriptors: &[String], default_secs: u64) -> Result<Vec<Drill>, ValidationError> {
    descriptors
        .iter()
        .enumerate()
        .map(|(i, d)| {
            let id = i as i64 + 1;
            if d.contains(':') {
                Drill::parse(id, d)
            } else {
                Drill::parse(id, &format!("{d}:{default_secs}"))
            }
        })
        .collect()
}

pub fn run(action: DrillAction) -> CmdResult {
    let config = Config::load()?;
    let db = Database::open()?;
    let mut notifier = TerminalNotifier::from_config(&config.notifications);

    match action {
        DrillAction::Start { drills, from_workout } => {
            start_sequence(&db, &config, &drills, from_workout)?;
        }
        DrillAction::Pause => {
            let mut run = load_run(&db, &mut notifier)?;
            let event = run.sequencer.pause();
            print_or_snapshot(&run.sequencer, event)?;
            db.save_json(DRILL_RUN_KEY, &run)?;
        }
        DrillAction::Resume => {
            let mut run = load_run(&db, &mut notifier)?;
            let event = run.sequencer.resume();
            print_or_snapshot(&run.sequencer, event)?;
            db.save_json(DRILL_RUN_KEY, &run)?;
        }
        DrillAction::Skip => {
            let mut run = load_run(&db, &mut notifier)?;
            let events = run.sequencer.skip();
            if events.is_empty() {
                print_json(&run.sequencer.snapshot())?;
            }
            emit(&events, &mut notifier)?;
            db.save_json(DRILL_RUN_KEY, &run)?;
        }
        DrillAction::Status => {
            let run = load_run(&db, &mut notifier)?;
            print_json(&run.sequencer.snapshot())?;
            db.save_json(DRILL_RUN_KEY, &run)?;
        }
        DrillAction::Watch => {
            let run = load_run(&db, &mut notifier)?;
            db.save_json(DRILL_RUN_KEY, &run)?;
            if run.sequencer.phase() == SequencePhase::Complete {
                return Err("drill sequence is already complete; run `ironlog drill ack`".into());
            }
            match watch_sequence(&db, &mut notifier, config.timer.tick_interval_ms)? {
                Some(last) => print_json(&last.sequencer.snapshot())?,
                None => eprintln!("drill sequence was ended from another command"),
            }
        }
        DrillAction::Ack => {
            let run = load_run(&db, &mut notifier)?;
            let Some(event) = run.sequencer.acknowledge() else {
                db.save_json(DRILL_RUN_KEY, &run)?;
                return Err("drill sequence is not complete yet".into());
            };
            print_json(&event)?;
            if let Event::DrillsAcknowledged { drill_ids, .. } = &event {
                if run.from_workout {
                    complete_workout_drills(&db, drill_ids)?;
                }
            }
            db.kv_delete(DRILL_RUN_KEY)?;
        }
        DrillAction::Exit { yes } => {
            if !yes {
                return Err("exiting abandons the sequence; pass --yes to confirm".into());
            }
            let run = load_run(&db, &mut notifier)?;
            print_json(&run.sequencer.exit())?;
            db.kv_delete(DRILL_RUN_KEY)?;
        }
    }
    Ok(())
}

fn start_sequence(db: &Database, config: &Config, descriptors: &[String], from_workout: bool) -> CmdResult {
    if let Some(existing) = db.load_json::<DrillRun>(DRILL_RUN_KEY)? {
        if existing.sequencer.phase() != SequencePhase::Complete {
            return Err(
                "a drill sequence is already running; finish it or run `ironlog drill exit --yes`".into(),
            );
        }
    }
    let drills = if from_workout {
        let workout =
            load_workout(db)?.ok_or("no active workout; load one with `ironlog workout load`")?;
        workout.ball_handling_drills(config.drills.duration_secs)
    } else {
        parse_drills(descriptors, config.drills.duration_secs)?
    };
    let mut run = DrillRun {
        from_workout,
        sequencer: DrillSequencer::new(drills)?,
    };
    if let Some(event) = run.sequencer.start() {
        print_json(&event)?;
    }
    db.save_json(DRILL_RUN_KEY, &run)?;
    Ok(())
}

/// Load the stored sequence and catch up on a phase that ended since the
/// last invocation.
fn load_run(db: &Database, notifier: &mut TerminalNotifier) -> Result<DrillRun, Box<dyn std::error::Error>> {
    let mut run = db
        .load_json::<DrillRun>(DRILL_RUN_KEY)?
        .ok_or("no drill sequence; start one with `ironlog drill start`")?;
    let caught_up = run.sequencer.tick();
    emit(&caught_up, notifier)?;
    Ok(run)
}

fn print_or_snapshot(sequencer: &DrillSequencer, event: Option<Event>) -> Result<(), serde_json::Error> {
    match event {
        Some(event) => print_json(&event),
        None => print_json(&sequencer.snapshot()),
    }
}

fn complete_workout_drills(db: &Database, drill_ids: &[i64]) -> CmdResult {
    let Some(mut workout) = load_workout(db)? else {
        tracing::warn!("drill sequence came from a workout that is no longer active");
        return Ok(());
    };
    let mut timer = load_rest_timer(db)?;
    let completions = WorkoutSession::new(&mut workout, &mut timer).complete_drill_sets(db, drill_ids)?;
    for completion in &completions {
        if let Some(message) = &completion.sync_error {
            eprintln!("warning: set {} saved locally but not synced: {message}", completion.update.id);
        }
    }
    eprintln!("{} drill set(s) marked complete", completions.len());
    db.save_json(ACTIVE_WORKOUT_KEY, &workout)?;
    db.save_json(REST_TIMER_KEY, &timer)?;
    Ok(())
}

/// Reload the stored sequence and fire any phase end that is due. `None`
/// once the sequence was exited or acknowledged elsewhere.
fn poll_stored_run(
    db: &Database,
    notifier: &mut TerminalNotifier,
) -> Result<Option<DrillRun>, Box<dyn std::error::Error>> {
    let Some(mut run) = db.load_json::<DrillRun>(DRILL_RUN_KEY)? else {
        return Ok(None);
    };
    let events = run.sequencer.tick();
    if !events.is_empty() {
        db.save_json(DRILL_RUN_KEY, &run)?;
        emit(&events, notifier)?;
    }
    Ok(Some(run))
}

/// Poll until the stored sequence completes or disappears. A sequence
/// exited elsewhere ends the loop without further cues.
fn watch_sequence(
    db: &Database,
    notifier: &mut TerminalNotifier,
    tick_interval_ms: u64,
) -> Result<Option<DrillRun>, Box<dyn std::error::Error>> {
    let mut last = None;
    let mut shown = None;
    let mut failure = None;
    let end = watch::run(tick_interval_ms, || {
        let run = match poll_stored_run(db, &mut *notifier) {
            Ok(Some(run)) => run,
            Ok(None) => {
                last = None;
                return true;
            }
            Err(e) => {
                failure = Some(e);
                return true;
            }
        };
        let sequencer = &run.sequencer;
        let done = sequencer.phase() == SequencePhase::Complete;
        if !done {
            let line = match (sequencer.phase(), sequencer.current_drill()) {
                (SequencePhase::Drill, Some(drill)) => format!(
                    "{} ({}/{}) {}{}",
                    drill.name,
                    sequencer.drill_index() + 1,
                    sequencer.drills().len(),
                    format_clock(sequencer.remaining_secs()),
                    if sequencer.is_paused() { " paused" } else { "" },
                ),
                _ => format!("get ready {}", sequencer.remaining_secs()),
            };
            if shown.as_ref() != Some(&line) {
                eprint!("\r{line}    ");
                shown = Some(line);
            }
        }
        last = Some(run);
        done
    })?;
    eprintln!();

    if let Some(e) = failure {
        return Err(e);
    }
    if end == WatchEnd::Interrupted {
        tracing::info!(phase = ?last.as_ref().map(|r| r.sequencer.phase()), "drill watch interrupted");
    }
    Ok(last)
}
