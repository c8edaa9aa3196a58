//! End-to-end workout flow against the SQLite store.

use indoc::indoc;
use ironlog_core::notify::{dispatch, Recorder};
use ironlog_core::{
    ActiveWorkout, Clock, Database, DrillSequencer, Event, ManualClock, RestTimer, SequencePhase,
    SetRef, TimerState, WorkoutPlan, WorkoutSession,
};

const PLAN: &str = indoc! {r#"
    {
      "workout_id": 7,
      "name": "Guard Session",
      "exercises": [
        {
          "id": 1, "name": "Back Squat", "order": 2, "category": "strength",
          "target_sets": 2, "target_reps": "5",
          "sets": [{"id": 100, "set_number": 1}, {"id": 101, "set_number": 2}]
        },
        {
          "id": 2, "name": "Pound Dribble", "order": 1, "category": "ball_handling",
          "target_sets": 1, "target_reps": "30s",
          "sets": [{"id": 200, "set_number": 1}]
        },
        {
          "id": 3, "name": "Crossovers", "order": 3, "category": "ball_handling",
          "target_sets": 1, "target_reps": "30s",
          "sets": [{"id": 300, "set_number": 1}]
        }
      ]
    }
"#};

fn setup() -> (ActiveWorkout, RestTimer<ManualClock>, ManualClock, Database) {
    let clock = ManualClock::new(1_700_000_000_000);
    let plan: WorkoutPlan = serde_json::from_str(PLAN).unwrap();
    let workout = ActiveWorkout::start(plan, clock.now_ms()).unwrap();
    let timer = RestTimer::with_clock(clock.clone());
    (workout, timer, clock, Database::open_memory().unwrap())
}

#[test]
fn test_rest_between_sets_reaches_set_log() {
    let (mut workout, mut timer, clock, db) = setup();
    let mut session = WorkoutSession::new(&mut workout, &mut timer);

    session
        .complete_set(&db, SetRef { exercise_id: 1, set_id: 100 }, 5, 120.0, 90)
        .unwrap();
    clock.advance_secs(30);
    let second = session
        .complete_set(&db, SetRef { exercise_id: 1, set_id: 101 }, 5, 120.0, 90)
        .unwrap();
    assert_eq!(second.update.rest_time_secs, Some(30));
    assert!(second.sync_error.is_none());

    let log = db.set_log(7).unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].rest_time_secs, None);
    assert_eq!(log[1].rest_time_secs, Some(30));
    assert_eq!(db.average_rest_secs(7).unwrap(), Some(30.0));
}

#[test]
fn test_rest_timer_completes_and_notifies() {
    let (mut workout, mut timer, clock, db) = setup();
    let mut notifier = Recorder::default();
    WorkoutSession::new(&mut workout, &mut timer)
        .complete_set(&db, SetRef { exercise_id: 1, set_id: 100 }, 5, 120.0, 60)
        .unwrap();

    for _ in 0..700 {
        clock.advance_ms(100);
        if let Some(event) = timer.tick() {
            dispatch(&mut notifier, &event);
        }
    }
    assert_eq!(timer.state(), TimerState::Completed);
    assert_eq!(notifier.cues, 1);
    assert_eq!(notifier.notices.len(), 1);
}

#[test]
fn test_drill_run_marks_ball_handling_sets_done() {
    let (mut workout, mut timer, clock, db) = setup();
    let drills = workout.ball_handling_drills(15);
    assert_eq!(drills.len(), 2);
    assert_eq!(drills[0].name, "Pound Dribble");

    let mut seq = DrillSequencer::with_clock(drills, clock.clone()).unwrap();
    seq.start();
    for _ in 0..350 {
        clock.advance_ms(100);
        seq.tick();
    }
    assert_eq!(seq.phase(), SequencePhase::Complete);

    let Some(Event::DrillsAcknowledged { drill_ids, .. }) = seq.acknowledge() else {
        panic!("completed sequence should acknowledge");
    };
    let done = WorkoutSession::new(&mut workout, &mut timer)
        .complete_drill_sets(&db, &drill_ids)
        .unwrap();
    assert_eq!(done.len(), 2);
    assert_eq!(workout.completed_sets(), 2);
    assert_eq!(timer.state(), TimerState::Idle);
    assert!(db.set_log(7).unwrap().iter().all(|r| r.reps == 1));
}

#[test]
fn test_active_workout_survives_kv_store() {
    let (mut workout, mut timer, _clock, db) = setup();
    WorkoutSession::new(&mut workout, &mut timer)
        .complete_set(&db, SetRef { exercise_id: 1, set_id: 100 }, 5, 120.0, 90)
        .unwrap();
    db.save_json("active_workout", &workout).unwrap();
    db.save_json("rest_timer", &timer).unwrap();

    let restored: ActiveWorkout = db.load_json("active_workout").unwrap().unwrap();
    assert_eq!(restored, workout);
    let restored_timer: RestTimer<ManualClock> = db.load_json("rest_timer").unwrap().unwrap();
    assert_eq!(restored_timer.target_set_id(), Some(100));
}
