use std::sync::Arc;

use liftroom_core::workout::parse_plan;
use liftroom_core::{
    Database, HistoryStats, ManualTimeSource, SessionController, SessionPhase, SyncPublisher, TimeSource,
    WorkoutStore,
};

const PLAN: &str = "\
# Leg Day
Squat 2x5 @100kg [legs] rest 60
Lunge 1x10 [legs] rest 30 after_exercise
";

#[test]
fn session_survives_reopen_and_lands_in_history() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("liftroom.db");
    let time = Arc::new(ManualTimeSource::default());

    let plan_id = {
        let store = WorkoutStore::new(Database::open_at(&db_path).unwrap());
        let plan = parse_plan(PLAN, None).unwrap();
        let id = plan.id.clone();
        store.add_plan(plan).unwrap();

        let mut c = SessionController::new(time.clone(), SyncPublisher::disabled());
        c.start(&store.find_plan("leg day").unwrap()).unwrap();
        time.advance_secs(20);
        c.toggle_set(0, 0).unwrap();
        store.save_active(c.state()).unwrap();
        id
    };

    // Next invocation: 70 seconds later the 60 s rest has run out.
    time.advance_secs(70);
    let store = WorkoutStore::new(Database::open_at(&db_path).unwrap());
    let state = store.load_active().unwrap();
    let mut c = SessionController::restore(state, time.clone(), SyncPublisher::disabled());
    c.tick();
    assert_eq!(c.phase(), SessionPhase::Active);
    assert_eq!(c.elapsed_seconds(), 90);
    assert_eq!(c.session().unwrap().plan_id, plan_id);

    c.toggle_set(0, 1).unwrap();
    c.toggle_set(1, 0).unwrap();
    c.finish().unwrap();
    store.append_history(&c.take_history()).unwrap();
    store.save_active(c.state()).unwrap();

    assert!(!store.load_active().unwrap().is_active());
    let history = store.history().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].completion_pct(), 100);

    let stats = HistoryStats::from_history(&history, time.now());
    assert_eq!(stats.total_sessions, 1);
    assert_eq!(stats.sets_completed, 3);
    assert_eq!(stats.muscle_groups.get("legs"), Some(&3));
}
