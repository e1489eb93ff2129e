use chrono::Local;
use rrt::settings::{FileSettingsStore, SettingsStore};
use rrt::{
    AttemptRecord, Category, Decision, Outcome, ProgressStore, ProgressionEngine,
    ProgressionSettings, SqliteProgressStore,
};
use tempfile::tempdir;

/// End-to-end progression cycles against a real on-disk SQLite store:
/// every completed attempt is scored, appended, and the difficulty overrides
/// evolve the way the next question generator will read them.

fn attempt(
    category: Category,
    premises: u32,
    seconds: u32,
    outcome: Outcome,
    elapsed_ms: u64,
) -> AttemptRecord {
    AttemptRecord {
        category,
        premises,
        seconds_allotted: Some(seconds),
        modifiers: Vec::new(),
        outcome,
        elapsed_ms,
        recorded_at: Local::now(),
    }
}

#[test]
fn mastery_run_escalates_the_whole_group() {
    let dir = tempdir().unwrap();
    let store = SqliteProgressStore::open(dir.path().join("progress.db")).unwrap();
    let mut engine = ProgressionEngine::new(store);
    let mut settings = ProgressionSettings::with_goal(15);

    // 19 comfortable successes: window still filling, nothing changes.
    for _ in 0..19 {
        let record = attempt(Category::Comparison, 4, 20, Outcome::Right, 3000);
        let decision = engine.score_attempt(&record, &mut settings).unwrap();
        assert_eq!(decision, Decision::NoChange);
        assert!(!decision.changed_settings());
    }

    // The twentieth completes the window at 20/20 successes, well under the
    // 15s goal: escalate.
    let record = attempt(Category::Comparison, 4, 20, Outcome::Right, 3000);
    let decision = engine.score_attempt(&record, &mut settings).unwrap();
    assert_eq!(
        decision,
        Decision::Escalate {
            premises: 5,
            seconds: 35
        }
    );

    // The whole verbal-reasoning group moved, with goal + 20 of slack.
    for category in [
        Category::Comparison,
        Category::Temporal,
        Category::Distinction,
        Category::Syllogism,
    ] {
        assert_eq!(settings.overrides(category).premises, Some(5));
        assert_eq!(settings.overrides(category).seconds, Some(35));
    }
    assert_eq!(settings.overrides(Category::Binary).premises, None);

    // All twenty attempts are durably in the log.
    assert_eq!(engine.store().all().unwrap().len(), 20);
}

#[test]
fn struggling_run_relaxes_time_during_warmup() {
    let dir = tempdir().unwrap();
    let store = SqliteProgressStore::open(dir.path().join("progress.db")).unwrap();
    let mut engine = ProgressionEngine::new(store);
    let mut settings = ProgressionSettings::with_goal(15);

    for i in 0..6 {
        let outcome = if i % 2 == 0 {
            Outcome::Wrong
        } else {
            Outcome::Missed
        };
        let record = attempt(Category::Binary, 4, 20, outcome, 18_000);
        let decision = engine.score_attempt(&record, &mut settings).unwrap();
        assert_eq!(decision, Decision::NoChange);
    }

    // Seventh failure in a short window: early de-escalation signal.
    let record = attempt(Category::Binary, 4, 20, Outcome::Wrong, 18_000);
    let decision = engine.score_attempt(&record, &mut settings).unwrap();
    assert_eq!(decision, Decision::RelaxTime { seconds: 30 });
    assert_eq!(settings.overrides(Category::Binary).seconds, Some(30));
    assert_eq!(settings.overrides(Category::Binary).premises, None);
}

#[test]
fn history_survives_reopening_the_store() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("progress.db");
    let mut settings = ProgressionSettings::with_goal(15);

    {
        let store = SqliteProgressStore::open(&db_path).unwrap();
        let mut engine = ProgressionEngine::new(store);
        for _ in 0..6 {
            let record = attempt(Category::SpaceTwoD, 3, 20, Outcome::Wrong, 19_000);
            engine.score_attempt(&record, &mut settings).unwrap();
        }
    }

    // A fresh process picks up the same trailing window and trips the
    // warm-up fail on the next attempt.
    let store = SqliteProgressStore::open(&db_path).unwrap();
    let mut engine = ProgressionEngine::new(store);
    let record = attempt(Category::SpaceTwoD, 3, 20, Outcome::Wrong, 19_000);
    let decision = engine.score_attempt(&record, &mut settings).unwrap();
    assert_eq!(decision, Decision::RelaxTime { seconds: 30 });
    assert_eq!(engine.store().all().unwrap().len(), 7);
}

#[test]
fn settings_round_trip_through_the_file_store() {
    let dir = tempdir().unwrap();
    let settings_store = FileSettingsStore::with_path(dir.path().join("progression.json"));
    let store = SqliteProgressStore::open(dir.path().join("progress.db")).unwrap();
    let mut engine = ProgressionEngine::new(store);

    let mut settings = settings_store.load();
    settings.goal_seconds = 15;

    for _ in 0..20 {
        let record = attempt(Category::Syllogism, 4, 20, Outcome::Right, 3000);
        engine.score_attempt(&record, &mut settings).unwrap();
    }
    settings_store.save(&settings).unwrap();

    let reloaded = settings_store.load();
    assert_eq!(reloaded.overrides(Category::Syllogism).premises, Some(5));
    assert_eq!(reloaded.overrides(Category::Syllogism).seconds, Some(35));
}

#[test]
fn daily_report_counts_timed_attempts() {
    let dir = tempdir().unwrap();
    let store = SqliteProgressStore::open(dir.path().join("progress.db")).unwrap();
    let mut engine = ProgressionEngine::new(store);
    let mut settings = ProgressionSettings::with_goal(15);

    for _ in 0..3 {
        let record = attempt(Category::Temporal, 3, 30, Outcome::Right, 12_000);
        engine.score_attempt(&record, &mut settings).unwrap();
    }
    let mut untimed = attempt(Category::Temporal, 3, 30, Outcome::Right, 50_000);
    untimed.seconds_allotted = None;
    engine.record_attempt(&untimed).unwrap();

    let history = engine.store().all().unwrap();
    assert_eq!(history.len(), 4);
    assert_eq!(rrt::report::seconds_trained_today(&history), 36.0);
}

#[test]
fn long_session_converges_into_the_stable_corridor() {
    // Alternating quality: after an escalation the user keeps a 75%-ish
    // success rate at the new level, which must not trigger further changes.
    let dir = tempdir().unwrap();
    let store = SqliteProgressStore::open(dir.path().join("progress.db")).unwrap();
    let mut engine = ProgressionEngine::new(store);
    let mut settings = ProgressionSettings::with_goal(15);

    for _ in 0..20 {
        let record = attempt(Category::Binary, 4, 20, Outcome::Right, 3000);
        engine.score_attempt(&record, &mut settings).unwrap();
    }
    assert_eq!(settings.overrides(Category::Binary).premises, Some(5));

    // Next level: 3 successes for every failure, never enough failures in
    // the trailing 20 to leave the corridor once the window refills.
    let mut changed_after_escalation = false;
    for i in 0..40 {
        let outcome = if i % 4 == 3 {
            Outcome::Wrong
        } else {
            Outcome::Right
        };
        let record = attempt(Category::Binary, 5, 35, outcome, 14_000);
        let decision = engine.score_attempt(&record, &mut settings).unwrap();
        if decision.changed_settings() {
            changed_after_escalation = true;
        }
    }
    assert!(
        !changed_after_escalation,
        "70-90% success rate must sit inside the hysteresis band"
    );
    assert_eq!(settings.overrides(Category::Binary).premises, Some(5));
    assert_eq!(settings.overrides(Category::Binary).seconds, Some(35));
}
