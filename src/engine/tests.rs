use super::*;
use std::collections::HashSet;
use std::time::Duration;

fn question(id: u64, kind: QuestionKind, prompt: &str, correct_index: usize) -> Question {
    let options = match kind {
        QuestionKind::TrueFalse => vec!["True".to_string(), "False".to_string()],
        QuestionKind::MultipleChoice => vec!["a".into(), "b".into(), "c".into(), "d".into()],
    };
    Question {
        id,
        kind,
        prompt: prompt.to_string(),
        options,
        correct_index,
        category: "general".to_string(),
    }
}

fn many_questions(n: u64) -> Vec<Question> {
    (1..=n)
        .map(|i| question(i, QuestionKind::MultipleChoice, &format!("Q{}", i), (i % 4) as usize))
        .collect()
}

fn config(questions_per_game: u32) -> MatchConfig {
    MatchConfig {
        questions_per_game,
        seconds_per_question: 10,
        ..MatchConfig::default()
    }
}

fn engine(config: MatchConfig) -> MatchEngine {
    MatchEngine::with_rng(config, StdRng::seed_from_u64(42))
}

fn correct_of(engine: &MatchEngine) -> usize {
    engine.current_question().unwrap().correct_index
}

fn wrong_of(engine: &MatchEngine) -> usize {
    let q = engine.current_question().unwrap();
    (q.correct_index + 1) % q.options.len()
}

fn ended(events: &[MatchEvent]) -> Vec<&MatchEvent> {
    events
        .iter()
        .filter(|e| matches!(e, MatchEvent::MatchEnded { .. }))
        .collect()
}

#[test]
fn test_two_question_match_won_by_a() {
    let questions = vec![
        question(1, QuestionKind::MultipleChoice, "Q1", 1),
        question(2, QuestionKind::TrueFalse, "Q2", 0),
    ];
    let mut cfg = config(2);
    cfg.points_correct = 1;
    cfg.points_wrong = 0;
    let mut engine = engine(cfg);
    let now = Instant::now();

    engine.start(&questions, now).unwrap();
    assert_eq!(engine.phase(), MatchPhase::Running);
    assert_eq!(engine.turn(), Team::A);

    // Team A answers correctly
    engine.select(correct_of(&engine)).unwrap();
    assert_eq!(engine.scores(), (1, 0));
    assert_eq!(engine.turn(), Team::B);

    // Team B answers wrong
    engine.next_question(now).unwrap();
    engine.select(wrong_of(&engine)).unwrap();
    assert_eq!(engine.scores(), (1, 0));
    assert_eq!(engine.turn(), Team::A);

    let events = engine.next_question(now).unwrap();
    assert_eq!(engine.phase(), MatchPhase::Ended);
    assert_eq!(
        ended(&events),
        vec![&MatchEvent::MatchEnded {
            score_a: 1,
            score_b: 0,
            winner: Winner::A,
            ran_out_of_questions: false,
        }]
    );
}

#[test]
fn test_runs_out_of_questions_before_quota() {
    let mut engine = engine(config(5));
    let now = Instant::now();
    engine.start(&many_questions(3), now).unwrap();

    let mut end_events = Vec::new();
    for _ in 0..3 {
        engine.select(0).unwrap();
        end_events.extend(engine.next_question(now).unwrap());
    }

    assert_eq!(engine.question_index(), 3);
    assert_eq!(engine.phase(), MatchPhase::Ended);
    let summary = engine.summary().unwrap();
    assert!(summary.ran_out_of_questions);
    assert_eq!(ended(&end_events).len(), 1);
}

#[test]
fn test_timeout_reveals_without_points() {
    let mut engine = engine(config(10));
    let start = Instant::now();
    engine.start(&many_questions(10), start).unwrap();

    let mut events = Vec::new();
    for ms in (200..=15_000).step_by(200) {
        events.extend(engine.tick(start + Duration::from_millis(ms)));
    }

    let reveals: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, MatchEvent::Reveal { .. }))
        .collect();
    assert_eq!(reveals.len(), 1, "timeout must fire exactly once");
    assert!(matches!(
        reveals[0],
        MatchEvent::Reveal {
            selected_index: None,
            ..
        }
    ));
    assert!(events.contains(&MatchEvent::QuestionResolved {
        team: Team::A,
        verdict: None,
        delta: 0,
    }));
    assert!(!events
        .iter()
        .any(|e| matches!(e, MatchEvent::ScoreChanged { .. })));
    assert_eq!(engine.scores(), (0, 0));
    assert_eq!(engine.turn(), Team::B);
    assert_eq!(engine.timer_readout(), None);
}

#[test]
fn test_tick_events_follow_countdown() {
    let mut engine = engine(config(10));
    let start = Instant::now();
    engine.start(&many_questions(10), start).unwrap();

    assert!(engine.tick(start + Duration::from_millis(600)).is_empty());
    let events = engine.tick(start + Duration::from_millis(2100));
    assert_eq!(
        events,
        vec![MatchEvent::Tick {
            remaining: 8,
            total: 10,
            percent: 80.0,
            label: "8s".to_string(),
        }]
    );
}

#[test]
fn test_both_types_disabled_forces_multiple_choice() {
    let questions = vec![
        question(1, QuestionKind::MultipleChoice, "MCQ one", 0),
        question(2, QuestionKind::TrueFalse, "TF one", 0),
    ];
    let mut cfg = config(5);
    cfg.enable_mcq = false;
    cfg.enable_tf = false;
    let mut engine = engine(cfg);

    let events = engine.start(&questions, Instant::now()).unwrap();
    assert!(engine.config().enable_mcq);
    assert_eq!(engine.pool_len(), 1);
    assert_eq!(
        engine.current_question().unwrap().kind,
        QuestionKind::MultipleChoice
    );
    assert!(matches!(
        &events[0],
        MatchEvent::MatchStarted { config, .. } if config.enable_mcq
    ));
}

#[test]
fn test_empty_pool_keeps_match_idle() {
    let questions = vec![question(1, QuestionKind::TrueFalse, "TF only", 0)];
    let mut cfg = config(5);
    cfg.enable_tf = false;
    let mut engine = engine(cfg);

    let result = engine.start(&questions, Instant::now());
    assert!(matches!(result, Err(MatchError::EmptyPool { .. })));
    assert_eq!(engine.phase(), MatchPhase::Idle);
    assert!(engine.current_question().is_none());
    assert_eq!(engine.pool_len(), 0);
}

#[test]
fn test_no_question_is_drawn_twice() {
    let mut questions = many_questions(30);
    // Duplicates by (type, prompt) collapse into one pool entry
    questions.push(question(99, QuestionKind::MultipleChoice, "Q1", 2));

    for seed in 0..10 {
        let mut engine = MatchEngine::with_rng(config(100), StdRng::seed_from_u64(seed));
        let now = Instant::now();
        engine.start(&questions, now).unwrap();

        let mut seen = HashSet::new();
        while engine.phase() == MatchPhase::Running {
            let q = engine.current_question().unwrap();
            assert!(seen.insert(q.dedup_key().1.to_string()), "repeated question");
            engine.reveal();
            engine.next_question(now).unwrap();
        }
        assert_eq!(seen.len(), 30);
        assert!(engine.summary().unwrap().ran_out_of_questions);
    }
}

#[test]
fn test_turn_alternates_once_per_resolved_question() {
    let mut engine = engine(config(20));
    let now = Instant::now();
    engine.start(&many_questions(20), now).unwrap();

    for resolved in 1..=7u32 {
        match resolved % 3 {
            0 => {
                engine.reveal();
            }
            1 => {
                engine.select(correct_of(&engine)).unwrap();
            }
            _ => {
                engine.select(wrong_of(&engine)).unwrap();
            }
        }
        // No-ops never move the turn
        engine.reveal();
        engine.select(0).unwrap();

        let expected = if resolved % 2 == 0 { Team::A } else { Team::B };
        assert_eq!(engine.turn(), expected, "after {} resolved", resolved);
        engine.next_question(now).unwrap();
    }
}

#[test]
fn test_wrong_answer_penalty_floors_at_zero() {
    let mut cfg = config(10);
    cfg.points_correct = 2;
    cfg.points_wrong = 5;
    let mut engine = engine(cfg);
    let now = Instant::now();
    engine.start(&many_questions(10), now).unwrap();

    engine.select(correct_of(&engine)).unwrap();
    engine.next_question(now).unwrap();
    engine.select(correct_of(&engine)).unwrap();
    engine.next_question(now).unwrap();
    assert_eq!(engine.scores(), (2, 2));

    // A: 2 - 5 -> 0
    let events = engine.select(wrong_of(&engine)).unwrap();
    assert_eq!(engine.scores(), (0, 2));
    assert!(events.contains(&MatchEvent::QuestionResolved {
        team: Team::A,
        verdict: Some(Verdict::Wrong),
        delta: -5,
    }));
}

#[test]
fn test_reveal_twice_has_no_effect() {
    let mut engine = engine(config(10));
    engine.start(&many_questions(10), Instant::now()).unwrap();

    let first = engine.reveal();
    assert!(!first.is_empty());
    let turn = engine.turn();

    assert!(engine.reveal().is_empty());
    assert!(engine.select(0).unwrap().is_empty());
    assert_eq!(engine.turn(), turn);
    assert_eq!(engine.scores(), (0, 0));
}

#[test]
fn test_next_requires_resolved_question() {
    let mut engine = engine(config(10));
    let now = Instant::now();
    engine.start(&many_questions(10), now).unwrap();

    assert_eq!(engine.next_question(now), Err(CommandError::QuestionPending));
    engine.reveal();
    assert!(engine.next_question(now).is_ok());
    assert_eq!(engine.question_index(), 2);
}

#[test]
fn test_select_rejects_unknown_option() {
    let mut engine = engine(config(10));
    engine.start(&many_questions(10), Instant::now()).unwrap();
    assert_eq!(
        engine.select(4),
        Err(CommandError::InvalidOption { index: 4, count: 4 })
    );
    assert_eq!(
        engine.stage(),
        Some(QuestionStage::Awaiting { selected: None })
    );
}

#[test]
fn test_commands_before_start() {
    let mut engine = engine(config(10));
    let now = Instant::now();
    assert!(engine.select(0).unwrap().is_empty());
    assert!(engine.reveal().is_empty());
    assert!(engine.tick(now + Duration::from_secs(60)).is_empty());
    assert_eq!(engine.next_question(now), Err(CommandError::NotRunning));
    assert_eq!(engine.judge(Verdict::Correct), Err(CommandError::NotRunning));
    assert_eq!(engine.adjust_score(Team::A, 1), Err(CommandError::NotRunning));
}

#[test]
fn test_auto_mode_rejects_manual_judging() {
    let mut engine = engine(config(10));
    engine.start(&many_questions(10), Instant::now()).unwrap();
    assert_eq!(
        engine.judge(Verdict::Correct),
        Err(CommandError::ManualScoringDisabled)
    );
}

#[test]
fn test_manual_mode_select_then_judge() {
    let mut cfg = config(10);
    cfg.scoring = ScoringMode::Manual;
    cfg.points_correct = 3;
    let mut engine = engine(cfg);
    engine.start(&many_questions(10), Instant::now()).unwrap();

    let events = engine.select(1).unwrap();
    assert_eq!(events, vec![MatchEvent::OptionSelected { index: 1 }]);
    assert_eq!(engine.scores(), (0, 0));
    assert_eq!(engine.turn(), Team::A);

    // Selection can still change until the answer is shown
    engine.select(2).unwrap();

    let events = engine.judge(Verdict::Correct).unwrap();
    assert!(events.contains(&MatchEvent::Reveal {
        correct_index: correct_of(&engine),
        selected_index: Some(2),
    }));
    assert_eq!(engine.scores(), (3, 0));
    assert_eq!(engine.turn(), Team::B);

    assert_eq!(
        engine.judge(Verdict::Wrong),
        Err(CommandError::AlreadyResolved)
    );
    assert_eq!(engine.scores(), (3, 0));
}

#[test]
fn test_manual_mode_timeout_waits_for_verdict() {
    let mut cfg = config(10);
    cfg.scoring = ScoringMode::Manual;
    let mut engine = engine(cfg);
    let start = Instant::now();
    engine.start(&many_questions(10), start).unwrap();

    let events = engine.tick(start + Duration::from_secs(10));
    assert!(events
        .iter()
        .any(|e| matches!(e, MatchEvent::Reveal { .. })));
    assert_eq!(
        engine.stage(),
        Some(QuestionStage::Revealed { selected: None })
    );
    assert_eq!(engine.turn(), Team::A);

    engine.judge(Verdict::Correct).unwrap();
    assert_eq!(engine.scores(), (1, 0));
    assert_eq!(engine.turn(), Team::B);
}

#[test]
fn test_manual_mode_skipping_verdict_still_passes_turn() {
    let mut cfg = config(10);
    cfg.scoring = ScoringMode::Manual;
    let mut engine = engine(cfg);
    let now = Instant::now();
    engine.start(&many_questions(10), now).unwrap();

    engine.reveal();
    assert_eq!(engine.turn(), Team::A);
    let events = engine.next_question(now).unwrap();
    assert!(events.contains(&MatchEvent::QuestionResolved {
        team: Team::A,
        verdict: None,
        delta: 0,
    }));
    assert_eq!(engine.turn(), Team::B);
    assert_eq!(engine.question_index(), 2);
}

#[test]
fn test_match_ended_fires_once() {
    let mut engine = engine(config(5));
    let now = Instant::now();
    engine.start(&many_questions(10), now).unwrap();

    let mut events = Vec::new();
    for _ in 0..5 {
        engine.reveal();
        events.extend(engine.next_question(now).unwrap());
    }
    assert_eq!(engine.phase(), MatchPhase::Ended);
    assert!(!engine.summary().unwrap().ran_out_of_questions);

    assert_eq!(engine.next_question(now), Err(CommandError::NotRunning));
    events.extend(engine.tick(now + Duration::from_secs(300)));
    events.extend(engine.reveal());
    assert_eq!(ended(&events).len(), 1);
    assert_eq!(engine.summary().unwrap().winner, Winner::Tie);
}

#[test]
fn test_resolving_cancels_pending_timeout() {
    let mut engine = engine(config(10));
    let start = Instant::now();
    engine.start(&many_questions(10), start).unwrap();

    let answered_at = start + Duration::from_secs(9);
    engine.tick(answered_at);
    engine.select(correct_of(&engine)).unwrap();
    engine.next_question(answered_at).unwrap();

    // The first question's deadline passes while the second is open
    let events = engine.tick(start + Duration::from_secs(10));
    assert!(!events
        .iter()
        .any(|e| matches!(e, MatchEvent::Reveal { .. })));
    assert_eq!(
        engine.stage(),
        Some(QuestionStage::Awaiting { selected: None })
    );
    assert_eq!(engine.timer_readout(), Some((9, 10)));
}

#[test]
fn test_reset_returns_to_idle() {
    let mut engine = engine(config(10));
    let now = Instant::now();
    engine.start(&many_questions(10), now).unwrap();
    engine.select(correct_of(&engine)).unwrap();

    let events = engine.reset();
    assert_eq!(events[0], MatchEvent::MatchReset);
    assert_eq!(engine.phase(), MatchPhase::Idle);
    assert_eq!(engine.scores(), (0, 0));
    assert_eq!(engine.turn(), Team::A);
    assert_eq!(engine.pool_len(), 0);
    assert_eq!(engine.deck_len(), 0);
    assert_eq!(engine.timer_readout(), None);
    assert!(engine.tick(now + Duration::from_secs(60)).is_empty());

    // Reset from idle is fine too
    engine.reset();
    assert_eq!(engine.phase(), MatchPhase::Idle);
}

#[test]
fn test_start_while_running_and_replay() {
    let mut engine = engine(config(5));
    let now = Instant::now();
    let questions = many_questions(10);
    engine.start(&questions, now).unwrap();
    assert!(matches!(
        engine.start(&questions, now),
        Err(MatchError::AlreadyRunning)
    ));

    engine.select(correct_of(&engine)).unwrap();
    for _ in 0..5 {
        engine.next_question(now).unwrap();
        if engine.phase() == MatchPhase::Running {
            engine.reveal();
        }
    }
    assert_eq!(engine.phase(), MatchPhase::Ended);
    let first_id = engine.snapshot().match_id;

    // Play again from Ended builds a fresh deck and zeroed scores
    engine.start(&questions, now).unwrap();
    assert_eq!(engine.scores(), (0, 0));
    assert_eq!(engine.question_index(), 1);
    assert_eq!(engine.deck_len(), 9);
    assert_ne!(engine.snapshot().match_id, first_id);
}

#[test]
fn test_insert_fresh_question_mid_match() {
    let mut engine = engine(config(10));
    engine.start(&many_questions(3), Instant::now()).unwrap();
    assert_eq!(engine.deck_len(), 2);

    let fresh = question(50, QuestionKind::TrueFalse, "Fresh one", 1);
    assert!(engine.insert_fresh(fresh.clone()));
    assert_eq!(engine.deck_len(), 3);
    assert_eq!(engine.pool_len(), 4);

    // Same (type, prompt) again is not added twice
    assert!(!engine.insert_fresh(fresh));

    let mut other_category = question(51, QuestionKind::TrueFalse, "Elsewhere", 0);
    other_category.category = "sports".to_string();
    assert!(!engine.insert_fresh(other_category));
}

#[test]
fn test_insert_fresh_respects_enabled_types() {
    let mut cfg = config(10);
    cfg.enable_tf = false;
    let mut engine = engine(cfg);
    engine.start(&many_questions(3), Instant::now()).unwrap();
    assert!(!engine.insert_fresh(question(60, QuestionKind::TrueFalse, "TF", 0)));
    assert!(engine.insert_fresh(question(61, QuestionKind::MultipleChoice, "MCQ", 0)));
}

#[test]
fn test_insert_fresh_ignored_when_idle() {
    let mut engine = engine(config(10));
    assert!(!engine.insert_fresh(question(1, QuestionKind::MultipleChoice, "Q", 0)));
}

#[test]
fn test_config_change_resets_running_match() {
    let mut engine = engine(config(10));
    engine.start(&many_questions(10), Instant::now()).unwrap();

    let mut cfg = config(15);
    cfg.points_correct = 4;
    let events = engine.set_config(cfg);
    assert_eq!(events.first(), Some(&MatchEvent::MatchReset));
    assert_eq!(engine.phase(), MatchPhase::Idle);
    assert_eq!(engine.config().questions_per_game, 15);

    // Idle: config just swaps
    assert!(engine.set_config(config(5)).is_empty());
}

#[test]
fn test_adjust_score_does_not_touch_turn() {
    let mut engine = engine(config(10));
    engine.start(&many_questions(10), Instant::now()).unwrap();

    engine.adjust_score(Team::B, 3).unwrap();
    engine.adjust_score(Team::A, -1).unwrap();
    assert_eq!(engine.scores(), (0, 3));
    assert_eq!(engine.turn(), Team::A);
}

#[test]
fn test_snapshot_hides_answer_until_revealed() {
    let mut engine = engine(config(10));
    engine.start(&many_questions(10), Instant::now()).unwrap();

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.phase, MatchPhase::Running);
    assert_eq!(snapshot.question_index, 1);
    assert!(!snapshot.revealed);
    assert!(!snapshot.locked);
    assert_eq!(snapshot.question.as_ref().unwrap().correct_index, None);
    assert_eq!(snapshot.remaining, Some(10));

    engine.reveal();
    let snapshot = engine.snapshot();
    assert!(snapshot.revealed);
    assert!(snapshot.locked);
    assert_eq!(
        snapshot.question.unwrap().correct_index,
        Some(correct_of(&engine))
    );
    assert_eq!(snapshot.remaining, None);
}

#[test]
fn test_seconds_per_question_is_clamped_at_start() {
    let mut cfg = config(10);
    cfg.seconds_per_question = 500;
    let mut engine = engine(cfg);
    engine.start(&many_questions(10), Instant::now()).unwrap();
    assert_eq!(engine.timer_readout(), Some((120, 120)));
}
