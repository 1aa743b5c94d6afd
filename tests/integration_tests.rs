//! Integration tests for the quiz-matchmaker
//!
//! These tests validate the system working together, including:
//! - Rating system selection and hot-swapping per assessment
//! - Question selection around the ideal rating
//! - Rating updates and level tracking across a session
//! - Error handling and recovery of persisted configuration

// Modules for organizing tests
mod fixtures;

use quiz_matchmaker::config::{AppConfig, ConfigDocument};
use quiz_matchmaker::error::QuizError;
use quiz_matchmaker::learner::InMemoryLearnerStore;
use quiz_matchmaker::matchmaking::{MatchmakingStrategy, NClosestConfig, NClosestSelector};
use quiz_matchmaker::rating::{
    ConfigurationEntry, InMemoryConfigurationStore, MockConfigurationStore,
    RatingSystemLoader, RatingSystemRegistry, ELO_RATING_SYSTEM,
};
use quiz_matchmaker::types::{AttemptOutcome, LearnerRating, QuestionId, QuestionList};
use quiz_matchmaker::AssessmentEngine;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use fixtures::{
    create_test_system, create_test_system_with, pool_with, registry_with_frozen, spread_pool,
    RecordingLearnerStore, RecordingQuestionPool, WriteLog, ASSESSMENT_ID, FROZEN_RATING_SYSTEM,
    LIST_ID,
};

#[test]
fn test_selection_around_ideal_rating() {
    let pool = pool_with(&[700.0, 810.0, 1200.0]);
    let selector = NClosestSelector::with_config(NClosestConfig {
        user_win_probability: 0.75,
        number_of_questions_to_select: 2,
    })
    .unwrap();
    let learner = LearnerRating::new(ASSESSMENT_ID, 1, 1000.0);
    let list = QuestionList::new(LIST_ID, "Fixture list");

    assert!((selector.ideal_question_rating(&learner) - 809.15).abs() < 0.01);

    for _ in 0..50 {
        let picked = selector
            .next_question_for_user(&learner, &list, &HashSet::new(), &pool)
            .unwrap()
            .unwrap();
        assert!(picked.question_id == 1 || picked.question_id == 2);
    }
}

#[test]
fn test_absent_selection() {
    let loader = RatingSystemLoader::load(
        ASSESSMENT_ID,
        Arc::new(RatingSystemRegistry::new()),
        Arc::new(InMemoryConfigurationStore::new()),
    )
    .unwrap();

    assert!(!loader.has_rating_system());
    assert!(loader.rating_system().unwrap().is_none());
    assert!(loader.configuration_form("/admin").unwrap().is_none());
}

#[test]
fn test_corrupt_configuration_falls_back_to_defaults() {
    let store = Arc::new(MockConfigurationStore::new());
    store
        .preset_entry(ConfigurationEntry::new(
            ASSESSMENT_ID,
            ELO_RATING_SYSTEM,
            "{not json".to_string(),
        ))
        .unwrap();

    let loader =
        RatingSystemLoader::load(ASSESSMENT_ID, Arc::new(RatingSystemRegistry::new()), store)
            .unwrap();

    assert!(!loader.has_rating_system());
    let system = loader.rating_system().unwrap().unwrap();
    assert_eq!(system.name(), ELO_RATING_SYSTEM);
    assert_eq!(system.configuration(), Some(system.default_configuration()));
}

#[test]
fn test_session_moves_learner_toward_skill() {
    let system = create_test_system(Arc::new(spread_pool(200, 600.0, 2200.0)));
    system
        .engine
        .select_rating_system(ELO_RATING_SYSTEM, None)
        .unwrap();

    let skill = 1600.0;
    let mut answered: HashSet<QuestionId> = HashSet::new();

    for _ in 0..60 {
        let question = system
            .engine
            .next_question(1, &answered)
            .unwrap()
            .expect("pool is large enough");
        assert!(!answered.contains(&question.question_id));

        let correct = question.rating < skill;
        system
            .engine
            .record_outcome(&AttemptOutcome::new(1, question.question_id, correct))
            .unwrap();
        answered.insert(question.question_id);
    }

    let learner = system.engine.learner(1).unwrap();
    assert!(learner.rating > 1450.0, "rating {}", learner.rating);
    assert!(learner.highest_level_reached >= 1);
    assert_eq!(system.engine.stats().outcomes_recorded, 60);
}

#[test]
fn test_question_rating_written_before_learner_rating() {
    let log: WriteLog = Arc::new(Mutex::new(Vec::new()));
    let pool = Arc::new(RecordingQuestionPool::new(
        pool_with(&[1000.0]),
        log.clone(),
    ));
    let learners = Arc::new(RecordingLearnerStore::new(log.clone()));
    let system = create_test_system_with(
        pool,
        learners,
        Arc::new(InMemoryConfigurationStore::new()),
    );
    system
        .engine
        .select_rating_system(ELO_RATING_SYSTEM, None)
        .unwrap();
    system.engine.learner(9).unwrap();
    log.lock().unwrap().clear();

    system
        .engine
        .record_outcome(&AttemptOutcome::new(9, 1, true))
        .unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec!["question:1".to_string(), "learner:9".to_string()]
    );
}

#[test]
fn test_failed_question_write_leaves_learner_untouched() {
    let log: WriteLog = Arc::new(Mutex::new(Vec::new()));
    let pool = Arc::new(RecordingQuestionPool::new(
        pool_with(&[1000.0]),
        log.clone(),
    ));
    let system = create_test_system_with(
        pool.clone(),
        Arc::new(InMemoryLearnerStore::new()),
        Arc::new(InMemoryConfigurationStore::new()),
    );
    system
        .engine
        .select_rating_system(ELO_RATING_SYSTEM, None)
        .unwrap();
    let before = system.engine.learner(9).unwrap();

    pool.set_fail_writes(true);
    let err = system
        .engine
        .record_outcome(&AttemptOutcome::new(9, 1, true))
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<QuizError>(),
        Some(QuizError::PersistenceFailure { .. })
    ));

    assert_eq!(system.engine.learner(9).unwrap(), before);
    assert_eq!(system.pool.question(1).unwrap().unwrap().rating, 1000.0);
}

#[test]
fn test_failed_loser_write_restores_winner() {
    let log: WriteLog = Arc::new(Mutex::new(Vec::new()));
    let pool = Arc::new(RecordingQuestionPool::new(
        pool_with(&[900.0, 1100.0]),
        log,
    ));
    let system = create_test_system_with(
        pool.clone(),
        Arc::new(InMemoryLearnerStore::new()),
        Arc::new(InMemoryConfigurationStore::new()),
    );
    system
        .engine
        .select_rating_system(ELO_RATING_SYSTEM, None)
        .unwrap();

    pool.set_fail_question(Some(2));
    assert!(system.engine.record_question_victory(1, 2).is_err());

    assert_eq!(system.pool.question(1).unwrap().unwrap().rating, 900.0);
    assert_eq!(system.pool.question(2).unwrap().unwrap().rating, 1100.0);
    assert_eq!(system.engine.stats().question_victories, 0);
}

#[test]
fn test_switching_rating_system_takes_effect_immediately() {
    let system = create_test_system(Arc::new(pool_with(&[1000.0, 1100.0])));
    system
        .engine
        .select_rating_system(ELO_RATING_SYSTEM, None)
        .unwrap();

    let moved = system
        .engine
        .record_outcome(&AttemptOutcome::new(1, 1, true))
        .unwrap();
    assert!(moved.learner_delta() > 0.0);

    system
        .engine
        .select_rating_system(FROZEN_RATING_SYSTEM, None)
        .unwrap();

    let frozen = system
        .engine
        .record_outcome(&AttemptOutcome::new(1, 2, true))
        .unwrap();
    assert_eq!(frozen.learner_delta(), 0.0);
    assert_eq!(frozen.question_delta(), 0.0);

    let entry = system
        .configurations
        .get_one_by_key(ASSESSMENT_ID)
        .unwrap()
        .unwrap();
    assert_eq!(entry.rating_system_name, FROZEN_RATING_SYSTEM);
}

#[test]
fn test_unknown_rating_system_is_rejected() {
    let system = create_test_system(Arc::new(pool_with(&[1000.0])));

    let err = system
        .engine
        .select_rating_system("glicko", None)
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<QuizError>(),
        Some(QuizError::UnknownRatingSystem { name }) if name == "glicko"
    ));
    assert!(system
        .configurations
        .get_one_by_key(ASSESSMENT_ID)
        .unwrap()
        .is_none());
}

#[test]
fn test_form_submission_reconfigures_rating_system() {
    let store = Arc::new(InMemoryConfigurationStore::new());
    let mut loader = RatingSystemLoader::load(ASSESSMENT_ID, registry_with_frozen(), store.clone())
        .unwrap();
    loader.set_rating_system(ELO_RATING_SYSTEM, None).unwrap();

    let form = loader.configuration_form("/admin/rating").unwrap().unwrap();
    assert_eq!(form.target_url, "/admin/rating");

    let mut submitted = HashMap::new();
    submitted.insert("student_k_factor".to_string(), "24".to_string());
    submitted.insert("question_k_factor".to_string(), "not a number".to_string());
    submitted.insert("unrelated".to_string(), "5".to_string());

    let candidate = form.parse_submission(&submitted);
    loader.configure_current_rating_system(&candidate).unwrap();

    let reloaded =
        RatingSystemLoader::load(ASSESSMENT_ID, registry_with_frozen(), store).unwrap();
    let config = reloaded.configuration().unwrap();
    assert_eq!(config.get_f64("student_k_factor"), Some(24.0));
    assert_eq!(config.get_f64("question_k_factor"), Some(8.0));
    assert!(!config.contains_key("unrelated"));
}

#[test]
fn test_engine_from_toml_config() {
    let config = AppConfig::from_toml(
        r#"
        [rating]
        default_learner_rating = 1500.0

        [matchmaking]
        user_win_probability = 0.6
        number_of_questions_to_select = 3

        [levels]
        level_ratings = [1000.0, 1200.0, 1400.0, 1600.0, 1800.0]
        "#,
    )
    .unwrap();

    let ports = quiz_matchmaker::AssessmentPorts {
        rating_systems: Arc::new(RatingSystemRegistry::new()),
        configuration_store: Arc::new(InMemoryConfigurationStore::new()),
        question_pool: Arc::new(pool_with(&[1500.0])),
        learner_store: Arc::new(InMemoryLearnerStore::new()),
    };
    let engine = AssessmentEngine::from_config(
        &config,
        ASSESSMENT_ID,
        QuestionList::new(LIST_ID, "Configured list"),
        ports,
    )
    .unwrap();

    assert_eq!(engine.learner(1).unwrap().rating, 1500.0);
    assert_eq!(engine.question_list().level_for_rating(1500.0), 3);

    let strategy_config = engine.strategy().configuration().unwrap();
    assert_eq!(strategy_config.get_f64("user_win_probability"), Some(0.6));
    assert_eq!(strategy_config.get_u32("number_of_questions_to_select"), Some(3));
}

#[test]
fn test_unknown_strategy_in_config() {
    let mut config = AppConfig::default();
    config.matchmaking.strategy = "random_walk".to_string();

    let ports = quiz_matchmaker::AssessmentPorts {
        rating_systems: Arc::new(RatingSystemRegistry::new()),
        configuration_store: Arc::new(InMemoryConfigurationStore::new()),
        question_pool: Arc::new(pool_with(&[1500.0])),
        learner_store: Arc::new(InMemoryLearnerStore::new()),
    };
    let err = AssessmentEngine::from_config(
        &config,
        ASSESSMENT_ID,
        QuestionList::new(LIST_ID, "Configured list"),
        ports,
    )
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<QuizError>(),
        Some(QuizError::UnknownMatchmakingStrategy { .. })
    ));
}

#[test]
fn test_concurrent_learners() {
    let system = create_test_system(Arc::new(spread_pool(50, 800.0, 1600.0)));
    system
        .engine
        .select_rating_system(ELO_RATING_SYSTEM, Some(&ConfigDocument::new()))
        .unwrap();
    let engine = Arc::new(system.engine);

    let handles: Vec<_> = (1..=8u64)
        .map(|user_id| {
            let engine = engine.clone();
            std::thread::spawn(move || {
                for _ in 0..10 {
                    let question = engine
                        .next_question(user_id, &HashSet::new())
                        .unwrap()
                        .unwrap();
                    engine
                        .record_outcome(&AttemptOutcome::new(
                            user_id,
                            question.question_id,
                            user_id % 2 == 0,
                        ))
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(engine.stats().outcomes_recorded, 80);
    let learners = system.learners.learners(ASSESSMENT_ID).unwrap();
    assert_eq!(learners.len(), 8);
    for learner in learners {
        if learner.user_id % 2 == 0 {
            assert!(learner.rating > 1200.0);
        } else {
            assert!(learner.rating < 1200.0);
        }
    }
}
