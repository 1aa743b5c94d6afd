//! Performance benchmarks for question selection and rating updates

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use quiz_matchmaker::matchmaking::{MatchmakingStrategy, NClosestSelector};
use quiz_matchmaker::question::InMemoryQuestionPool;
use quiz_matchmaker::rating::{EloRatingSystem, RatingSystem};
use quiz_matchmaker::types::{LearnerRating, Outcome, QuestionList, QuestionRating};
use std::collections::HashSet;

fn create_pool(size: u64) -> InMemoryQuestionPool {
    let pool = InMemoryQuestionPool::new();
    for id in 1..=size {
        let rating = 600.0 + (id as f64 * 37.0) % 1600.0;
        pool.add_question(QuestionRating::new(id, 1, id, rating))
            .unwrap();
    }
    pool
}

fn bench_question_selection(c: &mut Criterion) {
    let selector = NClosestSelector::new();
    let learner = LearnerRating::new(1, 1, 1350.0);
    let list = QuestionList::new(1, "Benchmark list");

    let mut group = c.benchmark_group("question_selection");
    for size in [100u64, 1_000, 10_000] {
        let pool = create_pool(size);
        let excluded: HashSet<u64> = (1..=size / 10).collect();

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                selector
                    .next_question_for_user(
                        black_box(&learner),
                        &list,
                        black_box(&excluded),
                        &pool,
                    )
                    .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_rating_updates(c: &mut Criterion) {
    let system = EloRatingSystem::new();

    c.bench_function("elo_update_ratings", |b| {
        b.iter(|| {
            system.update_ratings(
                black_box(1350.0),
                black_box(1180.0),
                black_box(Outcome::Correct),
            )
        })
    });

    c.bench_function("elo_question_victory", |b| {
        b.iter(|| system.question_victory_ratings(black_box(1250.0), black_box(1300.0)))
    });
}

criterion_group!(benches, bench_question_selection, bench_rating_updates);
criterion_main!(benches);
