//! Integration tests for the recommendation pipeline.
//!
//! These exercise the composed Scorer → Filter → Adjuster → Ranker →
//! Fallback path on realistic cohorts, including chunked execution.

use std::collections::HashMap;

use data_loader::{Course, Recommendation, User};
use pipeline::{
    ExclusionFilter, LevelWeightAdjuster, RecommendationPipeline, TfidfScorer,
};

fn user(
    id: &str,
    tags: &[u32],
    level: u8,
    purchased: &[&str],
    created: &[&str],
) -> User {
    User {
        id: id.to_string(),
        interest_tags: tags.to_vec(),
        level,
        purchased_course_ids: purchased.iter().map(|s| s.to_string()).collect(),
        created_course_ids: created.iter().map(|s| s.to_string()).collect(),
    }
}

fn course(id: &str, tags: &[u32], level: u8) -> Course {
    Course {
        id: id.to_string(),
        tags: tags.to_vec(),
        level,
    }
}

fn sample_users() -> Vec<User> {
    vec![
        user("user_001", &[1, 2, 3], 1, &["course_001"], &[]),
        user("user_002", &[3, 4, 5], 2, &[], &["course_003"]),
        user("user_003", &[1, 5], 0, &[], &[]),
    ]
}

fn sample_courses() -> Vec<Course> {
    vec![
        course("course_001", &[1, 2], 1),
        course("course_002", &[2, 3], 2),
        course("course_003", &[4, 5], 0),
        course("course_004", &[1, 3, 5], 1),
        course("course_005", &[6, 7], 3),
    ]
}

fn default_pipeline() -> RecommendationPipeline {
    RecommendationPipeline::new(
        TfidfScorer,
        ExclusionFilter,
        Some(Box::new(LevelWeightAdjuster::with_default_weights())),
    )
}

fn by_user<'a>(rows: &'a [Recommendation]) -> HashMap<&'a str, Vec<&'a Recommendation>> {
    let mut groups: HashMap<&str, Vec<&Recommendation>> = HashMap::new();
    for row in rows {
        groups.entry(row.user_id.as_str()).or_default().push(row);
    }
    for group in groups.values_mut() {
        group.sort_by_key(|row| row.rank);
    }
    groups
}

// ============================================================================
// Concrete scenarios
// ============================================================================

#[test]
fn basic_ranking_with_exclusion_and_fallback() {
    let users = vec![user("u1", &[1, 2, 3], 1, &["c1"], &[])];
    let courses = vec![
        course("c1", &[1, 2], 1),
        course("c2", &[2, 3], 2),
        course("c3", &[4, 5], 0),
        course("c4", &[1, 3, 5], 1),
    ];

    let result = default_pipeline().run(&users, &courses, 3).unwrap();
    assert_eq!(result.len(), 3);

    // c1 is purchased; c3 shares no tags. c2 outranks c4 even after its
    // one-level penalty, and the third slot is a zero-score fallback.
    assert_eq!(result[0].course_id, "c2");
    assert_eq!(result[0].rank, 1);
    assert!((result[0].score - 0.8164965809 * 0.85).abs() < 1e-9);

    assert_eq!(result[1].course_id, "c4");
    assert_eq!(result[1].rank, 2);
    assert!((result[1].score - 0.6215551588).abs() < 1e-9);

    assert_eq!(result[2].course_id, "c3");
    assert_eq!(result[2].rank, 3);
    assert_eq!(result[2].score, 0.0);
}

#[test]
fn created_courses_are_excluded_even_on_perfect_match() {
    let users = vec![user("u2", &[3, 4, 5], 2, &[], &["c3"])];
    let courses = vec![
        course("c1", &[1, 2], 1),
        course("c2", &[2, 3], 2),
        course("c3", &[4, 5], 0),
        course("c4", &[1, 3, 5], 1),
    ];

    let result = default_pipeline().run(&users, &courses, 2).unwrap();
    assert_eq!(result.len(), 2);

    // c3 matches best but was created by the user; c4 beats c2 once the
    // level penalties are applied, and no fallback is needed.
    assert_eq!(result[0].course_id, "c4");
    assert_eq!(result[0].rank, 1);
    assert_eq!(result[1].course_id, "c2");
    assert_eq!(result[1].rank, 2);
    assert!(result.iter().all(|row| row.score > 0.0));
}

#[test]
fn cold_user_is_served_entirely_from_fallback() {
    let users = vec![user("u3", &[999], 0, &[], &[])];
    let courses = vec![
        course("c1", &[1, 2], 0),
        course("c2", &[2, 3], 0),
        course("c3", &[4, 5], 0),
    ];

    let result = default_pipeline().run(&users, &courses, 3).unwrap();

    // Nothing scores; the popularity list degenerates to catalog order.
    let rows: Vec<(&str, f64, u32)> = result
        .iter()
        .map(|row| (row.course_id.as_str(), row.score, row.rank))
        .collect();
    assert_eq!(
        rows,
        vec![("c1", 0.0, 1), ("c2", 0.0, 2), ("c3", 0.0, 3)]
    );
}

#[test]
fn supply_exhaustion_yields_fewer_rows_without_error() {
    let courses: Vec<Course> = (0..10)
        .map(|i| course(&format!("c{i}"), &[i as u32 % 3], 0))
        .collect();
    let owned: Vec<&str> = vec!["c0", "c1", "c2", "c3"];
    let created: Vec<&str> = vec!["c4", "c5", "c6", "c7"];
    let users = vec![user("u1", &[0, 1, 2], 0, &owned, &created)];

    let result = default_pipeline().run(&users, &courses, 5).unwrap();

    // Only c8 and c9 remain eligible.
    assert_eq!(result.len(), 2);
    let mut ids: Vec<&str> = result.iter().map(|r| r.course_id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["c8", "c9"]);
    assert_eq!(result.iter().map(|r| r.rank).collect::<Vec<_>>(), vec![1, 2]);
}

// ============================================================================
// Universal properties
// ============================================================================

/// A deterministic synthetic cohort with overlapping tags, spread levels,
/// and scattered purchases/creations.
fn synthetic_tables(n_users: usize, n_courses: usize) -> (Vec<User>, Vec<Course>) {
    let courses: Vec<Course> = (0..n_courses)
        .map(|i| {
            course(
                &format!("course_{i:04}"),
                &[(i % 11) as u32, (i % 7) as u32 + 11, (i % 5) as u32 + 18],
                (i % 4) as u8,
            )
        })
        .collect();
    let users: Vec<User> = (0..n_users)
        .map(|i| {
            let purchased = format!("course_{:04}", (i * 3) % n_courses);
            let created = format!("course_{:04}", (i * 7 + 1) % n_courses);
            user(
                &format!("user_{i:04}"),
                &[(i % 11) as u32, (i % 6) as u32 + 11],
                ((i + 1) % 4) as u8,
                &[purchased.as_str()],
                &[created.as_str()],
            )
        })
        .collect();
    (users, courses)
}

#[test]
fn every_user_reaches_the_quota_when_supply_allows() {
    let (users, courses) = sample_tables();
    let top_k = 3;
    let result = default_pipeline().run(&users, &courses, top_k).unwrap();

    let groups = by_user(&result);
    for user in &users {
        let rows = &groups[user.id.as_str()];
        assert_eq!(
            rows.len(),
            top_k,
            "user {} should reach the quota",
            user.id
        );
    }
}

fn sample_tables() -> (Vec<User>, Vec<Course>) {
    (sample_users(), sample_courses())
}

#[test]
fn excluded_courses_never_appear() {
    let (users, courses) = synthetic_tables(60, 20);
    let result = default_pipeline().run(&users, &courses, 8).unwrap();

    let exclusions: HashMap<&str, Vec<&String>> = users
        .iter()
        .map(|u| {
            (
                u.id.as_str(),
                u.purchased_course_ids
                    .iter()
                    .chain(&u.created_course_ids)
                    .collect(),
            )
        })
        .collect();

    for row in &result {
        assert!(
            !exclusions[row.user_id.as_str()].contains(&&row.course_id),
            "{} was recommended its excluded course {}",
            row.user_id,
            row.course_id
        );
    }
}

#[test]
fn ranks_are_dense_and_rows_unique_per_user() {
    let (users, courses) = synthetic_tables(60, 20);
    let result = default_pipeline().run(&users, &courses, 8).unwrap();

    for (user_id, rows) in by_user(&result) {
        let ranks: Vec<u32> = rows.iter().map(|r| r.rank).collect();
        let expected: Vec<u32> = (1..=rows.len() as u32).collect();
        assert_eq!(ranks, expected, "ranks of {user_id} must be 1..=n");

        let mut ids: Vec<&str> = rows.iter().map(|r| r.course_id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), rows.len(), "duplicate course for {user_id}");
    }
}

#[test]
fn scored_rows_are_ordered_and_precede_fallback_rows() {
    let (users, courses) = synthetic_tables(60, 20);
    let result = default_pipeline().run(&users, &courses, 12).unwrap();

    for (user_id, rows) in by_user(&result) {
        let mut seen_fallback = false;
        let mut previous_score = f64::INFINITY;
        for row in rows {
            if row.score == 0.0 {
                seen_fallback = true;
            } else {
                assert!(
                    !seen_fallback,
                    "scored row after fallback row for {user_id}"
                );
                assert!(
                    row.score <= previous_score,
                    "scores of {user_id} must be non-increasing"
                );
                previous_score = row.score;
            }
        }
    }
}

#[test]
fn chunking_does_not_change_results() {
    let (users, courses) = synthetic_tables(120, 25);

    let single = default_pipeline().run(&users, &courses, 5).unwrap();
    let chunked = default_pipeline()
        .with_chunk_size(50)
        .run(&users, &courses, 5)
        .unwrap();

    let single_groups = by_user(&single);
    let chunked_groups = by_user(&chunked);
    assert_eq!(single_groups.len(), chunked_groups.len());
    for (user_id, rows) in single_groups {
        let chunked_rows = &chunked_groups[user_id];
        assert_eq!(
            rows, *chunked_rows,
            "chunk boundary changed the result for {user_id}"
        );
    }
}

#[test]
fn identical_inputs_produce_identical_results() {
    let (users, courses) = synthetic_tables(80, 20);

    let first = default_pipeline().run(&users, &courses, 6).unwrap();
    let second = default_pipeline().run(&users, &courses, 6).unwrap();
    assert_eq!(first, second);
}

#[test]
fn adjuster_never_raises_scores() {
    let (users, courses) = synthetic_tables(40, 15);

    let plain = RecommendationPipeline::new(TfidfScorer, ExclusionFilter, None)
        .run(&users, &courses, 50)
        .unwrap();
    let adjusted = default_pipeline().run(&users, &courses, 50).unwrap();

    // With K larger than the catalog both runs keep every scored pair, so
    // rows can be matched one-to-one.
    let plain_scores: HashMap<(&str, &str), f64> = plain
        .iter()
        .map(|r| ((r.user_id.as_str(), r.course_id.as_str()), r.score))
        .collect();
    for row in adjusted.iter().filter(|r| r.score > 0.0) {
        let raw = plain_scores[&(row.user_id.as_str(), row.course_id.as_str())];
        assert!(row.score <= raw + 1e-12);
    }
}

#[test]
fn pipeline_without_adjuster_skips_the_penalty() {
    let users = vec![user("u1", &[1], 0, &[], &[])];
    let courses = vec![course("c1", &[1], 3)];

    let result = RecommendationPipeline::new(TfidfScorer, ExclusionFilter, None)
        .run(&users, &courses, 1)
        .unwrap();

    // Identical single-tag documents; without the level penalty the
    // similarity stays exactly 1.0 despite the 3-level gap.
    assert_eq!(result.len(), 1);
    assert!((result[0].score - 1.0).abs() < 1e-12);
}
