//! Per-user ranking and truncation.

use std::cmp::Ordering;

use data_loader::{Course, Recommendation, User};

use crate::types::ScoredPair;

/// Sort each user's rows by score descending, keep the first `top_k`, and
/// assign dense ranks starting at 1.
///
/// Tie-break: the sort is stable, so equal scores keep their prior insertion
/// order — user input order, then course input order. Identical inputs
/// therefore always rank identically.
pub fn rank_top_k(
    mut scores: Vec<ScoredPair>,
    users: &[User],
    courses: &[Course],
    top_k: usize,
) -> Vec<Recommendation> {
    scores.sort_by(|a, b| {
        a.user
            .cmp(&b.user)
            .then_with(|| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal))
    });

    let mut result = Vec::new();
    let mut current_user = usize::MAX;
    let mut rank = 0u32;
    for pair in scores {
        if pair.user != current_user {
            current_user = pair.user;
            rank = 0;
        }
        if (rank as usize) < top_k {
            rank += 1;
            result.push(Recommendation {
                user_id: users[pair.user].id.clone(),
                course_id: courses[pair.course].id.clone(),
                score: pair.score,
                rank,
            });
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables(n_users: usize, n_courses: usize) -> (Vec<User>, Vec<Course>) {
        let users = (0..n_users)
            .map(|i| User {
                id: format!("u{i}"),
                interest_tags: vec![],
                level: 0,
                purchased_course_ids: vec![],
                created_course_ids: vec![],
            })
            .collect();
        let courses = (0..n_courses)
            .map(|i| Course {
                id: format!("c{i}"),
                tags: vec![],
                level: 0,
            })
            .collect();
        (users, courses)
    }

    #[test]
    fn sorts_by_score_descending_and_assigns_dense_ranks() {
        let (users, courses) = tables(1, 3);
        let scores = vec![
            ScoredPair::new(0, 0, 0.2),
            ScoredPair::new(0, 1, 0.9),
            ScoredPair::new(0, 2, 0.5),
        ];

        let ranked = rank_top_k(scores, &users, &courses, 10);
        let order: Vec<(&str, u32)> = ranked
            .iter()
            .map(|r| (r.course_id.as_str(), r.rank))
            .collect();
        assert_eq!(order, vec![("c1", 1), ("c2", 2), ("c0", 3)]);
    }

    #[test]
    fn truncates_each_user_to_top_k() {
        let (users, courses) = tables(2, 4);
        let scores = vec![
            ScoredPair::new(0, 0, 0.4),
            ScoredPair::new(0, 1, 0.3),
            ScoredPair::new(0, 2, 0.2),
            ScoredPair::new(1, 0, 0.9),
            ScoredPair::new(1, 3, 0.8),
        ];

        let ranked = rank_top_k(scores, &users, &courses, 2);
        assert_eq!(ranked.len(), 4);
        for row in &ranked {
            assert!(row.rank >= 1 && row.rank <= 2);
        }
    }

    #[test]
    fn ties_keep_insertion_order() {
        let (users, courses) = tables(1, 3);
        let scores = vec![
            ScoredPair::new(0, 2, 0.5),
            ScoredPair::new(0, 0, 0.5),
            ScoredPair::new(0, 1, 0.5),
        ];

        let ranked = rank_top_k(scores, &users, &courses, 3);
        let order: Vec<&str> = ranked.iter().map(|r| r.course_id.as_str()).collect();
        assert_eq!(order, vec!["c2", "c0", "c1"], "stable sort must keep ties");
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let (users, courses) = tables(1, 1);
        assert!(rank_top_k(vec![], &users, &courses, 5).is_empty());
    }
}
