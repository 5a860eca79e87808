//! Filter to remove courses the user already purchased or created.

use std::collections::HashSet;

use data_loader::{Course, User};
use tracing::info;

use crate::error::Result;
use crate::traits::Filter;
use crate::types::ScoredPair;

/// Drops `(user, course)` rows where the course is in the user's purchased
/// or created set; the anti-join leaves every other row and score untouched.
///
/// ## Algorithm
/// One `HashSet` of forbidden course ids per user for O(1) membership tests.
pub struct ExclusionFilter;

impl Filter for ExclusionFilter {
    fn name(&self) -> &str {
        "ExclusionFilter"
    }

    fn apply(
        &self,
        scores: Vec<ScoredPair>,
        users: &[User],
        courses: &[Course],
    ) -> Result<Vec<ScoredPair>> {
        let excluded: Vec<HashSet<&str>> = users
            .iter()
            .map(|user| {
                user.purchased_course_ids
                    .iter()
                    .chain(&user.created_course_ids)
                    .map(String::as_str)
                    .collect()
            })
            .collect();

        let before = scores.len();
        let filtered: Vec<ScoredPair> = scores
            .into_iter()
            .filter(|pair| !excluded[pair.user].contains(courses[pair.course].id.as_str()))
            .collect();

        info!("ExclusionFilter removed {} pairs", before - filtered.len());
        Ok(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, purchased: &[&str], created: &[&str]) -> User {
        User {
            id: id.to_string(),
            interest_tags: vec![],
            level: 0,
            purchased_course_ids: purchased.iter().map(|s| s.to_string()).collect(),
            created_course_ids: created.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn course(id: &str) -> Course {
        Course {
            id: id.to_string(),
            tags: vec![],
            level: 0,
        }
    }

    #[test]
    fn removes_purchased_courses() {
        let users = vec![user("u1", &["c1"], &[])];
        let courses = vec![course("c1"), course("c2")];
        let scores = vec![ScoredPair::new(0, 0, 0.9), ScoredPair::new(0, 1, 0.8)];

        let filtered = ExclusionFilter.apply(scores, &users, &courses).unwrap();
        assert_eq!(filtered, vec![ScoredPair::new(0, 1, 0.8)]);
    }

    #[test]
    fn removes_created_courses() {
        let users = vec![user("u1", &[], &["c3"])];
        let courses = vec![course("c3"), course("c4")];
        let scores = vec![ScoredPair::new(0, 0, 0.7), ScoredPair::new(0, 1, 0.6)];

        let filtered = ExclusionFilter.apply(scores, &users, &courses).unwrap();
        assert_eq!(filtered, vec![ScoredPair::new(0, 1, 0.6)]);
    }

    #[test]
    fn clean_users_pass_through_unchanged() {
        let users = vec![user("u1", &[], &[])];
        let courses = vec![course("c1"), course("c2")];
        let scores = vec![ScoredPair::new(0, 0, 0.5), ScoredPair::new(0, 1, 0.4)];

        let filtered = ExclusionFilter
            .apply(scores.clone(), &users, &courses)
            .unwrap();
        assert_eq!(filtered, scores);
    }

    #[test]
    fn exclusion_only_applies_to_the_owning_user() {
        let users = vec![user("u1", &["c1"], &[]), user("u2", &[], &[])];
        let courses = vec![course("c1")];
        let scores = vec![ScoredPair::new(0, 0, 0.9), ScoredPair::new(1, 0, 0.9)];

        let filtered = ExclusionFilter.apply(scores, &users, &courses).unwrap();
        assert_eq!(filtered, vec![ScoredPair::new(1, 0, 0.9)]);
    }
}
