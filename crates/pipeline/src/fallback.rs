//! Popularity backfill for users below the top-K quota.

use std::collections::{HashMap, HashSet};

use data_loader::{Course, Recommendation, User};
use tracing::info;

/// Global popularity ordering over the full catalog.
///
/// Courses are ordered by purchase frequency across all users in the run
/// (descending, ties in first-seen order), followed by every never-purchased
/// catalog course in course-table order. With no purchases anywhere this
/// degenerates to plain catalog order.
pub fn popularity_order<'a>(users: &'a [User], courses: &'a [Course]) -> Vec<&'a str> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut popular: Vec<&str> = Vec::new();
    for user in users {
        for course_id in &user.purchased_course_ids {
            let count = counts.entry(course_id.as_str()).or_insert(0);
            if *count == 0 {
                popular.push(course_id.as_str());
            }
            *count += 1;
        }
    }
    // Stable sort keeps first-seen order among equal counts.
    popular.sort_by_key(|id| std::cmp::Reverse(counts[id]));

    let purchased: HashSet<&str> = popular.iter().copied().collect();
    for course in courses {
        if !purchased.contains(course.id.as_str()) {
            popular.push(course.id.as_str());
        }
    }
    popular
}

/// Append fallback rows so every user reaches `top_k` recommendations when
/// the eligible supply allows it.
///
/// For each user below quota (visited in user-table order), courses are
/// drawn from [`popularity_order`], skipping anything already assigned to
/// the user and anything in their purchased/created sets. Appended rows
/// carry `score = 0.0` and ranks continuing after the user's existing rows.
/// If supply runs out the user simply ends below quota.
pub fn apply_fallback(
    result: &mut Vec<Recommendation>,
    users: &[User],
    courses: &[Course],
    top_k: usize,
) {
    let popular = popularity_order(users, courses);

    let mut fallback_rows: Vec<Recommendation> = Vec::new();
    let mut users_filled = 0usize;
    {
        let mut assigned: HashMap<&str, HashSet<&str>> = HashMap::new();
        for row in result.iter() {
            assigned
                .entry(row.user_id.as_str())
                .or_default()
                .insert(row.course_id.as_str());
        }

        for user in users {
            let existing = assigned.get(user.id.as_str());
            let current = existing.map_or(0, |set| set.len());
            if current >= top_k {
                continue;
            }
            let need = top_k - current;
            let excluded: HashSet<&str> = user
                .purchased_course_ids
                .iter()
                .chain(&user.created_course_ids)
                .map(String::as_str)
                .collect();

            let mut added = 0usize;
            for &course_id in &popular {
                if added >= need {
                    break;
                }
                if existing.is_some_and(|set| set.contains(course_id))
                    || excluded.contains(course_id)
                {
                    continue;
                }
                added += 1;
                fallback_rows.push(Recommendation {
                    user_id: user.id.clone(),
                    course_id: course_id.to_string(),
                    score: 0.0,
                    rank: (current + added) as u32,
                });
            }
            if added > 0 {
                users_filled += 1;
            }
        }
    }

    if !fallback_rows.is_empty() {
        info!(
            "Fallback applied: {} rows added for {} users",
            fallback_rows.len(),
            users_filled
        );
        result.extend(fallback_rows);
    }
}
