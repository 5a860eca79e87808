//! Core domain types for the recommendation engine.

use serde::{Deserialize, Serialize};

// =============================================================================
// Type Aliases
// =============================================================================

/// Integer id describing an interest or course topic.
pub type TagId = u32;

/// Difficulty rating; valid values are `0..=MAX_LEVEL`.
pub type Level = u8;

/// Highest valid [`Level`].
pub const MAX_LEVEL: Level = 3;

// =============================================================================
// Input Tables
// =============================================================================

/// One row of the users table.
///
/// Missing list columns in the source data are loaded as empty vectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub interest_tags: Vec<TagId>,
    pub level: Level,
    pub purchased_course_ids: Vec<String>,
    pub created_course_ids: Vec<String>,
}

/// One row of the courses table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub tags: Vec<TagId>,
    pub level: Level,
}

// =============================================================================
// Output Table
// =============================================================================

/// One row of the final ranked result.
///
/// `rank` is dense and contiguous per user, starting at 1. Fallback rows
/// carry `score == 0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub user_id: String,
    pub course_id: String,
    pub score: f64,
    pub rank: u32,
}
