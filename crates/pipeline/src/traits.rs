//! Stage seams for the recommendation pipeline.
//!
//! Each stage is a trait so tests and the orchestrator can compose them
//! freely; `Send + Sync` allows stages to be shared across worker threads.

use std::ops::Range;

use data_loader::{Course, User};

use crate::error::Result;
use crate::types::ScoredPair;

/// Computes the sparse `(user, course, score)` relation.
pub trait Scorer: Send + Sync {
    /// Score a contiguous block of the user table against the full catalog.
    ///
    /// Corpus statistics are always derived from the complete `users` and
    /// `courses` tables, so block boundaries never change scores. Emitted
    /// `user` fields are absolute indices into `users`.
    fn score_block(
        &self,
        users: &[User],
        block: Range<usize>,
        courses: &[Course],
    ) -> Result<Vec<ScoredPair>>;

    /// Score every user against the catalog in a single block.
    fn score(&self, users: &[User], courses: &[Course]) -> Result<Vec<ScoredPair>> {
        self.score_block(users, 0..users.len(), courses)
    }
}

/// Removes rows that must never be recommended.
pub trait Filter: Send + Sync {
    /// Returns the name of this filter (for logging/debugging)
    fn name(&self) -> &str;

    /// Apply this filter, preserving all surviving rows and scores exactly.
    fn apply(
        &self,
        scores: Vec<ScoredPair>,
        users: &[User],
        courses: &[Course],
    ) -> Result<Vec<ScoredPair>>;
}

/// Reweights scores according to a business rule.
pub trait Adjuster: Send + Sync {
    /// Adjust scores point-wise; row order is preserved.
    fn adjust(
        &self,
        scores: Vec<ScoredPair>,
        users: &[User],
        courses: &[Course],
    ) -> Result<Vec<ScoredPair>>;
}
