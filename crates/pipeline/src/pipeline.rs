//! Pipeline orchestration.
//!
//! Composes Scorer → Filter → Adjuster → Rank/Top-K per user block and runs
//! the popularity fallback over the concatenated result.

use std::collections::HashSet;
use std::ops::Range;

use data_loader::{Course, MAX_LEVEL, Recommendation, User};
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::fallback::apply_fallback;
use crate::ranker::rank_top_k;
use crate::traits::{Adjuster, Filter, Scorer};

/// Users are processed in contiguous blocks of this size when the cohort is
/// larger. Each block's intermediate state is dropped before the next block
/// starts, bounding peak memory by `CHUNK_SIZE × |courses|` pairs.
pub const CHUNK_SIZE: usize = 50_000;

/// The recommendation pipeline.
///
/// A pure function over its inputs: no I/O, no retries, no shared state.
/// Any stage error aborts the run and is propagated unchanged.
pub struct RecommendationPipeline {
    scorer: Box<dyn Scorer>,
    filter: Box<dyn Filter>,
    adjuster: Option<Box<dyn Adjuster>>,
    chunk_size: usize,
}

impl RecommendationPipeline {
    /// Compose a pipeline. With `adjuster = None` the adjustment stage is
    /// skipped entirely.
    pub fn new(
        scorer: impl Scorer + 'static,
        filter: impl Filter + 'static,
        adjuster: Option<Box<dyn Adjuster>>,
    ) -> Self {
        Self {
            scorer: Box::new(scorer),
            filter: Box::new(filter),
            adjuster,
            chunk_size: CHUNK_SIZE,
        }
    }

    /// Override the user chunk size (tests and benchmarks).
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Run the pipeline and return `(user_id, course_id, score, rank)` rows.
    ///
    /// Every input user ends with exactly `top_k` rows unless their eligible
    /// supply (catalog minus exclusions) is smaller. Empty user or course
    /// tables yield an empty result, not an error.
    pub fn run(
        &self,
        users: &[User],
        courses: &[Course],
        top_k: usize,
    ) -> Result<Vec<Recommendation>> {
        if top_k == 0 {
            return Err(PipelineError::InvalidTopK(top_k));
        }
        validate_levels(users, courses)?;

        info!(
            "Pipeline started: {} users, {} courses, top_k={}",
            users.len(),
            courses.len(),
            top_k
        );

        let mut result = if users.len() > self.chunk_size {
            self.run_chunked(users, courses, top_k)?
        } else {
            self.run_block(users, 0..users.len(), courses, top_k)?
        };

        apply_fallback(&mut result, users, courses, top_k);

        let user_count = result
            .iter()
            .map(|row| row.user_id.as_str())
            .collect::<HashSet<_>>()
            .len();
        info!(
            "Pipeline complete: {} recommendations for {} users",
            result.len(),
            user_count
        );
        Ok(result)
    }

    /// Score → Filter → Adjust → Rank for one contiguous user block.
    fn run_block(
        &self,
        users: &[User],
        block: Range<usize>,
        courses: &[Course],
        top_k: usize,
    ) -> Result<Vec<Recommendation>> {
        let scores = self.scorer.score_block(users, block, courses)?;
        info!("Scoring complete: {} pairs", scores.len());

        debug!(
            "Applying filter: {} (input count: {})",
            self.filter.name(),
            scores.len()
        );
        let scores = self.filter.apply(scores, users, courses)?;
        info!(
            "Filtering complete ({}): {} pairs remaining",
            self.filter.name(),
            scores.len()
        );

        let scores = match &self.adjuster {
            Some(adjuster) => {
                let adjusted = adjuster.adjust(scores, users, courses)?;
                info!("Adjustment complete");
                adjusted
            }
            None => scores,
        };

        Ok(rank_top_k(scores, users, courses, top_k))
    }

    fn run_chunked(
        &self,
        users: &[User],
        courses: &[Course],
        top_k: usize,
    ) -> Result<Vec<Recommendation>> {
        let num_chunks = users.len().div_ceil(self.chunk_size);
        info!(
            "Chunked processing: {} users split into {} chunks",
            users.len(),
            num_chunks
        );

        let mut result = Vec::new();
        for (index, start) in (0..users.len()).step_by(self.chunk_size).enumerate() {
            let end = (start + self.chunk_size).min(users.len());
            let chunk = self.run_block(users, start..end, courses, top_k)?;
            result.extend(chunk);
            info!("Chunk {}/{} processed", index + 1, num_chunks);
        }
        Ok(result)
    }
}

fn validate_levels(users: &[User], courses: &[Course]) -> Result<()> {
    for user in users {
        if user.level > MAX_LEVEL {
            return Err(PipelineError::InvalidLevel {
                entity: "user",
                id: user.id.clone(),
                level: user.level,
            });
        }
    }
    for course in courses {
        if course.level > MAX_LEVEL {
            return Err(PipelineError::InvalidLevel {
                entity: "course",
                id: course.id.clone(),
                level: course.level,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjuster::LevelWeightAdjuster;
    use crate::filters::ExclusionFilter;
    use crate::scorer::TfidfScorer;

    fn default_pipeline() -> RecommendationPipeline {
        RecommendationPipeline::new(
            TfidfScorer,
            ExclusionFilter,
            Some(Box::new(LevelWeightAdjuster::with_default_weights())),
        )
    }

    fn user(id: &str, tags: &[u32]) -> User {
        User {
            id: id.to_string(),
            interest_tags: tags.to_vec(),
            level: 0,
            purchased_course_ids: vec![],
            created_course_ids: vec![],
        }
    }

    fn course(id: &str, tags: &[u32]) -> Course {
        Course {
            id: id.to_string(),
            tags: tags.to_vec(),
            level: 0,
        }
    }

    #[test]
    fn zero_top_k_is_rejected() {
        let users = vec![user("u1", &[1])];
        let courses = vec![course("c1", &[1])];

        let err = default_pipeline().run(&users, &courses, 0).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidTopK(0)));
    }

    #[test]
    fn out_of_range_level_is_rejected() {
        let mut bad = user("u1", &[1]);
        bad.level = 9;
        let courses = vec![course("c1", &[1])];

        let err = default_pipeline().run(&[bad], &courses, 3).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidLevel { entity: "user", .. }));
    }

    #[test]
    fn empty_catalog_yields_empty_result() {
        let users = vec![user("u1", &[1])];
        let result = default_pipeline().run(&users, &[], 3).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn empty_cohort_yields_empty_result() {
        let courses = vec![course("c1", &[1])];
        let result = default_pipeline().run(&[], &courses, 3).unwrap();
        assert!(result.is_empty());
    }
}
