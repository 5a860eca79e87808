//! Recommendation pipeline for the course engine.
//!
//! This crate provides the core four-stage computation plus fallback:
//! 1. **Scorer** — TF-IDF cosine similarity over user/course tag sets
//! 2. **ExclusionFilter** — drops purchased/created courses
//! 3. **Adjuster** — level-distance score penalty
//! 4. **Ranker** — per-user top-K with dense ranks
//! 5. **Fallback** — popularity backfill up to the top-K quota
//!
//! Large cohorts are processed in contiguous user chunks against the full
//! catalog; chunk boundaries never change results.
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{ExclusionFilter, LevelWeightAdjuster, RecommendationPipeline, TfidfScorer};
//!
//! let pipeline = RecommendationPipeline::new(
//!     TfidfScorer,
//!     ExclusionFilter,
//!     Some(Box::new(LevelWeightAdjuster::with_default_weights())),
//! );
//! let result = pipeline.run(&users, &courses, 10)?;
//! ```

pub mod adjuster;
pub mod error;
pub mod fallback;
pub mod filters;
pub mod pipeline;
pub mod ranker;
pub mod scorer;
pub mod traits;
pub mod types;

// Re-export main types
pub use adjuster::{DEFAULT_PENALTY_WEIGHTS, LevelWeightAdjuster};
pub use error::{PipelineError, Result};
pub use filters::ExclusionFilter;
pub use pipeline::{CHUNK_SIZE, RecommendationPipeline};
pub use scorer::TfidfScorer;
pub use traits::{Adjuster, Filter, Scorer};
pub use types::ScoredPair;
