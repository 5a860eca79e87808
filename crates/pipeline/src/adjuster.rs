//! Level-distance score adjustment.

use data_loader::{Course, User};
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::traits::Adjuster;
use crate::types::ScoredPair;

/// Default penalty by level distance: diff 0 → 0.00, 1 → 0.15, 2 → 0.50,
/// 3 or more → 0.85.
pub const DEFAULT_PENALTY_WEIGHTS: [f64; 4] = [0.00, 0.15, 0.50, 0.85];

/// Multiplies each score by `1 - penalty[d]`, where `d` is the absolute
/// user/course level difference clamped to the weight vector's last index.
///
/// The operation is point-wise and order-independent.
pub struct LevelWeightAdjuster {
    penalty_weights: Vec<f64>,
}

impl LevelWeightAdjuster {
    /// Build an adjuster from a penalty vector.
    ///
    /// The vector must be non-empty with every value in `[0, 1]`; anything
    /// else is a configuration error.
    pub fn new(penalty_weights: Vec<f64>) -> Result<Self> {
        if penalty_weights.is_empty() {
            return Err(PipelineError::InvalidPenaltyWeights(
                "weight vector is empty".to_string(),
            ));
        }
        if let Some(weight) = penalty_weights.iter().find(|w| !(0.0..=1.0).contains(*w)) {
            return Err(PipelineError::InvalidPenaltyWeights(format!(
                "weight {weight} is outside [0, 1]"
            )));
        }
        Ok(Self { penalty_weights })
    }

    pub fn with_default_weights() -> Self {
        Self {
            penalty_weights: DEFAULT_PENALTY_WEIGHTS.to_vec(),
        }
    }
}

impl Adjuster for LevelWeightAdjuster {
    fn adjust(
        &self,
        mut scores: Vec<ScoredPair>,
        users: &[User],
        courses: &[Course],
    ) -> Result<Vec<ScoredPair>> {
        let max_diff = self.penalty_weights.len() - 1;
        for pair in &mut scores {
            let user_level = i32::from(users[pair.user].level);
            let course_level = i32::from(courses[pair.course].level);
            let diff = ((user_level - course_level).unsigned_abs() as usize).min(max_diff);
            pair.score *= 1.0 - self.penalty_weights[diff];
        }
        info!("LevelWeightAdjuster applied: {} pairs adjusted", scores.len());
        Ok(scores)
    }
}
