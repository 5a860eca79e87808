//! TF-IDF cosine similarity scorer.

use std::collections::{BTreeMap, HashMap};
use std::ops::Range;

use data_loader::{Course, TagId, User};
use rayon::prelude::*;
use tracing::info;

use crate::error::Result;
use crate::traits::Scorer;
use crate::types::ScoredPair;

/// Scores users against courses by cosine similarity of TF-IDF vectors over
/// the shared tag vocabulary.
///
/// The token space is just the tag ids, so no text vectorizer is needed: the
/// vocabulary is the sorted distinct tag ids across all user and course
/// documents, `idf(t) = ln((1 + N) / (1 + df(t))) + 1` with `N` the total
/// document count, term weights are natural counts times idf, L2-normalized
/// per document. Cosine similarity of normalized vectors is a plain dot
/// product. Only strictly positive similarities are emitted.
pub struct TfidfScorer;

impl Scorer for TfidfScorer {
    fn score_block(
        &self,
        users: &[User],
        block: Range<usize>,
        courses: &[Course],
    ) -> Result<Vec<ScoredPair>> {
        if block.is_empty() || courses.is_empty() {
            return Ok(Vec::new());
        }
        let model = TfidfModel::fit(users, courses);
        let pairs = model.score_block(users, block, courses);
        info!("TF-IDF scoring complete: {} user-course pairs", pairs.len());
        Ok(pairs)
    }
}

/// Fitted vocabulary and inverse document frequencies.
struct TfidfModel {
    vocab: HashMap<TagId, usize>,
    idf: Vec<f64>,
}

impl TfidfModel {
    /// Fit over the concatenation of all user documents and all course
    /// documents. The vocabulary is shared across both tables.
    fn fit(users: &[User], courses: &[Course]) -> Self {
        let mut df: BTreeMap<TagId, usize> = BTreeMap::new();
        for user in users {
            accumulate_df(&mut df, &user.interest_tags);
        }
        for course in courses {
            accumulate_df(&mut df, &course.tags);
        }

        let n_docs = users.len() + courses.len();
        let mut vocab = HashMap::with_capacity(df.len());
        let mut idf = Vec::with_capacity(df.len());
        for (term, (tag, count)) in df.into_iter().enumerate() {
            vocab.insert(tag, term);
            idf.push(((1.0 + n_docs as f64) / (1.0 + count as f64)).ln() + 1.0);
        }
        Self { vocab, idf }
    }

    /// TF-IDF weights for one document, L2-normalized, sorted by term index.
    /// Empty documents vectorize to the zero vector (no entries).
    fn vectorize(&self, tags: &[TagId]) -> Vec<(usize, f64)> {
        if tags.is_empty() {
            return Vec::new();
        }
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for tag in tags {
            if let Some(&term) = self.vocab.get(tag) {
                *counts.entry(term).or_insert(0.0) += 1.0;
            }
        }
        let mut weights: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(term, tf)| (term, tf * self.idf[term]))
            .collect();
        let norm = weights.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, weight) in &mut weights {
                *weight /= norm;
            }
        }
        weights
    }

    /// Sparse similarity of `users[block]` against every course, via an
    /// inverted index over the course vectors. Pairs come out in user input
    /// order, then course input order, which downstream stages rely on for
    /// reproducible tie-breaks.
    fn score_block(
        &self,
        users: &[User],
        block: Range<usize>,
        courses: &[Course],
    ) -> Vec<ScoredPair> {
        let mut course_index: Vec<Vec<(usize, f64)>> = vec![Vec::new(); self.idf.len()];
        for (course, c) in courses.iter().enumerate() {
            for (term, weight) in self.vectorize(&c.tags) {
                course_index[term].push((course, weight));
            }
        }

        block
            .into_par_iter()
            .map(|user| {
                let mut sims = vec![0.0f64; courses.len()];
                for (term, weight) in self.vectorize(&users[user].interest_tags) {
                    for &(course, course_weight) in &course_index[term] {
                        sims[course] += weight * course_weight;
                    }
                }
                sims.iter()
                    .enumerate()
                    .filter(|&(_, &sim)| sim > 0.0)
                    .map(|(course, &score)| ScoredPair::new(user, course, score))
                    .collect::<Vec<_>>()
            })
            .flatten()
            .collect()
    }
}

fn accumulate_df(df: &mut BTreeMap<TagId, usize>, tags: &[TagId]) {
    // Tag lists are short; a linear seen-check beats hashing here.
    let mut seen: Vec<TagId> = Vec::with_capacity(tags.len());
    for &tag in tags {
        if !seen.contains(&tag) {
            seen.push(tag);
            *df.entry(tag).or_insert(0) += 1;
        }
    }
}
