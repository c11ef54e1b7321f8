//! Seeded isolation forest.
//!
//! Each tree isolates a random subsample by splitting on a random non-constant feature at a
//! uniform threshold between that feature's node minimum and maximum. Anomalies take short
//! paths. Scores follow the usual convention: `score_samples` is the negated anomaly score
//! (lower = more abnormal) and the decision offset is the `contamination` quantile of the
//! training scores.

use crate::config::ModelConfig;
use crate::stats;
use ndarray::{Array1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Expected path length of an unsuccessful search in a binary tree of `n` points.
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn path_length(&self, row: &[f64]) -> f64 {
        let mut node = self;
        let mut depth = 0.0;
        loop {
            match node {
                Node::Leaf { size } => return depth + average_path_length(*size),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold { left } else { right };
                    depth += 1.0;
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct IsolationForest {
    trees: Vec<Node>,
    sample_size: usize,
    offset: f64,
}

struct TreeBuilder<'a, 'r> {
    x: ArrayView2<'a, f64>,
    max_depth: usize,
    rng: &'r mut StdRng,
}

impl TreeBuilder<'_, '_> {
    fn build(&mut self, rows: Vec<usize>, depth: usize) -> Node {
        if depth >= self.max_depth || rows.len() <= 1 {
            return Node::Leaf { size: rows.len() };
        }
        // (feature, min, max) of every feature that still varies at this node
        let candidates: Vec<(usize, f64, f64)> = (0..self.x.ncols())
            .filter_map(|f| {
                let lo = rows.iter().map(|&r| self.x[[r, f]]).fold(f64::INFINITY, f64::min);
                let hi = rows.iter().map(|&r| self.x[[r, f]]).fold(f64::NEG_INFINITY, f64::max);
                (hi > lo).then_some((f, lo, hi))
            })
            .collect();
        if candidates.is_empty() {
            return Node::Leaf { size: rows.len() };
        }
        let (feature, lo, hi) = candidates[self.rng.gen_range(0..candidates.len())];
        let threshold = self.rng.gen_range(lo..hi);
        let (left, right): (Vec<usize>, Vec<usize>) =
            rows.into_iter().partition(|&r| self.x[[r, feature]] <= threshold);
        Node::Split {
            feature,
            threshold,
            left: Box::new(self.build(left, depth + 1)),
            right: Box::new(self.build(right, depth + 1)),
        }
    }
}

impl IsolationForest {
    /// Fit on the rows of `x`. Returns `None` when there is nothing to fit.
    pub fn fit(x: ArrayView2<'_, f64>, config: &ModelConfig) -> Option<Self> {
        let n = x.nrows();
        if n == 0 || config.n_estimators == 0 {
            return None;
        }
        let sample_size = config.max_samples.min(n).max(1);
        let max_depth = (sample_size.max(2) as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(config.seed);

        let mut trees = Vec::with_capacity(config.n_estimators);
        for _ in 0..config.n_estimators {
            let rows = rand::seq::index::sample(&mut rng, n, sample_size).into_vec();
            let mut builder = TreeBuilder {
                x,
                max_depth,
                rng: &mut rng,
            };
            trees.push(builder.build(rows, 0));
        }

        let mut forest = Self {
            trees,
            sample_size,
            offset: 0.0,
        };
        let scores = forest.score_samples(x);
        forest.offset = stats::quantile(scores.as_slice().unwrap_or(&[]), config.contamination)
            .unwrap_or(0.0);
        Some(forest)
    }

    /// Negated anomaly score per row, in [-1, 0); lower is more abnormal.
    pub fn score_samples(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        let norm = average_path_length(self.sample_size).max(f64::MIN_POSITIVE);
        x.rows()
            .into_iter()
            .map(|row| {
                let row = row.to_vec();
                let mean_path = self
                    .trees
                    .iter()
                    .map(|t| t.path_length(&row))
                    .sum::<f64>()
                    / self.trees.len() as f64;
                -(2f64.powf(-mean_path / norm))
            })
            .collect()
    }

    /// Score relative to the contamination offset; negative means outlier.
    pub fn decision_function(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        self.score_samples(x) - self.offset
    }

    /// `1` for inliers, `-1` for outliers.
    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Array1<i8> {
        self.decision_function(x)
            .mapv(|d| if d < 0.0 { -1 } else { 1 })
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}
