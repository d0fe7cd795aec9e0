//! Bagged regression-tree ensemble.
//!
//! The learned capability behind the conversion-rate estimator: each tree
//! is grown on a bootstrap resample of the training data with
//! variance-reduction splits, and predictions average across trees.
//! Per-tree RNGs derive from a single base seed, so a fit is fully
//! reproducible. Trees are independent and trained in parallel via rayon.

use crate::ab_engine::encoder::FEATURE_COUNT;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

/// Cap on split-threshold candidates examined per feature.
const MAX_SPLIT_CANDIDATES: usize = 32;

/// Ensemble hyperparameters.
#[derive(Debug, Clone)]
pub struct ForestConfig {
    pub tree_count: usize,
    pub max_depth: usize,
    pub min_leaf_samples: usize,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            tree_count: 100,
            max_depth: 12,
            min_leaf_samples: 2,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn predict(&self, row: &[f64; FEATURE_COUNT]) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

/// Trained ensemble. Immutable after [`RandomForest::fit`].
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<Tree>,
}

impl RandomForest {
    /// Train the ensemble.
    ///
    /// `rows` and `targets` must be the same non-zero length; the caller
    /// (the estimator) validates shape before handing data over.
    pub fn fit(
        rows: &[[f64; FEATURE_COUNT]],
        targets: &[f64],
        config: &ForestConfig,
        seed: u64,
    ) -> Self {
        debug_assert_eq!(rows.len(), targets.len());
        debug_assert!(!rows.is_empty());

        let trees: Vec<Tree> = (0..config.tree_count)
            .into_par_iter()
            .map(|tree_index| {
                let tree_seed =
                    seed.wrapping_add((tree_index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
                let mut rng = StdRng::seed_from_u64(tree_seed);

                // Bootstrap resample, same size as the training set.
                let indices: Vec<usize> =
                    (0..rows.len()).map(|_| rng.gen_range(0..rows.len())).collect();

                let mut builder = TreeBuilder {
                    rows,
                    targets,
                    config,
                    nodes: Vec::new(),
                };
                builder.grow(&indices, 0);
                Tree {
                    nodes: builder.nodes,
                }
            })
            .collect();

        Self { trees }
    }

    /// Average prediction across all trees.
    pub fn predict(&self, row: &[f64; FEATURE_COUNT]) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict(row)).sum();
        sum / self.trees.len() as f64
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }
}

struct TreeBuilder<'a> {
    rows: &'a [[f64; FEATURE_COUNT]],
    targets: &'a [f64],
    config: &'a ForestConfig,
    nodes: Vec<Node>,
}

impl TreeBuilder<'_> {
    /// Grow a subtree over `indices`, returning its node index.
    fn grow(&mut self, indices: &[usize], depth: usize) -> usize {
        let mean = self.mean_target(indices);

        let at_depth_limit = depth >= self.config.max_depth;
        let too_small = indices.len() < 2 * self.config.min_leaf_samples;
        if at_depth_limit || too_small {
            return self.push(Node::Leaf { value: mean });
        }

        let Some((feature, threshold)) = self.best_split(indices) else {
            return self.push(Node::Leaf { value: mean });
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| self.rows[i][feature] <= threshold);

        if left_indices.len() < self.config.min_leaf_samples
            || right_indices.len() < self.config.min_leaf_samples
        {
            return self.push(Node::Leaf { value: mean });
        }

        // Reserve the split slot before recursing so child indices are known.
        let node_index = self.push(Node::Leaf { value: mean });
        let left = self.grow(&left_indices, depth + 1);
        let right = self.grow(&right_indices, depth + 1);
        self.nodes[node_index] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        node_index
    }

    fn push(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn mean_target(&self, indices: &[usize]) -> f64 {
        if indices.is_empty() {
            return 0.0;
        }
        let sum: f64 = indices.iter().map(|&i| self.targets[i]).sum();
        sum / indices.len() as f64
    }

    fn sse(&self, indices: &[usize]) -> f64 {
        let mean = self.mean_target(indices);
        indices
            .iter()
            .map(|&i| {
                let d = self.targets[i] - mean;
                d * d
            })
            .sum()
    }

    /// Best (feature, threshold) by squared-error reduction, or `None`
    /// when no candidate improves on the unsplit node.
    fn best_split(&self, indices: &[usize]) -> Option<(usize, f64)> {
        let parent_sse = self.sse(indices);
        if parent_sse <= f64::EPSILON {
            return None;
        }

        let mut best: Option<(usize, f64, f64)> = None;

        for feature in 0..FEATURE_COUNT {
            for threshold in self.candidate_thresholds(indices, feature) {
                let (left, right): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .partition(|&&i| self.rows[i][feature] <= threshold);
                if left.is_empty() || right.is_empty() {
                    continue;
                }

                let split_sse = self.sse(&left) + self.sse(&right);
                if split_sse + f64::EPSILON >= parent_sse {
                    continue;
                }
                match best {
                    Some((_, _, current)) if split_sse >= current => {}
                    _ => best = Some((feature, threshold, split_sse)),
                }
            }
        }

        best.map(|(feature, threshold, _)| (feature, threshold))
    }

    /// Midpoints between consecutive distinct feature values, thinned to
    /// a bounded candidate set for wide numeric features like clicks.
    fn candidate_thresholds(&self, indices: &[usize], feature: usize) -> Vec<f64> {
        let mut values: Vec<f64> = indices.iter().map(|&i| self.rows[i][feature]).collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        values.dedup();
        if values.len() < 2 {
            return Vec::new();
        }

        let midpoints: Vec<f64> = values
            .windows(2)
            .map(|pair| (pair[0] + pair[1]) / 2.0)
            .collect();

        if midpoints.len() <= MAX_SPLIT_CANDIDATES {
            return midpoints;
        }
        let step = midpoints.len() / MAX_SPLIT_CANDIDATES;
        midpoints.into_iter().step_by(step.max(1)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> ForestConfig {
        ForestConfig {
            tree_count: 20,
            ..ForestConfig::default()
        }
    }

    #[test]
    fn test_constant_target_predicts_constant() {
        let rows = vec![[0.0, 1.0, 2.0, 10.0]; 30];
        let targets = vec![7.5; 30];
        let forest = RandomForest::fit(&rows, &targets, &small_config(), 1);
        assert!((forest.predict(&[0.0, 1.0, 2.0, 10.0]) - 7.5).abs() < 1e-9);
    }

    #[test]
    fn test_learns_a_simple_split() {
        // Target depends only on feature 3 (clicks).
        let mut rows = Vec::new();
        let mut targets = Vec::new();
        for i in 0..60 {
            let clicks = f64::from(i);
            rows.push([0.0, 0.0, 0.0, clicks]);
            targets.push(if clicks < 30.0 { 2.0 } else { 9.0 });
        }
        let forest = RandomForest::fit(&rows, &targets, &small_config(), 7);
        assert!(forest.predict(&[0.0, 0.0, 0.0, 5.0]) < 4.0);
        assert!(forest.predict(&[0.0, 0.0, 0.0, 55.0]) > 7.0);
    }

    #[test]
    fn test_fit_is_deterministic_for_a_seed() {
        let rows: Vec<[f64; 4]> = (0..40)
            .map(|i| [f64::from(i % 3), f64::from(i % 5), f64::from(i % 2), f64::from(i)])
            .collect();
        let targets: Vec<f64> = (0..40).map(|i| f64::from(i % 7)).collect();

        let a = RandomForest::fit(&rows, &targets, &small_config(), 42);
        let b = RandomForest::fit(&rows, &targets, &small_config(), 42);
        for row in &rows {
            assert_eq!(a.predict(row), b.predict(row));
        }
    }

    #[test]
    fn test_tree_count_matches_config() {
        let rows = vec![[0.0, 0.0, 0.0, 1.0]; 10];
        let targets = vec![1.0; 10];
        let forest = RandomForest::fit(&rows, &targets, &small_config(), 3);
        assert_eq!(forest.tree_count(), 20);
    }
}
