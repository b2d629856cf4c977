//! CART decision trees shared by the forest and boosting models.
//!
//! Trees are stored as a flat node arena with the root at index 0. Samples
//! with `x[feature] <= threshold` go left.

use std::cmp::Ordering;

use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A fitted tree. Leaves hold a class distribution (classification) or a
/// single value (regression).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// Leaf payload reached by `x`.
    #[must_use]
    pub fn leaf_value(&self, x: &[f64]) -> &[f64] {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if x[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Scalar prediction of a regression tree.
    #[must_use]
    pub fn predict_value(&self, x: &[f64]) -> f64 {
        self.leaf_value(x).first().copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], id: usize) -> usize {
            match &nodes[id] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }
}

/// Growth limits shared by both tree kinds.
#[derive(Debug, Clone, Copy)]
pub struct TreeLimits {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Features considered per split; `None` means all.
    pub max_features: Option<usize>,
}

struct Split {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

fn sort_by_feature(x: &[Vec<f64>], indices: &mut [usize], feature: usize) {
    indices.sort_by(|&a, &b| {
        x[a][feature]
            .partial_cmp(&x[b][feature])
            .unwrap_or(Ordering::Equal)
    });
}

fn candidate_features<R: Rng>(n_features: usize, limits: &TreeLimits, rng: &mut R) -> Vec<usize> {
    match limits.max_features {
        Some(k) if k < n_features => index::sample(rng, n_features, k.max(1)).into_vec(),
        _ => (0..n_features).collect(),
    }
}

fn partition(x: &[Vec<f64>], indices: &[usize], split: &Split) -> (Vec<usize>, Vec<usize>) {
    indices
        .iter()
        .copied()
        .partition(|&i| x[i][split.feature] <= split.threshold)
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

/// Gini-impurity classification tree builder.
pub struct ClassificationTreeBuilder<'a> {
    x: &'a [Vec<f64>],
    y: &'a [usize],
    n_classes: usize,
    limits: TreeLimits,
    nodes: Vec<Node>,
}

impl<'a> ClassificationTreeBuilder<'a> {
    #[must_use]
    pub fn new(x: &'a [Vec<f64>], y: &'a [usize], n_classes: usize, limits: TreeLimits) -> Self {
        Self {
            x,
            y,
            n_classes,
            limits,
            nodes: Vec::new(),
        }
    }

    /// Grow a tree on the given sample indices (repeats allowed, for bagging).
    pub fn fit<R: Rng>(mut self, indices: Vec<usize>, rng: &mut R) -> DecisionTree {
        self.grow(indices, 0, rng);
        DecisionTree { nodes: self.nodes }
    }

    fn counts(&self, indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0; self.n_classes];
        for &i in indices {
            counts[self.y[i]] += 1;
        }
        counts
    }

    fn leaf(&mut self, counts: &[usize], total: usize) -> usize {
        let value = if total == 0 {
            vec![1.0 / self.n_classes.max(1) as f64; self.n_classes]
        } else {
            counts.iter().map(|&c| c as f64 / total as f64).collect()
        };
        self.nodes.push(Node::Leaf { value });
        self.nodes.len() - 1
    }

    fn grow<R: Rng>(&mut self, indices: Vec<usize>, depth: usize, rng: &mut R) -> usize {
        let counts = self.counts(&indices);
        let n = indices.len();
        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let depth_reached = self.limits.max_depth.is_some_and(|d| depth >= d);

        if pure || depth_reached || n < self.limits.min_samples_split {
            return self.leaf(&counts, n);
        }

        let parent = gini(&counts, n);
        let Some(split) = self.best_split(&indices, parent, rng) else {
            return self.leaf(&counts, n);
        };

        let (left, right) = partition(self.x, &indices, &split);
        let id = self.leaf(&counts, n);
        let left_id = self.grow(left, depth + 1, rng);
        let right_id = self.grow(right, depth + 1, rng);
        self.nodes[id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: left_id,
            right: right_id,
        };
        id
    }

    fn best_split<R: Rng>(&self, indices: &[usize], parent: f64, rng: &mut R) -> Option<Split> {
        let n_features = self.x.first().map_or(0, Vec::len);
        let total = self.counts(indices);
        let n = indices.len();
        let mut best: Option<Split> = None;
        let mut sorted = indices.to_vec();

        for feature in candidate_features(n_features, &self.limits, rng) {
            sort_by_feature(self.x, &mut sorted, feature);
            let mut left = vec![0usize; self.n_classes];

            for k in 0..n - 1 {
                left[self.y[sorted[k]]] += 1;
                let here = self.x[sorted[k]][feature];
                let next = self.x[sorted[k + 1]][feature];
                if here == next {
                    continue;
                }

                let n_left = k + 1;
                let n_right = n - n_left;
                let right: Vec<usize> = total.iter().zip(&left).map(|(t, l)| t - l).collect();
                let impurity = (n_left as f64 * gini(&left, n_left)
                    + n_right as f64 * gini(&right, n_right))
                    / n as f64;

                if impurity < parent - 1e-12 && best.as_ref().map_or(true, |b| impurity < b.impurity) {
                    best = Some(Split {
                        feature,
                        threshold: (here + next) / 2.0,
                        impurity,
                    });
                }
            }
        }

        best
    }
}

/// Squared-error regression tree builder.
///
/// Leaf values come from a caller-supplied function of the samples that
/// reach the leaf, so boosting can plug in its Newton step.
pub struct RegressionTreeBuilder<'a> {
    x: &'a [Vec<f64>],
    targets: &'a [f64],
    limits: TreeLimits,
    nodes: Vec<Node>,
}

impl<'a> RegressionTreeBuilder<'a> {
    #[must_use]
    pub fn new(x: &'a [Vec<f64>], targets: &'a [f64], limits: TreeLimits) -> Self {
        Self {
            x,
            targets,
            limits,
            nodes: Vec::new(),
        }
    }

    pub fn fit<R, F>(mut self, indices: Vec<usize>, leaf_value: F, rng: &mut R) -> DecisionTree
    where
        R: Rng,
        F: Fn(&[usize]) -> f64,
    {
        self.grow(indices, 0, &leaf_value, rng);
        DecisionTree { nodes: self.nodes }
    }

    fn sse(&self, indices: &[usize]) -> f64 {
        if indices.is_empty() {
            return 0.0;
        }
        let mean = indices.iter().map(|&i| self.targets[i]).sum::<f64>() / indices.len() as f64;
        indices
            .iter()
            .map(|&i| (self.targets[i] - mean).powi(2))
            .sum()
    }

    fn grow<R, F>(&mut self, indices: Vec<usize>, depth: usize, leaf_value: &F, rng: &mut R) -> usize
    where
        R: Rng,
        F: Fn(&[usize]) -> f64,
    {
        let n = indices.len();
        let depth_reached = self.limits.max_depth.is_some_and(|d| depth >= d);
        let parent = self.sse(&indices);

        let split = if depth_reached || n < self.limits.min_samples_split || parent <= 1e-12 {
            None
        } else {
            self.best_split(&indices, parent, rng)
        };

        let Some(split) = split else {
            self.nodes.push(Node::Leaf {
                value: vec![leaf_value(&indices)],
            });
            return self.nodes.len() - 1;
        };

        let (left, right) = partition(self.x, &indices, &split);
        self.nodes.push(Node::Leaf { value: vec![0.0] });
        let id = self.nodes.len() - 1;
        let left_id = self.grow(left, depth + 1, leaf_value, rng);
        let right_id = self.grow(right, depth + 1, leaf_value, rng);
        self.nodes[id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: left_id,
            right: right_id,
        };
        id
    }

    fn best_split<R: Rng>(&self, indices: &[usize], parent: f64, rng: &mut R) -> Option<Split> {
        let n_features = self.x.first().map_or(0, Vec::len);
        let n = indices.len();
        let total_sum: f64 = indices.iter().map(|&i| self.targets[i]).sum();
        let total_sq: f64 = indices.iter().map(|&i| self.targets[i].powi(2)).sum();
        let mut best: Option<Split> = None;
        let mut sorted = indices.to_vec();

        for feature in candidate_features(n_features, &self.limits, rng) {
            sort_by_feature(self.x, &mut sorted, feature);
            let (mut left_sum, mut left_sq) = (0.0, 0.0);

            for k in 0..n - 1 {
                let t = self.targets[sorted[k]];
                left_sum += t;
                left_sq += t * t;
                let here = self.x[sorted[k]][feature];
                let next = self.x[sorted[k + 1]][feature];
                if here == next {
                    continue;
                }

                let n_left = (k + 1) as f64;
                let n_right = (n - k - 1) as f64;
                let right_sum = total_sum - left_sum;
                let right_sq = total_sq - left_sq;
                let sse = (left_sq - left_sum * left_sum / n_left)
                    + (right_sq - right_sum * right_sum / n_right);

                if sse < parent - 1e-12 && best.as_ref().map_or(true, |b| sse < b.impurity) {
                    best = Some(Split {
                        feature,
                        threshold: (here + next) / 2.0,
                        impurity: sse,
                    });
                }
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const ALL: TreeLimits = TreeLimits {
        max_depth: None,
        min_samples_split: 2,
        max_features: None,
    };

    #[test]
    fn test_classification_tree_separates_classes() {
        let x = vec![vec![0.0, 1.0], vec![0.0, 0.0], vec![1.0, 1.0], vec![1.0, 0.0]];
        let y = vec![0, 0, 1, 1];
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let tree = ClassificationTreeBuilder::new(&x, &y, 2, ALL).fit(vec![0, 1, 2, 3], &mut rng);

        assert_eq!(tree.leaf_value(&[0.0, 1.0]), &[1.0, 0.0]);
        assert_eq!(tree.leaf_value(&[1.0, 0.0]), &[0.0, 1.0]);
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.n_nodes(), 3);
    }

    #[test]
    fn test_pure_node_is_single_leaf() {
        let x = vec![vec![0.0], vec![1.0]];
        let y = vec![1, 1];
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let tree = ClassificationTreeBuilder::new(&x, &y, 3, ALL).fit(vec![0, 1], &mut rng);
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.leaf_value(&[0.0]), &[0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_regression_tree_with_custom_leaves() {
        let x = vec![vec![0.0], vec![0.0], vec![1.0], vec![1.0]];
        let t = vec![-1.0, -1.0, 2.0, 2.0];
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let limits = TreeLimits {
            max_depth: Some(3),
            ..ALL
        };
        let tree = RegressionTreeBuilder::new(&x, &t, limits).fit(
            vec![0, 1, 2, 3],
            |idx| idx.iter().map(|&i| t[i]).sum::<f64>() / idx.len() as f64,
            &mut rng,
        );
        assert!((tree.predict_value(&[0.0]) + 1.0).abs() < 1e-12);
        assert!((tree.predict_value(&[1.0]) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_max_depth_zero_gives_leaf() {
        let x = vec![vec![0.0], vec![1.0]];
        let y = vec![0, 1];
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let limits = TreeLimits {
            max_depth: Some(0),
            ..ALL
        };
        let tree = ClassificationTreeBuilder::new(&x, &y, 2, limits).fit(vec![0, 1], &mut rng);
        assert_eq!(tree.leaf_value(&[1.0]), &[0.5, 0.5]);
    }
}
