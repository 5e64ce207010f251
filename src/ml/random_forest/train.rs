use rand::rngs::StdRng;
use rand::{Rng, SeedableRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::model::{DecisionTree, RandomForestModel, TreeNode};

/// Errors raised while fitting a forest.
#[derive(Debug, Error)]
pub enum TrainError {
    #[error("Mismatched X/Y lengths ({rows} rows, {labels} labels)")]
    MismatchedLengths { rows: usize, labels: usize },
    #[error("Empty dataset")]
    EmptyDataset,
    #[error("Need at least 2 classes, got {0}")]
    TooFewClasses(usize),
    #[error("Row {row} has {found} features but expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("Row {row} has label {label} outside the {n_classes} known classes")]
    UnknownLabel {
        row: usize,
        label: usize,
        n_classes: usize,
    },
    #[error("Invalid forest options: {0}")]
    InvalidOptions(String),
    #[error("Invalid split: {0}")]
    Split(String),
    #[error("Tree worker thread panicked")]
    WorkerPanicked,
}

/// Number of candidate features drawn at each node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    Sqrt,
    Log2,
    All,
}

impl MaxFeatures {
    /// Resolve against the feature width, never below one.
    pub fn resolve(self, n_features: usize) -> usize {
        let n = n_features.max(1);
        let k = match self {
            MaxFeatures::Sqrt => (n as f64).sqrt().floor() as usize,
            MaxFeatures::Log2 => (n as f64).log2().floor() as usize,
            MaxFeatures::All => n,
        };
        k.clamp(1, n)
    }
}

/// Forest hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestOptions {
    /// Number of trees in the ensemble.
    pub n_trees: usize,
    /// Maximum tree depth; the root sits at depth 0.
    pub max_depth: usize,
    /// Minimum distinct samples a node needs before it may split.
    pub min_samples_split: usize,
    /// Minimum distinct samples on each side of a split.
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    /// Weight classes by `n / (n_classes * count)` to offset imbalance.
    pub balanced_class_weight: bool,
    /// Draw a bootstrap sample per tree.
    pub bootstrap: bool,
    pub seed: u64,
    /// Worker threads; `None` uses every available core.
    pub threads: Option<usize>,
}

impl Default for ForestOptions {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 5,
            min_samples_leaf: 2,
            max_features: MaxFeatures::Sqrt,
            balanced_class_weight: true,
            bootstrap: true,
            seed: 42,
            threads: None,
        }
    }
}

/// In-memory dataset used for training and evaluation.
#[derive(Debug, Clone)]
pub struct TrainDataset {
    /// Ordered list of class identifiers.
    pub classes: Vec<String>,
    /// Feature matrix, row-major.
    pub x: Vec<Vec<f32>>,
    /// Class indices aligned with `x`.
    pub y: Vec<usize>,
}

impl TrainDataset {
    fn validate(&self) -> Result<usize, TrainError> {
        if self.x.len() != self.y.len() {
            return Err(TrainError::MismatchedLengths {
                rows: self.x.len(),
                labels: self.y.len(),
            });
        }
        if self.x.is_empty() {
            return Err(TrainError::EmptyDataset);
        }
        let n_classes = self.classes.len();
        if n_classes < 2 {
            return Err(TrainError::TooFewClasses(n_classes));
        }
        let width = self.x[0].len();
        for (row, (features, &label)) in self.x.iter().zip(&self.y).enumerate() {
            if features.len() != width {
                return Err(TrainError::RaggedRow {
                    row,
                    found: features.len(),
                    expected: width,
                });
            }
            if label >= n_classes {
                return Err(TrainError::UnknownLabel {
                    row,
                    label,
                    n_classes,
                });
            }
        }
        Ok(width)
    }
}

/// Fit a random forest of Gini CART trees.
///
/// Per-tree seeds are drawn from `options.seed` before any tree is grown, so the
/// fitted model does not depend on the number of worker threads.
pub fn train_random_forest(
    dataset: &TrainDataset,
    options: &ForestOptions,
) -> Result<RandomForestModel, TrainError> {
    let n_features = dataset.validate()?;
    if options.n_trees == 0 {
        return Err(TrainError::InvalidOptions("n_trees must be > 0".to_string()));
    }
    let n_classes = dataset.classes.len();
    let class_weights = class_weights(&dataset.y, n_classes, options.balanced_class_weight);

    let mut rng = StdRng::seed_from_u64(options.seed);
    let tree_seeds: Vec<u64> = (0..options.n_trees).map(|_| rng.random()).collect();

    let worker_count = options
        .threads
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
        .min(options.n_trees)
        .max(1);

    let grower = TreeGrower {
        x: &dataset.x,
        y: &dataset.y,
        n_classes,
        n_features,
        class_weights: &class_weights,
        options,
    };

    let mut slots: Vec<Option<DecisionTree>> = vec![None; options.n_trees];
    std::thread::scope(|scope| -> Result<(), TrainError> {
        let grower = &grower;
        let tree_seeds = &tree_seeds;
        let handles: Vec<_> = (0..worker_count)
            .map(|worker| {
                scope.spawn(move || {
                    (worker..tree_seeds.len())
                        .step_by(worker_count)
                        .map(|tree_idx| (tree_idx, grower.grow(tree_seeds[tree_idx])))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        for handle in handles {
            let grown = handle.join().map_err(|_| TrainError::WorkerPanicked)?;
            for (tree_idx, tree) in grown {
                slots[tree_idx] = Some(tree);
            }
        }
        Ok(())
    })?;

    let trees = slots
        .into_iter()
        .map(|slot| slot.ok_or(TrainError::WorkerPanicked))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RandomForestModel {
        model_version: 1,
        n_features,
        n_classes,
        trees,
    })
}

fn class_weights(y: &[usize], n_classes: usize, balanced: bool) -> Vec<f64> {
    if !balanced {
        return vec![1.0; n_classes];
    }
    let mut counts = vec![0f64; n_classes];
    for &label in y {
        if label < n_classes {
            counts[label] += 1.0;
        }
    }
    let total: f64 = counts.iter().sum();
    counts
        .into_iter()
        .map(|count| {
            if count == 0.0 {
                0.0
            } else {
                total / (n_classes as f64 * count)
            }
        })
        .collect()
}

struct TreeGrower<'a> {
    x: &'a [Vec<f32>],
    y: &'a [usize],
    n_classes: usize,
    n_features: usize,
    class_weights: &'a [f64],
    options: &'a ForestOptions,
}

struct NodeStats {
    dist: Vec<f64>,
    weight: f64,
    impurity: f64,
}

#[derive(Debug, Clone)]
struct BestSplit {
    children_impurity: f64,
    feature: usize,
    threshold: f32,
}

impl TreeGrower<'_> {
    fn grow(&self, seed: u64) -> DecisionTree {
        let mut rng = StdRng::seed_from_u64(seed);
        let n = self.x.len();
        let mut draws = vec![0u32; n];
        if self.options.bootstrap {
            for _ in 0..n {
                draws[rng.random_range(0..n)] += 1;
            }
        } else {
            draws.fill(1);
        }
        let sample_weight: Vec<f64> = draws
            .iter()
            .zip(self.y)
            .map(|(&count, &label)| count as f64 * self.class_weights[label])
            .collect();
        let samples: Vec<usize> = (0..n).filter(|&i| draws[i] > 0).collect();

        let mut nodes = Vec::new();
        self.grow_node(&mut nodes, samples, 0, &sample_weight, &mut rng);
        DecisionTree { nodes }
    }

    fn grow_node(
        &self,
        nodes: &mut Vec<TreeNode>,
        samples: Vec<usize>,
        depth: usize,
        sample_weight: &[f64],
        rng: &mut StdRng,
    ) -> u32 {
        let stats = self.node_stats(&samples, sample_weight);
        let idx = nodes.len();
        nodes.push(leaf_node(&stats));

        let min_leaf = self.options.min_samples_leaf.max(1);
        let can_split = depth < self.options.max_depth
            && samples.len() >= self.options.min_samples_split.max(2)
            && samples.len() >= 2 * min_leaf
            && stats.impurity > 1e-12;
        if !can_split {
            return idx as u32;
        }
        let Some(best) = self.best_split(&samples, sample_weight, &stats, rng) else {
            return idx as u32;
        };
        if stats.weight * stats.impurity - best.children_impurity <= 1e-12 {
            return idx as u32;
        }

        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&s| self.x[s][best.feature] <= best.threshold);
        let left_idx = self.grow_node(nodes, left, depth + 1, sample_weight, rng);
        let right_idx = self.grow_node(nodes, right, depth + 1, sample_weight, rng);
        nodes[idx] = TreeNode::Split {
            feature: best.feature as u16,
            threshold: best.threshold,
            left: left_idx,
            right: right_idx,
            impurity: stats.impurity,
            weight: stats.weight,
        };
        idx as u32
    }

    fn node_stats(&self, samples: &[usize], sample_weight: &[f64]) -> NodeStats {
        let mut dist = vec![0.0f64; self.n_classes];
        for &s in samples {
            dist[self.y[s]] += sample_weight[s];
        }
        let weight: f64 = dist.iter().sum();
        NodeStats {
            impurity: gini(&dist, weight),
            dist,
            weight,
        }
    }

    /// Search a random subset of features for the split with the lowest weighted
    /// child impurity. Features constant within the node do not count toward the
    /// subset size.
    fn best_split(
        &self,
        samples: &[usize],
        sample_weight: &[f64],
        stats: &NodeStats,
        rng: &mut StdRng,
    ) -> Option<BestSplit> {
        let max_features = self.options.max_features.resolve(self.n_features);
        let min_leaf = self.options.min_samples_leaf.max(1);
        let mut features: Vec<usize> = (0..self.n_features).collect();
        features.shuffle(rng);

        let mut best: Option<BestSplit> = None;
        let mut visited = 0usize;
        let mut order: Vec<(f32, usize)> = Vec::with_capacity(samples.len());
        for feature in features {
            if visited >= max_features {
                break;
            }
            order.clear();
            order.extend(samples.iter().map(|&s| (self.x[s][feature], s)));
            order.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            let (Some(first), Some(last)) = (order.first(), order.last()) else {
                continue;
            };
            if first.0 == last.0 {
                continue;
            }
            visited += 1;

            let mut left = vec![0.0f64; self.n_classes];
            let mut left_weight = 0.0f64;
            for pos in 0..order.len() - 1 {
                let (value, s) = order[pos];
                let w = sample_weight[s];
                left[self.y[s]] += w;
                left_weight += w;
                let next_value = order[pos + 1].0;
                if value == next_value {
                    continue;
                }
                let left_count = pos + 1;
                let right_count = order.len() - left_count;
                if left_count < min_leaf || right_count < min_leaf {
                    continue;
                }
                let right: Vec<f64> = stats
                    .dist
                    .iter()
                    .zip(&left)
                    .map(|(total, l)| total - l)
                    .collect();
                let right_weight = stats.weight - left_weight;
                let children = left_weight * gini(&left, left_weight)
                    + right_weight * gini(&right, right_weight);
                let better = best
                    .as_ref()
                    .is_none_or(|current| children < current.children_impurity);
                if better {
                    best = Some(BestSplit {
                        children_impurity: children,
                        feature,
                        threshold: midpoint(value, next_value),
                    });
                }
            }
        }
        best
    }
}

fn leaf_node(stats: &NodeStats) -> TreeNode {
    let value = if stats.weight > 0.0 {
        stats
            .dist
            .iter()
            .map(|w| (w / stats.weight) as f32)
            .collect()
    } else {
        vec![1.0 / stats.dist.len().max(1) as f32; stats.dist.len()]
    };
    TreeNode::Leaf {
        value,
        impurity: stats.impurity,
        weight: stats.weight,
    }
}

fn gini(dist: &[f64], total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    let sum_sq: f64 = dist.iter().map(|w| (w / total) * (w / total)).sum();
    (1.0 - sum_sq).max(0.0)
}

/// Threshold halfway between two sorted values, falling back to the lower value
/// when rounding would push the midpoint onto the upper one.
fn midpoint(low: f32, high: f32) -> f32 {
    let mid = low + (high - low) / 2.0;
    if mid >= high { low } else { mid }
}
