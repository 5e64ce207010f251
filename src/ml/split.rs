//! Seeded stratified partitioning: one train/test split and k-fold rotations.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{SeedableRng, seq::SliceRandom};

/// Row indices assigned to each side of a split, ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Split rows into train/test keeping each class's share close to `test_fraction`.
///
/// Classes are visited in label order and shuffled with a single seeded RNG, so the
/// same labels and seed always produce the same partition.
pub fn stratified_train_test_split(
    y: &[usize],
    test_fraction: f64,
    seed: u64,
) -> Result<Split, String> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(format!("Invalid test fraction {test_fraction}"));
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(y.len());
    let mut test = Vec::new();
    for (_class, mut rows) in rows_by_class(y) {
        rows.shuffle(&mut rng);
        let n = rows.len();
        let mut test_n = ((n as f64) * test_fraction).round() as usize;
        if n == 1 {
            test_n = 0;
        } else {
            test_n = test_n.clamp(1, n - 1);
        }
        test.extend_from_slice(&rows[..test_n]);
        train.extend_from_slice(&rows[test_n..]);
    }
    if train.is_empty() || test.is_empty() {
        return Err("Dataset needs both train and test samples".to_string());
    }
    train.sort_unstable();
    test.sort_unstable();
    Ok(Split { train, test })
}

/// Build `k` stratified folds; fold `i` holds out its rows as the test side.
///
/// Rows of each shuffled class are dealt round-robin across folds, continuing
/// where the previous class stopped so fold sizes differ by at most one.
pub fn stratified_k_fold(y: &[usize], k: usize, seed: u64) -> Result<Vec<Split>, String> {
    if k < 2 {
        return Err(format!("Cross-validation needs at least 2 folds, got {k}"));
    }
    if y.len() < k {
        return Err(format!(
            "Cannot build {k} folds from {} samples",
            y.len()
        ));
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut fold_of = vec![0usize; y.len()];
    let mut cursor = 0usize;
    for (_class, mut rows) in rows_by_class(y) {
        rows.shuffle(&mut rng);
        for row in rows {
            fold_of[row] = cursor % k;
            cursor += 1;
        }
    }
    let folds = (0..k)
        .map(|fold| {
            let mut split = Split {
                train: Vec::new(),
                test: Vec::new(),
            };
            for (row, &assigned) in fold_of.iter().enumerate() {
                if assigned == fold {
                    split.test.push(row);
                } else {
                    split.train.push(row);
                }
            }
            split
        })
        .collect();
    Ok(folds)
}

/// Gather the rows at `indices` into a new matrix/label pair.
pub fn take_rows(x: &[Vec<f32>], y: &[usize], indices: &[usize]) -> (Vec<Vec<f32>>, Vec<usize>) {
    let rows = indices.iter().map(|&i| x[i].clone()).collect();
    let labels = indices.iter().map(|&i| y[i]).collect();
    (rows, labels)
}

fn rows_by_class(y: &[usize]) -> BTreeMap<usize, Vec<usize>> {
    let mut by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (row, &label) in y.iter().enumerate() {
        by_class.entry(label).or_default().push(row);
    }
    by_class
}
