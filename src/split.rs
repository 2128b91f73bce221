//! Train/test partitioning utilities for bias evaluation. Splits are made at the
//! granularity of similarity clusters (assignments come from an external clusterer), so
//! near-duplicate ligands never straddle the train/test boundary. Row alignment between
//! feature and label matrices is preserved through every operation here.

use std::{
    collections::BTreeSet,
    io::{self, ErrorKind},
};

use ndarray::{Array1, Array2, Axis, concatenate};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

/// The four ligand groups of one bias evaluation, as feature matrices.
/// Field order matches the canonical quartet order used throughout.
#[derive(Clone, Debug)]
pub struct FeatureQuartet {
    pub actives_train: Array2<f64>,
    pub actives_test: Array2<f64>,
    pub inactives_train: Array2<f64>,
    pub inactives_test: Array2<f64>,
}

/// Negative-cluster split request: either one test fraction (remainder trains), or
/// explicit test and train fractions with a gap discarded between them.
#[derive(Clone, Copy, Debug)]
pub enum NegativeFraction {
    Single(f64),
    TestTrain { test: f64, train: f64 },
}

/// Partition positive and negative cluster-id lists into test and train selections.
/// Shuffling (seeded, reproducible) makes the selection random over clusters; at least
/// one positive cluster always lands in test.
pub fn split_clusters(
    pos_labels: &[usize],
    neg_labels: &[usize],
    pos_test_fraction: f64,
    neg_fraction: NegativeFraction,
    shuffle: bool,
    seed: u64,
) -> io::Result<(Vec<usize>, Vec<usize>)> {
    if pos_labels.is_empty() {
        return Err(io::Error::new(
            ErrorKind::InvalidInput,
            "No positive clusters to split",
        ));
    }
    if let NegativeFraction::TestTrain { test, train } = neg_fraction
        && test + train > 1.
    {
        return Err(io::Error::new(
            ErrorKind::InvalidInput,
            "Sum of test and train proportions must not exceed 1",
        ));
    }

    let mut pos = pos_labels.to_vec();
    let mut neg = neg_labels.to_vec();
    if shuffle {
        let mut rng = StdRng::seed_from_u64(seed);
        pos.shuffle(&mut rng);
        neg.shuffle(&mut rng);
    }

    let n_pos_test = ((pos.len() as f64 * pos_test_fraction).round() as usize)
        .max(1)
        .min(pos.len());
    let (test_pos, train_pos) = pos.split_at(n_pos_test);

    let (test_neg, train_neg): (&[usize], &[usize]) = match neg_fraction {
        NegativeFraction::Single(f) => {
            let n_test = ((neg.len() as f64 * f) as usize).min(neg.len());
            (&neg[..n_test], &neg[n_test..])
        }
        NegativeFraction::TestTrain { test, train } => {
            let n_test = ((neg.len() as f64 * test).round() as usize).min(neg.len());
            let n_train = ((neg.len() as f64 * train).round() as usize).min(neg.len() - n_test);
            (&neg[..n_test], &neg[neg.len() - n_train..])
        }
    };

    let test = test_pos.iter().chain(test_neg).copied().collect();
    let train = train_pos.iter().chain(train_neg).copied().collect();
    Ok((test, train))
}

/// Pick a holdout subset of cluster ids. Returns (test ids, train ids); the two are
/// disjoint and together cover every distinct id in `assignments`.
pub fn holdout_clusters(
    assignments: &[usize],
    holdout_fraction: f64,
    seed: u64,
) -> io::Result<(Vec<usize>, Vec<usize>)> {
    if !(0. ..=1.).contains(&holdout_fraction) {
        return Err(io::Error::new(
            ErrorKind::InvalidInput,
            format!("Holdout fraction {holdout_fraction} outside [0, 1]"),
        ));
    }

    let unique: BTreeSet<usize> = assignments.iter().copied().collect();
    let mut ids: Vec<usize> = unique.into_iter().collect();

    let mut rng = StdRng::seed_from_u64(seed);
    ids.shuffle(&mut rng);

    let n_test = (ids.len() as f64 * holdout_fraction) as usize;
    let test = ids[..n_test].to_vec();
    let train = ids[n_test..].to_vec();
    Ok((test, train))
}

/// Cluster-granular holdout split of row-aligned X and Y.
/// Returns (x_train, x_test, y_train, y_test).
pub fn cluster_split(
    x: &Array2<f64>,
    y: &Array2<f64>,
    assignments: &[usize],
    holdout_fraction: f64,
    seed: u64,
) -> io::Result<(Array2<f64>, Array2<f64>, Array2<f64>, Array2<f64>)> {
    check_row_alignment(x, y, assignments)?;

    let (test_ids, _) = holdout_clusters(assignments, holdout_fraction, seed)?;
    let test_set: BTreeSet<usize> = test_ids.into_iter().collect();

    let mut train_rows = Vec::new();
    let mut test_rows = Vec::new();
    for (r, id) in assignments.iter().enumerate() {
        if test_set.contains(id) {
            test_rows.push(r);
        } else {
            train_rows.push(r);
        }
    }

    Ok((
        x.select(Axis(0), &train_rows),
        x.select(Axis(0), &test_rows),
        y.select(Axis(0), &train_rows),
        y.select(Axis(0), &test_rows),
    ))
}

/// Build the active/inactive × train/test quartet for one target column. Rows whose
/// cluster is in neither list are left out entirely.
pub fn four_matrices(
    x: &Array2<f64>,
    y: &Array2<f64>,
    assignments: &[usize],
    test_clusters: &[usize],
    train_clusters: &[usize],
    target_col: usize,
) -> io::Result<FeatureQuartet> {
    check_row_alignment(x, y, assignments)?;
    if target_col >= y.ncols() {
        return Err(io::Error::new(
            ErrorKind::InvalidInput,
            format!(
                "Target column {target_col} out of bounds for {} label columns",
                y.ncols()
            ),
        ));
    }

    let test_set: BTreeSet<usize> = test_clusters.iter().copied().collect();
    let train_set: BTreeSet<usize> = train_clusters.iter().copied().collect();

    let mut a_train = Vec::new();
    let mut a_test = Vec::new();
    let mut i_train = Vec::new();
    let mut i_test = Vec::new();

    for (r, id) in assignments.iter().enumerate() {
        let active = y[[r, target_col]] != 0.;
        let group = if test_set.contains(id) {
            if active { &mut a_test } else { &mut i_test }
        } else if train_set.contains(id) {
            if active { &mut a_train } else { &mut i_train }
        } else {
            continue;
        };
        group.push(r);
    }

    Ok(FeatureQuartet {
        actives_train: x.select(Axis(0), &a_train),
        actives_test: x.select(Axis(0), &a_test),
        inactives_train: x.select(Axis(0), &i_train),
        inactives_test: x.select(Axis(0), &i_test),
    })
}

/// Merge the quartet into classifier-style (x_train, x_test, y_train, y_test): actives
/// stacked above inactives, labels synthesized 1/0 to match.
pub fn merge_feature_matrices(
    q: &FeatureQuartet,
) -> io::Result<(Array2<f64>, Array2<f64>, Array1<f64>, Array1<f64>)> {
    let x_train = concatenate(
        Axis(0),
        &[q.actives_train.view(), q.inactives_train.view()],
    )
    .map_err(|e| io::Error::new(ErrorKind::InvalidInput, e.to_string()))?;
    let x_test = concatenate(Axis(0), &[q.actives_test.view(), q.inactives_test.view()])
        .map_err(|e| io::Error::new(ErrorKind::InvalidInput, e.to_string()))?;

    let mut y_train = Array1::zeros(x_train.nrows());
    y_train
        .slice_mut(ndarray::s![..q.actives_train.nrows()])
        .fill(1.);
    let mut y_test = Array1::zeros(x_test.nrows());
    y_test
        .slice_mut(ndarray::s![..q.actives_test.nrows()])
        .fill(1.);

    Ok((x_train, x_test, y_train, y_test))
}

/// Exact inverse of `merge_feature_matrices`: pulls the four groups back out of merged
/// matrices by their 1/0 labels, preserving row order within each group.
pub fn split_feature_matrices(
    x_train: &Array2<f64>,
    x_test: &Array2<f64>,
    y_train: &Array1<f64>,
    y_test: &Array1<f64>,
) -> io::Result<FeatureQuartet> {
    if x_train.nrows() != y_train.len() || x_test.nrows() != y_test.len() {
        return Err(io::Error::new(
            ErrorKind::InvalidInput,
            "Label vectors do not align with matrix rows",
        ));
    }

    let pick = |x: &Array2<f64>, y: &Array1<f64>, active: bool| {
        let rows: Vec<usize> = y
            .iter()
            .enumerate()
            .filter(|&(_, &v)| (v == 1.) == active)
            .map(|(r, _)| r)
            .collect();
        x.select(Axis(0), &rows)
    };

    Ok(FeatureQuartet {
        actives_train: pick(x_train, y_train, true),
        actives_test: pick(x_test, y_test, true),
        inactives_train: pick(x_train, y_train, false),
        inactives_test: pick(x_test, y_test, false),
    })
}

/// Restrict Y to the given label columns and drop ligands with no positive among them.
/// X rows are dropped in lockstep.
pub fn subset_targets(
    x: &Array2<f64>,
    y: &Array2<f64>,
    cols: &[usize],
) -> io::Result<(Array2<f64>, Array2<f64>)> {
    if x.nrows() != y.nrows() {
        return Err(io::Error::new(
            ErrorKind::InvalidInput,
            "X and Y row counts differ",
        ));
    }
    for &c in cols {
        if c >= y.ncols() {
            return Err(io::Error::new(
                ErrorKind::InvalidInput,
                format!("Label column {c} out of bounds for {} columns", y.ncols()),
            ));
        }
    }

    let y_sub = y.select(Axis(1), cols);
    let keep: Vec<usize> = y_sub
        .rows()
        .into_iter()
        .enumerate()
        .filter(|(_, row)| row.sum() > 0.)
        .map(|(r, _)| r)
        .collect();

    if keep.is_empty() {
        return Err(io::Error::new(
            ErrorKind::InvalidInput,
            "Selected label columns leave no ligand with a positive label",
        ));
    }

    Ok((x.select(Axis(0), &keep), y_sub.select(Axis(0), &keep)))
}

/// Drop the `fraction` of training ligands nearest to the test set. `dmat` rows are test
/// ligands, columns are candidate ligands indexable by `train_indices`. Returns the kept
/// indices, farthest-last order preserved from the distance ranking.
pub fn trim_train_actives(
    dmat: &Array2<f64>,
    train_indices: &[usize],
    fraction: f64,
) -> io::Result<Vec<usize>> {
    if !(0. ..=1.).contains(&fraction) {
        return Err(io::Error::new(
            ErrorKind::InvalidInput,
            format!("Trim fraction {fraction} outside [0, 1]"),
        ));
    }
    if dmat.nrows() == 0 {
        return Err(io::Error::new(
            ErrorKind::InvalidInput,
            "Empty distance matrix",
        ));
    }
    for &t in train_indices {
        if t >= dmat.ncols() {
            return Err(io::Error::new(
                ErrorKind::InvalidInput,
                format!("Train index {t} out of bounds for {} columns", dmat.ncols()),
            ));
        }
    }

    let n_trim = (train_indices.len() as f64 * fraction) as usize;

    // Nearest test-set distance per training ligand, then rank ascending.
    let mut ranked: Vec<(usize, f64)> = train_indices
        .iter()
        .map(|&t| {
            let min = dmat.column(t).iter().copied().fold(f64::INFINITY, f64::min);
            (t, min)
        })
        .collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));

    Ok(ranked.into_iter().skip(n_trim).map(|(t, _)| t).collect())
}

fn check_row_alignment(x: &Array2<f64>, y: &Array2<f64>, assignments: &[usize]) -> io::Result<()> {
    if x.nrows() != y.nrows() || x.nrows() != assignments.len() {
        return Err(io::Error::new(
            ErrorKind::InvalidInput,
            format!(
                "Row misalignment: X has {}, Y has {}, assignments have {}",
                x.nrows(),
                y.nrows(),
                assignments.len()
            ),
        ));
    }
    Ok(())
}
