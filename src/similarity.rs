//! Pairwise set-similarity distances between groups of fingerprint rows. Rows are
//! binarized (nonzero → 1) and intersections come from one matrix multiplication rather
//! than a pairwise loop. Past a row-count threshold the engine stops materializing the
//! full m×n matrix and answers nearest-neighbor queries from a bit-packed index instead;
//! the bias estimators only consume per-row nearest distances, so both code paths feed
//! them the same statistics.

use std::io::{self, ErrorKind};

use ndarray::{Array1, Array2, Axis};

use crate::split::FeatureQuartet;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DistanceMetric {
    /// 1 − |A∩B| / |A∪B|
    Jaccard,
    /// 1 − 2|A∩B| / (|A| + |B|)
    Dice,
}

impl DistanceMetric {
    fn distance(self, intersection: f64, card_a: f64, card_b: f64) -> f64 {
        match self {
            Self::Jaccard => {
                let union = card_a + card_b - intersection;
                if union == 0. {
                    0. // both rows empty: identical sets by convention
                } else {
                    1. - intersection / union
                }
            }
            Self::Dice => {
                let denom = card_a + card_b;
                if denom == 0. {
                    0.
                } else {
                    1. - 2. * intersection / denom
                }
            }
        }
    }
}

/// Full m×n Jaccard distance matrix between the rows of `x` and `y` (`x` against itself
/// when `y` is `None` — symmetric with zero diagonal).
pub fn jaccard_distance_matrix(
    x: &Array2<f64>,
    y: Option<&Array2<f64>>,
) -> io::Result<Array2<f64>> {
    binary_distance_matrix(x, y, DistanceMetric::Jaccard)
}

/// Full m×n Dice distance matrix; see `jaccard_distance_matrix`.
pub fn dice_distance_matrix(x: &Array2<f64>, y: Option<&Array2<f64>>) -> io::Result<Array2<f64>> {
    binary_distance_matrix(x, y, DistanceMetric::Dice)
}

fn binary_distance_matrix(
    x: &Array2<f64>,
    y: Option<&Array2<f64>>,
    metric: DistanceMetric,
) -> io::Result<Array2<f64>> {
    let xb = binarize(x);
    let yb = match y {
        Some(m) => {
            if m.ncols() != x.ncols() {
                return Err(io::Error::new(
                    ErrorKind::InvalidInput,
                    format!("Feature widths differ: {} vs {}", x.ncols(), m.ncols()),
                ));
            }
            binarize(m)
        }
        None => xb.clone(),
    };

    let intersection = xb.dot(&yb.t());
    let x_card = xb.sum_axis(Axis(1));
    let y_card = yb.sum_axis(Axis(1));

    Ok(Array2::from_shape_fn(
        (xb.nrows(), yb.nrows()),
        |(i, j)| metric.distance(intersection[[i, j]], x_card[i], y_card[j]),
    ))
}

fn binarize(m: &Array2<f64>) -> Array2<f64> {
    m.mapv(|v| if v != 0. { 1. } else { 0. })
}

/// How to relate a test group to a train group, chosen purely from the two row counts.
/// Call sites must not re-derive this decision inline.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PairwiseStrategy {
    /// Materialize the full distance matrix.
    Exact,
    /// Build a bit-packed index over the train rows and query nearest distances only.
    NearestNeighbor,
}

/// Row count beyond which a dense m×n matrix stops being reasonable to hold in memory.
pub const INDEX_ROW_THRESHOLD: usize = 15_000;

impl PairwiseStrategy {
    pub fn select(n_test_rows: usize, n_train_rows: usize) -> Self {
        if n_test_rows.max(n_train_rows) > INDEX_ROW_THRESHOLD {
            Self::NearestNeighbor
        } else {
            Self::Exact
        }
    }
}

/// Nearest-neighbor index over binarized rows: 64 features per machine word, popcount
/// intersections. Memory is O(rows · features/64) — no pairwise matrix is ever held.
pub struct NeighborIndex {
    metric: DistanceMetric,
    n_features: usize,
    n_words: usize,
    /// Concatenated bit rows, `n_words` words each.
    words: Vec<u64>,
    cardinalities: Vec<u32>,
}

impl NeighborIndex {
    pub fn build(rows: &Array2<f64>, metric: DistanceMetric) -> Self {
        let n_features = rows.ncols();
        let n_words = n_features.div_ceil(64);
        let mut words = vec![0u64; rows.nrows() * n_words];
        let mut cardinalities = Vec::with_capacity(rows.nrows());

        for (r, row) in rows.rows().into_iter().enumerate() {
            let base = r * n_words;
            let mut card = 0u32;
            for (c, &v) in row.iter().enumerate() {
                if v != 0. {
                    words[base + c / 64] |= 1 << (c % 64);
                    card += 1;
                }
            }
            cardinalities.push(card);
        }

        Self {
            metric,
            n_features,
            n_words,
            words,
            cardinalities,
        }
    }

    pub fn n_rows(&self) -> usize {
        self.cardinalities.len()
    }

    /// Distance to the nearest indexed row, for each query row.
    pub fn nearest_distances(&self, queries: &Array2<f64>) -> io::Result<Array1<f64>> {
        if self.n_rows() == 0 {
            return Err(io::Error::new(
                ErrorKind::InvalidInput,
                "Nearest-neighbor query against an empty index",
            ));
        }
        if queries.ncols() != self.n_features {
            return Err(io::Error::new(
                ErrorKind::InvalidInput,
                format!(
                    "Feature widths differ: index {} vs query {}",
                    self.n_features,
                    queries.ncols()
                ),
            ));
        }

        let mut out = Array1::zeros(queries.nrows());
        let mut q_words = vec![0u64; self.n_words];

        for (qi, row) in queries.rows().into_iter().enumerate() {
            q_words.fill(0);
            let mut q_card = 0u32;
            for (c, &v) in row.iter().enumerate() {
                if v != 0. {
                    q_words[c / 64] |= 1 << (c % 64);
                    q_card += 1;
                }
            }

            let mut best = f64::INFINITY;
            for r in 0..self.n_rows() {
                let base = r * self.n_words;
                let inter: u32 = self.words[base..base + self.n_words]
                    .iter()
                    .zip(&q_words)
                    .map(|(a, b)| (a & b).count_ones())
                    .sum();
                let d = self.metric.distance(
                    inter as f64,
                    q_card as f64,
                    self.cardinalities[r] as f64,
                );
                if d < best {
                    best = d;
                }
            }
            out[qi] = best;
        }

        Ok(out)
    }
}

/// One test↔train relation: either the full distance matrix, or only each test row's
/// nearest train distance (what the over-threshold path produces).
#[derive(Clone, Debug)]
pub enum DistanceData {
    Full(Array2<f64>),
    NearestOnly(Array1<f64>),
}

impl DistanceData {
    pub fn n_test_rows(&self) -> usize {
        match self {
            Self::Full(m) => m.nrows(),
            Self::NearestOnly(v) => v.len(),
        }
    }

    /// Nearest train distance per test row. This is the only statistic the bias
    /// estimators need, which is what makes the two representations interchangeable.
    pub fn row_minima(&self) -> io::Result<Array1<f64>> {
        match self {
            Self::Full(m) => {
                if m.nrows() == 0 || m.ncols() == 0 {
                    return Err(io::Error::new(
                        ErrorKind::InvalidInput,
                        "Distance matrix with an empty side",
                    ));
                }
                Ok(Array1::from_iter(m.rows().into_iter().map(|row| {
                    row.iter().copied().fold(f64::INFINITY, f64::min)
                })))
            }
            Self::NearestOnly(v) => {
                if v.is_empty() {
                    return Err(io::Error::new(
                        ErrorKind::InvalidInput,
                        "Empty nearest-distance vector",
                    ));
                }
                Ok(v.clone())
            }
        }
    }
}

/// The four test↔train relations of one bias evaluation, in canonical order.
#[derive(Clone, Debug)]
pub struct DistanceQuartet {
    pub a_test_a_train: DistanceData,
    pub a_test_i_train: DistanceData,
    pub i_test_i_train: DistanceData,
    pub i_test_a_train: DistanceData,
}

/// Distances between each test group and each train group of the quartet, with the
/// exact/indexed strategy chosen from the group sizes.
pub fn distance_quartet(q: &FeatureQuartet, metric: DistanceMetric) -> io::Result<DistanceQuartet> {
    let n_test = q.actives_test.nrows().max(q.inactives_test.nrows());
    let n_train = q.actives_train.nrows().max(q.inactives_train.nrows());
    distance_quartet_with(q, metric, PairwiseStrategy::select(n_test, n_train))
}

/// As `distance_quartet`, with the strategy forced. Both strategies yield identical
/// downstream AVE/VE statistics; tests rely on that equivalence.
pub fn distance_quartet_with(
    q: &FeatureQuartet,
    metric: DistanceMetric,
    strategy: PairwiseStrategy,
) -> io::Result<DistanceQuartet> {
    for (name, m) in [
        ("actives_train", &q.actives_train),
        ("actives_test", &q.actives_test),
        ("inactives_train", &q.inactives_train),
        ("inactives_test", &q.inactives_test),
    ] {
        if m.nrows() == 0 {
            return Err(io::Error::new(
                ErrorKind::InvalidInput,
                format!("Empty ligand group: {name}"),
            ));
        }
    }

    match strategy {
        PairwiseStrategy::Exact => Ok(DistanceQuartet {
            a_test_a_train: DistanceData::Full(binary_distance_matrix(
                &q.actives_test,
                Some(&q.actives_train),
                metric,
            )?),
            a_test_i_train: DistanceData::Full(binary_distance_matrix(
                &q.actives_test,
                Some(&q.inactives_train),
                metric,
            )?),
            i_test_i_train: DistanceData::Full(binary_distance_matrix(
                &q.inactives_test,
                Some(&q.inactives_train),
                metric,
            )?),
            i_test_a_train: DistanceData::Full(binary_distance_matrix(
                &q.inactives_test,
                Some(&q.actives_train),
                metric,
            )?),
        }),
        PairwiseStrategy::NearestNeighbor => {
            let a_train_index = NeighborIndex::build(&q.actives_train, metric);
            let i_train_index = NeighborIndex::build(&q.inactives_train, metric);

            Ok(DistanceQuartet {
                a_test_a_train: DistanceData::NearestOnly(
                    a_train_index.nearest_distances(&q.actives_test)?,
                ),
                a_test_i_train: DistanceData::NearestOnly(
                    i_train_index.nearest_distances(&q.actives_test)?,
                ),
                i_test_i_train: DistanceData::NearestOnly(
                    i_train_index.nearest_distances(&q.inactives_test)?,
                ),
                i_test_a_train: DistanceData::NearestOnly(
                    a_train_index.nearest_distances(&q.inactives_test)?,
                ),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn features() -> Array2<f64> {
        array![
            [1., 1., 0., 0., 2.],
            [1., 0., 0., 0., 2.],
            [0., 0., 1., 1., 0.],
            [1., 1., 0., 0., 2.],
        ]
    }

    #[test]
    fn jaccard_known_values() {
        let x = features();
        let d = jaccard_distance_matrix(&x, None).unwrap();
        // Rows 0 and 1: intersection 2 (cols 0, 4), union 3.
        assert!((d[[0, 1]] - (1. - 2. / 3.)).abs() < 1e-12);
        // Rows 0 and 2 share nothing.
        assert_eq!(d[[0, 2]], 1.);
        // Rows 0 and 3 are identical after binarization.
        assert_eq!(d[[0, 3]], 0.);
    }

    #[test]
    fn dice_known_values() {
        let x = features();
        let d = dice_distance_matrix(&x, None).unwrap();
        // Rows 0 and 1: 1 - 2·2/(3+2) = 0.2
        assert!((d[[0, 1]] - 0.2).abs() < 1e-12);
        assert_eq!(d[[0, 2]], 1.);
    }

    #[test]
    fn self_distance_symmetric_zero_diagonal() {
        let x = features();
        for metric_matrix in [
            jaccard_distance_matrix(&x, None).unwrap(),
            dice_distance_matrix(&x, None).unwrap(),
        ] {
            for i in 0..x.nrows() {
                assert_eq!(metric_matrix[[i, i]], 0.);
                for j in 0..x.nrows() {
                    assert!((metric_matrix[[i, j]] - metric_matrix[[j, i]]).abs() < 1e-12);
                }
            }
        }
    }

    #[test]
    fn rectangular_and_width_checked() {
        let x = features();
        let y = array![[1., 0., 0., 0., 0.], [0., 0., 0., 0., 0.]];
        let d = jaccard_distance_matrix(&x, Some(&y)).unwrap();
        assert_eq!(d.dim(), (4, 2));
        // Empty y-row against nonempty x-row: nothing shared → distance 1.
        assert_eq!(d[[0, 1]], 1.);

        let bad = array![[1., 0.]];
        assert!(jaccard_distance_matrix(&x, Some(&bad)).is_err());
    }

    #[test]
    fn empty_vs_empty_rows() {
        let x = array![[0., 0., 0.]];
        let d = jaccard_distance_matrix(&x, None).unwrap();
        assert_eq!(d[[0, 0]], 0.); // identical empty sets, not NaN
    }

    #[test]
    fn strategy_threshold() {
        assert_eq!(PairwiseStrategy::select(10, 10), PairwiseStrategy::Exact);
        assert_eq!(
            PairwiseStrategy::select(15_000, 200),
            PairwiseStrategy::Exact
        );
        assert_eq!(
            PairwiseStrategy::select(200, 15_001),
            PairwiseStrategy::NearestNeighbor
        );
    }

    #[test]
    fn index_matches_full_matrix_minima() {
        let train = features();
        let queries = array![[1., 0., 1., 0., 2.], [0., 1., 1., 1., 0.]];

        for metric in [DistanceMetric::Jaccard, DistanceMetric::Dice] {
            let full = binary_distance_matrix(&queries, Some(&train), metric).unwrap();
            let expected = DistanceData::Full(full).row_minima().unwrap();

            let index = NeighborIndex::build(&train, metric);
            let got = index.nearest_distances(&queries).unwrap();

            for (a, b) in expected.iter().zip(got.iter()) {
                assert!((a - b).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn index_wide_rows() {
        // More than 64 features exercises the multi-word packing.
        let mut train = Array2::zeros((3, 150));
        let mut queries = Array2::zeros((2, 150));
        for c in 0..150 {
            train[[0, c]] = (c % 2) as f64;
            train[[1, c]] = (c % 3 == 0) as u8 as f64;
            train[[2, c]] = 1.;
            queries[[0, c]] = (c % 2) as f64;
            queries[[1, c]] = (c % 5 == 0) as u8 as f64;
        }

        let full = binary_distance_matrix(&queries, Some(&train), DistanceMetric::Jaccard).unwrap();
        let expected = DistanceData::Full(full).row_minima().unwrap();
        let index = NeighborIndex::build(&train, DistanceMetric::Jaccard);
        let got = index.nearest_distances(&queries).unwrap();
        for (a, b) in expected.iter().zip(got.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn quartet_rejects_empty_group() {
        let q = FeatureQuartet {
            actives_train: Array2::zeros((0, 5)),
            actives_test: features(),
            inactives_train: features(),
            inactives_test: features(),
        };
        assert!(distance_quartet(&q, DistanceMetric::Jaccard).is_err());
    }

    #[test]
    fn empty_index_query_rejected() {
        let index = NeighborIndex::build(&Array2::zeros((0, 5)), DistanceMetric::Jaccard);
        assert!(index.nearest_distances(&features()).is_err());
    }
}
