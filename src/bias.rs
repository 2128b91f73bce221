//! AVE and VE split-bias scores. Both reduce the distance quartet through each test
//! row's nearest train-side distance, so they accept full matrices and nearest-only
//! vectors interchangeably and give identical answers for either (see Wallach et al.,
//! J. Chem. Inf. Model. 2018, and Davis et al., arXiv:2001.03207).

use std::io::{self, ErrorKind};

use ndarray::Array1;

use crate::similarity::{DistanceData, DistanceQuartet};

/// Number of evenly spaced thresholds over [0, 1] in the AVE sweep.
pub const N_THRESHOLDS: usize = 50;

/// AVE bias: per relation, the threshold-averaged fraction of test ligands with at least
/// one train neighbor nearer than t; combined as S(aa) − S(ai) + S(ii) − S(ia).
/// Roughly in [−2, 2]; 0 means the split looks unbiased to a nearest-neighbor read.
pub fn calc_ave(distances: &DistanceQuartet) -> io::Result<f64> {
    let aa = similarity_score(&distances.a_test_a_train)?;
    let ai = similarity_score(&distances.a_test_i_train)?;
    let ii = similarity_score(&distances.i_test_i_train)?;
    let ia = similarity_score(&distances.i_test_a_train)?;

    Ok(aa - ai + ii - ia)
}

/// VE bias: per test ligand, the nearest opposite-label train distance minus the nearest
/// same-label train distance; the two group means combine as √(t₁² + t₂²). Non-negative;
/// 0 means unbiased.
pub fn calc_ve(distances: &DistanceQuartet) -> io::Result<f64> {
    let aa = distances.a_test_a_train.row_minima()?;
    let ai = distances.a_test_i_train.row_minima()?;
    let ii = distances.i_test_i_train.row_minima()?;
    let ia = distances.i_test_a_train.row_minima()?;

    if aa.len() != ai.len() || ii.len() != ia.len() {
        return Err(io::Error::new(
            ErrorKind::InvalidInput,
            "Quartet relations disagree on test-group sizes",
        ));
    }

    let term_one = mean(&(&ai - &aa));
    let term_two = mean(&(&ia - &ii));
    Ok((term_one * term_one + term_two * term_two).sqrt())
}

/// Mean over `N_THRESHOLDS` thresholds t of the fraction of test rows whose nearest
/// train distance is < t. The row-wise "any neighbor closer than t" over a full matrix
/// equals "row minimum < t", which is why minima suffice.
fn similarity_score(relation: &DistanceData) -> io::Result<f64> {
    let minima = relation.row_minima()?;
    let n = minima.len() as f64;

    let mut acc = 0.;
    for k in 0..N_THRESHOLDS {
        let t = k as f64 / (N_THRESHOLDS - 1) as f64;
        acc += minima.iter().filter(|&&m| m < t).count() as f64 / n;
    }
    Ok(acc / N_THRESHOLDS as f64)
}

fn mean(v: &Array1<f64>) -> f64 {
    v.sum() / v.len() as f64
}
