//! Batch fingerprinting of a ligand corpus: one CATS vector per structure string, rows
//! in input order. Fingerprinting is independent per molecule, so the batch fans out
//! across a rayon thread pool and reassembles in order on collect.

use ndarray::Array2;
use rayon::prelude::*;

use crate::{
    Molecule,
    cats::{CatsFingerprint, FP_LEN, FingerprintVariant},
    sparse::CsrMatrix,
};

/// A fingerprinted corpus. Unparsable structures are skipped with a warning rather than
/// aborting the batch — corpora scraped from public databases always contain a few bad
/// rows, and one of them shouldn't cost hours of recomputation. `n_skipped` and
/// `row_idents` keep the damage observable: rows map back to input positions, so label
/// matrices can be realigned after skips.
#[derive(Clone, Debug)]
pub struct FingerprintBatch {
    /// One row per successfully parsed molecule, 280 columns, input order.
    pub features: Array2<f64>,
    /// Input index of each surviving row.
    pub row_idents: Vec<usize>,
    pub n_skipped: usize,
}

impl FingerprintBatch {
    /// Fingerprint the first `limit` structures (all of them if `None`), in parallel.
    pub fn from_smiles(
        smiles: &[String],
        variant: FingerprintVariant,
        limit: Option<usize>,
    ) -> Self {
        let take = limit.unwrap_or(smiles.len()).min(smiles.len());

        let results: Vec<(usize, std::io::Result<CatsFingerprint>)> = smiles[..take]
            .par_iter()
            .enumerate()
            .map(|(i, s)| {
                (
                    i,
                    Molecule::from_smiles(s).map(|mol| CatsFingerprint::build(&mol, variant)),
                )
            })
            .collect();

        let mut rows = Vec::with_capacity(take);
        let mut row_idents = Vec::with_capacity(take);
        let mut n_skipped = 0;

        for (i, result) in results {
            match result {
                Ok(fp) => {
                    rows.push(fp.flatten());
                    row_idents.push(i);
                }
                Err(e) => {
                    eprintln!("Skipping structure {i} ({:?}): {e}", &smiles[i]);
                    n_skipped += 1;
                }
            }
        }

        let mut features = Array2::zeros((rows.len(), FP_LEN));
        for (r, row) in rows.iter().enumerate() {
            for (c, &v) in row.iter().enumerate() {
                features[[r, c]] = v;
            }
        }

        Self {
            features,
            row_idents,
            n_skipped,
        }
    }

    pub fn n_rows(&self) -> usize {
        self.features.nrows()
    }

    pub fn to_sparse(&self) -> CsrMatrix {
        CsrMatrix::from_dense(&self.features)
    }

    /// Persist the fingerprint matrix as CSR.
    #[cfg(feature = "encode")]
    pub fn save(&self, path: &std::path::Path) -> std::io::Result<()> {
        self.to_sparse().save(path)
    }

    /// Load a previously saved fingerprint matrix back into dense form.
    #[cfg(feature = "encode")]
    pub fn load_features(path: &std::path::Path) -> std::io::Result<Array2<f64>> {
        CsrMatrix::load(path)?.to_dense()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<String> {
        ["CCO", "c1ccccc1", "CC(=O)O", "CCN"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn rows_align_with_input_order() {
        let batch = FingerprintBatch::from_smiles(&corpus(), FingerprintVariant::Exact, None);
        assert_eq!(batch.n_rows(), 4);
        assert_eq!(batch.n_skipped, 0);
        assert_eq!(batch.row_idents, vec![0, 1, 2, 3]);
        assert_eq!(batch.features.ncols(), FP_LEN);

        // Row content matches a direct single-molecule computation.
        for (r, s) in corpus().iter().enumerate() {
            let mol = Molecule::from_smiles(s).unwrap();
            let expected = CatsFingerprint::of(&mol).flatten();
            for c in 0..FP_LEN {
                assert_eq!(batch.features[[r, c]], expected[c]);
            }
        }
    }

    #[test]
    fn prefix_limit() {
        let batch = FingerprintBatch::from_smiles(&corpus(), FingerprintVariant::Exact, Some(2));
        assert_eq!(batch.n_rows(), 2);
        assert_eq!(batch.row_idents, vec![0, 1]);

        // A limit beyond the corpus is clamped, not an error.
        let batch = FingerprintBatch::from_smiles(&corpus(), FingerprintVariant::Exact, Some(99));
        assert_eq!(batch.n_rows(), 4);
    }

    #[test]
    fn bad_structures_skipped_and_counted() {
        let mut smiles = corpus();
        smiles.insert(1, "C1CC".to_string()); // unclosed ring
        smiles.push("???".to_string());

        let batch = FingerprintBatch::from_smiles(&smiles, FingerprintVariant::Exact, None);
        assert_eq!(batch.n_skipped, 2);
        assert_eq!(batch.n_rows(), 4);
        assert_eq!(batch.row_idents, vec![0, 2, 3, 4]);
    }

    #[test]
    fn sparse_round_trip() {
        let batch = FingerprintBatch::from_smiles(&corpus(), FingerprintVariant::Exact, None);
        let csr = batch.to_sparse();
        assert!(csr.nnz() > 0);
        assert_eq!(csr.to_dense().unwrap(), batch.features);
    }
}
