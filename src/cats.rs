//! The CATS fingerprint: counts of pharmacophore-type pairs, binned by topological
//! distance. 28 unordered type pairs × 10 distance buckets (bond distances 1..=10)
//! flatten to a fixed 280-element vector per molecule.

use crate::{
    Molecule,
    atom_types::{PharmType, TypeFlags, assign_types},
    topology::distance_matrix,
};

pub const N_TYPES: usize = 7;
pub const N_TYPE_PAIRS: usize = 28;
pub const DIST_BINS: usize = 10;
/// Fingerprint length: 28 type pairs × 10 distance buckets.
pub const FP_LEN: usize = N_TYPE_PAIRS * DIST_BINS;

/// Maximum in-range topological distance; pairs farther apart (or disconnected) are
/// discarded.
pub const MAX_DISTANCE: u32 = 10;

/// The 28 unordered type pairs, in the fixed order that defines the fingerprint columns:
/// combinations-with-replacement over [D, A, E, H, B, P, L], each pair canonicalized by
/// sorting its two letters. This ordering is a stable contract — reordering it would
/// silently reshuffle all 280 columns.
pub fn type_pairs() -> [(PharmType, PharmType); N_TYPE_PAIRS] {
    let mut out = [(PharmType::Donor, PharmType::Donor); N_TYPE_PAIRS];
    let mut k = 0;
    for i in 0..N_TYPES {
        for j in i..N_TYPES {
            let (a, b) = (PharmType::ALL[i], PharmType::ALL[j]);
            out[k] = if a.letter() <= b.letter() { (a, b) } else { (b, a) };
            k += 1;
        }
    }
    out
}

/// 7×7 lookup from any (type, type) to its block index; symmetric.
fn pair_index_table() -> [[usize; N_TYPES]; N_TYPES] {
    let mut table = [[0; N_TYPES]; N_TYPES];
    for (idx, &(a, b)) in type_pairs().iter().enumerate() {
        table[a.index()][b.index()] = idx;
        table[b.index()][a.index()] = idx;
    }
    table
}

/// Block index for an unordered type pair.
pub fn pair_index(a: PharmType, b: PharmType) -> usize {
    pair_index_table()[a.index()][b.index()]
}

/// Two-letter canonical key for a block, e.g. "AD" or "LL". Handy for labeling output.
pub fn pair_key(a: PharmType, b: PharmType) -> String {
    let (x, y) = (a.letter(), b.letter());
    if x <= y {
        format!("{x}{y}")
    } else {
        format!("{y}{x}")
    }
}

/// Which histogram accumulation to use. The two produce incompatible value scales and
/// are never mixed within one fingerprint or one batch.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum FingerprintVariant {
    /// Integer counts in hard distance buckets.
    #[default]
    Exact,
    /// Each pair contributes a Gaussian kernel, exp(−(bucket−d)²), across all 10 buckets.
    Smoothed,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CatsFingerprint {
    /// bins[pair block][distance bucket]; bucket b ↔ bond distance b+1.
    pub bins: [[f64; DIST_BINS]; N_TYPE_PAIRS],
}

impl CatsFingerprint {
    /// Exact-count fingerprint of a molecule.
    pub fn of(mol: &Molecule) -> Self {
        Self::build(mol, FingerprintVariant::Exact)
    }

    /// Gaussian-smoothed variant.
    pub fn of_smoothed(mol: &Molecule) -> Self {
        Self::build(mol, FingerprintVariant::Smoothed)
    }

    pub fn build(mol: &Molecule, variant: FingerprintVariant) -> Self {
        let flags = assign_types(mol);
        Self::from_typed(&flags, &distance_matrix(mol), variant)
    }

    /// Histogram from pre-assigned labels and a distance matrix. For every unordered
    /// atom pair within range, every (label on i) × (label on j) combination counts —
    /// one atom pair contributes multiple increments when atoms carry multiple labels.
    pub fn from_typed(
        flags: &[TypeFlags],
        dist: &[Vec<u32>],
        variant: FingerprintVariant,
    ) -> Self {
        let table = pair_index_table();
        let mut bins = [[0.; DIST_BINS]; N_TYPE_PAIRS];

        let n = flags.len();
        for i in 0..n {
            if flags[i].is_empty() {
                continue;
            }
            for j in (i + 1)..n {
                let d = dist[i][j];
                if d < 1 || d > MAX_DISTANCE {
                    continue;
                }
                let bucket = (d - 1) as usize;

                for x in flags[i].iter() {
                    for y in flags[j].iter() {
                        let block = table[x.index()][y.index()];
                        match variant {
                            FingerprintVariant::Exact => bins[block][bucket] += 1.,
                            FingerprintVariant::Smoothed => {
                                for (b, slot) in bins[block].iter_mut().enumerate() {
                                    let off = b as f64 - bucket as f64;
                                    *slot += (-off * off).exp();
                                }
                            }
                        }
                    }
                }
            }
        }

        Self { bins }
    }

    /// The flat 280-element vector: blocks in `type_pairs()` order, buckets ascending.
    pub fn flatten(&self) -> [f64; FP_LEN] {
        let mut out = [0.; FP_LEN];
        for (block, row) in self.bins.iter().enumerate() {
            out[block * DIST_BINS..(block + 1) * DIST_BINS].copy_from_slice(row);
        }
        out
    }

    /// Sum over all entries. For the exact variant this equals the number of
    /// (atom pair, label pair) contributions within distance range.
    pub fn total(&self) -> f64 {
        self.bins.iter().flatten().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom_types::PharmType::*;

    #[test]
    fn pair_enumeration_order() {
        let keys: Vec<String> = type_pairs().iter().map(|&(a, b)| pair_key(a, b)).collect();
        // Pinned: combinations-with-replacement over D A E H B P L, letter-sorted keys.
        assert_eq!(
            keys,
            vec![
                "DD", "AD", "DE", "DH", "BD", "DP", "DL", //
                "AA", "AE", "AH", "AB", "AP", "AL", //
                "EE", "EH", "BE", "EP", "EL", //
                "HH", "BH", "HP", "HL", //
                "BB", "BP", "BL", //
                "PP", "LP", //
                "LL",
            ]
        );
    }

    #[test]
    fn pair_index_consistent_with_enumeration() {
        for (idx, &(a, b)) in type_pairs().iter().enumerate() {
            assert_eq!(pair_index(a, b), idx);
            assert_eq!(pair_index(b, a), idx); // unordered
        }
    }

    #[test]
    fn ethanol_scenario() {
        // Three-atom chain with stipulated labels: L on atoms 0 and 1, A on atom 2.
        // Expected: LL at bucket 0 (atoms 0-1, distance 1), AL at bucket 0 (atoms 1-2)
        // and bucket 1 (atoms 0-2, distance 2). Everything else zero.
        let mut flags = vec![TypeFlags::EMPTY; 3];
        flags[0].set(Aliphatic);
        flags[1].set(Aliphatic);
        flags[2].set(Acceptor);
        let dist = vec![vec![0, 1, 2], vec![1, 0, 1], vec![2, 1, 0]];

        let fp = CatsFingerprint::from_typed(&flags, &dist, FingerprintVariant::Exact);

        let ll = pair_index(Aliphatic, Aliphatic);
        let al = pair_index(Acceptor, Aliphatic);
        assert_eq!(fp.bins[ll][0], 1.);
        assert_eq!(fp.bins[al][0], 1.);
        assert_eq!(fp.bins[al][1], 1.);
        assert_eq!(fp.total(), 3.);

        for (block, row) in fp.bins.iter().enumerate() {
            for (bucket, &v) in row.iter().enumerate() {
                let expected = (block == ll && bucket == 0)
                    || (block == al && bucket <= 1);
                assert_eq!(v != 0., expected, "block {block} bucket {bucket}");
            }
        }
    }

    #[test]
    fn vector_is_280_and_integral() {
        for smiles in ["CCO", "c1ccccc1", "CC(=O)Oc1ccccc1C(=O)O", "O"] {
            let mol = Molecule::from_smiles(smiles).unwrap();
            let flat = CatsFingerprint::of(&mol).flatten();
            assert_eq!(flat.len(), FP_LEN);
            for v in flat {
                assert!(v >= 0.);
                assert_eq!(v.fract(), 0., "exact variant must stay integral");
            }
        }
    }

    #[test]
    fn conservation_of_contributions() {
        // Vector sum must equal a direct recount of in-range label-pair combinations.
        let mol = Molecule::from_smiles("CC(=O)Oc1ccccc1C(=O)O").unwrap(); // aspirin
        let flags = assign_types(&mol);
        let dist = distance_matrix(&mol);

        let mut expected = 0usize;
        for i in 0..mol.n_atoms() {
            for j in (i + 1)..mol.n_atoms() {
                if (1..=MAX_DISTANCE).contains(&dist[i][j]) {
                    expected += flags[i].len() * flags[j].len();
                }
            }
        }

        let fp = CatsFingerprint::of(&mol);
        assert_eq!(fp.total(), expected as f64);
        assert!(expected > 0);
    }

    #[test]
    fn single_atom_is_all_zero() {
        let mol = Molecule::from_smiles("O").unwrap();
        assert_eq!(CatsFingerprint::of(&mol).total(), 0.);
    }

    #[test]
    fn distant_pairs_discarded() {
        // A 14-carbon chain: ends are 13 bonds apart, beyond the 10-bucket range.
        let mol = Molecule::from_smiles("CCCCCCCCCCCCCC").unwrap();
        let fp = CatsFingerprint::of(&mol);
        let ll = pair_index(Aliphatic, Aliphatic);
        // Bucket 9 (distance 10) holds the 4 pairs exactly 10 bonds apart.
        assert_eq!(fp.bins[ll][9], 4.);
        // Pairs at distance 11..13 exist in the molecule but are not counted anywhere:
        // every contribution lives in the LL block, which caps at distance 10.
        let n = 14;
        let in_range: usize = (1..=10).map(|d| n - d).sum();
        assert_eq!(fp.total(), in_range as f64);
    }

    #[test]
    fn disconnected_atoms_excluded() {
        let mol = Molecule::from_smiles("CC.CC").unwrap();
        let fp = CatsFingerprint::of(&mol);
        let ll = pair_index(Aliphatic, Aliphatic);
        // Only the two intra-component pairs count; cross-component pairs are unreachable.
        assert_eq!(fp.bins[ll][0], 2.);
        assert_eq!(fp.total(), 2.);
    }

    #[test]
    fn smoothed_variant_spreads_mass() {
        let mol = Molecule::from_smiles("CCO").unwrap();
        let exact = CatsFingerprint::of(&mol);
        let smooth = CatsFingerprint::of_smoothed(&mol);

        // Every bucket of a touched block is nonzero under the kernel.
        let ll = pair_index(Aliphatic, Aliphatic);
        assert!(smooth.bins[ll].iter().all(|&v| v > 0.));
        // The kernel peaks where the exact count sits.
        assert_eq!(
            smooth.bins[ll]
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .unwrap()
                .0,
            0
        );
        // And smoothed values are genuinely non-integral.
        assert!(smooth.bins[ll][1].fract() != 0.);
        assert_eq!(exact.bins[ll][0], 1.);
    }
}
