//! CATS pharmacophore fingerprints (topological atom-type-pair histograms), and
//! AVE/VE bias scores for active/inactive train/test splits. Intended for benchmarking
//! virtual-screening models: fingerprint a ligand corpus, split it by similarity cluster,
//! then measure how much of a model's apparent performance is explained by split leakage.

pub mod atom_types;
pub mod bias;
pub mod cats;
pub mod data;
pub mod pipeline;
pub mod similarity;
pub mod smiles;
pub mod sparse;
pub mod split;
pub mod topology;

use na_seq::Element;
pub use atom_types::{PharmType, TypeFlags, assign_types};
pub use bias::{calc_ave, calc_ve};
pub use cats::{CatsFingerprint, FP_LEN, FingerprintVariant};
pub use pipeline::FingerprintBatch;
pub use similarity::{DistanceData, DistanceMetric, DistanceQuartet, PairwiseStrategy};
pub use sparse::CsrMatrix;
pub use split::FeatureQuartet;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum BondType {
    Single,
    Double,
    Triple,
    Aromatic,
}

impl BondType {
    /// Numeric bond order, for valence sums. Aromatic counts as 1.5.
    pub fn order(self) -> f64 {
        match self {
            Self::Single => 1.,
            Self::Double => 2.,
            Self::Triple => 3.,
            Self::Aromatic => 1.5,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Atom {
    pub serial_number: u32,
    pub element: Element,
    /// Written lowercase in SMILES, i.e. part of an aromatic system.
    pub aromatic: bool,
    pub formal_charge: i8,
    /// H count stated by a bracket atom. `None` means derive it from standard valence.
    pub explicit_h: Option<u8>,
}

#[derive(Clone, Debug)]
pub struct Bond {
    pub bond_type: BondType,
    pub atom_0: usize,
    pub atom_1: usize,
}

/// A molecular graph with hydrogens left implicit, as parsed from SMILES. Atom indices
/// are 0-based positions in `atoms`; serial numbers are 1-based, in input order.
#[derive(Clone, Debug, Default)]
pub struct Molecule {
    pub ident: String,
    pub atoms: Vec<Atom>,
    pub bonds: Vec<Bond>,
    /// adjacency[atom] = (neighbor atom index, bond index) pairs.
    pub adjacency: Vec<Vec<(usize, usize)>>,
}

impl Molecule {
    /// Builds the adjacency list from the bond list. Bond endpoint indices must be
    /// in range; out-of-range bonds are rejected.
    pub fn new(ident: String, atoms: Vec<Atom>, bonds: Vec<Bond>) -> std::io::Result<Self> {
        let mut adjacency = vec![Vec::new(); atoms.len()];
        for (bi, bond) in bonds.iter().enumerate() {
            if bond.atom_0 >= atoms.len() || bond.atom_1 >= atoms.len() {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!(
                        "Bond endpoints ({}, {}) out of range for {} atoms",
                        bond.atom_0,
                        bond.atom_1,
                        atoms.len()
                    ),
                ));
            }
            adjacency[bond.atom_0].push((bond.atom_1, bi));
            adjacency[bond.atom_1].push((bond.atom_0, bi));
        }

        Ok(Self {
            ident,
            atoms,
            bonds,
            adjacency,
        })
    }

    pub fn n_atoms(&self) -> usize {
        self.atoms.len()
    }

    /// Number of explicit neighbors (implicit hydrogens don't count).
    pub fn degree(&self, i: usize) -> usize {
        self.adjacency[i].len()
    }

    pub fn neighbors(&self, i: usize) -> impl Iterator<Item = (usize, &Bond)> {
        self.adjacency[i]
            .iter()
            .map(move |&(nbr, bi)| (nbr, &self.bonds[bi]))
    }

    /// Neighbors that are not explicit hydrogen atoms. Hydrogens are normally implicit,
    /// but SMILES like `[H]C([H])([H])[H]` can put them in the graph.
    pub fn heavy_neighbors(&self, i: usize) -> impl Iterator<Item = (usize, &Bond)> {
        self.neighbors(i)
            .filter(|&(nbr, _)| self.atoms[nbr].element != Element::Hydrogen)
    }

    fn bond_order_sum(&self, i: usize) -> f64 {
        self.adjacency[i]
            .iter()
            .map(|&(_, bi)| self.bonds[bi].bond_type.order())
            .sum()
    }

    /// Hydrogens not present as graph atoms: the bracket-stated count if there is one,
    /// otherwise standard valence (charge-adjusted) minus the bond order sum.
    fn implicit_h(&self, i: usize) -> u8 {
        let atom = &self.atoms[i];
        if let Some(h) = atom.explicit_h {
            return h;
        }

        let target = default_valence(atom.element, atom.formal_charge);
        let filled = self.bond_order_sum(i);
        if target > filled {
            (target - filled).floor() as u8
        } else {
            0
        }
    }

    /// Total hydrogen count on atom `i`: implicit plus explicit H neighbors.
    pub fn h_count(&self, i: usize) -> u8 {
        let explicit = self
            .neighbors(i)
            .filter(|&(nbr, _)| self.atoms[nbr].element == Element::Hydrogen)
            .count() as u8;
        self.implicit_h(i) + explicit
    }

    /// Total valence: bond order sum plus implicit hydrogens. This is the `v` of
    /// SMARTS primitives; aromatic bonds contribute 1.5 each.
    pub fn valence(&self, i: usize) -> f64 {
        self.bond_order_sum(i) + self.implicit_h(i) as f64
    }
}

/// Default valence for the organic subset, adjusted by formal charge: a positive charge
/// adds bonding capacity on N/P/O/S (e.g. ammonium N binds 4), a negative one removes it.
fn default_valence(element: Element, charge: i8) -> f64 {
    let base: f64 = match element {
        Element::Hydrogen => 1.,
        Element::Boron => 3.,
        Element::Carbon => 4.,
        Element::Nitrogen | Element::Phosphorus => 3.,
        Element::Oxygen | Element::Sulfur => 2.,
        Element::Fluorine | Element::Chlorine | Element::Bromine | Element::Iodine => 1.,
        _ => 0.,
    };

    match element {
        Element::Nitrogen | Element::Phosphorus | Element::Oxygen | Element::Sulfur => {
            (base + charge as f64).max(0.)
        }
        Element::Carbon => (base - charge.abs() as f64).max(0.),
        _ => base,
    }
}
