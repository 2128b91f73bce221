//! Pharmacophore atom typing. Each atom is tagged with zero or more of seven fixed
//! categories; the tags are additive, never exclusive (a hydroxyl oxygen is both donor
//! and acceptor). The rules transcribe the classic CATS substructure definitions as
//! predicates over element, aromaticity, charge, hydrogen count, and neighbor bonds.

use na_seq::Element;

use crate::{BondType, Molecule};

/// The seven pharmacophore categories, in their fixed canonical order. The single-letter
/// codes (D, A, E, H, B, P, L) follow the CATS literature.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PharmType {
    /// D — hydrogen-bond donor
    Donor,
    /// A — hydrogen-bond acceptor
    Acceptor,
    /// E — π system (aromatic, or sp/sp² carbon)
    PiSystem,
    /// H — halogen
    Halogen,
    /// B — basic nitrogen
    Basic,
    /// P — acidic (carboxylic/sulfonic-style)
    Acidic,
    /// L — aliphatic carbon
    Aliphatic,
}

impl PharmType {
    pub const ALL: [Self; 7] = [
        Self::Donor,
        Self::Acceptor,
        Self::PiSystem,
        Self::Halogen,
        Self::Basic,
        Self::Acidic,
        Self::Aliphatic,
    ];

    pub fn letter(self) -> char {
        match self {
            Self::Donor => 'D',
            Self::Acceptor => 'A',
            Self::PiSystem => 'E',
            Self::Halogen => 'H',
            Self::Basic => 'B',
            Self::Acidic => 'P',
            Self::Aliphatic => 'L',
        }
    }

    /// Position in `ALL`. Stable; the fingerprint column order depends on it.
    pub fn index(self) -> usize {
        match self {
            Self::Donor => 0,
            Self::Acceptor => 1,
            Self::PiSystem => 2,
            Self::Halogen => 3,
            Self::Basic => 4,
            Self::Acidic => 5,
            Self::Aliphatic => 6,
        }
    }
}

/// Per-atom label set as a bitmask over the closed 7-type alphabet.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct TypeFlags(u8);

impl TypeFlags {
    pub const EMPTY: Self = Self(0);

    pub fn set(&mut self, t: PharmType) {
        self.0 |= 1 << t.index();
    }

    pub fn contains(self, t: PharmType) -> bool {
        self.0 & (1 << t.index()) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// The set types, in canonical order.
    pub fn iter(self) -> impl Iterator<Item = PharmType> {
        PharmType::ALL.into_iter().filter(move |t| self.contains(*t))
    }
}

/// Assign pharmacophore types to every atom of `mol`. Matching order across the seven
/// patterns is immaterial since labels are additive.
pub fn assign_types(mol: &Molecule) -> Vec<TypeFlags> {
    (0..mol.n_atoms())
        .map(|i| {
            let mut flags = TypeFlags::EMPTY;
            if is_donor(mol, i) {
                flags.set(PharmType::Donor);
            }
            if is_acceptor(mol, i) {
                flags.set(PharmType::Acceptor);
            }
            if is_pi_system(mol, i) {
                flags.set(PharmType::PiSystem);
            }
            if is_halogen(mol, i) {
                flags.set(PharmType::Halogen);
            }
            if is_basic(mol, i) {
                flags.set(PharmType::Basic);
            }
            if is_acidic(mol, i) {
                flags.set(PharmType::Acidic);
            }
            if is_aliphatic_c(mol, i) {
                flags.set(PharmType::Aliphatic);
            }
            flags
        })
        .collect()
}

/// D: `[$([N;!H0;v3,v4&+1]),$([O,S;H1;+0]),n&H1&+0]`
fn is_donor(mol: &Molecule, i: usize) -> bool {
    let atom = &mol.atoms[i];
    let h = mol.h_count(i);

    match atom.element {
        Element::Nitrogen if !atom.aromatic => {
            let v = mol.valence(i);
            h >= 1 && (v == 3. || (v == 4. && atom.formal_charge == 1))
        }
        Element::Nitrogen => h == 1 && atom.formal_charge == 0,
        Element::Oxygen | Element::Sulfur if !atom.aromatic => {
            h == 1 && atom.formal_charge == 0
        }
        _ => false,
    }
}

/// A: `[$([O,S;H1;v2;!$(*-*=[O,N,P,S])]),$([O,S;H0;v2]),$([O,S;-]),
///      $([N;v3;!$(N-*=[O,N,P,S])]),n&H0&+0,$([o,s;+0;!$([o,s]:n);!$([o,s]:c:n)])]`
fn is_acceptor(mol: &Molecule, i: usize) -> bool {
    let atom = &mol.atoms[i];
    let h = mol.h_count(i);

    match atom.element {
        Element::Oxygen | Element::Sulfur if !atom.aromatic => {
            if atom.formal_charge < 0 {
                return true;
            }
            let v = mol.valence(i);
            // Hydroxyl-style O/S only counts when it isn't the -OH of an acid/ester
            // (a neighbor double-bonded to O/N/P/S disqualifies it).
            (h == 1 && v == 2. && !neighbor_has_double_to_onps(mol, i))
                || (h == 0 && v == 2.)
        }
        Element::Oxygen | Element::Sulfur => {
            // Aromatic o/s: neutral, and not conjugated to an aromatic nitrogen
            // (directly, or through one aromatic carbon).
            atom.formal_charge == 0
                && !aromatic_neighbor_n(mol, i)
                && !aromatic_n_two_away(mol, i)
        }
        Element::Nitrogen if !atom.aromatic => {
            mol.valence(i) == 3. && !neighbor_has_double_to_onps(mol, i)
        }
        Element::Nitrogen => h == 0 && atom.formal_charge == 0,
        _ => false,
    }
}

/// E: `[c,$(C=C-*),$(C#C)]`
fn is_pi_system(mol: &Molecule, i: usize) -> bool {
    let atom = &mol.atoms[i];
    if atom.element != Element::Carbon {
        return false;
    }
    if atom.aromatic {
        return true;
    }
    double_to_substituted_c(mol, i)
        || mol.heavy_neighbors(i).any(|(nbr, b)| {
            b.bond_type == BondType::Triple && mol.atoms[nbr].element == Element::Carbon
        })
}

/// H: `[F,Cl,Br,I]`
fn is_halogen(mol: &Molecule, i: usize) -> bool {
    matches!(
        mol.atoms[i].element,
        Element::Fluorine | Element::Chlorine | Element::Bromine | Element::Iodine
    )
}

/// B: `[#7;+]`, or a neutral aliphatic amine N: H2 with one eligible substituent, H1 with
/// two, H0 with three. An eligible substituent is a carbon (aliphatic, or any aromatic
/// atom for the H2/H1 forms) that is not a carbonyl carbon — amides are not basic.
fn is_basic(mol: &Molecule, i: usize) -> bool {
    let atom = &mol.atoms[i];
    if atom.element != Element::Nitrogen {
        return false;
    }
    if atom.formal_charge > 0 {
        return true;
    }
    if atom.aromatic || atom.formal_charge != 0 {
        return false;
    }

    let h = mol.h_count(i);
    let subs: Vec<usize> = mol.heavy_neighbors(i).map(|(nbr, _)| nbr).collect();

    match (h, subs.len()) {
        (2, 1) => amine_substituent_ok(mol, subs[0], true),
        (1, 2) => subs.iter().all(|&s| amine_substituent_ok(mol, s, true)),
        (0, 3) => subs.iter().all(|&s| amine_substituent_ok(mol, s, false)),
        _ => false,
    }
}

/// P: `[$([C,S](=[O,S,P])-[O;H1,-1])]`
fn is_acidic(mol: &Molecule, i: usize) -> bool {
    let atom = &mol.atoms[i];
    if atom.aromatic || !matches!(atom.element, Element::Carbon | Element::Sulfur) {
        return false;
    }

    let has_acid_double = mol.heavy_neighbors(i).any(|(nbr, b)| {
        b.bond_type == BondType::Double
            && matches!(
                mol.atoms[nbr].element,
                Element::Oxygen | Element::Sulfur | Element::Phosphorus
            )
    });
    let has_acid_oxygen = mol.heavy_neighbors(i).any(|(nbr, b)| {
        b.bond_type == BondType::Single
            && mol.atoms[nbr].element == Element::Oxygen
            && (mol.h_count(nbr) == 1 || mol.atoms[nbr].formal_charge == -1)
    });

    has_acid_double && has_acid_oxygen
}

/// L: `[!$(C=C-*);!$(C#*);$(C-*)]` — an aliphatic carbon with at least one single bond
/// to a heavy atom, excluding vinylic and any triple-bonded carbons. Carbonyl carbons
/// qualify: the exclusions only name C=C and C#*.
fn is_aliphatic_c(mol: &Molecule, i: usize) -> bool {
    let atom = &mol.atoms[i];
    if atom.element != Element::Carbon || atom.aromatic {
        return false;
    }

    let has_single = mol
        .heavy_neighbors(i)
        .any(|(_, b)| b.bond_type == BondType::Single);
    let has_triple = mol.neighbors(i).any(|(_, b)| b.bond_type == BondType::Triple);

    has_single && !has_triple && !double_to_substituted_c(mol, i)
}

/// `C=C-*`: a double bond to a carbon that carries at least one further heavy neighbor.
fn double_to_substituted_c(mol: &Molecule, i: usize) -> bool {
    mol.heavy_neighbors(i).any(|(nbr, b)| {
        b.bond_type == BondType::Double
            && mol.atoms[nbr].element == Element::Carbon
            && mol.heavy_neighbors(nbr).any(|(other, _)| other != i)
    })
}

/// `*-*=[O,N,P,S]`: some single-bonded neighbor is double-bonded to O/N/P/S.
fn neighbor_has_double_to_onps(mol: &Molecule, i: usize) -> bool {
    mol.heavy_neighbors(i).any(|(nbr, b)| {
        b.bond_type == BondType::Single
            && mol.heavy_neighbors(nbr).any(|(other, b2)| {
                other != i
                    && b2.bond_type == BondType::Double
                    && matches!(
                        mol.atoms[other].element,
                        Element::Oxygen | Element::Nitrogen | Element::Phosphorus | Element::Sulfur
                    )
            })
    })
}

/// Aromatic-bonded neighbor that is an aromatic nitrogen.
fn aromatic_neighbor_n(mol: &Molecule, i: usize) -> bool {
    mol.heavy_neighbors(i).any(|(nbr, b)| {
        b.bond_type == BondType::Aromatic
            && mol.atoms[nbr].element == Element::Nitrogen
            && mol.atoms[nbr].aromatic
    })
}

/// `[o,s]:c:n` — an aromatic nitrogen two aromatic bonds away, through a carbon.
fn aromatic_n_two_away(mol: &Molecule, i: usize) -> bool {
    mol.heavy_neighbors(i).any(|(c, b)| {
        b.bond_type == BondType::Aromatic
            && mol.atoms[c].element == Element::Carbon
            && mol.atoms[c].aromatic
            && mol.heavy_neighbors(c).any(|(n, b2)| {
                n != i
                    && b2.bond_type == BondType::Aromatic
                    && mol.atoms[n].element == Element::Nitrogen
                    && mol.atoms[n].aromatic
            })
    })
}

/// Amine substituent test: carbon (or, when `allow_aromatic`, any aromatic atom) that is
/// not double-bonded to an oxygen.
fn amine_substituent_ok(mol: &Molecule, s: usize, allow_aromatic: bool) -> bool {
    let atom = &mol.atoms[s];
    let eligible = if allow_aromatic {
        atom.element == Element::Carbon || atom.aromatic
    } else {
        atom.element == Element::Carbon && !atom.aromatic
    };
    if !eligible {
        return false;
    }

    !mol.heavy_neighbors(s).any(|(nbr, b)| {
        b.bond_type == BondType::Double && mol.atoms[nbr].element == Element::Oxygen
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types_of(smiles: &str) -> Vec<TypeFlags> {
        assign_types(&Molecule::from_smiles(smiles).unwrap())
    }

    #[test]
    fn ethanol() {
        let t = types_of("CCO");
        // Carbons: aliphatic only. Hydroxyl O: donor and acceptor.
        assert!(t[0].contains(PharmType::Aliphatic));
        assert!(!t[0].contains(PharmType::PiSystem));
        assert!(t[1].contains(PharmType::Aliphatic));
        assert!(t[2].contains(PharmType::Donor));
        assert!(t[2].contains(PharmType::Acceptor));
        assert!(!t[2].contains(PharmType::Aliphatic));
    }

    #[test]
    fn acetic_acid() {
        let t = types_of("CC(=O)O");
        // The carboxyl carbon is acidic (and aliphatic: it has a single bond, no C=C/C#).
        assert!(t[1].contains(PharmType::Acidic));
        assert!(t[1].contains(PharmType::Aliphatic));
        // Carbonyl O: acceptor, not donor. Hydroxyl O: donor, but not acceptor —
        // it sits on a carbon double-bonded to O.
        assert!(t[2].contains(PharmType::Acceptor));
        assert!(!t[2].contains(PharmType::Donor));
        assert!(t[3].contains(PharmType::Donor));
        assert!(!t[3].contains(PharmType::Acceptor));
    }

    #[test]
    fn carboxylate_anion() {
        let t = types_of("CC(=O)[O-]");
        assert!(t[1].contains(PharmType::Acidic));
        assert!(t[3].contains(PharmType::Acceptor)); // charged O is an acceptor
        assert!(!t[3].contains(PharmType::Donor));
    }

    #[test]
    fn benzene_is_pi_only() {
        let t = types_of("c1ccccc1");
        for flags in &t {
            assert!(flags.contains(PharmType::PiSystem));
            assert!(!flags.contains(PharmType::Aliphatic));
            assert_eq!(flags.len(), 1);
        }
    }

    #[test]
    fn pyridine_n_is_acceptor_not_donor() {
        let t = types_of("c1ccncc1");
        let n = 3;
        assert!(t[n].contains(PharmType::Acceptor));
        assert!(!t[n].contains(PharmType::Donor));
        assert!(!t[n].contains(PharmType::Basic)); // aromatic, neutral: not a basic amine
    }

    #[test]
    fn pyrrole_nh_is_donor_not_acceptor() {
        let t = types_of("c1cc[nH]c1");
        let n = 3;
        assert!(t[n].contains(PharmType::Donor));
        assert!(!t[n].contains(PharmType::Acceptor));
    }

    #[test]
    fn furan_o_acceptor() {
        let t = types_of("c1ccoc1");
        let o = 3;
        assert!(t[o].contains(PharmType::Acceptor));
        // Oxazole-style o adjacent-ish to n is excluded.
        let t2 = types_of("c1ocnc1"); // 1,3-oxazole: o:c:n arrangement
        let o2 = 1;
        assert!(!t2[o2].contains(PharmType::Acceptor));
    }

    #[test]
    fn amines_basic_amides_not() {
        // Ethylamine: primary amine N → basic, donor, acceptor.
        let t = types_of("CCN");
        assert!(t[2].contains(PharmType::Basic));
        assert!(t[2].contains(PharmType::Donor));
        assert!(t[2].contains(PharmType::Acceptor));

        // Acetamide: the N sits on a carbonyl carbon → not basic, not acceptor.
        let t = types_of("CC(=O)N");
        assert!(!t[3].contains(PharmType::Basic));
        assert!(!t[3].contains(PharmType::Acceptor));
        assert!(t[3].contains(PharmType::Donor)); // amide N-H still donates

        // Trimethylamine: tertiary amine → basic.
        let t = types_of("CN(C)C");
        assert!(t[1].contains(PharmType::Basic));

        // Charged N is basic regardless of substitution.
        let t = types_of("C[N+](C)(C)C");
        assert!(t[1].contains(PharmType::Basic));
    }

    #[test]
    fn halogens() {
        let t = types_of("FC(Cl)(Br)I");
        for idx in [0, 2, 3, 4] {
            assert!(t[idx].contains(PharmType::Halogen));
            assert_eq!(t[idx].len(), 1);
        }
        assert!(t[1].contains(PharmType::Aliphatic));
    }

    #[test]
    fn alkene_and_alkyne() {
        // Propene: CH2=CH-CH3. C=C-* anchors at the terminal CH2 — its double-bond
        // partner is the one carrying a substituent. The middle carbon matches neither
        // the π pattern nor the vinylic exclusion, so it stays aliphatic.
        let t = types_of("C=CC");
        assert!(t[0].contains(PharmType::PiSystem));
        assert!(!t[0].contains(PharmType::Aliphatic)); // no single bond on CH2
        assert!(!t[1].contains(PharmType::PiSystem));
        assert!(t[1].contains(PharmType::Aliphatic));
        assert!(t[2].contains(PharmType::Aliphatic));

        // Ethylene: neither carbon has a further substituent → no π, no L.
        let t = types_of("C=C");
        assert!(t[0].is_empty());
        assert!(t[1].is_empty());

        // Propyne: both alkyne carbons are π; the triple-bond exclusion blocks L.
        let t = types_of("C#CC");
        assert!(t[0].contains(PharmType::PiSystem));
        assert!(t[1].contains(PharmType::PiSystem));
        assert!(!t[1].contains(PharmType::Aliphatic));
        assert!(t[2].contains(PharmType::Aliphatic));
    }

    #[test]
    fn nitrile_n_is_acceptor() {
        let t = types_of("CC#N");
        assert!(t[2].contains(PharmType::Acceptor));
        assert!(!t[2].contains(PharmType::Donor));
    }

    #[test]
    fn multiple_labels_per_atom() {
        // Serine-like fragment: plenty of overlap between categories.
        let t = types_of("NCC(O)C(=O)O");
        let total: usize = t.iter().map(|f| f.len()).sum();
        assert!(total > t.len()); // more labels than atoms: multi-labeling happened
    }
}
