//! Parse SMILES text into molecular graphs. Covers the subset that ligand corpora
//! actually use: organic-subset and bracket atoms, explicit bond symbols, branches,
//! single-digit and `%NN` ring closures, and disconnected components. Stereochemistry
//! and isotopes are consumed but discarded; this crate only looks at topology.

use std::{collections::HashMap, io};

use na_seq::Element;

use crate::{Atom, Bond, BondType, Molecule};

impl Molecule {
    pub fn from_smiles(data: &str) -> io::Result<Self> {
        let mut atoms: Vec<Atom> = Vec::new();
        let mut bonds: Vec<Bond> = Vec::new();

        let mut current: Option<usize> = None;
        // Whether the current atom was written as aromatic (lowercase in SMILES).
        // Two consecutive aromatic atoms share an implicit aromatic bond; a mixed or
        // non-aromatic pair gets an implicit single bond.
        let mut current_aromatic = false;
        let mut last_bond: Option<BondType> = None;
        // Stack saves (current atom index, aromaticity) at each branch open.
        let mut branch_stack: Vec<(Option<usize>, bool)> = Vec::new();
        // ring_idx -> (atom index, explicit bond type at open (None = implicit), aromatic at open)
        let mut ring_map: HashMap<u32, (usize, Option<BondType>, bool)> = HashMap::new();

        let mut chars = data.chars().peekable();
        let mut next_serial: u32 = 1;

        while let Some(&ch) = chars.peek() {
            match ch {
                // Explicit bond types
                '-' => {
                    last_bond = Some(BondType::Single);
                    chars.next();
                }
                '=' => {
                    last_bond = Some(BondType::Double);
                    chars.next();
                }
                '#' => {
                    last_bond = Some(BondType::Triple);
                    chars.next();
                }
                ':' => {
                    last_bond = Some(BondType::Aromatic);
                    chars.next();
                }
                // Stereo bonds — treat as single for connectivity purposes
                '/' | '\\' => {
                    last_bond = Some(BondType::Single);
                    chars.next();
                }

                // Branch open: push (current atom, aromaticity) so we can restore on ')'
                '(' => {
                    branch_stack.push((current, current_aromatic));
                    chars.next();
                }
                // Branch close: restore current atom and its aromaticity; bond state resets
                ')' => {
                    let (prev, prev_ar) = branch_stack.pop().ok_or_else(|| {
                        io::Error::new(io::ErrorKind::InvalidData, "unmatched ')' in SMILES")
                    })?;
                    current = prev;
                    current_aromatic = prev_ar;
                    last_bond = None;
                    chars.next();
                }

                // Disconnected component separator
                '.' => {
                    current = None;
                    current_aromatic = false;
                    last_bond = None;
                    chars.next();
                }

                // Two-digit ring closure: %NN
                '%' => {
                    chars.next(); // consume '%'
                    let d1 = consume_digit(&mut chars)?;
                    let d2 = consume_digit(&mut chars)?;
                    handle_ring(
                        d1 * 10 + d2,
                        current,
                        current_aromatic,
                        last_bond.take(), // None = implicit; resolved inside handle_ring
                        &mut ring_map,
                        &mut bonds,
                    )?;
                }

                // Single-digit ring closure
                '0'..='9' => {
                    let d = ch as u32 - '0' as u32;
                    chars.next();
                    handle_ring(
                        d,
                        current,
                        current_aromatic,
                        last_bond.take(), // None = implicit; resolved inside handle_ring
                        &mut ring_map,
                        &mut bonds,
                    )?;
                }

                // Bracket atom: [isotope?symbol@?H?charge?:map?]
                '[' => {
                    let parsed = parse_bracket_atom(&mut chars)?;
                    let bt = last_bond
                        .take()
                        .unwrap_or_else(|| implicit_bt(current_aromatic, parsed.aromatic, current));
                    let idx = push_atom(next_serial, parsed, current, bt, &mut atoms, &mut bonds);
                    next_serial += 1;
                    current_aromatic = atoms[idx].aromatic;
                    current = Some(idx);
                }

                // Organic-subset atom (bare symbol, no brackets)
                _ => match parse_organic_atom(&mut chars)? {
                    Some((element, is_aromatic)) => {
                        let bt = last_bond
                            .take()
                            .unwrap_or_else(|| implicit_bt(current_aromatic, is_aromatic, current));
                        let parsed = ParsedAtom {
                            element,
                            aromatic: is_aromatic,
                            formal_charge: 0,
                            explicit_h: None, // implicit: derived from valence
                        };
                        let idx =
                            push_atom(next_serial, parsed, current, bt, &mut atoms, &mut bonds);
                        next_serial += 1;
                        current = Some(idx);
                        current_aromatic = is_aromatic;
                    }
                    None => {
                        return Err(io::Error::new(
                            io::ErrorKind::InvalidData,
                            format!("unrecognized SMILES character: '{ch}'"),
                        ));
                    }
                },
            }
        }

        if !ring_map.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "unclosed ring closure index in SMILES",
            ));
        }
        if !branch_stack.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "unmatched '(' in SMILES",
            ));
        }

        Self::new(data.trim().to_string(), atoms, bonds)
    }
}

/// Everything a single atom token states.
struct ParsedAtom {
    element: Element,
    aromatic: bool,
    formal_charge: i8,
    explicit_h: Option<u8>,
}

/// Determine the implicit bond type between two adjacent atoms in SMILES.
/// Per the SMILES spec: if both atoms are aromatic (written lowercase) the
/// implicit bond is aromatic; otherwise it is single.
#[inline]
fn implicit_bt(prev_aromatic: bool, new_aromatic: bool, prev: Option<usize>) -> BondType {
    if prev.is_some() && prev_aromatic && new_aromatic {
        BondType::Aromatic
    } else {
        BondType::Single
    }
}

/// Add a new atom, bond it to `prev` if present, return its index.
fn push_atom(
    serial: u32,
    parsed: ParsedAtom,
    prev: Option<usize>,
    bond_type: BondType,
    atoms: &mut Vec<Atom>,
    bonds: &mut Vec<Bond>,
) -> usize {
    let idx = atoms.len();
    atoms.push(Atom {
        serial_number: serial,
        element: parsed.element,
        aromatic: parsed.aromatic,
        formal_charge: parsed.formal_charge,
        explicit_h: parsed.explicit_h,
    });

    if let Some(p) = prev {
        add_bond(p, idx, bond_type, bonds);
    }

    idx
}

/// Open or close a ring-closure bond.
///
/// `explicit_bt` is `Some` only if an explicit bond character (`=`, `#`, `:`, `-`) appeared
/// immediately before the ring-closure digit; otherwise `None` (implicit bond).
/// The bond type for an implicit ring closure is:
///   - aromatic  if both the opening and closing atoms are aromatic
///   - single    otherwise
fn handle_ring(
    ring_idx: u32,
    current: Option<usize>,
    current_aromatic: bool,
    explicit_bt: Option<BondType>,
    ring_map: &mut HashMap<u32, (usize, Option<BondType>, bool)>,
    bonds: &mut Vec<Bond>,
) -> io::Result<()> {
    let cur = current.ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            "ring closure digit without a current atom",
        )
    })?;

    match ring_map.remove(&ring_idx) {
        Some((other, bt_open, open_aromatic)) => {
            // Closing: an explicit bond at either end takes priority; otherwise use aromaticity.
            let bond_type = explicit_bt.or(bt_open).unwrap_or_else(|| {
                if open_aromatic && current_aromatic {
                    BondType::Aromatic
                } else {
                    BondType::Single
                }
            });
            add_bond(cur, other, bond_type, bonds);
        }
        None => {
            // Opening: record atom index, any explicit bond type, and aromaticity.
            ring_map.insert(ring_idx, (cur, explicit_bt, current_aromatic));
        }
    }

    Ok(())
}

/// Parse a bracket atom `[isotope? symbol chirality? Hcount? charge? :map?]`.
/// The leading `[` must still be in the iterator. Unlike bare organic-subset atoms, a
/// bracket atom states its hydrogen count: absent means zero, not "derive from valence".
fn parse_bracket_atom(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
) -> io::Result<ParsedAtom> {
    chars.next(); // consume '['

    // Optional isotope (one or more digits before the element symbol) — discarded.
    while chars.peek().is_some_and(|c| c.is_ascii_digit()) {
        chars.next();
    }

    // Element symbol: first letter (case determines aromaticity)
    let first = chars.next().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            "unexpected end of input inside bracket atom",
        )
    })?;
    let aromatic = first.is_ascii_lowercase();
    let mut sym = String::from(first.to_ascii_uppercase());

    // Optional second letter (always lowercase, e.g. 'l' in Cl, 'r' in Br, 'g' in Hg).
    // Not taken after aromatic symbols: in `[nH]` the H is a hydrogen count.
    if !aromatic && chars.peek().is_some_and(|c| c.is_ascii_lowercase()) {
        sym.push(chars.next().unwrap());
    }

    // Optional chirality: @ or @@ — discarded.
    while chars.peek().copied() == Some('@') {
        chars.next();
    }

    // Optional H-count: H or Hn
    let mut explicit_h: u8 = 0;
    if chars.peek().copied() == Some('H') {
        chars.next();
        let mut digits = String::new();
        while chars.peek().is_some_and(|c| c.is_ascii_digit()) {
            digits.push(chars.next().unwrap());
        }
        explicit_h = if digits.is_empty() {
            1
        } else {
            digits.parse().map_err(|_| {
                io::Error::new(io::ErrorKind::InvalidData, "bad H count in bracket atom")
            })?
        };
    }

    // Optional charge: +, -, ++, --, +n, -n
    let mut formal_charge: i8 = 0;
    if let Some(&sign_ch) = chars.peek()
        && (sign_ch == '+' || sign_ch == '-')
    {
        let sign: i8 = if sign_ch == '+' { 1 } else { -1 };
        let mut magnitude: i8 = 0;
        let mut digits = String::new();
        while let Some(&c) = chars.peek() {
            if c == sign_ch {
                magnitude += 1;
                chars.next();
            } else if c.is_ascii_digit() {
                digits.push(c);
                chars.next();
            } else {
                break;
            }
        }
        if !digits.is_empty() {
            magnitude = digits.parse().map_err(|_| {
                io::Error::new(io::ErrorKind::InvalidData, "bad charge in bracket atom")
            })?;
        }
        formal_charge = sign * magnitude;
    }

    // Optional atom-map: :n — discarded.
    if chars.peek().copied() == Some(':') {
        chars.next();
        while chars.peek().is_some_and(|c| c.is_ascii_digit()) {
            chars.next();
        }
    }

    // Closing ']'
    match chars.next() {
        Some(']') => {}
        other => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("expected ']' to close bracket atom, found {other:?}"),
            ));
        }
    }

    let element = Element::from_letter(&sym)?;
    Ok(ParsedAtom {
        element,
        aromatic,
        formal_charge,
        explicit_h: Some(explicit_h),
    })
}

/// Parse an organic-subset atom (no brackets). Advances the iterator past the token.
/// Returns `None` for unrecognized characters (caller decides whether to error).
fn parse_organic_atom(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
) -> io::Result<Option<(Element, bool)>> {
    let ch = match chars.peek().copied() {
        Some(c) => c,
        None => return Ok(None),
    };

    match ch {
        'C' => {
            chars.next();
            if chars.peek().copied() == Some('l') {
                chars.next();
                Ok(Some((Element::Chlorine, false)))
            } else {
                Ok(Some((Element::Carbon, false)))
            }
        }
        'B' => {
            chars.next();
            if chars.peek().copied() == Some('r') {
                chars.next();
                Ok(Some((Element::Bromine, false)))
            } else {
                Ok(Some((Element::Boron, false)))
            }
        }
        'N' => {
            chars.next();
            Ok(Some((Element::Nitrogen, false)))
        }
        'O' => {
            chars.next();
            Ok(Some((Element::Oxygen, false)))
        }
        'S' => {
            chars.next();
            Ok(Some((Element::Sulfur, false)))
        }
        'P' => {
            chars.next();
            Ok(Some((Element::Phosphorus, false)))
        }
        'F' => {
            chars.next();
            Ok(Some((Element::Fluorine, false)))
        }
        'I' => {
            chars.next();
            Ok(Some((Element::Iodine, false)))
        }
        'H' => {
            chars.next();
            Ok(Some((Element::Hydrogen, false)))
        }
        // Aromatic atoms (lowercase organic subset)
        'c' => {
            chars.next();
            Ok(Some((Element::Carbon, true)))
        }
        'n' => {
            chars.next();
            Ok(Some((Element::Nitrogen, true)))
        }
        'o' => {
            chars.next();
            Ok(Some((Element::Oxygen, true)))
        }
        's' => {
            chars.next();
            Ok(Some((Element::Sulfur, true)))
        }
        'p' => {
            chars.next();
            Ok(Some((Element::Phosphorus, true)))
        }
        _ => Ok(None),
    }
}

/// Consume a single ASCII digit from the iterator, returning its numeric value.
fn consume_digit(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> io::Result<u32> {
    match chars.next() {
        Some(c) if c.is_ascii_digit() => Ok(c as u32 - '0' as u32),
        Some(c) => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("expected digit after '%', found '{c}'"),
        )),
        None => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "expected digit after '%', found end of input",
        )),
    }
}

/// Add a bond between atoms `a` and `b`, stored with the lower index as atom_0.
fn add_bond(a: usize, b: usize, bond_type: BondType, bonds: &mut Vec<Bond>) {
    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
    bonds.push(Bond {
        bond_type,
        atom_0: lo,
        atom_1: hi,
    });
}
