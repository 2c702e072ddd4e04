//! Morgan (ECFP-style) fingerprints and Tanimoto similarity.

use crate::molecule::Molecule;

/// Fixed-width bit vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    words: Vec<u64>,
    nbits: usize,
}

impl Fingerprint {
    pub fn new(nbits: usize) -> Self {
        let nbits = nbits.max(1);
        Self { words: vec![0; nbits.div_ceil(64)], nbits }
    }

    /// Positions wrap modulo the width.
    pub fn set(&mut self, pos: usize) {
        let pos = pos % self.nbits;
        self.words[pos / 64] |= 1u64 << (pos % 64);
    }

    pub fn contains(&self, pos: usize) -> bool {
        let pos = pos % self.nbits;
        self.words[pos / 64] & (1u64 << (pos % 64)) != 0
    }

    pub fn count_ones(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    pub fn nbits(&self) -> usize {
        self.nbits
    }
}

// 64-bit FNV-1a
const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

#[derive(Clone, Copy)]
struct Fnv(u64);

impl Fnv {
    fn new() -> Self {
        Fnv(FNV_OFFSET)
    }

    fn feed(self, value: u64) -> Self {
        let h = value
            .to_le_bytes()
            .iter()
            .fold(self.0, |h, &b| (h ^ b as u64).wrapping_mul(FNV_PRIME));
        Fnv(h)
    }
}

/// Circular fingerprint of `radius` iterations folded into `nbits` bits.
///
/// Atom invariants: element, heavy degree, hydrogen count, charge, ring
/// membership and aromaticity. Each iteration hashes an atom's identifier
/// with its neighbors' identifiers and bond orders, sorted so the result
/// does not depend on atom order in the SMILES.
pub fn morgan(mol: &Molecule, radius: usize, nbits: usize) -> Fingerprint {
    let mut fp = Fingerprint::new(nbits);
    if mol.atom_count() == 0 {
        return fp;
    }
    let in_ring = mol.ring_atoms();

    let mut ids: Vec<u64> = mol
        .atoms
        .iter()
        .enumerate()
        .map(|(i, atom)| {
            Fnv::new()
                .feed(atom.atomic_number as u64)
                .feed(mol.degree(i) as u64)
                .feed(atom.hydrogens as u64)
                .feed(atom.charge as i64 as u64)
                .feed(in_ring[i] as u64)
                .feed(atom.aromatic as u64)
                .0
        })
        .collect();
    for &id in &ids {
        fp.set(id as usize);
    }

    for _ in 0..radius {
        let next: Vec<u64> = (0..mol.atom_count())
            .map(|i| {
                let mut env: Vec<(u64, u64)> = mol
                    .neighbors(i)
                    .iter()
                    .map(|&(n, bond)| (mol.bonds[bond].order as u64, ids[n]))
                    .collect();
                env.sort_unstable();
                env.iter()
                    .fold(Fnv::new().feed(ids[i]), |h, &(order, id)| h.feed(order).feed(id))
                    .0
            })
            .collect();
        for &id in &next {
            fp.set(id as usize);
        }
        ids = next;
    }

    fp
}

/// |A ∩ B| / |A ∪ B|. Two empty fingerprints are identical (1.0).
pub fn tanimoto(a: &Fingerprint, b: &Fingerprint) -> f64 {
    debug_assert_eq!(a.nbits, b.nbits);
    let (both, either) = a
        .words
        .iter()
        .zip(&b.words)
        .fold((0u32, 0u32), |(both, either), (x, y)| {
            (both + (x & y).count_ones(), either + (x | y).count_ones())
        });
    if either == 0 {
        1.0
    } else {
        both as f64 / either as f64
    }
}
