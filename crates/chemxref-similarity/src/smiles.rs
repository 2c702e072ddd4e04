//! SMILES parser.
//!
//! Handles the organic subset, bracket atoms (isotope, chirality, hydrogen
//! count, charge and atom class are read; isotope, chirality and class are
//! discarded), branches, ring bonds including `%nn`, explicit bond symbols
//! and `.` fragment separators. Cis/trans markers are accepted as plain
//! single bonds.

use std::collections::BTreeMap;

use crate::error::SmilesError;
use crate::molecule::{Atom, Bond, BondOrder, Molecule};

/// Symbols indexed by atomic number minus one, H through Rn.
const ELEMENTS: [&str; 86] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S", "Cl",
    "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As",
    "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In",
    "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb",
    "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl",
    "Pb", "Bi", "Po", "At", "Rn",
];

fn atomic_number(symbol: &str) -> Option<u8> {
    ELEMENTS.iter().position(|s| *s == symbol).map(|i| i as u8 + 1)
}

/// Normal valences of the organic subset, lowest first.
fn default_valences(atomic_number: u8) -> &'static [u8] {
    match atomic_number {
        5 => &[3],
        6 => &[4],
        7 => &[3, 5],
        8 => &[2],
        15 => &[3, 5],
        16 => &[2, 4, 6],
        9 | 17 | 35 | 53 => &[1],
        _ => &[],
    }
}

pub fn parse_smiles(smiles: &str) -> Result<Molecule, SmilesError> {
    let smiles = smiles.trim();
    if smiles.is_empty() {
        return Err(SmilesError::Empty);
    }
    let mut parser = Parser::new(smiles);
    parser.run()?;
    parser.finish()
}

struct OpenRing {
    atom: usize,
    order: Option<BondOrder>,
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    rings: BTreeMap<u16, OpenRing>,
    branches: Vec<usize>,
    prev: Option<usize>,
    pending: Option<(BondOrder, usize)>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
            atoms: Vec::new(),
            bonds: Vec::new(),
            rings: BTreeMap::new(),
            branches: Vec::new(),
            prev: None,
            pending: None,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn unexpected(&self, at: usize) -> SmilesError {
        let ch = self.input.get(at).map(|&b| b as char).unwrap_or('?');
        SmilesError::UnexpectedChar { ch, pos: at }
    }

    fn run(&mut self) -> Result<(), SmilesError> {
        while let Some(ch) = self.peek() {
            let at = self.pos;
            match ch {
                b'(' => {
                    let prev = self.prev.ok_or(SmilesError::Dangling("branch", at))?;
                    self.branches.push(prev);
                    self.pos += 1;
                }
                b')' => {
                    if self.pending.is_some() {
                        return Err(SmilesError::Dangling("bond", at));
                    }
                    self.prev = Some(self.branches.pop().ok_or(SmilesError::UnbalancedParentheses)?);
                    self.pos += 1;
                }
                b'-' | b'/' | b'\\' => self.bond_symbol(BondOrder::Single)?,
                b'=' => self.bond_symbol(BondOrder::Double)?,
                b'#' => self.bond_symbol(BondOrder::Triple)?,
                b':' => self.bond_symbol(BondOrder::Aromatic)?,
                b'.' => {
                    if self.pending.is_some() {
                        return Err(SmilesError::Dangling("bond", at));
                    }
                    self.prev = None;
                    self.pos += 1;
                }
                b'%' => {
                    self.pos += 1;
                    let tens = self.bump().filter(u8::is_ascii_digit);
                    let ones = self.bump().filter(u8::is_ascii_digit);
                    match (tens, ones) {
                        (Some(t), Some(o)) => {
                            self.ring_bond(((t - b'0') * 10 + (o - b'0')) as u16, at)?
                        }
                        _ => return Err(SmilesError::InvalidRingNumber(at)),
                    }
                }
                b'0'..=b'9' => {
                    self.pos += 1;
                    self.ring_bond((ch - b'0') as u16, at)?;
                }
                b'[' => {
                    let atom = self.bracket_atom()?;
                    self.push_atom(atom)?;
                }
                _ => {
                    let atom = self.organic_atom()?;
                    self.push_atom(atom)?;
                }
            }
        }
        Ok(())
    }

    fn bond_symbol(&mut self, order: BondOrder) -> Result<(), SmilesError> {
        let at = self.pos;
        if self.prev.is_none() || self.pending.is_some() {
            return Err(SmilesError::Dangling("bond", at));
        }
        self.pending = Some((order, at));
        self.pos += 1;
        Ok(())
    }

    fn push_atom(&mut self, atom: Atom) -> Result<(), SmilesError> {
        let idx = self.atoms.len();
        self.atoms.push(atom);
        if let Some(prev) = self.prev {
            let explicit = self.pending.take().map(|(order, _)| order);
            let order = explicit.unwrap_or_else(|| self.implied_order(prev, idx));
            self.bonds.push(Bond { a: prev, b: idx, order });
        }
        self.prev = Some(idx);
        Ok(())
    }

    fn implied_order(&self, a: usize, b: usize) -> BondOrder {
        if self.atoms[a].aromatic && self.atoms[b].aromatic {
            BondOrder::Aromatic
        } else {
            BondOrder::Single
        }
    }

    fn ring_bond(&mut self, number: u16, at: usize) -> Result<(), SmilesError> {
        let current = self.prev.ok_or(SmilesError::Dangling("ring bond", at))?;
        let explicit = self.pending.take().map(|(order, _)| order);

        match self.rings.remove(&number) {
            Some(open) => {
                if open.atom == current {
                    return Err(self.unexpected(at));
                }
                let order = match (open.order, explicit) {
                    (Some(a), Some(b)) if a != b => return Err(self.unexpected(at)),
                    (Some(o), _) | (None, Some(o)) => o,
                    (None, None) => self.implied_order(open.atom, current),
                };
                self.bonds.push(Bond { a: open.atom, b: current, order });
            }
            None => {
                self.rings.insert(number, OpenRing { atom: current, order: explicit });
            }
        }
        Ok(())
    }

    fn organic_atom(&mut self) -> Result<Atom, SmilesError> {
        let at = self.pos;
        let ch = self.bump().ok_or_else(|| self.unexpected(at))?;
        let next = self.peek();

        let (symbol, aromatic) = match (ch, next) {
            (b'B', Some(b'r')) => ("Br", false),
            (b'C', Some(b'l')) => ("Cl", false),
            (b'B', _) => ("B", false),
            (b'C', _) => ("C", false),
            (b'N', _) => ("N", false),
            (b'O', _) => ("O", false),
            (b'P', _) => ("P", false),
            (b'S', _) => ("S", false),
            (b'F', _) => ("F", false),
            (b'I', _) => ("I", false),
            (b'b', _) => ("B", true),
            (b'c', _) => ("C", true),
            (b'n', _) => ("N", true),
            (b'o', _) => ("O", true),
            (b'p', _) => ("P", true),
            (b's', _) => ("S", true),
            _ => return Err(self.unexpected(at)),
        };
        if symbol.len() == 2 {
            self.pos += 1;
        }

        let atomic_number =
            atomic_number(symbol).ok_or_else(|| SmilesError::UnknownElement(symbol.to_string()))?;
        Ok(Atom { atomic_number, charge: 0, aromatic, hydrogens: 0, bracket: false })
    }

    fn bracket_atom(&mut self) -> Result<Atom, SmilesError> {
        let start = self.pos;
        self.pos += 1;

        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }

        let first = self.bump().ok_or(SmilesError::UnclosedBracket(start))?;
        let (symbol, aromatic) = if first.is_ascii_lowercase() {
            // aromatic: b c n o p s, plus se / as
            let two = self.peek().filter(|c| c.is_ascii_lowercase()).map(|second| {
                format!("{}{}", first.to_ascii_uppercase() as char, second as char)
            });
            if let Some(symbol) = two.filter(|s| s == "Se" || s == "As") {
                self.pos += 1;
                (symbol, true)
            } else if b"bcnops".contains(&first) {
                ((first.to_ascii_uppercase() as char).to_string(), true)
            } else {
                return Err(SmilesError::UnknownElement((first as char).to_string()));
            }
        } else if first.is_ascii_uppercase() {
            let mut symbol = (first as char).to_string();
            if let Some(second) = self.peek().filter(|c| c.is_ascii_lowercase()) {
                let two = format!("{}{}", first as char, second as char);
                if atomic_number(&two).is_some() {
                    self.pos += 1;
                    symbol = two;
                }
            }
            (symbol, false)
        } else {
            return Err(self.unexpected(self.pos - 1));
        };
        let atomic_number =
            atomic_number(&symbol).ok_or_else(|| SmilesError::UnknownElement(symbol.clone()))?;

        while self.peek() == Some(b'@') {
            self.pos += 1;
        }

        let mut hydrogens = 0u8;
        if self.peek() == Some(b'H') {
            self.pos += 1;
            hydrogens = match self.peek() {
                Some(d) if d.is_ascii_digit() => {
                    self.pos += 1;
                    d - b'0'
                }
                _ => 1,
            };
        }

        let mut charge = 0i8;
        if let Some(sign @ (b'+' | b'-')) = self.peek() {
            self.pos += 1;
            let unit: i8 = if sign == b'+' { 1 } else { -1 };
            charge = unit;
            match self.peek() {
                Some(d) if d.is_ascii_digit() => {
                    self.pos += 1;
                    charge = unit * (d - b'0') as i8;
                }
                _ => {
                    while self.peek() == Some(sign) {
                        self.pos += 1;
                        charge = charge
                            .checked_add(unit)
                            .ok_or(SmilesError::ChargeOutOfRange(start))?;
                    }
                }
            }
        }

        if self.peek() == Some(b':') {
            self.pos += 1;
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1;
            }
        }

        match self.bump() {
            Some(b']') => Ok(Atom { atomic_number, charge, aromatic, hydrogens, bracket: true }),
            Some(_) => Err(self.unexpected(self.pos - 1)),
            None => Err(SmilesError::UnclosedBracket(start)),
        }
    }

    fn finish(mut self) -> Result<Molecule, SmilesError> {
        if let Some((_, at)) = self.pending {
            return Err(SmilesError::Dangling("bond", at));
        }
        if !self.rings.is_empty() {
            return Err(SmilesError::UnclosedRing(self.rings.keys().copied().collect()));
        }
        if !self.branches.is_empty() {
            return Err(SmilesError::UnbalancedParentheses);
        }
        self.fill_implicit_hydrogens()?;
        Ok(Molecule::new(self.atoms, self.bonds))
    }

    fn fill_implicit_hydrogens(&mut self) -> Result<(), SmilesError> {
        let mut used = vec![0u8; self.atoms.len()];
        for bond in &self.bonds {
            for end in [bond.a, bond.b] {
                used[end] = used[end]
                    .checked_add(bond.order.valence())
                    .ok_or(SmilesError::ValenceOverflow(end))?;
            }
        }

        for (idx, (atom, used)) in self.atoms.iter_mut().zip(used).enumerate() {
            if atom.bracket {
                continue;
            }
            let used = used
                .checked_add(atom.aromatic as u8)
                .ok_or(SmilesError::ValenceOverflow(idx))?;
            if let Some(&valence) = default_valences(atom.atomic_number).iter().find(|&&v| v >= used) {
                atom.hydrogens = valence - used;
            }
        }
        Ok(())
    }
}
