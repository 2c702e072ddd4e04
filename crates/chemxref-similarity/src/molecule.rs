//! Molecular graph built by the SMILES parser.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Aromatic,
}

impl BondOrder {
    /// Valence consumed on each end. Aromatic bonds count as one; the extra
    /// pi electron is charged to the aromatic atom itself.
    pub fn valence(self) -> u8 {
        match self {
            BondOrder::Single | BondOrder::Aromatic => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atom {
    pub atomic_number: u8,
    pub charge: i8,
    pub aromatic: bool,
    /// Implicit hydrogens for organic-subset atoms, the written count for
    /// bracket atoms.
    pub hydrogens: u8,
    pub bracket: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bond {
    pub a: usize,
    pub b: usize,
    pub order: BondOrder,
}

#[derive(Debug, Clone)]
pub struct Molecule {
    pub atoms: Vec<Atom>,
    pub bonds: Vec<Bond>,
    /// `adjacency[atom] = [(neighbor, bond index)]`
    adjacency: Vec<Vec<(usize, usize)>>,
}

impl Molecule {
    pub fn new(atoms: Vec<Atom>, bonds: Vec<Bond>) -> Self {
        let mut adjacency = vec![Vec::new(); atoms.len()];
        for (i, bond) in bonds.iter().enumerate() {
            adjacency[bond.a].push((bond.b, i));
            adjacency[bond.b].push((bond.a, i));
        }
        Self { atoms, bonds, adjacency }
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    pub fn degree(&self, atom: usize) -> usize {
        self.adjacency[atom].len()
    }

    pub fn neighbors(&self, atom: usize) -> &[(usize, usize)] {
        &self.adjacency[atom]
    }

    /// Atoms that sit on at least one ring bond.
    ///
    /// A bond is a ring bond iff it is not a bridge of the molecular graph,
    /// so this is a bridge search (iterative Tarjan) rather than a ring
    /// perception.
    pub fn ring_atoms(&self) -> Vec<bool> {
        let n = self.atoms.len();
        let mut disc = vec![usize::MAX; n];
        let mut low = vec![0usize; n];
        let mut bridge = vec![false; self.bonds.len()];
        let mut timer = 0;

        for root in 0..n {
            if disc[root] != usize::MAX {
                continue;
            }
            disc[root] = timer;
            low[root] = timer;
            timer += 1;
            // (atom, bond we arrived by, next adjacency slot)
            let mut stack: Vec<(usize, Option<usize>, usize)> = vec![(root, None, 0)];

            while let Some(frame) = stack.last_mut() {
                let (v, via) = (frame.0, frame.1);
                if let Some(&(w, bond)) = self.adjacency[v].get(frame.2) {
                    frame.2 += 1;
                    if Some(bond) == via {
                        continue;
                    }
                    if disc[w] == usize::MAX {
                        disc[w] = timer;
                        low[w] = timer;
                        timer += 1;
                        stack.push((w, Some(bond), 0));
                    } else {
                        low[v] = low[v].min(disc[w]);
                    }
                } else {
                    stack.pop();
                    if let (Some(bond), Some(parent)) = (via, stack.last()) {
                        let u = parent.0;
                        low[u] = low[u].min(low[v]);
                        if low[v] > disc[u] {
                            bridge[bond] = true;
                        }
                    }
                }
            }
        }

        let mut in_ring = vec![false; n];
        for (i, bond) in self.bonds.iter().enumerate() {
            if !bridge[i] {
                in_ring[bond.a] = true;
                in_ring[bond.b] = true;
            }
        }
        in_ring
    }
}
