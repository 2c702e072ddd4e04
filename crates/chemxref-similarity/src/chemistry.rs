use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SmilesError;
use crate::fingerprint::{morgan, tanimoto, Fingerprint};
use crate::molecule::Molecule;
use crate::smiles::parse_smiles;

/// Structure parsing, fingerprinting and pairwise similarity.
///
/// The similarity engine only talks to this trait, so any toolkit that can
/// turn a SMILES string into a comparable fingerprint can be dropped in.
pub trait ChemistryCapability {
    type Molecule;
    type Fingerprint;

    fn parse(&self, smiles: &str) -> Result<Self::Molecule, SmilesError>;

    fn fingerprint(&self, molecule: &Self::Molecule) -> Self::Fingerprint;

    /// Expected in `[0, 1]`. Callers clamp anyway.
    fn similarity(&self, a: &Self::Fingerprint, b: &Self::Fingerprint) -> f64;

    /// Parse and fingerprint, logging and discarding parse failures.
    fn fingerprint_smiles(&self, smiles: &str) -> Option<Self::Fingerprint> {
        match self.parse(smiles) {
            Ok(mol) => Some(self.fingerprint(&mol)),
            Err(e) => {
                debug!(error = %e, smiles, "Unparsable structure, treating as missing");
                None
            }
        }
    }
}

/// In-tree Morgan fingerprints compared by Tanimoto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MorganCapability {
    pub radius: usize,
    pub nbits: usize,
}

impl Default for MorganCapability {
    fn default() -> Self {
        Self { radius: 2, nbits: 2048 }
    }
}

impl ChemistryCapability for MorganCapability {
    type Molecule = Molecule;
    type Fingerprint = Fingerprint;

    fn parse(&self, smiles: &str) -> Result<Molecule, SmilesError> {
        parse_smiles(smiles)
    }

    fn fingerprint(&self, molecule: &Molecule) -> Fingerprint {
        morgan(molecule, self.radius, self.nbits)
    }

    fn similarity(&self, a: &Fingerprint, b: &Fingerprint) -> f64 {
        tanimoto(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_molecules_score_one() {
        let cap = MorganCapability::default();
        let a = cap.fingerprint_smiles("CC(=O)OC1=CC=CC=C1C(=O)O").unwrap();
        let b = cap.fingerprint_smiles("CC(=O)OC1=CC=CC=C1C(=O)O").unwrap();
        assert_eq!(cap.similarity(&a, &b), 1.0);
    }

    #[test]
    fn test_unparsable_is_none() {
        let cap = MorganCapability::default();
        assert!(cap.fingerprint_smiles("C1CC").is_none());
        assert!(cap.fingerprint_smiles("").is_none());
    }

    #[test]
    fn test_nbits_respected() {
        let cap = MorganCapability { radius: 1, nbits: 512 };
        assert_eq!(cap.fingerprint_smiles("CCN").unwrap().nbits(), 512);
    }
}
