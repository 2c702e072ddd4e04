//! ChEMBL API client.
//!
//! ChEMBL is a database of bioactive molecules with drug-like properties.
//! Here it serves two purposes:
//!   - name search, used when DrugBank → ChEMBL has no direct cross-reference
//!   - molecule fetch, giving the preferred name and canonical SMILES
//!
//! API docs: https://chembl.gitbook.io/chembl-interface-documentation/web-resources/chembl-api
//! Endpoint: https://www.ebi.ac.uk/chembl/api/data

use async_trait::async_trait;
use chemxref_common::entities::normalise_id;
use chemxref_common::sandbox::SandboxClient as Client;
use chemxref_common::Result;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{CatalogHit, MoleculeCatalog};

pub const CHEMBL_API_URL: &str = "https://www.ebi.ac.uk/chembl/api/data";

#[derive(Debug, Deserialize)]
struct ChemblSearchResponse {
    #[serde(default)]
    molecules: Vec<ChemblMoleculeData>,
}

#[derive(Debug, Deserialize)]
struct ChemblMoleculeData {
    molecule_chembl_id: String,
    pref_name: Option<String>,
    molecule_structures: Option<ChemblMoleculeStructures>,
}

#[derive(Debug, Deserialize)]
struct ChemblMoleculeStructures {
    canonical_smiles: Option<String>,
}

impl From<ChemblMoleculeData> for CatalogHit {
    fn from(m: ChemblMoleculeData) -> Self {
        CatalogHit {
            id: normalise_id(&m.molecule_chembl_id),
            name: m.pref_name,
            smiles: m.molecule_structures.and_then(|s| s.canonical_smiles),
        }
    }
}

/// ChEMBL client for molecule lookups.
pub struct ChemblClient {
    client: Client,
    base_url: String,
}

impl ChemblClient {
    pub fn new(client: Client) -> Self {
        Self { client, base_url: CHEMBL_API_URL.to_string() }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self.client.allow_url_host(&self.base_url);
        self
    }
}

#[async_trait]
impl MoleculeCatalog for ChemblClient {
    /// Search molecules by free text (name, synonym, trade name).
    #[instrument(skip(self))]
    async fn search(&self, name: &str) -> Result<Vec<CatalogHit>> {
        let url = format!("{}/molecule/search.json", self.base_url);
        debug!(name, "Searching ChEMBL molecules");

        let resp = self.client
            .get(&url)?
            .header("Accept", "application/json")
            .query(&[("q", name)])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Ok(Vec::new());
        }

        let body: ChemblSearchResponse = resp.json().await?;
        Ok(body.molecules.into_iter().map(CatalogHit::from).collect())
    }

    /// Fetch molecule by ChEMBL ID.
    #[instrument(skip(self))]
    async fn fetch_molecule(&self, id: &str) -> Result<Option<CatalogHit>> {
        let url = format!("{}/molecule/{}.json", self.base_url, id);
        debug!(chembl_id = id, "Fetching ChEMBL molecule");

        let resp = self.client
            .get(&url)?
            .header("Accept", "application/json")
            .send()
            .await?;

        if !resp.status().is_success() {
            return Ok(None);
        }

        let molecule: ChemblMoleculeData = resp.json().await?;
        Ok(Some(molecule.into()))
    }
}
