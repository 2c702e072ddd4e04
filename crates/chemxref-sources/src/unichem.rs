//! UniChem cross-reference client.
//!
//! UniChem maps compound identifiers between chemistry sources.
//! Source numbers used here: 1 = ChEMBL, 2 = DrugBank.
//!
//! Endpoint: https://www.ebi.ac.uk/unichem/rest/src_compound_id/{id}/{src}/{dst}
//! Response: `[{"src_compound_id": "CHEMBL25"}, ...]`, or `[]` / an error
//! object when there is no mapping.

use async_trait::async_trait;
use chemxref_common::entities::normalise_id;
use chemxref_common::sandbox::SandboxClient as Client;
use chemxref_common::Result;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{CrossReferenceService, Direction};

pub const UNICHEM_URL: &str = "https://www.ebi.ac.uk/unichem/rest";

const SRC_CHEMBL: u8 = 1;
const SRC_DRUGBANK: u8 = 2;

#[derive(Debug, Deserialize)]
struct UniChemMapping {
    src_compound_id: String,
}

pub struct UniChemClient {
    client: Client,
    base_url: String,
}

impl UniChemClient {
    pub fn new(client: Client) -> Self {
        Self { client, base_url: UNICHEM_URL.to_string() }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self.client.allow_url_host(&self.base_url);
        self
    }

    pub fn lookup_url(&self, id: &str, direction: Direction) -> String {
        let (src, dst) = match direction {
            Direction::DrugBankToChembl => (SRC_DRUGBANK, SRC_CHEMBL),
            Direction::ChemblToDrugBank => (SRC_CHEMBL, SRC_DRUGBANK),
        };
        format!("{}/src_compound_id/{}/{}/{}", self.base_url, id, src, dst)
    }
}

#[async_trait]
impl CrossReferenceService for UniChemClient {
    #[instrument(skip(self))]
    async fn lookup(&self, id: &str, direction: Direction) -> Result<Vec<String>> {
        let url = self.lookup_url(id, direction);
        let resp = self.client.get(&url)?.send().await?;

        if !resp.status().is_success() {
            debug!(status = %resp.status(), id, "UniChem returned no mapping");
            return Ok(Vec::new());
        }

        let body: serde_json::Value = resp.json().await?;
        Ok(parse_mappings(body))
    }
}

/// UniChem answers "no mapping" with an error object instead of `[]`, so
/// anything that is not an array of mappings is treated as empty.
pub fn parse_mappings(body: serde_json::Value) -> Vec<String> {
    serde_json::from_value::<Vec<UniChemMapping>>(body)
        .map(|rows| {
            rows.into_iter()
                .map(|m| normalise_id(&m.src_compound_id))
                .filter(|id| !id.is_empty())
                .collect()
        })
        .unwrap_or_default()
}
