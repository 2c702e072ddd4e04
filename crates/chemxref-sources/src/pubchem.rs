//! PubChem PUG REST client, used as the last-resort structure source.
//!
//! Endpoint: https://pubchem.ncbi.nlm.nih.gov/rest/pug/compound/name/{name}/property/CanonicalSMILES,IsomericSMILES/JSON
//!
//! PubChem has been renaming its SMILES properties (`CanonicalSMILES` →
//! `ConnectivitySMILES`, `IsomericSMILES` → `SMILES`), so every known key is
//! accepted.

use async_trait::async_trait;
use chemxref_common::sandbox::SandboxClient as Client;
use chemxref_common::{Result, XrefError};
use tracing::{debug, instrument};
use url::Url;

use crate::StructureLookup;

pub const PUBCHEM_URL: &str = "https://pubchem.ncbi.nlm.nih.gov/rest/pug";

const SMILES_KEYS: [&str; 4] = ["CanonicalSMILES", "ConnectivitySMILES", "IsomericSMILES", "SMILES"];

pub struct PubChemClient {
    client: Client,
    base_url: String,
}

impl PubChemClient {
    pub fn new(client: Client) -> Self {
        Self { client, base_url: PUBCHEM_URL.to_string() }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self.client.allow_url_host(&self.base_url);
        self
    }

    /// Names may contain spaces and slashes, so they go in as an encoded
    /// path segment.
    pub fn property_url(&self, name: &str) -> Result<String> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| XrefError::Config(format!("Invalid PubChem base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| XrefError::Config("PubChem base URL cannot be a base".into()))?
            .extend(["compound", "name", name, "property", "CanonicalSMILES,IsomericSMILES", "JSON"]);
        Ok(url.to_string())
    }
}

#[async_trait]
impl StructureLookup for PubChemClient {
    #[instrument(skip(self))]
    async fn smiles_by_name(&self, name: &str) -> Result<Option<String>> {
        let url = self.property_url(name)?;
        let resp = self.client.get(&url)?.send().await?;

        if !resp.status().is_success() {
            debug!(status = %resp.status(), name, "PubChem has no compound for name");
            return Ok(None);
        }

        let body: serde_json::Value = resp.json().await?;
        Ok(first_smiles(&body))
    }
}

/// First SMILES in a `PropertyTable` response.
pub fn first_smiles(body: &serde_json::Value) -> Option<String> {
    let first = body["PropertyTable"]["Properties"].as_array()?.first()?;
    SMILES_KEYS
        .iter()
        .find_map(|key| first[*key].as_str())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_property_url_encodes_name() {
        let client = PubChemClient::new(Client::new().unwrap());
        let url = client.property_url("acetylsalicylic acid").unwrap();
        assert_eq!(
            url,
            "https://pubchem.ncbi.nlm.nih.gov/rest/pug/compound/name/acetylsalicylic%20acid/property/CanonicalSMILES,IsomericSMILES/JSON"
        );
    }

    #[test]
    fn test_first_smiles_prefers_canonical() {
        let body = json!({"PropertyTable": {"Properties": [
            {"CID": 2244, "IsomericSMILES": "iso", "CanonicalSMILES": "CC(=O)OC1=CC=CC=C1C(=O)O"}
        ]}});
        assert_eq!(first_smiles(&body).as_deref(), Some("CC(=O)OC1=CC=CC=C1C(=O)O"));
    }

    #[test]
    fn test_first_smiles_renamed_keys() {
        let body = json!({"PropertyTable": {"Properties": [
            {"CID": 2244, "ConnectivitySMILES": "CC(=O)OC1=CC=CC=C1C(=O)O"}
        ]}});
        assert!(first_smiles(&body).is_some());
        assert_eq!(first_smiles(&json!({"Fault": {"Code": "PUGREST.NotFound"}})), None);
    }
}
