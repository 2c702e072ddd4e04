//! DrugBank detail-page scraper.
//!
//! DrugBank has no open API, so the public drug page is fetched and the
//! `<dt>label</dt><dd>value</dd>` pairs are read from it.
//!
//! Page: https://go.drugbank.com/drugs/{DBxxxxx}
//!
//! Fields used:
//!   - `Name`   → display name (name-search fallback)
//!   - `ChEMBL` → cross-reference (fast path)
//!   - `SMILES` → structure string

use async_trait::async_trait;
use chemxref_common::entities::{normalise_id, IdentifierKind};
use chemxref_common::sandbox::SandboxClient as Client;
use chemxref_common::Result;
use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};

use crate::{DetailPageSource, DrugPage};

pub const DRUGBANK_URL: &str = "https://go.drugbank.com";

const NOT_AVAILABLE: &str = "Not Available";

lazy_static! {
    static ref DT: Selector = Selector::parse("dt").unwrap();
}

pub struct DrugBankClient {
    client: Client,
    base_url: String,
}

impl DrugBankClient {
    pub fn new(client: Client) -> Self {
        Self { client, base_url: DRUGBANK_URL.to_string() }
    }

    /// Point the client at a mirror.
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self.client.allow_url_host(&self.base_url);
        self
    }

    pub fn drug_url(&self, drugbank_id: &str) -> String {
        format!("{}/drugs/{}", self.base_url, drugbank_id)
    }
}

#[async_trait]
impl DetailPageSource for DrugBankClient {
    #[instrument(skip(self))]
    async fn fetch_drug(&self, drugbank_id: &str) -> Result<Option<DrugPage>> {
        let url = self.drug_url(drugbank_id);
        debug!(drugbank_id, "Fetching DrugBank page");

        let resp = self.client.get(&url)?.send().await?;
        if !resp.status().is_success() {
            debug!(status = %resp.status(), drugbank_id, "DrugBank page not available");
            return Ok(None);
        }

        let html = resp.text().await?;
        Ok(Some(parse_drug_page(drugbank_id, &html)))
    }
}

/// Extract the fields we care about from a DrugBank page.
pub fn parse_drug_page(drugbank_id: &str, html: &str) -> DrugPage {
    let document = Html::parse_document(html);

    let chembl_id = field_value(&document, "ChEMBL")
        .map(|v| normalise_id(&v))
        .filter(|v| IdentifierKind::detect(v) == Some(IdentifierKind::Chembl));

    DrugPage {
        drugbank_id: drugbank_id.to_string(),
        name: field_value(&document, "Name"),
        chembl_id,
        smiles: field_value(&document, "SMILES"),
    }
}

/// Text of the `<dd>` following the `<dt>` whose text is exactly `label`.
fn field_value(document: &Html, label: &str) -> Option<String> {
    let dt = document
        .select(&DT)
        .find(|dt| dt.text().collect::<String>().trim() == label)?;

    let dd = dt
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "dd")?;

    let value = dd.text().collect::<String>().trim().to_string();
    if value.is_empty() || value == NOT_AVAILABLE {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <dl>
            <dt id="name">Name</dt>
            <dd class="col-xl-10">Aspirin</dd>
            <dt id="smiles">SMILES</dt>
            <dd><div class="wrap">CC(=O)OC1=CC=CC=C1C(O)=O</div></dd>
            <dt id="chembl">ChEMBL</dt>
            <dd><a href="https://www.ebi.ac.uk/chembldb/index.php/compound/inspect/CHEMBL25">CHEMBL25</a></dd>
          </dl>
        </body></html>
    "#;

    #[test]
    fn test_parse_all_fields() {
        let page = parse_drug_page("DB00945", PAGE);
        assert_eq!(page.drugbank_id, "DB00945");
        assert_eq!(page.name.as_deref(), Some("Aspirin"));
        assert_eq!(page.chembl_id.as_deref(), Some("CHEMBL25"));
        assert_eq!(page.smiles.as_deref(), Some("CC(=O)OC1=CC=CC=C1C(O)=O"));
    }

    #[test]
    fn test_not_available_is_none() {
        let html = r#"<dl><dt>Name</dt><dd>Insulin human</dd>
                      <dt>SMILES</dt><dd>Not Available</dd></dl>"#;
        let page = parse_drug_page("DB00030", html);
        assert_eq!(page.name.as_deref(), Some("Insulin human"));
        assert_eq!(page.smiles, None);
        assert_eq!(page.chembl_id, None);
    }

    #[test]
    fn test_label_must_match_exactly() {
        // "ChEMBL ID" is not the "ChEMBL" field
        let html = r#"<dl><dt>ChEMBL ID</dt><dd>CHEMBL1</dd></dl>"#;
        assert_eq!(parse_drug_page("DB1", html).chembl_id, None);
    }

    #[test]
    fn test_malformed_chembl_value_dropped() {
        let html = r#"<dl><dt>ChEMBL</dt><dd>see ChEMBL</dd></dl>"#;
        assert_eq!(parse_drug_page("DB1", html).chembl_id, None);
    }

    #[test]
    fn test_drug_url() {
        let client = DrugBankClient::new(Client::new().unwrap())
            .with_base_url("https://www.drugbank.ca/");
        assert_eq!(client.drug_url("DB00945"), "https://www.drugbank.ca/drugs/DB00945");
    }

    #[tokio::test]
    #[ignore = "Hits external DrugBank site"]
    async fn test_fetch_aspirin() {
        let client = DrugBankClient::new(Client::new().unwrap());
        let page = client.fetch_drug("DB00945").await.unwrap().unwrap();
        assert_eq!(page.chembl_id.as_deref(), Some("CHEMBL25"));
    }
}
