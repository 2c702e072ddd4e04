//! External catalog clients.
//!
//! Each capability the resolver depends on is a trait so the fallback chain
//! can be driven by live HTTP clients in production and by fakes in tests.
//!
//! | Capability                | Client             |
//! |---------------------------|--------------------|
//! | DrugBank detail page      | [`drugbank`]       |
//! | Cross-reference (UniChem) | [`unichem`]        |
//! | ChEMBL molecule search    | [`chembl`]         |
//! | PubChem name → SMILES     | [`pubchem`]        |
//! | Interactive browser flow  | [`webdriver`]      |

pub mod drugbank;
pub mod unichem;
pub mod chembl;
pub mod pubchem;
pub mod webdriver;

use async_trait::async_trait;
use chemxref_common::Result;
use serde::{Deserialize, Serialize};

// ── Detail page (primary catalog) ─────────────────────────────────────────────

/// Labeled fields scraped from a DrugBank drug page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrugPage {
    pub drugbank_id: String,
    pub name: Option<String>,
    pub chembl_id: Option<String>,
    pub smiles: Option<String>,
}

#[async_trait]
pub trait DetailPageSource: Send + Sync {
    /// Fetch the detail page for a DrugBank id. `Ok(None)` when the page
    /// does not exist.
    async fn fetch_drug(&self, drugbank_id: &str) -> Result<Option<DrugPage>>;
}

// ── Cross-reference service ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    DrugBankToChembl,
    ChemblToDrugBank,
}

#[async_trait]
pub trait CrossReferenceService: Send + Sync {
    /// Candidate identifiers in the target catalog, best first.
    async fn lookup(&self, id: &str, direction: Direction) -> Result<Vec<String>>;
}

// ── Molecule catalog (secondary catalog) ──────────────────────────────────────

/// One molecule returned by a catalog search or fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogHit {
    pub id: String,
    pub name: Option<String>,
    pub smiles: Option<String>,
}

#[async_trait]
pub trait MoleculeCatalog: Send + Sync {
    /// Free-text search by display name.
    async fn search(&self, name: &str) -> Result<Vec<CatalogHit>>;

    /// Fetch a single molecule by catalog id.
    async fn fetch_molecule(&self, id: &str) -> Result<Option<CatalogHit>>;
}

// ── Structure lookup (tertiary catalog) ───────────────────────────────────────

#[async_trait]
pub trait StructureLookup: Send + Sync {
    async fn smiles_by_name(&self, name: &str) -> Result<Option<String>>;
}

// ── Interactive browser session ───────────────────────────────────────────────

/// Where an interactive search ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Landing {
    pub drugbank_id: String,
    /// True when the search hit a listing page and the first result was
    /// clicked.
    pub via_listing: bool,
}

#[async_trait]
pub trait BrowseSession: Send {
    /// Type `name` into the catalog search box and follow the result to a
    /// detail page. `Ok(None)` when no detail page could be reached.
    async fn search_and_land(&mut self, name: &str) -> Result<Option<Landing>>;

    /// Terminate the browser session.
    async fn quit(&mut self) -> Result<()>;
}

#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowseSession>>;
}
