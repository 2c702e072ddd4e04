//! In-memory fakes for the external catalogs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chemxref_common::{Result, XrefError};
use chemxref_sources::{
    BrowseSession, BrowserLauncher, CatalogHit, CrossReferenceService, DetailPageSource, Direction,
    DrugPage, Landing, MoleculeCatalog, StructureLookup,
};

/// Ordered log of every external call, shared between fakes.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, call: String) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }
}

#[derive(Default)]
pub struct FakeDrugBank {
    pub pages: HashMap<String, DrugPage>,
    pub unavailable: bool,
    pub log: CallLog,
}

impl FakeDrugBank {
    pub fn with_page(mut self, page: DrugPage) -> Self {
        self.pages.insert(page.drugbank_id.clone(), page);
        self
    }
}

#[async_trait]
impl DetailPageSource for FakeDrugBank {
    async fn fetch_drug(&self, drugbank_id: &str) -> Result<Option<DrugPage>> {
        self.log.push(format!("drugbank:{}", drugbank_id));
        if self.unavailable {
            return Err(XrefError::SourceUnavailable("drugbank down".into()));
        }
        Ok(self.pages.get(drugbank_id).cloned())
    }
}

#[derive(Default)]
pub struct FakeUniChem {
    pub mappings: HashMap<(String, Direction), Vec<String>>,
    pub unavailable: bool,
    pub log: CallLog,
}

impl FakeUniChem {
    pub fn with_mapping(mut self, id: &str, direction: Direction, ids: &[&str]) -> Self {
        self.mappings.insert(
            (id.to_string(), direction),
            ids.iter().map(|s| s.to_string()).collect(),
        );
        self
    }
}

#[async_trait]
impl CrossReferenceService for FakeUniChem {
    async fn lookup(&self, id: &str, direction: Direction) -> Result<Vec<String>> {
        self.log.push(format!("unichem:{}", id));
        if self.unavailable {
            return Err(XrefError::SourceUnavailable("unichem down".into()));
        }
        Ok(self.mappings.get(&(id.to_string(), direction)).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct FakeChembl {
    pub searches: HashMap<String, Vec<CatalogHit>>,
    pub molecules: HashMap<String, CatalogHit>,
    pub log: CallLog,
}

impl FakeChembl {
    pub fn with_search(mut self, name: &str, hits: Vec<CatalogHit>) -> Self {
        self.searches.insert(name.to_string(), hits);
        self
    }

    pub fn with_molecule(mut self, hit: CatalogHit) -> Self {
        self.molecules.insert(hit.id.clone(), hit);
        self
    }
}

#[async_trait]
impl MoleculeCatalog for FakeChembl {
    async fn search(&self, name: &str) -> Result<Vec<CatalogHit>> {
        self.log.push(format!("chembl_search:{}", name));
        Ok(self.searches.get(name).cloned().unwrap_or_default())
    }

    async fn fetch_molecule(&self, id: &str) -> Result<Option<CatalogHit>> {
        self.log.push(format!("chembl_fetch:{}", id));
        Ok(self.molecules.get(id).cloned())
    }
}

#[derive(Default)]
pub struct FakePubChem {
    pub smiles: HashMap<String, String>,
    pub log: CallLog,
}

#[async_trait]
impl StructureLookup for FakePubChem {
    async fn smiles_by_name(&self, name: &str) -> Result<Option<String>> {
        self.log.push(format!("pubchem:{}", name));
        Ok(self.smiles.get(name).cloned())
    }
}

#[derive(Default)]
pub(crate) struct LauncherState {
    launches: AtomicUsize,
    quits: AtomicUsize,
}

#[derive(Default)]
pub struct FakeLauncher {
    pub landings: HashMap<String, Landing>,
    pub fail: bool,
    pub log: CallLog,
    pub(crate) state: Arc<LauncherState>,
}

impl FakeLauncher {
    pub fn failing() -> Self {
        Self { fail: true, ..Default::default() }
    }

    pub fn with_landing(mut self, name: &str, id: &str, via_listing: bool) -> Self {
        self.landings.insert(
            name.to_string(),
            Landing { drugbank_id: id.to_string(), via_listing },
        );
        self
    }

    pub fn launches(&self) -> usize {
        self.state.launches.load(Ordering::SeqCst)
    }

    pub fn quits(&self) -> usize {
        self.state.quits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowseSession>> {
        self.state.launches.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(XrefError::Session("no chromedriver".into()));
        }
        Ok(Box::new(FakeSession {
            landings: self.landings.clone(),
            log: self.log.clone(),
            state: self.state.clone(),
        }))
    }
}

struct FakeSession {
    landings: HashMap<String, Landing>,
    log: CallLog,
    state: Arc<LauncherState>,
}

#[async_trait]
impl BrowseSession for FakeSession {
    async fn search_and_land(&mut self, name: &str) -> Result<Option<Landing>> {
        self.log.push(format!("browser:{}", name));
        Ok(self.landings.get(name).cloned())
    }

    async fn quit(&mut self) -> Result<()> {
        self.state.quits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn page(id: &str, name: Option<&str>, chembl: Option<&str>, smiles: Option<&str>) -> DrugPage {
    DrugPage {
        drugbank_id: id.to_string(),
        name: name.map(String::from),
        chembl_id: chembl.map(String::from),
        smiles: smiles.map(String::from),
    }
}

pub fn hit(id: &str, name: Option<&str>, smiles: Option<&str>) -> CatalogHit {
    CatalogHit {
        id: id.to_string(),
        name: name.map(String::from),
        smiles: smiles.map(String::from),
    }
}
