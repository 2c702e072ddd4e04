//! Wires the catalog clients from configuration and runs the passes:
//! resolve identifiers, fetch structures, compute similarity.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chemxref_common::entities::DrugRecord;
use chemxref_common::sandbox::SandboxClient;
use chemxref_common::{Result, XrefError};
use chemxref_resolver::{
    apply_structures, resolve_batch, BatchReport, RemapTable, Resolver, StructureFetcher,
};
use chemxref_similarity::similarity_for_records;
use chemxref_sources::chembl::ChemblClient;
use chemxref_sources::drugbank::DrugBankClient;
use chemxref_sources::pubchem::PubChemClient;
use chemxref_sources::unichem::UniChemClient;
use chemxref_sources::webdriver::WebDriverLauncher;
use chemxref_sources::{BrowseSession, BrowserLauncher};
use chrono::Utc;
use tracing::info;

use crate::config::{Config, SimilarityConfig};
use crate::io::{Report, SimilaritySection};

/// Launcher used when `[browser] enabled = false`.
struct DisabledBrowser;

#[async_trait]
impl BrowserLauncher for DisabledBrowser {
    async fn launch(&self) -> Result<Box<dyn BrowseSession>> {
        Err(XrefError::Session("browser fallback disabled in configuration".into()))
    }
}

pub struct Pipeline {
    resolver: Resolver,
    fetcher: StructureFetcher,
    launcher: Arc<dyn BrowserLauncher>,
    similarity: SimilarityConfig,
}

impl Pipeline {
    pub fn new(
        resolver: Resolver,
        fetcher: StructureFetcher,
        launcher: Arc<dyn BrowserLauncher>,
        similarity: SimilarityConfig,
    ) -> Self {
        Self { resolver, fetcher, launcher, similarity }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let sources = &config.sources;
        let client = SandboxClient::with_timeout(Duration::from_secs(sources.timeout_secs))?;

        let drugbank = Arc::new(DrugBankClient::new(client.clone()).with_base_url(&sources.drugbank_url));
        let unichem = Arc::new(UniChemClient::new(client.clone()).with_base_url(&sources.unichem_url));
        let chembl = Arc::new(ChemblClient::new(client.clone()).with_base_url(&sources.chembl_url));
        let pubchem = Arc::new(PubChemClient::new(client.clone()).with_base_url(&sources.pubchem_url));

        let mut remap = RemapTable::builtin();
        remap.extend(&config.remap);
        info!(entries = remap.len(), "ChEMBL remap table ready");

        let launcher: Arc<dyn BrowserLauncher> = if config.browser.enabled {
            let options = config.browser.webdriver_options(&sources.drugbank_url);
            Arc::new(WebDriverLauncher::new(client, options))
        } else {
            info!("Interactive DrugBank search disabled");
            Arc::new(DisabledBrowser)
        };

        let resolver = Resolver::new(drugbank.clone(), unichem, chembl.clone()).with_remap(remap.clone());
        let fetcher = StructureFetcher::new(drugbank, chembl, pubchem).with_remap(remap);

        Ok(Self::new(resolver, fetcher, launcher, config.similarity.clone()))
    }

    pub async fn resolve(&self, records: &mut [DrugRecord]) -> BatchReport {
        resolve_batch(&self.resolver, self.launcher.clone(), records).await
    }

    /// All three passes. Records come back resolved and annotated with SMILES.
    pub async fn run(&self, mut records: Vec<DrugRecord>) -> Report {
        let batch = self.resolve(&mut records).await;

        let structures = self.fetcher.fetch_structures(&records).await;
        apply_structures(&mut records, &structures);

        let capability = self.similarity.capability();
        let result = similarity_for_records(&records, &capability, self.similarity.policy);

        Report {
            generated_at: Utc::now(),
            batch,
            similarity: Some(SimilaritySection::new(self.similarity.policy, result)),
            records,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chemxref_resolver::SessionState;
    use chemxref_similarity::MissingPolicy;
    use chemxref_sources::{
        CatalogHit, CrossReferenceService, DetailPageSource, Direction, DrugPage, MoleculeCatalog,
        StructureLookup,
    };

    /// One offline catalog standing in for every source.
    struct Offline;

    #[async_trait]
    impl DetailPageSource for Offline {
        async fn fetch_drug(&self, drugbank_id: &str) -> Result<Option<DrugPage>> {
            Ok((drugbank_id == "DB00945").then(|| DrugPage {
                drugbank_id: "DB00945".into(),
                name: Some("Aspirin".into()),
                chembl_id: Some("CHEMBL25".into()),
                smiles: Some("CC(=O)OC1=CC=CC=C1C(=O)O".into()),
            }))
        }
    }

    #[async_trait]
    impl CrossReferenceService for Offline {
        async fn lookup(&self, id: &str, direction: Direction) -> Result<Vec<String>> {
            match (id, direction) {
                ("CHEMBL424", Direction::ChemblToDrugBank) => Ok(vec!["DB00936".into()]),
                _ => Err(XrefError::SourceUnavailable("offline".into())),
            }
        }
    }

    #[async_trait]
    impl MoleculeCatalog for Offline {
        async fn search(&self, _name: &str) -> Result<Vec<CatalogHit>> {
            Ok(Vec::new())
        }

        async fn fetch_molecule(&self, id: &str) -> Result<Option<CatalogHit>> {
            Ok((id == "CHEMBL424").then(|| CatalogHit {
                id: id.into(),
                name: Some("SALICYLIC ACID".into()),
                smiles: Some("OC(=O)C1=CC=CC=C1O".into()),
            }))
        }
    }

    #[async_trait]
    impl StructureLookup for Offline {
        async fn smiles_by_name(&self, _name: &str) -> Result<Option<String>> {
            Ok(None)
        }
    }

    fn pipeline(policy: MissingPolicy) -> Pipeline {
        let offline = Arc::new(Offline);
        Pipeline::new(
            Resolver::new(offline.clone(), offline.clone(), offline.clone()),
            StructureFetcher::new(offline.clone(), offline.clone(), offline),
            Arc::new(DisabledBrowser),
            SimilarityConfig { policy, ..Default::default() },
        )
    }

    fn records() -> Vec<DrugRecord> {
        ["DB00945", "CHEMBL424", "CHEMBL999"]
            .iter()
            .map(|id| DrugRecord::from_identifier(id, None).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_end_to_end_keep_and_zero() {
        let report = pipeline(MissingPolicy::KeepAndZero).run(records()).await;

        assert_eq!(report.records[0].identifier_pair(), (Some("DB00945"), Some("CHEMBL25")));
        assert_eq!(report.records[1].identifier_pair(), (Some("DB00936"), Some("CHEMBL424")));
        assert_eq!(report.records[2].identifier_pair(), (None, Some("CHEMBL999")));
        assert_eq!(report.batch.resolved, 2);
        assert_eq!(report.batch.unresolved, 1);
        assert_eq!(report.batch.session_state, SessionState::Terminated);

        let sim = report.similarity.unwrap();
        assert_eq!(sim.matrix.len(), 3);
        assert!(sim.matrix[0][1] > 0.0 && sim.matrix[0][1] < 1.0);
        assert_eq!(sim.matrix[0][2], 0.0);
        assert_eq!(sim.matrix[2][2], 1.0);
    }

    #[tokio::test]
    async fn test_end_to_end_drop_missing() {
        let report = pipeline(MissingPolicy::DropMissing).run(records()).await;
        let sim = report.similarity.unwrap();
        assert_eq!(sim.matrix.len(), 2);
        assert_eq!(sim.dropped, vec![report.records[2].id]);
    }

    #[test]
    fn test_from_default_config() {
        assert!(Pipeline::from_config(&Config::default()).is_ok());
    }
}
