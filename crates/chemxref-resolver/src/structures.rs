//! SMILES lookup for resolved records.
//!
//! Sources in order: DrugBank page, ChEMBL molecule, PubChem by name. Results
//! are keyed by [`RecordId`], never by position.

use std::collections::HashMap;
use std::sync::Arc;

use chemxref_common::entities::{DrugRecord, RecordId};
use chemxref_sources::{DetailPageSource, MoleculeCatalog, StructureLookup};
use tracing::{debug, info, instrument};

use crate::remap::RemapTable;

pub struct StructureFetcher {
    detail: Arc<dyn DetailPageSource>,
    catalog: Arc<dyn MoleculeCatalog>,
    pubchem: Arc<dyn StructureLookup>,
    remap: RemapTable,
}

impl StructureFetcher {
    pub fn new(
        detail: Arc<dyn DetailPageSource>,
        catalog: Arc<dyn MoleculeCatalog>,
        pubchem: Arc<dyn StructureLookup>,
    ) -> Self {
        Self { detail, catalog, pubchem, remap: RemapTable::builtin() }
    }

    pub fn with_remap(mut self, remap: RemapTable) -> Self {
        self.remap = remap;
        self
    }

    /// One entry per record. `None` when no source had a structure.
    pub async fn fetch_structures(&self, records: &[DrugRecord]) -> HashMap<RecordId, Option<String>> {
        let mut out = HashMap::with_capacity(records.len());
        for record in records {
            let smiles = self.fetch_one(record).await;
            out.insert(record.id, smiles);
        }
        let found = out.values().filter(|s| s.is_some()).count();
        info!(records = records.len(), found, "Structure fetch finished");
        out
    }

    #[instrument(skip(self, record), fields(record = %record.id))]
    async fn fetch_one(&self, record: &DrugRecord) -> Option<String> {
        let mut display_name = record.name.clone();

        if let Some(drugbank_id) = record.drugbank_id.as_deref() {
            match self.detail.fetch_drug(drugbank_id).await {
                Ok(Some(page)) => {
                    if page.smiles.is_some() {
                        return page.smiles;
                    }
                    display_name = display_name.or(page.name);
                }
                Ok(None) => debug!(drugbank_id, "No DrugBank page"),
                Err(e) => debug!(error = %e, drugbank_id, "DrugBank page unavailable"),
            }
        }

        if let Some(chembl_id) = record.chembl_id.as_deref() {
            let chembl_id = self.remap.apply(chembl_id);
            match self.catalog.fetch_molecule(&chembl_id).await {
                Ok(Some(hit)) => {
                    if hit.smiles.is_some() {
                        return hit.smiles;
                    }
                    display_name = display_name.or(hit.name);
                }
                Ok(None) => debug!(%chembl_id, "No ChEMBL molecule"),
                Err(e) => debug!(error = %e, %chembl_id, "ChEMBL molecule unavailable"),
            }
        }

        let name = display_name?;
        match self.pubchem.smiles_by_name(&name).await {
            Ok(smiles) => smiles,
            Err(e) => {
                debug!(error = %e, name = %name, "PubChem lookup failed");
                None
            }
        }
    }
}

/// Copy fetched structures onto their records. Records missing from the map
/// are left untouched.
pub fn apply_structures(records: &mut [DrugRecord], structures: &HashMap<RecordId, Option<String>>) {
    for record in records {
        if let Some(smiles) = structures.get(&record.id) {
            record.smiles = smiles.clone();
        }
    }
}
