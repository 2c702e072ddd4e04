//! The identifier-resolution fallback chain.

use std::sync::Arc;

use chemxref_common::entities::{normalise_id, IdentifierKind, Resolution, Strategy};
use chemxref_sources::{CrossReferenceService, DetailPageSource, Direction, MoleculeCatalog};
use tracing::{debug, info, instrument, warn};

use crate::candidate::{CandidatePicker, FirstCandidate};
use crate::remap::RemapTable;
use crate::session::SessionSlot;

/// Resolves the missing side of a DrugBank/ChEMBL pair.
///
/// Calls are independent: nothing is cached between them.
pub struct Resolver {
    detail: Arc<dyn DetailPageSource>,
    xref: Arc<dyn CrossReferenceService>,
    catalog: Arc<dyn MoleculeCatalog>,
    picker: Arc<dyn CandidatePicker>,
    remap: RemapTable,
}

impl Resolver {
    pub fn new(
        detail: Arc<dyn DetailPageSource>,
        xref: Arc<dyn CrossReferenceService>,
        catalog: Arc<dyn MoleculeCatalog>,
    ) -> Self {
        Self {
            detail,
            xref,
            catalog,
            picker: Arc::new(FirstCandidate),
            remap: RemapTable::builtin(),
        }
    }

    pub fn with_picker(mut self, picker: Arc<dyn CandidatePicker>) -> Self {
        self.picker = picker;
        self
    }

    pub fn with_remap(mut self, remap: RemapTable) -> Self {
        self.remap = remap;
        self
    }

    pub fn remap(&self) -> &RemapTable {
        &self.remap
    }

    /// Resolve the counterpart of `known_id`.
    ///
    /// `session` is only touched by the ChEMBL → DrugBank interactive
    /// fallback, and is launched lazily on first need.
    #[instrument(skip(self, session))]
    pub async fn resolve(
        &self,
        known_id: &str,
        known_kind: IdentifierKind,
        session: &mut SessionSlot,
    ) -> Resolution {
        let resolution = match known_kind {
            IdentifierKind::DrugBank => {
                self.chembl_from_drugbank(&normalise_id(known_id)).await
            }
            IdentifierKind::Chembl => {
                self.drugbank_from_chembl(&self.remap.apply(known_id), session).await
            }
        };

        match (&resolution.resolved, resolution.strategy) {
            (Some(id), Some(strategy)) => info!(
                known_id, resolved = %id, ?strategy, confidence = ?resolution.confidence,
                "Resolved identifier"
            ),
            _ => warn!(known_id, %known_kind, "All strategies exhausted, leaving unresolved"),
        }
        resolution
    }

    async fn chembl_from_drugbank(&self, drugbank_id: &str) -> Resolution {
        // 1. Detail page cross-reference (fast path)
        let page = match self.detail.fetch_drug(drugbank_id).await {
            Ok(page) => page,
            Err(e) => {
                debug!(error = %e, drugbank_id, "DrugBank page unavailable");
                None
            }
        };
        if let Some(chembl_id) = page.as_ref().and_then(|p| p.chembl_id.as_deref()) {
            return Resolution::found(self.remap.apply(chembl_id), Strategy::DetailPage, false);
        }

        // 2. UniChem
        if let Some(resolution) = self.cross_reference(drugbank_id, Direction::DrugBankToChembl).await {
            return resolution;
        }

        // 3. DrugBank name → ChEMBL search
        let Some(name) = page.and_then(|p| p.name) else {
            debug!(drugbank_id, "No DrugBank name to search ChEMBL with");
            return Resolution::unresolved();
        };
        match self.catalog.search(&name).await {
            Ok(hits) => {
                let ids: Vec<String> = hits
                    .into_iter()
                    .map(|h| normalise_id(&h.id))
                    .filter(|id| IdentifierKind::detect(id) == Some(IdentifierKind::Chembl))
                    .collect();
                if let Some((id, ambiguous)) = self.choose(&ids) {
                    return Resolution::found(self.remap.apply(id), Strategy::NameSearch, ambiguous);
                }
                debug!(name = %name, "ChEMBL search returned nothing");
            }
            Err(e) => debug!(error = %e, name = %name, "ChEMBL search failed"),
        }

        Resolution::unresolved()
    }

    async fn drugbank_from_chembl(&self, chembl_id: &str, session: &mut SessionSlot) -> Resolution {
        // 1. UniChem
        if let Some(resolution) = self.cross_reference(chembl_id, Direction::ChemblToDrugBank).await {
            return resolution;
        }

        // 2. ChEMBL preferred name → interactive DrugBank search
        let name = match self.catalog.fetch_molecule(chembl_id).await {
            Ok(hit) => hit.and_then(|h| h.name),
            Err(e) => {
                debug!(error = %e, chembl_id, "ChEMBL molecule unavailable");
                None
            }
        };
        let Some(name) = name else {
            debug!(chembl_id, "No ChEMBL preferred name for interactive search");
            return Resolution::unresolved();
        };

        let Some(browser) = session.acquire().await else {
            return Resolution::unresolved();
        };
        match browser.search_and_land(&name).await {
            Ok(Some(landing)) => Resolution::found(
                landing.drugbank_id,
                Strategy::InteractiveSearch,
                landing.via_listing,
            ),
            Ok(None) => {
                debug!(name = %name, "DrugBank search reached no detail page");
                Resolution::unresolved()
            }
            Err(e) => {
                warn!(error = %e, name = %name, "Interactive DrugBank search failed");
                Resolution::unresolved()
            }
        }
    }

    /// UniChem lookup. `None` means "no answer, try the next strategy".
    async fn cross_reference(&self, id: &str, direction: Direction) -> Option<Resolution> {
        let target = match direction {
            Direction::DrugBankToChembl => IdentifierKind::Chembl,
            Direction::ChemblToDrugBank => IdentifierKind::DrugBank,
        };

        let candidates = match self.xref.lookup(id, direction).await {
            Ok(ids) => ids,
            Err(e) => {
                debug!(error = %e, id, "UniChem lookup failed");
                return None;
            }
        };

        let ids: Vec<String> = candidates
            .iter()
            .map(|c| normalise_id(c))
            .filter(|c| IdentifierKind::detect(c) == Some(target))
            .collect();

        let (id, ambiguous) = self.choose(&ids)?;
        let resolved = match target {
            IdentifierKind::Chembl => self.remap.apply(id),
            IdentifierKind::DrugBank => id.to_string(),
        };
        Some(Resolution::found(resolved, Strategy::CrossReference, ambiguous))
    }

    /// Run the picker. An index outside `ids` counts as no pick.
    fn choose<'a>(&self, ids: &'a [String]) -> Option<(&'a str, bool)> {
        let picked = self.picker.pick(ids)?;
        match ids.get(picked.index) {
            Some(id) => Some((id.as_str(), picked.ambiguous)),
            None => {
                warn!(index = picked.index, candidates = ids.len(), "Picker chose a missing candidate");
                None
            }
        }
    }
}
