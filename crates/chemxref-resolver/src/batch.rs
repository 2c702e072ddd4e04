//! Batch resolution over a table of drug records.
//!
//! Records are resolved one at a time, in input order. The browser session
//! slot belongs to the batch and is always released at the end, including
//! when a record panics mid-batch.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use chemxref_common::entities::{Confidence, DrugRecord, IdentifierKind};
use chemxref_sources::BrowserLauncher;
use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::resolver::Resolver;
use crate::session::{SessionSlot, SessionState};

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub total: usize,
    pub resolved: usize,
    pub ambiguous: usize,
    pub unresolved: usize,
    /// Records that had both identifiers already, or none at all.
    pub skipped: usize,
    pub session_used: bool,
    pub session_state: SessionState,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

#[derive(Default)]
struct Tally {
    resolved: usize,
    ambiguous: usize,
    unresolved: usize,
    skipped: usize,
}

/// Fill in the missing identifier of every record.
///
/// Never fails: unresolvable records end up with an explicit `None` and an
/// `Unresolved` resolution.
pub async fn resolve_batch(
    resolver: &Resolver,
    launcher: Arc<dyn BrowserLauncher>,
    records: &mut [DrugRecord],
) -> BatchReport {
    let batch_id = Uuid::new_v4();
    let started_at = Utc::now();
    let start = Instant::now();
    info!(%batch_id, records = records.len(), "Starting resolution batch");

    let mut slot = SessionSlot::new(launcher);
    let outcome = AssertUnwindSafe(resolve_records(resolver, &mut slot, records))
        .catch_unwind()
        .await;
    slot.release().await;

    let tally = match outcome {
        Ok(tally) => tally,
        Err(panic) => std::panic::resume_unwind(panic),
    };

    let report = BatchReport {
        batch_id,
        total: records.len(),
        resolved: tally.resolved,
        ambiguous: tally.ambiguous,
        unresolved: tally.unresolved,
        skipped: tally.skipped,
        session_used: slot.was_used(),
        session_state: slot.state(),
        started_at,
        duration_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        %batch_id,
        resolved = report.resolved,
        ambiguous = report.ambiguous,
        unresolved = report.unresolved,
        skipped = report.skipped,
        "Resolution batch finished"
    );
    report
}

async fn resolve_records(
    resolver: &Resolver,
    slot: &mut SessionSlot,
    records: &mut [DrugRecord],
) -> Tally {
    let mut tally = Tally::default();

    for (idx, record) in records.iter_mut().enumerate() {
        if let Some(chembl_id) = record.chembl_id.as_deref() {
            let corrected = resolver.remap().apply(chembl_id);
            if corrected != chembl_id {
                record.chembl_id = Some(corrected);
            }
        }

        let known = match record.identifier_pair() {
            (Some(_), Some(_)) => {
                debug!(idx, record = %record.id, "Both identifiers present, nothing to resolve");
                tally.skipped += 1;
                continue;
            }
            (None, None) => {
                warn!(idx, record = %record.id, "Record has no identifier, skipping");
                tally.skipped += 1;
                continue;
            }
            (Some(db), None) => (db.to_string(), IdentifierKind::DrugBank),
            (None, Some(chembl)) => (chembl.to_string(), IdentifierKind::Chembl),
        };

        let resolution = resolver.resolve(&known.0, known.1, slot).await;
        match resolution.confidence {
            Confidence::Exact => tally.resolved += 1,
            Confidence::Ambiguous => {
                tally.resolved += 1;
                tally.ambiguous += 1;
            }
            Confidence::Unresolved => tally.unresolved += 1,
        }
        info!(
            idx,
            known = %known.0,
            resolved = resolution.resolved.as_deref().unwrap_or("-"),
            "Record resolved"
        );
        record.apply(known.1, resolution);
    }

    tally
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use async_trait::async_trait;
    use chemxref_common::entities::Strategy;
    use chemxref_common::Result;
    use chemxref_sources::{DetailPageSource, Direction, DrugPage};

    fn records(ids: &[&str]) -> Vec<DrugRecord> {
        ids.iter().map(|id| DrugRecord::from_identifier(id, None).unwrap()).collect()
    }

    fn resolver(drugbank: FakeDrugBank, unichem: FakeUniChem, chembl: FakeChembl) -> Resolver {
        Resolver::new(Arc::new(drugbank), Arc::new(unichem), Arc::new(chembl))
    }

    #[tokio::test]
    async fn test_mixed_batch() {
        let resolver = resolver(
            FakeDrugBank::default().with_page(page("DB00945", Some("Aspirin"), Some("CHEMBL25"), None)),
            FakeUniChem::default(),
            FakeChembl::default()
                .with_molecule(hit("CHEMBL1431", Some("METFORMIN"), None))
                .with_molecule(hit("CHEMBL7", Some("UNKNOWNIUM"), None)),
        );
        let launcher = Arc::new(FakeLauncher::default().with_landing("METFORMIN", "DB00331", false));
        let mut recs = records(&["DB00945", "CHEMBL1431", "CHEMBL7"]);

        let report = resolve_batch(&resolver, launcher.clone(), &mut recs).await;

        assert_eq!(recs[0].identifier_pair(), (Some("DB00945"), Some("CHEMBL25")));
        assert_eq!(recs[1].identifier_pair(), (Some("DB00331"), Some("CHEMBL1431")));
        assert_eq!(recs[2].identifier_pair(), (None, Some("CHEMBL7")));
        assert_eq!(
            recs[1].resolution.as_ref().unwrap().strategy,
            Some(Strategy::InteractiveSearch)
        );
        assert_eq!(recs[2].resolution.as_ref().unwrap().confidence, Confidence::Unresolved);

        assert_eq!(report.total, 3);
        assert_eq!(report.resolved, 2);
        assert_eq!(report.unresolved, 1);
        assert!(report.session_used);
        assert_eq!(report.session_state, SessionState::Terminated);
        assert_eq!(launcher.launches(), 1);
        assert_eq!(launcher.quits(), 1);
    }

    #[tokio::test]
    async fn test_session_terminated_when_never_needed() {
        let resolver = resolver(
            FakeDrugBank::default(),
            FakeUniChem::default().with_mapping("CHEMBL25", Direction::ChemblToDrugBank, &["DB00945"]),
            FakeChembl::default(),
        );
        let launcher = Arc::new(FakeLauncher::default());
        let mut recs = records(&["CHEMBL25"]);

        let report = resolve_batch(&resolver, launcher.clone(), &mut recs).await;

        assert!(!report.session_used);
        assert_eq!(report.session_state, SessionState::Terminated);
        assert_eq!(launcher.launches(), 0);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let resolver = resolver(FakeDrugBank::default(), FakeUniChem::default(), FakeChembl::default());
        let report = resolve_batch(&resolver, Arc::new(FakeLauncher::default()), &mut []).await;
        assert_eq!(report.total, 0);
        assert_eq!(report.session_state, SessionState::Terminated);
    }

    #[tokio::test]
    async fn test_bad_chembl_corrected_in_place() {
        let resolver = resolver(
            FakeDrugBank::default(),
            FakeUniChem::default()
                .with_mapping("CHEMBL2367706", Direction::ChemblToDrugBank, &["DB09037"]),
            FakeChembl::default(),
        );
        let mut recs = records(&["CHEMBL2029132"]);

        resolve_batch(&resolver, Arc::new(FakeLauncher::default()), &mut recs).await;

        assert_eq!(recs[0].identifier_pair(), (Some("DB09037"), Some("CHEMBL2367706")));
    }

    #[tokio::test]
    async fn test_complete_and_empty_records_skipped() {
        let resolver = resolver(FakeDrugBank::default(), FakeUniChem::default(), FakeChembl::default());
        let mut full = DrugRecord::from_identifier("DB00945", None).unwrap();
        full.chembl_id = Some("CHEMBL25".into());
        let mut empty = DrugRecord::from_identifier("DB00945", None).unwrap();
        empty.drugbank_id = None;
        let mut recs = vec![full, empty];

        let report = resolve_batch(&resolver, Arc::new(FakeLauncher::default()), &mut recs).await;

        assert_eq!(report.skipped, 2);
        assert!(recs.iter().all(|r| r.resolution.is_none()));
    }

    struct PanickingDrugBank;

    #[async_trait]
    impl DetailPageSource for PanickingDrugBank {
        async fn fetch_drug(&self, _drugbank_id: &str) -> Result<Option<DrugPage>> {
            panic!("scraper blew up");
        }
    }

    #[tokio::test]
    async fn test_session_released_on_panic() {
        let resolver = Resolver::new(
            Arc::new(PanickingDrugBank),
            Arc::new(FakeUniChem::default()),
            Arc::new(FakeChembl::default().with_molecule(hit("CHEMBL1431", Some("METFORMIN"), None))),
        );
        let launcher = Arc::new(FakeLauncher::default().with_landing("METFORMIN", "DB00331", false));
        let mut recs = records(&["CHEMBL1431", "DB00945"]);

        let outcome = AssertUnwindSafe(resolve_batch(&resolver, launcher.clone(), &mut recs))
            .catch_unwind()
            .await;

        assert!(outcome.is_err());
        assert_eq!(launcher.launches(), 1);
        assert_eq!(launcher.quits(), 1);
    }
}
