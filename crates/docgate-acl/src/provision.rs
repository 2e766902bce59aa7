//! Two-state ACL provisioning protocol.
//!
//! A run always starts as a plan (dry run): count the documents, show
//! sample label sets, mutate nothing. Applying consumes the plan and
//! requires explicit [`Confirmation::Confirmed`]; it then overwrites the
//! ACL attributes of every document via batched bulk writes.
//!
//! # Failure semantics
//!
//! Connectivity failures abort immediately. Partial progress is never
//! rolled back: documents already updated stay updated, and a partially
//! failed run surfaces as [`Error::PartialWrite`] with succeeded/failed
//! counts. There is no automatic retry; re-invocation is the recovery path
//! and produces fresh random labels.

use std::sync::Arc;
use std::time::{Duration, Instant};

use docgate_core::{DocgateConfig, Error, Result};
use docgate_store::{DocumentStore, FieldUpdate, StoredDocument};

use crate::labels::{ACL_FIELDS, AclLabelSet, AclRange, LabelGenerator};

/// Operator's answer to the "this overwrites every document" prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// Proceed with the bulk overwrite.
    Confirmed,
    /// Abort before any write.
    Declined,
}

/// ACL label provisioner over an injected document store.
pub struct Provisioner {
    store: Arc<dyn DocumentStore>,
    range: AclRange,
    batch_size: usize,
    sample_size: usize,
}

impl Provisioner {
    /// Create a provisioner with default batching (1,000 documents).
    pub fn new(store: Arc<dyn DocumentStore>, range: AclRange) -> Self {
        Self {
            store,
            range,
            batch_size: 1_000,
            sample_size: 3,
        }
    }

    /// Build a provisioner from configuration.
    pub fn from_config(store: Arc<dyn DocumentStore>, config: &DocgateConfig) -> Result<Self> {
        let range = AclRange::new(config.acl.min, config.acl.max)?;
        Ok(Self {
            store,
            range,
            batch_size: config.acl.batch_size.max(1),
            sample_size: config.acl.sample_size,
        })
    }

    /// Override the bulk-write batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Override how many sample label sets a plan shows.
    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size;
        self
    }

    /// The range labels are drawn from.
    pub fn range(&self) -> AclRange {
        self.range
    }

    /// Dry run: report what an apply would do. Mutates nothing.
    pub async fn plan(&self, generator: &mut LabelGenerator) -> Result<ProvisionPlan> {
        self.store.ping().await?;

        let total_documents = self.store.count_documents().await?;
        let already_labeled = self.store.count_with_field(ACL_FIELDS[0]).await?;
        let samples = (0..self.sample_size).map(|_| generator.generate()).collect();

        tracing::info!(
            total_documents,
            already_labeled,
            range = %self.range,
            "provisioning plan computed"
        );

        Ok(ProvisionPlan {
            total_documents,
            already_labeled,
            range: self.range,
            batch_size: self.batch_size,
            samples,
        })
    }

    /// Apply the plan: overwrite every document's ACL attributes.
    ///
    /// Consumes the plan (a new run requires a new plan). Fails with
    /// [`Error::ConfirmationDeclined`] before any store call unless
    /// confirmed.
    pub async fn apply(
        &self,
        plan: ProvisionPlan,
        confirmation: Confirmation,
        generator: &mut LabelGenerator,
    ) -> Result<ProvisionReport> {
        if confirmation == Confirmation::Declined {
            return Err(Error::ConfirmationDeclined);
        }

        let started = Instant::now();
        let ids = self.store.document_ids().await?;
        let total = ids.len();

        let mut report = docgate_store::BulkWriteReport::default();
        let mut processed = 0usize;
        let mut batches = 0usize;

        for batch in ids.chunks(plan.batch_size) {
            let updates: Vec<FieldUpdate> = batch
                .iter()
                .map(|id| FieldUpdate::new(id.clone(), generator.generate().to_update_fields()))
                .collect();

            report.absorb(self.store.bulk_set_fields(&updates).await?);
            processed += batch.len();
            batches += 1;

            let elapsed = started.elapsed().as_secs_f64();
            let rate = if elapsed > 0.0 {
                processed as f64 / elapsed
            } else {
                0.0
            };
            tracing::info!(
                processed,
                total,
                percent = format!("{:.1}", processed as f64 / total.max(1) as f64 * 100.0),
                docs_per_sec = format!("{rate:.0}"),
                "bulk write batch committed"
            );
        }

        let samples = self.store.sample_documents(self.sample_size).await?;
        let elapsed = started.elapsed();

        if report.failed > 0 {
            tracing::warn!(
                succeeded = report.modified,
                failed = report.failed,
                "bulk write partially failed; updated documents were not rolled back"
            );
            return Err(Error::PartialWrite {
                succeeded: report.modified,
                failed: report.failed,
            });
        }

        tracing::info!(
            updated = report.modified,
            batches,
            elapsed_secs = format!("{:.2}", elapsed.as_secs_f64()),
            "provisioning applied"
        );

        Ok(ProvisionReport {
            updated: report.modified,
            batches,
            elapsed,
            samples,
        })
    }
}

impl std::fmt::Debug for Provisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provisioner")
            .field("store", &self.store.name())
            .field("range", &self.range)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

/// Result of a dry run (state: Planned). Holding one proves no mutation
/// has happened yet.
#[derive(Debug, Clone)]
pub struct ProvisionPlan {
    /// Documents that would be updated.
    pub total_documents: u64,
    /// Documents that already carry `ACL1` (to be overwritten).
    pub already_labeled: u64,
    /// Range labels will be drawn from.
    pub range: AclRange,
    /// Bulk-write batch size an apply would use.
    pub batch_size: usize,
    /// Sample label sets illustrating what would be written.
    pub samples: Vec<AclLabelSet>,
}

impl ProvisionPlan {
    /// Human-readable dry-run summary.
    pub fn summary(&self) -> String {
        let mut out = format!(
            "{} documents would be updated (range {}, batch size {})\n",
            self.total_documents, self.range, self.batch_size
        );
        if self.already_labeled > 0 {
            out.push_str(&format!(
                "{} documents already have ACL labels; they will be overwritten\n",
                self.already_labeled
            ));
        }
        for (i, sample) in self.samples.iter().enumerate() {
            out.push_str(&format!("sample {}: {sample}\n", i + 1));
        }
        out
    }
}

/// Result of an apply (state: Applied).
#[derive(Debug, Clone)]
pub struct ProvisionReport {
    /// Documents updated.
    pub updated: u64,
    /// Bulk-write round trips issued.
    pub batches: usize,
    /// Wall-clock duration of the apply.
    pub elapsed: Duration,
    /// Post-apply document sample for verification.
    pub samples: Vec<StoredDocument>,
}

impl ProvisionReport {
    /// Human-readable apply summary.
    pub fn summary(&self) -> String {
        let mut out = format!(
            "{} documents updated in {:.2}s ({} batches)\n",
            self.updated,
            self.elapsed.as_secs_f64(),
            self.batches
        );
        for doc in &self.samples {
            let labels: Vec<String> = ACL_FIELDS
                .iter()
                .map(|f| format!("{f}={}", doc.int_field(f).unwrap_or(-1)))
                .collect();
            out.push_str(&format!("verify {}: {}\n", doc.id, labels.join(" ")));
        }
        out
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use docgate_store::MemoryStore;
    use serde_json::json;

    fn seeded_store(n: usize) -> Arc<MemoryStore> {
        let store = MemoryStore::new();
        for i in 0..n {
            store.insert_document(
                json!({"title": format!("doc {i}"), "content": "text"})
                    .as_object()
                    .cloned()
                    .unwrap(),
            );
        }
        Arc::new(store)
    }

    fn range() -> AclRange {
        AclRange::new(1, 5).unwrap()
    }

    #[tokio::test]
    async fn test_plan_counts_and_samples() {
        let store = seeded_store(25);
        let provisioner = Provisioner::new(store, range()).with_sample_size(4);
        let mut generator = LabelGenerator::seeded(range(), 1);

        let plan = provisioner.plan(&mut generator).await.unwrap();
        assert_eq!(plan.total_documents, 25);
        assert_eq!(plan.already_labeled, 0);
        assert_eq!(plan.samples.len(), 4);
        assert!(plan.samples.iter().all(|s| s.within(&range())));
        assert!(plan.summary().contains("25 documents would be updated"));
    }

    #[tokio::test]
    async fn test_plan_is_pure_read() {
        let store = seeded_store(10);
        let before = store.snapshot();

        let provisioner = Provisioner::new(store.clone(), range());
        let mut generator = LabelGenerator::seeded(range(), 2);
        provisioner.plan(&mut generator).await.unwrap();

        let after = store.snapshot();
        assert_eq!(before.len(), after.len());
        for (b, a) in before.iter().zip(&after) {
            assert_eq!(b.id, a.id);
            assert_eq!(b.fields, a.fields);
        }
    }

    #[tokio::test]
    async fn test_unreachable_store_aborts_plan() {
        let store = Arc::new(MemoryStore::new().with_ping_failure());
        let provisioner = Provisioner::new(store.clone(), range());
        let mut generator = LabelGenerator::seeded(range(), 13);

        let err = provisioner.plan(&mut generator).await.unwrap_err();
        assert!(err.is_connectivity());

        // Aborted before sampling: the generator was never drawn from.
        let mut fresh = LabelGenerator::seeded(range(), 13);
        assert_eq!(generator.generate(), fresh.generate());
        assert_eq!(store.count_with_field("ACL1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_declined_confirmation_writes_nothing() {
        let store = seeded_store(10);
        let provisioner = Provisioner::new(store.clone(), range());
        let mut generator = LabelGenerator::seeded(range(), 3);

        let plan = provisioner.plan(&mut generator).await.unwrap();
        let err = provisioner
            .apply(plan, Confirmation::Declined, &mut generator)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ConfirmationDeclined));

        assert_eq!(store.count_with_field("ACL1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_apply_labels_every_document() {
        let store = seeded_store(37);
        let provisioner = Provisioner::new(store.clone(), range()).with_batch_size(10);
        let mut generator = LabelGenerator::seeded(range(), 4);

        let plan = provisioner.plan(&mut generator).await.unwrap();
        let report = provisioner
            .apply(plan, Confirmation::Confirmed, &mut generator)
            .await
            .unwrap();

        assert_eq!(report.updated, 37);
        assert_eq!(report.batches, 4); // 10+10+10+7

        for doc in store.snapshot() {
            for field in ACL_FIELDS {
                let value = doc.int_field(field).expect("missing ACL attribute");
                assert!(range().contains(value));
            }
        }
    }

    #[tokio::test]
    async fn test_reapply_overwrites_without_accumulating() {
        let store = seeded_store(12);
        let provisioner = Provisioner::new(store.clone(), range());

        let mut gen1 = LabelGenerator::seeded(range(), 10);
        let plan = provisioner.plan(&mut gen1).await.unwrap();
        provisioner
            .apply(plan, Confirmation::Confirmed, &mut gen1)
            .await
            .unwrap();
        let first: Vec<Vec<i64>> = store
            .snapshot()
            .iter()
            .map(|d| ACL_FIELDS.iter().map(|f| d.int_field(f).unwrap()).collect())
            .collect();

        let mut gen2 = LabelGenerator::seeded(range(), 11);
        let plan = provisioner.plan(&mut gen2).await.unwrap();
        provisioner
            .apply(plan, Confirmation::Confirmed, &mut gen2)
            .await
            .unwrap();

        let docs = store.snapshot();
        let second: Vec<Vec<i64>> = docs
            .iter()
            .map(|d| ACL_FIELDS.iter().map(|f| d.int_field(f).unwrap()).collect())
            .collect();

        // Still exactly the three ACL attributes, no accumulation.
        for doc in &docs {
            let acl_keys = doc.fields.keys().filter(|k| k.starts_with("ACL")).count();
            assert_eq!(acl_keys, 3);
        }
        // Fresh randomness: at least one document differs between runs.
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_second_plan_reports_existing_labels() {
        let store = seeded_store(8);
        let provisioner = Provisioner::new(store.clone(), range());
        let mut generator = LabelGenerator::seeded(range(), 5);

        let plan = provisioner.plan(&mut generator).await.unwrap();
        provisioner
            .apply(plan, Confirmation::Confirmed, &mut generator)
            .await
            .unwrap();

        let replan = provisioner.plan(&mut generator).await.unwrap();
        assert_eq!(replan.already_labeled, 8);
        assert!(replan.summary().contains("overwritten"));
    }

    #[tokio::test]
    async fn test_partial_write_surfaces_counts() {
        let store = MemoryStore::new().with_write_failure_every(5);
        for i in 0..20 {
            store.insert_document(json!({"n": i}).as_object().cloned().unwrap());
        }
        let store = Arc::new(store);

        let provisioner = Provisioner::new(store, range());
        let mut generator = LabelGenerator::seeded(range(), 6);

        let plan = provisioner.plan(&mut generator).await.unwrap();
        let err = provisioner
            .apply(plan, Confirmation::Confirmed, &mut generator)
            .await
            .unwrap_err();

        match err {
            Error::PartialWrite { succeeded, failed } => {
                assert_eq!(succeeded, 16);
                assert_eq!(failed, 4);
            }
            other => panic!("expected PartialWrite, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_report_summary_shows_samples() {
        let store = seeded_store(5);
        let provisioner = Provisioner::new(store, range()).with_sample_size(2);
        let mut generator = LabelGenerator::seeded(range(), 7);

        let plan = provisioner.plan(&mut generator).await.unwrap();
        let report = provisioner
            .apply(plan, Confirmation::Confirmed, &mut generator)
            .await
            .unwrap();

        assert_eq!(report.samples.len(), 2);
        let summary = report.summary();
        assert!(summary.contains("5 documents updated"));
        assert!(summary.contains("verify"));
    }
}
