//! The audit trail.
//!
//! [`AuditTrail`] owns sequence-number assignment and hash chaining.
//! Appends are serialized through a single chain-head lock, so
//! `sequence_no` is strictly increasing and gapless even under concurrent
//! writers.

use crate::chain::{self, GENESIS_HASH};
use crate::entry::{AuditDraft, AuditEntry};
use crate::storage::{AuditFilter, AuditStorage};
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use taskdeck_core::error::AuditError;
use tokio::sync::Mutex;

/// Default number of storage attempts per append.
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Result of an append.
///
/// `Unwritten` means storage rejected the entry after all retries; the
/// caller's surrounding operation still succeeds (availability over audit
/// completeness), and the failure is logged and counted for operators.
#[derive(Debug, Clone)]
pub enum AppendOutcome {
    /// The entry is durable in the stream.
    Written(AuditEntry),

    /// The entry could not be written.
    Unwritten,
}

impl AppendOutcome {
    /// Returns the written entry, if any.
    pub fn entry(&self) -> Option<&AuditEntry> {
        match self {
            AppendOutcome::Written(entry) => Some(entry),
            AppendOutcome::Unwritten => None,
        }
    }

    /// Whether the entry was written.
    pub fn is_written(&self) -> bool {
        matches!(self, AppendOutcome::Written(_))
    }
}

/// Outcome of a chain verification walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainReport {
    /// Number of entries that verified.
    pub valid_count: usize,

    /// Sequence numbers of entries that failed, in order. Once the chain
    /// breaks, every subsequent entry is reported: its hash was computed
    /// over a chain that can no longer be trusted.
    pub invalid: Vec<u64>,
}

impl ChainReport {
    /// Whether the verified range is fully intact.
    pub fn is_intact(&self) -> bool {
        self.invalid.is_empty()
    }
}

struct ChainHead {
    next_seq: u64,
    prev_hash: String,
}

/// Append-only, hash-chained audit trail over a storage backend.
pub struct AuditTrail<S> {
    storage: Arc<S>,
    head: Mutex<ChainHead>,
    failed_appends: AtomicU64,
    max_attempts: u32,
}

impl<S: AuditStorage> AuditTrail<S> {
    /// Open a trail over a storage backend, resuming the chain from the
    /// last stored entry (or the genesis constant for an empty stream).
    pub async fn open(storage: S) -> Result<Self, AuditError> {
        let head = match storage.last().await? {
            Some(last) => ChainHead {
                next_seq: last.sequence_no + 1,
                prev_hash: last.integrity_hash,
            },
            None => ChainHead {
                next_seq: 1,
                prev_hash: GENESIS_HASH.to_string(),
            },
        };

        Ok(Self {
            storage: Arc::new(storage),
            head: Mutex::new(head),
            failed_appends: AtomicU64::new(0),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        })
    }

    /// Override the bounded retry count.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Append a draft to the stream.
    ///
    /// This is the only way an [`AuditEntry`] is created. It never fails
    /// the caller: storage errors are retried up to the attempt bound,
    /// then swallowed into [`AppendOutcome::Unwritten`] with a log line
    /// and a counter bump. The sequence number is only consumed on a
    /// successful write, so the stream stays gapless.
    pub async fn append(&self, draft: AuditDraft) -> AppendOutcome {
        let mut head = self.head.lock().await;

        let mut entry = AuditEntry::from_draft(
            draft,
            head.next_seq,
            Utc::now(),
            head.prev_hash.clone(),
        );
        entry.integrity_hash = chain::compute_hash(&entry);

        for attempt in 1..=self.max_attempts {
            match self.storage.append_raw(entry.clone()).await {
                Ok(()) => {
                    head.next_seq += 1;
                    head.prev_hash = entry.integrity_hash.clone();
                    return AppendOutcome::Written(entry);
                }
                Err(err) if attempt < self.max_attempts => {
                    tracing::warn!(
                        sequence_no = entry.sequence_no,
                        attempt,
                        error = %err,
                        "audit append failed, retrying"
                    );
                }
                Err(err) => {
                    tracing::error!(
                        sequence_no = entry.sequence_no,
                        error = %err,
                        "audit append failed, giving up"
                    );
                }
            }
        }

        self.failed_appends.fetch_add(1, Ordering::Relaxed);
        AppendOutcome::Unwritten
    }

    /// Number of appends dropped after exhausting retries. Exposed for
    /// operational alerting.
    pub fn failed_appends(&self) -> u64 {
        self.failed_appends.load(Ordering::Relaxed)
    }

    /// Verify a single entry against its stored fields and `prev_hash`.
    pub fn verify(&self, entry: &AuditEntry) -> bool {
        chain::verify_entry(entry)
    }

    /// Verify the chain over the closed interval `from..=to` of sequence
    /// numbers, recomputing every hash from a trusted anchor (the entry
    /// before `from`, or the genesis constant).
    pub async fn verify_range(&self, from: u64, to: u64) -> Result<ChainReport, AuditError> {
        if from == 0 || to < from {
            return Err(AuditError::InvalidRange { from, to });
        }

        let anchor = if from == 1 {
            GENESIS_HASH.to_string()
        } else {
            let prev = self.storage.read_range(from - 1, from - 1).await?;
            prev.into_iter()
                .next()
                .ok_or(AuditError::EntryNotFound(from - 1))?
                .integrity_hash
        };

        let entries = self.storage.read_range(from, to).await?;
        Ok(walk_chain(&entries, from, &anchor))
    }

    /// Verify the full history for compliance reporting, capped at
    /// `limit` entries from the start of the stream.
    pub async fn verify_all(&self, limit: u64) -> Result<ChainReport, AuditError> {
        let len = self.storage.len().await?;
        if len == 0 {
            return Ok(ChainReport {
                valid_count: 0,
                invalid: Vec::new(),
            });
        }
        self.verify_range(1, len.min(limit)).await
    }

    /// Query the stream, read-only, in sequence order.
    pub async fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditEntry>, AuditError> {
        Ok(self.storage.query(filter).await?)
    }
}

fn walk_chain(entries: &[AuditEntry], from: u64, anchor: &str) -> ChainReport {
    let mut valid_count = 0;
    let mut invalid = Vec::new();
    let mut expected_seq = from;
    let mut expected_prev = anchor.to_string();
    let mut broken = false;

    for entry in entries {
        let entry_ok = !broken
            && entry.sequence_no == expected_seq
            && entry.prev_hash == expected_prev
            && chain::verify_entry(entry);

        if entry_ok {
            valid_count += 1;
        } else {
            // First divergence taints everything after it.
            broken = true;
            invalid.push(entry.sequence_no);
        }

        expected_seq = entry.sequence_no + 1;
        expected_prev = entry.integrity_hash.clone();
    }

    ChainReport {
        valid_count,
        invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::AuditAction;
    use crate::storage::MemoryAuditStorage;
    use async_trait::async_trait;
    use taskdeck_core::error::StoreError;

    fn draft(description: &str) -> AuditDraft {
        AuditDraft::new(AuditAction::StateChange, "task").with_description(description)
    }

    async fn trail_with_entries(n: usize) -> (AuditTrail<MemoryAuditStorage>, MemoryAuditStorage) {
        let storage = MemoryAuditStorage::new();
        let trail = AuditTrail::open(storage.clone()).await.unwrap();
        for i in 0..n {
            assert!(trail.append(draft(&format!("entry {i}"))).await.is_written());
        }
        (trail, storage)
    }

    #[tokio::test]
    async fn test_sequence_is_gapless_and_ordered() {
        let (trail, _) = trail_with_entries(5).await;
        let entries = trail.query(&AuditFilter::all()).await.unwrap();
        let seqs: Vec<u64> = entries.iter().map(|e| e.sequence_no).collect();
        assert_eq!(seqs, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_chain_links_prev_hash() {
        let (trail, _) = trail_with_entries(3).await;
        let entries = trail.query(&AuditFilter::all()).await.unwrap();
        assert_eq!(entries[0].prev_hash, GENESIS_HASH);
        assert_eq!(entries[1].prev_hash, entries[0].integrity_hash);
        assert_eq!(entries[2].prev_hash, entries[1].integrity_hash);
    }

    #[tokio::test]
    async fn test_verify_range_intact() {
        let (trail, _) = trail_with_entries(10).await;
        let report = trail.verify_range(1, 10).await.unwrap();
        assert!(report.is_intact());
        assert_eq!(report.valid_count, 10);
    }

    #[tokio::test]
    async fn test_verify_range_from_midstream_anchor() {
        let (trail, _) = trail_with_entries(10).await;
        let report = trail.verify_range(4, 8).await.unwrap();
        assert!(report.is_intact());
        assert_eq!(report.valid_count, 5);
    }

    #[tokio::test]
    async fn test_tamper_cascades_from_mutation_point() {
        let (_, storage) = trail_with_entries(8).await;

        // Rebuild storage with entry 4 forged behind the trail's back.
        let mut entries = storage.read_range(1, 8).await.unwrap();
        entries[3].description = "forged".to_string();
        let tampered = MemoryAuditStorage::new();
        for entry in entries {
            tampered.append_raw(entry).await.unwrap();
        }

        let trail = AuditTrail::open(tampered).await.unwrap();
        let report = trail.verify_range(4, 8).await.unwrap();
        assert_eq!(report.invalid, vec![4, 5, 6, 7, 8]);
        assert_eq!(report.valid_count, 0);

        // Everything before the mutation still verifies.
        let report = trail.verify_range(1, 3).await.unwrap();
        assert!(report.is_intact());
        assert_eq!(report.valid_count, 3);
    }

    #[tokio::test]
    async fn test_verify_all_respects_limit() {
        let (trail, _) = trail_with_entries(10).await;
        let report = trail.verify_all(4).await.unwrap();
        assert_eq!(report.valid_count, 4);
        assert!(report.is_intact());
    }

    #[tokio::test]
    async fn test_verify_range_rejects_bad_bounds() {
        let (trail, _) = trail_with_entries(3).await;
        assert!(trail.verify_range(0, 2).await.is_err());
        assert!(trail.verify_range(3, 2).await.is_err());
    }

    /// Storage that fails a fixed number of appends before recovering.
    #[derive(Clone)]
    struct FlakyStorage {
        inner: MemoryAuditStorage,
        failures_left: Arc<AtomicU64>,
    }

    impl FlakyStorage {
        fn new(failures: u64) -> Self {
            Self {
                inner: MemoryAuditStorage::new(),
                failures_left: Arc::new(AtomicU64::new(failures)),
            }
        }
    }

    #[async_trait]
    impl AuditStorage for FlakyStorage {
        async fn append_raw(&self, entry: AuditEntry) -> Result<(), StoreError> {
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(StoreError::Backend("injected failure".to_string()));
            }
            self.inner.append_raw(entry).await
        }

        async fn read_range(&self, from: u64, to: u64) -> Result<Vec<AuditEntry>, StoreError> {
            self.inner.read_range(from, to).await
        }

        async fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditEntry>, StoreError> {
            self.inner.query(filter).await
        }

        async fn last(&self) -> Result<Option<AuditEntry>, StoreError> {
            self.inner.last().await
        }

        async fn len(&self) -> Result<u64, StoreError> {
            self.inner.len().await
        }
    }

    #[tokio::test]
    async fn test_append_retries_through_transient_failures() {
        let storage = FlakyStorage::new(2);
        let trail = AuditTrail::open(storage).await.unwrap();

        let outcome = trail.append(draft("survives retries")).await;
        assert!(outcome.is_written());
        assert_eq!(trail.failed_appends(), 0);
    }

    #[tokio::test]
    async fn test_append_gives_up_without_failing_caller() {
        let storage = FlakyStorage::new(100);
        let trail = AuditTrail::open(storage).await.unwrap();

        let outcome = trail.append(draft("dropped")).await;
        assert!(!outcome.is_written());
        assert_eq!(trail.failed_appends(), 1);

        // Every dropped append bumps the counter.
        let outcome = trail.append(draft("also dropped")).await;
        assert!(!outcome.is_written());
        assert_eq!(trail.failed_appends(), 2);
    }

    #[tokio::test]
    async fn test_sequence_not_consumed_on_failure() {
        let storage = FlakyStorage::new(3);
        let trail = AuditTrail::open(storage.clone())
            .await
            .unwrap()
            .with_max_attempts(2);

        // First append exhausts both attempts and is dropped.
        assert!(!trail.append(draft("dropped")).await.is_written());

        // Second append succeeds (one failure left, then recovery) and
        // takes sequence number 1.
        let outcome = trail.append(draft("first durable")).await;
        let entry = outcome.entry().expect("second append should be written");
        assert_eq!(entry.sequence_no, 1);
        assert_eq!(entry.prev_hash, GENESIS_HASH);
    }

    #[tokio::test]
    async fn test_open_resumes_chain() {
        let storage = MemoryAuditStorage::new();
        {
            let trail = AuditTrail::open(storage.clone()).await.unwrap();
            trail.append(draft("one")).await;
            trail.append(draft("two")).await;
        }

        // Reopen over the same storage and keep appending.
        let trail = AuditTrail::open(storage).await.unwrap();
        let outcome = trail.append(draft("three")).await;
        let entry = outcome.entry().unwrap();
        assert_eq!(entry.sequence_no, 3);

        let report = trail.verify_range(1, 3).await.unwrap();
        assert!(report.is_intact());
    }

    proptest::proptest! {
        #![proptest_config(proptest::prelude::ProptestConfig::with_cases(24))]

        /// Mutating any single field of entry `k` in an N-entry stream
        /// invalidates exactly the suffix `k..=N` under a full-range walk,
        /// while the prefix `1..k` still verifies.
        #[test]
        fn prop_tamper_at_k_invalidates_suffix(k in 1u64..=6, field in 0u8..4) {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            runtime.block_on(async move {
                let n = 6u64;
                let (_, storage) = trail_with_entries(n as usize).await;

                let mut entries = storage.read_range(1, n).await.unwrap();
                let target = &mut entries[(k - 1) as usize];
                match field {
                    0 => target.description = "forged".to_string(),
                    1 => target.ip_address = "203.0.113.9".to_string(),
                    2 => target.action = AuditAction::Delete,
                    _ => target.integrity_hash = "ab".repeat(32),
                }

                let tampered = MemoryAuditStorage::new();
                for entry in entries {
                    tampered.append_raw(entry).await.unwrap();
                }
                let trail = AuditTrail::open(tampered).await.unwrap();

                let report = trail.verify_range(1, n).await.unwrap();
                let expected: Vec<u64> = (k..=n).collect();
                proptest::prop_assert_eq!(report.invalid, expected);
                proptest::prop_assert_eq!(report.valid_count, (k - 1) as usize);

                if k > 1 {
                    let prefix = trail.verify_range(1, k - 1).await.unwrap();
                    proptest::prop_assert!(prefix.is_intact());
                }
                Ok(())
            })?;
        }
    }

    #[tokio::test]
    async fn test_concurrent_appends_stay_gapless() {
        let storage = MemoryAuditStorage::new();
        let trail = Arc::new(AuditTrail::open(storage).await.unwrap());

        let mut handles = Vec::new();
        for i in 0..16 {
            let trail = Arc::clone(&trail);
            handles.push(tokio::spawn(async move {
                trail.append(draft(&format!("concurrent {i}"))).await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().is_written());
        }

        let report = trail.verify_range(1, 16).await.unwrap();
        assert!(report.is_intact());
        assert_eq!(report.valid_count, 16);
    }
}
