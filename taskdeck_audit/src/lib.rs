//! # TaskDeck Audit
//!
//! Append-only, tamper-evident audit trail for the TaskDeck lifecycle
//! core. Every permission denial and state mutation in the system flows
//! through [`AuditTrail::append`], which is the only way an
//! [`AuditEntry`] comes into existence.
//!
//! # Integrity scheme
//!
//! Entries form a hash chain: each entry's `integrity_hash` is the SHA-256
//! of its canonical serialization concatenated with the previous entry's
//! `integrity_hash` (a fixed genesis constant seeds the chain). Tampering
//! with entry *k* is detectable on *k* itself and taints every entry after
//! it, because each later hash was computed over the original chain.
//!
//! # Best-effort policy
//!
//! `append` never fails its caller. Storage errors are retried a bounded
//! number of times, then logged and counted; the caller receives
//! [`AppendOutcome::Unwritten`] and carries on. Availability is
//! prioritized over audit completeness.

/// Audit entry model and drafts.
pub mod entry;

/// Hash-chain computation and verification.
pub mod chain;

/// Audit storage boundary and in-memory store.
pub mod storage;

/// The append/verify/query surface.
pub mod trail;

/// JSON and CSV export.
pub mod export;

pub use chain::GENESIS_HASH;
pub use entry::{AuditAction, AuditDraft, AuditEntry};
pub use export::{to_csv, to_ndjson};
pub use storage::{AuditFilter, AuditStorage, MemoryAuditStorage};
pub use trail::{AppendOutcome, AuditTrail, ChainReport};
