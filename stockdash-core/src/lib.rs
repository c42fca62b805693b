//! Stockdash Core — job orchestration state machines and client-side caches.
//!
//! This crate contains the consistency-sensitive heart of the dashboard:
//! - Job domain types and status snapshots
//! - Per-slot poll state machine (tick-driven, no timers, no I/O)
//! - Two-tier cache store (durable snapshot, session-scoped validity)
//! - Batch progress aggregation
//! - Selection tracking
//!
//! Everything here is pure and deterministic; transport and timers live in
//! `stockdash-client`.

pub mod cache;
pub mod job;
pub mod poller;
pub mod progress;
pub mod selection;
pub mod slot;
pub mod store;

pub use cache::CacheStore;
pub use job::{Job, JobId, JobStatus, StatusSnapshot};
pub use poller::{PollEngine, PollOutcome, PollPhase, PollStep, PollTicket};
pub use progress::BatchProgress;
pub use selection::SelectionManager;
pub use slot::Slot;
pub use store::{KvStore, MemoryStore, StoreError};
