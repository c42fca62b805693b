//! Stockdash Client — backend transport and job orchestration.
//!
//! This crate wires the pure state machines from `stockdash-core` to the
//! outside world:
//! - `Backend` trait + `HttpBackend` (the REST contract)
//! - `FileStore` for the durable cache tier
//! - `SessionMarkers` for same-session job recovery
//! - `DashboardService`, the composition root both front ends drive

pub mod backend;
pub mod config;
pub mod fs_store;
pub mod http;
pub mod service;
pub mod session;
pub mod types;

pub use backend::{ApiError, Backend};
pub use config::ClientConfig;
pub use fs_store::FileStore;
pub use http::HttpBackend;
pub use service::{DashboardService, JobHandle, PollUpdate, SubmitError};
pub use session::SessionMarkers;
