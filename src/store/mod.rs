//! Persistence service integration: wire protocol, client, background worker

pub mod client;
pub mod codec;
pub mod protocol;
pub mod worker;

pub use client::PersistenceClient;
pub use worker::{PersistenceHandle, PersistenceJob, PersistenceOutcome, PersistenceWorker};
