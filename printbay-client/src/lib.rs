//! The Printed Bay client
//!
//! Calls the storefront API network-first and answers from a local
//! simulation when the server cannot. Also carries the on-disk cache for
//! model files awaiting upload.

pub mod client;
pub mod config;
pub mod error;
pub mod file_cache;
pub mod simulation;
pub mod types;

pub use client::ApiClient;
pub use config::{ClientConfig, SimulationDelays};
pub use error::{ClientError, ClientResult};
pub use file_cache::{CachedFile, CachedFileMeta, FileCache};
pub use simulation::Simulator;
pub use types::{Fetched, PlacedOrder, Source};
