pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::cli::LocalStorage;
#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{GraphApiClient, NoopObserver, TracingObserver};
pub use config::batch_file::BatchFile;
pub use core::orchestrator::{plan, BatchOrchestrator, BatchOutcome, PlannedAd};
pub use domain::model::{
    AdGroupInput, AdResult, BatchCreateRequest, BatchCreateResult, MediaAsset,
};
pub use utils::error::{AdBatchError, Result};
