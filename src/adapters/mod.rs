// Adapters layer: concrete implementations of the domain ports.

pub mod graph_api;
pub mod observer;

pub use graph_api::GraphApiClient;
pub use observer::{NoopObserver, RecordingObserver, TracingObserver};
