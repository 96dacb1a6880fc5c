use crate::domain::model::MediaPayload;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// Ordered form fields of a create call.
pub type FormParams = Vec<(String, String)>;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Names of the files directly under the storage root, sorted.
    fn list_files(&self) -> impl std::future::Future<Output = Result<Vec<String>>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn api_base_url(&self) -> &str;
    fn api_version(&self) -> &str;
    /// `None` keeps the transport default.
    fn request_timeout(&self) -> Option<Duration>;
}

/// The upstream Ads Platform API. Every call carries its own access token and
/// returns the decoded JSON body.
#[async_trait]
pub trait AdsApi: Send + Sync {
    async fn read_object(
        &self,
        access_token: &str,
        object_id: &str,
        fields: &[&str],
    ) -> Result<serde_json::Value>;

    async fn create_ad_set(
        &self,
        access_token: &str,
        account_id: &str,
        params: &FormParams,
    ) -> Result<serde_json::Value>;

    async fn create_ad_image(
        &self,
        access_token: &str,
        account_id: &str,
        filename: &str,
        payload: &MediaPayload,
    ) -> Result<serde_json::Value>;

    async fn create_ad_video(
        &self,
        access_token: &str,
        account_id: &str,
        filename: &str,
        payload: &MediaPayload,
    ) -> Result<serde_json::Value>;

    async fn create_ad_creative(
        &self,
        access_token: &str,
        account_id: &str,
        params: &FormParams,
    ) -> Result<serde_json::Value>;

    async fn create_ad(
        &self,
        access_token: &str,
        account_id: &str,
        params: &FormParams,
    ) -> Result<serde_json::Value>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchState {
    ResolvingTemplate,
    DuplicatingAdSet,
    ProcessingGroups,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    ResolveTemplate,
    DuplicateAdSet,
    ResolveMedia,
    BuildCreative,
    CreateAd,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum StepOutcome {
    /// Carries the id produced by the step, if any.
    Succeeded(Option<String>),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepEvent {
    /// `None` for the batch-level steps.
    pub group_index: Option<usize>,
    pub step: PipelineStep,
    pub outcome: StepOutcome,
}

/// Receives structured progress from the batch orchestrator.
pub trait BatchObserver: Send + Sync {
    fn on_step(&self, event: &StepEvent);

    fn on_state(&self, _state: BatchState) {}
}
