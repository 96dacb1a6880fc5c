//! In-memory `AdsApi` used by the unit tests of the pipeline stages.

use crate::domain::model::MediaPayload;
use crate::domain::ports::{AdsApi, FormParams};
use crate::utils::error::{AdBatchError, PlatformError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    ReadObject,
    CreateAdSet,
    CreateAdImage,
    CreateAdVideo,
    CreateAdCreative,
    CreateAd,
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub endpoint: Endpoint,
    pub target: String,
    pub params: FormParams,
}

impl RecordedCall {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn json_param(&self, name: &str) -> Value {
        self.param(name)
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or(Value::Null)
    }
}

#[derive(Default)]
pub struct FakeAdsApi {
    objects: HashMap<String, Value>,
    failures: HashMap<(Endpoint, usize), PlatformError>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeAdsApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Template ad `ad_1` in account `42` pointing at ad set `as_1`.
    pub fn with_template(page_id: Option<&str>) -> Self {
        let story_spec = match page_id {
            Some(page_id) => json!({ "page_id": page_id, "link_data": { "link": "https://example.com" } }),
            None => json!({ "link_data": { "link": "https://example.com" } }),
        };

        Self::new()
            .with_object(
                "ad_1",
                json!({
                    "id": "ad_1",
                    "adset_id": "as_1",
                    "account_id": "42",
                    "creative": { "id": "cr_0", "object_story_spec": story_spec }
                }),
            )
            .with_object(
                "as_1",
                json!({
                    "id": "as_1",
                    "campaign_id": "camp_1",
                    "targeting": { "geo_locations": { "countries": ["US"] } },
                    "billing_event": "IMPRESSIONS",
                    "optimization_goal": "OFFSITE_CONVERSIONS",
                    "bid_strategy": "LOWEST_COST_WITHOUT_CAP",
                    "daily_budget": "5000",
                    "promoted_object": { "pixel_id": "px_1", "custom_event_type": "PURCHASE" },
                    "status": "ACTIVE"
                }),
            )
    }

    pub fn with_object(mut self, id: &str, body: Value) -> Self {
        self.objects.insert(id.to_string(), body);
        self
    }

    /// Fails the `nth` (zero-based) call to `endpoint`.
    pub fn failing(mut self, endpoint: Endpoint, nth: usize, message: &str) -> Self {
        let body = json!({ "error": { "message": "Invalid parameter", "code": 100, "error_user_msg": message } });
        self.failures
            .insert((endpoint, nth), PlatformError::from_body(400, &body.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn calls_to(&self, endpoint: Endpoint) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.endpoint == endpoint)
            .collect()
    }

    fn record(&self, endpoint: Endpoint, target: &str, params: FormParams) -> Result<usize> {
        let mut calls = self.calls.lock().expect("calls lock");
        let nth = calls.iter().filter(|call| call.endpoint == endpoint).count();
        calls.push(RecordedCall {
            endpoint,
            target: target.to_string(),
            params,
        });
        drop(calls);

        match self.failures.get(&(endpoint, nth)) {
            Some(error) => Err(AdBatchError::Platform(error.clone())),
            None => Ok(nth),
        }
    }
}

fn payload_param(payload: &MediaPayload) -> (String, String) {
    match payload {
        MediaPayload::Inline(bytes) => ("bytes".to_string(), format!("{} bytes", bytes.len())),
        MediaPayload::Hosted(url) => ("url".to_string(), url.clone()),
    }
}

#[async_trait]
impl AdsApi for FakeAdsApi {
    async fn read_object(&self, _token: &str, object_id: &str, fields: &[&str]) -> Result<Value> {
        self.record(
            Endpoint::ReadObject,
            object_id,
            vec![("fields".to_string(), fields.join(","))],
        )?;
        self.objects.get(object_id).cloned().ok_or_else(|| {
            AdBatchError::Platform(PlatformError::from_body(
                400,
                r#"{"error":{"message":"Unsupported get request.","code":100,"error_subcode":33}}"#,
            ))
        })
    }

    async fn create_ad_set(&self, _token: &str, account_id: &str, params: &FormParams) -> Result<Value> {
        let nth = self.record(Endpoint::CreateAdSet, account_id, params.clone())?;
        Ok(json!({ "id": format!("new_as_{}", nth + 1) }))
    }

    async fn create_ad_image(
        &self,
        _token: &str,
        account_id: &str,
        filename: &str,
        payload: &MediaPayload,
    ) -> Result<Value> {
        let params = vec![("name".to_string(), filename.to_string()), payload_param(payload)];
        let nth = self.record(Endpoint::CreateAdImage, account_id, params)?;
        Ok(json!({ "images": { filename: { "hash": format!("hash_{}", nth + 1) } } }))
    }

    async fn create_ad_video(
        &self,
        _token: &str,
        account_id: &str,
        filename: &str,
        payload: &MediaPayload,
    ) -> Result<Value> {
        let params = vec![("name".to_string(), filename.to_string()), payload_param(payload)];
        let nth = self.record(Endpoint::CreateAdVideo, account_id, params)?;
        Ok(json!({ "id": format!("video_{}", nth + 1) }))
    }

    async fn create_ad_creative(&self, _token: &str, account_id: &str, params: &FormParams) -> Result<Value> {
        let nth = self.record(Endpoint::CreateAdCreative, account_id, params.clone())?;
        Ok(json!({ "id": format!("creative_{}", nth + 1) }))
    }

    async fn create_ad(&self, _token: &str, account_id: &str, params: &FormParams) -> Result<Value> {
        let nth = self.record(Endpoint::CreateAd, account_id, params.clone())?;
        Ok(json!({ "id": format!("ad_{}", nth + 1) }))
    }
}
