pub mod ad;
pub mod adset;
pub mod classifier;
pub mod creative;
pub mod media;
pub mod orchestrator;
pub mod template;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::domain::model::{
    AdGroup, AdGroupInput, AdResult, BatchCreateRequest, BatchCreateResult, MediaAsset,
    ResolvedMedia,
};
pub use crate::domain::ports::{AdsApi, BatchObserver, ConfigProvider, FormParams, Storage};
pub use crate::utils::error::Result;

/// The `id` of a create response.
pub(crate) fn response_id(body: &serde_json::Value) -> Option<String> {
    match body.get("id")? {
        serde_json::Value::String(id) if !id.is_empty() => Some(id.clone()),
        serde_json::Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

/// Form encoding of a JSON value: strings as-is, everything else as JSON text.
pub(crate) fn form_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn push_param(params: &mut FormParams, key: &str, value: impl Into<String>) {
    params.push((key.to_string(), value.into()));
}
