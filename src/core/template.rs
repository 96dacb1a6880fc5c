use crate::domain::model::{AdSetConfig, ResolvedTemplate, TemplateContext};
use crate::domain::ports::AdsApi;
use crate::utils::error::{AdBatchError, Result};
use serde::Deserialize;

const AD_FIELDS: [&str; 4] = ["id", "adset_id", "account_id", "creative{id,object_story_spec}"];

const AD_SET_FIELDS: [&str; 14] = [
    "id",
    "campaign_id",
    "targeting",
    "billing_event",
    "optimization_goal",
    "bid_amount",
    "bid_strategy",
    "daily_budget",
    "lifetime_budget",
    "promoted_object",
    "destination_type",
    "attribution_spec",
    "start_time",
    "end_time",
];

#[derive(Debug, Deserialize)]
struct AdNode {
    adset_id: Option<String>,
    account_id: Option<String>,
    creative: Option<CreativeNode>,
}

#[derive(Debug, Deserialize)]
struct CreativeNode {
    object_story_spec: Option<serde_json::Value>,
}

/// Reads the template ad and its ad set. Any failure here is batch-fatal.
pub struct TemplateResolver<'a, A: AdsApi> {
    api: &'a A,
}

impl<'a, A: AdsApi> TemplateResolver<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    pub async fn resolve(&self, access_token: &str, template_ad_id: &str) -> Result<ResolvedTemplate> {
        tracing::debug!("📥 Reading template ad {}", template_ad_id);
        let ad_body = self
            .api
            .read_object(access_token, template_ad_id, &AD_FIELDS)
            .await
            .map_err(|e| resolution_error(format!("could not read ad {}: {}", template_ad_id, e.upstream_message())))?;

        let ad: AdNode = serde_json::from_value(ad_body)
            .map_err(|e| resolution_error(format!("unexpected ad payload: {}", e)))?;

        let ad_set_id = ad
            .adset_id
            .ok_or_else(|| resolution_error(format!("ad {} has no ad set", template_ad_id)))?;
        let account_id = ad
            .account_id
            .ok_or_else(|| resolution_error(format!("ad {} has no account id", template_ad_id)))?;

        let story_spec = ad
            .creative
            .and_then(|creative| creative.object_story_spec)
            .unwrap_or(serde_json::Value::Null);

        let page_id = extract_page_id(&story_spec).ok_or_else(|| {
            resolution_error(format!(
                "no page id found in the creative story spec of ad {}",
                template_ad_id
            ))
        })?;

        tracing::debug!("📥 Reading template ad set {}", ad_set_id);
        let ad_set_body = self
            .api
            .read_object(access_token, &ad_set_id, &AD_SET_FIELDS)
            .await
            .map_err(|e| resolution_error(format!("could not read ad set {}: {}", ad_set_id, e.upstream_message())))?;

        let ad_set: AdSetConfig = serde_json::from_value(ad_set_body)
            .map_err(|e| resolution_error(format!("unexpected ad set payload: {}", e)))?;

        tracing::info!(
            "📋 Template resolved: ad {} → ad set {} (account {}, page {})",
            template_ad_id,
            ad_set_id,
            account_id,
            page_id
        );

        Ok(ResolvedTemplate {
            context: TemplateContext {
                source_ad_id: template_ad_id.to_string(),
                source_ad_set_id: ad_set_id,
                account_id,
                page_id,
                source_creative_spec: story_spec,
            },
            ad_set,
        })
    }
}

fn resolution_error(message: String) -> AdBatchError {
    AdBatchError::TemplateResolutionError { message }
}

fn extract_page_id(story_spec: &serde_json::Value) -> Option<String> {
    match story_spec.get("page_id")? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
