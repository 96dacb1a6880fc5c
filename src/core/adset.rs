use crate::core::{form_value, push_param, response_id};
use crate::domain::model::AdSetConfig;
use crate::domain::ports::{AdsApi, FormParams};
use crate::utils::error::{AdBatchError, Result};

pub const DEFAULT_BILLING_EVENT: &str = "IMPRESSIONS";
pub const DEFAULT_OPTIMIZATION_GOAL: &str = "LINK_CLICKS";
pub const PAUSED: &str = "PAUSED";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedAdSet {
    pub id: String,
    pub name: String,
}

/// Builds the sparse create request for the clone. Only fields present on the
/// source are copied; billing event and optimization goal fall back to
/// defaults. The clone is always paused.
pub fn build_ad_set_params(config: &AdSetConfig, campaign_id: &str, name: &str) -> FormParams {
    let mut params = FormParams::new();
    push_param(&mut params, "name", name);
    push_param(&mut params, "campaign_id", campaign_id);
    push_param(&mut params, "status", PAUSED);
    push_param(
        &mut params,
        "billing_event",
        config.billing_event.as_deref().unwrap_or(DEFAULT_BILLING_EVENT),
    );
    push_param(
        &mut params,
        "optimization_goal",
        config
            .optimization_goal
            .as_deref()
            .unwrap_or(DEFAULT_OPTIMIZATION_GOAL),
    );

    let copied: [(&str, Option<serde_json::Value>); 8] = [
        ("targeting", config.targeting.clone()),
        ("bid_amount", config.bid_amount.clone()),
        ("bid_strategy", config.bid_strategy.clone().map(Into::into)),
        ("daily_budget", config.daily_budget.clone()),
        ("lifetime_budget", config.lifetime_budget.clone()),
        ("promoted_object", config.promoted_object.clone()),
        ("destination_type", config.destination_type.clone().map(Into::into)),
        ("attribution_spec", config.attribution_spec.clone()),
    ];

    for (key, value) in copied {
        match value {
            Some(serde_json::Value::Null) | None => {}
            Some(value) => push_param(&mut params, key, form_value(&value)),
        }
    }

    params
}

/// Creates the one ad set a batch hangs its ads on. Failure is batch-fatal.
pub struct AdSetDuplicator<'a, A: AdsApi> {
    api: &'a A,
}

impl<'a, A: AdsApi> AdSetDuplicator<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    pub async fn duplicate(
        &self,
        access_token: &str,
        account_id: &str,
        campaign_id: &str,
        config: &AdSetConfig,
        new_name: &str,
    ) -> Result<CreatedAdSet> {
        let params = build_ad_set_params(config, campaign_id, new_name);
        tracing::debug!(
            "🧬 Creating ad set '{}' in campaign {} with fields {:?}",
            new_name,
            campaign_id,
            params.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>()
        );

        let body = self
            .api
            .create_ad_set(access_token, account_id, &params)
            .await
            .map_err(|e| AdBatchError::AdSetCreationError {
                message: e.upstream_message(),
            })?;

        let id = response_id(&body).ok_or_else(|| AdBatchError::AdSetCreationError {
            message: format!("create ad set response had no id: {}", body),
        })?;

        tracing::info!("🧬 Created paused ad set {} ('{}')", id, new_name);
        Ok(CreatedAdSet {
            id,
            name: new_name.to_string(),
        })
    }
}
