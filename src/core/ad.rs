use crate::core::adset::PAUSED;
use crate::core::{push_param, response_id};
use crate::domain::ports::{AdsApi, FormParams};
use crate::utils::error::{AdBatchError, Result};
use chrono::{DateTime, Utc};
use serde_json::json;

/// Builds the create-ad request. Ads are always created paused; a scheduled
/// time adds the configured/effective status flags on top of that.
pub fn build_ad_params(
    ad_set_id: &str,
    creative_id: &str,
    ad_name: &str,
    scheduled_time: Option<DateTime<Utc>>,
) -> FormParams {
    let mut params = FormParams::new();
    push_param(&mut params, "name", ad_name);
    push_param(&mut params, "adset_id", ad_set_id);
    push_param(&mut params, "creative", json!({ "creative_id": creative_id }).to_string());
    push_param(&mut params, "status", PAUSED);

    if scheduled_time.is_some() {
        push_param(&mut params, "configured_status", "ACTIVE");
        push_param(&mut params, "effective_status", "SCHEDULED");
    }

    params
}

pub struct AdCreator<'a, A: AdsApi> {
    api: &'a A,
    access_token: &'a str,
    account_id: &'a str,
}

impl<'a, A: AdsApi> AdCreator<'a, A> {
    pub fn new(api: &'a A, access_token: &'a str, account_id: &'a str) -> Self {
        Self {
            api,
            access_token,
            account_id,
        }
    }

    pub async fn create(
        &self,
        ad_set_id: &str,
        creative_id: &str,
        ad_name: &str,
        scheduled_time: Option<DateTime<Utc>>,
    ) -> Result<String> {
        let params = build_ad_params(ad_set_id, creative_id, ad_name, scheduled_time);
        if let Some(at) = scheduled_time {
            tracing::debug!("🗓️ Ad '{}' flagged as scheduled for {}", ad_name, at.to_rfc3339());
        }

        let body = self
            .api
            .create_ad(self.access_token, self.account_id, &params)
            .await
            .map_err(|e| AdBatchError::AdCreationError {
                message: e.upstream_message(),
            })?;

        response_id(&body).ok_or_else(|| AdBatchError::AdCreationError {
            message: format!("create ad response had no id: {}", body),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{Endpoint, FakeAdsApi};
    use chrono::TimeZone;

    #[test]
    fn test_unscheduled_ad_is_paused_only() {
        let params = build_ad_params("as_1", "cr_1", "Ad 1", None);

        assert!(params.contains(&("status".to_string(), "PAUSED".to_string())));
        assert!(params.contains(&("creative".to_string(), r#"{"creative_id":"cr_1"}"#.to_string())));
        assert!(!params.iter().any(|(k, _)| k == "configured_status"));
        assert!(!params.iter().any(|(k, _)| k == "effective_status"));
    }

    #[test]
    fn test_scheduled_ad_keeps_paused_and_adds_flags() {
        let at = Utc.with_ymd_and_hms(2026, 11, 1, 9, 0, 0).unwrap();
        let params = build_ad_params("as_1", "cr_1", "Ad 1", Some(at));

        assert!(params.contains(&("status".to_string(), "PAUSED".to_string())));
        assert!(params.contains(&("configured_status".to_string(), "ACTIVE".to_string())));
        assert!(params.contains(&("effective_status".to_string(), "SCHEDULED".to_string())));
    }

    #[tokio::test]
    async fn test_create_returns_ad_id() {
        let api = FakeAdsApi::new();
        let id = AdCreator::new(&api, "token", "42")
            .create("as_1", "cr_1", "Ad 1", None)
            .await
            .unwrap();

        assert_eq!(id, "ad_1");
        let call = &api.calls_to(Endpoint::CreateAd)[0];
        assert_eq!(call.param("adset_id"), Some("as_1"));
        assert_eq!(call.param("name"), Some("Ad 1"));
    }

    #[tokio::test]
    async fn test_failure_is_ad_creation_error() {
        let api = FakeAdsApi::new().failing(Endpoint::CreateAd, 0, "Ad set is archived");
        let err = AdCreator::new(&api, "token", "42")
            .create("as_1", "cr_1", "Ad 1", None)
            .await
            .unwrap_err();

        assert!(err.is_group_isolated());
        assert_eq!(err.upstream_message(), "Ad set is archived");
    }
}
