use crate::domain::model::MediaPayload;
use crate::domain::ports::{AdsApi, ConfigProvider, FormParams};
use crate::utils::error::{PlatformError, Result};
use async_trait::async_trait;
use base64::Engine;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://graph.facebook.com";
pub const DEFAULT_API_VERSION: &str = "v21.0";

/// reqwest client for the Ads Platform (Graph) API. Form-encoded requests,
/// JSON responses, access token on every call. No retries.
#[derive(Debug, Clone)]
pub struct GraphApiClient {
    client: Client,
    base_url: String,
    api_version: String,
}

impl GraphApiClient {
    pub fn new(base_url: impl Into<String>, api_version: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, api_version, None)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        api_version: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_version: api_version.into().trim_matches('/').to_string(),
        })
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        Self::with_timeout(
            config.api_base_url(),
            config.api_version(),
            config.request_timeout(),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.api_version, path)
    }

    fn account_url(&self, account_id: &str, edge: &str) -> String {
        self.url(&format!("{}/{}", account_node(account_id), edge))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        tracing::debug!("📡 API response status: {} ({} bytes)", status, body.len());

        if !status.is_success() {
            return Err(PlatformError::from_body(status.as_u16(), &body).into());
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|_| PlatformError::from_body(status.as_u16(), &body))?;
        if value.get("error").is_some() {
            return Err(PlatformError::from_body(status.as_u16(), &body).into());
        }
        Ok(value)
    }

    async fn post_form(&self, url: String, access_token: &str, params: &FormParams) -> Result<Value> {
        tracing::debug!("📡 POST {}", url);
        let mut form: Vec<(&str, &str)> = params
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect();
        form.push(("access_token", access_token));

        self.send(self.client.post(url).form(&form)).await
    }
}

/// `act_`-prefixed account node.
fn account_node(account_id: &str) -> String {
    if account_id.starts_with("act_") {
        account_id.to_string()
    } else {
        format!("act_{}", account_id)
    }
}

#[async_trait]
impl AdsApi for GraphApiClient {
    async fn read_object(&self, access_token: &str, object_id: &str, fields: &[&str]) -> Result<Value> {
        let url = self.url(object_id);
        tracing::debug!("📡 GET {}", url);
        let request = self
            .client
            .get(url)
            .query(&[("fields", fields.join(",").as_str()), ("access_token", access_token)]);
        self.send(request).await
    }

    async fn create_ad_set(&self, access_token: &str, account_id: &str, params: &FormParams) -> Result<Value> {
        self.post_form(self.account_url(account_id, "adsets"), access_token, params)
            .await
    }

    async fn create_ad_image(
        &self,
        access_token: &str,
        account_id: &str,
        filename: &str,
        payload: &MediaPayload,
    ) -> Result<Value> {
        let mut params: FormParams = vec![("name".to_string(), filename.to_string())];
        match payload {
            MediaPayload::Inline(bytes) => params.push((
                "bytes".to_string(),
                base64::engine::general_purpose::STANDARD.encode(bytes),
            )),
            MediaPayload::Hosted(url) => params.push(("url".to_string(), url.clone())),
        }
        self.post_form(self.account_url(account_id, "adimages"), access_token, &params)
            .await
    }

    async fn create_ad_video(
        &self,
        access_token: &str,
        account_id: &str,
        filename: &str,
        payload: &MediaPayload,
    ) -> Result<Value> {
        let url = self.account_url(account_id, "advideos");
        match payload {
            MediaPayload::Hosted(file_url) => {
                let params: FormParams = vec![
                    ("name".to_string(), filename.to_string()),
                    ("file_url".to_string(), file_url.clone()),
                ];
                self.post_form(url, access_token, &params).await
            }
            MediaPayload::Inline(bytes) => {
                // Raw video cannot be form-encoded; this is the one multipart upload.
                tracing::debug!("📡 POST {} (multipart, {} bytes)", url, bytes.len());
                let form = Form::new()
                    .text("access_token", access_token.to_string())
                    .text("name", filename.to_string())
                    .part("source", Part::bytes(bytes.clone()).file_name(filename.to_string()));
                self.send(self.client.post(url).multipart(form)).await
            }
        }
    }

    async fn create_ad_creative(&self, access_token: &str, account_id: &str, params: &FormParams) -> Result<Value> {
        self.post_form(self.account_url(account_id, "adcreatives"), access_token, params)
            .await
    }

    async fn create_ad(&self, access_token: &str, account_id: &str, params: &FormParams) -> Result<Value> {
        self.post_form(self.account_url(account_id, "ads"), access_token, params)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::AdBatchError;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client(server: &MockServer) -> GraphApiClient {
        GraphApiClient::new(server.base_url(), "v21.0").unwrap()
    }

    #[tokio::test]
    async fn test_read_object_sends_fields_and_token() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/v21.0/123")
                .query_param("fields", "id,adset_id")
                .query_param("access_token", "secret");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({ "id": "123", "adset_id": "456" }));
        });

        let body = client(&server)
            .read_object("secret", "123", &["id", "adset_id"])
            .await
            .unwrap();

        api_mock.assert();
        assert_eq!(body["adset_id"], "456");
    }

    #[tokio::test]
    async fn test_create_ad_set_posts_form_to_account_edge() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v21.0/act_42/adsets")
                .body_contains("status=PAUSED")
                .body_contains("access_token=secret");
            then.status(200).json_body(json!({ "id": "999" }));
        });

        let params: FormParams = vec![
            ("name".to_string(), "Clone".to_string()),
            ("status".to_string(), "PAUSED".to_string()),
        ];
        let body = client(&server).create_ad_set("secret", "42", &params).await.unwrap();

        api_mock.assert();
        assert_eq!(body["id"], "999");
    }

    #[tokio::test]
    async fn test_account_prefix_is_not_doubled() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST).path("/v21.0/act_42/ads");
            then.status(200).json_body(json!({ "id": "1" }));
        });

        client(&server).create_ad("secret", "act_42", &FormParams::new()).await.unwrap();
        api_mock.assert();
    }

    #[tokio::test]
    async fn test_inline_image_is_base64_encoded() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v21.0/act_42/adimages")
                .body_contains("bytes=AQID")
                .body_contains("name=a_1x1.jpg");
            then.status(200)
                .json_body(json!({ "images": { "a_1x1.jpg": { "hash": "abc", "url": "https://x" } } }));
        });

        let body = client(&server)
            .create_ad_image("secret", "42", "a_1x1.jpg", &MediaPayload::Inline(vec![1, 2, 3]))
            .await
            .unwrap();

        api_mock.assert();
        assert_eq!(body["images"]["a_1x1.jpg"]["hash"], "abc");
    }

    #[tokio::test]
    async fn test_inline_video_uses_multipart_source() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v21.0/act_42/advideos")
                .body_contains("name=\"source\"")
                .body_contains("filename=\"clip.mp4\"");
            then.status(200).json_body(json!({ "id": "vid_1" }));
        });

        let body = client(&server)
            .create_ad_video("secret", "42", "clip.mp4", &MediaPayload::Inline(vec![0, 0, 0, 24]))
            .await
            .unwrap();

        api_mock.assert();
        assert_eq!(body["id"], "vid_1");
    }

    #[tokio::test]
    async fn test_error_body_is_parsed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v21.0/act_42/adcreatives");
            then.status(400).json_body(json!({
                "error": {
                    "message": "Invalid parameter",
                    "code": 100,
                    "error_subcode": 1885183,
                    "error_user_msg": "The page is not published."
                }
            }));
        });

        let err = client(&server)
            .create_ad_creative("secret", "42", &FormParams::new())
            .await
            .unwrap_err();

        match err {
            AdBatchError::Platform(platform) => {
                assert_eq!(platform.code, Some(100));
                assert_eq!(platform.error_subcode, Some(1885183));
                assert_eq!(platform.detail(), "The page is not published.");
                assert_eq!(platform.http_status, Some(400));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unparsable_error_body_is_kept_raw() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v21.0/act_42/ads");
            then.status(502).body("upstream unavailable");
        });

        let err = client(&server).create_ad("secret", "42", &FormParams::new()).await.unwrap_err();
        assert_eq!(err.upstream_message(), "upstream unavailable");
    }
}
