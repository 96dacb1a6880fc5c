use crate::core::response_id;
use crate::domain::model::{AdGroup, MediaAsset, MediaKind, ResolvedMedia};
use crate::domain::ports::AdsApi;
use crate::utils::error::{AdBatchError, Result};

/// Turns assets into platform references, uploading only when needed.
pub struct MediaResolver<'a, A: AdsApi> {
    api: &'a A,
    access_token: &'a str,
    account_id: &'a str,
}

impl<'a, A: AdsApi> MediaResolver<'a, A> {
    pub fn new(api: &'a A, access_token: &'a str, account_id: &'a str) -> Self {
        Self {
            api,
            access_token,
            account_id,
        }
    }

    /// Resolves one asset. `Ok(None)` means the asset carried neither a
    /// reference nor a payload and was skipped.
    pub async fn resolve(&self, asset: &MediaAsset) -> Result<Option<ResolvedMedia>> {
        if let Some(reference) = asset.resolved_ref.as_deref().filter(|r| !r.is_empty()) {
            tracing::debug!("♻️ Reusing {} for {}", reference, asset.filename);
            return Ok(Some(resolved(asset, reference.to_string())));
        }

        let Some(payload) = asset.payload.as_ref() else {
            tracing::warn!(
                "⚠️ Skipping {}: no payload and no resolved reference",
                asset.filename
            );
            return Ok(None);
        };

        let reference = match asset.kind {
            MediaKind::Image => {
                let body = self
                    .api
                    .create_ad_image(self.access_token, self.account_id, &asset.filename, payload)
                    .await
                    .map_err(|e| upload_error(asset, e.upstream_message()))?;
                image_hash(&body).ok_or_else(|| {
                    upload_error(asset, format!("image upload response had no hash: {}", body))
                })?
            }
            MediaKind::Video => {
                let body = self
                    .api
                    .create_ad_video(self.access_token, self.account_id, &asset.filename, payload)
                    .await
                    .map_err(|e| upload_error(asset, e.upstream_message()))?;
                response_id(&body).ok_or_else(|| {
                    upload_error(asset, format!("video upload response had no id: {}", body))
                })?
            }
        };

        tracing::debug!("⬆️ Uploaded {} as {}", asset.filename, reference);
        Ok(Some(resolved(asset, reference)))
    }

    /// Resolves every asset of a group in order. A group that ends up with no
    /// resolved media fails with `NoMediaResolvedError`.
    pub async fn resolve_group(&self, group: &AdGroup) -> Result<Vec<ResolvedMedia>> {
        let mut resolved = Vec::with_capacity(group.media.len());
        for asset in &group.media {
            if let Some(media) = self.resolve(asset).await? {
                resolved.push(media);
            }
        }

        if resolved.is_empty() {
            return Err(AdBatchError::NoMediaResolvedError {
                group: group.key.clone(),
            });
        }
        Ok(resolved)
    }
}

fn resolved(asset: &MediaAsset, reference: String) -> ResolvedMedia {
    ResolvedMedia {
        reference,
        aspect: asset.aspect_ratio,
        kind: asset.kind,
        thumbnail_url: match asset.kind {
            MediaKind::Video => asset.resolved_thumbnail_url.clone(),
            MediaKind::Image => None,
        },
    }
}

fn upload_error(asset: &MediaAsset, message: String) -> AdBatchError {
    AdBatchError::MediaUploadError {
        filename: asset.filename.clone(),
        message,
    }
}

/// The hash of the single entry of `{ "images": { "<name>": { "hash": ... } } }`.
fn image_hash(body: &serde_json::Value) -> Option<String> {
    body.get("images")?
        .as_object()?
        .values()
        .next()?
        .get("hash")?
        .as_str()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{Endpoint, FakeAdsApi};
    use crate::domain::model::{AspectRatio, MediaPayload};

    fn image(name: &str) -> MediaAsset {
        MediaAsset::new(name, MediaKind::Image, AspectRatio::Square)
            .with_payload(MediaPayload::Inline(vec![0xff, 0xd8]))
    }

    fn video(name: &str) -> MediaAsset {
        MediaAsset::new(name, MediaKind::Video, AspectRatio::Vertical)
            .with_payload(MediaPayload::Hosted(format!("https://cdn.example.com/{}", name)))
    }

    #[tokio::test]
    async fn test_pre_resolved_reference_skips_upload() {
        let api = FakeAdsApi::new();
        let resolver = MediaResolver::new(&api, "token", "42");

        let asset = image("a_1x1.jpg").with_resolved_ref("abc123");
        let media = resolver.resolve(&asset).await.unwrap().unwrap();

        assert_eq!(media.reference, "abc123");
        assert!(api.calls_to(Endpoint::CreateAdImage).is_empty());

        let clip = video("a_9x16.mp4")
            .with_resolved_ref("vid_9")
            .with_thumbnail_url("https://cdn.example.com/thumb.jpg");
        let media = resolver.resolve(&clip).await.unwrap().unwrap();

        assert_eq!(media.reference, "vid_9");
        assert_eq!(media.thumbnail_url.as_deref(), Some("https://cdn.example.com/thumb.jpg"));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_image_upload_takes_hash_from_map() {
        let api = FakeAdsApi::new();
        let resolver = MediaResolver::new(&api, "token", "42");

        let media = resolver.resolve(&image("a_1x1.jpg")).await.unwrap().unwrap();

        assert_eq!(media.reference, "hash_1");
        assert_eq!(media.kind, MediaKind::Image);
        assert_eq!(media.aspect, AspectRatio::Square);
        assert_eq!(api.calls_to(Endpoint::CreateAdImage).len(), 1);
    }

    #[tokio::test]
    async fn test_video_upload_takes_id() {
        let api = FakeAdsApi::new();
        let resolver = MediaResolver::new(&api, "token", "42");

        let media = resolver.resolve(&video("a_9x16.mp4")).await.unwrap().unwrap();

        assert_eq!(media.reference, "video_1");
        assert!(media.thumbnail_url.is_none());
        let calls = api.calls_to(Endpoint::CreateAdVideo);
        assert_eq!(calls[0].param("url"), Some("https://cdn.example.com/a_9x16.mp4"));
    }

    #[tokio::test]
    async fn test_asset_without_payload_is_skipped() {
        let api = FakeAdsApi::new();
        let resolver = MediaResolver::new(&api, "token", "42");

        let mut group = AdGroup::new("a");
        group
            .media
            .push(MediaAsset::new("a_4x5.jpg", MediaKind::Image, AspectRatio::Portrait));
        group.media.push(image("a_1x1.jpg"));

        let resolved = resolver.resolve_group(&group).await.unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].aspect, AspectRatio::Square);
    }

    #[tokio::test]
    async fn test_empty_group_is_no_media_resolved() {
        let api = FakeAdsApi::new();
        let resolver = MediaResolver::new(&api, "token", "42");

        let mut group = AdGroup::new("ghost");
        group
            .media
            .push(MediaAsset::new("ghost.jpg", MediaKind::Image, AspectRatio::Other));

        let err = resolver.resolve_group(&group).await.unwrap_err();
        assert!(matches!(err, AdBatchError::NoMediaResolvedError { ref group } if group == "ghost"));

        let err = resolver.resolve_group(&AdGroup::new("empty")).await.unwrap_err();
        assert!(matches!(err, AdBatchError::NoMediaResolvedError { .. }));
    }

    #[tokio::test]
    async fn test_upload_failure_keeps_platform_message() {
        let api = FakeAdsApi::new().failing(Endpoint::CreateAdImage, 0, "Image too small");
        let resolver = MediaResolver::new(&api, "token", "42");

        let err = resolver.resolve(&image("tiny.jpg")).await.unwrap_err();
        match err {
            AdBatchError::MediaUploadError { filename, message } => {
                assert_eq!(filename, "tiny.jpg");
                assert_eq!(message, "Image too small");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
