use crate::core::{push_param, response_id};
use crate::domain::model::{AdCopy, MediaKind, ResolvedMedia};
use crate::domain::ports::{AdsApi, FormParams};
use crate::utils::error::{AdBatchError, Result};
use serde::Serialize;
use serde_json::{json, Value};

pub const CALL_TO_ACTION: &str = "LEARN_MORE";
const SINGLE_IMAGE_FORMAT: &str = "SINGLE_IMAGE";

/// What a group's resolved media looks like, which decides the creative shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaComposition {
    /// One or more image hashes, in order.
    ImagesOnly { image_hashes: Vec<String> },
    /// A video with no image alongside it.
    VideoOnly {
        video_id: String,
        thumbnail_url: Option<String>,
    },
    /// A video plus an image used as its thumbnail.
    VideoWithThumbnailImage { video_id: String, image_hash: String },
}

/// The creative variant that will be submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CreativeVariant {
    Video,
    SingleImage,
    MultiImage,
}

impl CreativeVariant {
    /// Variant for a list of media kinds. `None` when there is no media.
    pub fn for_kinds<I>(kinds: I) -> Option<Self>
    where
        I: IntoIterator<Item = MediaKind>,
    {
        let mut images = 0usize;
        for kind in kinds {
            match kind {
                MediaKind::Video => return Some(CreativeVariant::Video),
                MediaKind::Image => images += 1,
            }
        }

        match images {
            0 => None,
            1 => Some(CreativeVariant::SingleImage),
            _ => Some(CreativeVariant::MultiImage),
        }
    }
}

impl MediaComposition {
    /// Classifies resolved media. Any video wins; the first video and the
    /// first image are the ones used. `None` for an empty slice.
    pub fn from_resolved(media: &[ResolvedMedia]) -> Option<Self> {
        let first_video = media.iter().find(|m| m.kind == MediaKind::Video);
        let image_hashes: Vec<String> = media
            .iter()
            .filter(|m| m.kind == MediaKind::Image)
            .map(|m| m.reference.clone())
            .collect();

        match (first_video, image_hashes.first()) {
            (Some(video), Some(image_hash)) => Some(MediaComposition::VideoWithThumbnailImage {
                video_id: video.reference.clone(),
                image_hash: image_hash.clone(),
            }),
            (Some(video), None) => Some(MediaComposition::VideoOnly {
                video_id: video.reference.clone(),
                thumbnail_url: video.thumbnail_url.clone(),
            }),
            (None, Some(_)) => Some(MediaComposition::ImagesOnly { image_hashes }),
            (None, None) => None,
        }
    }

    pub fn variant(&self) -> CreativeVariant {
        match self {
            MediaComposition::VideoOnly { .. } | MediaComposition::VideoWithThumbnailImage { .. } => {
                CreativeVariant::Video
            }
            MediaComposition::ImagesOnly { image_hashes } if image_hashes.len() == 1 => {
                CreativeVariant::SingleImage
            }
            MediaComposition::ImagesOnly { .. } => CreativeVariant::MultiImage,
        }
    }
}

/// Story spec plus, for multi-image creatives, the asset-feed spec.
#[derive(Debug, Clone, PartialEq)]
pub struct CreativeSpec {
    pub variant: CreativeVariant,
    pub object_story_spec: Value,
    pub asset_feed_spec: Option<Value>,
}

fn call_to_action(url: &str) -> Value {
    json!({ "type": CALL_TO_ACTION, "value": { "link": url } })
}

fn link_data(copy: &AdCopy, image_hash: &str) -> Value {
    json!({
        "message": copy.primary_text,
        "name": copy.headline,
        "link": copy.url,
        "image_hash": image_hash,
        "call_to_action": call_to_action(&copy.url),
    })
}

fn video_data(copy: &AdCopy, video_id: &str) -> Value {
    json!({
        "video_id": video_id,
        "message": copy.primary_text,
        "title": copy.headline,
        "link_description": copy.headline,
        "call_to_action": call_to_action(&copy.url),
    })
}

fn feed_spec(copy: &AdCopy, image_hashes: &[String]) -> Value {
    let images: Vec<Value> = image_hashes.iter().map(|hash| json!({ "hash": hash })).collect();
    json!({
        "images": images,
        "bodies": [{ "text": copy.primary_text }],
        "titles": [{ "text": copy.headline }],
        "descriptions": [{ "text": copy.headline }],
        "link_urls": [{ "website_url": copy.url }],
        "call_to_action_types": [CALL_TO_ACTION],
        "ad_formats": [SINGLE_IMAGE_FORMAT],
    })
}

/// Pure construction of the creative spec for a composition.
pub fn build_creative_spec(composition: &MediaComposition, page_id: &str, copy: &AdCopy) -> CreativeSpec {
    let variant = composition.variant();
    match composition {
        MediaComposition::VideoOnly {
            video_id,
            thumbnail_url,
        } => {
            let mut video = video_data(copy, video_id);
            match thumbnail_url {
                Some(url) => video["image_url"] = json!(url),
                None => tracing::warn!(
                    "⚠️ Video {} has no thumbnail; the platform will pick one",
                    video_id
                ),
            }
            CreativeSpec {
                variant,
                object_story_spec: json!({ "page_id": page_id, "video_data": video }),
                asset_feed_spec: None,
            }
        }
        MediaComposition::VideoWithThumbnailImage {
            video_id,
            image_hash,
        } => {
            let mut video = video_data(copy, video_id);
            video["image_hash"] = json!(image_hash);
            CreativeSpec {
                variant,
                object_story_spec: json!({ "page_id": page_id, "video_data": video }),
                asset_feed_spec: None,
            }
        }
        MediaComposition::ImagesOnly { image_hashes } => {
            let first = image_hashes.first().map(String::as_str).unwrap_or_default();
            let object_story_spec = json!({ "page_id": page_id, "link_data": link_data(copy, first) });
            let asset_feed_spec = match variant {
                CreativeVariant::MultiImage => Some(feed_spec(copy, image_hashes)),
                _ => None,
            };
            CreativeSpec {
                variant,
                object_story_spec,
                asset_feed_spec,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedCreative {
    pub id: String,
    pub variant: CreativeVariant,
}

/// Submits the creative for one group. Rejections stay with that group.
pub struct CreativeBuilder<'a, A: AdsApi> {
    api: &'a A,
    access_token: &'a str,
    account_id: &'a str,
    page_id: &'a str,
}

impl<'a, A: AdsApi> CreativeBuilder<'a, A> {
    pub fn new(api: &'a A, access_token: &'a str, account_id: &'a str, page_id: &'a str) -> Self {
        Self {
            api,
            access_token,
            account_id,
            page_id,
        }
    }

    pub async fn create(
        &self,
        creative_name: &str,
        media: &[ResolvedMedia],
        copy: &AdCopy,
    ) -> Result<CreatedCreative> {
        let composition =
            MediaComposition::from_resolved(media).ok_or_else(|| AdBatchError::NoMediaResolvedError {
                group: creative_name.to_string(),
            })?;
        let spec = build_creative_spec(&composition, self.page_id, copy);

        let mut params = FormParams::new();
        push_param(&mut params, "name", creative_name);
        push_param(&mut params, "object_story_spec", spec.object_story_spec.to_string());
        if let Some(feed) = &spec.asset_feed_spec {
            push_param(&mut params, "asset_feed_spec", feed.to_string());
        }

        tracing::debug!("🎨 Submitting {:?} creative '{}'", spec.variant, creative_name);
        let body = self
            .api
            .create_ad_creative(self.access_token, self.account_id, &params)
            .await
            .map_err(|e| AdBatchError::CreativeRejectedError {
                message: e.upstream_message(),
            })?;

        let id = response_id(&body).ok_or_else(|| AdBatchError::CreativeRejectedError {
            message: format!("create creative response had no id: {}", body),
        })?;

        Ok(CreatedCreative {
            id,
            variant: spec.variant,
        })
    }
}
