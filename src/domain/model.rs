use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    const VIDEO_EXTENSIONS: [&'static str; 6] = ["mp4", "mov", "m4v", "avi", "webm", "mkv"];
    const IMAGE_EXTENSIONS: [&'static str; 9] =
        ["jpg", "jpeg", "png", "gif", "bmp", "webp", "tif", "tiff", "heic"];

    /// Kind for a recognised image or video extension, `None` otherwise.
    pub fn from_extension(filename: &str) -> Option<Self> {
        let ext = std::path::Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())?
            .to_ascii_lowercase();

        if Self::VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Video)
        } else if Self::IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Image)
        } else {
            None
        }
    }

    /// Infers the kind from a filename extension. Anything that is not a known
    /// video container is treated as an image.
    pub fn from_filename(filename: &str) -> Self {
        Self::from_extension(filename).unwrap_or(MediaKind::Image)
    }
}

/// Aspect-ratio tag derived from the filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AspectRatio {
    #[serde(rename = "9x16")]
    Vertical,
    #[serde(rename = "4x5")]
    Portrait,
    #[serde(rename = "1x1")]
    Square,
    #[serde(rename = "16x9")]
    Landscape,
    #[serde(rename = "other")]
    #[default]
    Other,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Vertical => "9x16",
            AspectRatio::Portrait => "4x5",
            AspectRatio::Square => "1x1",
            AspectRatio::Landscape => "16x9",
            AspectRatio::Other => "other",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "x").as_str() {
            "9x16" => Ok(AspectRatio::Vertical),
            "4x5" => Ok(AspectRatio::Portrait),
            "1x1" => Ok(AspectRatio::Square),
            "16x9" => Ok(AspectRatio::Landscape),
            "other" => Ok(AspectRatio::Other),
            other => Err(format!("unknown aspect ratio '{}'", other)),
        }
    }
}

/// Where the bytes of an asset come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaPayload {
    /// Raw bytes, read locally.
    Inline(Vec<u8>),
    /// Durable URL handed over by the asset store.
    Hosted(String),
}

/// One creative asset, as received and as processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAsset {
    pub filename: String,
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
    pub kind: MediaKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<MediaPayload>,
    /// Image hash or video id already known to the platform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_thumbnail_url: Option<String>,
}

impl MediaAsset {
    pub fn new(filename: impl Into<String>, kind: MediaKind, aspect_ratio: AspectRatio) -> Self {
        Self {
            filename: filename.into(),
            aspect_ratio,
            kind,
            payload: None,
            resolved_ref: None,
            resolved_thumbnail_url: None,
        }
    }

    pub fn with_payload(mut self, payload: MediaPayload) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_resolved_ref(mut self, reference: impl Into<String>) -> Self {
        self.resolved_ref = Some(reference.into());
        self
    }

    pub fn with_thumbnail_url(mut self, url: impl Into<String>) -> Self {
        self.resolved_thumbnail_url = Some(url.into());
        self
    }
}

/// Media after it has a platform-native reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMedia {
    pub reference: String,
    pub aspect: AspectRatio,
    pub kind: MediaKind,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum GroupStatus {
    #[default]
    Pending,
    InProgress,
    Success,
    Failed,
}

/// Text and destination shared by every asset of an ad.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdCopy {
    pub primary_text: String,
    pub headline: String,
    pub url: String,
}

/// Assets sharing a derived filename prefix, destined to become one ad.
#[derive(Debug, Clone, PartialEq)]
pub struct AdGroup {
    pub key: String,
    pub media: Vec<MediaAsset>,
    pub ad_name: String,
    pub copy: AdCopy,
    pub status: GroupStatus,
    pub error: Option<String>,
}

impl AdGroup {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            ad_name: key.clone(),
            key,
            media: Vec::new(),
            copy: AdCopy::default(),
            status: GroupStatus::Pending,
            error: None,
        }
    }

    pub fn from_input(key: impl Into<String>, input: AdGroupInput) -> Self {
        Self {
            key: key.into(),
            media: input.media,
            ad_name: input.ad_name,
            copy: AdCopy {
                primary_text: input.primary_text,
                headline: input.headline,
                url: input.url,
            },
            status: GroupStatus::Pending,
            error: None,
        }
    }

    pub fn mark_in_progress(&mut self) {
        self.status = GroupStatus::InProgress;
        self.error = None;
    }

    pub fn mark_success(&mut self) {
        self.status = GroupStatus::Success;
        self.error = None;
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = GroupStatus::Failed;
        self.error = Some(error.into());
    }
}

impl From<AdGroup> for AdGroupInput {
    fn from(group: AdGroup) -> Self {
        Self {
            ad_name: group.ad_name,
            primary_text: group.copy.primary_text,
            headline: group.copy.headline,
            url: group.copy.url,
            media: group.media,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdGroupInput {
    pub ad_name: String,
    pub primary_text: String,
    pub headline: String,
    pub url: String,
    #[serde(default)]
    pub media: Vec<MediaAsset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCreateRequest {
    pub access_token: String,
    pub template_ad_id: String,
    pub new_ad_set_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<DateTime<Utc>>,
    pub ads: Vec<AdGroupInput>,
}

/// What was read from the template ad.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateContext {
    pub source_ad_id: String,
    pub source_ad_set_id: String,
    pub account_id: String,
    pub page_id: String,
    pub source_creative_spec: serde_json::Value,
}

/// Ad-set configuration as read from the template's ad set. Amounts are kept
/// as the raw JSON values the platform returned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdSetConfig {
    pub campaign_id: String,
    pub targeting: Option<serde_json::Value>,
    pub billing_event: Option<String>,
    pub optimization_goal: Option<String>,
    pub bid_amount: Option<serde_json::Value>,
    pub bid_strategy: Option<String>,
    pub daily_budget: Option<serde_json::Value>,
    pub lifetime_budget: Option<serde_json::Value>,
    pub promoted_object: Option<serde_json::Value>,
    pub destination_type: Option<String>,
    pub attribution_spec: Option<serde_json::Value>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTemplate {
    pub context: TemplateContext,
    pub ad_set: AdSetConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdResult {
    pub ad_name: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ad_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AdResult {
    pub fn succeeded(ad_name: impl Into<String>, ad_id: impl Into<String>) -> Self {
        Self {
            ad_name: ad_name.into(),
            success: true,
            ad_id: Some(ad_id.into()),
            error: None,
        }
    }

    pub fn failed(ad_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            ad_name: ad_name.into(),
            success: false,
            ad_id: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCreateResult {
    pub ad_set_id: String,
    pub ad_set_name: String,
    pub results: Vec<AdResult>,
}

impl BatchCreateResult {
    pub fn succeeded_count(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.len() - self.succeeded_count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|r| r.success)
    }
}
