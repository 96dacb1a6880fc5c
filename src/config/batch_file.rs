use crate::core::classifier::{self, FilenameClassifier, RawFile};
use crate::domain::model::{
    AdGroupInput, AspectRatio, BatchCreateRequest, MediaAsset, MediaKind, MediaPayload,
};
use crate::domain::ports::Storage;
use crate::utils::error::{AdBatchError, Result};
use crate::utils::validation;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static ENV_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("placeholder pattern is valid"));

/// Batch description loaded from TOML.
///
/// ```toml
/// [batch]
/// access_token = "${META_ACCESS_TOKEN}"
/// template_ad_id = "120200000000000001"
/// new_ad_set_name = "Spring launch"
/// scheduled_time = "2026-11-01T09:00:00Z"
///
/// [defaults]
/// primary_text = "New arrivals"
/// headline = "Shop now"
/// url = "https://example.com/spring"
///
/// [assets]
/// directory = "creatives"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchFile {
    pub batch: BatchSection,
    pub defaults: Option<CopyDefaults>,
    pub assets: Option<AssetsSection>,
    #[serde(default)]
    pub ads: Vec<AdEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSection {
    pub access_token: String,
    pub template_ad_id: String,
    pub new_ad_set_name: String,
    /// RFC 3339, quoted.
    pub scheduled_time: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CopyDefaults {
    #[serde(default)]
    pub primary_text: String,
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
    pub url: String,
}

/// Files grouped into ads by filename.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsSection {
    /// Relative to the batch file.
    pub directory: Option<String>,
    /// Explicit file list; empty means every image or video in the directory.
    #[serde(default)]
    pub files: Vec<String>,
}

/// An explicitly declared ad.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdEntry {
    pub name: String,
    pub primary_text: Option<String>,
    pub headline: Option<String>,
    pub url: Option<String>,
    #[serde(default)]
    pub media: Vec<MediaEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaEntry {
    /// Local file, read through storage.
    pub file: Option<String>,
    /// Hosted URL handed to the platform as-is.
    pub url: Option<String>,
    pub filename: Option<String>,
    pub kind: Option<MediaKind>,
    pub aspect_ratio: Option<String>,
    /// Image hash or video id already on the platform.
    pub resolved_ref: Option<String>,
    pub thumbnail_url: Option<String>,
}

impl BatchFile {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AdBatchError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| AdBatchError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("batch.access_token", &self.batch.access_token)?;
        validation::validate_no_placeholder("batch.access_token", &self.batch.access_token)?;
        validation::validate_non_empty_string("batch.template_ad_id", &self.batch.template_ad_id)?;
        validation::validate_non_empty_string("batch.new_ad_set_name", &self.batch.new_ad_set_name)?;
        self.scheduled_time()?;

        if self.ads.is_empty() && self.assets.is_none() {
            return Err(AdBatchError::ConfigError {
                message: "batch file declares neither [[ads]] nor [assets]".to_string(),
            });
        }

        if let Some(defaults) = &self.defaults {
            if !defaults.url.is_empty() {
                validation::validate_url("defaults.url", &defaults.url)?;
            }
        }

        for (index, ad) in self.ads.iter().enumerate() {
            validation::validate_non_empty_string(&format!("ads[{}].name", index), &ad.name)?;
            if let Some(url) = &ad.url {
                validation::validate_url(&format!("ads[{}].url", index), url)?;
            }
            for (media_index, media) in ad.media.iter().enumerate() {
                if media.file.is_none() && media.url.is_none() && media.resolved_ref.is_none() {
                    return Err(AdBatchError::InvalidConfigValueError {
                        field: format!("ads[{}].media[{}]", index, media_index),
                        value: String::new(),
                        reason: "one of file, url or resolved_ref is required".to_string(),
                    });
                }
                if let Some(aspect) = &media.aspect_ratio {
                    aspect.parse::<AspectRatio>().map_err(|reason| {
                        AdBatchError::InvalidConfigValueError {
                            field: format!("ads[{}].media[{}].aspect_ratio", index, media_index),
                            value: aspect.clone(),
                            reason,
                        }
                    })?;
                }
            }
        }

        if let Some(assets) = &self.assets {
            if let Some(directory) = &assets.directory {
                validation::validate_path("assets.directory", directory)?;
            }
        }

        Ok(())
    }

    pub fn scheduled_time(&self) -> Result<Option<DateTime<Utc>>> {
        self.batch
            .scheduled_time
            .as_deref()
            .map(|raw| {
                DateTime::parse_from_rfc3339(raw)
                    .map(|time| time.with_timezone(&Utc))
                    .map_err(|e| AdBatchError::InvalidConfigValueError {
                        field: "batch.scheduled_time".to_string(),
                        value: raw.to_string(),
                        reason: format!("expected RFC 3339: {}", e),
                    })
            })
            .transpose()
    }

    /// Where media files live: `[assets].directory` resolved against the
    /// batch file's own directory.
    pub fn assets_root(&self, batch_path: &Path) -> Option<PathBuf> {
        let directory = self.assets.as_ref()?.directory.as_ref()?;
        let directory = Path::new(directory);
        if directory.is_absolute() {
            return Some(directory.to_path_buf());
        }
        let base = batch_path.parent().unwrap_or_else(|| Path::new(""));
        Some(base.join(directory))
    }

    /// Explicit `[[ads]]` first, then groups derived from `[assets]`.
    ///
    /// A media file that cannot be read is kept without a payload; its ad
    /// then fails on its own instead of aborting the batch.
    pub async fn into_request<S: Storage>(self, storage: &S) -> Result<BatchCreateRequest> {
        let scheduled_time = self.scheduled_time()?;
        let defaults = self.defaults.unwrap_or_default();
        let mut ads = Vec::with_capacity(self.ads.len());

        for entry in self.ads {
            let mut media = Vec::with_capacity(entry.media.len());
            for media_entry in entry.media {
                media.push(media_entry.into_asset(storage).await?);
            }
            ads.push(AdGroupInput {
                ad_name: entry.name,
                primary_text: entry.primary_text.unwrap_or_else(|| defaults.primary_text.clone()),
                headline: entry.headline.unwrap_or_else(|| defaults.headline.clone()),
                url: entry.url.unwrap_or_else(|| defaults.url.clone()),
                media,
            });
        }

        if let Some(assets) = self.assets {
            let filenames = if assets.files.is_empty() {
                media_files(storage.list_files().await?)
            } else {
                assets.files
            };
            tracing::info!("📂 Grouping {} asset files", filenames.len());

            let mut files = Vec::with_capacity(filenames.len());
            for filename in filenames {
                let payload = read_payload(storage, &filename).await;
                files.push(RawFile::new(filename, payload));
            }

            let mut grouper = FilenameClassifier::new();
            grouper.add_files(files);
            for mut group in grouper.into_groups() {
                group.copy.primary_text = defaults.primary_text.clone();
                group.copy.headline = defaults.headline.clone();
                group.copy.url = defaults.url.clone();
                ads.push(group.into());
            }
        }

        Ok(BatchCreateRequest {
            access_token: self.batch.access_token,
            template_ad_id: self.batch.template_ad_id,
            new_ad_set_name: self.batch.new_ad_set_name,
            scheduled_time,
            ads,
        })
    }
}

impl MediaEntry {
    fn display_name(&self) -> Option<String> {
        if let Some(name) = &self.filename {
            return Some(name.clone());
        }
        if let Some(file) = &self.file {
            return Path::new(file)
                .file_name()
                .and_then(|name| name.to_str())
                .map(str::to_string);
        }
        if let Some(url) = &self.url {
            return url::Url::parse(url)
                .ok()
                .and_then(|parsed| {
                    parsed
                        .path_segments()
                        .and_then(|mut segments| segments.next_back().map(str::to_string))
                })
                .filter(|segment| !segment.is_empty());
        }
        self.resolved_ref.clone()
    }

    async fn into_asset<S: Storage>(self, storage: &S) -> Result<MediaAsset> {
        let filename = self.display_name().ok_or_else(|| AdBatchError::ConfigError {
            message: "media entry needs a filename, file, url or resolved_ref".to_string(),
        })?;
        let kind = self
            .kind
            .unwrap_or_else(|| MediaKind::from_filename(&filename));
        let aspect = match &self.aspect_ratio {
            Some(raw) => raw.parse::<AspectRatio>().map_err(|reason| {
                AdBatchError::InvalidConfigValueError {
                    field: "aspect_ratio".to_string(),
                    value: raw.clone(),
                    reason,
                }
            })?,
            None => classifier::aspect_tag(&filename),
        };

        let mut asset = MediaAsset::new(filename, kind, aspect);
        asset.payload = match (&self.file, self.url) {
            (Some(file), _) => read_payload(storage, file).await,
            (None, Some(url)) => Some(MediaPayload::Hosted(url)),
            (None, None) => None,
        };
        asset.resolved_ref = self.resolved_ref;
        asset.resolved_thumbnail_url = self.thumbnail_url;
        Ok(asset)
    }
}

/// Directory entries that look like images or videos. Batch files, result
/// exports and anything else sharing the directory are left out.
fn media_files(listing: Vec<String>) -> Vec<String> {
    listing
        .into_iter()
        .filter(|name| {
            let is_media = MediaKind::from_extension(name).is_some();
            if !is_media {
                tracing::debug!("🙈 Ignoring non-media file {}", name);
            }
            is_media
        })
        .collect()
}

async fn read_payload<S: Storage>(storage: &S, path: &str) -> Option<MediaPayload> {
    match storage.read_file(path).await {
        Ok(bytes) => Some(MediaPayload::Inline(bytes)),
        Err(e) => {
            tracing::warn!("⚠️ Could not read media file {}: {}", path, e);
            None
        }
    }
}

/// `${VAR}` from the environment; unknown variables stay as written.
pub fn substitute_env_vars(content: &str) -> String {
    ENV_PLACEHOLDER
        .replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
}

/// A `BatchCreateRequest` serialized as JSON, with the same placeholder
/// substitution as the TOML form.
pub fn load_json_request<P: AsRef<Path>>(path: P) -> Result<BatchCreateRequest> {
    let content = std::fs::read_to_string(&path).map_err(AdBatchError::IoError)?;
    let request = serde_json::from_str(&substitute_env_vars(&content))?;
    Ok(request)
}

pub fn is_json_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}
