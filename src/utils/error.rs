use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Error body returned by the Ads Platform API:
/// `{ "error": { "message", "code", "error_subcode"?, "error_user_msg"? } }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlatformError {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub error_subcode: Option<i64>,
    #[serde(default)]
    pub error_user_title: Option<String>,
    #[serde(default)]
    pub error_user_msg: Option<String>,
    #[serde(skip)]
    pub http_status: Option<u16>,
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.detail())?;
        if let Some(code) = self.code {
            write!(f, " (code {}", code)?;
            if let Some(subcode) = self.error_subcode {
                write!(f, ", subcode {}", subcode)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl std::error::Error for PlatformError {}

#[derive(Deserialize)]
struct PlatformErrorEnvelope {
    error: PlatformError,
}

impl PlatformError {
    /// Parses an upstream error body. Bodies that are not the expected JSON
    /// envelope are kept verbatim as the message.
    pub fn from_body(http_status: u16, body: &str) -> Self {
        match serde_json::from_str::<PlatformErrorEnvelope>(body) {
            Ok(envelope) => PlatformError {
                http_status: Some(http_status),
                ..envelope.error
            },
            Err(_) => PlatformError {
                message: if body.trim().is_empty() {
                    format!("HTTP {} with empty body", http_status)
                } else {
                    body.to_string()
                },
                code: None,
                error_subcode: None,
                error_user_title: None,
                error_user_msg: None,
                http_status: Some(http_status),
            },
        }
    }

    /// The most useful text for an operator: `error_user_msg` wins over the
    /// generic `message`.
    pub fn detail(&self) -> &str {
        match self.error_user_msg.as_deref() {
            Some(msg) if !msg.trim().is_empty() => msg,
            _ => &self.message,
        }
    }
}

#[derive(Error, Debug)]
pub enum AdBatchError {
    // Batch-fatal
    #[error("Template resolution failed: {message}")]
    TemplateResolutionError { message: String },

    #[error("Ad set creation failed: {message}")]
    AdSetCreationError { message: String },

    // Group-isolated
    #[error("Media upload failed for '{filename}': {message}")]
    MediaUploadError { filename: String, message: String },

    #[error("No media could be resolved for group '{group}'")]
    NoMediaResolvedError { group: String },

    #[error("Creative rejected: {message}")]
    CreativeRejectedError { message: String },

    #[error("Ad creation failed: {message}")]
    AdCreationError { message: String },

    // Transport / ambient
    #[error("Ads Platform API error: {0}")]
    Platform(#[from] PlatformError),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}': {reason} (got '{value}')")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

impl AdBatchError {
    /// Errors that stop the whole batch before any per-ad result exists.
    pub fn is_batch_fatal(&self) -> bool {
        matches!(
            self,
            AdBatchError::TemplateResolutionError { .. } | AdBatchError::AdSetCreationError { .. }
        )
    }

    /// Errors captured on a single group while the rest of the batch continues.
    pub fn is_group_isolated(&self) -> bool {
        matches!(
            self,
            AdBatchError::MediaUploadError { .. }
                | AdBatchError::NoMediaResolvedError { .. }
                | AdBatchError::CreativeRejectedError { .. }
                | AdBatchError::AdCreationError { .. }
        )
    }

    /// Raw upstream text for the error, without the local prefix. Platform
    /// errors yield their detail text so nothing is lost for debugging.
    pub fn upstream_message(&self) -> String {
        match self {
            AdBatchError::Platform(e) => e.detail().to_string(),
            AdBatchError::TemplateResolutionError { message }
            | AdBatchError::AdSetCreationError { message }
            | AdBatchError::CreativeRejectedError { message }
            | AdBatchError::AdCreationError { message }
            | AdBatchError::MediaUploadError { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            AdBatchError::TemplateResolutionError { message } => format!(
                "Could not read the template ad; nothing was created. {}",
                message
            ),
            AdBatchError::AdSetCreationError { message } => format!(
                "Could not create the new ad set; no ads were created. {}",
                message
            ),
            AdBatchError::ConfigError { .. }
            | AdBatchError::InvalidConfigValueError { .. }
            | AdBatchError::ValidationError { .. } => {
                format!("Please check the batch configuration: {}", self)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AdBatchError>;
