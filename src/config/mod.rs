pub mod batch_file;
pub mod cli;

#[cfg(feature = "cli")]
use crate::adapters::graph_api::{DEFAULT_API_VERSION, DEFAULT_BASE_URL};
#[cfg(feature = "cli")]
use crate::domain::ports::ConfigProvider;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "cli")]
use std::time::Duration;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "ad-batch")]
#[command(about = "Clone an ad-set template and bulk-create ads from creative assets")]
pub struct CliConfig {
    /// Batch file (.toml, or a .json BatchCreateRequest)
    #[arg(short, long)]
    pub batch_file: String,

    /// Directory media files are read from (overrides [assets].directory)
    #[arg(long)]
    pub assets_dir: Option<String>,

    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub api_base_url: String,

    #[arg(long, default_value = DEFAULT_API_VERSION)]
    pub api_version: String,

    /// Transport timeout per request; unset keeps the HTTP client default
    #[arg(long)]
    pub request_timeout_secs: Option<u64>,

    /// Write the batch result JSON to this path (relative to the assets directory)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Show the planned ads without calling the API
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    fn api_version(&self) -> &str {
        &self.api_version
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("batch_file", &self.batch_file)?;
        validation::validate_url("api_base_url", &self.api_base_url)?;
        validation::validate_non_empty_string("api_version", &self.api_version)?;
        if let Some(secs) = self.request_timeout_secs {
            validation::validate_positive_number("request_timeout_secs", secs as usize, 1)?;
        }
        if let Some(dir) = &self.assets_dir {
            validation::validate_path("assets_dir", dir)?;
        }
        Ok(())
    }
}
