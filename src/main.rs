use ad_batch::config::batch_file::{is_json_path, load_json_request, BatchFile};
use ad_batch::domain::ports::Storage;
use ad_batch::utils::{logger, validation::Validate};
use ad_batch::{
    plan, BatchCreateRequest, BatchCreateResult, BatchOrchestrator, CliConfig, GraphApiClient,
    LocalStorage, TracingObserver,
};
use anyhow::Context;
use clap::Parser;
use std::path::Path;

const EXIT_FATAL: i32 = 1;
const EXIT_PARTIAL: i32 = 2;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    if config.json_logs {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting ad-batch");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(EXIT_FATAL);
    }

    let (request, storage) = match load_request(&config).await {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!("❌ Could not load batch file {}: {:#}", config.batch_file, e);
            eprintln!("❌ Could not load batch file {}: {:#}", config.batch_file, e);
            std::process::exit(EXIT_FATAL);
        }
    };

    if let Err(e) = request.validate() {
        tracing::error!("❌ Batch validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(EXIT_FATAL);
    }

    if config.dry_run {
        tracing::info!("🧪 Dry run, no API calls will be made");
        println!("Ad set: {}", request.new_ad_set_name);
        println!("Template ad: {}", request.template_ad_id);
        for planned in plan(&request) {
            println!("{}", serde_json::to_string(&planned)?);
        }
        return Ok(());
    }

    let api = GraphApiClient::from_config(&config).context("building the API client")?;
    let orchestrator = BatchOrchestrator::new(api, TracingObserver);

    match orchestrator.run_with_groups(request).await {
        Ok(outcome) => {
            print_summary(&outcome.result);

            if let Some(output) = &config.output {
                let body = serde_json::to_vec_pretty(&outcome.result)?;
                storage
                    .write_file(output, &body)
                    .await
                    .with_context(|| format!("writing result to {}", output))?;
                tracing::info!("📁 Result saved to: {}/{}", storage.base_path(), output);
            }

            if !outcome.result.all_succeeded() {
                std::process::exit(EXIT_PARTIAL);
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Batch aborted: {} (batch fatal: {})",
                e,
                e.is_batch_fatal()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(EXIT_FATAL);
        }
    }

    Ok(())
}

/// Media paths resolve against `--assets-dir`, then `[assets].directory`,
/// then the batch file's own directory.
async fn load_request(config: &CliConfig) -> anyhow::Result<(BatchCreateRequest, LocalStorage)> {
    let path = Path::new(&config.batch_file);
    let batch_dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(|parent| parent.to_string_lossy().into_owned())
        .unwrap_or_else(|| ".".to_string());

    if is_json_path(path) {
        let storage = LocalStorage::new(config.assets_dir.clone().unwrap_or(batch_dir));
        return Ok((load_json_request(path)?, storage));
    }

    let batch_file = BatchFile::from_file(path)?;
    batch_file.validate_config()?;

    let root = config
        .assets_dir
        .clone()
        .or_else(|| {
            batch_file
                .assets_root(path)
                .map(|root| root.to_string_lossy().into_owned())
        })
        .unwrap_or(batch_dir);
    tracing::debug!("📂 Reading media from {}", root);

    let storage = LocalStorage::new(root);
    let request = batch_file.into_request(&storage).await?;
    Ok((request, storage))
}

fn print_summary(result: &BatchCreateResult) {
    println!("Ad set: {} ({})", result.ad_set_name, result.ad_set_id);
    for ad in &result.results {
        match (&ad.ad_id, &ad.error) {
            (Some(ad_id), _) => println!("✅ {} -> {}", ad.ad_name, ad_id),
            (None, Some(error)) => println!("❌ {}: {}", ad.ad_name, error),
            (None, None) => println!("❔ {}", ad.ad_name),
        }
    }
    println!(
        "{} succeeded, {} failed",
        result.succeeded_count(),
        result.failed_count()
    );
}
