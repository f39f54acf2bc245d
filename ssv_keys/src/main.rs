mod cli;
mod config;

use clap::Parser;
use cli::SsvKeys;
use config::{CommandConfig, Config, SharesConfig, VerifyConfig};
use futures::{StreamExt, TryStreamExt};
use key_shares::{KeyShares, KeySharesBuilder, KeySharesItem, TracingReporter};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = SsvKeys::parse();

    if let Err(e) = init_logging(&cli.debug_level) {
        eprintln!("Failed to initialise logging: {e}");
        std::process::exit(1);
    }

    let config = match config::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!(reason = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(reason = %e, "Failed to start runtime");
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(config)) {
        error!(reason = %e, "Failed");
        std::process::exit(1);
    }
}

fn init_logging(debug_level: &str) -> Result<(), String> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(debug_level))
        .map_err(|e| format!("Invalid debug level {debug_level}: {e}"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| e.to_string())
}

async fn run(config: Config) -> Result<(), String> {
    match config.command {
        CommandConfig::Shares(shares_config) => {
            let output = write_shares(shares_config).await?;
            info!(file = %output.display(), "Key shares written");
            Ok(())
        }
        CommandConfig::Verify(verify_config) => verify(verify_config).await.map(|_| ()),
    }
}

/// Build an item per keystore, in parallel, and write them as one document
async fn write_shares(config: SharesConfig) -> Result<PathBuf, String> {
    let builder = Arc::new(
        KeySharesBuilder::from_operator_keys(
            config.version,
            &config.operator_ids,
            &config.operator_keys,
        )
        .map_err(|e| e.to_string())?,
    );
    let password = Arc::new(config.password.clone());

    info!(
        keystores = config.keystores.len(),
        operators = config.operator_ids.len(),
        "Splitting validator keys"
    );

    let builds = config
        .keystores
        .iter()
        .enumerate()
        .map(|(index, path)| {
            let builder = builder.clone();
            let password = password.clone();
            let context = config.context(index);
            let path = path.clone();
            async move {
                let keystore = tokio::fs::read(&path)
                    .await
                    .map_err(|e| format!("Unable to read keystore {}: {e}", path.display()))?;
                let item = tokio::task::spawn_blocking(move || {
                    builder.build(&keystore, &password, &context, &TracingReporter)
                })
                .await
                .map_err(|e| format!("Build task failed: {e}"))?
                .map_err(|e| format!("Failed to build key shares for {}: {e}", path.display()))?;
                Ok::<KeySharesItem, String>(item)
            }
        });
    let items: Vec<KeySharesItem> = futures::stream::iter(builds)
        .buffered(num_cpus::get())
        .try_collect()
        .await?;

    let mut key_shares = KeyShares::new(config.version);
    for item in items {
        key_shares.add(item).map_err(|e| e.to_string())?;
    }
    let document = key_shares.serialize().map_err(|e| e.to_string())?;

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| format!("Unable to read system time: {e}"))?
        .as_secs();
    tokio::fs::create_dir_all(&config.output_folder)
        .await
        .map_err(|e| {
            format!(
                "Unable to create output folder {}: {e}",
                config.output_folder.display()
            )
        })?;
    let output = config
        .output_folder
        .join(format!("keyshares-{timestamp}.json"));
    tokio::fs::write(&output, document)
        .await
        .map_err(|e| format!("Unable to write {}: {e}", output.display()))?;

    Ok(output)
}

/// Load and re-validate a document
async fn verify(config: VerifyConfig) -> Result<KeyShares, String> {
    let bytes = tokio::fs::read(&config.file)
        .await
        .map_err(|e| format!("Unable to read {}: {e}", config.file.display()))?;
    let key_shares = KeyShares::deserialize(&bytes)
        .map_err(|e| format!("Invalid key shares in {}: {e}", config.file.display()))?;

    for (index, item) in key_shares.items().iter().enumerate() {
        let operators = item
            .operator_ids()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        info!(
            index,
            validator = ?item.validator_pubkey(),
            operators,
            payload = item.payload().is_some(),
            "Valid key shares"
        );
    }
    info!(
        version = %key_shares.version(),
        validators = key_shares.len(),
        "Key shares document is valid"
    );
    Ok(key_shares)
}
