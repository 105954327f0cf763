//! Extract command implementation.

use crate::cli::ExtractArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use kgcfp_domain::EntityCounts;
use kgcfp_extractor::{save_results, Aggregator, Extractor, ExtractorConfig};
use kgcfp_llm::OpenAiProvider;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

/// Execute the extract command.
pub async fn execute_extract(args: ExtractArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let extractor_config = match args.preset {
        Some(preset) => ExtractorConfig::from(preset),
        None => config.extractor.clone(),
    };
    extractor_config.validate()?;

    let provider = build_provider(&args, config, &extractor_config)?;
    info!("Using model {}", provider.model());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; finishing the current chunk");
            let _ = shutdown_tx.send(true);
        }
    });

    let aggregator =
        Aggregator::new(Extractor::new(provider, extractor_config)).with_shutdown(shutdown_rx);

    let results = if args.input.is_file() {
        vec![aggregator.process_file(&args.input).await?]
    } else {
        aggregator.process_directory(&args.input).await?
    };

    let written = save_results(&results, &args.output)?;

    let mut totals = EntityCounts::default();
    for result in &results {
        totals += result.counts();
    }
    println!(
        "{}",
        formatter.success(&format!(
            "Extracted {} document(s) into {} ({} files written)",
            results.len(),
            args.output.display(),
            written.len()
        ))
    );
    println!("{}", formatter.info(&totals.to_string()));

    Ok(())
}

/// Command-line and environment values win over the configuration file.
fn build_provider(
    args: &ExtractArgs,
    config: &Config,
    extractor_config: &ExtractorConfig,
) -> Result<OpenAiProvider> {
    let base_url = args.base_url.as_deref().unwrap_or(&config.llm.base_url);
    let model = args.model.as_deref().unwrap_or(&config.llm.model);
    let api_key = args
        .api_key
        .as_deref()
        .or(config.llm.api_key.as_deref())
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| {
            CliError::Config("No API key: set OPENAI_API_KEY or llm.api_key".to_string())
        })?;

    let provider = OpenAiProvider::with_timeout(
        base_url,
        model,
        Duration::from_secs(extractor_config.call_timeout_secs),
    )?
    .with_api_key(api_key)
    .with_temperature(config.llm.temperature)
    .with_max_tokens(config.llm.max_tokens);

    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args(api_key: Option<&str>, model: Option<&str>) -> ExtractArgs {
        ExtractArgs {
            input: PathBuf::from("docs"),
            output: PathBuf::from("output"),
            api_key: api_key.map(String::from),
            base_url: None,
            model: model.map(String::from),
            preset: None,
        }
    }

    #[test]
    fn test_missing_api_key_rejected() {
        let config = Config::default();
        let result = build_provider(&args(None, None), &config, &config.extractor);
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_argument_overrides_config_model() {
        let config = Config::default();
        let provider =
            build_provider(&args(Some("sk-test"), Some("qwen-max")), &config, &config.extractor)
                .unwrap();
        assert_eq!(provider.model(), "qwen-max");
    }

    #[test]
    fn test_config_key_used_when_no_argument() {
        let mut config = Config::default();
        config.llm.api_key = Some("sk-file".to_string());
        let provider = build_provider(&args(None, None), &config, &config.extractor).unwrap();
        assert_eq!(provider.model(), config.llm.model);
    }
}
