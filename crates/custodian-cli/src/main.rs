//! Custodian CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use custodian_core::Claim;
use custodian_runtime::{
    DuckDuckGoSearch, LlmProvider, ProviderError, ProviderRegistry, RuntimeConfig,
    VerificationPipeline,
};

#[derive(Parser)]
#[command(name = "custodian")]
#[command(about = "Claim verification with live web evidence")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify one or more claims
    Verify {
        /// Claims to verify, each as one argument
        #[arg(required = true)]
        claims: Vec<String>,

        /// Print the full pipeline trace, not just the record
        #[arg(long)]
        trace: bool,

        /// Pretty-print JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Run only the guardrail on a claim
    Check {
        claim: String,
    },

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Verify {
            claims,
            trace,
            pretty,
        } => cmd_verify(config, claims, trace, pretty).await,
        Commands::Check { claim } => cmd_check(&config, claim),
        Commands::Config => cmd_config(&config),
    }
}

fn load_config(path: Option<&Path>) -> Result<RuntimeConfig> {
    match path {
        Some(path) => RuntimeConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(RuntimeConfig::default()),
    }
}

async fn cmd_verify(config: RuntimeConfig, claims: Vec<String>, trace: bool, pretty: bool) -> Result<()> {
    let llm = build_llm(&config)?;
    let search = DuckDuckGoSearch::from_settings(&config.search, config.timeouts.search)
        .context("Failed to create search provider")?;

    let pipeline = VerificationPipeline::builder()
        .maybe_llm(llm)
        .search(Arc::new(search))
        .config(config)
        .build()
        .context("Failed to build verification pipeline")?;

    info!(claims = claims.len(), llm = pipeline.has_llm(), "Verifying claims");

    for outcome in pipeline.verify_batch(claims).await {
        if trace {
            print_json(&outcome, pretty)?;
        } else {
            print_json(&outcome.record, pretty)?;
        }
    }

    Ok(())
}

/// Create the configured LLM provider.
///
/// A missing credential yields `None`, which the pipeline answers with
/// error records. Any other provider error is a configuration mistake.
fn build_llm(config: &RuntimeConfig) -> Result<Option<Arc<dyn LlmProvider>>> {
    let registry = ProviderRegistry::with_defaults();

    match registry.create(&config.llm.provider, &config.llm_provider_config()) {
        Ok(provider) => Ok(Some(provider)),
        Err(ProviderError::NotConfigured(reason)) => {
            warn!(
                provider = %config.llm.provider,
                reason = %reason,
                "LLM credential missing; verify will return error records"
            );
            Ok(None)
        }
        Err(e) => Err(e).with_context(|| {
            format!("Failed to create LLM provider '{}'", config.llm.provider)
        }),
    }
}

fn cmd_check(config: &RuntimeConfig, claim: String) -> Result<()> {
    let claim = Claim::new(claim);
    let decision = config.guardrail.route(&claim);
    let record = decision.record();

    print_json(
        &serde_json::json!({
            "claim_id": claim.fingerprint(),
            "tokens": claim.token_count(),
            "guardrail": decision,
            "record": record,
        }),
        true,
    )
}

fn cmd_config(config: &RuntimeConfig) -> Result<()> {
    let yaml = config.to_yaml().context("Failed to serialize config")?;
    print!("{}", yaml);
    Ok(())
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("Failed to serialize output")?;

    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verify_args() {
        let cli = Cli::try_parse_from([
            "custodian",
            "--config",
            "custodian.yaml",
            "verify",
            "first claim",
            "second claim",
            "--trace",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("custodian.yaml")));
        match cli.command {
            Commands::Verify {
                claims,
                trace,
                pretty,
            } => {
                assert_eq!(claims, vec!["first claim", "second claim"]);
                assert!(trace);
                assert!(!pretty);
            }
            _ => panic!("expected verify"),
        }
    }

    #[test]
    fn test_verify_requires_claim() {
        assert!(Cli::try_parse_from(["custodian", "verify"]).is_err());
    }

    #[test]
    fn test_load_default_config() {
        let config = load_config(None).unwrap();
        assert_eq!(config, RuntimeConfig::default());
    }

    #[test]
    fn test_unknown_llm_provider_is_an_error() {
        let mut config = RuntimeConfig::default();
        config.llm.provider = "oracle".to_string();

        let err = build_llm(&config).err().unwrap();
        assert!(err.to_string().contains("Failed to create LLM provider 'oracle'"));
    }

    #[test]
    fn test_bad_llm_base_url_is_an_error() {
        let mut config = RuntimeConfig::default();
        config.llm.base_url = Some("generativelanguage.googleapis.com".to_string());

        let err = build_llm(&config).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<ProviderError>(),
            Some(ProviderError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_missing_credential_is_no_llm() {
        for var in ["GOOGLE_API_KEY", "GEMINI_API_KEY"] {
            std::env::remove_var(var);
        }

        let llm = build_llm(&RuntimeConfig::default()).unwrap();
        assert!(llm.is_none());
    }

    #[test]
    fn test_load_missing_config_file() {
        let err = load_config(Some(Path::new("/nonexistent/custodian.yaml"))).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/custodian.yaml"));
    }
}
