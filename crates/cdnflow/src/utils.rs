use anyhow::Context;
use cdnflow_cloud::{
    DesiredConfig, Diagnostics, DistributionController, DistributionState, OperationContext,
    PollConfig, Severity, StatePersister,
};
use cdnflow_cloud_api::{ApiConfig, CdnApiClient};
use cdnflow_config::Settings;
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub fn load_settings() -> anyhow::Result<Settings> {
    cdnflow_config::load_settings().context("Failed to load cdnflow settings")
}

/// Build the controller over the REST client
///
/// `CDN_API_URL` wins over `api_url` from settings.
pub fn build_controller(settings: &Settings) -> anyhow::Result<DistributionController> {
    let mut api = ApiConfig::from_env()?;
    if std::env::var_os("CDN_API_URL").is_none() {
        if let Some(url) = &settings.api_url {
            api = api.with_base_url(url);
        }
    }

    let client = CdnApiClient::new(api)?;
    tracing::debug!("Using API at {}", client.base_url());

    let poll = PollConfig {
        initial_interval: settings.poll.initial_interval(),
        max_interval: settings.poll.max_interval(),
        backoff_multiplier: settings.poll.multiplier,
    };
    Ok(DistributionController::new(Arc::new(client)).with_poll_config(poll))
}

/// Read a desired configuration; `.json` files are parsed as JSON, anything else as YAML
pub fn load_desired(path: &Path) -> anyhow::Result<DesiredConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let desired = if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?
    } else {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?
    };
    Ok(desired)
}

/// Operation context bounded by `timeout` and cancelled on Ctrl-C
pub fn operation_context(timeout: Duration) -> OperationContext {
    let ctx = OperationContext::with_timeout(timeout);
    let token = ctx.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling operation");
            token.cancel();
        }
    });
    ctx
}

pub fn timeout_or(override_secs: Option<u64>, default: Duration) -> Duration {
    override_secs.map(Duration::from_secs).unwrap_or(default)
}

pub fn print_diagnostics(diags: &Diagnostics) {
    for diag in diags.iter() {
        match diag.severity {
            Severity::Error => {
                eprintln!("{} {}", "✗".red().bold(), diag.summary.red().bold());
                eprintln!("  {}", diag.detail);
            }
            Severity::Warning => {
                eprintln!("{} {}", "⚠".yellow(), diag.summary.yellow());
                eprintln!("  {}", diag.detail);
            }
        }
    }
}

/// State after an operation has run; a failed read is logged, not returned,
/// so the operation's diagnostics still reach the user
pub async fn current_state(slot: &dyn StatePersister) -> Option<DistributionState> {
    match slot.read().await {
        Ok(state) => state,
        Err(e) => {
            tracing::warn!("Could not re-read state for display: {}", e);
            None
        }
    }
}

pub fn print_state(address: &str, state: &DistributionState) {
    println!("{}", address.cyan().bold());
    println!("  id:      {}", state.combined_id.as_deref().unwrap_or("-"));

    let status = state
        .status
        .as_ref()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "(pending)".to_string());
    println!("  status:  {}", status);

    if let Some(domains) = state.domains.as_ref().filter(|d| !d.is_empty()) {
        println!("  domains: {}", domains.join(", "));
    }
    if let Some(errors) = state.errors.as_ref().filter(|e| !e.is_empty()) {
        for error in errors {
            println!("  {} {}", "error:".red(), error);
        }
    }
    if let Some(updated) = &state.updated_at {
        println!("  updated: {}", updated.dimmed());
    }
}
