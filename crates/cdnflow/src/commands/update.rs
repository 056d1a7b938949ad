use crate::utils;
use cdnflow_cloud::{Diagnostics, DistributionController, StateManager};
use cdnflow_config::Settings;
use colored::Colorize;
use std::path::Path;

pub async fn handle(
    controller: &DistributionController,
    settings: &Settings,
    manager: &StateManager,
    name: &str,
    config: &Path,
    timeout_secs: Option<u64>,
) -> anyhow::Result<Diagnostics> {
    let desired = utils::load_desired(config)?;
    let slot = manager.slot(name);

    println!("{}", format!("Updating distribution '{}'...", name).blue());

    let ctx = utils::operation_context(utils::timeout_or(timeout_secs, settings.timeouts.update()));
    let diags = controller.update(&desired, &ctx, &slot).await;

    if !diags.has_error() {
        println!("{}", "✓ Distribution is active".green().bold());
    }
    if let Some(state) = utils::current_state(&slot).await {
        utils::print_state(name, &state);
    }

    Ok(diags)
}
