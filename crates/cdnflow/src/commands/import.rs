use crate::utils;
use cdnflow_cloud::{Diagnostics, DistributionController, StateManager};
use cdnflow_config::Settings;
use colored::Colorize;

pub async fn handle(
    controller: &DistributionController,
    settings: &Settings,
    manager: &StateManager,
    name: &str,
    combined_id: &str,
    timeout_secs: Option<u64>,
) -> anyhow::Result<Diagnostics> {
    let slot = manager.slot(name);

    println!("{}", format!("Importing {} as '{}'...", combined_id, name).blue());

    let ctx = utils::operation_context(utils::timeout_or(timeout_secs, settings.timeouts.read()));
    let diags = controller.import(combined_id, &ctx, &slot).await;

    if let Some(state) = utils::current_state(&slot).await {
        if !diags.has_error() {
            println!("{}", "✓ Imported".green().bold());
        }
        utils::print_state(name, &state);
    }

    Ok(diags)
}
