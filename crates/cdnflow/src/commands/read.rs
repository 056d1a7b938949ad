use crate::utils;
use cdnflow_cloud::{Diagnostics, DistributionController, StateManager, StatePersister};
use cdnflow_config::Settings;
use colored::Colorize;

pub async fn handle(
    controller: &DistributionController,
    settings: &Settings,
    manager: &StateManager,
    name: &str,
    timeout_secs: Option<u64>,
) -> anyhow::Result<Diagnostics> {
    let slot = manager.slot(name);
    if slot.read().await?.is_none() {
        println!("{}", format!("ℹ '{}' is not tracked", name).dimmed());
        return Ok(Diagnostics::new());
    }

    let ctx = utils::operation_context(utils::timeout_or(timeout_secs, settings.timeouts.read()));
    let diags = controller.read(&ctx, &slot).await;

    match utils::current_state(&slot).await {
        Some(state) => utils::print_state(name, &state),
        None if !diags.has_error() => {
            println!("{}", format!("'{}' removed from state", name).yellow())
        }
        None => {}
    }

    Ok(diags)
}
