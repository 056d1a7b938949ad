use cdnflow_cloud::{Diagnostics, DistributionController, StateManager, StatePersister};
use colored::Colorize;

pub async fn handle(
    controller: &DistributionController,
    manager: &StateManager,
    name: &str,
) -> anyhow::Result<Diagnostics> {
    let slot = manager.slot(name);
    let Some(state) = slot.read().await? else {
        println!("{}", format!("ℹ '{}' is not tracked", name).dimmed());
        return Ok(Diagnostics::new());
    };

    let id = state.combined_id.unwrap_or_else(|| "-".to_string());
    println!(
        "{}",
        format!("Deleting distribution '{}' ({})...", name, id).yellow()
    );

    let diags = controller.delete(&slot).await;
    if !diags.has_error() {
        println!("{}", format!("✓ '{}' deleted", name).green().bold());
    }

    Ok(diags)
}
