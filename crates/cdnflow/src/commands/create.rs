use crate::utils;
use anyhow::Context;
use cdnflow_cloud::{
    DesiredConfig, Diagnostics, DistributionController, StateManager, StatePersister,
};
use cdnflow_config::Settings;
use colored::Colorize;
use std::path::Path;

pub async fn handle(
    controller: &DistributionController,
    settings: &Settings,
    manager: &StateManager,
    name: &str,
    project: Option<String>,
    config: Option<&Path>,
    timeout_secs: Option<u64>,
) -> anyhow::Result<Diagnostics> {
    let slot = manager.slot(name);

    // An anchored id means the distribution already exists remotely
    if let Some(existing) = slot.read().await? {
        if let Some(id) = existing.combined_id {
            anyhow::bail!(
                "'{}' already tracks distribution {}; use `cdnflow update` or `cdnflow delete`",
                name,
                id
            );
        }
    }

    let project = project
        .or_else(|| settings.project.clone())
        .context("No project given: pass --project, set CDN_PROJECT or `project` in settings")?;

    let desired = match config {
        Some(path) => utils::load_desired(path)?,
        None => DesiredConfig::default(),
    };

    println!(
        "{}",
        format!("Creating distribution '{}' in {}...", name, project).blue()
    );

    let ctx = utils::operation_context(utils::timeout_or(timeout_secs, settings.timeouts.create()));
    let diags = controller.create(&project, &desired, &ctx, &slot).await;

    if let Some(state) = utils::current_state(&slot).await {
        if !diags.has_error() {
            println!("{}", "✓ Distribution is active".green().bold());
        } else {
            println!(
                "{}",
                "Distribution id was saved; run `cdnflow read` to resume tracking or `cdnflow delete` to clean up"
                    .yellow()
            );
        }
        utils::print_state(name, &state);
    }

    Ok(diags)
}
