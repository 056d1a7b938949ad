use crate::utils;
use cdnflow_cloud::StateManager;
use colored::Colorize;

pub async fn handle(manager: &StateManager, name: Option<&str>) -> anyhow::Result<()> {
    let state = manager.load().await?;

    match name {
        Some(name) => match state.get_resource(name) {
            Some(resource) => utils::print_state(name, resource),
            None => {
                eprintln!("{}", format!("✗ '{}' is not tracked", name).red().bold());
                std::process::exit(1);
            }
        },
        None => {
            if state.resources.is_empty() {
                println!("{}", "No distributions tracked".dimmed());
                return Ok(());
            }
            for (address, resource) in &state.resources {
                utils::print_state(address, resource);
            }
        }
    }

    Ok(())
}
