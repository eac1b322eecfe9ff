//! Region preference commands.

use asearch_core::{AppConfig, PreferenceStore};
use clap::Subcommand;

/// Sub-commands available under `region`.
#[derive(Debug, Subcommand)]
pub enum RegionCommands {
    /// Print the saved region
    Show,
    /// List the selectable regions
    List,
    /// Save a region as the default for future searches
    Set {
        /// Region code, e.g. CA or US
        code: String,
    },
}

pub(crate) fn run_region_show(preferences: &impl PreferenceStore) {
    println!("{}", preferences.get());
}

pub(crate) fn run_region_list(config: &AppConfig, preferences: &impl PreferenceStore) {
    let current = preferences.get();
    println!("{:<3}{:<6}LABEL", "", "CODE");
    for region in &config.regions.regions {
        let marker = if region.value == current.value { "*" } else { "" };
        println!("{:<3}{:<6}{}", marker, region.value, region.label);
    }
}

/// Saves `code` as the selected region.
///
/// # Errors
///
/// Returns an error if `code` is not in the region catalog or the preference
/// file cannot be written.
pub(crate) fn run_region_set(
    config: &AppConfig,
    preferences: &mut impl PreferenceStore,
    code: &str,
) -> anyhow::Result<()> {
    let region = config.regions.find(code).cloned().ok_or_else(|| {
        anyhow::anyhow!(
            "unknown region '{code}'; available: {}",
            available_codes(config)
        )
    })?;

    preferences
        .set(region.clone())
        .map_err(|e| anyhow::anyhow!("failed to save region preference: {e}"))?;
    println!("region set to {region}");
    Ok(())
}

pub(crate) fn available_codes(config: &AppConfig) -> String {
    config
        .regions
        .regions
        .iter()
        .map(|r| r.value.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
