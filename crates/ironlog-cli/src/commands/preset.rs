use clap::Subcommand;
use ironlog_core::presets::pick_rest_secs;
use ironlog_core::storage::Database;
use ironlog_core::Config;
use serde_json::json;

use super::{print_json, CmdResult};

#[derive(Subcommand)]
pub enum PresetAction {
    /// List rest presets in display order
    List,
}

pub fn run(action: PresetAction) -> CmdResult {
    match action {
        PresetAction::List => {
            let config = Config::load()?;
            let db = Database::open()?;
            let presets = db.rest_presets()?;
            print_json(&json!({
                "presets": presets,
                "auto_rest_secs": pick_rest_secs(&presets, config.rest.preset_index),
            }))?;
        }
    }
    Ok(())
}
