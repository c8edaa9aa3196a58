//! Quick-start rest durations.

use serde::{Deserialize, Serialize};

/// Rest used when neither config nor presets provide one.
pub const FALLBACK_REST_SECS: u64 = 90;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestPreset {
    pub id: i64,
    pub name: String,
    pub duration_secs: u64,
    pub order: u32,
}

/// Seeded into a fresh database.
pub fn default_presets() -> Vec<RestPreset> {
    [
        ("30 seconds", 30),
        ("60 seconds", 60),
        ("90 seconds", 90),
        ("2 minutes", 120),
        ("3 minutes", 180),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (name, duration_secs))| RestPreset {
        id: i as i64 + 1,
        name: name.into(),
        duration_secs,
        order: i as u32 + 1,
    })
    .collect()
}

/// The rest to auto-start after a set: the preset at `index` in display
/// order, or [`FALLBACK_REST_SECS`] if there is no such preset.
pub fn pick_rest_secs(presets: &[RestPreset], index: usize) -> u64 {
    let mut ordered: Vec<&RestPreset> = presets.iter().collect();
    ordered.sort_by_key(|p| p.order);
    ordered
        .get(index)
        .map(|p| p.duration_secs)
        .filter(|&secs| secs > 0)
        .unwrap_or(FALLBACK_REST_SECS)
}
