//! Data layer: campaign configuration and the built-in game-design tables.
//!
//! `CampaignConfig` is a resource. Its `Default` is the shipped campaign
//! (16 weeks, 100 000 starting money, a four-crop plot). A RON file with the
//! same shape can replace it; missing fields fall back to the defaults.
//!
//! No other domain hard-codes campaign numbers: the campaign, field setup and
//! NDVI simulator all read them from here.

mod field;
mod weeks;

pub use field::{default_field, CropPlacement};
pub use weeks::default_weeks;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::shared::*;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read campaign config: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed campaign config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("campaign config has no weeks")]
    NoWeeks,
}

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignConfig {
    pub starting_money: u32,
    pub starting_condition: FieldCondition,
    /// Fixed RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,
    pub field: Vec<CropPlacement>,
    pub weeks: Vec<WeekRecord>,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            starting_money: STARTING_MONEY,
            starting_condition: FieldCondition::Good,
            seed: None,
            field: default_field(),
            weeks: default_weeks(),
        }
    }
}

impl CampaignConfig {
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let config: CampaignConfig = ron::from_str(source)?;
        if config.weeks.is_empty() {
            return Err(ConfigError::NoWeeks);
        }
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_ron_str(&source)
    }
}

pub struct DataPlugin;

impl Plugin for DataPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CampaignConfig>();

        let config = app.world().resource::<CampaignConfig>();
        info!(
            "[Config] Campaign: {} weeks, starting money {}, {} crops, condition {}",
            config.weeks.len(),
            config.starting_money,
            config.field.len(),
            config.starting_condition
        );
        let seed = config.seed;

        if !app.world().contains_resource::<FarmRng>() {
            app.insert_resource(seed.map_or_else(FarmRng::default, FarmRng::seeded));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_campaign_matches_shipped_table() {
        let config = CampaignConfig::default();
        assert_eq!(config.weeks.len(), CAMPAIGN_WEEKS);
        assert_eq!(config.starting_money, 100_000);
        assert_eq!(config.weeks[0].cost, 12_000);
        assert_eq!(config.weeks[15].date, "Apr 22");
        for (i, week) in config.weeks.iter().enumerate() {
            assert_eq!(week.week as usize, i + 1, "weeks are numbered in order");
            assert!((0.0..=1.0).contains(&week.moisture));
        }
    }

    #[test]
    fn shipped_ron_file_matches_default() {
        let config = CampaignConfig::from_ron_str(include_str!("../../config/campaign.ron"))
            .expect("shipped config parses");
        assert_eq!(config, CampaignConfig::default());
    }

    #[test]
    fn partial_ron_falls_back_to_defaults() {
        let config = CampaignConfig::from_ron_str("(starting_money: 5000, seed: Some(7))")
            .expect("partial config parses");
        assert_eq!(config.starting_money, 5000);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.weeks, default_weeks());
        assert_eq!(config.field, default_field());
    }

    #[test]
    fn empty_week_table_is_rejected() {
        let result = CampaignConfig::from_ron_str("(weeks: [])");
        assert!(matches!(result, Err(ConfigError::NoWeeks)));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let result = CampaignConfig::from_ron_str("(starting_money: \"lots\")");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
