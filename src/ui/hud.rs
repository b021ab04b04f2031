use bevy::prelude::*;

use crate::campaign::Campaign;
use crate::shared::*;

// ═══════════════════════════════════════════════════════════════════════
// DISPLAY LEVELS
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MoistureLevel {
    Saturated,
    Adequate,
    Dry,
    #[default]
    Parched,
}

impl MoistureLevel {
    pub fn from_moisture(moisture: f32) -> Self {
        if moisture >= 0.7 {
            MoistureLevel::Saturated
        } else if moisture >= 0.5 {
            MoistureLevel::Adequate
        } else if moisture >= 0.3 {
            MoistureLevel::Dry
        } else {
            MoistureLevel::Parched
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HealthLevel {
    #[default]
    Good,
    Fair,
    Critical,
}

impl HealthLevel {
    pub fn from_health(health: u32) -> Self {
        if health >= 70 {
            HealthLevel::Good
        } else if health >= 40 {
            HealthLevel::Fair
        } else {
            HealthLevel::Critical
        }
    }
}

/// Compact money display: `12000` → `"12k"`, below a thousand unchanged.
pub fn format_money(amount: u32) -> String {
    if amount >= 1000 {
        format!("{}k", amount / 1000)
    } else {
        amount.to_string()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// HUD SNAPSHOT - read-only projection of the campaign, refreshed per frame
// ═══════════════════════════════════════════════════════════════════════

#[derive(Resource, Debug, Clone, PartialEq, Default)]
pub struct HudSnapshot {
    pub week: u32,
    pub total_weeks: u32,
    pub date: String,
    pub moisture_percent: u32,
    pub moisture_level: MoistureLevel,
    pub crop_health: u32,
    pub health_level: HealthLevel,
    pub money: u32,
    pub money_label: String,
    pub irrigation_cost: u32,
    pub can_afford: bool,
    pub state: Option<GameState>,
    pub message: Option<String>,
}

impl HudSnapshot {
    pub fn from_campaign(campaign: &Campaign) -> Self {
        // Past the last week the HUD keeps showing the final one.
        let week = campaign
            .current_week()
            .or_else(|| campaign.weekly_data.last());
        Self {
            week: week.map_or(0, |w| w.week),
            total_weeks: campaign.total_weeks() as u32,
            date: week.map(|w| w.date.clone()).unwrap_or_default(),
            moisture_percent: week.map_or(0, |w| (w.moisture * 100.0).round() as u32),
            moisture_level: week.map_or(MoistureLevel::Parched, |w| {
                MoistureLevel::from_moisture(w.moisture)
            }),
            crop_health: campaign.crop_health,
            health_level: HealthLevel::from_health(campaign.crop_health),
            money: campaign.money,
            money_label: format_money(campaign.money),
            irrigation_cost: week.map_or(0, |w| w.cost),
            can_afford: campaign.can_afford_irrigation(),
            state: None,
            message: campaign.last_message.clone(),
        }
    }
}

pub fn refresh_hud(
    campaign: Res<Campaign>,
    state: Option<Res<State<GameState>>>,
    mut hud: ResMut<HudSnapshot>,
) {
    let mut snapshot = HudSnapshot::from_campaign(&campaign);
    snapshot.state = state.map(|s| *s.get());
    if *hud != snapshot {
        *hud = snapshot;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_is_shown_in_thousands() {
        assert_eq!(format_money(100_000), "100k");
        assert_eq!(format_money(16_500), "16k");
        assert_eq!(format_money(1_000), "1k");
        assert_eq!(format_money(999), "999");
        assert_eq!(format_money(0), "0");
    }

    #[test]
    fn moisture_levels() {
        assert_eq!(MoistureLevel::from_moisture(0.75), MoistureLevel::Saturated);
        assert_eq!(MoistureLevel::from_moisture(0.7), MoistureLevel::Saturated);
        assert_eq!(MoistureLevel::from_moisture(0.55), MoistureLevel::Adequate);
        assert_eq!(MoistureLevel::from_moisture(0.38), MoistureLevel::Dry);
        assert_eq!(MoistureLevel::from_moisture(0.1), MoistureLevel::Parched);
    }

    #[test]
    fn health_levels() {
        assert_eq!(HealthLevel::from_health(100), HealthLevel::Good);
        assert_eq!(HealthLevel::from_health(70), HealthLevel::Good);
        assert_eq!(HealthLevel::from_health(69), HealthLevel::Fair);
        assert_eq!(HealthLevel::from_health(40), HealthLevel::Fair);
        assert_eq!(HealthLevel::from_health(39), HealthLevel::Critical);
    }

    #[test]
    fn snapshot_projects_current_week() {
        let campaign = Campaign::default();
        let hud = HudSnapshot::from_campaign(&campaign);
        assert_eq!(hud.week, 1);
        assert_eq!(hud.total_weeks, 16);
        assert_eq!(hud.date, "Jan 7");
        assert_eq!(hud.moisture_percent, 75);
        assert_eq!(hud.moisture_level, MoistureLevel::Saturated);
        assert_eq!(hud.money_label, "100k");
        assert_eq!(hud.irrigation_cost, 12_000);
        assert!(hud.can_afford);
        assert_eq!(hud.health_level, HealthLevel::Good);
    }

    #[test]
    fn snapshot_after_the_season_shows_last_week() {
        let mut campaign = Campaign::default();
        campaign.week_index = CAMPAIGN_WEEKS;
        let hud = HudSnapshot::from_campaign(&campaign);
        assert_eq!(hud.week, 16);
        assert_eq!(hud.date, "Apr 22");
        assert!(!hud.can_afford);
    }
}
