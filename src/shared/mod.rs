//! Shared components, resources, events, and states for NDVI Farm.
//!
//! This is the type contract. Every domain plugin imports from here.
//! No domain reaches into another domain's internals; cross-domain traffic
//! goes through the event bus (`crate::bus`) or the Bevy events below.

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// ═══════════════════════════════════════════════════════════════════════
// GAME STATE - top-level state machine
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, States, Default)]
pub enum GameState {
    #[default]
    Loading,
    Playing,
    Won,
    Lost,
}

/// Ordering of the `OnEnter(GameState::Loading)` setup work: the field is
/// planted before the campaign spawns its first decision tiles.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetupSet {
    Field,
    Campaign,
}

// ═══════════════════════════════════════════════════════════════════════
// CONSTANTS
// ═══════════════════════════════════════════════════════════════════════

pub const TILE_SIZE: f32 = 16.0;

/// Number of weeks in the built-in campaign.
pub const CAMPAIGN_WEEKS: usize = 16;

pub const STARTING_MONEY: u32 = 100_000;
pub const MAX_CROP_HEALTH: u32 = 100;

/// Convert a grid cell index to world units (top-left of the tile).
pub fn grid_cells(n: i32) -> f32 {
    n as f32 * TILE_SIZE
}

// ═══════════════════════════════════════════════════════════════════════
// CAMPAIGN DATA
// ═══════════════════════════════════════════════════════════════════════

/// One row of the weekly irrigation table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekRecord {
    pub week: u32,
    pub date: String,
    /// Soil moisture fraction, 0.0–1.0.
    pub moisture: f32,
    /// Irrigation cost for this week.
    pub cost: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    /// Irrigate this week.
    Yes,
    /// Skip irrigation this week.
    No,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Yes => write!(f, "YES"),
            Decision::No => write!(f, "NO"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossReason {
    CropDeath,
    Bankruptcy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CampaignOutcome {
    Won,
    Lost(LossReason),
}

// ═══════════════════════════════════════════════════════════════════════
// CROPS
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropKind {
    Wheat,
    Corn,
    Tomato,
    Carrot,
}

impl CropKind {
    /// Units produced when a mature crop of this kind is harvested.
    pub fn harvest_yield(self) -> u32 {
        match self {
            CropKind::Wheat => 3,
            CropKind::Corn => 2,
            CropKind::Tomato => 5,
            CropKind::Carrot => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CropKind::Wheat => "wheat",
            CropKind::Corn => "corn",
            CropKind::Tomato => "tomato",
            CropKind::Carrot => "carrot",
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// NDVI FIELD CONDITIONS
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldCondition {
    /// Healthy crops.
    Optimal,
    /// Normal growth.
    #[default]
    Good,
    /// Drought or nutrient deficiency.
    Stressed,
    /// Severe stress.
    Poor,
}

impl FieldCondition {
    /// Mean NDVI reading for this condition.
    pub fn baseline(self) -> f32 {
        match self {
            FieldCondition::Optimal => 0.7,
            FieldCondition::Good => 0.55,
            FieldCondition::Stressed => 0.35,
            FieldCondition::Poor => 0.2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FieldCondition::Optimal => "optimal",
            FieldCondition::Good => "good",
            FieldCondition::Stressed => "stressed",
            FieldCondition::Poor => "poor",
        }
    }
}

impl fmt::Display for FieldCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCondition(pub String);

impl FromStr for FieldCondition {
    type Err = UnknownCondition;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "optimal" => Ok(FieldCondition::Optimal),
            "good" => Ok(FieldCondition::Good),
            "stressed" => Ok(FieldCondition::Stressed),
            "poor" => Ok(FieldCondition::Poor),
            other => Err(UnknownCondition(other.to_string())),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// BUS EVENTS - the wire contract with rendering/input collaborators
// ═══════════════════════════════════════════════════════════════════════

/// Closed set of event names carried by the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    HeroPosition,
    NdviUpdate,
    CropGrowth,
    CropHarvested,
    DecisionMade,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::HeroPosition,
        EventKind::NdviUpdate,
        EventKind::CropGrowth,
        EventKind::CropHarvested,
        EventKind::DecisionMade,
    ];

    pub fn wire_name(self) -> &'static str {
        match self {
            EventKind::HeroPosition => "HERO_POSITION",
            EventKind::NdviUpdate => "NDVI_UPDATE",
            EventKind::CropGrowth => "CROP_GROWTH",
            EventKind::CropHarvested => "CROP_HARVESTED",
            EventKind::DecisionMade => "DECISION_MADE",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NdviReading {
    pub value: f32,
    #[serde(serialize_with = "serialize_point")]
    pub position: Vec2,
    /// Simulated milliseconds since the scene started.
    pub timestamp: f64,
    pub condition: FieldCondition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropGrowth {
    #[serde(serialize_with = "serialize_point")]
    pub position: Vec2,
    pub stage: u8,
    #[serde(rename = "type")]
    pub kind: CropKind,
    pub ndvi: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CropHarvest {
    #[serde(rename = "type")]
    pub kind: CropKind,
    pub harvest_amount: u32,
    #[serde(serialize_with = "serialize_point")]
    pub position: Vec2,
    pub ndvi: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionMade {
    pub decision: Decision,
    pub week: WeekRecord,
}

/// An event on the bus: the variant is the event name, its data the payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "name", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameEvent {
    HeroPosition(#[serde(serialize_with = "serialize_point")] Vec2),
    NdviUpdate(NdviReading),
    CropGrowth(CropGrowth),
    CropHarvested(CropHarvest),
    DecisionMade(DecisionMade),
}

impl GameEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GameEvent::HeroPosition(_) => EventKind::HeroPosition,
            GameEvent::NdviUpdate(_) => EventKind::NdviUpdate,
            GameEvent::CropGrowth(_) => EventKind::CropGrowth,
            GameEvent::CropHarvested(_) => EventKind::CropHarvested,
            GameEvent::DecisionMade(_) => EventKind::DecisionMade,
        }
    }

    /// `{ "name": ..., "payload": ... }` as sent to external collaborators.
    pub fn to_wire(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

#[derive(Serialize)]
struct WirePoint {
    x: f32,
    y: f32,
}

fn serialize_point<S: Serializer>(point: &Vec2, serializer: S) -> Result<S::Ok, S::Error> {
    WirePoint { x: point.x, y: point.y }.serialize(serializer)
}

// ═══════════════════════════════════════════════════════════════════════
// BEVY EVENTS - campaign feedback for the HUD collaborator
// ═══════════════════════════════════════════════════════════════════════

/// Toast notification for player feedback.
#[derive(Event, Debug, Clone)]
pub struct ToastEvent {
    pub message: String,
    pub duration_secs: f32,
}

/// Sent once when the campaign reaches a terminal outcome.
#[derive(Event, Debug, Clone)]
pub struct CampaignEndedEvent {
    pub outcome: CampaignOutcome,
    pub week: u32,
    pub money: u32,
    pub crop_health: u32,
}

// ═══════════════════════════════════════════════════════════════════════
// RANDOMNESS
// ═══════════════════════════════════════════════════════════════════════

/// Game-wide RNG. Seed it for reproducible NDVI noise and tile placement.
#[derive(Resource)]
pub struct FarmRng(pub StdRng);

impl FarmRng {
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl Default for FarmRng {
    fn default() -> Self {
        Self(StdRng::from_entropy())
    }
}
