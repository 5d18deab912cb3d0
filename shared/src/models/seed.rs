//! Seed models

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The seed types a field can be planted with
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeedType {
    Wheat,
    Corn,
    Barley,
    Pumpkin,
    BlackGrapes,
    WhiteGrapes,
}

impl SeedType {
    pub const ALL: [SeedType; 6] = [
        SeedType::Wheat,
        SeedType::Corn,
        SeedType::Barley,
        SeedType::Pumpkin,
        SeedType::BlackGrapes,
        SeedType::WhiteGrapes,
    ];

    /// Wire identifier, matching the serialized form
    pub fn code(&self) -> &'static str {
        match self {
            SeedType::Wheat => "WHEAT",
            SeedType::Corn => "CORN",
            SeedType::Barley => "BARLEY",
            SeedType::Pumpkin => "PUMPKIN",
            SeedType::BlackGrapes => "BLACK_GRAPES",
            SeedType::WhiteGrapes => "WHITE_GRAPES",
        }
    }

    /// Human readable name for display surfaces
    pub fn display_name(&self) -> &'static str {
        match self {
            SeedType::Wheat => "Wheat",
            SeedType::Corn => "Corn",
            SeedType::Barley => "Barley",
            SeedType::Pumpkin => "Pumpkin",
            SeedType::BlackGrapes => "Black Grapes",
            SeedType::WhiteGrapes => "White Grapes",
        }
    }
}

impl std::fmt::Display for SeedType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Returned when a string does not name a known seed type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown seed type: {0}")]
pub struct UnknownSeedType(pub String);

impl std::str::FromStr for SeedType {
    type Err = UnknownSeedType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SeedType::ALL
            .into_iter()
            .find(|seed| seed.code() == s)
            .ok_or_else(|| UnknownSeedType(s.to_string()))
    }
}

/// Catalog entry describing a seed's environmental profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Seed {
    pub id: String,
    pub seed_type: SeedType,
    pub min_temperature: f64,
    pub optimal_temperature: f64,
    pub max_temperature: f64,
    pub min_soil_moisture: f64,
    pub optimal_soil_moisture: f64,
    pub max_soil_moisture: f64,
    pub water_requirement: f64,
    pub frost_risk_temperature: f64,
    pub heat_stress_temperature: f64,
    #[serde(default)]
    pub icon: Option<String>,
}
