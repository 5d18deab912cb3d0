//! Common types used across the client

use serde::{Deserialize, Serialize};

/// Soil classification for a farm
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SoilType {
    Clay,
    Sandy,
    Silt,
    Loam,
    Peat,
    Chalk,
}

impl std::fmt::Display for SoilType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SoilType::Clay => "Clay",
            SoilType::Sandy => "Sandy",
            SoilType::Silt => "Silt",
            SoilType::Loam => "Loam",
            SoilType::Peat => "Peat",
            SoilType::Chalk => "Chalk",
        };
        write!(f, "{}", name)
    }
}

/// Connection state of a live feed subscription
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    #[default]
    Disconnected,
    Error,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Error => "error",
        };
        write!(f, "{}", name)
    }
}
