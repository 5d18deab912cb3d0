//! Live feed entry models
//!
//! Alerts, recommendations and weather readings all flow through the same
//! synchronizer; [`FeedEntry`] is the contract it needs from an entry type.
//! Advisory payloads arrive camelCase, weather payloads snake_case.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::seed::SeedType;

/// Alert classifications accepted by the alerts feed
pub const ALERT_EVENT_TYPES: &[&str] = &[
    "FROST_ALERT",
    "HEAT_ALERT",
    "WEATHER_WARNING",
    "PEST_WARNING",
    "SAFETY_ALERT",
];

/// Classifications accepted by the recommendations feed
pub const RECOMMENDATION_EVENT_TYPES: &[&str] = &[
    "IRRIGATION_NEEDED",
    "HARVEST_READY",
    "MONITORING_ADVICE",
    "DISEASE_RISK",
];

/// The three live feeds the client synchronizes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    Alerts,
    Recommendations,
    Weather,
}

impl FeedKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedKind::Alerts => "alerts",
            FeedKind::Recommendations => "recommendations",
            FeedKind::Weather => "weather",
        }
    }
}

/// An entry a live feed can carry
pub trait FeedEntry:
    Clone + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Stable identifier used for removal and read receipts
    fn entry_id(&self) -> &str;

    /// The farm this entry belongs to
    fn farm_id(&self) -> &str;

    /// Event classification, checked against a feed's allow-list.
    /// `None` for entry types without classification (weather).
    fn classification(&self) -> Option<&str>;

    /// Record when the client received the entry
    fn stamp_received(&mut self, at: DateTime<Utc>);
}

/// A pushed alert or recommendation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdvisoryEvent {
    pub id: String,
    pub user_id: String,
    pub farm_id: String,
    #[serde(default)]
    pub recommended_seed: Option<SeedType>,
    pub recommendation_type: String,
    pub advice: String,
    pub reasoning: String,
    #[serde(default)]
    pub weather_timestamp: Option<String>,
    #[serde(default)]
    pub metrics: HashMap<String, f64>,
    #[serde(default)]
    pub received_at: Option<DateTime<Utc>>,
}

impl FeedEntry for AdvisoryEvent {
    fn entry_id(&self) -> &str {
        &self.id
    }

    fn farm_id(&self) -> &str {
        &self.farm_id
    }

    fn classification(&self) -> Option<&str> {
        Some(&self.recommendation_type)
    }

    fn stamp_received(&mut self, at: DateTime<Utc>) {
        self.received_at = Some(at);
    }
}

/// A pushed weather observation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherReading {
    pub user_id: String,
    pub time: String,
    pub farm_id: String,
    pub lat: f64,
    pub lon: f64,
    pub weather_code: i32,
    pub temp: f64,
    #[serde(default)]
    pub received_at: Option<DateTime<Utc>>,
}

impl FeedEntry for WeatherReading {
    fn entry_id(&self) -> &str {
        &self.time
    }

    fn farm_id(&self) -> &str {
        &self.farm_id
    }

    fn classification(&self) -> Option<&str> {
        None
    }

    fn stamp_received(&mut self, at: DateTime<Utc>) {
        self.received_at = Some(at);
    }
}
