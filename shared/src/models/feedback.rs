//! Harvest history and feedback models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::seed::SeedType;

/// Payload recorded when a field is harvested
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HarvestRecord {
    pub harvest_date: NaiveDate,
    #[serde(default)]
    pub answers: Vec<FeedbackAnswers>,
}

/// Whether feedback can still be given for a harvest
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackStatus {
    #[default]
    Locked,
    Ready,
    Completed,
}

/// One completed harvest, as listed in the history view
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HarvestHistoryEntry {
    pub id: String,
    pub field_id: u32,
    pub seed_type: SeedType,
    pub harvest_date: NaiveDate,
    #[serde(default)]
    pub status: FeedbackStatus,
    #[serde(default)]
    pub answers: Vec<FeedbackAnswers>,
}

/// Ratings submitted against a harvest history entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackAnswers {
    pub seed_quality: u8,
    pub irrigation: u8,
    pub app_recommendations: u8,
    pub overall_experience: u8,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
}
