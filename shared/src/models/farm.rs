//! Farm models

use serde::{Deserialize, Serialize};

use super::field::Field;
use crate::types::SoilType;

/// A farm with its fixed set of field slots
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Farm {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub soil_type: SoilType,
    pub fields: Vec<Field>,
}

impl Farm {
    pub fn field(&self, field_id: u32) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == field_id)
    }
}

/// Payload for creating a new farm
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FarmCreate {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub soil_type: SoilType,
    pub email: String,
}

/// Summary of a user's farm ownership
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FarmsSummary {
    pub has_farms: bool,
    pub farm_count: u32,
}
