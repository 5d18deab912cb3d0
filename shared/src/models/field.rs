//! Field and crop models
//!
//! A field is either empty or carries a crop. The wire format keeps the
//! legacy optional-field shape (`status` plus optional crop attributes), so
//! [`Field`] serializes through [`FieldDto`] and conversion enforces that the
//! crop attributes are present exactly when the field is occupied.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::seed::SeedType;

/// Field status as it appears on the wire
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldStatus {
    Empty,
    Planted,
    Growing,
    Ready,
}

/// Growth stage of a planted crop, ordered by maturity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum GrowthStage {
    Seedling,
    Young,
    Mature,
    Ready,
}

/// Status of an occupied field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropStatus {
    Planted,
    Growing,
    Ready,
}

impl From<CropStatus> for FieldStatus {
    fn from(status: CropStatus) -> Self {
        match status {
            CropStatus::Planted => FieldStatus::Planted,
            CropStatus::Growing => FieldStatus::Growing,
            CropStatus::Ready => FieldStatus::Ready,
        }
    }
}

/// The crop occupying a field
#[derive(Debug, Clone, PartialEq)]
pub struct Crop {
    pub status: CropStatus,
    pub seed_type: SeedType,
    pub planted_date: NaiveDate,
    pub growth_stage: GrowthStage,
    pub harvest_date: Option<NaiveDate>,
}

/// One of the farm's field slots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FieldDto", into = "FieldDto")]
pub struct Field {
    pub id: u32,
    pub crop: Option<Crop>,
}

impl Field {
    pub fn empty(id: u32) -> Self {
        Self { id, crop: None }
    }

    pub fn is_empty(&self) -> bool {
        self.crop.is_none()
    }

    pub fn status(&self) -> FieldStatus {
        match &self.crop {
            None => FieldStatus::Empty,
            Some(crop) => crop.status.into(),
        }
    }
}

/// Wire representation of a field
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDto {
    pub id: u32,
    pub status: FieldStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_type: Option<SeedType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planted_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub growth_stage: Option<GrowthStage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub harvest_date: Option<NaiveDate>,
}

/// Violations of the empty/occupied invariant in wire data
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldDtoError {
    #[error("field {id}: occupied field is missing {missing}")]
    MissingCropData { id: u32, missing: &'static str },
    #[error("field {id}: empty field carries crop data")]
    UnexpectedCropData { id: u32 },
}

impl From<Field> for FieldDto {
    fn from(field: Field) -> Self {
        match field.crop {
            None => FieldDto {
                id: field.id,
                status: FieldStatus::Empty,
                seed_type: None,
                planted_date: None,
                growth_stage: None,
                harvest_date: None,
            },
            Some(crop) => FieldDto {
                id: field.id,
                status: crop.status.into(),
                seed_type: Some(crop.seed_type),
                planted_date: Some(crop.planted_date),
                growth_stage: Some(crop.growth_stage),
                harvest_date: crop.harvest_date,
            },
        }
    }
}

impl TryFrom<FieldDto> for Field {
    type Error = FieldDtoError;

    fn try_from(dto: FieldDto) -> Result<Self, Self::Error> {
        let status = match dto.status {
            FieldStatus::Empty => {
                if dto.seed_type.is_some()
                    || dto.planted_date.is_some()
                    || dto.growth_stage.is_some()
                {
                    return Err(FieldDtoError::UnexpectedCropData { id: dto.id });
                }
                return Ok(Field::empty(dto.id));
            }
            FieldStatus::Planted => CropStatus::Planted,
            FieldStatus::Growing => CropStatus::Growing,
            FieldStatus::Ready => CropStatus::Ready,
        };

        let id = dto.id;
        let missing = |missing| FieldDtoError::MissingCropData { id, missing };
        Ok(Field {
            id,
            crop: Some(Crop {
                status,
                seed_type: dto.seed_type.ok_or(missing("seedType"))?,
                planted_date: dto.planted_date.ok_or(missing("plantedDate"))?,
                growth_stage: dto.growth_stage.ok_or(missing("growthStage"))?,
                harvest_date: dto.harvest_date,
            }),
        })
    }
}
